//! Time-of-day window policies gating sensitive actions.
//!
//! Pure functions over the caller's local wall clock. No time-zone
//! normalisation is performed; the caller's clock is authoritative, which is
//! a documented limitation of the product, not an oversight of this module.

use chrono::Timelike;

/// A half-open clock-hour interval `[start_hour, end_hour)`.
///
/// The end hour is exclusive. Equal bounds describe a window that is
/// permanently closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    start_hour: u32,
    end_hour: u32,
}

/// Video uploads are allowed between 2 PM and 7 PM only.
pub const VIDEO_UPLOAD_WINDOW: WindowPolicy = WindowPolicy::new(14, 19);

/// Mobile sign-ins are allowed between 10 AM and 1 PM only.
pub const MOBILE_ACCESS_WINDOW: WindowPolicy = WindowPolicy::new(10, 13);

impl WindowPolicy {
    /// Build a window from wall-clock hours.
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Whether `now` falls inside the window.
    ///
    /// Accepts anything carrying a wall-clock time (`NaiveTime`,
    /// `DateTime<Local>`, ...) so callers pass whatever their clock yields.
    pub fn allows<T: Timelike>(&self, now: &T) -> bool {
        let hour = now.hour();
        self.start_hour <= hour && hour < self.end_hour
    }

    /// Human description used in denial messages, e.g. `14:00-19:00`.
    pub fn describe(&self) -> String {
        format!("{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use rstest::rstest;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid wall-clock time")
    }

    #[rstest]
    #[case(13, 59, false)]
    #[case(14, 0, true)] // start hour is included
    #[case(16, 30, true)]
    #[case(18, 59, true)]
    #[case(19, 0, false)] // end hour is excluded
    #[case(23, 0, false)]
    #[case(0, 0, false)]
    fn upload_window_boundaries(#[case] hour: u32, #[case] minute: u32, #[case] allowed: bool) {
        assert_eq!(
            VIDEO_UPLOAD_WINDOW.allows(&at(hour, minute)),
            allowed,
            "hour {hour}:{minute:02}"
        );
    }

    #[rstest]
    #[case(9, false)]
    #[case(10, true)]
    #[case(12, true)]
    #[case(13, false)]
    fn mobile_window_boundaries(#[case] hour: u32, #[case] allowed: bool) {
        assert_eq!(MOBILE_ACCESS_WINDOW.allows(&at(hour, 0)), allowed);
    }

    #[rstest]
    fn equal_bounds_mean_permanently_closed() {
        let window = WindowPolicy::new(9, 9);
        for hour in 0..24 {
            assert!(!window.allows(&at(hour, 0)), "hour {hour}");
        }
    }

    #[rstest]
    fn describe_is_stable() {
        assert_eq!(VIDEO_UPLOAD_WINDOW.describe(), "14:00-19:00");
        assert_eq!(MOBILE_ACCESS_WINDOW.describe(), "10:00-13:00");
    }
}
