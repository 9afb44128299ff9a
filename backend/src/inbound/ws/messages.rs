//! WebSocket frame payloads sent to clients.

use serde::Serialize;

use crate::domain::BoardSnapshot;

/// One outbound frame, tagged by `type`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerFrame<'a> {
    /// A complete board snapshot. Sent on connect and after every
    /// reconciliation that produced a new one.
    Snapshot(&'a BoardSnapshot),
    /// A fire-and-forget notification for this session's user.
    #[serde(rename_all = "camelCase")]
    Notification {
        /// Short headline.
        title: &'a str,
        /// Message body.
        body: &'a str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Value;

    #[test]
    fn snapshot_frames_are_tagged() {
        let snapshot = BoardSnapshot::empty(Utc::now());
        let json = serde_json::to_value(ServerFrame::Snapshot(&snapshot)).expect("serialise");
        assert_eq!(json.get("type").and_then(Value::as_str), Some("snapshot"));
        assert!(json.get("payload").and_then(|p| p.get("questions")).is_some());
    }

    #[test]
    fn notification_frames_carry_title_and_body() {
        let json = serde_json::to_value(ServerFrame::Notification {
            title: "New Answer",
            body: "Someone answered your question: testing",
        })
        .expect("serialise");
        assert_eq!(
            json.get("type").and_then(Value::as_str),
            Some("notification")
        );
        assert_eq!(
            json.get("payload").and_then(|p| p.get("title")).and_then(Value::as_str),
            Some("New Answer")
        );
    }
}
