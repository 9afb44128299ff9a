//! Driving port for the external identity provider.
//!
//! In hexagonal terms this is the seam behind which authentication lives.
//! The core trusts the subject id it returns; password storage, hashing and
//! session token internals are the provider's business.

use async_trait::async_trait;

use crate::domain::auth::{ContactIdentifier, LoginCredentials};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Authentication outcomes other than success.
    pub enum LoginError {
        /// The credentials did not match an account.
        InvalidCredentials => "invalid credentials",
        /// The identity provider is unreachable. Transient.
        Unavailable { message: String } => "identity provider unavailable: {message}",
    }
}

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated subject id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, LoginError>;
}

/// Development authenticator used until a real provider is wired.
///
/// `dev@example.org` / `password` authenticates successfully and produces a
/// fixed subject id; everything else is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginService;

/// Fixed subject id produced by [`FixtureLoginService`].
pub const FIXTURE_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

#[async_trait]
impl LoginService for FixtureLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, LoginError> {
        let is_dev_email = matches!(
            credentials.identifier(),
            ContactIdentifier::Email(email) if email.as_ref() == "dev@example.org"
        );
        if is_dev_email && credentials.password() == "password" {
            UserId::new(FIXTURE_USER_ID)
                .map_err(|err| LoginError::unavailable(format!("invalid fixture user id: {err}")))
        } else {
            Err(LoginError::invalid_credentials())
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::auth::ContactMethod;
    use rstest::rstest;

    fn credentials(email: &str, password: &str) -> LoginCredentials {
        let identifier =
            ContactIdentifier::parse(ContactMethod::Email, email).expect("email shape");
        LoginCredentials::try_from_parts(identifier, password).expect("credentials shape")
    }

    #[rstest]
    #[case("dev@example.org", "password", true)]
    #[case("dev@example.org", "wrong", false)]
    #[case("other@example.org", "password", false)]
    #[tokio::test]
    async fn fixture_accepts_only_the_dev_account(
        #[case] email: &str,
        #[case] password: &str,
        #[case] should_succeed: bool,
    ) {
        let result = FixtureLoginService
            .authenticate(&credentials(email, password))
            .await;
        match (should_succeed, result) {
            (true, Ok(id)) => assert_eq!(id.to_string(), FIXTURE_USER_ID),
            (false, Err(err)) => assert_eq!(err, LoginError::invalid_credentials()),
            (true, Err(err)) => panic!("expected success, got error: {err:?}"),
            (false, Ok(id)) => panic!("expected failure, got success: {id}"),
        }
    }
}
