pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::Deserialize;
use validator::Validate;

pub use extractors::{CurrentUser, MaybeUser};
pub use middleware::{SessionResolver, SESSION_COOKIE};
pub use password::{hash_password, verify_password};
pub use token::generate_token;

/// Login payload. Credentials are checked against the stored digest; the
/// failure response is the same whether the username is unknown or the
/// password wrong.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password required"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            username: "alice".to_string(),
            password: "p1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let empty_username = LoginRequest {
            username: "".to_string(),
            password: "p1".to_string(),
        };
        assert!(empty_username.validate().is_err());

        let empty_password = LoginRequest {
            username: "alice".to_string(),
            password: "".to_string(),
        };
        assert!(empty_password.validate().is_err());
    }
}
