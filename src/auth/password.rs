use crate::error::AppError;
use bcrypt::{hash, verify};

/// Hashes a password with the configured bcrypt work factor.
///
/// Intentionally expensive; handlers run this through `web::block` so a hash
/// in flight never stalls unrelated requests.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks a password against a stored bcrypt digest.
///
/// Total: an empty or malformed digest yields `false` rather than an error,
/// so "user not found" can be handled with an empty digest and take the same
/// code path as "wrong password".
pub fn verify_password(password: &str, digest: &str) -> bool {
    if digest.is_empty() {
        return false;
    }
    verify(password, digest).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt's minimum cost, to keep the tests fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "test_password123";
        let digest = hash_password(password, TEST_COST).unwrap();

        assert_ne!(digest, password);
        assert!(verify_password(password, &digest));
        assert!(!verify_password("wrong_password", &digest));
    }

    #[test]
    fn test_verify_with_empty_digest_is_false_not_an_error() {
        assert!(!verify_password("any_password", ""));
    }

    #[test]
    fn test_verify_with_malformed_digest_is_false() {
        assert!(!verify_password("any_password", "not-a-bcrypt-digest"));
    }
}
