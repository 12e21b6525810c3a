//! Account password handling.
//!
//! Hashes are Argon2id PHC strings, so the salt and cost parameters travel
//! with the stored value. Hashing failures surface as [`CoreError::Internal`].

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use storefront_core::error::CoreError;

/// Minimum accepted password length at registration, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::Internal(format!("Password hashing error: {e}")))
}

/// Check `password` against a stored hash.
///
/// A mismatch is `Ok(false)`; only an unreadable stored hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, CoreError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| CoreError::Internal(format!("Stored password hash is invalid: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CoreError::Internal(format!("Password verification error: {e}"))),
    }
}

/// Registration rules for a new password and its confirmation.
pub fn check_new_password(password: &str, confirmation: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::invalid_field(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
        ));
    }
    if password != confirmation {
        return Err(CoreError::invalid_field(
            "password_confirm",
            "Passwords don't match",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("correct-horse-battery").expect("hashing should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse-battery", &hash).unwrap());
        assert!(!verify_password("wrong-horse-battery", &hash).unwrap());
    }

    #[test]
    fn unreadable_stored_hash_is_internal() {
        assert_matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(CoreError::Internal(_))
        );
    }

    #[test]
    fn short_password_is_rejected_by_character_count() {
        assert_matches!(
            check_new_password("short", "short"),
            Err(CoreError::InvalidField { field: "password", .. })
        );
        // Eight multi-byte characters are long enough.
        assert!(check_new_password("ääääääää", "ääääääää").is_ok());
    }

    #[test]
    fn confirmation_must_match() {
        assert_matches!(
            check_new_password("long-enough", "long-enougH"),
            Err(CoreError::InvalidField { field: "password_confirm", message }) if message == "Passwords don't match"
        );
    }
}
