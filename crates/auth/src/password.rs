use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use cowork_core::{Error, Outcome};

use crate::user::{Password, UserErrors};

/// Hash a validated password with Argon2id and a random salt.
pub fn hash_password(password: &Password) -> Outcome<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map_err(|e| Error::unexpected("Password.HashFailed", format!("failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Check a plain-text password against a stored Argon2 hash.
///
/// Mismatches and unreadable hashes produce the same error so callers cannot
/// tell the two apart.
pub fn verify_password(password: &str, password_hash: &str) -> Outcome<()> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| {
        tracing::warn!(error = %e, "stored password hash is unreadable");
        UserErrors::invalid_credentials()
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|e| {
            tracing::trace!(error = %e, "password verification failed");
            UserErrors::invalid_credentials().into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowork_core::{ErrorCategory, OutcomeExt};

    fn password(raw: &str) -> Password {
        Password::parse(raw).unwrap()
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password(&password("Correct1horse")).unwrap();
        assert!(verify_password("Correct1horse", &hash).is_ok());

        let wrong = verify_password("Wrong1horse", &hash);
        assert_eq!(wrong.first_error().category(), ErrorCategory::Unauthorized);
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password(&password("Same1password")).unwrap();
        let b = hash_password(&password("Same1password")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_reads_as_bad_credentials() {
        let outcome = verify_password("Anything1", "not_a_valid_hash");
        assert_eq!(outcome.first_error(), UserErrors::invalid_credentials());
    }
}
