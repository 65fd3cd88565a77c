use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Password freshly registered staff accounts start with; the portal
/// prompts for a change on first login.
pub const INITIAL_PASSWORD: &str = "123456";

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

pub fn verify_password(password: &str, hashed: &str) -> Result<(), argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(password.as_bytes(), &parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }
}
