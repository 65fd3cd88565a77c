use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as usize
}

pub fn generate_access_token(
    user_id: u64,
    email: String,
    role: u8,
    staff_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id,
        sub: email,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
        staff_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn generate_refresh_token(
    user_id: u64,
    email: String,
    role: u8,
    staff_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id,
        sub: email,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Refresh,
        staff_id,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
