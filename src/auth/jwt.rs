//! JWT token generation and validation

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Expiration timestamp
    pub exp: u64,
}

/// Generate a signed token for a user
pub fn generate_token(
    user_id: String,
    secret: &str,
    lifetime_seconds: u64,
) -> anyhow::Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs();

    let claims = Claims {
        sub: user_id,
        exp: now + lifetime_seconds,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate and decode a token, returning the caller's user id
pub fn validate_token(token: &str, secret: &str) -> anyhow::Result<String> {
    let validation = Validation::default();

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_minimum_32_characters_long";

    #[test]
    fn test_token_round_trip() {
        let token = generate_token("user-123".to_string(), SECRET, 3600).unwrap();
        let user_id = validate_token(&token, SECRET).unwrap();
        assert_eq!(user_id, "user-123");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token("user-123".to_string(), SECRET, 3600).unwrap();
        assert!(validate_token(&token, "another_secret_key_32_characters!!").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Expiry well past the default validation leeway
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: "user-123".to_string(),
            exp: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not.a.token", SECRET).is_err());
    }
}
