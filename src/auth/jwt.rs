use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::models::{Claims, OWNER_SUBJECT};

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

/// HS256 token for the owner, valid for `ttl` seconds.
pub fn generate_access_token(secret: &str, ttl: usize) -> Result<(String, Claims), Error> {
    let issued = now();
    let claims = Claims {
        sub: OWNER_SUBJECT.to_string(),
        exp: issued + ttl,
        iat: issued,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.sub != OWNER_SUBJECT {
        return Err("token was not issued to the owner".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let (token, issued) = generate_access_token("secret", 600).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, OWNER_SUBJECT);
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp, claims.iat + 600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let (token, _) = generate_access_token("secret", 600).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: OWNER_SUBJECT.into(),
            exp: 1_000,
            iat: 900,
            jti: "old".into(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn foreign_subject_is_rejected() {
        let claims = Claims {
            sub: "driver".into(),
            exp: now() + 600,
            iat: now(),
            jti: "x".into(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }
}
