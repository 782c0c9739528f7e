use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use quill_types::api::Claims;

/// Sign an HS256 session token for `user_id`, valid for `ttl`.
pub fn issue(secret: &str, user_id: Uuid, ttl: TimeDelta) -> anyhow::Result<String> {
    let claims = Claims {
        id: user_id,
        exp: (Utc::now() + ttl).timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry and return the embedded claims.
pub fn verify(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    #[test]
    fn issued_token_resolves_to_same_user() {
        let id = Uuid::new_v4();
        let token = issue("secret", id, TimeDelta::hours(1)).unwrap();
        assert_eq!(verify("secret", &token).unwrap().id, id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("secret", Uuid::new_v4(), TimeDelta::hours(1)).unwrap();
        let err = verify("other", &token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue("secret", Uuid::new_v4(), TimeDelta::hours(-1)).unwrap();
        let err = verify("secret", &token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify("secret", "not.a.token").is_err());
    }
}
