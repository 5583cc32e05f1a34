use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{
    config::{JwtConfig, MAX_JWT_TTL_MINUTES},
    state::AppState,
};

/// Why a bearer token was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            _ => Self::Malformed,
        }
    }
}

/// Signing material for bearer tokens.
///
/// Tokens are stateless: there is no server-side session or revocation list,
/// so a token stays valid until `exp` unless the secret itself is rotated.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        let minutes = cfg.ttl_minutes.clamp(1, MAX_JWT_TTL_MINUTES) as u64;
        Self::new(&cfg.secret, Duration::from_secs(minutes * 60))
    }

    #[cfg(test)]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let exp = issued_at + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: issued_at.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    #[test]
    fn issued_token_verifies_to_same_user() {
        let keys = JwtKeys::new("dev-secret", WEEK);
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("sign");
        assert_eq!(keys.verify(&token), Ok(user_id));
    }

    #[test]
    fn token_is_valid_until_expiry() {
        let keys = JwtKeys::new("dev-secret", WEEK);
        let user_id = Uuid::new_v4();
        let six_days_ago = OffsetDateTime::now_utc() - TimeDuration::days(6);
        let token = keys.issue_at(user_id, six_days_ago).expect("sign");
        assert_eq!(keys.verify(&token), Ok(user_id));
    }

    #[test]
    fn token_past_ttl_is_expired() {
        let keys = JwtKeys::new("dev-secret", WEEK);
        let eight_days_ago = OffsetDateTime::now_utc() - TimeDuration::days(8);
        let token = keys.issue_at(Uuid::new_v4(), eight_days_ago).expect("sign");
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_other_key_has_invalid_signature() {
        let ours = JwtKeys::new("current-secret", WEEK);
        let theirs = JwtKeys::new("rotated-out-secret", WEEK);
        let token = theirs.issue(Uuid::new_v4()).expect("sign");
        assert_eq!(ours.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = JwtKeys::new("dev-secret", WEEK);
        assert_eq!(keys.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(keys.verify(""), Err(TokenError::Malformed));
        assert_eq!(keys.verify("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn ttl_comes_from_config_minutes() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "s".into(),
            ttl_minutes: 90,
        });
        assert_eq!(keys.ttl(), Duration::from_secs(90 * 60));
    }

    #[test]
    fn oversized_ttl_is_clamped_and_still_signs() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "s".into(),
            ttl_minutes: i64::MAX,
        });
        assert_eq!(keys.ttl(), Duration::from_secs(MAX_JWT_TTL_MINUTES as u64 * 60));
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("sign");
        assert_eq!(keys.verify(&token), Ok(user_id));
    }
}
