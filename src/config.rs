use serde::Deserialize;

/// Default token lifetime: 7 days.
pub const DEFAULT_JWT_TTL_MINUTES: i64 = 60 * 24 * 7;
/// Upper bound on token lifetime: 365 days.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

impl JwtConfig {
    pub fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(
            (1..=MAX_JWT_TTL_MINUTES).contains(&self.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_JWT_TTL_MINUTES}"
        );
        Ok(())
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = parse_or(std::env::var("DATABASE_MAX_CONNECTIONS").ok(), 10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: parse_or(
                std::env::var("JWT_TTL_MINUTES").ok(),
                DEFAULT_JWT_TTL_MINUTES,
            ),
        };
        jwt.check()?;
        Ok(Self {
            database_url,
            max_connections,
            jwt,
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_missing_or_garbage() {
        assert_eq!(parse_or::<i64>(None, 42), 42);
        assert_eq!(parse_or::<i64>(Some("abc".into()), 42), 42);
        assert_eq!(parse_or::<i64>(Some(" 15 ".into()), 42), 15);
        assert_eq!(parse_or::<u32>(Some("-1".into()), 10), 10);
    }

    #[test]
    fn default_ttl_is_seven_days() {
        assert_eq!(DEFAULT_JWT_TTL_MINUTES, 10_080);
    }

    fn jwt(secret: &str, ttl_minutes: i64) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            ttl_minutes,
        }
    }

    #[test]
    fn jwt_ttl_must_be_in_range() {
        assert!(jwt("s", 1).check().is_ok());
        assert!(jwt("s", DEFAULT_JWT_TTL_MINUTES).check().is_ok());
        assert!(jwt("s", MAX_JWT_TTL_MINUTES).check().is_ok());
        assert!(jwt("s", 0).check().is_err());
        assert!(jwt("s", MAX_JWT_TTL_MINUTES + 1).check().is_err());
        assert!(jwt("s", i64::MAX).check().is_err());
        assert!(jwt("", 60).check().is_err());
    }
}
