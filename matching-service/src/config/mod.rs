use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub token: TokenConfig,
    pub twilio: TwilioConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC key for session tokens. Rotating it invalidates every session.
    pub secret: Secret<String>,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    pub from_number: String,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub signup_attempts: u32,
    pub login_attempts: u32,
    pub rate_limit_window_seconds: u64,
    /// Key rate limits on `x-forwarded-for`. Enable only behind a proxy
    /// that sets the header itself.
    pub trust_forwarded_for: bool,
}

impl MatchingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongodb"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The in-memory backend needs no connection string.
        let mongo_uri_default = match backend {
            StoreBackend::Memory => Some(""),
            StoreBackend::Mongodb => None,
        };

        Ok(MatchingConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("matching-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            store: StoreConfig {
                backend,
                mongodb: MongoConfig {
                    uri: get_env("MONGODB_URI", mongo_uri_default, is_prod)?,
                    database: get_env("MONGODB_DATABASE", Some("matching_db"), is_prod)?,
                },
            },
            token: TokenConfig {
                secret: Secret::new(get_env(
                    "TOKEN_SECRET",
                    Some("dev-only-token-secret"),
                    is_prod,
                )?),
                expiry_hours: parse_env("TOKEN_EXPIRY_HOURS", "168", is_prod)?,
            },
            twilio: TwilioConfig {
                account_sid: get_env("TWILIO_ACCOUNT_SID", Some(""), is_prod)?,
                auth_token: Secret::new(get_env("TWILIO_AUTH_TOKEN", Some(""), is_prod)?),
                from_number: get_env("TWILIO_PHONE_NUMBER", Some(""), is_prod)?,
                enabled: parse_env("TWILIO_ENABLED", "false", is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                signup_attempts: parse_env("SIGNUP_ATTEMPTS", "10", is_prod)?,
                login_attempts: parse_env("LOGIN_ATTEMPTS", "10", is_prod)?,
                rate_limit_window_seconds: parse_env("RATE_LIMIT_WINDOW_SECONDS", "60", is_prod)?,
                trust_forwarded_for: parse_env("TRUST_FORWARDED_FOR", "false", is_prod)?,
            },
        })
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::Mongodb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("MongoDB".parse::<StoreBackend>(), Ok(StoreBackend::Mongodb));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn parses_environment() {
        assert_eq!("production".parse::<Environment>(), Ok(Environment::Prod));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Dev));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn invalid_flag_is_a_config_error() {
        env::set_var("MATCHING_CONFIG_TEST_FLAG", "yes please");
        let parsed = parse_env::<bool>("MATCHING_CONFIG_TEST_FLAG", "false", false);
        assert!(matches!(parsed, Err(AppError::ConfigError(_))));

        env::set_var("MATCHING_CONFIG_TEST_FLAG", "true");
        assert!(parse_env::<bool>("MATCHING_CONFIG_TEST_FLAG", "false", false).unwrap());
        env::remove_var("MATCHING_CONFIG_TEST_FLAG");
    }
}
