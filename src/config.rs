//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `JWT_SECRET` - HS256 secret used to verify bearer tokens
//! - `PAYMENT_PUBLIC_KEY` - Payment provider public key
//! - `PAYMENT_PRIVATE_KEY` - Payment provider signing secret
//!
//! ## Optional
//! - `PORT` - Listen port (default: 8083)
//! - `APP_ENV` - `production` or `development` (default: development)
//! - `PAYMENT_CHECKOUT_URL` - Provider checkout endpoint
//! - `PAYMENT_RESULT_URL` - Where the provider sends the shopper afterwards
//! - `PAYMENT_SERVER_URL` - Callback URL the provider posts to
//! - `PAYMENT_CURRENCY` - ISO currency code (default: UAH)
//! - `PAYMENT_SKIP_SIGNATURE` - Accept unsigned callbacks; refused in production
//! - `DELIVERY_API_URL` / `DELIVERY_API_KEY` - Delivery cost provider
//! - `NATS_URL` - Publish domain events when set

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment { Development, Production }

impl Environment {
    pub fn is_production(self) -> bool { self == Self::Production }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: SecretString,
    pub port: u16,
    pub environment: Environment,
    pub jwt_secret: SecretString,
    pub payment: PaymentConfig,
    pub delivery: DeliveryConfig,
    pub nats_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub public_key: String,
    pub private_key: SecretString,
    pub checkout_url: String,
    pub result_url: String,
    pub server_url: String,
    pub currency: String,
    /// Only ever true outside production.
    pub skip_signature: bool,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub api_url: String,
    pub api_key: SecretString,
}

impl Config {
    /// Load configuration from environment variables. The binary loads `.env` before calling this.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match get_env_or_default("APP_ENV", "development").as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" | "test" => Environment::Development,
            other => return Err(ConfigError::InvalidEnvVar("APP_ENV".into(), other.to_string())),
        };
        let port = get_env_or_default("PORT", "8083")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".into(), e.to_string()))?;

        let skip_signature = parse_bool("PAYMENT_SKIP_SIGNATURE", &get_env_or_default("PAYMENT_SKIP_SIGNATURE", "false"))?;
        if skip_signature && environment.is_production() {
            return Err(ConfigError::InvalidEnvVar(
                "PAYMENT_SKIP_SIGNATURE".into(),
                "signature checks cannot be disabled in production".into(),
            ));
        }

        let payment = PaymentConfig {
            public_key: get_required_env("PAYMENT_PUBLIC_KEY")?,
            private_key: SecretString::from(get_required_env("PAYMENT_PRIVATE_KEY")?),
            checkout_url: get_env_or_default("PAYMENT_CHECKOUT_URL", "https://www.liqpay.ua/api/3/checkout"),
            result_url: get_env_or_default("PAYMENT_RESULT_URL", "http://localhost:3000/checkout/result"),
            server_url: get_env_or_default("PAYMENT_SERVER_URL", "http://localhost:8083/api/v1/payment/callback"),
            currency: get_env_or_default("PAYMENT_CURRENCY", "UAH"),
            skip_signature,
        };
        let delivery = DeliveryConfig {
            api_url: get_env_or_default("DELIVERY_API_URL", "https://api.novaposhta.ua/v2.0/json/"),
            api_key: SecretString::from(get_env_or_default("DELIVERY_API_KEY", "")),
        };

        Ok(Self {
            database_url: SecretString::from(get_required_env("DATABASE_URL")?),
            port,
            environment,
            jwt_secret: SecretString::from(get_required_env("JWT_SECRET")?),
            payment,
            delivery,
            nats_url: std::env::var("NATS_URL").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(key.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "").unwrap());
        assert!(matches!(parse_bool("X", "maybe"), Err(ConfigError::InvalidEnvVar(k, _)) if k == "X"));
    }
}
