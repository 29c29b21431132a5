use crate::domain::FinancialYear;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// The financial year this process serves ledgers for.
    pub financial_year: FinancialYear,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let financial_year = env_map
            .get("FINANCIAL_YEAR")
            .ok_or_else(|| ConfigError::MissingEnv("FINANCIAL_YEAR".to_string()))?
            .parse::<FinancialYear>()
            .map_err(|e| ConfigError::InvalidValue("FINANCIAL_YEAR".to_string(), e.to_string()))?;

        Ok(Config {
            port,
            financial_year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("FINANCIAL_YEAR".to_string(), "2025-2026".to_string());
        map
    }

    #[test]
    fn test_defaults_and_required() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.financial_year.to_string(), "2025-2026");
    }

    #[test]
    fn test_missing_financial_year() {
        let result = Config::from_env_map(HashMap::new());
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "FINANCIAL_YEAR"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_financial_year() {
        let mut env_map = setup_required_env();
        env_map.insert("FINANCIAL_YEAR".to_string(), "2025-2028".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "FINANCIAL_YEAR"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
