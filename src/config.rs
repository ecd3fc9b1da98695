use std::time::Duration;

use crate::constants::*;

/// Runtime configuration, read from the environment after `.env` is loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub api_base_url: String,
    pub session_secret: String,
    pub production: bool,
    pub frontend_origin: Option<String>,
    pub upstream_timeout: Duration,
    pub upload_max_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = std::env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        port.parse::<u16>()
            .map_err(|_| format!("PORT must be a valid port number, got '{}'", port))?;

        let api_base_url = std::env::var("NGO_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        validate_base_url(&api_base_url)?;

        let session_secret = std::env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set".to_string())?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(format!(
                "SESSION_SECRET must be at least {} bytes",
                MIN_SESSION_SECRET_LENGTH
            ));
        }

        let production = std::env::var("PRODUCTION")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(false);

        let frontend_origin = std::env::var("FRONTEND_ORIGIN")
            .ok()
            .filter(|origin| !origin.trim().is_empty());

        let upstream_timeout = match std::env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    format!("UPSTREAM_TIMEOUT_SECS must be a whole number, got '{}'", raw)
                })?;
                if secs == 0 {
                    return Err("UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string());
                }
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        let upload_max_bytes = match std::env::var("UPLOAD_MAX_BYTES") {
            Ok(raw) => parse_upload_limit(&raw)?,
            Err(_) => DEFAULT_UPLOAD_MAX_BYTES,
        };

        Ok(Self {
            host,
            port,
            api_base_url,
            session_secret,
            production,
            frontend_origin,
            upstream_timeout,
            upload_max_bytes,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn validate_base_url(url: &str) -> Result<(), String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(format!(
            "NGO_API_BASE_URL must start with http:// or https://, got '{}'",
            url
        ))
    }
}

pub fn parse_upload_limit(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("UPLOAD_MAX_BYTES must be greater than 0".to_string()),
        Ok(bytes) => Ok(bytes),
        Err(_) => Err(format!(
            "UPLOAD_MAX_BYTES must be a whole number of bytes, got '{}'",
            raw
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_requires_scheme() {
        assert!(validate_base_url("https://backend.example.org").is_ok());
        assert!(validate_base_url("http://127.0.0.1:9000").is_ok());
        assert!(validate_base_url("backend.example.org").is_err());
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: "8080".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_secret: "x".repeat(MIN_SESSION_SECRET_LENGTH),
            production: false,
            frontend_origin: None,
            upstream_timeout: Duration::from_secs(5),
            upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        };
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn upload_limit_must_be_positive() {
        assert_eq!(parse_upload_limit("10485760"), Ok(10 * 1024 * 1024));
        assert!(parse_upload_limit("0").is_err());
        assert!(parse_upload_limit("10MB").is_err());
    }
}
