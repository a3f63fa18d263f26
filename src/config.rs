//! Env-driven configuration for the service.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binary. Defaults are provided for convenience during development.
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_host: String,
    pub api_port: String,
    pub model_path: String,
    pub model_input_size: u32,
    pub max_upload_bytes: usize,
    pub max_image_dimension: u32,
    pub allowed_extensions: Vec<String>,
    pub cors_origins: String,
    pub preload_model: bool,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Result<Self, env::VarError> {
        Ok(Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8000".to_string()),
            model_path: env::var("MODEL_PATH")
                .unwrap_or_else(|_| "./models/u2net.onnx".to_string()),
            model_input_size: parse_env("MODEL_INPUT_SIZE", 320),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 8 * 1024 * 1024),
            max_image_dimension: parse_env("MAX_IMAGE_DIMENSION", 1024),
            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| "png,jpg,jpeg,webp,bmp".to_string())
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            cors_origins: env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            preload_model: env::var("PRELOAD_MODEL")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        })
    }

    pub fn print_env_vars() {
        for key in [
            "API_HOST",
            "API_PORT",
            "MODEL_PATH",
            "MODEL_INPUT_SIZE",
            "MAX_UPLOAD_BYTES",
            "MAX_IMAGE_DIMENSION",
            "ALLOWED_EXTENSIONS",
            "CORS_ORIGINS",
            "PRELOAD_MODEL",
        ] {
            tracing::info!(
                "{}: {}",
                key,
                env::var(key).unwrap_or_else(|_| "<unset>".to_string())
            );
        }
    }

    /// Comma-joined allow-set, as shown in error messages and `/api-info`.
    pub fn allowed_extensions_display(&self) -> String {
        self.allowed_extensions.join(", ")
    }
}

fn parse_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} '{}', falling back to default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        for key in [
            "API_HOST",
            "API_PORT",
            "MODEL_PATH",
            "MODEL_INPUT_SIZE",
            "MAX_UPLOAD_BYTES",
            "MAX_IMAGE_DIMENSION",
            "ALLOWED_EXTENSIONS",
            "CORS_ORIGINS",
            "PRELOAD_MODEL",
        ] {
            env::remove_var(key);
        }
        let config = Config::new().unwrap();
        assert_eq!(config.max_image_dimension, 1024);
        assert_eq!(config.max_upload_bytes, 8 * 1024 * 1024);
        assert!(config.allowed_extensions.contains(&"png".to_string()));
        assert!(config.allowed_extensions.contains(&"webp".to_string()));
        assert!(!config.preload_model);
    }
}
