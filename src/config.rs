//! Configuration management for filmqa.
//!
//! Loads configuration from environment variables (and an optional `.env`
//! file) once at startup.

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Name reported by the ping endpoint.
    pub name: String,
    /// Interval of the keep-alive ticker in seconds. Zero disables it.
    pub keep_alive_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory holding the xlsx templates.
    pub templates_dir: PathBuf,
    /// Password applied to every protected worksheet.
    pub workbook_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "3000").parse().unwrap_or(3000),
                name: env_or("SERVER_NAME", "filmqa"),
                keep_alive_interval_secs: env_or("KEEP_ALIVE_INTERVAL_SECS", "840")
                    .parse()
                    .unwrap_or(840), // 14 minutes
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/filmqa.db"),
            },
            export: ExportConfig {
                templates_dir: PathBuf::from(env_or("TEMPLATES_DIR", "./templates")),
                workbook_password: env_or("WORKBOOK_PASSWORD", "2256"),
            },
            logging: LoggingConfig {
                format: match env_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                },
            },
        }
    }
}

impl ExportConfig {
    /// Export settings rooted at an explicit templates directory.
    pub fn with_templates_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: dir.into(),
            workbook_password: "2256".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_to_default() {
        assert_eq!(env_or("FILMQA_TEST_UNSET_VARIABLE", "fallback"), "fallback");
    }

    #[test]
    fn test_export_config_default_password() {
        let export = ExportConfig::with_templates_dir("/tmp/templates");
        assert_eq!(export.workbook_password, "2256");
        assert_eq!(export.templates_dir, PathBuf::from("/tmp/templates"));
    }
}
