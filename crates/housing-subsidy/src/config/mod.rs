use std::env;
use std::fmt;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the engine host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Region prefixes accepted for the postal code of the subsidized object.
pub const DEFAULT_OBJECT_POSTCODE_PREFIXES: [&str; 17] = [
    "32", "33", "34", "37", "40", "41", "42", "44", "45", "46", "47", "48", "49", "50", "51", "52",
    "53",
];

pub const DEFAULT_DUPLICATE_DEBOUNCE_MS: u64 = 400;

/// Top-level configuration for hosts embedding the engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub engine: EngineConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let debounce_ms = match env::var("DUPLICATE_DEBOUNCE_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidDebounce { value: raw })?,
            Err(_) => DEFAULT_DUPLICATE_DEBOUNCE_MS,
        };

        let object_postcode_prefixes = match env::var("OBJECT_POSTCODE_PREFIXES") {
            Ok(raw) => parse_prefixes(&raw)?,
            Err(_) => DEFAULT_OBJECT_POSTCODE_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        };

        let strict_amount_input = match env::var("STRICT_AMOUNT_INPUT") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "STRICT_AMOUNT_INPUT",
                value: raw,
            })?,
            Err(_) => false,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            engine: EngineConfig {
                duplicate_debounce: Duration::from_millis(debounce_ms),
                object_postcode_prefixes,
                strict_amount_input,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Knobs consumed by the validation engine and the duplicate detector.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub duplicate_debounce: Duration,
    pub object_postcode_prefixes: Vec<String>,
    /// When set, amounts that cannot be parsed are reported instead of counting as zero.
    pub strict_amount_input: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_debounce: Duration::from_millis(DEFAULT_DUPLICATE_DEBOUNCE_MS),
            object_postcode_prefixes: DEFAULT_OBJECT_POSTCODE_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            strict_amount_input: false,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn parse_prefixes(raw: &str) -> Result<Vec<String>, ConfigError> {
    let prefixes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect();

    let valid = !prefixes.is_empty()
        && prefixes
            .iter()
            .all(|prefix| prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_digit()));

    if valid {
        Ok(prefixes)
    } else {
        Err(ConfigError::InvalidPostcodePrefixes {
            value: raw.to_string(),
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidDebounce { value: String },
    InvalidPostcodePrefixes { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDebounce { value } => write!(
                f,
                "DUPLICATE_DEBOUNCE_MS must be a whole number of milliseconds (found '{value}')"
            ),
            ConfigError::InvalidPostcodePrefixes { value } => write!(
                f,
                "OBJECT_POSTCODE_PREFIXES must be a comma separated list of two-digit prefixes (found '{value}')"
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serializes tests that touch process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    static GUARD: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD.get_or_init(|| std::sync::Mutex::new(()))
}
