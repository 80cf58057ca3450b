use preference_engine::{AlgorithmParams, SessionSettings};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid algorithm parameters: {0}")]
    Algorithm(#[from] preference_engine::EngineError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub algorithm: AlgorithmParams,
    pub quiz: QuizConfig,
    pub catalog: CatalogConfig,
    pub profiles: ProfileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    /// "json" or "pretty"
    pub log_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    pub max_turns: usize,
    pub mandatory_styles: Vec<String>,
    pub allowed_segments: Vec<String>,
    /// Sessions older than this are swept from memory
    pub session_ttl_secs: u64,
    /// How often the sweep runs
    pub sweep_interval_secs: u64,
}

impl QuizConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::new(self.mandatory_styles.clone()).with_max_turns(self.max_turns)
    }

    pub fn is_allowed_segment(&self, segment: &str) -> bool {
        self.allowed_segments.iter().any(|s| s == segment)
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            max_turns: preference_engine::params::DEFAULT_MAX_TURNS,
            mandatory_styles: split_list(DEFAULT_MANDATORY_STYLES),
            allowed_segments: split_list(DEFAULT_SEGMENTS),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    S3,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub backend: CatalogBackend,
    pub bucket: String,
    pub prefix: String,
    pub region: String,
    pub presigned_url_expiration_secs: u64,
    /// Custom endpoint for S3-compatible storage (MinIO, LocalStack)
    pub endpoint: Option<String>,
    /// JSON file `{segment: {style: [keys]}}` for the memory backend
    pub manifest_path: Option<PathBuf>,
    /// Base URL used to build display handles in the memory backend
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    /// Directory for JSON profiles; in-memory store when unset
    pub dir: Option<PathBuf>,
}

const DEFAULT_MANDATORY_STYLES: &str = "classic,creative,fashionista,modern,sophisticated,street";
const DEFAULT_SEGMENTS: &str = "men,women";
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let reference = AlgorithmParams::reference();
        let algorithm = AlgorithmParams::new(
            parse_var("W_LIKE", reference.w_like)?,
            parse_var("W_DISLIKE", reference.w_dislike)?,
            parse_var("DECAY_FACTOR", reference.decay_factor)?,
            parse_var("BASELINE", reference.baseline)?,
            parse_var("RECENCY_WEIGHT", reference.recency_weight)?,
            parse_var("EXPLORATION_FACTOR", reference.exploration_factor)?,
        )?;

        let backend = match string_var("CATALOG_BACKEND", "s3").to_ascii_lowercase().as_str() {
            "s3" => CatalogBackend::S3,
            "memory" => CatalogBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue {
                    name: "CATALOG_BACKEND",
                    value: other.to_string(),
                    reason: "expected \"s3\" or \"memory\"".to_string(),
                })
            }
        };

        let max_turns: usize = parse_var("MAX_TURNS", preference_engine::params::DEFAULT_MAX_TURNS)?;
        if max_turns == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_TURNS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Config {
            app: AppConfig {
                env: string_var("APP_ENV", "development"),
                port: parse_var("APP_PORT", 5020)?,
                log_format: string_var("LOG_FORMAT", "pretty"),
            },
            algorithm,
            quiz: QuizConfig {
                max_turns,
                mandatory_styles: split_list(&string_var(
                    "MANDATORY_STYLES",
                    DEFAULT_MANDATORY_STYLES,
                )),
                allowed_segments: split_list(&string_var("ALLOWED_SEGMENTS", DEFAULT_SEGMENTS)),
                session_ttl_secs: parse_var("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
                sweep_interval_secs: parse_var("SESSION_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?
                    .max(1),
            },
            catalog: CatalogConfig {
                backend,
                bucket: string_var("S3_BUCKET", "ethos-style-images"),
                prefix: string_var("S3_PREFIX", "Styles/"),
                region: string_var("AWS_REGION", "us-east-1"),
                presigned_url_expiration_secs: parse_var("S3_PRESIGNED_URL_EXPIRATION", 3600)?,
                endpoint: env::var("S3_ENDPOINT").ok(),
                manifest_path: env::var("CATALOG_MANIFEST").ok().map(PathBuf::from),
                public_base_url: string_var("CATALOG_PUBLIC_BASE_URL", "http://localhost:5020/static"),
            },
            profiles: ProfileConfig {
                dir: env::var("PROFILE_DIR").ok().map(PathBuf::from),
            },
        })
    }
}
