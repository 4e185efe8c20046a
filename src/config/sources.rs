use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "S3MIRROR_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/s3mirror.toml";
const ENV_PREFIX: &str = "S3MIRROR";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(config_path)?;
    apply_env(&mut config, |name| env::var(name).ok());

    Ok(config)
}

/// Fill gaps from the plain variable names older deployments use, and load
/// secrets, which are never stored in TOML files
fn apply_env(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if config.queue.url.is_empty() {
        if let Some(url) = var("SQS_QUEUE_URL") {
            config.queue.url = url;
        }
    }

    if config.storage.region.is_none() {
        config.storage.region = var("AWS_REGION");
    }
    if config.storage.endpoint.is_none() {
        config.storage.endpoint = var("AWS_ENDPOINT_URL");
    }

    config.storage.access_key = var("AWS_ACCESS_KEY_ID");
    config.storage.secret_key = var("AWS_SECRET_ACCESS_KEY");

    // DOWNLOAD_PATH beats the TOML file but yields to the prefixed variable
    if var("S3MIRROR__DOWNLOAD__ROOT").is_none() {
        if let Some(root) = var("DOWNLOAD_PATH") {
            config.download.root = PathBuf::from(root);
        }
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // S3MIRROR__QUEUE__URL -> queue.url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
