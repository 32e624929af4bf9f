use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use anyhow::{Context, anyhow};
use tracing::{info, warn};

pub const BLOB_TOKEN: &str = "BLOB_READ_WRITE_TOKEN";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    File,
    Blob,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "file" => Ok(StorageKind::File),
            "blob" => Ok(StorageKind::Blob),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlobConfig {
    pub api_url: String,
    pub feedback_prefix: String,
    pub rounds_prefix: String,
    pub token: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub storage: StorageKind,
    pub feedback_dir: PathBuf,
    pub rounds_dir: PathBuf,
    pub blob: Option<BlobConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            storage: StorageKind::Memory,
            feedback_dir: PathBuf::from("feedback-data"),
            rounds_dir: PathBuf::from("feedback-rounds"),
            blob: None,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let storage: StorageKind = try_load(&lookup, "FEEDBACK_STORAGE", "memory")?;

        let blob = match storage {
            StorageKind::Blob => Some(BlobConfig {
                api_url: try_load(&lookup, "BLOB_API_URL", "https://blob.vercel-storage.com")?,
                feedback_prefix: try_load(&lookup, "BLOB_FEEDBACK_PREFIX", "point-feedback")?,
                rounds_prefix: try_load(&lookup, "BLOB_ROUNDS_PREFIX", "point-feedback-rounds")?,
                token: read_secret(BLOB_TOKEN).or_else(|_| {
                    lookup(BLOB_TOKEN).ok_or_else(|| anyhow!("{BLOB_TOKEN} is not configured"))
                })?,
            }),
            _ => None,
        };

        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", "3000")?,
            storage,
            feedback_dir: try_load(&lookup, "FEEDBACK_DIR", "feedback-data")?,
            rounds_dir: try_load(&lookup, "FEEDBACK_ROUNDS_DIR", "feedback-rounds")?,
            blob,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> anyhow::Result<T>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

fn read_secret(secret_name: &str) -> anyhow::Result<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            e
        })
        .with_context(|| format!("Secret {secret_name} unavailable"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.feedback_dir, PathBuf::from("feedback-data"));
        assert_eq!(config.rounds_dir, PathBuf::from("feedback-rounds"));
        assert!(config.blob.is_none());
    }

    #[test]
    fn test_file_backend() {
        let config = Config::from_lookup(lookup(&[
            ("RUST_PORT", "8080"),
            ("FEEDBACK_STORAGE", "File"),
            ("FEEDBACK_DIR", "/var/lib/pinpoint"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.feedback_dir, PathBuf::from("/var/lib/pinpoint"));
    }

    #[test]
    fn test_blob_backend_reads_token() {
        let config = Config::from_lookup(lookup(&[
            ("FEEDBACK_STORAGE", "blob"),
            (BLOB_TOKEN, "vercel_blob_rw_abc"),
        ]))
        .unwrap();

        let blob = config.blob.unwrap();
        assert_eq!(blob.token, "vercel_blob_rw_abc");
        assert_eq!(blob.feedback_prefix, "point-feedback");
        assert_eq!(blob.rounds_prefix, "point-feedback-rounds");
    }

    #[test]
    fn test_blob_backend_without_token_fails() {
        assert!(Config::from_lookup(lookup(&[("FEEDBACK_STORAGE", "blob")])).is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("RUST_PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("FEEDBACK_STORAGE", "redis")])).is_err());
    }
}
