//! # Configuration Loader / 配置加载器
//!
//! ## Responsibilities / 职责
//!
//! - ✅ Locate the TOML configuration file / 定位 TOML 配置文件
//! - ✅ Parse TOML into AppConfig / 将 TOML 解析为 AppConfig
//! - ✅ Report I/O and parsing errors with context / 报告带上下文的 I/O 和解析错误
//!
//! ## Prohibited / 禁止事项
//!
//! ❌ **No gateway validation / 禁止网关校验** (the gateway adapter rejects a missing base URL)

use std::path::{Path, PathBuf};

use anyhow::Context;
use wl_core::config::AppConfig;

/// Environment variable naming the config file when `--config` is absent
pub const CONFIG_PATH_ENV: &str = "WALINK_CONFIG";

/// Config file looked up in the working directory as a last resort
pub const DEFAULT_CONFIG_FILE: &str = "walink.toml";

/// Pick the config path: explicit flag, then `WALINK_CONFIG`, then `walink.toml`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    resolve_from_sources(explicit, std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
}

fn resolve_from_sources(explicit: Option<PathBuf>, from_env: Option<PathBuf>) -> PathBuf {
    explicit
        .or(from_env.filter(|path| !path.as_os_str().is_empty()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// Missing sections and keys take their defaults.
///
/// # Errors / 错误
///
/// - File cannot be read (I/O error)
/// - Content is not valid TOML or does not match `AppConfig`
pub fn load_config(config_path: PathBuf) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    AppConfig::from_toml_str(&content).context("Failed to parse config as TOML")
}

/// Like [`load_config`], but a missing default file yields the defaults.
///
/// An explicitly requested path must exist.
pub fn load_or_default(config_path: &Path, explicit: bool) -> anyhow::Result<AppConfig> {
    if !explicit && !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config file found, using defaults");
        return Ok(AppConfig::default());
    }
    load_config(config_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_reads_valid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
            [gateway]
            base_url = "https://example.supabase.co/functions/v1"
            anon_key = "anon"

            [pairing]
            timeout_ms = 45000
            "#,
        )
        .unwrap();

        let config = load_config(file.path().to_path_buf()).unwrap();

        assert_eq!(
            config.gateway.base_url,
            "https://example.supabase.co/functions/v1"
        );
        assert_eq!(config.gateway.anon_key.as_deref(), Some("anon"));
        assert_eq!(config.pairing.timeout_ms, 45_000);
        assert_eq!(config.pairing.tick_interval_ms, 4_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config_missing_file_has_path_in_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(path.clone()).unwrap_err();

        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[gateway\nbase_url = ").unwrap();

        let err = load_config(file.path().to_path_buf()).unwrap_err();

        assert!(err.to_string().contains("Failed to parse config as TOML"));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let config = load_or_default(&path, false).unwrap();
        assert!(config.gateway.base_url.is_empty());

        assert!(load_or_default(&path, true).is_err());
    }

    #[test]
    fn test_resolve_config_path_precedence() {
        assert_eq!(
            resolve_from_sources(Some("a.toml".into()), Some("b.toml".into())),
            PathBuf::from("a.toml")
        );
        assert_eq!(
            resolve_from_sources(None, Some("b.toml".into())),
            PathBuf::from("b.toml")
        );
        assert_eq!(
            resolve_from_sources(None, Some(PathBuf::new())),
            PathBuf::from(DEFAULT_CONFIG_FILE)
        );
        assert_eq!(
            resolve_from_sources(None, None),
            PathBuf::from(DEFAULT_CONFIG_FILE)
        );
    }
}
