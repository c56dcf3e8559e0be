use crate::batch::BatchOptions;
use crate::naming::{NamingConfig, DEFAULT_COUNTER_WIDTH, DEFAULT_DATETIME_FORMAT};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 設定ファイルに保存できる既定値。コマンドラインの指定が優先される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub prefix: String,
    pub suffix: String,
    pub datetime_format: String,
    pub counter_width: usize,
    pub continue_on_error: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            counter_width: DEFAULT_COUNTER_WIDTH,
            continue_on_error: false,
        }
    }
}

/// コマンドラインで明示された値。`None` は設定ファイルの値を使う。
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub datetime_format: Option<String>,
    pub counter_width: Option<usize>,
    pub continue_on_error: bool,
    pub dry_run: bool,
}

impl AppConfig {
    pub fn resolve(&self, overrides: Overrides) -> Result<(NamingConfig, BatchOptions)> {
        let naming = NamingConfig::new(
            overrides.prefix.unwrap_or_else(|| self.prefix.clone()),
            overrides.suffix.unwrap_or_else(|| self.suffix.clone()),
            overrides
                .datetime_format
                .unwrap_or_else(|| self.datetime_format.clone()),
            overrides.counter_width.unwrap_or(self.counter_width),
            overrides.dry_run,
        )
        .context("命名設定が不正です")?;
        let options = BatchOptions {
            continue_on_error: overrides.continue_on_error || self.continue_on_error,
        };
        Ok((naming, options))
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "exifrename", "exifrename")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

/// `explicit` が指定されていればそのファイルを必ず読み、なければ既定の場所を探す。
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let paths = app_paths()?;
            if !paths.config_path.exists() {
                return Ok(AppConfig::default());
            }
            paths.config_path
        }
    };
    read_config(&path)
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("設定ファイルのパースに失敗しました: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{load_config, AppConfig, Overrides};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn partial_config_file_keeps_defaults_for_missing_keys() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "prefix = \"vac_\"\ncounter_width = 3\n").expect("write config");

        let config = load_config(Some(&path)).expect("load");
        assert_eq!(config.prefix, "vac_");
        assert_eq!(config.counter_width, 3);
        assert_eq!(config.datetime_format, AppConfig::default().datetime_format);
        assert!(!config.continue_on_error);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let err = load_config(Some(&temp.path().join("nope.toml"))).expect_err("missing");
        assert!(err.to_string().contains("設定ファイルを読めませんでした"));
    }

    #[test]
    fn broken_config_reports_parse_failure() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "counter_width = \"wide\"").expect("write config");
        let err = load_config(Some(&path)).expect_err("type mismatch");
        assert!(err.to_string().contains("設定ファイルのパースに失敗しました"));
    }

    #[test]
    fn command_line_values_override_file_defaults() {
        let file = AppConfig {
            prefix: "file_".to_string(),
            suffix: "_x".to_string(),
            counter_width: 4,
            continue_on_error: true,
            ..AppConfig::default()
        };

        let (naming, options) = file
            .resolve(Overrides {
                prefix: Some("cli_".to_string()),
                counter_width: Some(1),
                dry_run: true,
                ..Overrides::default()
            })
            .expect("resolve");
        assert_eq!(naming.prefix(), "cli_");
        assert_eq!(naming.suffix(), "_x");
        assert_eq!(naming.counter_width(), 1);
        assert!(naming.dry_run());
        assert!(options.continue_on_error);
    }

    #[test]
    fn invalid_format_from_file_is_rejected() {
        let file = AppConfig {
            datetime_format: "%Y/%m".to_string(),
            ..AppConfig::default()
        };
        let err = file.resolve(Overrides::default()).expect_err("separator");
        assert!(format!("{err:#}").contains("パス区切り文字"));
    }
}
