use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// 例: 20230501_102030
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const DEFAULT_COUNTER_WIDTH: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("日付時刻フォーマットが空です")]
    EmptyFormat,
    #[error("日付時刻フォーマットが不正です: {0}")]
    InvalidFormat(String),
    #[error("{field}にパス区切り文字は使用できません: {value}")]
    PathSeparator { field: &'static str, value: String },
}

/// 1回の実行で共有される命名設定。生成時に検証済み。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamingConfig {
    prefix: String,
    suffix: String,
    datetime_format: String,
    counter_width: usize,
    dry_run: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            counter_width: DEFAULT_COUNTER_WIDTH,
            dry_run: false,
        }
    }
}

impl NamingConfig {
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        datetime_format: impl Into<String>,
        counter_width: usize,
        dry_run: bool,
    ) -> Result<Self, NamingError> {
        let config = Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            datetime_format: datetime_format.into(),
            counter_width,
            dry_run,
        };
        reject_separator("プレフィックス", &config.prefix)?;
        reject_separator("サフィックス", &config.suffix)?;
        validate_datetime_format(&config.datetime_format)?;
        Ok(config)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn datetime_format(&self) -> &str {
        &self.datetime_format
    }

    pub fn counter_width(&self) -> usize {
        self.counter_width
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn base_stem(&self, at: &NaiveDateTime) -> String {
        at.format(&self.datetime_format).to_string()
    }

    pub fn counter(&self, value: u64) -> String {
        format_counter(value, self.counter_width)
    }

    pub fn final_name(&self, stem: &str, counter: &str, extension_with_dot: &str) -> String {
        format!(
            "{}{}{}{}{}",
            self.prefix, stem, counter, self.suffix, extension_with_dot
        )
    }
}

/// 衝突判定に使う装飾なしの名前。
pub fn probe_name(stem: &str, counter: &str, extension_with_dot: &str) -> String {
    format!("{}{}{}", stem, counter, extension_with_dot)
}

/// 桁数に満たない値はゼロ埋め、超える値は切り詰めずにそのまま出力する。
pub fn format_counter(value: u64, width: usize) -> String {
    format!("_{:0width$}", value, width = width)
}

pub fn extension_with_dot(path: &Path) -> String {
    path.extension()
        .map(|v| format!(".{}", v.to_string_lossy()))
        .unwrap_or_default()
}

/// 元ファイルのディレクトリ。`.` 成分を取り除き、空なら `.` を返す。
pub fn source_dir(path: &Path) -> PathBuf {
    let dir: PathBuf = path
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter(|component| !matches!(component, Component::CurDir))
                .collect()
        })
        .unwrap_or_default();
    if dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        dir
    }
}

pub fn validate_datetime_format(format: &str) -> Result<(), NamingError> {
    if format.is_empty() {
        return Err(NamingError::EmptyFormat);
    }

    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(NamingError::InvalidFormat(format.to_string()));
    }

    // タイムゾーン指定子などはNaiveDateTimeで描画できないため、ここで一度描画して確かめる。
    let sample = NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| NamingError::InvalidFormat(format.to_string()))?;
    let mut rendered = String::new();
    write!(rendered, "{}", sample.format_with_items(items.into_iter()))
        .map_err(|_| NamingError::InvalidFormat(format.to_string()))?;

    if rendered.is_empty() {
        return Err(NamingError::EmptyFormat);
    }
    reject_separator("日付時刻フォーマット", &rendered)
}

fn reject_separator(field: &'static str, value: &str) -> Result<(), NamingError> {
    if value.contains(['/', '\\']) {
        return Err(NamingError::PathSeparator {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
