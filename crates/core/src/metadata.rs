use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Seek};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimestampSource {
    Exif,
    FallbackFileModified,
}

/// ファイル名の元になる撮影時刻。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureTime {
    pub at: NaiveDateTime,
    pub source: TimestampSource,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    /// 撮影時刻タグが存在しない。更新時刻へのフォールバック対象。
    #[error("撮影時刻タグがありません")]
    TagNotPresent,
    #[error("メタデータを解析できませんでした: {0}")]
    Decode(#[from] exif::Error),
    #[error("撮影時刻の値が不正です: {0}")]
    InvalidTimestamp(String),
}

impl MetadataError {
    pub fn is_tag_not_present(&self) -> bool {
        matches!(self, MetadataError::TagNotPresent)
    }
}

pub trait MetadataSet {
    fn timestamp(&self) -> Result<NaiveDateTime, MetadataError>;
}

pub trait MetadataDecoder {
    type Metadata: MetadataSet;

    fn decode<R: BufRead + Seek>(&self, reader: &mut R) -> Result<Self::Metadata, MetadataError>;
}
