use crate::metadata::MetadataError;
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("ファイルが存在しません: {}", .0.display())]
    NotFound(PathBuf),
    #[error("ファイルを開けませんでした: {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("メタデータを読めませんでした: {}", path.display())]
    Decode {
        path: PathBuf,
        source: MetadataError,
    },
    #[error("更新時刻を取得できませんでした: {}", path.display())]
    Modified { path: PathBuf, source: io::Error },
    #[error("一時リネームに失敗しました: {} -> {}", from.display(), to.display())]
    Stage {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("最終リネームに失敗しました: {} -> {}", from.display(), to.display())]
    Commit {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error(
        "最終リネーム失敗後のロールバックにも失敗しました: {} を {} に戻してください",
        staged.display(),
        original.display()
    )]
    Rollback {
        staged: PathBuf,
        original: PathBuf,
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Decode,
    Io,
    Rename,
}

impl RenameError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RenameError::NotFound(_) => FailureKind::NotFound,
            RenameError::Decode { .. } => FailureKind::Decode,
            RenameError::Open { .. } | RenameError::Modified { .. } => FailureKind::Io,
            RenameError::Stage { .. }
            | RenameError::Commit { .. }
            | RenameError::Rollback { .. } => FailureKind::Rename,
        }
    }

    /// 元の名前にも戻せずファイルが一時名のまま残った状態。バッチ継続の対象外。
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenameError::Rollback { .. })
    }

    /// 原因の連鎖を含めた1行の説明。
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}
