use crate::error::RenameError;
use crate::exif_reader::ExifDecoder;
use crate::fs::{FileSystem, StdFileSystem};
use crate::metadata::MetadataDecoder;
use crate::naming::NamingConfig;
use crate::planner::{RenameOutcome, RenameSession, RenameStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct BatchOptions {
    /// false のときは最初に失敗したファイルで処理を打ち切る。
    pub continue_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchReport {
    pub dry_run: bool,
    pub outcomes: Vec<RenameOutcome>,
    pub aborted: bool,
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.aborted
    }

    fn push(&mut self, outcome: RenameOutcome) {
        match outcome.status {
            RenameStatus::Renamed => self.renamed += 1,
            RenameStatus::Skipped => self.skipped += 1,
            RenameStatus::Failed => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// 一時名のまま取り残したファイルがあり、バッチを打ち切った。
/// `report` にはそれまでの結果と取り残したファイルの失敗が入っている。
#[derive(Debug, Error)]
#[error("処理を中断しました({}件目で復旧不能なエラー)", report.outcomes.len())]
pub struct BatchError {
    pub report: BatchReport,
    pub source: RenameError,
}

pub fn rename_files(
    paths: &[PathBuf],
    config: &NamingConfig,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    rename_files_with(&StdFileSystem, &ExifDecoder, paths, config, options)
}

/// 入力順に1件ずつ処理する。一時名のまま取り残したファイルがある場合のみ `Err`。
pub fn rename_files_with<F, D>(
    fs: &F,
    decoder: &D,
    paths: &[PathBuf],
    config: &NamingConfig,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError>
where
    F: FileSystem,
    D: MetadataDecoder,
{
    let mut session = RenameSession::new(fs, decoder, config);
    let mut report = BatchReport {
        dry_run: config.dry_run(),
        ..BatchReport::default()
    };

    for (index, path) in paths.iter().enumerate() {
        let outcome = match session.process(path) {
            Ok(outcome) => outcome,
            Err(source) => {
                report.push(RenameOutcome::failed(path, &source));
                report.aborted = true;
                return Err(BatchError { report, source });
            }
        };
        let failed = outcome.status == RenameStatus::Failed;
        if failed {
            warn!(
                path = %path.display(),
                error = outcome.error_detail.as_deref().unwrap_or_default(),
                "リネームに失敗しました"
            );
        }
        report.push(outcome);

        if failed && !options.continue_on_error {
            let remaining = paths.len() - index - 1;
            if remaining > 0 {
                warn!(remaining, "失敗したため残りのファイルの処理を中止します");
            }
            report.aborted = true;
            break;
        }
    }

    Ok(report)
}
