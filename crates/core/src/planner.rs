use crate::error::{FailureKind, RenameError};
use crate::fs::FileSystem;
use crate::metadata::{CaptureTime, MetadataDecoder};
use crate::naming::{extension_with_dot, probe_name, source_dir, NamingConfig};
use crate::resolver::resolve_timestamp;
use crate::staging::StagingNames;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RenameStatus {
    Renamed,
    /// 決定した名前が現在の名前と同じ。
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub source_path: PathBuf,
    pub resolved_timestamp: Option<CaptureTime>,
    pub final_name: Option<String>,
    pub status: RenameStatus,
    pub failure: Option<FailureKind>,
    pub error_detail: Option<String>,
}

impl RenameOutcome {
    fn pending(source_path: &Path) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            resolved_timestamp: None,
            final_name: None,
            status: RenameStatus::Failed,
            failure: None,
            error_detail: None,
        }
    }

    pub(crate) fn failed(source_path: &Path, err: &RenameError) -> Self {
        Self::pending(source_path).fail(err)
    }

    fn fail(mut self, err: &RenameError) -> Self {
        self.status = RenameStatus::Failed;
        self.failure = Some(err.kind());
        self.error_detail = Some(err.detail());
        self
    }
}

struct Slot {
    probe_path: PathBuf,
    final_path: PathBuf,
    final_name: String,
}

/// 1回の実行ぶんのリネーム状態。一時名の払い出しと、同じ実行内で確保済みの名前を保持する。
pub struct RenameSession<'a, F, D> {
    fs: &'a F,
    decoder: &'a D,
    config: &'a NamingConfig,
    staging: StagingNames,
    reserved: HashSet<PathBuf>,
    /// dry-run で移動済みとみなす元ファイルのパス。
    vacated: HashSet<PathBuf>,
}

impl<'a, F, D> RenameSession<'a, F, D>
where
    F: FileSystem,
    D: MetadataDecoder,
{
    pub fn new(fs: &'a F, decoder: &'a D, config: &'a NamingConfig) -> Self {
        Self {
            fs,
            decoder,
            config,
            staging: StagingNames::new(),
            reserved: HashSet::new(),
            vacated: HashSet::new(),
        }
    }

    /// 1ファイルを処理する。ファイル単位の失敗は `Failed` の結果として返し、
    /// 一時名のまま取り残した場合だけ `Err` を返す。
    pub fn process(&mut self, path: &Path) -> Result<RenameOutcome, RenameError> {
        let mut outcome = RenameOutcome::pending(path);
        match self.rename_file(path, &mut outcome) {
            Ok(()) => Ok(outcome),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => Ok(outcome.fail(&err)),
        }
    }

    fn rename_file(&mut self, path: &Path, outcome: &mut RenameOutcome) -> Result<(), RenameError> {
        if !self.fs.exists(path) {
            return Err(RenameError::NotFound(path.to_path_buf()));
        }

        let capture = resolve_timestamp(self.fs, self.decoder, path)?;
        outcome.resolved_timestamp = Some(capture);

        let stem = self.config.base_stem(&capture.at);
        let extension = extension_with_dot(path);
        // 同じディレクトリの表記揺れ(`a.JPG` と `./b.JPG`)を同じキーにそろえる
        let parent = source_dir(path);
        let source_key = path
            .file_name()
            .map(|name| parent.join(name))
            .unwrap_or_else(|| path.to_path_buf());

        let slot = if self.config.dry_run() {
            self.first_available_slot(&parent, &stem, &extension, &source_key)
        } else {
            let staged = self.staging.next_path(self.fs, path);
            self.fs
                .rename(path, &staged)
                .map_err(|source| RenameError::Stage {
                    from: path.to_path_buf(),
                    to: staged.clone(),
                    source,
                })?;
            debug!(from = %path.display(), to = %staged.display(), "一時ファイル名へ退避しました");

            let slot = self.first_available_slot(&parent, &stem, &extension, &source_key);
            outcome.final_name = Some(slot.final_name.clone());
            self.commit(path, &staged, &slot.final_path)?;
            slot
        };

        info!("[RENAME] {} => {}", path.display(), slot.final_name);

        outcome.status = if path.file_name() == Some(OsStr::new(&slot.final_name)) {
            RenameStatus::Skipped
        } else {
            RenameStatus::Renamed
        };
        if self.config.dry_run() && outcome.status == RenameStatus::Renamed {
            self.vacated.insert(source_key);
        }
        outcome.final_name = Some(slot.final_name);
        self.reserved.insert(slot.probe_path);
        self.reserved.insert(slot.final_path);
        Ok(())
    }

    /// 装飾なしの probe 名で衝突を判定する。装飾後の名前が既にある場合も上書きせず次の番号へ進む。
    fn first_available_slot(
        &self,
        parent: &Path,
        stem: &str,
        extension: &str,
        source_path: &Path,
    ) -> Slot {
        let mut n = 0u64;
        loop {
            let counter = self.config.counter(n);
            let probe_path = parent.join(probe_name(stem, &counter, extension));
            let final_name = self.config.final_name(stem, &counter, extension);
            let final_path = parent.join(&final_name);
            if self.is_available(&probe_path, source_path)
                && self.is_available(&final_path, source_path)
            {
                return Slot {
                    probe_path,
                    final_path,
                    final_name,
                };
            }
            n += 1;
        }
    }

    fn is_available(&self, candidate: &Path, source_path: &Path) -> bool {
        if self.reserved.contains(candidate) {
            return false;
        }
        if candidate == source_path || self.vacated.contains(candidate) {
            return true;
        }
        !self.fs.exists(candidate)
    }

    fn commit(&self, original: &Path, staged: &Path, target: &Path) -> Result<(), RenameError> {
        let Err(source) = self.fs.rename(staged, target) else {
            return Ok(());
        };

        warn!(
            staged = %staged.display(),
            original = %original.display(),
            "最終リネームに失敗したため元の名前に戻します"
        );
        if let Err(rollback) = self.fs.rename(staged, original) {
            return Err(RenameError::Rollback {
                staged: staged.to_path_buf(),
                original: original.to_path_buf(),
                source: rollback,
            });
        }

        Err(RenameError::Commit {
            from: staged.to_path_buf(),
            to: target.to_path_buf(),
            source,
        })
    }
}
