use crate::fs::FileSystem;
use crate::naming::extension_with_dot;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

pub const STAGING_PREFIX: &str = ".exifrename_tmp_";

/// 退避用の一時ファイル名を払い出す。実行単位のトークンと連番で一意性を保つため、
/// 時計の分解能に依存しない。
#[derive(Debug)]
pub struct StagingNames {
    run_token: String,
    next: u64,
}

impl Default for StagingNames {
    fn default() -> Self {
        Self::new()
    }
}

impl StagingNames {
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self {
            run_token: format!("{}_{}", process::id(), now),
            next: 0,
        }
    }

    /// 元ファイルと同じディレクトリに、まだ存在しない一時パスを返す。拡張子は元のまま。
    pub fn next_path<F: FileSystem>(&mut self, fs: &F, original_path: &Path) -> PathBuf {
        let parent = original_path.parent().unwrap_or_else(|| Path::new("."));
        let extension = extension_with_dot(original_path);
        loop {
            let seq = self.next;
            self.next += 1;
            let candidate = parent.join(format!(
                "{}{}_{}{}",
                STAGING_PREFIX, self.run_token, seq, extension
            ));
            if !fs.exists(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StagingNames, STAGING_PREFIX};
    use crate::fs::StdFileSystem;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn staging_paths_are_unique_within_a_run() {
        let temp = tempdir().expect("tempdir");
        let original = temp.path().join("IMG_0001.JPG");
        let mut names = StagingNames::new();

        let first = names.next_path(&StdFileSystem, &original);
        let second = names.next_path(&StdFileSystem, &original);
        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(temp.path()));
    }

    #[test]
    fn staging_path_keeps_extension_and_is_hidden() {
        let temp = tempdir().expect("tempdir");
        let original = temp.path().join("IMG_0001.JPG");
        let mut names = StagingNames::new();

        let staged = names.next_path(&StdFileSystem, &original);
        let name = staged
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .expect("file name");
        assert!(name.starts_with(STAGING_PREFIX));
        assert!(name.ends_with(".JPG"));
    }

    #[test]
    fn staging_skips_names_that_already_exist() {
        let temp = tempdir().expect("tempdir");
        let original = temp.path().join("IMG_0001.JPG");
        let mut probe = StagingNames::new();
        let mut names = StagingNames {
            run_token: probe.run_token.clone(),
            next: 0,
        };

        let occupied = probe.next_path(&StdFileSystem, &original);
        fs::write(&occupied, b"x").expect("occupy first staging name");

        let staged = names.next_path(&StdFileSystem, &original);
        assert_ne!(staged, occupied);
        assert!(!staged.exists());
    }
}
