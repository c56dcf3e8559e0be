use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::Path;
use std::time::SystemTime;

/// リネーム処理が依存するファイルシステム操作。
pub trait FileSystem {
    type Reader: Read + Seek;

    fn exists(&self, path: &Path) -> bool;
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn open(&self, path: &Path) -> io::Result<Self::Reader>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    type Reader = File;

    fn exists(&self, path: &Path) -> bool {
        // 壊れたシンボリックリンクも名前としては存在する
        fs::symlink_metadata(path).is_ok()
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn open(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }
}
