//! テスト用のデコーダとファイルシステム。

use crate::fs::{FileSystem, StdFileSystem};
use crate::metadata::{MetadataDecoder, MetadataError, MetadataSet};
use chrono::NaiveDateTime;
use std::cell::Cell;
use std::fs::File;
use std::io::{self, BufRead, Seek};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const NO_DATE: &str = "no-date";
pub const CORRUPT: &str = "corrupt";

/// ファイル本文を `%Y-%m-%dT%H:%M:%S` の撮影時刻として読むデコーダ。
/// `no-date` はタグなし、`corrupt` は解析失敗として扱う。
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureDecoder;

pub struct FixtureMetadata(Option<NaiveDateTime>);

impl MetadataSet for FixtureMetadata {
    fn timestamp(&self) -> Result<NaiveDateTime, MetadataError> {
        self.0.ok_or(MetadataError::TagNotPresent)
    }
}

impl MetadataDecoder for FixtureDecoder {
    type Metadata = FixtureMetadata;

    fn decode<R: BufRead + Seek>(&self, reader: &mut R) -> Result<FixtureMetadata, MetadataError> {
        let mut body = String::new();
        reader
            .read_to_string(&mut body)
            .map_err(|_| MetadataError::Decode(exif::Error::InvalidFormat("unreadable")))?;
        match body.trim() {
            NO_DATE => Ok(FixtureMetadata(None)),
            CORRUPT => Err(MetadataError::Decode(exif::Error::InvalidFormat(
                "corrupt fixture",
            ))),
            raw => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .map(|at| FixtureMetadata(Some(at)))
                .map_err(|err| MetadataError::InvalidTimestamp(err.to_string())),
        }
    }
}

/// 指定した呼び出し番号(0始まり)のリネームだけを失敗させる。
#[derive(Debug)]
pub struct FailingRenameFs {
    failing_calls: Vec<usize>,
    calls: Cell<usize>,
}

impl FailingRenameFs {
    pub fn failing_calls(failing_calls: &[usize]) -> Self {
        Self {
            failing_calls: failing_calls.to_vec(),
            calls: Cell::new(0),
        }
    }
}

impl FileSystem for FailingRenameFs {
    type Reader = File;

    fn exists(&self, path: &Path) -> bool {
        StdFileSystem.exists(path)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        StdFileSystem.modified(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.failing_calls.contains(&call) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "injected rename failure",
            ));
        }
        StdFileSystem.rename(from, to)
    }

    fn open(&self, path: &Path) -> io::Result<File> {
        StdFileSystem.open(path)
    }
}

/// 相対パスを指定のディレクトリ基準で解決する。カレントディレクトリを変えずに相対パスを試すため。
#[derive(Debug)]
pub struct RootedFs {
    root: PathBuf,
}

impl RootedFs {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileSystem for RootedFs {
    type Reader = File;

    fn exists(&self, path: &Path) -> bool {
        StdFileSystem.exists(&self.resolve(path))
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        StdFileSystem.modified(&self.resolve(path))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        StdFileSystem.rename(&self.resolve(from), &self.resolve(to))
    }

    fn open(&self, path: &Path) -> io::Result<File> {
        StdFileSystem.open(&self.resolve(path))
    }
}
