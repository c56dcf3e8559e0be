use crate::error::RenameError;
use crate::fs::FileSystem;
use crate::metadata::{CaptureTime, MetadataDecoder, MetadataSet, TimestampSource};
use chrono::{DateTime, Local};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// 埋め込みメタデータの撮影時刻を優先し、タグがなければ更新時刻を使う。
/// タグ欠落以外のメタデータエラーはそのファイルの失敗として返す。
pub fn resolve_timestamp<F, D>(fs: &F, decoder: &D, path: &Path) -> Result<CaptureTime, RenameError>
where
    F: FileSystem,
    D: MetadataDecoder,
{
    let decoded = {
        let file = fs.open(path).map_err(|source| RenameError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        decoder
            .decode(&mut reader)
            .and_then(|metadata| metadata.timestamp())
    };

    match decoded {
        Ok(at) => Ok(CaptureTime {
            at,
            source: TimestampSource::Exif,
        }),
        Err(err) if err.is_tag_not_present() => {
            let modified = fs.modified(path).map_err(|source| RenameError::Modified {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), "撮影時刻タグがないため更新時刻を使用します");
            Ok(CaptureTime {
                at: DateTime::<Local>::from(modified).naive_local(),
                source: TimestampSource::FallbackFileModified,
            })
        }
        Err(source) => Err(RenameError::Decode {
            path: path.to_path_buf(),
            source,
        }),
    }
}
