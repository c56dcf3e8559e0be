mod batch;
mod config;
mod error;
mod exif_reader;
mod fs;
mod metadata;
mod naming;
mod planner;
mod resolver;
mod staging;
#[cfg(test)]
mod testing;

pub use batch::{rename_files, rename_files_with, BatchError, BatchOptions, BatchReport};
pub use config::{app_paths, load_config, AppConfig, AppPaths, Overrides};
pub use error::{FailureKind, RenameError};
pub use exif_reader::{ExifDecoder, ExifMetadata};
pub use fs::{FileSystem, StdFileSystem};
pub use metadata::{CaptureTime, MetadataDecoder, MetadataError, MetadataSet, TimestampSource};
pub use naming::{
    format_counter, validate_datetime_format, NamingConfig, NamingError, DEFAULT_COUNTER_WIDTH,
    DEFAULT_DATETIME_FORMAT,
};
pub use planner::{RenameOutcome, RenameSession, RenameStatus};
pub use resolver::resolve_timestamp;
