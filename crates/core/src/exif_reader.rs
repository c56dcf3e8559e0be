use crate::metadata::{MetadataDecoder, MetadataError, MetadataSet};
use chrono::{NaiveDate, NaiveDateTime};
use exif::{DateTime, Exif, In, Reader, Tag, Value};
use std::io::{BufRead, Seek};

/// 優先順。SubSec系タグは同じ行のものを組み合わせる。
const DATE_TAGS: &[(Tag, Tag)] = &[
    (Tag::DateTimeOriginal, Tag::SubSecTimeOriginal),
    (Tag::DateTimeDigitized, Tag::SubSecTimeDigitized),
    (Tag::DateTime, Tag::SubSecTime),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ExifDecoder;

impl MetadataDecoder for ExifDecoder {
    type Metadata = ExifMetadata;

    fn decode<R: BufRead + Seek>(&self, reader: &mut R) -> Result<ExifMetadata, MetadataError> {
        let exif = Reader::new().read_from_container(reader)?;
        Ok(ExifMetadata { exif })
    }
}

pub struct ExifMetadata {
    exif: Exif,
}

impl MetadataSet for ExifMetadata {
    fn timestamp(&self) -> Result<NaiveDateTime, MetadataError> {
        let (field, subsec_tag) = DATE_TAGS
            .iter()
            .find_map(|(tag, subsec)| {
                self.exif
                    .get_field(*tag, In::PRIMARY)
                    .map(|field| (field, *subsec))
            })
            .ok_or(MetadataError::TagNotPresent)?;

        let raw = match &field.value {
            Value::Ascii(values) => values.first().map(Vec::as_slice).unwrap_or_default(),
            other => {
                return Err(MetadataError::InvalidTimestamp(format!(
                    "{:?}: {:?}",
                    field.tag, other
                )))
            }
        };

        if is_blank(raw) {
            return Err(MetadataError::TagNotPresent);
        }

        let mut datetime = DateTime::from_ascii(raw).map_err(|err| {
            MetadataError::InvalidTimestamp(format!("{}: {}", String::from_utf8_lossy(raw), err))
        })?;

        if let Some(Value::Ascii(values)) = self
            .exif
            .get_field(subsec_tag, In::PRIMARY)
            .map(|field| &field.value)
        {
            if let Some(subsec) = values.first() {
                // 壊れたサブ秒は秒精度のまま扱う
                let _ = datetime.parse_subsec(subsec);
            }
        }

        to_naive(&datetime)
    }
}

/// 時刻不明のカメラは空白やゼロ埋めの値を書き込む。
fn is_blank(raw: &[u8]) -> bool {
    raw.iter()
        .all(|b| matches!(b, b' ' | b':' | b'0' | b'\0'))
}

fn to_naive(datetime: &DateTime) -> Result<NaiveDateTime, MetadataError> {
    NaiveDate::from_ymd_opt(
        i32::from(datetime.year),
        u32::from(datetime.month),
        u32::from(datetime.day),
    )
    .and_then(|date| {
        date.and_hms_nano_opt(
            u32::from(datetime.hour),
            u32::from(datetime.minute),
            u32::from(datetime.second),
            datetime.nanosecond.unwrap_or(0),
        )
    })
    .ok_or_else(|| MetadataError::InvalidTimestamp(datetime.to_string()))
}
