use chrono::{DateTime, Datelike, Local};
use log::debug;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::{DateBucketing, Granularity};
use crate::types::FileRecord;

/// Target path of a file: `base/category[/bucket]/file_name`.
///
/// Pure path arithmetic; directories are created by the mover.
pub fn destination_path(
    base_dir: &Path,
    category: &str,
    bucketing: &DateBucketing,
    record: &FileRecord,
) -> PathBuf {
    let mut target = base_dir.join(category);

    if bucketing.enabled {
        let timestamp = bucket_timestamp(record, bucketing.use_creation_time);
        target.push(date_bucket(timestamp, bucketing.granularity));
    }

    target.join(record.file_name())
}

/// Timestamp used for bucketing.
///
/// Creation time is requested but not every platform or filesystem reports
/// one; modification time stands in when it is missing.
pub fn bucket_timestamp(record: &FileRecord, use_creation_time: bool) -> SystemTime {
    if !use_creation_time {
        return record.modified;
    }

    match record.created {
        Some(created) => created,
        None => {
            debug!(
                "No creation time for {}, bucketing by modification time",
                record.path.display()
            );
            record.modified
        }
    }
}

/// Folder name for a timestamp in local time, `2024-03` or `2024-Q1`
pub fn date_bucket(timestamp: SystemTime, granularity: Granularity) -> String {
    let date: DateTime<Local> = timestamp.into();

    match granularity {
        Granularity::Monthly => date.format("%Y-%m").to_string(),
        Granularity::Quarterly => format!("{}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
    }
}
