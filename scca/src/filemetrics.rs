use crate::header::PrefetchVersion;
use crate::reader::{ReadSeek, read_at};
use crate::references::FileReference;
use crate::utils::nom_helper::{Endian, nom_unsigned_eight_bytes, nom_unsigned_four_bytes};
use log::warn;
use serde::Serialize;

/// Metadata for one referenced file. Version 17 records carry no average
/// duration or NTFS reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMetric {
    pub start_time: u32,
    pub duration: u32,
    pub average_duration: Option<u32>,
    /// Offset of the matching filename string, relative to the string table
    pub filename_offset: u32,
    pub filename_chars: u32,
    pub flags: u32,
    pub file_reference: Option<FileReference>,
}

pub(crate) fn metric_entry_size(version: PrefetchVersion) -> usize {
    match version {
        PrefetchVersion::Xp => 20,
        PrefetchVersion::Seven | PrefetchVersion::Eight | PrefetchVersion::Ten => 32,
    }
}

/// Decode the file metrics array. The declared count is trusted; a record
/// that cannot be read becomes `None` without discarding earlier entries.
pub(crate) fn parse_file_metrics<R: ReadSeek>(
    source: &mut R,
    version: PrefetchVersion,
    offset: u32,
    count: u32,
) -> Vec<Option<FileMetric>> {
    let entry_size = metric_entry_size(version);
    let mut metrics = Vec::with_capacity(count as usize);

    for index in 0..count {
        let position = u64::from(offset) + u64::from(index) * entry_size as u64;
        let entry = read_at(source, position, entry_size)
            .ok()
            .and_then(|data| match metric_fields(&data, version) {
                Ok((_, metric)) => Some(metric),
                Err(_) => None,
            });
        if entry.is_none() {
            warn!("[prefetch] Could not decode file metrics entry {index} of {count}");
        }
        metrics.push(entry);
    }

    metrics
}

fn metric_fields(data: &[u8], version: PrefetchVersion) -> nom::IResult<&[u8], FileMetric> {
    let (input, start_time) = nom_unsigned_four_bytes(data, Endian::Le)?;
    let (input, duration) = nom_unsigned_four_bytes(input, Endian::Le)?;

    if version == PrefetchVersion::Xp {
        let (input, filename_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, filename_chars) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (input, flags) = nom_unsigned_four_bytes(input, Endian::Le)?;

        let metric = FileMetric {
            start_time,
            duration,
            average_duration: None,
            filename_offset,
            filename_chars,
            flags,
            file_reference: None,
        };
        return Ok((input, metric));
    }

    let (input, average_duration) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, filename_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, filename_chars) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, flags) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, raw_reference) = nom_unsigned_eight_bytes(input, Endian::Le)?;

    let metric = FileMetric {
        start_time,
        duration,
        average_duration: Some(average_duration),
        filename_offset,
        filename_chars,
        flags,
        file_reference: Some(FileReference::from_raw(raw_reference)),
    };
    Ok((input, metric))
}
