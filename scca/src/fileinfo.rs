use crate::header::PrefetchVersion;
use crate::versions::{version17, version23, version26, version30};
use serde::Serialize;

/// The offset table every downstream section is located through, plus the
/// recorded execution history. Normalized from the four on-disk layouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub file_array_offset: u32,
    pub number_files: u32,
    pub trace_chain_offset: u32,
    pub number_trace_chains: u32,
    pub filename_offset: u32,
    pub filename_size: u32,
    pub volume_info_offset: u32,
    pub number_volumes: u32,
    pub volume_info_size: u32,
    /// Raw FILETIME ticks in on-disk order, most recent first. Unused slots
    /// stay zero.
    pub raw_run_times: Vec<u64>,
    /// Recorded executions rendered as ISO8601, most recent first
    pub run_times: Vec<String>,
    pub run_count: u32,
}

/// Bytes covering the version's file information block, directly after the header
pub(crate) fn file_info_size(version: PrefetchVersion) -> usize {
    match version {
        PrefetchVersion::Xp => 68,
        PrefetchVersion::Seven => 156,
        PrefetchVersion::Eight => 224,
        PrefetchVersion::Ten => 224,
    }
}

/// Dispatch to the file information layout selected by the header version
pub(crate) fn get_file_info(
    data: &[u8],
    version: PrefetchVersion,
) -> nom::IResult<&[u8], FileInfo> {
    match version {
        PrefetchVersion::Xp => version17::parse_file_info_ver17(data),
        PrefetchVersion::Seven => version23::parse_file_info_ver23(data),
        PrefetchVersion::Eight => version26::parse_file_info_ver26(data),
        PrefetchVersion::Ten => version30::parse_file_info_ver30(data),
    }
}
