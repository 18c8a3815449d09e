use super::version30::parse_file_info_ver30;
use crate::fileinfo::FileInfo;

/// Parse Prefetch version 26
/// Format is nearly identical to version 30
pub(crate) fn parse_file_info_ver26(data: &[u8]) -> nom::IResult<&[u8], FileInfo> {
    parse_file_info_ver30(data)
}
