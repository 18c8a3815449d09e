use crate::fileinfo::FileInfo;
use crate::utils::nom_helper::{
    Endian, nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes,
};
use crate::utils::time::{filetime_to_unixepoch, unixepoch_to_iso};
use std::mem::size_of;

/// Get fileinfo for Prefetch version 17 (WinXP). The oldest layout, no
/// leading unknown block before the run time.
pub(crate) fn parse_file_info_ver17(data: &[u8]) -> nom::IResult<&[u8], FileInfo> {
    let (input, file_array_offset) = nom_unsigned_four_bytes(data, Endian::Le)?;
    let (input, number_files) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, trace_chain_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, number_trace_chains) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, filename_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, filename_size) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let (input, volume_info_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, number_volumes) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, volume_info_size) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let (input, runtime) = nom_unsigned_eight_bytes(input, Endian::Le)?;
    let raw_run_times = vec![runtime];
    let mut run_times = Vec::new();
    let no_runs = 0;
    if runtime != no_runs {
        run_times.push(unixepoch_to_iso(filetime_to_unixepoch(runtime)));
    }

    let (input, _unknown) = nom_data(input, size_of::<u128>() as u64)?;

    let (input, run_count) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _unknown2) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let info = FileInfo {
        file_array_offset,
        number_files,
        trace_chain_offset,
        number_trace_chains,
        filename_offset,
        filename_size,
        volume_info_offset,
        number_volumes,
        volume_info_size,
        raw_run_times,
        run_times,
        run_count,
    };

    Ok((input, info))
}
