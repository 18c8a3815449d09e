use crate::fileinfo::FileInfo;
use crate::utils::nom_helper::{
    Endian, nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes,
};
use crate::utils::time::{filetime_to_unixepoch, unixepoch_to_iso};
use std::mem::size_of;

/// Get fileinfo for Prefetch version 23 (Win7). Stores a single run time.
pub(crate) fn parse_file_info_ver23(data: &[u8]) -> nom::IResult<&[u8], FileInfo> {
    let (input, file_array_offset) = nom_unsigned_four_bytes(data, Endian::Le)?;
    let (input, number_files) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, trace_chain_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, number_trace_chains) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, filename_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, filename_size) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let (input, volume_info_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, number_volumes) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, volume_info_size) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _unknown) = nom_unsigned_eight_bytes(input, Endian::Le)?;

    let (input, runtime) = nom_unsigned_eight_bytes(input, Endian::Le)?;
    let raw_run_times = vec![runtime];
    let mut run_times = Vec::new();
    let no_runs = 0;
    if runtime != no_runs {
        run_times.push(unixepoch_to_iso(filetime_to_unixepoch(runtime)));
    }

    let (input, _unknown2) = nom_data(input, size_of::<u128>() as u64)?;

    let (input, run_count) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _unknown3) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let unknown_size = 80;
    let (input, _unknown4) = nom_data(input, unknown_size)?;

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

#[cfg(test)]
mod tests {
    use super::parse_file_info_ver23;

    #[test]
    fn test_parse_file_info_ver23() {
        let test_data = vec![
            240, 0, 0, 0, 58, 0, 0, 0, 48, 8, 0, 0, 139, 6, 0, 0, 180, 86, 0, 0, 112, 25, 0, 0,
            40, 112, 0, 0, 1, 0, 0, 0, 102, 8, 0, 0, 12, 0, 0, 0, 1, 0, 0, 0, 89, 131, 223, 40,
            210, 236, 216, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 45, 0, 0, 0, 1, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0,
        ];

        let (_, result) = parse_file_info_ver23(&test_data).unwrap();
        assert_eq!(result.file_array_offset, 240);
        assert_eq!(result.number_files, 58);
        assert_eq!(result.trace_chain_offset, 2096);
        assert_eq!(result.number_trace_chains, 1675);
        assert_eq!(result.filename_offset, 22196);
        assert_eq!(result.filename_size, 6512);
        assert_eq!(result.volume_info_offset, 28712);
        assert_eq!(result.number_volumes, 1);
        assert_eq!(result.volume_info_size, 2150);
        assert_eq!(result.run_count, 45);
        assert_eq!(result.raw_run_times, vec![0x1d8ecd228df8359]);
        assert_eq!(result.run_times, vec!["2022-10-31T02:40:38.000Z"]);
    }

    #[test]
    fn test_parse_file_info_ver23_never_run() {
        let mut test_data = vec![
            240, 0, 0, 0, 58, 0, 0, 0, 48, 8, 0, 0, 139, 6, 0, 0, 180, 86, 0, 0, 112, 25, 0, 0,
            40, 112, 0, 0, 1, 0, 0, 0, 102, 8, 0, 0,
        ];
        test_data.resize(156, 0);

        let (_, result) = parse_file_info_ver23(&test_data).unwrap();
        assert_eq!(result.raw_run_times, vec![0]);
        assert_eq!(result.run_times.len(), 0);
        assert_eq!(result.run_count, 0);
    }
}
