use crate::fileinfo::FileInfo;
use crate::utils::nom_helper::{
    Endian, nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes,
};
use crate::utils::time::{filetime_to_unixepoch, unixepoch_to_iso};
use log::warn;
use nom::Needed;

/// Get fileinfo for Prefetch version 30 (Win10+)
pub(crate) fn parse_file_info_ver30(data: &[u8]) -> nom::IResult<&[u8], FileInfo> {
    let (input, file_array_offset) = nom_unsigned_four_bytes(data, Endian::Le)?;
    let (input, number_files) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, trace_chain_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, number_trace_chains) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, filename_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, filename_size) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let (input, volume_info_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, number_volumes) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, volume_info_size) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (mut input, _unknown) = nom_unsigned_eight_bytes(input, Endian::Le)?;

    let mut raw_run_times = Vec::new();
    let mut run_times = Vec::new();

    let max_runtime_count = 8;
    let mut count = 0;
    while count != max_runtime_count {
        let (runs_data, runtime) = nom_unsigned_eight_bytes(input, Endian::Le)?;

        raw_run_times.push(runtime);
        let no_runs = 0;
        if runtime != no_runs {
            run_times.push(unixepoch_to_iso(filetime_to_unixepoch(runtime)));
        }
        count += 1;
        input = runs_data;
    }

    // Version 30 has been seen with two (2) variants, told apart by where
    // the file metrics array starts
    let variant1 = 304; // Also matches version 26
    let variant2 = 296;

    let unknown2_size = if file_array_offset == variant1 {
        16
    } else if file_array_offset == variant2 {
        8
    } else {
        warn!("[prefetch] Unknown prefetch version 30 variant, metrics offset: {file_array_offset}");
        return Err(nom::Err::Incomplete(Needed::Unknown));
    };
    let (input, _unknown2) = nom_data(input, unknown2_size)?;

    let (input, run_count) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _unknown3) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _unknown4) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _unknown5) = nom_data(input, 4)?;

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
    use super::parse_file_info_ver30;

    #[test]
    fn test_parse_file_info_ver30() {
        let test_data = vec![
            40, 1, 0, 0, 64, 0, 0, 0, 40, 9, 0, 0, 107, 17, 0, 0, 128, 148, 0, 0, 104, 40, 0, 0,
            232, 188, 0, 0, 1, 0, 0, 0, 12, 10, 0, 0, 15, 0, 0, 0, 1, 0, 0, 0, 82, 30, 139, 29,
            242, 224, 216, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 232, 188, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];

        let (_, result) = parse_file_info_ver30(&test_data).unwrap();
        assert_eq!(result.file_array_offset, 296);
        assert_eq!(result.number_files, 64);
        assert_eq!(result.trace_chain_offset, 2344);
        assert_eq!(result.number_trace_chains, 4459);
        assert_eq!(result.filename_offset, 38016);
        assert_eq!(result.filename_size, 10344);
        assert_eq!(result.volume_info_offset, 48360);
        assert_eq!(result.number_volumes, 1);
        assert_eq!(result.volume_info_size, 2572);
        assert_eq!(result.run_count, 1);

        assert_eq!(result.raw_run_times.len(), 8);
        assert_eq!(result.raw_run_times[0], 0x1d8e0f21d8b1e52);
        assert_eq!(result.run_times, vec!["2022-10-15T23:59:08.000Z"]);
    }

    #[test]
    fn test_parse_file_info_ver30_unknown_variant() {
        // Metrics offset 128 matches neither known variant
        let mut test_data = vec![
            128, 0, 0, 0, 64, 0, 0, 0, 40, 9, 0, 0, 107, 17, 0, 0, 128, 148, 0, 0, 104, 40, 0, 0,
            232, 188, 0, 0, 1, 0, 0, 0, 12, 10, 0, 0,
        ];
        test_data.resize(224, 0);

        assert!(parse_file_info_ver30(&test_data).is_err());
    }
}
