use crate::error::PrefetchError;
use crate::header::PrefetchVersion;
use crate::reader::{ReadSeek, read_at};
use crate::sections::Section;
use crate::utils::nom_helper::{Endian, nom_unsigned_eight_bytes, nom_unsigned_four_bytes};
use crate::utils::strings::extract_padded_utf16_string;
use crate::utils::time::{filetime_to_unixepoch, unixepoch_to_iso};
use log::{error, warn};
use serde::Serialize;

/// One volume the executable touched, with the offsets of its nested file
/// reference and directory string tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeInfo {
    /// Volume device path, `None` when the path read failed
    pub device_path: Option<String>,
    pub device_path_offset: u32,
    pub device_path_chars: u32,
    pub creation_time: String,
    pub raw_creation_time: u64,
    /// Serial number as uppercase hex
    pub serial: String,
    pub file_refs_offset: u32,
    pub file_refs_size: u32,
    pub directory_strings_offset: u32,
    pub number_directory_strings: u32,
}

/// Fixed record width per layout version. Only the shared 36 byte prefix is
/// decoded, the remainder is reserved.
pub(crate) fn volume_entry_size(version: PrefetchVersion) -> usize {
    match version {
        PrefetchVersion::Xp => 40,
        PrefetchVersion::Seven | PrefetchVersion::Eight => 104,
        PrefetchVersion::Ten => 96,
    }
}

/// Decode the volume information array. Fixed records are decoded at their
/// computed positions, so a device path read never shifts the next record.
pub(crate) fn parse_volumes_info<R: ReadSeek>(
    source: &mut R,
    version: PrefetchVersion,
    offset: u32,
    count: u32,
) -> Result<Vec<VolumeInfo>, PrefetchError> {
    let entry_size = volume_entry_size(version);
    let mut volumes = Vec::with_capacity(count as usize);

    for index in 0..count {
        let position = u64::from(offset) + u64::from(index) * entry_size as u64;
        let data = read_at(source, position, entry_size)?;
        let mut volume = match volume_fields(&data) {
            Ok((_, volume)) => volume,
            Err(err) => {
                error!("[prefetch] Failed to decode volume info entry {index}: {err:?}");
                return Err(PrefetchError::Section(Section::VolumesInfo));
            }
        };

        // Device path offset is relative to the volume table base
        let path_position = u64::from(offset) + u64::from(volume.device_path_offset);
        let path_size = volume.device_path_chars as usize * 2;
        match read_at(source, path_position, path_size) {
            Ok(path_data) => {
                volume.device_path = Some(extract_padded_utf16_string(&path_data));
            }
            Err(_) => {
                warn!("[prefetch] Could not read device path for volume {index}");
            }
        }

        volumes.push(volume);
    }

    Ok(volumes)
}

fn volume_fields(data: &[u8]) -> nom::IResult<&[u8], VolumeInfo> {
    let (input, device_path_offset) = nom_unsigned_four_bytes(data, Endian::Le)?;
    let (input, device_path_chars) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, raw_creation_time) = nom_unsigned_eight_bytes(input, Endian::Le)?;
    let (input, serial) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, file_refs_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, file_refs_size) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, directory_strings_offset) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, number_directory_strings) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let volume = VolumeInfo {
        device_path: None,
        device_path_offset,
        device_path_chars,
        creation_time: unixepoch_to_iso(filetime_to_unixepoch(raw_creation_time)),
        raw_creation_time,
        serial: format!("{serial:X}"),
        file_refs_offset,
        file_refs_size,
        directory_strings_offset,
        number_directory_strings,
    };
    Ok((input, volume))
}

#[cfg(test)]
mod tests {
    use super::{parse_volumes_info, volume_entry_size};
    use crate::header::PrefetchVersion;
    use std::io::Cursor;

    fn volume_record(
        path_offset: u32,
        path_chars: u32,
        entry_size: usize,
    ) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&path_offset.to_le_bytes());
        data.extend_from_slice(&path_chars.to_le_bytes());
        data.extend_from_slice(&0x1d8ecd228df8359u64.to_le_bytes());
        data.extend_from_slice(&0xd49d126fu32.to_le_bytes());
        data.extend_from_slice(&200u32.to_le_bytes());
        data.extend_from_slice(&24u32.to_le_bytes());
        data.extend_from_slice(&224u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.resize(entry_size, 0);
        data
    }

    #[test]
    fn test_parse_volumes_info() {
        let entry_size = volume_entry_size(PrefetchVersion::Seven);
        let mut data = volume_record(104, 7, entry_size);
        for unit in "\\DEVICE".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }

        let mut source = Cursor::new(data);
        let volumes = parse_volumes_info(&mut source, PrefetchVersion::Seven, 0, 1).unwrap();
        assert_eq!(volumes.len(), 1);

        let volume = &volumes[0];
        assert_eq!(volume.device_path.as_deref(), Some("\\DEVICE"));
        assert_eq!(volume.device_path_offset, 104);
        assert_eq!(volume.device_path_chars, 7);
        assert_eq!(volume.creation_time, "2022-10-31T02:40:38.000Z");
        assert_eq!(volume.serial, "D49D126F");
        assert_eq!(volume.file_refs_offset, 200);
        assert_eq!(volume.file_refs_size, 24);
        assert_eq!(volume.directory_strings_offset, 224);
        assert_eq!(volume.number_directory_strings, 2);
    }

    #[test]
    fn test_parse_volumes_info_empty_device_path() {
        let entry_size = volume_entry_size(PrefetchVersion::Ten);
        let data = volume_record(96, 0, entry_size);

        let mut source = Cursor::new(data);
        let volumes = parse_volumes_info(&mut source, PrefetchVersion::Ten, 0, 1).unwrap();
        assert_eq!(volumes[0].device_path.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_volumes_info_bad_device_path_is_entry_level() {
        let entry_size = volume_entry_size(PrefetchVersion::Seven);
        // Path offset points far past the end of the source
        let data = volume_record(4096, 12, entry_size);

        let mut source = Cursor::new(data);
        let volumes = parse_volumes_info(&mut source, PrefetchVersion::Seven, 0, 1).unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].device_path, None);
        assert_eq!(volumes[0].serial, "D49D126F");
    }
}
