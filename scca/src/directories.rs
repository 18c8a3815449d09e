use crate::error::PrefetchError;
use crate::reader::ReadSeek;
use crate::utils::strings::extract_padded_utf16_string;
use byteorder::{LittleEndian, ReadBytesExt};
use log::warn;
use std::io::{Read, Seek, SeekFrom};

/// Decode every volume's directory string table, located relative to the
/// volume information base. Each string is a u16 character count followed by
/// the UTF16 run and its terminator. One bad string becomes `None` without
/// stopping the rest.
pub(crate) fn parse_directory_strings<R: ReadSeek>(
    source: &mut R,
    base_offset: u32,
    tables: &[(u32, u32)],
) -> Result<Vec<Vec<Option<String>>>, PrefetchError> {
    let mut directories = Vec::with_capacity(tables.len());

    for (index, (table_offset, count)) in tables.iter().enumerate() {
        let position = u64::from(base_offset) + u64::from(*table_offset);
        source
            .seek(SeekFrom::Start(position))
            .map_err(|_| PrefetchError::ReadSource)?;

        let mut entries = Vec::with_capacity(*count as usize);
        for string_index in 0..*count {
            match read_directory_string(source) {
                Ok(directory) => entries.push(Some(directory)),
                Err(_) => {
                    warn!(
                        "[prefetch] Could not decode directory string {string_index} for volume {index}"
                    );
                    entries.push(None);
                }
            }
        }
        directories.push(entries);
    }

    Ok(directories)
}

fn read_directory_string<R: ReadSeek>(source: &mut R) -> Result<String, PrefetchError> {
    let length = source
        .read_u16::<LittleEndian>()
        .map_err(|_| PrefetchError::ReadSource)? as usize;
    let mut data = vec![0; length * 2 + 2];
    source
        .read_exact(&mut data)
        .map_err(|_| PrefetchError::ReadSource)?;
    Ok(extract_padded_utf16_string(&data))
}
