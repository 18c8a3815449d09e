use crate::error::PrefetchError;
use crate::reader::ReadSeek;
use crate::utils::strings::utf16_to_string;
use byteorder::{LittleEndian, ReadBytesExt};
use log::warn;
use std::io::{Seek, SeekFrom};

/// Decode the filename string table in lock step with the file metrics
/// array, one null terminated UTF16 string per metrics entry. Reading never
/// passes the declared table length; entries past the end are `None`.
pub(crate) fn parse_filename_strings<R: ReadSeek>(
    source: &mut R,
    offset: u32,
    size: u32,
    metrics_count: usize,
) -> Result<Vec<Option<String>>, PrefetchError> {
    source
        .seek(SeekFrom::Start(u64::from(offset)))
        .map_err(|_| PrefetchError::ReadSource)?;

    let mut filenames = Vec::with_capacity(metrics_count);
    let mut consumed = 0;
    let mut exhausted = false;
    for index in 0..metrics_count {
        if exhausted || u64::from(size) - consumed < 2 {
            filenames.push(None);
            continue;
        }
        match read_terminated_string(source, u64::from(size) - consumed) {
            Ok((filename, read)) => {
                consumed += read;
                filenames.push(Some(filename));
            }
            Err(_) => {
                warn!("[prefetch] Could not read filename string {index} of {metrics_count}");
                filenames.push(None);
                exhausted = true;
            }
        }
    }

    Ok(filenames)
}

/// Read UTF16 units up to a null terminator or the remaining table budget
fn read_terminated_string<R: ReadSeek>(
    source: &mut R,
    budget: u64,
) -> Result<(String, u64), PrefetchError> {
    let mut units: Vec<u16> = Vec::new();
    let mut consumed = 0;
    while consumed + 2 <= budget {
        let unit = source
            .read_u16::<LittleEndian>()
            .map_err(|_| PrefetchError::ReadSource)?;
        consumed += 2;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    Ok((utf16_to_string(&units), consumed))
}
