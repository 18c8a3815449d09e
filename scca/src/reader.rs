use crate::error::PrefetchError;
use std::io::{Read, Seek, SeekFrom};

/// The byte-source contract every decoder works against: absolute seeks,
/// position queries, and plain reads. File handles and in-memory cursors are
/// interchangeable.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Read exactly `count` bytes at the absolute `offset`, independent of the
/// current cursor position
pub(crate) fn read_at<R: ReadSeek>(
    source: &mut R,
    offset: u64,
    count: usize,
) -> Result<Vec<u8>, PrefetchError> {
    source
        .seek(SeekFrom::Start(offset))
        .map_err(|_| PrefetchError::ReadSource)?;
    let mut buffer = vec![0; count];
    source
        .read_exact(&mut buffer)
        .map_err(|_| PrefetchError::ReadSource)?;
    Ok(buffer)
}

/// Run `operation` against the source and put the cursor back where it was on
/// every exit path. Sections must not leak cursor state to their siblings.
pub(crate) fn with_restored_position<R, T, F>(
    source: &mut R,
    operation: F,
) -> Result<T, PrefetchError>
where
    R: ReadSeek,
    F: FnOnce(&mut R) -> Result<T, PrefetchError>,
{
    let position = source
        .stream_position()
        .map_err(|_| PrefetchError::ReadSource)?;
    let outcome = operation(source);
    if source.seek(SeekFrom::Start(position)).is_err() {
        return Err(PrefetchError::ReadSource);
    }
    outcome
}
