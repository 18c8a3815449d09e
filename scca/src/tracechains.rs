use crate::error::PrefetchError;
use crate::reader::{ReadSeek, read_at};
use crate::sections::Section;
use crate::utils::nom_helper::{
    Endian, nom_unsigned_four_bytes, nom_unsigned_one_byte, nom_unsigned_two_bytes,
};
use log::error;
use serde::Serialize;

/// One linked load-order trace record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceChain {
    pub next_entry_index: u32,
    pub total_block_load_count: u32,
    pub sample_duration: u8,
}

const TRACE_CHAIN_ENTRY_SIZE: usize = 12;

/// Decode the trace chain array. The record layout is shared by every version.
pub(crate) fn parse_trace_chains<R: ReadSeek>(
    source: &mut R,
    offset: u32,
    count: u32,
) -> Result<Vec<TraceChain>, PrefetchError> {
    let data = read_at(
        source,
        u64::from(offset),
        count as usize * TRACE_CHAIN_ENTRY_SIZE,
    )?;

    match chain_entries(&data, count) {
        Ok((_, chains)) => Ok(chains),
        Err(err) => {
            error!("[prefetch] Failed to decode trace chains: {err:?}");
            Err(PrefetchError::Section(Section::TraceChains))
        }
    }
}

fn chain_entries(data: &[u8], count: u32) -> nom::IResult<&[u8], Vec<TraceChain>> {
    let mut input = data;
    let mut chains = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (remaining, next_entry_index) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let (remaining, total_block_load_count) = nom_unsigned_four_bytes(remaining, Endian::Le)?;
        let (remaining, _unknown) = nom_unsigned_one_byte(remaining, Endian::Le)?;
        let (remaining, sample_duration) = nom_unsigned_one_byte(remaining, Endian::Le)?;
        let (remaining, _unknown2) = nom_unsigned_two_bytes(remaining, Endian::Le)?;

        chains.push(TraceChain {
            next_entry_index,
            total_block_load_count,
            sample_duration,
        });
        input = remaining;
    }
    Ok((input, chains))
}
