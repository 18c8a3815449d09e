use log::warn;

/// Get a UTF16 string from provided bytes data. Stops at the first null terminator
pub(crate) fn extract_utf16_string(data: &[u8]) -> String {
    let mut wide_chars: Vec<u16> = Vec::new();
    for wide_char in data.chunks_exact(2) {
        let value = u16::from_le_bytes([wide_char[0], wide_char[1]]);
        if value == 0 {
            break;
        }
        wide_chars.push(value);
    }

    utf16_to_string(&wide_chars)
}

/// Get a UTF16 string from provided bytes data, dropping embedded null padding
pub(crate) fn extract_padded_utf16_string(data: &[u8]) -> String {
    let mut wide_chars: Vec<u16> = Vec::new();
    for wide_char in data.chunks_exact(2) {
        let value = u16::from_le_bytes([wide_char[0], wide_char[1]]);
        if value == 0 {
            continue;
        }
        wide_chars.push(value);
    }

    utf16_to_string(&wide_chars)
}

/// Windows uses UTF16
pub(crate) fn utf16_to_string(wide_chars: &[u16]) -> String {
    match String::from_utf16(wide_chars) {
        Ok(result) => result,
        Err(err) => {
            warn!("[prefetch] Falling back to lossy UTF16 string conversion: {err:?}");
            String::from_utf16_lossy(wide_chars)
        }
    }
}
