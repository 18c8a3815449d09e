use chrono::{DateTime, SecondsFormat};

/// Convert Windows FILETIME values (100ns ticks since 1601-01-01) to unixepoch
pub(crate) fn filetime_to_unixepoch(filetime: u64) -> i64 {
    let windows_nano = 10000000;
    let seconds_to_unix: i64 = 11644473600;

    // We should not overflow because of the division.
    (filetime / windows_nano) as i64 - seconds_to_unix
}

/// Convert `UnixEpoch` to ISO8601 format
pub(crate) fn unixepoch_to_iso(timestamp: i64) -> String {
    let iso_opt = DateTime::from_timestamp(timestamp, 0);
    match iso_opt {
        Some(result) => result.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => String::from("1970-01-01T00:00:00.000Z"),
    }
}
