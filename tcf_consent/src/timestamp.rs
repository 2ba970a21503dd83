//! Creation time recovery and retention checks for stored TC strings.
//!
//! A TC string starts with a 6-bit version followed by the 36-bit creation date in
//! deciseconds, so characters 1 to 6 hold exactly the creation date. These functions read
//! those characters as base 64 digits without decoding the rest of the string, which keeps
//! them total: any input yields a timestamp.
use crate::core::base64::Alphabet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default retention period, in days, after which a stored TC string is purged.
pub const RETENTION_DAYS: i64 = 365;

/// Placeholder used when no TC string is stored. It decodes to the epoch.
pub const EMPTY_TC_STRING: &str = "AAAAAAA";

const DAY_MS: i64 = 86_400_000;
const TIMESTAMP_OFFSET: usize = 1;
const TIMESTAMP_LEN: usize = 6;

/// Decodes the creation date of a TC string, in milliseconds since the epoch.
///
/// Characters are read with the standard Base64 dictionary; characters outside of it count
/// as 0, and so do missing characters when the string is shorter than 7 characters.
/// Offsets count characters, not bytes.
///
/// # Example
///
/// ```
/// use tcf_consent::timestamp::decode_timestamp;
///
/// assert_eq!(decode_timestamp("AAAAAAA"), 0);
/// assert_eq!(decode_timestamp("CP1R2oAP1VJkA"), 1_700_000_000_000);
/// ```
pub fn decode_timestamp(tc_string: &str) -> i64 {
    let mut chars = tc_string.chars().skip(TIMESTAMP_OFFSET);
    let deciseconds = (0..TIMESTAMP_LEN)
        .map(|_| {
            chars
                .next()
                .and_then(|c| u8::try_from(c).ok())
                .and_then(|b| Alphabet::Standard.value(b))
                .unwrap_or(0)
        })
        .fold(0_i64, |acc, digit| acc * 64 + i64::from(digit));

    deciseconds * 100
}

/// Number of whole days elapsed between the creation of `tc_string` and `now_ms`.
///
/// The result is negative when the creation date lies in the future. The elapsed time
/// saturates at the bounds of `i64`.
pub fn age_in_days(tc_string: &str, now_ms: i64) -> i64 {
    now_ms.saturating_sub(decode_timestamp(tc_string)) / DAY_MS
}

/// Returns `true` if `tc_string` is strictly older than `retention_days`.
pub fn is_expired(tc_string: &str, now_ms: i64, retention_days: i64) -> bool {
    age_in_days(tc_string, now_ms) > retention_days
}

/// Converts a [`SystemTime`] to milliseconds since the epoch, negative before it.
pub fn unix_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}
