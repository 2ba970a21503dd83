//! Lookups over the `'0'`/`'1'` strings stored under the `IABTCF_*Consents` and
//! `IABTCF_*LegitimateInterests` preference keys.
//!
//! Each character of such a string is one flag, the first character being the flag with ID 1.
//! Positions beyond the end of the string are unset: a CMP only writes as many characters as
//! the highest ID it knows about.

/// Returns `true` if the flag at the 1-based `position` is set in `bits`.
///
/// Position 0, positions past the end of the string and any character other than `'1'`
/// all mean "not set".
///
/// # Example
///
/// ```
/// use tcf_consent::bitfield::has_flag;
///
/// assert!(has_flag("01", 2));
/// assert!(!has_flag("01", 1));
/// assert!(!has_flag("01", 3));
/// ```
pub fn has_flag(bits: &str, position: u16) -> bool {
    usize::from(position)
        .checked_sub(1)
        .and_then(|i| bits.chars().nth(i))
        == Some('1')
}

/// Returns `true` if every position is set in `bits`. An empty list is always satisfied.
pub fn all_set(positions: &[u16], bits: &str) -> bool {
    positions.iter().all(|&p| has_flag(bits, p))
}

/// Returns `true` if every position is set in either `consents` or `legitimate_interests`.
///
/// Both strings are checked independently for each position, so a list may be satisfied
/// partly through consent and partly through legitimate interest.
pub fn any_source_satisfied(positions: &[u16], consents: &str, legitimate_interests: &str) -> bool {
    positions
        .iter()
        .all(|&p| has_flag(consents, p) || has_flag(legitimate_interests, p))
}
