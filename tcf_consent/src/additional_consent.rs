//! Google Additional Consent (AC) strings.
//!
//! The AC string lists ad technology providers which are not registered with the IAB:
//!
//! ```text
//! 2~1.35.41.101~dv.9.21.81
//! ```
//!
//! The first part is the specification version, the second the `.` separated IDs of the
//! providers the user consented to. Version 2 adds a third part, prefixed with `dv.`, listing
//! the providers which were disclosed to the user without consent.
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

const DISCLOSED_PREFIX: &str = "dv.";

/// Looks up a provider by searching the decimal representation of its ID in the raw string.
///
/// This matches IDs which only appear as a part of another one: `12` is found in `"1~120"`.
/// Stored decisions were made with this lookup, which is why it remains the default in
/// [`ConsentPolicyEvaluator`](crate::evaluator::ConsentPolicyEvaluator).
/// [`AdditionalConsent::is_consented`] is the exact alternative.
pub fn contains_partner(ac: &str, partner_id: u32) -> bool {
    ac.contains(&partner_id.to_string())
}

#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum AcDecodeError {
    #[error("empty additional consent string")]
    Empty,
    #[error("invalid additional consent version {0:?}")]
    InvalidVersion(String),
    #[error("unsupported additional consent version {0}")]
    UnsupportedVersion(u8),
    #[error("invalid provider id {0:?}")]
    InvalidId(String),
    #[error("unexpected part {0:?}")]
    UnexpectedPart(String),
}

/// A decoded additional consent string.
#[derive(Debug, Eq, PartialEq)]
pub struct AdditionalConsent {
    pub version: u8,
    pub consented_ids: BTreeSet<u32>,
    pub disclosed_ids: BTreeSet<u32>,
}

impl AdditionalConsent {
    pub fn is_consented(&self, partner_id: u32) -> bool {
        self.consented_ids.contains(&partner_id)
    }

    pub fn is_disclosed(&self, partner_id: u32) -> bool {
        self.disclosed_ids.contains(&partner_id)
    }
}

impl FromStr for AdditionalConsent {
    type Err = AcDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AcDecodeError::Empty);
        }

        let mut parts = s.split('~');
        let version = parts.next().unwrap_or_default();
        let version = version
            .parse::<u8>()
            .map_err(|_| AcDecodeError::InvalidVersion(version.to_string()))?;
        if !(1..=2).contains(&version) {
            return Err(AcDecodeError::UnsupportedVersion(version));
        }

        let consented_ids = parse_ids(parts.next().unwrap_or_default())?;

        let disclosed_ids = match (version, parts.next()) {
            (2, Some(part)) => {
                let ids = part
                    .strip_prefix(DISCLOSED_PREFIX)
                    .or_else(|| (part == "dv").then_some(""))
                    .ok_or_else(|| AcDecodeError::UnexpectedPart(part.to_string()))?;
                parse_ids(ids)?
            }
            (_, Some(part)) => return Err(AcDecodeError::UnexpectedPart(part.to_string())),
            (_, None) => BTreeSet::new(),
        };

        if let Some(part) = parts.next() {
            return Err(AcDecodeError::UnexpectedPart(part.to_string()));
        }

        Ok(Self {
            version,
            consented_ids,
            disclosed_ids,
        })
    }
}

fn parse_ids(s: &str) -> Result<BTreeSet<u32>, AcDecodeError> {
    s.split('.')
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse()
                .map_err(|_| AcDecodeError::InvalidId(id.to_string()))
        })
        .collect()
}
