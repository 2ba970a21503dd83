//! Decoding of complete IAB TCF v2 TC strings.
//!
//! A TC string is made of a mandatory core segment followed by optional segments, separated
//! by `.` characters. Each segment is encoded with the URL-safe Base64 dictionary, without
//! padding.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use tcf_consent::tc_string::TcString;
//!
//! let tc = TcString::parse_str("CPXuQIAPXuQIAAfKABENB-CgACAAAAAAAAYgF5wAQF5gAAAA")?;
//!
//! assert_eq!(tc.core.cmp_id, 31);
//! assert!(tc.core.purpose_consents.contains(&3));
//! assert!(tc.is_vendor_consented(755));
//! # Ok(())
//! # }
//! ```
use crate::core::base64::DecodeError;
use crate::core::{DataRead, Range, base64_bit_reader};
use bitstream_io::BitRead;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::str::FromStr;
use thiserror::Error;

const TCF_VERSION: u8 = 2;

pub type IdSet = BTreeSet<u16>;

/// The error type for TC string decoding operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TcDecodeError {
    /// No TC string is stored.
    #[error("no TC string found")]
    Missing,
    /// The string does not contain any data.
    #[error("empty TC string")]
    Empty,
    /// An I/O error occured while reading the string.
    ///
    /// This usually occurs if the input string is truncated.
    #[error("unable to read string: {source}")]
    Read {
        #[from]
        source: io::Error,
    },
    /// The core segment is not encoded with version 2 of the framework.
    #[error("unsupported TCF version (expected {TCF_VERSION}, found {found})")]
    UnsupportedVersion { found: u8 },
    #[error("unknown segment type {segment_type}")]
    UnknownSegmentType { segment_type: u8 },
    #[error("duplicate segment type {segment_type}")]
    DuplicateSegmentType { segment_type: u8 },
}

impl TcDecodeError {
    /// Returns the invalid character error if decoding failed because of the input alphabet.
    pub fn invalid_character(&self) -> Option<&DecodeError> {
        match self {
            TcDecodeError::Read { source } => source.get_ref()?.downcast_ref(),
            _ => None,
        }
    }
}

/// A decoded TC string.
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct TcString {
    pub core: Core,
    pub disclosed_vendors: Option<IdSet>,
    pub allowed_vendors: Option<IdSet>,
    pub publisher_purposes: Option<PublisherPurposes>,
}

/// The core segment of a TC string.
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Core {
    /// Creation date, in seconds since the epoch.
    pub created: u64,
    /// Last update date, in seconds since the epoch.
    pub last_updated: u64,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub consent_language: String,
    pub vendor_list_version: u16,
    pub policy_version: u8,
    pub is_service_specific: bool,
    pub use_non_standard_texts: bool,
    pub special_feature_optins: IdSet,
    pub purpose_consents: IdSet,
    pub purpose_legitimate_interests: IdSet,
    pub purpose_one_treatment: bool,
    pub publisher_country_code: String,
    pub vendor_consents: IdSet,
    pub vendor_legitimate_interests: IdSet,
    pub publisher_restrictions: Vec<PublisherRestriction>,
}

#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublisherRestriction {
    pub purpose_id: u8,
    pub restriction_type: RestrictionType,
    pub restricted_vendor_ids: IdSet,
}

impl From<Range> for PublisherRestriction {
    fn from(r: Range) -> Self {
        Self {
            purpose_id: r.key,
            restriction_type: RestrictionType::from_u8(r.range_type)
                .unwrap_or(RestrictionType::Undefined),
            restricted_vendor_ids: r.ids,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RestrictionType {
    NotAllowed = 0,
    RequireConsent = 1,
    RequireLegitimateInterest = 2,
    Undefined = 3,
}

/// The publisher purposes segment (type 3).
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct PublisherPurposes {
    pub consents: IdSet,
    pub legitimate_interests: IdSet,
    pub custom_consents: IdSet,
    pub custom_legitimate_interests: IdSet,
}

impl TcString {
    /// Parses a string and returns a [`TcString`] if successful.
    ///
    /// # Errors
    ///
    /// Returns a [`TcDecodeError`] if unable to parse the string.
    pub fn parse_str(s: &str) -> Result<Self, TcDecodeError> {
        s.parse()
    }

    /// Creation date, in milliseconds since the epoch.
    pub fn created_at_ms(&self) -> i64 {
        i64::try_from(self.core.created)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000)
    }

    pub fn is_purpose_consented(&self, purpose_id: u16) -> bool {
        self.core.purpose_consents.contains(&purpose_id)
    }

    pub fn is_vendor_consented(&self, vendor_id: u16) -> bool {
        self.core.vendor_consents.contains(&vendor_id)
    }
}

impl FromStr for TcString {
    type Err = TcDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split('.');

        // first mandatory segment is the core segment
        let core = segments.next().filter(|c| !c.is_empty()).ok_or(TcDecodeError::Empty)?;
        let mut output = Self {
            core: parse_core(&mut base64_bit_reader(core.as_bytes()))?,
            disclosed_vendors: None,
            allowed_vendors: None,
            publisher_purposes: None,
        };

        let mut seen = BTreeSet::new();
        for segment in segments {
            let mut r = base64_bit_reader(segment.as_bytes());
            let segment_type = r.read_unsigned::<3, u8>()?;

            // already present, duplicate segments is an error
            if !seen.insert(segment_type) {
                return Err(TcDecodeError::DuplicateSegmentType { segment_type });
            }

            match segment_type {
                1 => output.disclosed_vendors = Some(r.read_vendor_section()?),
                2 => output.allowed_vendors = Some(r.read_vendor_section()?),
                3 => output.publisher_purposes = Some(parse_publisher_purposes(&mut r)?),
                _ => return Err(TcDecodeError::UnknownSegmentType { segment_type }),
            }
        }

        Ok(output)
    }
}

fn parse_core<R: BitRead>(r: &mut R) -> Result<Core, TcDecodeError> {
    let version = r.read_unsigned::<6, u8>()?;
    if version != TCF_VERSION {
        return Err(TcDecodeError::UnsupportedVersion { found: version });
    }

    Ok(Core {
        created: r.read_datetime_as_unix_timestamp()?,
        last_updated: r.read_datetime_as_unix_timestamp()?,
        cmp_id: r.read_unsigned::<12, u16>()?,
        cmp_version: r.read_unsigned::<12, u16>()?,
        consent_screen: r.read_unsigned::<6, u8>()?,
        consent_language: r.read_string(2)?,
        vendor_list_version: r.read_unsigned::<12, u16>()?,
        policy_version: r.read_unsigned::<6, u8>()?,
        is_service_specific: r.read_bit()?,
        use_non_standard_texts: r.read_bit()?,
        special_feature_optins: r.read_fixed_bitfield(12)?,
        purpose_consents: r.read_fixed_bitfield(24)?,
        purpose_legitimate_interests: r.read_fixed_bitfield(24)?,
        purpose_one_treatment: r.read_bit()?,
        publisher_country_code: r.read_string(2)?,
        vendor_consents: r.read_vendor_section()?,
        vendor_legitimate_interests: r.read_vendor_section()?,
        publisher_restrictions: r
            .read_array_of_ranges()?
            .into_iter()
            .map(PublisherRestriction::from)
            .collect(),
    })
}

fn parse_publisher_purposes<R: BitRead>(
    r: &mut R,
) -> Result<PublisherPurposes, TcDecodeError> {
    let consents = r.read_fixed_bitfield(24)?;
    let legitimate_interests = r.read_fixed_bitfield(24)?;
    let n = r.read_unsigned::<6, u16>()?;

    Ok(PublisherPurposes {
        consents,
        legitimate_interests,
        custom_consents: r.read_fixed_bitfield(n)?,
        custom_legitimate_interests: r.read_fixed_bitfield(n)?,
    })
}
