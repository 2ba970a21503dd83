//! This crate decodes the IAB Transparency & Consent Framework (TCF) v2 data a consent
//! management platform (CMP) stores on a device, and evaluates ad serving policies against it.
//!
//! NOTE: This is not an official IAB library.
//!
//! # Evaluating stored consent
//!
//! CMPs running in mobile applications store the user's choices in the platform preferences
//! (`SharedPreferences` on Android, `NSUserDefaults` on iOS), under the `IABTCF_` keys defined
//! by the framework. Purpose and vendor choices are stored as strings of `'0'` and `'1'`
//! characters, one per purpose or vendor ID.
//!
//! The [`ConsentPolicyEvaluator`](evaluator/struct.ConsentPolicyEvaluator.html) reads those
//! keys from a [`ConsentStore`](store/trait.ConsentStore.html) and answers questions such as
//! "can ads be shown":
//!
//! ```
//! use tcf_consent::evaluator::ConsentPolicyEvaluator;
//! use tcf_consent::store::shared_prefs;
//!
//! let prefs = r#"<?xml version='1.0' encoding='utf-8' standalone='yes' ?>
//! <map>
//!     <int name="IABTCF_gdprApplies" value="1" />
//!     <string name="IABTCF_PurposeConsents">1011</string>
//!     <string name="IABTCF_PurposeLegitimateInterests">0100001011</string>
//!     <string name="IABTCF_VendorConsents">001</string>
//! </map>"#;
//!
//! let evaluator = ConsentPolicyEvaluator::new(shared_prefs::from_xml(prefs).unwrap());
//!
//! // purpose 1 is consented, purposes 2, 7, 9 and 10 are granted through legitimate interest
//! assert!(evaluator.can_show_ads());
//! assert!(evaluator.can_show_personalized_ads());
//! assert!(evaluator.is_vendor_authorized(3));
//! ```
//!
//! When GDPR does not apply (`IABTCF_gdprApplies` is not `1`), every ad policy is satisfied.
//!
//! # Retention
//!
//! A consent decision should be renewed after a year. The creation date is read directly
//! from the stored TC string, and
//! [`purge_expired_consent_string`](evaluator/struct.ConsentPolicyEvaluator.html#method.purge_expired_consent_string)
//! removes the string once it is too old, which makes the CMP collect consent again.
//!
//! # Decoding TC strings
//!
//! The full content of a TC string can be decoded with [`TcString`](tc_string/struct.TcString.html):
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use tcf_consent::tc_string::TcString;
//!
//! let tc: TcString = "COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA".parse()?;
//!
//! assert_eq!(tc.core.consent_language, "EN");
//! assert!(tc.is_purpose_consented(1));
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Evaluations never fail: missing keys and short strings read as "not granted". Decoding a
//! TC string is conservative, and any string which cannot be fully decoded is an error.
//!
pub(crate) mod core;
pub mod additional_consent;
pub mod bitfield;
pub mod evaluator;
pub mod policy;
pub mod store;
pub mod tc_string;
pub mod timestamp;

pub use crate::core::base64::DecodeError;
