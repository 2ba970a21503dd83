//! The consent policy evaluator.
//!
//! [`ConsentPolicyEvaluator`] answers yes/no questions about what the stored consent allows.
//! Every question reads fresh values from the [`ConsentStore`], so the answers follow the
//! CMP as it updates its preferences.
//!
//! ```
//! use tcf_consent::evaluator::ConsentPolicyEvaluator;
//! use tcf_consent::store::{ConsentKey, MemoryStore};
//!
//! let store = MemoryStore::new()
//!     .with_int(ConsentKey::GdprApplies, 1)
//!     .with_string(ConsentKey::PurposeConsents, "1111111111")
//!     .with_string(ConsentKey::VendorConsents, "001");
//! let evaluator = ConsentPolicyEvaluator::new(store);
//!
//! assert!(evaluator.can_show_ads());
//! assert!(evaluator.can_show_personalized_ads());
//! assert!(evaluator.is_vendor_authorized(3));
//! assert!(!evaluator.is_vendor_authorized(4));
//! ```
use crate::additional_consent::{AdditionalConsent, contains_partner};
use crate::bitfield::has_flag;
use crate::policy::{AdPolicy, PERSONALIZATION_CONSENT, PurposeRequirement};
use crate::store::{ConsentKey, ConsentStore};
use crate::tc_string::{TcDecodeError, TcString};
use crate::timestamp::{EMPTY_TC_STRING, RETENTION_DAYS, age_in_days, unix_millis};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// How additional consent partners are looked up.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PartnerMatching {
    /// Search the decimal ID anywhere in the raw string.
    ///
    /// See [`contains_partner`] for the false positives this implies.
    #[default]
    Substring,
    /// Decode the string and look for the exact ID among consented providers.
    Exact,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default)
)]
pub struct EvaluatorConfig {
    /// Age in days past which a stored TC string is purged.
    pub retention_days: i64,
    pub partner_matching: PartnerMatching,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            retention_days: RETENTION_DAYS,
            partner_matching: PartnerMatching::default(),
        }
    }
}

/// Consent signals for an analytics SDK, in consent mode terms.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalyticsConsent {
    pub ad_storage: bool,
    pub ad_personalization: bool,
    pub ad_user_data: bool,
}

/// Ad decisions scoped to a single vendor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VendorPolicies {
    pub can_show_ads: bool,
    pub can_show_personalized_ads: bool,
    pub has_consent: bool,
}

/// A snapshot of every decision the evaluator can make.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsentReport {
    pub gdpr_applies: bool,
    pub can_show_ads: bool,
    pub can_show_personalized_ads: bool,
    pub analytics: AnalyticsConsent,
    pub vendors: BTreeMap<u16, bool>,
    pub partners: BTreeMap<u32, bool>,
}

/// Evaluates ad and analytics policies against the consent held by a [`ConsentStore`].
///
/// Absent keys read as defaults: empty strings, GDPR not applicable, and
/// [`EMPTY_TC_STRING`] for the age computation. No evaluation can fail.
#[derive(Debug)]
pub struct ConsentPolicyEvaluator<S> {
    store: S,
    config: EvaluatorConfig,
}

impl<S> ConsentPolicyEvaluator<S>
where
    S: ConsentStore,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, EvaluatorConfig::default())
    }

    pub fn with_config(store: S, config: EvaluatorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn string(&self, key: ConsentKey) -> String {
        self.store.get_string(key).unwrap_or_default()
    }

    pub fn purpose_consents(&self) -> String {
        self.string(ConsentKey::PurposeConsents)
    }

    pub fn purpose_legitimate_interests(&self) -> String {
        self.string(ConsentKey::PurposeLegitimateInterests)
    }

    pub fn vendor_consents(&self) -> String {
        self.string(ConsentKey::VendorConsents)
    }

    /// The raw vendor legitimate interest string.
    ///
    /// Only the vendor scoped policies read it: [`Self::is_vendor_authorized`] accepts
    /// consent alone.
    pub fn vendor_legitimate_interests(&self) -> String {
        self.string(ConsentKey::VendorLegitimateInterests)
    }

    pub fn additional_consent(&self) -> String {
        self.string(ConsentKey::AdditionalConsent)
    }

    /// Returns `true` if the CMP determined that GDPR applies to the user.
    pub fn is_gdpr_applicable(&self) -> bool {
        self.store.get_int(ConsentKey::GdprApplies).unwrap_or(0) == 1
    }

    /// Evaluates a policy. Every policy is satisfied when GDPR does not apply.
    pub fn is_policy_satisfied(&self, policy: AdPolicy) -> bool {
        if !self.is_gdpr_applicable() {
            debug!(%policy, "GDPR does not apply, policy satisfied");
            return true;
        }

        let consents = self.purpose_consents();
        let legitimate_interests = self.purpose_legitimate_interests();
        let allowed = policy
            .requirement()
            .is_satisfied_by(&consents, &legitimate_interests);

        debug!(
            %policy,
            consents = %consents,
            legitimate_interests = %legitimate_interests,
            allowed,
            "evaluated policy"
        );
        allowed
    }

    pub fn can_show_ads(&self) -> bool {
        self.is_policy_satisfied(AdPolicy::BasicAds)
    }

    pub fn can_show_personalized_ads(&self) -> bool {
        self.is_policy_satisfied(AdPolicy::PersonalizedAds)
    }

    pub fn analytics_ad_storage_allowed(&self) -> bool {
        self.is_policy_satisfied(AdPolicy::AnalyticsAdStorage)
    }

    pub fn analytics_ad_personalization_allowed(&self) -> bool {
        self.is_policy_satisfied(AdPolicy::AnalyticsAdPersonalization)
    }

    pub fn analytics_ad_user_data_allowed(&self) -> bool {
        self.is_policy_satisfied(AdPolicy::AnalyticsAdUserData)
    }

    pub fn analytics_consent(&self) -> AnalyticsConsent {
        AnalyticsConsent {
            ad_storage: self.analytics_ad_storage_allowed(),
            ad_personalization: self.analytics_ad_personalization_allowed(),
            ad_user_data: self.analytics_ad_user_data_allowed(),
        }
    }

    /// Returns `true` if the vendor with the given Global Vendor List ID has consent.
    ///
    /// Unlike policies, this check does not depend on GDPR applicability.
    pub fn is_vendor_authorized(&self, vendor_id: u16) -> bool {
        let vendor_consents = self.vendor_consents();
        let allowed = has_flag(&vendor_consents, vendor_id);

        debug!(vendor_id, vendor_consents = %vendor_consents, allowed, "evaluated vendor");
        allowed
    }

    fn is_requirement_satisfied_for_vendor(
        &self,
        label: &str,
        requirement: &PurposeRequirement,
        vendor_id: u16,
    ) -> bool {
        if !self.is_gdpr_applicable() {
            debug!(policy = label, vendor_id, "GDPR does not apply, policy satisfied");
            return true;
        }

        let vendor_consent = has_flag(&self.vendor_consents(), vendor_id);
        let vendor_legitimate_interest =
            has_flag(&self.vendor_legitimate_interests(), vendor_id);
        let allowed = requirement.is_satisfied_for_vendor(
            &self.purpose_consents(),
            &self.purpose_legitimate_interests(),
            vendor_consent,
            vendor_legitimate_interest,
        );

        debug!(
            policy = label,
            vendor_id,
            vendor_consent,
            vendor_legitimate_interest,
            allowed,
            "evaluated vendor policy"
        );
        allowed
    }

    /// Evaluates a policy for one vendor.
    ///
    /// Purposes granted through consent also need the vendor's consent bit, purposes granted
    /// through legitimate interest also need the vendor's legitimate interest bit. Every
    /// policy is satisfied when GDPR does not apply.
    pub fn is_policy_satisfied_for_vendor(&self, policy: AdPolicy, vendor_id: u16) -> bool {
        self.is_requirement_satisfied_for_vendor(
            &policy.to_string(),
            policy.requirement(),
            vendor_id,
        )
    }

    pub fn can_show_ads_for_vendor(&self, vendor_id: u16) -> bool {
        self.is_policy_satisfied_for_vendor(AdPolicy::BasicAds, vendor_id)
    }

    pub fn can_show_personalized_ads_for_vendor(&self, vendor_id: u16) -> bool {
        self.is_policy_satisfied_for_vendor(AdPolicy::PersonalizedAds, vendor_id)
    }

    /// Returns `true` if purposes 1, 3 and 4 are consented and the vendor has consent.
    pub fn has_consent_for_vendor(&self, vendor_id: u16) -> bool {
        self.is_requirement_satisfied_for_vendor(
            "PersonalizationConsent",
            &PERSONALIZATION_CONSENT,
            vendor_id,
        )
    }

    pub fn vendor_policies(&self, vendor_id: u16) -> VendorPolicies {
        VendorPolicies {
            can_show_ads: self.can_show_ads_for_vendor(vendor_id),
            can_show_personalized_ads: self.can_show_personalized_ads_for_vendor(vendor_id),
            has_consent: self.has_consent_for_vendor(vendor_id),
        }
    }

    /// Returns `true` if the additional consent provider with the given ID has consent.
    pub fn is_additional_partner_authorized(&self, partner_id: u32) -> bool {
        let ac = self.additional_consent();
        let allowed = match self.config.partner_matching {
            PartnerMatching::Substring => contains_partner(&ac, partner_id),
            PartnerMatching::Exact => match ac.parse::<AdditionalConsent>() {
                Ok(decoded) => decoded.is_consented(partner_id),
                Err(e) => {
                    warn!(additional_consent = %ac, error = %e, "undecodable additional consent");
                    false
                }
            },
        };

        debug!(partner_id, additional_consent = %ac, allowed, "evaluated partner");
        allowed
    }

    /// Age of the stored TC string in whole days, negative if it was created in the future.
    pub fn consent_age_in_days(&self, now: SystemTime) -> i64 {
        let tc_string = self
            .store
            .get_string(ConsentKey::TcString)
            .unwrap_or_else(|| EMPTY_TC_STRING.to_string());

        age_in_days(&tc_string, unix_millis(now))
    }

    /// Age of the stored TC string in whole days, or `None` when no string is stored.
    pub fn stored_consent_age_in_days(&self, now: SystemTime) -> Option<i64> {
        self.store
            .get_string(ConsentKey::TcString)
            .map(|tc_string| age_in_days(&tc_string, unix_millis(now)))
    }

    /// Returns `true` if a TC string is stored and older than the configured retention period.
    pub fn is_consent_string_expired(&self, now: SystemTime) -> bool {
        self.stored_consent_age_in_days(now)
            .is_some_and(|age| age > self.config.retention_days)
    }

    /// Removes the stored TC string if it is older than the configured retention period.
    ///
    /// Returns `true` if a string was removed. Without a stored string, nothing is removed.
    pub fn purge_expired_consent_string(&self, now: SystemTime) -> bool {
        let Some(age) = self.stored_consent_age_in_days(now) else {
            debug!("no TC string stored, nothing to purge");
            return false;
        };

        debug!(
            age_days = age,
            retention_days = self.config.retention_days,
            "checked TC string age"
        );

        if age <= self.config.retention_days {
            return false;
        }

        self.store.remove(ConsentKey::TcString);
        info!(age_days = age, "removed outdated TC string");
        true
    }

    /// Decodes the stored TC string.
    pub fn decode_tc_string(&self) -> Result<TcString, TcDecodeError> {
        self.store
            .get_string(ConsentKey::TcString)
            .ok_or(TcDecodeError::Missing)?
            .parse()
    }

    pub fn report(&self, vendor_ids: &[u16], partner_ids: &[u32]) -> ConsentReport {
        ConsentReport {
            gdpr_applies: self.is_gdpr_applicable(),
            can_show_ads: self.can_show_ads(),
            can_show_personalized_ads: self.can_show_personalized_ads(),
            analytics: self.analytics_consent(),
            vendors: vendor_ids
                .iter()
                .map(|&id| (id, self.is_vendor_authorized(id)))
                .collect(),
            partners: partner_ids
                .iter()
                .map(|&id| (id, self.is_additional_partner_authorized(id)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, UNIX_EPOCH};
    use test_case::test_case;

    const DAY: Duration = Duration::from_secs(86_400);

    fn gdpr(consents: &str, legitimate_interests: &str) -> ConsentPolicyEvaluator<MemoryStore> {
        ConsentPolicyEvaluator::new(
            MemoryStore::new()
                .with_int(ConsentKey::GdprApplies, 1)
                .with_string(ConsentKey::PurposeConsents, consents)
                .with_string(ConsentKey::PurposeLegitimateInterests, legitimate_interests),
        )
    }

    #[test]
    fn empty_store() {
        let evaluator = ConsentPolicyEvaluator::new(MemoryStore::new());

        assert!(!evaluator.is_gdpr_applicable());
        assert!(evaluator.can_show_ads());
        assert!(evaluator.can_show_personalized_ads());
        assert!(!evaluator.is_vendor_authorized(1));
        assert!(!evaluator.is_additional_partner_authorized(1));
        assert_eq!(evaluator.purpose_consents(), "");
        assert!(matches!(
            evaluator.decode_tc_string(),
            Err(TcDecodeError::Missing)
        ));
    }

    #[test_case(0 ; "not applicable")]
    #[test_case(2 ; "unknown value")]
    #[test_case(-1 ; "undetermined")]
    fn gdpr_not_applicable_allows_everything(gdpr_applies: i64) {
        let evaluator = ConsentPolicyEvaluator::new(
            MemoryStore::new()
                .with_int(ConsentKey::GdprApplies, gdpr_applies)
                .with_string(ConsentKey::PurposeConsents, "0000000000"),
        );

        assert!(!evaluator.is_gdpr_applicable());
        for policy in AdPolicy::ALL {
            assert!(evaluator.is_policy_satisfied(policy), "{policy}");
        }
        assert_eq!(
            evaluator.analytics_consent(),
            AnalyticsConsent {
                ad_storage: true,
                ad_personalization: true,
                ad_user_data: true,
            }
        );
    }

    #[test]
    fn gdpr_stored_as_string_is_not_applicable() {
        let evaluator = ConsentPolicyEvaluator::new(
            MemoryStore::new().with_string(ConsentKey::GdprApplies, "1"),
        );

        assert!(!evaluator.is_gdpr_applicable());
    }

    #[test]
    fn full_consent() {
        let evaluator = gdpr("1111111111", "");

        assert!(evaluator.is_gdpr_applicable());
        assert!(evaluator.can_show_ads());
        assert!(evaluator.can_show_personalized_ads());
    }

    #[test]
    fn only_purpose_one() {
        let evaluator = gdpr("1000000000", "");

        assert!(!evaluator.can_show_ads());
        assert!(!evaluator.can_show_personalized_ads());
        assert!(evaluator.analytics_ad_storage_allowed());
        assert!(!evaluator.analytics_ad_user_data_allowed());
    }

    #[test]
    fn legitimate_interest_fallback() {
        // purposes 2, 7, 9 and 10 through legitimate interest only
        let evaluator = gdpr("1011", "0100001011");

        assert!(evaluator.can_show_ads());
        assert!(evaluator.can_show_personalized_ads());
    }

    #[test]
    fn analytics_accept_legitimate_interest_for_every_purpose() {
        let evaluator = gdpr("", "1011001");

        assert!(!evaluator.can_show_ads());
        assert_eq!(
            evaluator.analytics_consent(),
            AnalyticsConsent {
                ad_storage: true,
                ad_personalization: true,
                ad_user_data: true,
            }
        );
    }

    #[test_case("001", 3 => true ; "set")]
    #[test_case("01", 3 => false ; "out of range")]
    #[test_case("111", 0 => false ; "id zero")]
    fn vendor(vendor_consents: &str, vendor_id: u16) -> bool {
        ConsentPolicyEvaluator::new(
            MemoryStore::new().with_string(ConsentKey::VendorConsents, vendor_consents),
        )
        .is_vendor_authorized(vendor_id)
    }

    #[test]
    fn vendor_ignores_legitimate_interest() {
        let evaluator = ConsentPolicyEvaluator::new(
            MemoryStore::new()
                .with_string(ConsentKey::VendorConsents, "00")
                .with_string(ConsentKey::VendorLegitimateInterests, "01"),
        );

        assert!(!evaluator.is_vendor_authorized(2));
        assert_eq!(evaluator.vendor_legitimate_interests(), "01");
    }

    fn scoped(
        vendor_consents: &str,
        vendor_legitimate_interests: &str,
    ) -> ConsentPolicyEvaluator<MemoryStore> {
        ConsentPolicyEvaluator::new(
            MemoryStore::new()
                .with_int(ConsentKey::GdprApplies, 1)
                .with_string(ConsentKey::PurposeConsents, "1011")
                .with_string(ConsentKey::PurposeLegitimateInterests, "0100001011")
                .with_string(ConsentKey::VendorConsents, vendor_consents)
                .with_string(ConsentKey::VendorLegitimateInterests, vendor_legitimate_interests),
        )
    }

    #[test]
    fn vendor_scoped_policies() {
        let evaluator = scoped("11", "01");

        assert!(evaluator.can_show_ads());
        assert!(!evaluator.can_show_ads_for_vendor(1));
        assert!(!evaluator.can_show_personalized_ads_for_vendor(1));
        assert!(evaluator.has_consent_for_vendor(1));
        assert_eq!(
            evaluator.vendor_policies(2),
            VendorPolicies {
                can_show_ads: true,
                can_show_personalized_ads: true,
                has_consent: true,
            }
        );
        assert_eq!(
            evaluator.vendor_policies(3),
            VendorPolicies {
                can_show_ads: false,
                can_show_personalized_ads: false,
                has_consent: false,
            }
        );
    }

    #[test]
    fn vendor_scoped_legitimate_interest_alone() {
        let evaluator = scoped("01", "1");

        assert!(!evaluator.is_vendor_authorized(1));
        assert!(!evaluator.can_show_ads_for_vendor(1));
        assert!(!evaluator.has_consent_for_vendor(1));
        assert!(!evaluator.is_policy_satisfied_for_vendor(AdPolicy::AnalyticsAdPersonalization, 1));
        assert!(evaluator.is_policy_satisfied_for_vendor(AdPolicy::AnalyticsAdPersonalization, 2));
    }

    #[test]
    fn vendor_scoped_without_gdpr() {
        let evaluator = ConsentPolicyEvaluator::new(MemoryStore::new());

        assert!(evaluator.can_show_ads_for_vendor(1));
        assert!(evaluator.can_show_personalized_ads_for_vendor(1));
        assert!(evaluator.has_consent_for_vendor(1));
    }

    #[test_case(PartnerMatching::Substring, "~12.23", 12 => true ; "substring listed")]
    #[test_case(PartnerMatching::Substring, "~120", 12 => true ; "substring false positive")]
    #[test_case(PartnerMatching::Exact, "2~12.23~dv.", 12 => true ; "exact listed")]
    #[test_case(PartnerMatching::Exact, "2~120~dv.", 12 => false ; "exact longer id")]
    #[test_case(PartnerMatching::Exact, "2~120~dv.12", 12 => false ; "exact disclosed only")]
    #[test_case(PartnerMatching::Exact, "~12.23", 12 => false ; "exact undecodable")]
    fn partner(partner_matching: PartnerMatching, ac: &str, partner_id: u32) -> bool {
        ConsentPolicyEvaluator::with_config(
            MemoryStore::new().with_string(ConsentKey::AdditionalConsent, ac),
            EvaluatorConfig {
                partner_matching,
                ..EvaluatorConfig::default()
            },
        )
        .is_additional_partner_authorized(partner_id)
    }

    #[test]
    fn missing_string_has_no_age() {
        let evaluator = ConsentPolicyEvaluator::new(MemoryStore::new());
        let now = UNIX_EPOCH + 1000 * DAY;

        assert_eq!(evaluator.stored_consent_age_in_days(now), None);
        assert!(!evaluator.is_consent_string_expired(now));
        assert_eq!(evaluator.consent_age_in_days(now), 1000);
        assert!(!evaluator.purge_expired_consent_string(now));
    }

    #[test_case(365 ; "at retention")]
    #[test_case(366 ; "past retention")]
    fn expiry_agrees_with_purge(days: u32) {
        let evaluator = ConsentPolicyEvaluator::new(
            MemoryStore::new().with_string(ConsentKey::TcString, EMPTY_TC_STRING),
        );
        let now = UNIX_EPOCH + days * DAY;

        assert_eq!(evaluator.stored_consent_age_in_days(now), Some(i64::from(days)));
        let expired = evaluator.is_consent_string_expired(now);
        assert_eq!(evaluator.purge_expired_consent_string(now), expired);
        assert_eq!(expired, days == 366);
    }

    #[test]
    fn age_defaults_to_epoch() {
        let evaluator = ConsentPolicyEvaluator::new(MemoryStore::new());

        assert_eq!(evaluator.consent_age_in_days(UNIX_EPOCH + 10 * DAY), 10);
    }

    #[test_case(365 => false ; "at threshold")]
    #[test_case(366 => true ; "past threshold")]
    fn purge(days: u32) -> bool {
        let store = MemoryStore::new().with_string(ConsentKey::TcString, "AAAAAAA");
        let evaluator = ConsentPolicyEvaluator::new(&store);

        let purged = evaluator.purge_expired_consent_string(UNIX_EPOCH + days * DAY);

        assert_eq!(store.contains(ConsentKey::TcString), !purged);
        purged
    }

    #[test]
    fn purge_is_idempotent() {
        let store = MemoryStore::new()
            .with_string(ConsentKey::TcString, "CP1R2oAP1VJkAEsACBFRAwEoAPLAAEIAAAqIF5wAgABwLuAvMACCCACEgAgAD");
        let evaluator = ConsentPolicyEvaluator::new(&store);
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000) + 400 * DAY;

        assert!(evaluator.purge_expired_consent_string(now));
        assert!(!store.contains(ConsentKey::TcString));
        assert!(!evaluator.purge_expired_consent_string(now));
        assert!(!evaluator.purge_expired_consent_string(now));
    }

    #[test]
    fn purge_keeps_future_strings() {
        let store = MemoryStore::new()
            .with_string(ConsentKey::TcString, "CP1R2oAP1VJkAEsACBFRAwEoAPLAAEIAAAqIF5wAgABwLuAvMACCCACEgAgAD");
        let evaluator = ConsentPolicyEvaluator::new(&store);

        assert!(evaluator.consent_age_in_days(UNIX_EPOCH) < 0);
        assert!(!evaluator.purge_expired_consent_string(UNIX_EPOCH));
        assert!(store.contains(ConsentKey::TcString));
    }

    #[test]
    fn purge_uses_configured_retention() {
        let store = MemoryStore::new().with_string(ConsentKey::TcString, "AAAAAAA");
        let evaluator = ConsentPolicyEvaluator::with_config(
            &store,
            EvaluatorConfig {
                retention_days: 30,
                ..EvaluatorConfig::default()
            },
        );

        assert!(!evaluator.purge_expired_consent_string(UNIX_EPOCH + 30 * DAY));
        assert!(evaluator.purge_expired_consent_string(UNIX_EPOCH + 31 * DAY));
    }

    #[test]
    fn decode_stored_string() {
        let evaluator = ConsentPolicyEvaluator::new(MemoryStore::new().with_string(
            ConsentKey::TcString,
            "CPXuQIAPXuQIAAfKABENB-CgACAAAAAAAAYgF5wAQF5gAAAA",
        ));

        let tc = evaluator.decode_tc_string().unwrap();
        assert!(tc.is_vendor_consented(755));
    }

    #[test]
    fn report() {
        let store = MemoryStore::new()
            .with_int(ConsentKey::GdprApplies, 1)
            .with_string(ConsentKey::PurposeConsents, "1111111111")
            .with_string(ConsentKey::VendorConsents, "001")
            .with_string(ConsentKey::AdditionalConsent, "2~12.23~dv.");
        let report = ConsentPolicyEvaluator::new(store).report(&[3, 4], &[12, 99]);

        assert_eq!(
            report,
            ConsentReport {
                gdpr_applies: true,
                can_show_ads: true,
                can_show_personalized_ads: true,
                analytics: AnalyticsConsent {
                    ad_storage: true,
                    ad_personalization: true,
                    ad_user_data: true,
                },
                vendors: BTreeMap::from([(3, true), (4, false)]),
                partners: BTreeMap::from([(12, true), (99, false)]),
            }
        );
    }

    #[test]
    fn concurrent_evaluations() {
        let store = Arc::new(
            MemoryStore::new()
                .with_int(ConsentKey::GdprApplies, 1)
                .with_string(ConsentKey::PurposeConsents, "1111111111")
                .with_string(ConsentKey::TcString, "AAAAAAA"),
        );
        let evaluator = ConsentPolicyEvaluator::new(Arc::clone(&store));
        let now = UNIX_EPOCH + 1000 * DAY;

        let purged = thread::scope(|s| {
            let handles = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        assert!(evaluator.can_show_personalized_ads());
                        evaluator.purge_expired_consent_string(now)
                    })
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|&p| p)
                .count()
        });

        assert!(purged >= 1);
        assert!(!store.contains(ConsentKey::TcString));
    }
}
