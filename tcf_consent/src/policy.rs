//! Purpose based ad policies.
//!
//! Purpose IDs are defined by the IAB TCF v2.2 policy. Each [`AdPolicy`] maps to a
//! [`PurposeRequirement`] table listing which purposes must be granted, and which legal bases
//! are accepted for each of them.
//!
//! The purpose sets follow Google's requirements for serving ads under TCF
//! (<https://support.google.com/admob/answer/9760862>): purpose 1, and purposes 3 and 4 for
//! personalized ads, need explicit consent, while basic ad selection, measurement, market
//! research and product development may rely on legitimate interest.
//!
//! The analytics signals mirror the consent mode mapping of a downstream analytics SDK and are
//! deliberately looser: every purpose is accepted under either legal basis.
use crate::bitfield::{all_set, any_source_satisfied, has_flag};
use num_derive::{FromPrimitive, ToPrimitive};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// The purposes of data processing defined by TCF v2.2.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, FromPrimitive, ToPrimitive)]
#[non_exhaustive]
pub enum Purpose {
    StoreAndAccessInformation = 1,
    SelectBasicAds = 2,
    CreatePersonalisedAdsProfile = 3,
    SelectPersonalisedAds = 4,
    CreatePersonalisedContentProfile = 5,
    SelectPersonalisedContent = 6,
    MeasureAdPerformance = 7,
    MeasureContentPerformance = 8,
    UnderstandAudiences = 9,
    DevelopAndImproveServices = 10,
    UseLimitedDataToSelectContent = 11,
}

impl Purpose {
    pub const fn id(self) -> u16 {
        self as u16
    }
}

/// The purposes a policy needs, split by accepted legal basis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PurposeRequirement {
    /// Purposes which must be granted through explicit consent.
    pub consent: &'static [u16],
    /// Purposes which may be granted through either consent or legitimate interest.
    pub consent_or_legitimate_interest: &'static [u16],
}

impl PurposeRequirement {
    /// Checks the requirement against the purpose consent and legitimate interest strings.
    pub fn is_satisfied_by(&self, consents: &str, legitimate_interests: &str) -> bool {
        all_set(self.consent, consents)
            && any_source_satisfied(
                self.consent_or_legitimate_interest,
                consents,
                legitimate_interests,
            )
    }

    /// Checks the requirement on behalf of a single vendor.
    ///
    /// A purpose granted through consent only counts when the vendor has consent, and a
    /// purpose granted through legitimate interest only counts when the vendor has a
    /// legitimate interest.
    pub fn is_satisfied_for_vendor(
        &self,
        consents: &str,
        legitimate_interests: &str,
        vendor_consent: bool,
        vendor_legitimate_interest: bool,
    ) -> bool {
        let by_consent = |purpose: u16| vendor_consent && has_flag(consents, purpose);
        let by_legitimate_interest =
            |purpose: u16| vendor_legitimate_interest && has_flag(legitimate_interests, purpose);

        self.consent.iter().all(|&p| by_consent(p))
            && self
                .consent_or_legitimate_interest
                .iter()
                .all(|&p| by_consent(p) || by_legitimate_interest(p))
    }
}

const CONSENT_OR_LI_FOR_ADS: &[u16] = &[
    Purpose::SelectBasicAds.id(),
    Purpose::MeasureAdPerformance.id(),
    Purpose::UnderstandAudiences.id(),
    Purpose::DevelopAndImproveServices.id(),
];

/// Minimum requirement for non-personalized ads.
pub const BASIC_ADS: PurposeRequirement = PurposeRequirement {
    consent: &[Purpose::StoreAndAccessInformation.id()],
    consent_or_legitimate_interest: CONSENT_OR_LI_FOR_ADS,
};

pub const PERSONALIZED_ADS: PurposeRequirement = PurposeRequirement {
    consent: &[
        Purpose::StoreAndAccessInformation.id(),
        Purpose::CreatePersonalisedAdsProfile.id(),
        Purpose::SelectPersonalisedAds.id(),
    ],
    consent_or_legitimate_interest: CONSENT_OR_LI_FOR_ADS,
};

/// Consent to the personalization purposes alone, without the ad selection fallbacks.
pub const PERSONALIZATION_CONSENT: PurposeRequirement = PurposeRequirement {
    consent: PERSONALIZED_ADS.consent,
    consent_or_legitimate_interest: &[],
};

pub const ANALYTICS_AD_STORAGE: PurposeRequirement = PurposeRequirement {
    consent: &[],
    consent_or_legitimate_interest: &[Purpose::StoreAndAccessInformation.id()],
};

pub const ANALYTICS_AD_PERSONALIZATION: PurposeRequirement = PurposeRequirement {
    consent: &[],
    consent_or_legitimate_interest: &[
        Purpose::CreatePersonalisedAdsProfile.id(),
        Purpose::SelectPersonalisedAds.id(),
    ],
};

pub const ANALYTICS_AD_USER_DATA: PurposeRequirement = PurposeRequirement {
    consent: &[],
    consent_or_legitimate_interest: &[
        Purpose::StoreAndAccessInformation.id(),
        Purpose::MeasureAdPerformance.id(),
    ],
};

/// The named policies an application can query.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AdPolicy {
    BasicAds,
    PersonalizedAds,
    AnalyticsAdStorage,
    AnalyticsAdPersonalization,
    AnalyticsAdUserData,
}

impl AdPolicy {
    pub const ALL: [AdPolicy; 5] = [
        AdPolicy::BasicAds,
        AdPolicy::PersonalizedAds,
        AdPolicy::AnalyticsAdStorage,
        AdPolicy::AnalyticsAdPersonalization,
        AdPolicy::AnalyticsAdUserData,
    ];

    pub fn requirement(self) -> &'static PurposeRequirement {
        match self {
            AdPolicy::BasicAds => &BASIC_ADS,
            AdPolicy::PersonalizedAds => &PERSONALIZED_ADS,
            AdPolicy::AnalyticsAdStorage => &ANALYTICS_AD_STORAGE,
            AdPolicy::AnalyticsAdPersonalization => &ANALYTICS_AD_PERSONALIZATION,
            AdPolicy::AnalyticsAdUserData => &ANALYTICS_AD_USER_DATA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;
    use test_case::test_case;

    #[test_case(AdPolicy::BasicAds, "1111111111", "" => true ; "basic all consented")]
    #[test_case(AdPolicy::BasicAds, "1000000000", "" => false ; "basic only purpose one")]
    #[test_case(AdPolicy::BasicAds, "1", "0100001011" => true ; "basic li fallback")]
    #[test_case(AdPolicy::BasicAds, "0", "1100001011" => false ; "basic purpose one needs consent")]
    #[test_case(AdPolicy::PersonalizedAds, "1111111111", "" => true ; "personalized all consented")]
    #[test_case(AdPolicy::PersonalizedAds, "1001", "0110001011" => false ; "personalized purpose three needs consent")]
    #[test_case(AdPolicy::PersonalizedAds, "1011", "0100001011" => true ; "personalized li fallback")]
    #[test_case(AdPolicy::AnalyticsAdStorage, "", "1" => true ; "storage via li")]
    #[test_case(AdPolicy::AnalyticsAdStorage, "0111111111", "0" => false ; "storage missing")]
    #[test_case(AdPolicy::AnalyticsAdPersonalization, "001", "0001" => true ; "personalization mixed")]
    #[test_case(AdPolicy::AnalyticsAdPersonalization, "0010", "" => false ; "personalization missing four")]
    #[test_case(AdPolicy::AnalyticsAdUserData, "1", "0000001" => true ; "user data mixed")]
    #[test_case(AdPolicy::AnalyticsAdUserData, "1", "" => false ; "user data missing seven")]
    fn policy(policy: AdPolicy, consents: &str, legitimate_interests: &str) -> bool {
        policy
            .requirement()
            .is_satisfied_by(consents, legitimate_interests)
    }

    #[test_case(&BASIC_ADS, "1111111111", "", true, false => true ; "basic vendor consented")]
    #[test_case(&BASIC_ADS, "1111111111", "", false, true => false ; "basic vendor without consent")]
    #[test_case(&BASIC_ADS, "1", "0100001011", true, true => true ; "basic li with vendor li")]
    #[test_case(&BASIC_ADS, "1", "0100001011", true, false => false ; "basic li without vendor li")]
    #[test_case(&BASIC_ADS, "1100001011", "0100001011", true, false => true ; "basic consent covers li purposes")]
    #[test_case(&PERSONALIZED_ADS, "1011", "0100001011", true, true => true ; "personalized mixed bases")]
    #[test_case(&PERSONALIZED_ADS, "1011", "0100001011", false, true => false ; "personalized needs vendor consent")]
    #[test_case(&PERSONALIZATION_CONSENT, "1011", "", true, false => true ; "personalization consent")]
    #[test_case(&PERSONALIZATION_CONSENT, "1011", "", false, true => false ; "personalization consent without vendor")]
    #[test_case(&PERSONALIZATION_CONSENT, "1001", "0010", true, true => false ; "personalization consent ignores li")]
    #[test_case(&ANALYTICS_AD_STORAGE, "", "1", false, true => true ; "storage via vendor li")]
    fn vendor_requirement(
        requirement: &PurposeRequirement,
        consents: &str,
        legitimate_interests: &str,
        vendor_consent: bool,
        vendor_legitimate_interest: bool,
    ) -> bool {
        requirement.is_satisfied_for_vendor(
            consents,
            legitimate_interests,
            vendor_consent,
            vendor_legitimate_interest,
        )
    }

    #[test]
    fn vendor_scope_is_never_looser() {
        let inputs = [("1111111111", ""), ("1", "0100001011"), ("1011", "1111111111")];
        for policy in AdPolicy::ALL {
            for (consents, legitimate_interests) in inputs {
                for (vc, vli) in [(true, true), (true, false), (false, true), (false, false)] {
                    let requirement = policy.requirement();
                    if requirement.is_satisfied_for_vendor(consents, legitimate_interests, vc, vli)
                    {
                        assert!(
                            requirement.is_satisfied_by(consents, legitimate_interests),
                            "{policy} {consents} {legitimate_interests}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn every_policy_needs_something() {
        for policy in AdPolicy::ALL {
            assert!(!policy.requirement().is_satisfied_by("", ""), "{policy}");
        }
    }

    #[test]
    fn purpose_ids() {
        assert_eq!(Purpose::from_u16(1), Some(Purpose::StoreAndAccessInformation));
        assert_eq!(Purpose::from_u16(10), Some(Purpose::DevelopAndImproveServices));
        assert_eq!(Purpose::from_u16(12), None);
        assert_eq!(Purpose::MeasureAdPerformance.to_string(), "MeasureAdPerformance");
        assert_eq!(BASIC_ADS.consent_or_legitimate_interest, &[2, 7, 9, 10]);
        assert_eq!(PERSONALIZED_ADS.consent, &[1, 3, 4]);
    }
}
