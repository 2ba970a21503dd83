use assert_json_diff::assert_json_eq;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use tcf_consent::evaluator::{ConsentPolicyEvaluator, EvaluatorConfig, PartnerMatching};
use tcf_consent::store::{ConsentKey, ConsentStore, MemoryStore, StoredValue};

#[derive(Deserialize)]
#[serde(untagged)]
enum PrefValue {
    String(String),
    Int(i64),
}

#[derive(Deserialize)]
pub struct TestCase {
    prefs: BTreeMap<String, PrefValue>,
    #[serde(default)]
    exact_partners: bool,
    #[serde(default)]
    vendors: Vec<u16>,
    #[serde(default)]
    partners: Vec<u32>,
    #[serde(default)]
    scoped_vendors: Vec<u16>,
    now_ms: Option<u64>,
    expected: Expected,
}

#[derive(Deserialize, Serialize)]
struct Expected {
    gdpr_applies: bool,
    can_show_ads: bool,
    can_show_personalized_ads: bool,
    analytics_ad_storage: bool,
    analytics_ad_personalization: bool,
    analytics_ad_user_data: bool,
    #[serde(default)]
    vendors: BTreeMap<u16, bool>,
    #[serde(default)]
    partners: BTreeMap<u32, bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    vendor_policies: BTreeMap<u16, VendorPolicies>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purged: Option<bool>,
}

#[derive(Deserialize, Serialize)]
struct VendorPolicies {
    can_show_ads: bool,
    can_show_personalized_ads: bool,
    has_consent: bool,
}

impl TestCase {
    pub fn load_from_file<P: AsRef<Path>>(p: P) -> io::Result<Self> {
        let f = File::open(p)?;
        let tc: Self = serde_json::from_reader(&f)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
        Ok(tc)
    }

    fn store(&self) -> MemoryStore {
        let store = MemoryStore::new();
        for (name, value) in &self.prefs {
            let key = ConsentKey::from_pref_name(name)
                .unwrap_or_else(|| panic!("unknown preference {name}"));
            let value = match value {
                PrefValue::String(s) => StoredValue::String(s.clone()),
                PrefValue::Int(n) => StoredValue::Int(*n),
            };
            store.insert(key, value);
        }
        store
    }

    pub fn assert_decisions_match(&self) {
        let config = EvaluatorConfig {
            partner_matching: if self.exact_partners {
                PartnerMatching::Exact
            } else {
                PartnerMatching::Substring
            },
            ..EvaluatorConfig::default()
        };
        let evaluator = ConsentPolicyEvaluator::with_config(self.store(), config);
        let report = evaluator.report(&self.vendors, &self.partners);
        let vendor_policies = self
            .scoped_vendors
            .iter()
            .map(|&id| {
                let policies = evaluator.vendor_policies(id);
                let policies = VendorPolicies {
                    can_show_ads: policies.can_show_ads,
                    can_show_personalized_ads: policies.can_show_personalized_ads,
                    has_consent: policies.has_consent,
                };
                (id, policies)
            })
            .collect();

        let purged = self.now_ms.map(|ms| {
            let purged =
                evaluator.purge_expired_consent_string(UNIX_EPOCH + Duration::from_millis(ms));
            assert_eq!(
                evaluator.store().get_string(ConsentKey::TcString).is_none(),
                purged || !self.prefs.contains_key(ConsentKey::TcString.pref_name())
            );
            purged
        });

        let actual = Expected {
            gdpr_applies: report.gdpr_applies,
            can_show_ads: report.can_show_ads,
            can_show_personalized_ads: report.can_show_personalized_ads,
            analytics_ad_storage: report.analytics.ad_storage,
            analytics_ad_personalization: report.analytics.ad_personalization,
            analytics_ad_user_data: report.analytics.ad_user_data,
            vendors: report.vendors,
            partners: report.partners,
            vendor_policies,
            purged,
        };

        assert_json_eq!(actual, self.expected);
    }
}
