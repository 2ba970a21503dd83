//! Access to the preference values written by a consent management platform.
//!
//! On Android, CMPs store TCF data in the default `SharedPreferences`; on iOS, in
//! `NSUserDefaults`. Both are flat key-value stores using the key names of [`ConsentKey`].
//!
//! The evaluator only needs the read and remove operations of [`ConsentStore`]. This module
//! provides [`MemoryStore`], an in-memory implementation that can be filled programmatically,
//! from a `SharedPreferences` XML file (see [`shared_prefs`]), or from JSON with the `serde`
//! feature.
use fnv::FnvHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use strum_macros::Display;

pub mod shared_prefs;

/// The preference keys read by the evaluator.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
pub enum ConsentKey {
    PurposeConsents,
    PurposeLegitimateInterests,
    VendorConsents,
    VendorLegitimateInterests,
    AdditionalConsent,
    TcString,
    GdprApplies,
}

impl ConsentKey {
    pub const ALL: [ConsentKey; 7] = [
        ConsentKey::PurposeConsents,
        ConsentKey::PurposeLegitimateInterests,
        ConsentKey::VendorConsents,
        ConsentKey::VendorLegitimateInterests,
        ConsentKey::AdditionalConsent,
        ConsentKey::TcString,
        ConsentKey::GdprApplies,
    ];

    /// The key name used in platform preferences.
    pub const fn pref_name(self) -> &'static str {
        match self {
            ConsentKey::PurposeConsents => "IABTCF_PurposeConsents",
            ConsentKey::PurposeLegitimateInterests => "IABTCF_PurposeLegitimateInterests",
            ConsentKey::VendorConsents => "IABTCF_VendorConsents",
            ConsentKey::VendorLegitimateInterests => "IABTCF_VendorLegitimateInterests",
            ConsentKey::AdditionalConsent => "IABTCF_AddtlConsent",
            ConsentKey::TcString => "IABTCF_TCString",
            ConsentKey::GdprApplies => "IABTCF_gdprApplies",
        }
    }

    pub fn from_pref_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.pref_name() == name)
    }
}

/// A read and delete view over platform preferences.
///
/// Implementations return [`None`] for absent keys, and for keys holding a value of another
/// type. Removing an absent key is a no-op.
pub trait ConsentStore {
    fn get_string(&self, key: ConsentKey) -> Option<String>;

    fn get_int(&self, key: ConsentKey) -> Option<i64>;

    fn remove(&self, key: ConsentKey);
}

impl<T> ConsentStore for &T
where
    T: ConsentStore + ?Sized,
{
    fn get_string(&self, key: ConsentKey) -> Option<String> {
        (**self).get_string(key)
    }

    fn get_int(&self, key: ConsentKey) -> Option<i64> {
        (**self).get_int(key)
    }

    fn remove(&self, key: ConsentKey) {
        (**self).remove(key)
    }
}

impl<T> ConsentStore for Arc<T>
where
    T: ConsentStore + ?Sized,
{
    fn get_string(&self, key: ConsentKey) -> Option<String> {
        (**self).get_string(key)
    }

    fn get_int(&self, key: ConsentKey) -> Option<i64> {
        (**self).get_int(key)
    }

    fn remove(&self, key: ConsentKey) {
        (**self).remove(key)
    }
}

/// A value held by a [`MemoryStore`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(untagged))]
pub enum StoredValue {
    String(String),
    Int(i64),
}

/// A thread-safe, in-memory [`ConsentStore`].
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<FnvHashMap<ConsentKey, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(self, key: ConsentKey, value: impl Into<String>) -> Self {
        self.insert(key, StoredValue::String(value.into()));
        self
    }

    pub fn with_int(self, key: ConsentKey, value: i64) -> Self {
        self.insert(key, StoredValue::Int(value));
        self
    }

    pub fn insert(&self, key: ConsentKey, value: StoredValue) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    pub fn get(&self, key: ConsentKey) -> Option<StoredValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    pub fn contains(&self, key: ConsentKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConsentStore for MemoryStore {
    fn get_string(&self, key: ConsentKey) -> Option<String> {
        match self.get(key)? {
            StoredValue::String(s) => Some(s),
            StoredValue::Int(_) => None,
        }
    }

    fn get_int(&self, key: ConsentKey) -> Option<i64> {
        match self.get(key)? {
            StoredValue::Int(n) => Some(n),
            StoredValue::String(_) => None,
        }
    }

    fn remove(&self, key: ConsentKey) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_map()
            .entries(values.iter().map(|(k, v)| (k.pref_name(), v)))
            .finish()
    }
}

/// Builds a store from a flat JSON object mapping platform key names to values.
/// Keys which are not TCF keys are skipped.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for MemoryStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = std::collections::BTreeMap::<String, MaybeValue>::deserialize(deserializer)?;

        let store = MemoryStore::new();
        for (name, value) in values {
            match (ConsentKey::from_pref_name(&name), value) {
                (Some(key), MaybeValue::Value(value)) => store.insert(key, value),
                _ => tracing::debug!(name = %name, "ignoring preference"),
            }
        }

        Ok(store)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeValue {
    Value(StoredValue),
    #[allow(dead_code)]
    Other(serde::de::IgnoredAny),
}
