//! Loading of Android `SharedPreferences` files.
//!
//! The default preferences of an application live in
//! `/data/data/<package>/shared_prefs/<package>_preferences.xml`:
//!
//! ```xml
//! <?xml version='1.0' encoding='utf-8' standalone='yes' ?>
//! <map>
//!     <string name="IABTCF_PurposeConsents">1111111111</string>
//!     <int name="IABTCF_gdprApplies" value="1" />
//! </map>
//! ```
use crate::store::{ConsentKey, MemoryStore, StoredValue};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PrefsError {
    #[error("unable to read preferences file")]
    Io(#[from] io::Error),
    #[error("invalid preferences XML")]
    Xml(#[from] roxmltree::Error),
    #[error("unexpected root element <{0}>, expected <map>")]
    UnexpectedRoot(String),
    #[error("missing name attribute on <{0}>")]
    MissingName(String),
    #[error("invalid {kind} value {value:?} for {name}")]
    InvalidValue {
        kind: &'static str,
        name: String,
        value: String,
    },
}

/// Reads a preferences file and keeps the TCF keys it contains.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<MemoryStore, PrefsError> {
    let xml = std::fs::read_to_string(path)?;
    from_xml(&xml)
}

/// Parses the XML content of a preferences file and keeps the TCF keys it contains.
///
/// # Example
///
/// ```
/// use tcf_consent::store::{ConsentKey, ConsentStore};
/// use tcf_consent::store::shared_prefs::from_xml;
///
/// let store = from_xml(r#"<map><int name="IABTCF_gdprApplies" value="1" /></map>"#).unwrap();
///
/// assert_eq!(store.get_int(ConsentKey::GdprApplies), Some(1));
/// ```
pub fn from_xml(xml: &str) -> Result<MemoryStore, PrefsError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(PrefsError::UnexpectedRoot(root.tag_name().name().to_string()));
    }

    let store = MemoryStore::new();

    for node in root.children().filter(|n| n.is_element()) {
        let kind = node.tag_name().name();
        let name = node
            .attribute("name")
            .ok_or_else(|| PrefsError::MissingName(kind.to_string()))?;

        let Some(key) = ConsentKey::from_pref_name(name) else {
            continue;
        };

        let value = match kind {
            "string" => StoredValue::String(node.text().unwrap_or_default().to_string()),
            "int" | "long" => {
                let raw = node.attribute("value").unwrap_or_default();
                let n = raw.trim().parse().map_err(|_| PrefsError::InvalidValue {
                    kind: if kind == "int" { "int" } else { "long" },
                    name: name.to_string(),
                    value: raw.to_string(),
                })?;
                StoredValue::Int(n)
            }
            _ => {
                debug!(name, kind, "ignoring preference of unsupported type");
                continue;
            }
        };

        store.insert(key, value);
    }

    Ok(store)
}
