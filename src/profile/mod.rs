//! Profile records
//!
//! A profile is an ordered attribute map with typed scalar values. Records are
//! validated once, when they are ingested; everything downstream works with
//! [`Profile`] and [`ProfileValue`] only.

pub mod descriptor;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use descriptor::{describe, DescriptorMode, IDENTITY_FIELDS};

/// Attribute holding a profile's identity
pub const IDENTITY_FIELD: &str = "name";

/// Attribute populated by the description generator
pub const DESCRIPTION_FIELD: &str = "description";

/// Profile ingestion errors
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed profile data: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ProfileResult<T> = Result<T, ProfileError>;

/// Scalar attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl ProfileValue {
    /// Convert a JSON value. Arrays and objects are not profile attributes.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(ProfileValue::Null),
            serde_json::Value::Bool(b) => Some(ProfileValue::Boolean(*b)),
            serde_json::Value::String(s) => Some(ProfileValue::Text(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(ProfileValue::Integer(i))
                } else {
                    // NaN-like spreadsheet holes arrive as non-finite floats
                    n.as_f64()
                        .filter(|f| f.is_finite())
                        .map(ProfileValue::Float)
                        .or(Some(ProfileValue::Null))
                }
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ProfileValue::Null)
    }

    /// Get text value if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ProfileValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ProfileValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ProfileValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            ProfileValue::Text(_) => "Text",
            ProfileValue::Integer(_) => "Integer",
            ProfileValue::Float(_) => "Float",
            ProfileValue::Boolean(_) => "Boolean",
            ProfileValue::Null => "Null",
        }
    }
}

impl fmt::Display for ProfileValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileValue::Text(s) => write!(f, "{}", s),
            ProfileValue::Integer(i) => write!(f, "{}", i),
            ProfileValue::Float(fl) => write!(f, "{}", fl),
            ProfileValue::Boolean(b) => write!(f, "{}", b),
            ProfileValue::Null => write!(f, "null"),
        }
    }
}

impl From<String> for ProfileValue {
    fn from(s: String) -> Self {
        ProfileValue::Text(s)
    }
}

impl From<&str> for ProfileValue {
    fn from(s: &str) -> Self {
        ProfileValue::Text(s.to_string())
    }
}

impl From<i64> for ProfileValue {
    fn from(i: i64) -> Self {
        ProfileValue::Integer(i)
    }
}

impl From<f64> for ProfileValue {
    fn from(f: f64) -> Self {
        ProfileValue::Float(f)
    }
}

impl From<bool> for ProfileValue {
    fn from(b: bool) -> Self {
        ProfileValue::Boolean(b)
    }
}

impl<T: Into<ProfileValue>> From<Option<T>> for ProfileValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ProfileValue::Null)
    }
}

/// A person profile: attributes in ingestion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    attributes: IndexMap<String, ProfileValue>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a profile from `(key, value)` pairs, keeping their order
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<ProfileValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            attributes: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Validate a JSON object into a profile. Nested values are dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut profile = Profile::new();
        for (key, raw) in object {
            match ProfileValue::from_json(raw) {
                Some(v) => profile.set(key.clone(), v),
                None => debug!(attribute = %key, "Dropping non-scalar profile attribute"),
            }
        }
        Some(profile)
    }

    /// Set an attribute, keeping its original position if it already exists
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ProfileValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ProfileValue> {
        self.attributes.get(key)
    }

    /// Identity of the profile: the trimmed, non-blank `name` attribute
    pub fn name(&self) -> Option<&str> {
        self.get(IDENTITY_FIELD)
            .and_then(ProfileValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ProfileValue)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Descriptor string for the given mode
    pub fn descriptor(&self, mode: DescriptorMode) -> String {
        describe(self, mode.excluded_fields())
    }
}

/// Parse profiles from a JSON array or JSON Lines text.
///
/// Malformed lines, non-object entries and records without a name are skipped
/// with a warning; only an unreadable JSON array aborts the load.
pub fn parse_profiles(text: &str) -> ProfileResult<Vec<Profile>> {
    let trimmed = text.trim_start();

    let records: Vec<serde_json::Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(line_no, line)| match serde_json::from_str(line) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "Skipping malformed profile line");
                    None
                }
            })
            .collect()
    };

    let total = records.len();
    let mut profiles = Vec::with_capacity(total);
    for (position, record) in records.iter().enumerate() {
        let Some(profile) = Profile::from_json(record) else {
            warn!(position, "Skipping profile record that is not a JSON object");
            continue;
        };
        if profile.name().is_none() {
            warn!(position, "Skipping profile record without a name");
            continue;
        }
        profiles.push(profile);
    }

    info!(loaded = profiles.len(), skipped = total - profiles.len(), "Profiles parsed");
    Ok(profiles)
}

/// Load profiles from a `.json` / `.jsonl` file
pub fn load_profiles(path: impl AsRef<Path>) -> ProfileResult<Vec<Profile>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_profiles(&text)
}

/// Write profiles as JSON Lines, one object per line in attribute order
pub fn write_profiles(path: impl AsRef<Path>, profiles: &[Profile]) -> ProfileResult<()> {
    let mut out = String::new();
    for profile in profiles {
        out.push_str(&serde_json::to_string(profile)?);
        out.push('\n');
    }
    std::fs::write(path.as_ref(), out)?;
    debug!(path = %path.as_ref().display(), count = profiles.len(), "Profiles written");
    Ok(())
}
