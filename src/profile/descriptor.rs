//! Profile descriptor strings
//!
//! Turns a profile into the text that is fed to the embedding model. The
//! descriptor is a deterministic function of the profile: attributes are
//! visited in ingestion order and rendered as `key: value` tokens joined by a
//! single space.

use super::Profile;
use serde::{Deserialize, Serialize};

/// Identity and contact attributes, matched case-insensitively
pub const IDENTITY_FIELDS: &[&str] = &["name", "email", "phone"];

/// Which attributes a descriptor covers.
///
/// Search indexes full profiles so that a query can name a person directly.
/// Clustering uses content only so identity text never contributes to the
/// similarity between two people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorMode {
    /// Every populated attribute
    FullProfile,
    /// Populated attributes minus [`IDENTITY_FIELDS`]
    ContentOnly,
}

impl DescriptorMode {
    pub fn excluded_fields(&self) -> &'static [&'static str] {
        match self {
            DescriptorMode::FullProfile => &[],
            DescriptorMode::ContentOnly => IDENTITY_FIELDS,
        }
    }
}

/// Build the descriptor string of `profile`, skipping `exclude_fields`.
///
/// A value is skipped when it is null, blank after trimming, or the literal
/// `null` in any case.
pub fn describe(profile: &Profile, exclude_fields: &[&str]) -> String {
    let mut parts = Vec::with_capacity(profile.len());

    for (key, value) in profile.iter() {
        if exclude_fields.iter().any(|f| f.eq_ignore_ascii_case(key)) {
            continue;
        }
        if value.is_null() {
            continue;
        }

        let rendered = value.to_string();
        let rendered = rendered.trim();
        if rendered.is_empty() || rendered.eq_ignore_ascii_case("null") {
            continue;
        }

        parts.push(format!("{}: {}", key, rendered));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileValue;

    fn sample() -> Profile {
        Profile::from_pairs([
            ("name", ProfileValue::from("Abigail Hopkins")),
            ("email", ProfileValue::from("abby@example.com")),
            ("city", ProfileValue::from(" Madison ")),
            ("major", ProfileValue::from("Psychology")),
            ("grad_school", ProfileValue::Null),
            ("class_year", ProfileValue::from(2016i64)),
        ])
    }

    #[test]
    fn test_descriptor_is_deterministic() {
        let profile = sample();
        let first = profile.descriptor(DescriptorMode::FullProfile);
        let second = profile.descriptor(DescriptorMode::FullProfile);
        assert_eq!(first, second);
    }

    #[test]
    fn test_null_and_blank_values_are_skipped() {
        let profile = Profile::from_pairs([
            ("city", ""),
            ("major", "null"),
            ("employer", "Acme"),
        ]);
        assert_eq!(describe(&profile, &[]), "employer: Acme");

        let shouting = Profile::from_pairs([("major", "NULL"), ("country", "  ")]);
        assert_eq!(describe(&shouting, &[]), "");
    }

    #[test]
    fn test_full_profile_keeps_identity() {
        let text = sample().descriptor(DescriptorMode::FullProfile);
        assert_eq!(
            text,
            "name: Abigail Hopkins email: abby@example.com city: Madison major: Psychology class_year: 2016"
        );
    }

    #[test]
    fn test_content_only_drops_identity_and_contact() {
        let text = sample().descriptor(DescriptorMode::ContentOnly);
        assert_eq!(text, "city: Madison major: Psychology class_year: 2016");
    }

    #[test]
    fn test_exclusions_ignore_case() {
        let profile = Profile::from_pairs([("Name", "Ada"), ("EMAIL", "ada@x.org"), ("city", "London")]);
        assert_eq!(describe(&profile, IDENTITY_FIELDS), "city: London");
    }
}
