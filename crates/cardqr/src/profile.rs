//! Core profile types for cardqr.
//!
//! A [`Profile`] is one named set of contact fields. Profiles are persisted
//! as JSON with camelCase field names.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Display name given to the seeded first profile.
pub const DEFAULT_PROFILE_NAME: &str = "My Business Card";

/// Length of the random suffix in generated ids.
const ID_SUFFIX_LEN: usize = 7;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque profile identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Generate a fresh id: `profile_<unix millis>_<7 base36 chars>`.
    #[must_use]
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| char::from(BASE36[fastrand::usize(..BASE36.len())]))
            .collect();
        Self(format!("profile_{millis}_{suffix}"))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProfileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A named set of contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Unique identifier.
    pub id: ProfileId,

    /// Internal label, e.g. "Work" or "Personal". Not the person's name.
    pub name: String,

    /// The person's full name.
    pub full_name: String,

    /// Job title.
    pub job_title: String,

    /// Company or organization.
    pub company: String,

    /// Phone number.
    pub phone: String,

    /// Email address.
    pub email: String,

    /// Website URL.
    pub website: String,

    /// Postal address; may span several lines.
    pub address: String,

    /// Free-text tagline shown alongside the card. Never written to the vCard.
    pub tagline: String,

    /// Photo as a `data:image/<type>;base64,<payload>` reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE_NAME)
    }
}

impl Profile {
    /// Create an empty profile with a fresh id and the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProfileId::generate(),
            name: name.into(),
            full_name: String::new(),
            job_title: String::new(),
            company: String::new(),
            phone: String::new(),
            email: String::new(),
            website: String::new(),
            address: String::new(),
            tagline: String::new(),
            photo: None,
        }
    }

    /// Identifier of the on-screen QR rendering for this profile.
    #[must_use]
    pub fn qr_id(&self) -> String {
        format!("qr-code-{}", self.id)
    }

    /// A one-line "title at company" summary, skipping empty parts.
    #[must_use]
    pub fn headline(&self) -> String {
        match (self.job_title.is_empty(), self.company.is_empty()) {
            (false, false) => format!("{} at {}", self.job_title, self.company),
            (false, true) => self.job_title.clone(),
            (true, false) => self.company.clone(),
            (true, true) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = ProfileId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "profile");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ID_SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ProfileId::generate(), ProfileId::generate());
    }

    #[test]
    fn test_default_profile() {
        let profile = Profile::default();
        assert_eq!(profile.name, DEFAULT_PROFILE_NAME);
        assert!(profile.full_name.is_empty());
        assert!(profile.photo.is_none());
    }

    #[test]
    fn test_qr_id() {
        let mut profile = Profile::new("Work");
        profile.id = ProfileId::from("profile_1_abcdefg");
        assert_eq!(profile.qr_id(), "qr-code-profile_1_abcdefg");
    }

    #[test]
    fn test_headline() {
        let mut profile = Profile::new("Work");
        assert_eq!(profile.headline(), "");

        profile.job_title = "Engineer".to_string();
        assert_eq!(profile.headline(), "Engineer");

        profile.company = "Acme".to_string();
        assert_eq!(profile.headline(), "Engineer at Acme");
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut profile = Profile::new("Work");
        profile.full_name = "Ada Lovelace".to_string();
        profile.job_title = "Analyst".to_string();

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(json["jobTitle"], "Analyst");
        assert!(json.get("photo").is_none());
    }

    #[test]
    fn test_deserializes_partial_record() {
        let json = r#"{"id": "profile_42_abc1234", "name": "Old", "fullName": "Grace"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.id.as_str(), "profile_42_abc1234");
        assert_eq!(profile.full_name, "Grace");
        assert!(profile.email.is_empty());
        assert!(profile.photo.is_none());
    }
}
