//! Shared API request/response types for the roadmap service.
//!
//! Field names and status strings here are part of the wire contract with the
//! deployed roadmap front end (and with rows already persisted by the legacy
//! backend), so renaming anything in this module is a breaking change.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Max title length in characters.
pub const MAX_TITLE_LENGTH: usize = 100;
/// Max description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
/// Email recorded when the submitter leaves the field blank.
pub const ANONYMOUS_EMAIL: &str = "Anonymous";

// ============================================================================
// Response envelope
// ============================================================================

/// Uniform envelope wrapping every roadmap response, success or failure.
///
/// `data` is omitted from the serialized form when absent, matching the
/// legacy API (clients check `success` first and only then read `data`).
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Failure response; never carries a payload.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

// ============================================================================
// Features
// ============================================================================

/// Lifecycle stage of a feature request.
///
/// `UnderReview` is the only status this service ever writes; the rest are
/// assigned by the roadmap maintainers directly in the backing table.
/// `Declined` features are filtered out of every list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureStatus {
    UnderReview,
    Prioritising,
    Planned,
    InProgress,
    Completed,
    Exploring,
    Declined,
}

impl FeatureStatus {
    /// The wire/storage form, e.g. `"Under Review"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureStatus::UnderReview => "Under Review",
            FeatureStatus::Prioritising => "Prioritising",
            FeatureStatus::Planned => "Planned",
            FeatureStatus::InProgress => "In Progress",
            FeatureStatus::Completed => "Completed",
            FeatureStatus::Exploring => "Exploring",
            FeatureStatus::Declined => "Declined",
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for status strings that are not one of the seven known stages.
#[derive(Debug, thiserror::Error)]
#[error("unknown feature status: {0}")]
pub struct UnknownStatus(String);

impl FromStr for FeatureStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Under Review" => Ok(FeatureStatus::UnderReview),
            "Prioritising" => Ok(FeatureStatus::Prioritising),
            "Planned" => Ok(FeatureStatus::Planned),
            "In Progress" => Ok(FeatureStatus::InProgress),
            "Completed" => Ok(FeatureStatus::Completed),
            "Exploring" => Ok(FeatureStatus::Exploring),
            "Declined" => Ok(FeatureStatus::Declined),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl Serialize for FeatureStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeatureStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A public feature request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub votes: i64,
    pub status: FeatureStatus,
    /// When the feature was submitted. Wire name kept from the legacy API.
    pub submitted: DateTime<Utc>,
    pub email: String,
}

// ============================================================================
// Requests
// ============================================================================

/// Request body for submitting a new feature.
///
/// Validation (field presence and length limits) happens server-side so the
/// rejection messages stay identical for every client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFeaturePayload {
    pub title: String,
    pub description: String,
    /// Optional contact email; blank or missing becomes [`ANONYMOUS_EMAIL`].
    #[serde(default)]
    pub email: Option<String>,
}

/// Client-reported request attributes used to derive the pseudonymous user
/// key for rate limiting. Both fields are self-reported and spoofable; they
/// are never treated as identity proof.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Payload of a successful vote or unvote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub feature_id: i64,
    pub new_votes: i64,
}

/// Payload of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedFeature {
    pub id: i64,
}
