//! Advertisement API payloads.
//!
//! Every field is optional so callers send only what they set. Fields this
//! crate does not model are kept in `extra` at every level, and numbers keep
//! their wire form, so a representation read from the server can be written
//! back without losing data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of an advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdvertisementState {
    /// Live on the job board
    Open,
    /// Taken down
    Expired,
}

/// Asynchronous processing state from the `Processing-Status` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStatus {
    /// Accepted, not yet live
    Pending,
    /// Processed
    Completed,
    /// Processing failed
    Failed,
}

/// An unrecognised `Processing-Status` value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown processing status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ProcessingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        })
    }
}

/// Employment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkType {
    /// Full time
    FullTime,
    /// Part time
    PartTime,
    /// Contract or temporary
    ContractTemp,
    /// Casual
    Casual,
}

/// Salary range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Salary {
    /// e.g. `AnnualPackage`, `HourlyRate`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub salary_type: Option<String>,
    /// Lower bound, as sent on the wire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// Upper bound, as sent on the wire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// Free text shown to candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Job location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Location id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Area within the location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Job classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Sub-category id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category_id: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hiring contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named value substituted into an advertisement template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    /// Placeholder name
    pub name: String,
    /// Value
    pub value: String,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Template applied to an advertisement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    /// Template id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Placeholder values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TemplateItem>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Standout branding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standout {
    /// Logo to show
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_id: Option<String>,
    /// Selling points
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Embedded video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Video URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `Above` or `Below` the description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A job advertisement as sent to and received from the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    /// Server-assigned id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Caller-chosen idempotency key; reuse yields 409
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_id: Option<String>,
    /// Advertiser posting the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertiser_id: Option<String>,
    /// Lifecycle state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AdvertisementState>,
    /// Product type, e.g. `Classic` or `StandOut`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertisement_type: Option<String>,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    /// Title used for search ranking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_job_title: Option<String>,
    /// Short summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_summary: Option<String>,
    /// Full description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertisement_details: Option<String>,
    /// Employment type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkType>,
    /// Salary range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<Salary>,
    /// Location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Applications go to this address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_email: Option<String>,
    /// Applications go to this form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_form_url: Option<String>,
    /// Screening questionnaire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<u64>,
    /// Advertiser's reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<String>,
    /// Recruitment agency's reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_job_reference: Option<String>,
    /// Template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateRef>,
    /// Standout branding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standout: Option<Standout>,
    /// Video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    /// Flags such as `ResidentsOnly` or `Graduate`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_properties: Vec<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Collection item returned when listing advertisements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisementSummary {
    /// Advertisement id
    pub id: String,
    /// Title
    #[serde(default)]
    pub job_title: String,
    /// Advertiser's reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<String>,
    /// Lifecycle state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AdvertisementState>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One JSON patch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// `replace`, `add` or `remove`
    pub op: String,
    /// Target property
    pub path: String,
    /// New value
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl PatchOperation {
    /// `replace path with value`
    #[must_use]
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.into(),
            value: value.into(),
        }
    }

    /// Expire an advertisement.
    #[must_use]
    pub fn expire() -> Self {
        Self::replace("state", "Expired")
    }
}

/// Advertisement template owned by an advertiser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template id
    pub id: i64,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// `Active` or `Inactive`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Logo owned by an advertiser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logo {
    /// Logo id
    pub id: i64,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
