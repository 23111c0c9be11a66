//! Payload builders with "with/without" field semantics.
//!
//! Tests start from a known-good payload and add or remove single fields,
//! so each test states only the field it is about.

use jobad_client::model::{
    Category, Contact, Location, Salary, Standout, TemplateItem, TemplateRef, Video, WorkType,
};
use jobad_client::{Advertisement, AdvertisementState};
use serde_json::{Map, Number, Value, json};

/// Advertiser used by the sample payloads.
pub const SAMPLE_ADVERTISER_ID: &str = "345";

macro_rules! optional_field {
    ($field:ident, $with:ident, $without:ident, $ty:ty) => {
        #[doc = concat!("Set `", stringify!($field), "`.")]
        #[must_use]
        pub fn $with(mut self, value: impl Into<$ty>) -> Self {
            self.advertisement.$field = Some(value.into());
            self
        }

        #[doc = concat!("Clear `", stringify!($field), "`.")]
        #[must_use]
        pub fn $without(mut self) -> Self {
            self.advertisement.$field = None;
            self
        }
    };
}

/// Builds [`Advertisement`] payloads.
#[derive(Debug, Clone, Default)]
pub struct AdvertisementBuilder {
    advertisement: Advertisement,
}

impl AdvertisementBuilder {
    /// An empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing payload, e.g. one read back from the server.
    #[must_use]
    pub const fn from_advertisement(advertisement: Advertisement) -> Self {
        Self { advertisement }
    }

    /// The smallest payload the API accepts.
    #[must_use]
    pub fn minimum_valid() -> Self {
        Self::new()
            .with_creation_id(uuid::Uuid::new_v4().to_string())
            .with_advertiser_id(SAMPLE_ADVERTISER_ID)
            .with_advertisement_type("Classic")
            .with_job_title("Exciting Senior Developer role in a great CBD location. Great $$$")
            .with_job_summary("Developer job")
            .with_advertisement_details("Exciting developer job in a great CBD location.")
            .with_work_type(WorkType::FullTime)
            .with_salary(Salary {
                salary_type: Some("AnnualPackage".to_string()),
                minimum: Some(100_000.into()),
                maximum: Some(119_999.into()),
                ..Salary::default()
            })
            .with_location(Location {
                id: Some("Sydney".to_string()),
                area_id: Some("SydneyNorthShoreNorthernBeaches".to_string()),
                ..Location::default()
            })
            .with_category(Category {
                id: Some("1".to_string()),
                sub_category_id: Some("6144".to_string()),
                ..Category::default()
            })
    }

    /// A payload with every modelled field set.
    #[must_use]
    pub fn full() -> Self {
        Self::minimum_valid()
            .with_advertisement_type("StandOut")
            .with_search_job_title("Senior Developer")
            .with_contact(Contact {
                name: Some("Contact name".to_string()),
                phone: Some("0412 345 678".to_string()),
                email: Some("qwert@asdf.com".to_string()),
                ..Contact::default()
            })
            .with_application_email("asdf@asdf.com")
            .with_application_form_url("http://apply.com/")
            .with_screen_id(1u64)
            .with_job_reference("JOB1234")
            .with_agent_job_reference("AGENTJOB1234")
            .with_template(TemplateRef {
                id: Some("1".to_string()),
                items: vec![TemplateItem {
                    name: "Template Line 1".to_string(),
                    value: "Template Value 1".to_string(),
                    ..TemplateItem::default()
                }],
                ..TemplateRef::default()
            })
            .with_standout(Standout {
                logo_id: Some("1".to_string()),
                bullets: vec![
                    "Uzi".to_string(),
                    "Remington Model \"870\"".to_string(),
                    "AK-47".to_string(),
                ],
                ..Standout::default()
            })
            .with_video(Video {
                url: Some("https://www.youtube.com/embed/dVDk7PXNXB8".to_string()),
                position: Some("Below".to_string()),
                ..Video::default()
            })
            .with_additional_properties(["ResidentsOnly", "Graduate"])
    }

    optional_field!(id, with_id, without_id, String);
    optional_field!(creation_id, with_creation_id, without_creation_id, String);
    optional_field!(advertiser_id, with_advertiser_id, without_advertiser_id, String);
    optional_field!(state, with_state, without_state, AdvertisementState);
    optional_field!(advertisement_type, with_advertisement_type, without_advertisement_type, String);
    optional_field!(job_title, with_job_title, without_job_title, String);
    optional_field!(search_job_title, with_search_job_title, without_search_job_title, String);
    optional_field!(job_summary, with_job_summary, without_job_summary, String);
    optional_field!(advertisement_details, with_advertisement_details, without_advertisement_details, String);
    optional_field!(work_type, with_work_type, without_work_type, WorkType);
    optional_field!(salary, with_salary, without_salary, Salary);
    optional_field!(location, with_location, without_location, Location);
    optional_field!(category, with_category, without_category, Category);
    optional_field!(contact, with_contact, without_contact, Contact);
    optional_field!(application_email, with_application_email, without_application_email, String);
    optional_field!(application_form_url, with_application_form_url, without_application_form_url, String);
    optional_field!(screen_id, with_screen_id, without_screen_id, u64);
    optional_field!(job_reference, with_job_reference, without_job_reference, String);
    optional_field!(agent_job_reference, with_agent_job_reference, without_agent_job_reference, String);
    optional_field!(template, with_template, without_template, TemplateRef);
    optional_field!(standout, with_standout, without_standout, Standout);
    optional_field!(video, with_video, without_video, Video);

    /// Set the salary lower bound, creating the salary if needed.
    #[must_use]
    pub fn with_salary_minimum(mut self, minimum: impl Into<Number>) -> Self {
        self.advertisement
            .salary
            .get_or_insert_with(Salary::default)
            .minimum = Some(minimum.into());
        self
    }

    /// Set the additional property flags.
    #[must_use]
    pub fn with_additional_properties<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.advertisement.additional_properties = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Clear the additional property flags.
    #[must_use]
    pub fn without_additional_properties(mut self) -> Self {
        self.advertisement.additional_properties.clear();
        self
    }

    /// Set a field this crate does not model.
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.advertisement.extra.insert(name.into(), value);
        self
    }

    /// Clear a field this crate does not model.
    #[must_use]
    pub fn without_extra(mut self, name: &str) -> Self {
        self.advertisement.extra.remove(name);
        self
    }

    /// Finish the payload.
    #[must_use]
    pub fn build(self) -> Advertisement {
        self.advertisement
    }

    /// Finish as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.advertisement).unwrap_or(Value::Null)
    }
}

/// Builds HAL documents for mock responses.
#[derive(Debug, Clone, Default)]
pub struct HalDocumentBuilder {
    properties: Map<String, Value>,
    links: Map<String, Value>,
    embedded: Map<String, Value>,
}

impl HalDocumentBuilder {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the properties of a JSON object; other values are ignored.
    #[must_use]
    pub fn from_properties(properties: Value) -> Self {
        match properties {
            Value::Object(properties) => Self {
                properties,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// Add a property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Add a plain link.
    #[must_use]
    pub fn link(mut self, relation: impl Into<String>, href: impl Into<String>) -> Self {
        self.links
            .insert(relation.into(), json!({ "href": href.into() }));
        self
    }

    /// Add a templated link.
    #[must_use]
    pub fn templated_link(mut self, relation: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.insert(
            relation.into(),
            json!({ "href": href.into(), "templated": true }),
        );
        self
    }

    /// Embed a collection.
    #[must_use]
    pub fn embedded(mut self, name: impl Into<String>, items: Vec<Value>) -> Self {
        self.embedded.insert(name.into(), Value::Array(items));
        self
    }

    /// Finish the document.
    #[must_use]
    pub fn build(self) -> Value {
        let mut document = self.properties;
        if !self.links.is_empty() {
            document.insert("_links".to_string(), Value::Object(self.links));
        }
        if !self.embedded.is_empty() {
            document.insert("_embedded".to_string(), Value::Object(self.embedded));
        }
        Value::Object(document)
    }
}
