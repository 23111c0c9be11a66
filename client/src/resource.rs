//! Hydration of HAL responses into typed resources and pages.

use crate::error::{ApiError, ApiResult};
use crate::link::{Link, Links};
use crate::model::ProcessingStatus;
use crate::transport::RawResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

const LINKS_KEY: &str = "_links";
const EMBEDDED_KEY: &str = "_embedded";

/// Response details kept alongside a hydrated resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status
    pub status: u16,
    /// `X-Request-Id`
    pub request_id: Option<String>,
    /// `Location`
    pub location: Option<String>,
    /// `Processing-Status`
    pub processing_status: Option<ProcessingStatus>,
}

impl ResponseMeta {
    fn from_response(response: &RawResponse) -> Self {
        Self {
            status: response.status.as_u16(),
            request_id: response.request_id().map(str::to_string),
            location: response.location().map(str::to_string),
            processing_status: response.processing_status().and_then(|s| s.parse().ok()),
        }
    }
}

/// A typed representation plus its own links.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource<T> {
    /// Domain payload without `_links` and `_embedded`
    pub properties: T,
    /// Links of this representation; non-templated hrefs are absolute
    pub links: Links,
    /// Response details
    pub meta: ResponseMeta,
}

impl<T> Resource<T> {
    /// Create a resource that was not received from the server.
    #[must_use]
    pub fn new(properties: T) -> Self {
        Self {
            properties,
            links: Links::new(),
            meta: ResponseMeta::default(),
        }
    }

    /// Link for `relation`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownRelation`] when this resource lacks it.
    pub fn link(&self, relation: &str) -> ApiResult<&Link> {
        self.links.require(relation)
    }

    /// The `self` URI.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownRelation`] when there is no `self` link.
    pub fn self_uri(&self) -> ApiResult<Url> {
        Ok(Url::parse(&self.link("self")?.href)?)
    }

    /// Correlation id of the response this came from.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.meta.request_id.as_deref()
    }

    /// Transform the payload, keeping links and response details.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resource<U> {
        Resource {
            properties: f(self.properties),
            links: self.links,
            meta: self.meta,
        }
    }
}

impl<T: DeserializeOwned> Resource<T> {
    /// Hydrate a 2xx response. An empty body hydrates as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the body does not match `T`.
    pub fn from_response(response: &RawResponse) -> ApiResult<Self> {
        let value = parse_body(response)?;
        let (properties, links, _) = split(value, &response.url, response)?;
        Ok(Self {
            properties,
            links,
            meta: ResponseMeta::from_response(response),
        })
    }
}

/// One page of a paged collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items from `_embedded.<name>`, in server order
    pub items: Vec<Resource<T>>,
    /// Page links such as `self` and `next`
    pub links: Links,
    /// Response details
    pub meta: ResponseMeta,
    embedded: String,
    accept: Option<String>,
}

impl<T> Page<T> {
    /// Name of the `_embedded` relation holding the items.
    #[must_use]
    pub fn embedded(&self) -> &str {
        &self.embedded
    }

    /// `Accept` header the page was requested with.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    #[must_use]
    pub(crate) fn with_accept(mut self, accept: Option<String>) -> Self {
        self.accept = accept;
        self
    }

    /// Whether another page follows.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.links.contains("next")
    }

    /// URI of the following page.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoMoreResults`] on the last page.
    pub fn next_uri(&self) -> ApiResult<Url> {
        let link = self.links.get("next").ok_or(ApiError::NoMoreResults)?;
        Ok(Url::parse(&link.href)?)
    }

    /// Number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Hydrate a 2xx collection response whose items live under
    /// `_embedded.<embedded>`. A missing key hydrates as an empty page.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when an item does not match `T`.
    pub fn from_response(response: &RawResponse, embedded: &str) -> ApiResult<Self> {
        let value = parse_body(response)?;
        let (_, links, mut embedded_map) = split::<Value>(value, &response.url, response)?;

        let items = match embedded_map.remove(embedded) {
            Some(Value::Array(values)) => values
                .into_iter()
                .map(|item| {
                    let (properties, links, _) = split(item, &response.url, response)?;
                    Ok(Resource {
                        properties,
                        links,
                        meta: ResponseMeta::default(),
                    })
                })
                .collect::<ApiResult<Vec<_>>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(ApiError::Decode {
                    uri: response.url.to_string(),
                    source: serde::de::Error::custom(format!(
                        "embedded relation '{embedded}' is not an array"
                    )),
                });
            }
        };

        Ok(Self {
            items,
            links,
            meta: ResponseMeta::from_response(response),
            embedded: embedded.to_string(),
            accept: None,
        })
    }
}

fn decode_error(response: &RawResponse, source: serde_json::Error) -> ApiError {
    ApiError::Decode {
        uri: response.url.to_string(),
        source,
    }
}

fn parse_body(response: &RawResponse) -> ApiResult<Value> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(|e| decode_error(response, e))
}

/// Separate a HAL object into its payload, links and embedded map.
fn split<T: DeserializeOwned>(
    value: Value,
    base: &Url,
    response: &RawResponse,
) -> ApiResult<(T, Links, serde_json::Map<String, Value>)> {
    let (value, links, embedded) = match value {
        Value::Object(mut object) => {
            let links = match object.remove(LINKS_KEY) {
                Some(raw) => {
                    serde_json::from_value::<Links>(raw).map_err(|e| decode_error(response, e))?
                }
                None => Links::new(),
            };
            let embedded = match object.remove(EMBEDDED_KEY) {
                Some(Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            };
            (Value::Object(object), links, embedded)
        }
        other => (other, Links::new(), serde_json::Map::new()),
    };

    let properties = serde_json::from_value(value).map_err(|e| decode_error(response, e))?;
    Ok((properties, links.absolutize(base), embedded))
}
