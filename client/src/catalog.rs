//! Link catalog parsed from the API root document.

use crate::error::{ApiError, ApiResult};
use crate::link::{Link, Links};
use serde::Deserialize;
use url::Url;

#[derive(Deserialize)]
struct RootDocument {
    #[serde(rename = "_links", default)]
    links: Links,
}

/// Immutable relation-to-URI-template mapping for one API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCatalog {
    base: Url,
    links: Links,
}

impl LinkCatalog {
    /// Create a catalog from already-parsed links.
    #[must_use]
    pub const fn new(base: Url, links: Links) -> Self {
        Self { base, links }
    }

    /// Parse a root document body fetched from `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the body is not a HAL document.
    pub fn parse(base: Url, body: &[u8]) -> ApiResult<Self> {
        let document: RootDocument = serde_json::from_slice(body).map_err(|source| ApiError::Decode {
            uri: base.to_string(),
            source,
        })?;
        Ok(Self::new(base, document.links))
    }

    /// URI the catalog was loaded from; relative hrefs resolve against it.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Raw link for `relation`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownRelation`] when the catalog lacks it.
    pub fn link(&self, relation: &str) -> ApiResult<&Link> {
        self.links.require(relation)
    }

    /// Resolve `relation` to an absolute URI, substituting `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownRelation`] for an absent relation and
    /// [`ApiError::Configuration`] when a required parameter is missing.
    pub fn resolve(&self, relation: &str, params: &[(&str, &str)]) -> ApiResult<Url> {
        self.link(relation)?.resolve(&self.base, params)
    }

    /// Resolve a relation whose template takes a single identifier.
    ///
    /// The id is bound to the template's only required placeholder, whatever
    /// its name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when the relation is not templated
    /// or has more than one required placeholder.
    pub fn resolve_id(&self, relation: &str, id: &str) -> ApiResult<Url> {
        let link = self.link(relation)?;
        let names = crate::link::required_parameters(&link.href);
        match names.as_slice() {
            [name] if link.templated => link.resolve(&self.base, &[(name.as_str(), id)]),
            _ => Err(ApiError::configuration(format!(
                "relation '{relation}' cannot be addressed by a single id"
            ))),
        }
    }

    /// Relation names in document order.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|(relation, _)| relation)
    }
}
