//! HAL links and URI template expansion.
//!
//! A `_links` object maps relation names to a link or an array of links.
//! Relation order from the wire is preserved and a relation resolves to at
//! most one href per resource (the first when the server sends an array).

use crate::error::{ApiError, ApiResult};
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use url::{Url, form_urlencoded};

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([?&]?)([^{}]+)\}").expect("PLACEHOLDER should compile - this is a bug")
});

/// A single hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URI, absolute or relative, possibly templated
    pub href: String,
    /// Whether `href` contains `{param}` placeholders
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
}

impl Link {
    /// Create a non-templated link.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: false,
        }
    }

    /// Create a templated link.
    #[must_use]
    pub fn templated(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: true,
        }
    }

    /// Expand placeholders with `params` and resolve the result against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when a required placeholder has no
    /// value and [`ApiError::InvalidUri`] when the expanded href is not a URI.
    pub fn resolve(&self, base: &Url, params: &[(&str, &str)]) -> ApiResult<Url> {
        let href = if self.templated {
            expand(&self.href, params)?
        } else {
            self.href.clone()
        };
        Ok(base.join(&href)?)
    }
}

/// Expand a URI template.
///
/// `{name}` and `{a,b}` are required path expressions. `{?a,b}` and `{&a,b}`
/// are optional query expressions and drop parameters that have no value.
///
/// # Errors
///
/// Returns [`ApiError::Configuration`] when a required parameter is missing.
pub fn expand(template: &str, params: &[(&str, &str)]) -> ApiResult<String> {
    let lookup = |name: &str| params.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(operator), Some(names)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        last = whole.end();

        let names = names.as_str().split(',').map(str::trim);
        if operator.as_str().is_empty() {
            for (i, name) in names.enumerate() {
                let value = lookup(name).ok_or_else(|| {
                    ApiError::configuration(format!(
                        "template {template} requires parameter '{name}'"
                    ))
                })?;
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&encode_segment(value));
            }
        } else {
            let mut query = form_urlencoded::Serializer::new(String::new());
            let mut any = false;
            for name in names {
                if let Some(value) = lookup(name) {
                    query.append_pair(name, value);
                    any = true;
                }
            }
            if any {
                out.push_str(operator.as_str());
                out.push_str(&query.finish());
            }
        }
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Names of the required placeholders in `template`, in order.
#[must_use]
pub fn required_parameters(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .filter(|caps| caps.get(1).is_some_and(|op| op.as_str().is_empty()))
        .filter_map(|caps| caps.get(2))
        .flat_map(|names| names.as_str().split(',').map(|n| n.trim().to_string()))
        .collect()
}

fn encode_segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Ordered relation-to-link mapping of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    entries: Vec<(String, Link)>,
}

impl Links {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a relation; an existing relation keeps its first link.
    pub fn insert(&mut self, relation: impl Into<String>, link: Link) {
        let relation = relation.into();
        if self.get(&relation).is_none() {
            self.entries.push((relation, link));
        }
    }

    /// Builder form of [`Links::insert`].
    #[must_use]
    pub fn with(mut self, relation: impl Into<String>, link: Link) -> Self {
        self.insert(relation, link);
        self
    }

    /// Link for `relation`, if present.
    #[must_use]
    pub fn get(&self, relation: &str) -> Option<&Link> {
        self.entries
            .iter()
            .find(|(name, _)| name == relation)
            .map(|(_, link)| link)
    }

    /// Link for `relation`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownRelation`] when the relation is absent.
    pub fn require(&self, relation: &str) -> ApiResult<&Link> {
        self.get(relation)
            .ok_or_else(|| ApiError::UnknownRelation(relation.to_string()))
    }

    /// Whether `relation` is present.
    #[must_use]
    pub fn contains(&self, relation: &str) -> bool {
        self.get(relation).is_some()
    }

    /// Relations in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.entries.iter().map(|(name, link)| (name.as_str(), link))
    }

    /// Number of relations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no relations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite every non-templated href as an absolute URI against `base`.
    ///
    /// Templated hrefs are kept as is and joined after expansion.
    #[must_use]
    pub fn absolutize(mut self, base: &Url) -> Self {
        for (_, link) in &mut self.entries {
            if !link.templated {
                if let Ok(url) = base.join(&link.href) {
                    link.href = url.into();
                }
            }
        }
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Link),
    Many(Vec<Link>),
}

impl<'de> Deserialize<'de> for Links {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LinksVisitor;

        impl<'de> Visitor<'de> for LinksVisitor {
            type Value = Links;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of relation names to links")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Links, A::Error> {
                let mut links = Links::new();
                while let Some((relation, value)) = map.next_entry::<String, OneOrMany>()? {
                    match value {
                        OneOrMany::One(link) => links.insert(relation, link),
                        OneOrMany::Many(list) => {
                            if let Some(link) = list.into_iter().next() {
                                links.insert(relation, link);
                            }
                        }
                    }
                }
                Ok(links)
            }
        }

        deserializer.deserialize_map(LinksVisitor)
    }
}

impl Serialize for Links {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (relation, link) in &self.entries {
            map.serialize_entry(relation, link)?;
        }
        map.end()
    }
}
