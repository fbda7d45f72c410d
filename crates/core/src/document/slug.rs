/// Document slug parsing utilities.
///
/// Slugs follow these conventions:
/// - Home page: the empty string
/// - Everything else: lowercase letters, digits and `-`, without a leading
///   or trailing `-`
///
/// Route parameters cannot be empty, so the home page is addressed in URLs
/// through the `_home` alias.
use std::fmt;

use serde::{Deserialize, Serialize};

use super::validate::ValidationError;

/// Route alias for the home page slug.
pub const HOME_ALIAS: &str = "_home";

const MAX_SLUG_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Parse a slug as it appears in a document body.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Ok(Self::home());
        }
        if raw.chars().count() > MAX_SLUG_LEN {
            return Err(ValidationError::InvalidSlug {
                slug: raw.to_string(),
                reason: format!("longer than {MAX_SLUG_LEN} characters"),
            });
        }
        if raw.starts_with('-') || raw.ends_with('-') {
            return Err(ValidationError::InvalidSlug {
                slug: raw.to_string(),
                reason: "cannot start or end with '-'".to_string(),
            });
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_alphanumeric() || *c == '-') || c.is_uppercase())
        {
            return Err(ValidationError::InvalidSlug {
                slug: raw.to_string(),
                reason: format!("unexpected character '{c}'"),
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// Parse a slug taken from a URL path segment, resolving the home alias.
    pub fn from_route_param(param: &str) -> Result<Self, ValidationError> {
        if param == HOME_ALIAS {
            Ok(Self::home())
        } else {
            Self::parse(param)
        }
    }

    pub fn home() -> Self {
        Self(String::new())
    }

    pub fn is_home(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The form used in URLs and log fields.
    pub fn route_param(&self) -> &str {
        if self.is_home() {
            HOME_ALIAS
        } else {
            &self.0
        }
    }
}

impl TryFrom<String> for Slug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_slug() {
        let slug = Slug::parse("about-us").unwrap();
        assert_eq!(slug.as_str(), "about-us");
        assert!(!slug.is_home());
        assert_eq!(slug.route_param(), "about-us");
    }

    #[test]
    fn empty_slug_is_home() {
        let slug = Slug::parse("").unwrap();
        assert!(slug.is_home());
        assert_eq!(slug.route_param(), HOME_ALIAS);
        assert_eq!(Slug::from_route_param(HOME_ALIAS).unwrap(), slug);
    }

    #[test]
    fn non_latin_lowercase_is_accepted() {
        assert!(Slug::parse("ჩვენს-შესახებ").is_ok());
        assert!(Slug::parse("ka").is_ok());
    }

    #[test]
    fn rejects_malformed_slugs() {
        assert!(Slug::parse("About").is_err());
        assert!(Slug::parse("-about").is_err());
        assert!(Slug::parse("about-").is_err());
        assert!(Slug::parse("about us").is_err());
        assert!(Slug::parse("about/team").is_err());
        assert!(Slug::parse(HOME_ALIAS).is_err());
        assert!(Slug::parse(&"a".repeat(MAX_SLUG_LEN + 1)).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<Slug, _> = serde_json::from_str("\"news\"");
        assert!(ok.is_ok());
        let bad: Result<Slug, _> = serde_json::from_str("\"News Page\"");
        assert!(bad.is_err());
    }
}
