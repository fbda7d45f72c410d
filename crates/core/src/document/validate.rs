/// Document and patch validation errors.
///
/// Everything here is rejected before or instead of a store write and maps to
/// a 400-class response at the API boundary.
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("patch path is required")]
    MissingPath,
    #[error("patch path cannot be empty")]
    EmptyPath,
    #[error("invalid patch path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("path 'data' would replace the whole content tree; use a full update instead")]
    BareDataPath,
    #[error("invalid slug '{slug}': {reason}")]
    InvalidSlug { slug: String, reason: String },
    #[error("document data must be a JSON object")]
    DataNotObject,
    #[error("document seo must be a JSON object")]
    SeoNotObject,
    #[error("invalid value for '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },
    #[error("cannot address '{segment}' inside a {found} at '{address}'")]
    NotAContainer {
        address: String,
        segment: String,
        found: &'static str,
    },
    #[error("'{address}' holds a {existing}, refusing to store a {incoming}")]
    ShapeMismatch {
        address: String,
        existing: &'static str,
        incoming: &'static str,
    },
}

/// Human-readable name of a JSON value's shape, used in error messages.
pub fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate the optional `seo` member of a create or update body.
pub fn validate_seo(seo: Option<&Value>) -> Result<(), ValidationError> {
    match seo {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(ValidationError::SeoNotObject),
    }
}

/// Validate the `data` member of a create or update body.
pub fn validate_data(data: &Value) -> Result<(), ValidationError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(ValidationError::DataNotObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_must_be_object() {
        assert!(validate_data(&json!({"hero": {}})).is_ok());
        assert_eq!(validate_data(&json!([1, 2])), Err(ValidationError::DataNotObject));
        assert_eq!(validate_data(&json!(null)), Err(ValidationError::DataNotObject));
    }

    #[test]
    fn seo_is_optional_object() {
        assert!(validate_seo(None).is_ok());
        assert!(validate_seo(Some(&json!({"title": "About"}))).is_ok());
        assert_eq!(
            validate_seo(Some(&json!("About"))),
            Err(ValidationError::SeoNotObject)
        );
    }
}
