//! Declared field schema for content trees.
//!
//! The admin panel renders one editor per field. Instead of guessing the
//! editor from each value at render time, the backend describes the content
//! as a tagged [`FieldSchema`] which the panel consumes as-is. Schemas are
//! inferred from existing content using key-name and file-extension
//! conventions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const IMAGE_KEY_HINTS: &[&str] = &[
    "image", "img", "logo", "icon", "photo", "banner", "background", "avatar", "thumbnail",
];
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];
const PDF_KEY_HINTS: &[&str] = &["pdf", "document", "attachment"];
const LONG_TEXT_KEY_HINTS: &[&str] = &["description", "content", "body", "text", "html"];
const LONG_TEXT_MIN_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldSchema {
    Text,
    LongText,
    Number,
    Boolean,
    ImageRef,
    PdfRef,
    /// Repeatable list; `items` is absent for an empty list.
    List {
        #[serde(skip_serializing_if = "Option::is_none")]
        items: Option<Box<FieldSchema>>,
    },
    Nested {
        fields: BTreeMap<String, FieldSchema>,
    },
}

impl FieldSchema {
    /// Infer the schema of a whole content object.
    pub fn infer_object(map: &Map<String, Value>) -> Self {
        FieldSchema::Nested {
            fields: map
                .iter()
                .map(|(key, value)| (key.clone(), Self::infer(key, value)))
                .collect(),
        }
    }

    /// Infer the schema of one field from its key and current value.
    pub fn infer(key: &str, value: &Value) -> Self {
        match value {
            Value::Array(items) => FieldSchema::List {
                items: items.first().map(|first| Box::new(Self::infer(key, first))),
            },
            Value::Object(map) => Self::infer_object(map),
            Value::Bool(_) => FieldSchema::Boolean,
            Value::Number(_) => FieldSchema::Number,
            Value::String(s) => infer_string(key, s),
            Value::Null => FieldSchema::Text,
        }
    }
}

fn infer_string(key: &str, value: &str) -> FieldSchema {
    let key = key.to_lowercase();
    let lower = value.to_lowercase();

    if IMAGE_KEY_HINTS.iter().any(|hint| key.contains(hint))
        || IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    {
        FieldSchema::ImageRef
    } else if PDF_KEY_HINTS.iter().any(|hint| key.contains(hint)) || lower.ends_with(".pdf") {
        FieldSchema::PdfRef
    } else if LONG_TEXT_KEY_HINTS.iter().any(|hint| key.contains(hint))
        || value.contains('\n')
        || value.chars().count() > LONG_TEXT_MIN_LEN
    {
        FieldSchema::LongText
    } else {
        FieldSchema::Text
    }
}

/// Whether `incoming` keeps the JSON shape of `existing`. Nulls on either
/// side are compatible with everything.
pub fn same_shape(existing: &Value, incoming: &Value) -> bool {
    matches!(
        (existing, incoming),
        (Value::Null, _)
            | (_, Value::Null)
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn infers_scalar_kinds() {
        assert_eq!(FieldSchema::infer("visible", &json!(true)), FieldSchema::Boolean);
        assert_eq!(FieldSchema::infer("order", &json!(3)), FieldSchema::Number);
        assert_eq!(FieldSchema::infer("title", &json!("Hello")), FieldSchema::Text);
        assert_eq!(FieldSchema::infer("title", &Value::Null), FieldSchema::Text);
    }

    #[test]
    fn infers_media_from_key_or_extension() {
        assert_eq!(FieldSchema::infer("logo", &json!("")), FieldSchema::ImageRef);
        assert_eq!(FieldSchema::infer("heroImage", &json!("x")), FieldSchema::ImageRef);
        assert_eq!(FieldSchema::infer("src", &json!("/u/a.JPG")), FieldSchema::ImageRef);
        assert_eq!(FieldSchema::infer("charter", &json!("/u/c.pdf")), FieldSchema::PdfRef);
        assert_eq!(FieldSchema::infer("pdfUrl", &json!("")), FieldSchema::PdfRef);
        assert_eq!(FieldSchema::infer("icon", &json!("")), FieldSchema::ImageRef);
    }

    #[test]
    fn infers_long_text() {
        assert_eq!(FieldSchema::infer("description", &json!("a")), FieldSchema::LongText);
        assert_eq!(FieldSchema::infer("note", &json!("a\nb")), FieldSchema::LongText);
        assert_eq!(
            FieldSchema::infer("note", &json!("x".repeat(LONG_TEXT_MIN_LEN + 1))),
            FieldSchema::LongText
        );
    }

    #[test]
    fn infers_nested_lists() {
        let data = json!({
            "hero": {"title": "Hi", "background": "/bg.webp"},
            "links": [{"label": "Home", "url": "/"}],
            "tags": [],
        });
        let schema = FieldSchema::infer_object(data.as_object().unwrap());

        let serialized = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            serialized,
            json!({
                "kind": "nested",
                "fields": {
                    "hero": {
                        "kind": "nested",
                        "fields": {
                            "background": {"kind": "imageRef"},
                            "title": {"kind": "text"},
                        }
                    },
                    "links": {
                        "kind": "list",
                        "items": {
                            "kind": "nested",
                            "fields": {
                                "label": {"kind": "text"},
                                "url": {"kind": "text"},
                            }
                        }
                    },
                    "tags": {"kind": "list"},
                }
            })
        );
    }

    #[test]
    fn shape_compatibility() {
        assert!(same_shape(&json!(1), &json!(2.5)));
        assert!(same_shape(&json!("a"), &Value::Null));
        assert!(same_shape(&Value::Null, &json!({})));
        assert!(!same_shape(&json!("1"), &json!(1)));
        assert!(!same_shape(&json!([]), &json!({})));
    }
}
