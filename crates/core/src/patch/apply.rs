use serde_json::{Map, Value};

use super::path::{PathSegment, RootField};
use super::types::SetOperation;
use crate::document::model::ContentDocument;
use crate::document::slug::Slug;
use crate::document::validate::{shape_name, ValidationError};
use crate::schema::same_shape;

/// How far past the end of an array a patch may write. The gap is padded
/// with nulls.
pub const MAX_INDEX_GAP: usize = 256;

/// Set `value` at `segments` below `root`, creating missing intermediate
/// objects. Siblings along the way are left untouched.
///
/// Index segments address array elements; writing past the end pads the
/// array with nulls, up to [`MAX_INDEX_GAP`] slots. On objects an index
/// segment is an ordinary key. When `strict` is set, replacing an existing
/// non-null value with a value of a different JSON shape is refused; new
/// fields are always accepted.
pub fn set_at_path(
    root: &mut Value,
    segments: &[PathSegment],
    value: Value,
    strict: bool,
) -> Result<(), ValidationError> {
    let Some((last, parents)) = segments.split_last() else {
        if strict {
            check_shape(root, &value, "")?;
        }
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        let address = join(&segments[..depth]);
        current = child_or_insert(current, segment, &address)?;
    }

    let parent_address = join(parents);
    let slot = child_or_insert(current, last, &parent_address)?;
    if strict {
        check_shape(slot, &value, &join(segments))?;
    }
    *slot = value;
    Ok(())
}

/// Step into `segment`. A missing slot is inserted as `null` and becomes an
/// object once something is written below it.
fn child_or_insert<'a>(
    current: &'a mut Value,
    segment: &PathSegment,
    address: &str,
) -> Result<&'a mut Value, ValidationError> {
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => Ok(map
            .entry(segment.key().into_owned())
            .or_insert(Value::Null)),
        Value::Array(items) => match segment {
            PathSegment::Index(index) => {
                let index = *index;
                if index >= items.len() {
                    let gap = index - items.len();
                    let len = match index.checked_add(1) {
                        Some(len) if gap <= MAX_INDEX_GAP => len,
                        _ => return Err(index_out_of_reach(address, index, items.len())),
                    };
                    items.resize(len, Value::Null);
                }
                Ok(&mut items[index])
            }
            PathSegment::Key(_) => Err(not_a_container(address, segment, "array")),
        },
        other => Err(not_a_container(address, segment, shape_name(other))),
    }
}

fn check_shape(existing: &Value, incoming: &Value, address: &str) -> Result<(), ValidationError> {
    if same_shape(existing, incoming) {
        Ok(())
    } else {
        Err(ValidationError::ShapeMismatch {
            address: address.to_string(),
            existing: shape_name(existing),
            incoming: shape_name(incoming),
        })
    }
}

fn not_a_container(address: &str, segment: &PathSegment, found: &'static str) -> ValidationError {
    ValidationError::NotAContainer {
        address: address.to_string(),
        segment: segment.to_string(),
        found,
    }
}

fn index_out_of_reach(address: &str, index: usize, len: usize) -> ValidationError {
    let path = if address.is_empty() {
        index.to_string()
    } else {
        format!("{address}.{index}")
    };
    ValidationError::InvalidPath {
        path,
        reason: format!("index is more than {MAX_INDEX_GAP} past the end of an array of {len}"),
    }
}

fn join(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

impl ContentDocument {
    /// Apply a single-field set and return the resulting document.
    ///
    /// `dateUpdated` is stamped first so an explicit patch of `dateUpdated`
    /// wins. The result is re-read through the typed model, so a root field
    /// set to a value of the wrong type is rejected as a validation error.
    pub fn apply_set(&self, op: &SetOperation) -> Result<Self, ValidationError> {
        let mut tree =
            serde_json::to_value(self).map_err(|e| ValidationError::InvalidFieldValue {
                field: op.address.to_string(),
                reason: e.to_string(),
            })?;

        if let Value::Object(root) = &mut tree {
            root.insert(
                RootField::DateUpdated.as_str().to_string(),
                Value::String(op.timestamp.to_rfc3339()),
            );
        }

        set_at_path(
            &mut tree,
            &op.address.full_segments(),
            op.value.clone(),
            op.strict,
        )?;

        if op.address.whole_root_field() == Some(RootField::Slug) {
            let raw = op.value.as_str().ok_or_else(|| ValidationError::InvalidFieldValue {
                field: RootField::Slug.as_str().to_string(),
                reason: format!("expected a string, found {}", shape_name(&op.value)),
            })?;
            Slug::parse(raw)?;
        }

        let member = op.address.target().member_name();
        serde_json::from_value(tree).map_err(|e| ValidationError::InvalidFieldValue {
            field: member.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::NewDocument;
    use crate::patch::path::FieldAddress;
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn about(now: DateTime<Utc>) -> ContentDocument {
        ContentDocument::create(
            NewDocument {
                slug: Slug::parse("about").unwrap(),
                data: json!({
                    "hero": {"title": "Old", "subtitle": "Keep me"},
                    "sections": [{"links": [{"url": "/a"}, {"url": "/b"}, {"url": "/c"}]}],
                }),
                seo: Some(json!({"title": "About"})),
                status: Some(true),
            },
            now,
        )
        .unwrap()
    }

    fn op(path: &str, value: Value, timestamp: DateTime<Utc>) -> SetOperation {
        SetOperation::new(FieldAddress::parse(Some(path)).unwrap(), value, timestamp)
    }

    #[test]
    fn set_creates_missing_objects() {
        let mut tree = json!({"a": {"keep": 1}});
        let segments = FieldAddress::parse(Some("a.b.c")).unwrap().full_segments();
        set_at_path(&mut tree, &segments, json!(true), false).unwrap();
        assert_eq!(tree, json!({"data": {"a": {"b": {"c": true}}}, "a": {"keep": 1}}));
    }

    #[test]
    fn index_past_end_pads_with_null() {
        let mut tree = json!({"items": [1]});
        let segments = vec![PathSegment::Key("items".into()), PathSegment::Index(3)];
        set_at_path(&mut tree, &segments, json!(4), false).unwrap();
        assert_eq!(tree, json!({"items": [1, null, null, 4]}));
    }

    #[test]
    fn index_on_object_is_a_key() {
        let mut tree = json!({"codes": {"1": "a"}});
        let segments = vec![PathSegment::Key("codes".into()), PathSegment::Index(2)];
        set_at_path(&mut tree, &segments, json!("b"), false).unwrap();
        assert_eq!(tree, json!({"codes": {"1": "a", "2": "b"}}));
    }

    #[test]
    fn cannot_descend_into_scalars_or_key_arrays() {
        let mut tree = json!({"title": "x", "list": []});
        let err = set_at_path(
            &mut tree,
            &[PathSegment::Key("title".into()), PathSegment::Key("en".into())],
            json!("y"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::NotAContainer { found: "string", .. }));

        let err = set_at_path(
            &mut tree,
            &[PathSegment::Key("list".into()), PathSegment::Key("en".into())],
            json!("y"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::NotAContainer { found: "array", .. }));
    }

    #[test]
    fn strict_mode_refuses_shape_changes() {
        let mut tree = json!({"count": 3, "title": "x"});
        let err = set_at_path(&mut tree, &[PathSegment::Key("count".into())], json!("3"), true)
            .unwrap_err();
        assert!(matches!(err, ValidationError::ShapeMismatch { .. }));

        set_at_path(&mut tree, &[PathSegment::Key("count".into())], json!(4), true).unwrap();
        set_at_path(&mut tree, &[PathSegment::Key("title".into())], Value::Null, true).unwrap();
        set_at_path(&mut tree, &[PathSegment::Key("fresh".into())], json!([1]), true).unwrap();
        assert_eq!(tree, json!({"count": 4, "title": null, "fresh": [1]}));
    }

    #[test]
    fn strict_mode_accepts_new_scalar_fields() {
        let mut tree = json!({"data": {"title": "x"}});
        let segments = FieldAddress::parse(Some("subtitle")).unwrap().full_segments();
        set_at_path(&mut tree, &segments, json!("new"), true).unwrap();

        let segments = FieldAddress::parse(Some("hero.badge.count")).unwrap().full_segments();
        set_at_path(&mut tree, &segments, json!(2), true).unwrap();

        assert_eq!(
            tree,
            json!({"data": {"title": "x", "subtitle": "new", "hero": {"badge": {"count": 2}}}})
        );
    }

    #[test]
    fn far_indices_are_rejected() {
        let mut tree = json!({"links": [1]});
        for index in [usize::MAX, 4_000_000_000, MAX_INDEX_GAP + 2] {
            let err = set_at_path(
                &mut tree,
                &[PathSegment::Key("links".into()), PathSegment::Index(index)],
                json!(2),
                false,
            )
            .unwrap_err();
            assert!(
                matches!(&err, ValidationError::InvalidPath { path, .. } if *path == format!("links.{index}")),
                "{err:?}"
            );
        }
        assert_eq!(tree, json!({"links": [1]}));

        let reach = MAX_INDEX_GAP + 1;
        set_at_path(
            &mut tree,
            &[PathSegment::Key("links".into()), PathSegment::Index(reach)],
            json!(2),
            false,
        )
        .unwrap();
        assert_eq!(tree["links"].as_array().map(Vec::len), Some(reach + 1));
    }

    #[test]
    fn data_patch_preserves_siblings() {
        let now = Utc::now();
        let doc = about(now);
        let later = now + Duration::seconds(1);
        let patched = doc.apply_set(&op("hero.title", json!("New"), later)).unwrap();

        assert_eq!(patched.data["hero"]["title"], "New");
        assert_eq!(patched.data["hero"]["subtitle"], "Keep me");
        assert_eq!(patched.data["sections"], doc.data["sections"]);
        assert_eq!(patched.seo, doc.seo);
        assert_eq!(patched.slug, doc.slug);
        assert_eq!(patched.date_updated, later);
        assert_eq!(patched.date_created, doc.date_created);
        assert!(!patched.data.contains_key("data"));
    }

    #[test]
    fn bracket_and_dot_paths_store_the_same_result() {
        let now = Utc::now();
        let doc = about(now);
        let bracket = doc
            .apply_set(&op("sections[0].links[2].url", json!("/z"), now))
            .unwrap();
        let dotted = doc
            .apply_set(&op("sections.0.links.2.url", json!("/z"), now))
            .unwrap();
        assert_eq!(bracket, dotted);
        assert_eq!(bracket.data["sections"][0]["links"][2]["url"], "/z");
        assert_eq!(bracket.data["sections"][0]["links"][1]["url"], "/b");
    }

    #[test]
    fn reserved_fields_are_set_at_the_root() {
        let now = Utc::now();
        let doc = about(now);

        let unpublished = doc.apply_set(&op("status", json!(false), now)).unwrap();
        assert!(!unpublished.status);
        assert!(!unpublished.data.contains_key("status"));
        assert_eq!(unpublished.data, doc.data);

        let seo = doc.apply_set(&op("seo.description", json!("Who we are"), now)).unwrap();
        assert_eq!(seo.seo["description"], "Who we are");
        assert_eq!(seo.seo["title"], "About");
        assert!(!seo.data.contains_key("seo"));
    }

    #[test]
    fn root_fields_keep_their_types() {
        let now = Utc::now();
        let doc = about(now);
        assert!(matches!(
            doc.apply_set(&op("status", json!("yes"), now)),
            Err(ValidationError::InvalidFieldValue { .. })
        ));
        assert!(matches!(
            doc.apply_set(&op("seo", json!("flat"), now)),
            Err(ValidationError::InvalidFieldValue { .. })
        ));
        assert!(matches!(
            doc.apply_set(&op("status.flag", json!(true), now)),
            Err(ValidationError::NotAContainer { .. })
        ));
        assert!(matches!(
            doc.apply_set(&op("slug", json!("Not A Slug"), now)),
            Err(ValidationError::InvalidSlug { .. })
        ));
        assert!(matches!(
            doc.apply_set(&op("slug", json!(7), now)),
            Err(ValidationError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn slug_changes_only_through_slug_path() {
        let now = Utc::now();
        let doc = about(now);
        let renamed = doc.apply_set(&op("slug", json!("about-us"), now)).unwrap();
        assert_eq!(renamed.slug.as_str(), "about-us");

        let nested = doc.apply_set(&op("hero.slug", json!("other"), now)).unwrap();
        assert_eq!(nested.slug.as_str(), "about");
        assert_eq!(nested.data["hero"]["slug"], "other");
    }

    #[test]
    fn explicit_date_updated_wins_over_stamp() {
        let now = Utc::now();
        let doc = about(now);
        let chosen = "2024-01-02T03:04:05Z";
        let patched = doc
            .apply_set(&op("dateUpdated", json!(chosen), now + Duration::hours(1)))
            .unwrap();
        assert_eq!(patched.date_updated.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn deleted_at_accepts_null_and_timestamps() {
        let now = Utc::now();
        let doc = about(now);
        let deleted = doc
            .apply_set(&op("deletedAt", json!(now.to_rfc3339()), now))
            .unwrap();
        assert_eq!(deleted.deleted_at, Some(now));
        let restored = deleted.apply_set(&op("deletedAt", Value::Null, now)).unwrap();
        assert_eq!(restored.deleted_at, None);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let now = Utc::now();
        let doc = about(now);
        let set = op("sections[0].links[1].url", json!("/same"), now);
        let once = doc.apply_set(&set).unwrap();
        let twice = once.apply_set(&set).unwrap();
        assert_eq!(once, twice);
    }
}
