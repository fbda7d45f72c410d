//! Patch path parsing.
//!
//! A caller-supplied path such as `sections.links[2].url` is normalized to
//! dot form, split into segments and resolved against the document layout:
//! the first segment either names a reserved root field (`seo`, `status`,
//! `deletedAt`, `slug`, `dateUpdated`, `dateCreated`) or the address is
//! rooted under `data`.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::validate::ValidationError;

/// Top-level member holding the content tree.
pub const DATA_ROOT: &str = "data";

static BRACKET_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("bracket index pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RootField {
    Seo,
    Status,
    DeletedAt,
    Slug,
    DateUpdated,
    DateCreated,
}

impl RootField {
    pub const ALL: [RootField; 6] = [
        RootField::Seo,
        RootField::Status,
        RootField::DeletedAt,
        RootField::Slug,
        RootField::DateUpdated,
        RootField::DateCreated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RootField::Seo => "seo",
            RootField::Status => "status",
            RootField::DeletedAt => "deletedAt",
            RootField::Slug => "slug",
            RootField::DateUpdated => "dateUpdated",
            RootField::DateCreated => "dateCreated",
        }
    }

    /// Exact, case-sensitive match against the reserved names.
    pub fn from_name(name: &str) -> Option<Self> {
        RootField::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    Key(String),
    /// All-digit segment. Indexes arrays; on objects it is an ordinary key.
    Index(usize),
}

impl PathSegment {
    fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse::<usize>() {
                // Leading zeros would not survive a round trip through usize.
                if index.to_string() == raw {
                    return PathSegment::Index(index);
                }
            }
        }
        PathSegment::Key(raw.to_string())
    }

    /// The segment as an object key.
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Key(key) => Cow::Borrowed(key),
            PathSegment::Index(index) => Cow::Owned(index.to_string()),
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Which top-level member of the document an address starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "field")]
pub enum PatchTarget {
    Root(RootField),
    Data,
}

impl PatchTarget {
    pub fn member_name(&self) -> &'static str {
        match self {
            PatchTarget::Root(field) => field.as_str(),
            PatchTarget::Data => DATA_ROOT,
        }
    }
}

/// A fully resolved field address inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldAddress {
    target: PatchTarget,
    segments: Vec<PathSegment>,
}

impl FieldAddress {
    /// Parse a caller-supplied path. `None` is a missing path.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        let raw = raw.ok_or(ValidationError::MissingPath)?;
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyPath);
        }

        let normalized = normalize_brackets(raw);
        let mut parts = Vec::new();
        for part in normalized.split('.') {
            if part.is_empty() {
                return Err(invalid(raw, "empty segment"));
            }
            if part.starts_with('$') {
                return Err(invalid(raw, "segments cannot start with '$'"));
            }
            if part.contains(['[', ']']) {
                return Err(invalid(raw, "malformed array index"));
            }
            parts.push(part);
        }

        let (target, rest) = match parts[0] {
            DATA_ROOT if parts.len() == 1 => return Err(ValidationError::BareDataPath),
            DATA_ROOT => (PatchTarget::Data, &parts[1..]),
            first => match RootField::from_name(first) {
                Some(field) => (PatchTarget::Root(field), &parts[1..]),
                None => (PatchTarget::Data, &parts[..]),
            },
        };

        Ok(Self {
            target,
            segments: rest.iter().map(|p| PathSegment::parse(p)).collect(),
        })
    }

    pub fn root(field: RootField) -> Self {
        Self {
            target: PatchTarget::Root(field),
            segments: Vec::new(),
        }
    }

    pub fn target(&self) -> PatchTarget {
        self.target
    }

    /// Segments below the target member.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root_addressed(&self) -> bool {
        matches!(self.target, PatchTarget::Root(_))
    }

    /// The reserved root field this address replaces outright, if any.
    pub fn whole_root_field(&self) -> Option<RootField> {
        match self.target {
            PatchTarget::Root(field) if self.segments.is_empty() => Some(field),
            _ => None,
        }
    }

    /// Segments from the document root, including the target member.
    pub fn full_segments(&self) -> Vec<PathSegment> {
        let mut out = Vec::with_capacity(self.segments.len() + 1);
        out.push(PathSegment::Key(self.target.member_name().to_string()));
        out.extend(self.segments.iter().cloned());
        out
    }
}

impl Display for FieldAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.target.member_name())?;
        for segment in &self.segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// Rewrite every `[N]` as `.N`.
pub fn normalize_brackets(path: &str) -> Cow<'_, str> {
    BRACKET_INDEX.replace_all(path, ".$1")
}

fn invalid(path: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
