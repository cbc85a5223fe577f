//! Dotted field paths into the answer tree.
//!
//! `singleArrivalDetails.departureDate` addresses a field of a record section,
//! `multipleRelocationRequests.1.email` addresses a field of the second entry
//! of a list section. The first segment always names a section.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WizardError};

/// One component of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A parsed, concrete path into the answer tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| WizardError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            if part == "*" {
                return Err(invalid("wildcards are only allowed in rule patterns"));
            }
            if part.bytes().all(|b| b.is_ascii_digit()) {
                let index = part
                    .parse::<usize>()
                    .map_err(|_| invalid("list index out of range"))?;
                segments.push(Segment::Index(index));
            } else {
                segments.push(Segment::Key(part.to_string()));
            }
        }

        if !matches!(segments.first(), Some(Segment::Key(_))) {
            return Err(invalid("first segment must name a section"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Name of the top-level section this path lives in.
    pub fn section(&self) -> &str {
        match self.segments.first() {
            Some(Segment::Key(key)) => key,
            _ => unreachable!("parse guarantees a leading key segment"),
        }
    }

    /// Segments below the section.
    pub fn rest(&self) -> &[Segment] {
        &self.segments[1..]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Path of a named child field.
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Self {
            raw: format!("{}.{}", self.raw, key),
            segments,
        }
    }

    /// Path of a list entry.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self {
            raw: format!("{}.{}", self.raw, index),
            segments,
        }
    }

    /// The list paths and indices this path passes through, outermost first:
    /// `people.1.pets.0.name` yields `(people, 1)` and `(people.1.pets, 0)`.
    pub fn list_entries(&self) -> Vec<(FieldPath, usize)> {
        let mut entries = Vec::new();
        for (position, segment) in self.segments.iter().enumerate() {
            if let Segment::Index(index) = segment {
                let segments = self.segments[..position].to_vec();
                let raw = segments
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(".");
                entries.push((FieldPath { raw, segments }, *index));
            }
        }
        entries
    }

    /// True when `self` is `other` or lies below it.
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for FieldPath {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// True when a concrete path matches a rule pattern, where `*` in the
/// pattern stands for any list index.
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_parts = pattern.split('.');
    let mut path_parts = path.split('.');
    loop {
        match (pattern_parts.next(), path_parts.next()) {
            (None, None) => return true,
            (Some("*"), Some(part)) if part.bytes().all(|b| b.is_ascii_digit()) => {}
            (Some(expected), Some(part)) if expected == part => {}
            _ => return false,
        }
    }
}

pub(crate) fn lookup<'a>(mut value: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    for segment in segments {
        value = match (segment, value) {
            (Segment::Key(key), Value::Object(map)) => map.get(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(value)
}

/// Writes `new` at `segments` below `value`. Records and lists are only
/// created where nothing is stored yet; a list grows by at most one entry.
/// The tree is left untouched when the path does not fit its shape.
pub(crate) fn assign(
    value: &mut Value,
    segments: &[Segment],
    new: Value,
) -> std::result::Result<(), &'static str> {
    fits(value, segments)?;
    write(value, segments, new);
    Ok(())
}

fn fits(value: &Value, segments: &[Segment]) -> std::result::Result<(), &'static str> {
    let Some((head, tail)) = segments.split_first() else {
        return Ok(());
    };
    match (head, value) {
        (_, Value::Null) => fits_fresh(segments),
        (Segment::Key(key), Value::Object(map)) => match map.get(key) {
            Some(child) => fits(child, tail),
            None => fits_fresh(tail),
        },
        (Segment::Index(index), Value::Array(items)) => match items.get(*index) {
            Some(child) => fits(child, tail),
            None if *index == items.len() => fits_fresh(tail),
            None => Err("list index is past the end of the list"),
        },
        (Segment::Key(_), Value::Array(_)) => Err("a list entry needs an index"),
        (Segment::Index(_), Value::Object(_)) => Err("a record has no list entries"),
        _ => Err("a plain value has no fields"),
    }
}

/// Below a freshly created container only records and first list entries fit.
fn fits_fresh(segments: &[Segment]) -> std::result::Result<(), &'static str> {
    for segment in segments {
        if matches!(segment, Segment::Index(index) if *index > 0) {
            return Err("list index is past the end of the list");
        }
    }
    Ok(())
}

fn write(value: &mut Value, segments: &[Segment], new: Value) {
    let Some((head, tail)) = segments.split_first() else {
        *value = new;
        return;
    };

    match head {
        Segment::Key(key) => {
            if value.is_null() {
                *value = Value::Object(Map::new());
            }
            if let Value::Object(map) = value {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                write(child, tail, new);
            }
        }
        Segment::Index(index) => {
            if value.is_null() {
                *value = Value::Array(Vec::new());
            }
            if let Value::Array(items) = value {
                if *index == items.len() {
                    items.push(Value::Null);
                }
                if let Some(child) = items.get_mut(*index) {
                    write(child, tail, new);
                }
            }
        }
    }
}

/// Lenient variant of [`assign`] for trees built from scratch, such as the
/// error view: mismatched containers are replaced and lists padded with
/// `null`s. Only call it with indices taken from existing entries.
pub(crate) fn place(value: &mut Value, segments: &[Segment], new: Value) {
    let Some((head, tail)) = segments.split_first() else {
        *value = new;
        return;
    };

    match head {
        Segment::Key(key) => {
            if !value.is_object() {
                *value = Value::Object(Map::new());
            }
            if let Value::Object(map) = value {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                place(child, tail, new);
            }
        }
        Segment::Index(index) => {
            if !value.is_array() {
                *value = Value::Array(Vec::new());
            }
            if let Value::Array(items) = value {
                if items.len() <= *index {
                    items.resize(*index + 1, Value::Null);
                }
                place(&mut items[*index], tail, new);
            }
        }
    }
}

/// Removes the value at `segments`. List entries after a removed index shift down.
pub(crate) fn remove(value: &mut Value, segments: &[Segment]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    let mut parent = value;
    for segment in parents {
        parent = match (segment, parent) {
            (Segment::Key(key), Value::Object(map)) => map.get_mut(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get_mut(*index)?,
            _ => return None,
        };
    }

    match (last, parent) {
        (Segment::Key(key), Value::Object(map)) => map.remove(key),
        (Segment::Index(index), Value::Array(items)) if *index < items.len() => {
            Some(items.remove(*index))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_sections_keys_and_indices() {
        let path = FieldPath::parse("multipleRelocationRequests.1.email").unwrap();
        assert_eq!(path.section(), "multipleRelocationRequests");
        assert_eq!(
            path.rest(),
            &[Segment::Index(1), Segment::Key("email".to_string())]
        );
        assert_eq!(path.to_string(), "multipleRelocationRequests.1.email");
    }

    #[test]
    fn list_entries_name_each_indexed_list() {
        let path = FieldPath::parse("people.1.pets.0.name").unwrap();
        let entries: Vec<(String, usize)> = path
            .list_entries()
            .into_iter()
            .map(|(list, index)| (list.to_string(), index))
            .collect();
        assert_eq!(
            entries,
            vec![("people".to_string(), 1), ("people.1.pets".to_string(), 0)]
        );
        assert!(FieldPath::parse("address.city").unwrap().list_entries().is_empty());
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse("0.name").is_err());
        assert!(FieldPath::parse("list.*.name").is_err());
    }

    #[test]
    fn wildcard_patterns_match_only_indices() {
        assert!(pattern_matches("people.*.email", "people.3.email"));
        assert!(!pattern_matches("people.*.email", "people.x.email"));
        assert!(!pattern_matches("people.*.email", "people.3"));
        assert!(pattern_matches("address.city", "address.city"));
    }

    #[test]
    fn assign_creates_containers_and_keeps_siblings() {
        let mut value = json!({ "street": "1 rue Haute" });
        let path = FieldPath::parse("address.city").unwrap();
        assign(&mut value, path.rest(), json!("Lyon")).unwrap();
        assert_eq!(value, json!({ "street": "1 rue Haute", "city": "Lyon" }));

        let mut list = Value::Null;
        let path = FieldPath::parse("people.0.name").unwrap();
        assign(&mut list, path.rest(), json!("Ana")).unwrap();
        assert_eq!(list, json!([{ "name": "Ana" }]));

        let path = FieldPath::parse("people.1").unwrap();
        assign(&mut list, path.rest(), json!({ "name": "Léo" })).unwrap();
        assert_eq!(list, json!([{ "name": "Ana" }, { "name": "Léo" }]));
    }

    #[test]
    fn assign_refuses_paths_that_do_not_fit_the_tree() {
        let people = json!([{ "email": "a@b.fr" }, { "email": "c@d.fr" }]);
        let mut value = people.clone();
        let keyed = FieldPath::parse("people.email").unwrap();
        assert!(assign(&mut value, keyed.rest(), json!("x@y.fr")).is_err());
        let far = FieldPath::parse("people.4000000000.email").unwrap();
        assert!(assign(&mut value, far.rest(), json!("x@y.fr")).is_err());
        assert_eq!(value, people);

        let record = json!({ "arrivalDate": "2031-05-01" });
        let mut value = record.clone();
        let indexed = FieldPath::parse("dates.0").unwrap();
        assert!(assign(&mut value, indexed.rest(), json!("x")).is_err());
        let nested = FieldPath::parse("dates.arrivalDate.day").unwrap();
        assert!(assign(&mut value, nested.rest(), json!(1)).is_err());
        assert_eq!(value, record);

        let mut fresh = Value::Null;
        let sparse = FieldPath::parse("people.2.name").unwrap();
        assert!(assign(&mut fresh, sparse.rest(), json!("Ana")).is_err());
        assert_eq!(fresh, Value::Null);
    }

    #[test]
    fn place_pads_lists_for_error_trees() {
        let mut tree = json!({});
        let path = FieldPath::parse("people.2.name").unwrap();
        place(&mut tree, path.segments(), json!("required"));
        assert_eq!(tree, json!({ "people": [null, null, { "name": "required" }] }));
    }

    #[test]
    fn remove_shifts_list_entries() {
        let mut value = json!([{ "n": 0 }, { "n": 1 }, { "n": 2 }]);
        let removed = remove(&mut value, &[Segment::Index(1)]);
        assert_eq!(removed, Some(json!({ "n": 1 })));
        assert_eq!(lookup(&value, &[Segment::Index(1)]), Some(&json!({ "n": 2 })));
    }
}
