//! Attribute bag carried by graphs, nodes, and edges.
//!
//! # Overview
//!
//! A [`Metadata`] holds two things: string-valued `properties` and
//! `keyed_tags` — sets of tag strings grouped under a tag key, where the
//! empty key `""` is the unkeyed bucket and always exists. All keys and tag
//! values compare case-insensitively.
//!
//! Metadata is best-effort annotation: none of its operations fail, and the
//! JSON projection silently skips malformed values so a single bad tag never
//! loses the rest of a graph file.

use serde_json::{Map, Value};

use crate::keys::{KeyMap, KeySet, KeySetMap};

/// JSON field name for the unkeyed tag array.
const TAGS_FIELD: &str = "tags";
/// JSON field name for the keyed-tag object.
const KEYTAGS_FIELD: &str = "keytags";

/// The key of the unkeyed tag bucket.
pub const UNKEYED: &str = "";

/// String properties plus keyed tag sets.
#[derive(Debug, Clone)]
pub struct Metadata {
    properties: KeyMap<String>,
    keyed_tags: KeySetMap,
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Metadata {
    /// Create an empty bag. The unkeyed tag set exists from the start.
    #[must_use]
    pub fn new() -> Self {
        let mut keyed_tags = KeySetMap::new();
        keyed_tags.entry_or_insert_with(UNKEYED, KeySet::new);
        Self {
            properties: KeyMap::new(),
            keyed_tags,
        }
    }

    // ── properties ──────────────────────────────────────────────────────────

    /// Set a property, or remove it when `value` is `None`.
    pub fn set_property(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(v) => {
                self.properties.insert(key, v.to_string());
            }
            None => {
                self.properties.remove(key);
            }
        }
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k, v.as_str()))
    }

    // ── tags ────────────────────────────────────────────────────────────────

    /// The mutable tag set under `key`, created empty on first access.
    pub fn tags_mut(&mut self, key: &str) -> &mut KeySet {
        self.keyed_tags.entry_or_insert_with(key, KeySet::new)
    }

    /// The tag set under `key`, but only if it exists and is non-empty.
    /// Empty sets read as absent.
    #[must_use]
    pub fn try_tags(&self, key: &str) -> Option<&KeySet> {
        self.keyed_tags.get(key).filter(|set| !set.is_empty())
    }

    /// `true` when the set under `key` shares at least one tag with `tags`.
    #[must_use]
    pub fn has_any_tag<I>(&self, key: &str, tags: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let Some(set) = self.try_tags(key) else {
            return false;
        };
        tags.into_iter().any(|tag| set.contains(tag.as_ref()))
    }

    /// All tag keys with a non-empty set, plus the unkeyed bucket.
    pub fn tag_keys(&self) -> impl Iterator<Item = &str> {
        self.keyed_tags
            .iter()
            .filter(|(key, set)| *key == UNKEYED || !set.is_empty())
            .map(|(key, _)| key)
    }

    /// Copy data from another bag. Properties are overwritten by the
    /// source's; tag sets are unioned per key.
    pub fn import(&mut self, source: &Metadata, tags: bool, properties: bool) {
        if properties {
            for (key, value) in source.properties.iter() {
                self.properties.insert(key, value.clone());
            }
        }
        if tags {
            self.keyed_tags.union_with(&source.keyed_tags);
        }
    }

    /// `true` when the bag carries nothing observable (no properties, no
    /// non-empty tag sets).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.keyed_tags.values().all(KeySet::is_empty)
    }

    // ── JSON projection ─────────────────────────────────────────────────────

    /// Project into a JSON object: properties become sibling string fields,
    /// unkeyed tags a `tags` array (only when non-empty), keyed tags a
    /// `keytags` object whose values collapse to a single string for
    /// one-element sets. Empty sets are omitted.
    pub fn add_to_object(&self, object: &mut Map<String, Value>) {
        for (key, value) in self.properties.iter() {
            object.insert(key.to_string(), Value::String(value.to_string()));
        }

        if let Some(unkeyed) = self.try_tags(UNKEYED) {
            let tags: Vec<Value> = unkeyed
                .iter()
                .map(|t| Value::String(t.to_string()))
                .collect();
            object.insert(TAGS_FIELD.to_string(), Value::Array(tags));
        }

        let mut keytags = Map::new();
        for (key, set) in self.keyed_tags.iter() {
            if key == UNKEYED || set.is_empty() {
                continue;
            }
            let value = if set.len() == 1 {
                Value::String(set.iter().next().unwrap_or_default().to_string())
            } else {
                Value::Array(set.iter().map(|t| Value::String(t.to_string())).collect())
            };
            keytags.insert(key.to_string(), value);
        }
        if !keytags.is_empty() {
            object.insert(KEYTAGS_FIELD.to_string(), Value::Object(keytags));
        }
    }

    /// Fill from a JSON object. Fields named in `reserved` (and the `tags` /
    /// `keytags` fields themselves) are never treated as properties;
    /// non-string scalar values and malformed tag entries are silently
    /// skipped.
    pub fn fill_from_object(&mut self, object: &Map<String, Value>, reserved: &[&str]) {
        for (field, value) in object {
            if field == TAGS_FIELD || field == KEYTAGS_FIELD {
                continue;
            }
            if reserved.iter().any(|r| r.eq_ignore_ascii_case(field)) {
                continue;
            }
            if let Value::String(s) = value {
                self.properties.insert(field.as_str(), s.clone());
            }
        }

        if let Some(Value::Array(tags)) = object.get(TAGS_FIELD) {
            let unkeyed = self.tags_mut(UNKEYED);
            for tag in tags {
                if let Value::String(s) = tag {
                    unkeyed.insert(s.as_str());
                }
            }
        }

        if let Some(Value::Object(keytags)) = object.get(KEYTAGS_FIELD) {
            for (key, value) in keytags {
                match value {
                    Value::String(s) => {
                        self.tags_mut(key).insert(s.as_str());
                    }
                    Value::Array(entries) => {
                        let set = self.tags_mut(key);
                        for entry in entries {
                            if let Value::String(s) = entry {
                                set.insert(s.as_str());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Equality ignores empty tag sets, which read as absent everywhere else.
impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        if self.properties != other.properties {
            return false;
        }
        let non_empty = |m: &Metadata| -> KeySetMap {
            m.keyed_tags
                .iter()
                .filter(|(_, set)| !set.is_empty())
                .map(|(k, set)| (k, set.clone()))
                .collect()
        };
        non_empty(self) == non_empty(other)
    }
}

impl Eq for Metadata {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn set_property_none_removes() {
        let mut md = Metadata::new();
        md.set_property("Module", Some("m1"));
        assert_eq!(md.property("module"), Some("m1"));

        md.set_property("MODULE", None);
        assert_eq!(md.property("module"), None);
    }

    #[test]
    fn tags_mut_creates_on_first_read() {
        let mut md = Metadata::new();
        assert!(md.try_tags("layer").is_none());
        md.tags_mut("layer").insert("ui");
        assert!(md.try_tags("LAYER").is_some());
    }

    #[test]
    fn try_tags_treats_empty_as_absent() {
        let mut md = Metadata::new();
        md.tags_mut("empty");
        assert!(md.try_tags("empty").is_none());
        assert!(md.try_tags(UNKEYED).is_none());
    }

    #[test]
    fn has_any_tag_matches_case_insensitively() {
        let mut md = Metadata::new();
        md.tags_mut(UNKEYED).insert("Seed");
        assert!(md.has_any_tag(UNKEYED, ["SEED", "other"]));
        assert!(!md.has_any_tag(UNKEYED, ["other"]));
        assert!(!md.has_any_tag("missing", ["seed"]));
    }

    #[test]
    fn import_overwrites_properties_and_unions_tags() {
        let mut target = Metadata::new();
        target.set_property("kept", Some("old"));
        target.set_property("shared", Some("old"));
        target.tags_mut("k").insert("t1");

        let mut source = Metadata::new();
        source.set_property("shared", Some("new"));
        source.tags_mut("K").insert("t2");

        target.import(&source, true, true);
        assert_eq!(target.property("kept"), Some("old"));
        assert_eq!(target.property("shared"), Some("new"));
        let tags = target.try_tags("k").expect("tags");
        assert!(tags.contains("t1") && tags.contains("t2"));
    }

    #[test]
    fn import_can_select_tags_only() {
        let mut target = Metadata::new();
        let mut source = Metadata::new();
        source.set_property("p", Some("v"));
        source.tags_mut(UNKEYED).insert("t");

        target.import(&source, true, false);
        assert_eq!(target.property("p"), None);
        assert!(md_has_unkeyed(&target, "t"));
    }

    fn md_has_unkeyed(md: &Metadata, tag: &str) -> bool {
        md.try_tags(UNKEYED).is_some_and(|set| set.contains(tag))
    }

    #[test]
    fn add_to_object_writes_properties_tags_and_keytags() {
        let mut md = Metadata::new();
        md.set_property("module", Some("m1"));
        md.tags_mut(UNKEYED).insert("seed");
        md.tags_mut("color").insert("red");
        md.tags_mut("refs").insert("a");
        md.tags_mut("refs").insert("b");
        md.tags_mut("empty");

        let mut object = Map::new();
        md.add_to_object(&mut object);
        let value = Value::Object(object);

        assert_eq!(value["module"], json!("m1"));
        assert_eq!(value["tags"], json!(["seed"]));
        // Single-element set collapses to a string, larger sets stay arrays.
        assert_eq!(value["keytags"]["color"], json!("red"));
        assert_eq!(value["keytags"]["refs"], json!(["a", "b"]));
        assert!(value["keytags"].get("empty").is_none());
    }

    #[test]
    fn add_to_object_omits_empty_sections() {
        let md = Metadata::new();
        let mut object = Map::new();
        md.add_to_object(&mut object);
        assert!(object.is_empty());
    }

    #[test]
    fn fill_from_object_reads_all_sections() {
        let object = as_object(json!({
            "module": "m1",
            "tags": ["seed", "Seed"],
            "keytags": { "color": "red", "refs": ["a", "b"] },
        }));

        let mut md = Metadata::new();
        md.fill_from_object(&object, &[]);

        assert_eq!(md.property("module"), Some("m1"));
        assert_eq!(md.try_tags(UNKEYED).expect("unkeyed").len(), 1);
        assert_eq!(md.try_tags("color").expect("color").len(), 1);
        assert_eq!(md.try_tags("refs").expect("refs").len(), 2);
    }

    #[test]
    fn fill_from_object_skips_reserved_and_non_strings() {
        let object = as_object(json!({
            "nodes": "not-a-property",
            "count": 3,
            "flag": true,
            "real": "yes",
        }));

        let mut md = Metadata::new();
        md.fill_from_object(&object, &["nodes"]);

        assert_eq!(md.property("nodes"), None);
        assert_eq!(md.property("count"), None);
        assert_eq!(md.property("flag"), None);
        assert_eq!(md.property("real"), Some("yes"));
    }

    #[test]
    fn fill_from_object_skips_malformed_tags_quietly() {
        let object = as_object(json!({
            "tags": ["good", 7, null],
            "keytags": { "k": ["ok", {}], "bad": 12 },
        }));

        let mut md = Metadata::new();
        md.fill_from_object(&object, &[]);

        assert!(md_has_unkeyed(&md, "good"));
        assert_eq!(md.try_tags(UNKEYED).expect("unkeyed").len(), 1);
        assert_eq!(md.try_tags("k").expect("k").len(), 1);
        assert!(md.try_tags("bad").is_none());
    }

    #[test]
    fn equality_ignores_empty_tag_sets() {
        let mut a = Metadata::new();
        a.tags_mut("scratch");
        let b = Metadata::new();
        assert_eq!(a, b);
    }

    #[test]
    fn round_trip_through_object() {
        let mut md = Metadata::new();
        md.set_property("a", Some("1"));
        md.tags_mut(UNKEYED).insert("t");
        md.tags_mut("k").insert("v1");
        md.tags_mut("k").insert("v2");

        let mut object = Map::new();
        md.add_to_object(&mut object);
        let mut back = Metadata::new();
        back.fill_from_object(&object, &[]);

        assert_eq!(md, back);
    }
}
