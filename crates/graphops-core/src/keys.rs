//! Case-insensitive string containers used throughout the graph model.
//!
//! # Overview
//!
//! Graph node keys, metadata property keys, tag keys, and tag values all
//! compare case-insensitively. Rather than scattering `to_lowercase()` calls
//! through every lookup, the fold happens once at insertion time: a [`Key`]
//! keeps the original spelling for display and a folded form for ordering,
//! equality, and hashing. [`KeySet`] and [`KeyMap`] are thin wrappers over
//! B-tree collections of [`Key`]s, which makes every iteration come out in
//! the ascending case-insensitive order the serializer and the DOT emitter
//! are required to produce.
//!
//! [`MapView`] exposes a `KeyMap<KeySet>` as a read-only mapping and carries
//! the projection operators the analyses are built from, including
//! `not_in_self_projection`, the operator behind edge purification.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A string key that preserves its original spelling but compares, orders,
/// and hashes case-insensitively.
///
/// When two spellings of the same key meet (`"Core"` vs `"core"`), the first
/// one inserted wins; later insertions are treated as duplicates.
#[derive(Debug, Clone)]
pub struct Key {
    raw: String,
    folded: String,
}

impl Key {
    /// Wrap a string, computing its case fold once.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let folded = raw.to_lowercase();
        Self { raw, folded }
    }

    /// The original spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The canonical folded form used for comparison.
    #[must_use]
    pub fn folded(&self) -> &str {
        &self.folded
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

/// Lookups borrow the folded form, so `BTreeMap<Key, _>` can be probed with
/// a pre-folded `&str` without building a `Key`.
impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.folded
    }
}

impl From<&str> for Key {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Key {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&String> for Key {
    fn from(raw: &String) -> Self {
        Self::new(raw.clone())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ---------------------------------------------------------------------------
// KeySet
// ---------------------------------------------------------------------------

/// A deduplicated, case-insensitive string set with the standard set algebra.
///
/// Iteration yields original spellings in ascending case-insensitive order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    inner: BTreeSet<Key>,
}

impl KeySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Returns `false` when an equal (case-insensitive)
    /// value was already present; the existing spelling is kept.
    pub fn insert(&mut self, value: impl Into<Key>) -> bool {
        self.inner.insert(value.into())
    }

    /// Remove a value by any spelling. Returns `true` if it was present.
    pub fn remove(&mut self, value: &str) -> bool {
        self.inner.remove(value.to_lowercase().as_str())
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.inner.contains(value.to_lowercase().as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Original spellings in ascending case-insensitive order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(Key::as_str)
    }

    /// The first value in iteration order, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.inner.first().map(Key::as_str)
    }

    /// In-place union with another set.
    pub fn union_with(&mut self, other: &KeySet) {
        for key in &other.inner {
            self.inner.insert(key.clone());
        }
    }

    #[must_use]
    pub fn intersection(&self, other: &KeySet) -> KeySet {
        Self {
            inner: self.inner.intersection(&other.inner).cloned().collect(),
        }
    }

    /// Elements of `self` not in `other`.
    #[must_use]
    pub fn difference(&self, other: &KeySet) -> KeySet {
        Self {
            inner: self.inner.difference(&other.inner).cloned().collect(),
        }
    }

    #[must_use]
    pub fn symmetric_difference(&self, other: &KeySet) -> KeySet {
        Self {
            inner: self
                .inner
                .symmetric_difference(&other.inner)
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn is_subset(&self, other: &KeySet) -> bool {
        self.inner.is_subset(&other.inner)
    }

    #[must_use]
    pub fn is_superset(&self, other: &KeySet) -> bool {
        self.inner.is_superset(&other.inner)
    }

    /// `true` when the two sets share at least one element.
    #[must_use]
    pub fn overlaps(&self, other: &KeySet) -> bool {
        // Probe the smaller set against the larger.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.inner.iter().any(|k| large.inner.contains(k))
    }

    /// Keep only values the predicate accepts (called with the raw spelling).
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.inner.retain(|k| keep(k.as_str()));
    }
}

impl<T: Into<Key>> FromIterator<T> for KeySet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T: Into<Key>> Extend<T> for KeySet {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a str;
    type IntoIter =
        std::iter::Map<std::collections::btree_set::Iter<'a, Key>, fn(&'a Key) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(Key::as_str as fn(&'a Key) -> &'a str)
    }
}

// ---------------------------------------------------------------------------
// KeyMap
// ---------------------------------------------------------------------------

/// A case-insensitive map from string keys to `V`.
///
/// Iteration yields entries in ascending case-insensitive key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap<V> {
    inner: BTreeMap<Key, V>,
}

impl<V> Default for KeyMap<V> {
    fn default() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }
}

impl<V> KeyMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing any value stored under an equal key.
    pub fn insert(&mut self, key: impl Into<Key>, value: V) -> Option<V> {
        self.inner.insert(key.into(), value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.inner.get(key.to_lowercase().as_str())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.inner.get_mut(key.to_lowercase().as_str())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key.to_lowercase().as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.inner.remove(key.to_lowercase().as_str())
    }

    /// Get the value for `key`, inserting one from `make` first if absent.
    pub fn entry_or_insert_with(&mut self, key: impl Into<Key>, make: impl FnOnce() -> V) -> &mut V {
        self.inner.entry(key.into()).or_insert_with(make)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut V)> {
        self.inner.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in their original spelling, ascending case-insensitive order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(Key::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.inner.values_mut()
    }

    /// Keep only entries the predicate accepts.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut V) -> bool) {
        self.inner.retain(|k, v| keep(k.as_str(), v));
    }

    /// The key set of this map.
    #[must_use]
    pub fn key_set(&self) -> KeySet {
        self.keys().collect()
    }
}

impl<K: Into<Key>, V> FromIterator<(K, V)> for KeyMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// KeySetMap
// ---------------------------------------------------------------------------

/// A case-insensitive map from keys to [`KeySet`]s, the adjacency shape.
pub type KeySetMap = KeyMap<KeySet>;

impl KeyMap<KeySet> {
    /// Insert `value` into the set at `key`, creating the set if needed.
    /// Returns `false` when the pair was already present.
    pub fn add_pair(&mut self, key: impl Into<Key>, value: impl Into<Key>) -> bool {
        self.entry_or_insert_with(key, KeySet::new).insert(value)
    }

    /// Remove `value` from the set at `key`. With `prune`, an entry left (or
    /// found) empty is dropped, even when `value` was not present.
    /// Returns `true` if the pair existed.
    pub fn remove_pair(&mut self, key: &str, value: &str, prune: bool) -> bool {
        let Some(set) = self.get_mut(key) else {
            return false;
        };
        let removed = set.remove(value);
        if prune && set.is_empty() {
            self.remove(key);
        }
        removed
    }

    /// Deep union: for every entry of `other`, union its set into the set
    /// stored here under the same key.
    pub fn union_with(&mut self, other: &KeySetMap) {
        for (key, set) in other.iter() {
            self.entry_or_insert_with(key, KeySet::new).union_with(set);
        }
    }

    /// Total number of (key, value) pairs across all sets.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.values().map(KeySet::len).sum()
    }
}

// ---------------------------------------------------------------------------
// MapView
// ---------------------------------------------------------------------------

/// A read-only view over a [`KeySetMap`], exposing the owned sets as
/// immutable and carrying the projection operators the analyses use.
#[derive(Debug, Clone, Copy)]
pub struct MapView<'a> {
    map: &'a KeySetMap,
}

impl<'a> MapView<'a> {
    #[must_use]
    pub fn new(map: &'a KeySetMap) -> Self {
        Self { map }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a KeySet> {
        self.map.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.map.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a KeySet)> {
        self.map.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Union of the images of each seed key. Seeds with no image are ignored.
    #[must_use]
    pub fn project<I>(&self, seeds: I) -> KeySet
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut out = KeySet::new();
        for seed in seeds {
            self.project_into(seed.as_ref(), &mut out);
        }
        out
    }

    /// Accumulate the image of one seed into an existing set.
    pub fn project_into(&self, seed: &str, target: &mut KeySet) {
        if let Some(image) = self.map.get(seed) {
            target.union_with(image);
        }
    }

    /// Map each `(key, seeds)` entry to `(key, project(seeds))`.
    #[must_use]
    pub fn project_map(&self, seeds: &KeySetMap) -> KeySetMap {
        let mut out = KeySetMap::new();
        for (key, seed_set) in seeds.iter() {
            out.insert(key, self.project(seed_set));
        }
        out
    }

    /// The subset of `keys` that does not appear in the union of the seeds'
    /// images. The union is never materialized: each candidate is tested
    /// against the individual images.
    #[must_use]
    pub fn not_in_projection(&self, keys: &KeySet, seeds: &KeySet) -> KeySet {
        keys.iter()
            .filter(|candidate| {
                !seeds.iter().any(|seed| {
                    self.map
                        .get(seed)
                        .is_some_and(|image| image.contains(candidate))
                })
            })
            .collect()
    }

    /// [`Self::not_in_projection`] with `keys` doubling as the seeds: the
    /// members of `keys` not reachable through any member's image.
    #[must_use]
    pub fn not_in_self_projection(&self, keys: &KeySet) -> KeySet {
        self.not_in_projection(keys, keys)
    }

    /// Apply [`Self::not_in_self_projection`] to every entry of `seeds`.
    ///
    /// Over a reachability view this is the transitive-reduction operator:
    /// feed it the direct-successor map and each entry keeps only the
    /// successors not already covered by another successor's reach.
    #[must_use]
    pub fn not_in_self_projection_map(&self, seeds: &KeySetMap) -> KeySetMap {
        let mut out = KeySetMap::new();
        for (key, seed_set) in seeds.iter() {
            out.insert(key, self.not_in_self_projection(seed_set));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> KeySet {
        values.iter().copied().collect()
    }

    // ── Key ─────────────────────────────────────────────────────────────────

    #[test]
    fn key_compares_case_insensitively() {
        assert_eq!(Key::new("Alpha"), Key::new("ALPHA"));
        assert!(Key::new("alpha") < Key::new("Beta"));
        assert_eq!(Key::new("Alpha").as_str(), "Alpha");
    }

    // ── KeySet ──────────────────────────────────────────────────────────────

    #[test]
    fn keyset_dedupes_case_insensitively_first_spelling_wins() {
        let mut s = KeySet::new();
        assert!(s.insert("Core"));
        assert!(!s.insert("CORE"));
        assert_eq!(s.len(), 1);
        assert!(s.contains("core"));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec!["Core"]);
    }

    #[test]
    fn keyset_iterates_in_case_insensitive_order() {
        let s = set(&["beta", "Alpha", "GAMMA"]);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec!["Alpha", "beta", "GAMMA"]);
    }

    #[test]
    fn keyset_algebra() {
        let a = set(&["a", "b", "c"]);
        let b = set(&["B", "c", "d"]);

        assert_eq!(a.intersection(&b), set(&["b", "c"]));
        assert_eq!(a.difference(&b), set(&["a"]));
        assert_eq!(a.symmetric_difference(&b), set(&["a", "d"]));
        assert!(set(&["b"]).is_subset(&a));
        assert!(a.is_superset(&set(&["A", "C"])));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&set(&["x", "y"])));
    }

    #[test]
    fn keyset_union_with_and_remove() {
        let mut a = set(&["a"]);
        a.union_with(&set(&["A", "b"]));
        assert_eq!(a.len(), 2);
        assert!(a.remove("B"));
        assert!(!a.remove("missing"));
        assert_eq!(a, set(&["a"]));
    }

    #[test]
    fn keyset_equality_ignores_case() {
        assert_eq!(set(&["One", "two"]), set(&["ONE", "Two"]));
    }

    // ── KeyMap ──────────────────────────────────────────────────────────────

    #[test]
    fn keymap_lookup_ignores_case() {
        let mut m: KeyMap<u32> = KeyMap::new();
        m.insert("Alpha", 1);
        assert_eq!(m.get("ALPHA"), Some(&1));
        assert_eq!(m.insert("alpha", 2), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.remove("AlPhA"), Some(2));
        assert!(m.is_empty());
    }

    #[test]
    fn keymap_iterates_sorted() {
        let m: KeyMap<u32> = [("b", 2), ("A", 1), ("c", 3)].into_iter().collect();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["A", "b", "c"]);
    }

    // ── KeySetMap ───────────────────────────────────────────────────────────

    #[test]
    fn keysetmap_add_and_remove_pairs() {
        let mut m = KeySetMap::new();
        assert!(m.add_pair("k", "v1"));
        assert!(m.add_pair("K", "v2"));
        assert!(!m.add_pair("k", "V1"));
        assert_eq!(m.pair_count(), 2);

        assert!(m.remove_pair("k", "v1", false));
        assert!(!m.remove_pair("k", "v1", false));
        assert_eq!(m.pair_count(), 1);
    }

    #[test]
    fn keysetmap_remove_pair_prunes_empty_entry() {
        let mut m = KeySetMap::new();
        m.add_pair("k", "v");
        m.remove_pair("k", "v", true);
        assert!(!m.contains_key("k"));
    }

    #[test]
    fn keysetmap_prune_applies_even_when_value_absent() {
        let mut m = KeySetMap::new();
        m.entry_or_insert_with("k", KeySet::new);
        assert!(!m.remove_pair("k", "never-there", true));
        assert!(!m.contains_key("k"));
    }

    #[test]
    fn keysetmap_union_with_is_deep() {
        let mut a = KeySetMap::new();
        a.add_pair("k", "v1");
        let mut b = KeySetMap::new();
        b.add_pair("K", "v2");
        b.add_pair("other", "x");

        a.union_with(&b);
        assert_eq!(a.get("k").unwrap(), &set(&["v1", "v2"]));
        assert_eq!(a.pair_count(), 3);
    }

    // ── MapView ─────────────────────────────────────────────────────────────

    fn reach_fixture() -> KeySetMap {
        // a -> {b, c}, b -> {c}, d -> {}
        let mut m = KeySetMap::new();
        m.insert("a", set(&["b", "c"]));
        m.insert("b", set(&["c"]));
        m.insert("d", KeySet::new());
        m
    }

    #[test]
    fn project_unions_images_and_ignores_missing_seeds() {
        let m = reach_fixture();
        let view = MapView::new(&m);
        assert_eq!(view.project(["a", "b", "ghost"]), set(&["b", "c"]));
        assert_eq!(view.project(["d"]), KeySet::new());
    }

    #[test]
    fn project_into_accumulates() {
        let m = reach_fixture();
        let view = MapView::new(&m);
        let mut acc = set(&["z"]);
        view.project_into("b", &mut acc);
        assert_eq!(acc, set(&["c", "z"]));
    }

    #[test]
    fn project_map_maps_entrywise() {
        let m = reach_fixture();
        let view = MapView::new(&m);
        let mut seeds = KeySetMap::new();
        seeds.insert("x", set(&["a"]));
        seeds.insert("y", set(&["b", "d"]));

        let projected = view.project_map(&seeds);
        assert_eq!(projected.get("x").unwrap(), &set(&["b", "c"]));
        assert_eq!(projected.get("y").unwrap(), &set(&["c"]));
    }

    #[test]
    fn not_in_projection_drops_covered_keys() {
        let m = reach_fixture();
        let view = MapView::new(&m);
        // b and c are covered by a's image; a and d are not.
        let keys = set(&["a", "b", "c", "d"]);
        assert_eq!(view.not_in_projection(&keys, &set(&["a"])), set(&["a", "d"]));
    }

    #[test]
    fn not_in_self_projection_is_the_reduction_operator() {
        let m = reach_fixture();
        let view = MapView::new(&m);
        // Direct successors {b, c}: c is inside b's image, so only b survives.
        assert_eq!(view.not_in_self_projection(&set(&["b", "c"])), set(&["b"]));
    }

    #[test]
    fn not_in_self_projection_map_applies_per_entry() {
        let m = reach_fixture();
        let view = MapView::new(&m);
        let mut seeds = KeySetMap::new();
        seeds.insert("s", set(&["b", "c"]));
        seeds.insert("t", set(&["c", "d"]));

        let reduced = view.not_in_self_projection_map(&seeds);
        assert_eq!(reduced.get("s").unwrap(), &set(&["b"]));
        assert_eq!(reduced.get("t").unwrap(), &set(&["c", "d"]));
    }
}
