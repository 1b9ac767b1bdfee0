use std::hash::Hash;

/// A wrapper around an implementation of a HashMap.
///
/// Repeated runs over the same warehouse snapshot must produce identical
/// output tables, row order included, so we replace std::collections::HashMap
/// with indexmap::IndexMap (insertion ordered) keyed with the fast FxHasher.
/// This is an implementation detail, so it lives behind a newtype.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Map<K: Eq + Hash, V>(indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>);

impl<K: Eq + Hash, V> Default for Map<K, V> {
    fn default() -> Self {
        Self(indexmap::IndexMap::default())
    }
}

impl<K: Eq + Hash, V> std::ops::Deref for Map<K, V> {
    type Target = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K: Eq + Hash, V> std::ops::DerefMut for Map<K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<K: Eq + Hash, V> IntoIterator for Map<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, K: Eq + Hash, V> IntoIterator for &'a Map<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(indexmap::IndexMap::from_iter(iter))
    }
}

impl<K: Eq + Hash, T> Map<K, Vec<T>> {
    /// Group `(key, item)` pairs. Keys keep the order of their first
    /// appearance and items keep their input order within a group.
    pub fn grouped(pairs: impl IntoIterator<Item = (K, T)>) -> Self {
        let mut groups = Self::default();
        for (key, item) in pairs {
            groups.entry(key).or_insert_with(Vec::new).push(item);
        }
        groups
    }
}
