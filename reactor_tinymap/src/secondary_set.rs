use crate::{Key, TinySecondaryMap};

/// A sparse set of `K`, built on [`TinySecondaryMap`].
#[derive(Debug, Clone, Default)]
pub struct TinySecondarySet<K: Key> {
    inner: TinySecondaryMap<K, ()>,
}

impl<K: Key> TinySecondarySet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: TinySecondaryMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: K) -> bool {
        self.inner.insert(key, ()).is_none()
    }

    pub fn remove(&mut self, key: K) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn contains(&self, key: K) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner = TinySecondaryMap::new();
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.inner.keys(),
        }
    }
}

pub struct Iter<'a, K: Key> {
    inner: Box<dyn Iterator<Item = K> + 'a>,
}

impl<'a, K: Key> Iterator for Iter<'a, K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<K: Key> FromIterator<K> for TinySecondarySet<K> {
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}
