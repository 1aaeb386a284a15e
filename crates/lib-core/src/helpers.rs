use std::hash::BuildHasherDefault;

pub type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<ahash::AHasher>>;
pub type IndexSet<V> = indexmap::IndexSet<V, BuildHasherDefault<ahash::AHasher>>;

pub trait Config: Sized {
    fn config(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }
}

impl<T> Config for T {}

/// Case-insensitive ASCII keyword comparison. SQL keywords are ASCII
/// by construction, so no full Unicode folding is needed.
pub fn keyword_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
