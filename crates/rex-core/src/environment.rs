//! Named objects shared with action handlers.
//!
//! Handlers receive `&mut Network`, so anything they need beyond the matched
//! token (counters, output buffers, clients) is attached here by name and
//! downcast on access.

use std::any::Any;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct SharedObjects {
    objects: BTreeMap<String, Box<dyn Any>>,
}

impl std::fmt::Debug for SharedObjects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedObjects").field("names", &self.objects.keys().collect::<Vec<_>>()).finish()
    }
}

impl SharedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an object, replacing any previous object of the same name
    pub fn insert<T: Any>(&mut self, name: impl Into<String>, value: T) -> Option<Box<dyn Any>> {
        self.objects.insert(name.into(), Box::new(value))
    }

    /// Typed access; `None` when the name is unknown or holds another type
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.objects.get(name).and_then(|object| object.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.objects.get_mut(name).and_then(|object| object.downcast_mut::<T>())
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Any>> {
        self.objects.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Attached names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
