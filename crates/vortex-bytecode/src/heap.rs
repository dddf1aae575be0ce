//! Heap object arena
//!
//! All heap-allocated runtime objects (currently only strings) live in an
//! append-only arena owned by the [`Program`](crate::Program). Values never
//! own heap objects; they carry an [`ObjectRef`], a plain index into the
//! arena. Objects are never freed before the program itself is dropped, so
//! a ref handed out by the arena stays valid for the program's lifetime.

/// Non-owning handle to an object in a program's heap arena
///
/// An `ObjectRef` is only meaningful for the arena that created it. It must
/// not be used with any other program's heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(u32);

impl ObjectRef {
    /// Arena slot index of the referenced object
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A heap-allocated runtime object
///
/// A closed variant set over object kinds; accessors return `None` for
/// mismatched kinds instead of any form of runtime type inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    /// Owned UTF-8 string contents
    Str(String),
}

impl HeapObject {
    /// String contents, if this object is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeapObject::Str(s) => Some(s),
        }
    }
}

/// Append-only arena of heap objects
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new string object and return a handle to it
    ///
    /// Does not deduplicate: two allocations of equal text produce two
    /// distinct objects.
    pub fn alloc_str(&mut self, contents: impl Into<String>) -> ObjectRef {
        let index = self.objects.len() as u32;
        self.objects.push(HeapObject::Str(contents.into()));
        ObjectRef(index)
    }

    /// Look up the object behind a handle
    ///
    /// The handle must come from this arena (see [`ObjectRef`]).
    #[inline]
    pub fn get(&self, obj: ObjectRef) -> &HeapObject {
        &self.objects[obj.index()]
    }

    /// String contents behind a handle, if the object is a string
    #[inline]
    pub fn str_contents(&self, obj: ObjectRef) -> Option<&str> {
        self.get(obj).as_str()
    }

    /// Number of objects allocated so far
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_read_back() {
        let mut heap = Heap::new();
        let r = heap.alloc_str("hello");
        assert_eq!(heap.str_contents(r), Some("hello"));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_no_deduplication() {
        let mut heap = Heap::new();
        let a = heap.alloc_str("same");
        let b = heap.alloc_str("same");
        assert_ne!(a, b);
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_refs_stay_valid_across_allocations() {
        let mut heap = Heap::new();
        let first = heap.alloc_str("first");
        for i in 0..100 {
            heap.alloc_str(format!("filler-{}", i));
        }
        assert_eq!(heap.str_contents(first), Some("first"));
    }
}
