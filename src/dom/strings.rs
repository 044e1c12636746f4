//! String Interning Pool
//!
//! Document-wide storage for element names, attribute names, attribute
//! values, text content and namespace URIs. Identical byte strings share one
//! entry, so two names are the same name exactly when their ids are equal.
//!
//! Uses hash-based lookup to avoid storing duplicate string data.
//! Growth is fallible: running out of memory is reported, not aborted on.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::error::{reserve_one, ConvertError, Result};

/// String id. 0 is reserved for the empty string.
pub type StrId = u32;

/// Location of an interned string in the pool buffer
#[derive(Debug, Clone, Copy)]
struct StringEntry {
    offset: u32,
    len: u32,
}

/// String interning pool
///
/// Memory layout:
/// - `entries`: (offset, len) for each interned string ID
/// - `data`: one contiguous buffer holding every distinct string once
/// - `hash_index`: hash -> list of IDs (handles rare collisions)
#[derive(Debug, Clone)]
pub struct StringPool {
    /// Entries indexed by string ID
    entries: Vec<StringEntry>,
    /// Buffer for string bytes
    data: Vec<u8>,
    /// Hash of string content -> list of IDs with that hash
    hash_index: HashMap<u64, Vec<StrId>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(256),
            data: Vec::with_capacity(4096),
            hash_index: HashMap::new(),
        };
        // Entry 0 is reserved for the empty string
        pool.entries.push(StringEntry { offset: 0, len: 0 });
        pool
    }

    /// Compute hash of byte slice
    #[inline]
    fn compute_hash(s: &[u8]) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Look up an already interned string without inserting it
    pub fn lookup(&self, s: &[u8]) -> Option<StrId> {
        if s.is_empty() {
            return Some(0);
        }
        let ids = self.hash_index.get(&Self::compute_hash(s))?;
        ids.iter().copied().find(|&id| self.get(id) == Some(s))
    }

    /// Intern a string, returning the id of its single stored copy
    pub fn intern(&mut self, s: &[u8]) -> Result<StrId> {
        if s.is_empty() {
            return Ok(0);
        }

        let hash = Self::compute_hash(s);

        // Check for existing entry with same content
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == Some(s) {
                    return Ok(id);
                }
            }
        }

        let (Ok(offset), Ok(len), Ok(id)) = (
            u32::try_from(self.data.len()),
            u32::try_from(s.len()),
            u32::try_from(self.entries.len()),
        ) else {
            return Err(ConvertError::OutOfMemory(crate::site!("String pool exhausted")));
        };

        self.data
            .try_reserve(s.len())
            .map_err(|_| ConvertError::OutOfMemory(crate::site!("Out of memory interning string")))?;
        reserve_one(&mut self.entries, crate::site!("Out of memory interning string"))?;
        self.hash_index
            .try_reserve(1)
            .map_err(|_| ConvertError::OutOfMemory(crate::site!("Out of memory interning string")))?;

        self.data.extend_from_slice(s);
        self.entries.push(StringEntry { offset, len });
        self.hash_index.entry(hash).or_default().push(id);

        Ok(id)
    }

    /// Get a string by ID
    pub fn get(&self, id: StrId) -> Option<&[u8]> {
        if id == 0 {
            return Some(b"");
        }
        let entry = self.entries.get(id as usize)?;
        let start = entry.offset as usize;
        let end = start + entry.len as usize;
        self.data.get(start..end)
    }

    /// Get a string by ID as UTF-8 str
    pub fn get_str(&self, id: StrId) -> Option<&str> {
        self.get(id).and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Get the number of unique strings stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1 // Entry 0 is reserved
    }

    /// Get total bytes used for string storage
    pub fn bytes_used(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern() {
        let mut pool = StringPool::new();
        let id = pool.intern(b"hello").unwrap();
        assert!(id > 0);
        assert_eq!(pool.get(id), Some(b"hello" as &[u8]));
    }

    #[test]
    fn test_intern_duplicate() {
        let mut pool = StringPool::new();
        let id1 = pool.intern(b"hello").unwrap();
        let id2 = pool.intern(b"hello").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(pool.bytes_used(), 5);
    }

    #[test]
    fn test_intern_different() {
        let mut pool = StringPool::new();
        let id1 = pool.intern(b"hello").unwrap();
        let id2 = pool.intern(b"world").unwrap();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_empty_string() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(b"").unwrap(), 0);
        assert_eq!(pool.get(0), Some(b"" as &[u8]));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_lookup_does_not_insert() {
        let mut pool = StringPool::new();
        assert_eq!(pool.lookup(b"lang"), None);
        let id = pool.intern(b"lang").unwrap();
        assert_eq!(pool.lookup(b"lang"), Some(id));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_get_str() {
        let mut pool = StringPool::new();
        let id = pool.intern(b"hello").unwrap();
        assert_eq!(pool.get_str(id), Some("hello"));
        assert_eq!(pool.get_str(999), None);
    }

    #[test]
    fn test_out_of_memory_reported() {
        let mut pool = StringPool::new();
        let _armed = crate::error::failpoint::arm(0);
        assert!(matches!(pool.intern(b"x"), Err(ConvertError::OutOfMemory(_))));
    }
}
