use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::ports::BlobStore;

#[derive(Debug, Default)]
struct Inner {
    blobs: RefCell<HashMap<String, String>>,
    fail_loads: Cell<bool>,
    fail_saves: Cell<bool>,
    saves: Cell<usize>,
}

/// In-memory blob store. Clones share the same contents.
///
/// Loads and saves can be switched to fail, which is how the recovery paths
/// of the log store are exercised.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Rc<Inner>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `text` under `key`.
    #[must_use]
    pub fn with_blob(key: &str, text: &str) -> Self {
        let store = Self::new();
        store
            .inner
            .blobs
            .borrow_mut()
            .insert(key.to_string(), text.to_string());
        store
    }

    /// Make subsequent loads fail (or succeed again).
    pub fn set_fail_loads(&self, fail: bool) {
        self.inner.fail_loads.set(fail);
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.fail_saves.set(fail);
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.inner.saves.get()
    }

    /// Current blob under `key`, bypassing failure injection.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner.blobs.borrow().get(key).cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        if self.inner.fail_loads.get() {
            return Err(Error::load_failed("storage unavailable"));
        }
        Ok(self.peek(key))
    }

    fn save(&self, key: &str, text: &str) -> Result<()> {
        if self.inner.fail_saves.get() {
            return Err(Error::save_failed("storage quota exceeded"));
        }
        self.inner
            .blobs
            .borrow_mut()
            .insert(key.to_string(), text.to_string());
        self.inner.saves.set(self.inner.saves.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_shared_clones() {
        let store = MemoryBlobStore::new();
        let handle = store.clone();

        store.save("k", "v").unwrap();
        assert_eq!(handle.load("k").unwrap().as_deref(), Some("v"));
        assert_eq!(handle.save_count(), 1);
    }

    #[test]
    fn test_failure_injection() {
        let store = MemoryBlobStore::with_blob("k", "v");

        store.set_fail_loads(true);
        assert!(store.load("k").unwrap_err().is_persistence());

        store.set_fail_saves(true);
        assert!(store.save("k", "w").is_err());
        assert_eq!(store.peek("k").as_deref(), Some("v"));
        assert_eq!(store.save_count(), 0);
    }
}
