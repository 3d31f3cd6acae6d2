use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

/// Holds a value that is loaded on first use and shared afterwards.
///
/// The lock is held across the load, so callers racing on an empty slot
/// wait for the first load instead of starting their own. A failed load
/// leaves the slot empty and the next caller tries again.
pub struct ModelSlot<T> {
    inner: Mutex<Option<Arc<T>>>,
}

impl<T> ModelSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    pub fn get_or_try_load<F>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut slot = self
            .inner
            .lock()
            .map_err(|_| anyhow!("Failed to acquire model lock"))?;

        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(load()?);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

impl<T> Default for ModelSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
