use std::collections::HashMap;

use futures_util::future::AbortHandle;

/// Abort handles of in-flight chat calls for one panel.
#[derive(Default)]
pub(super) struct RequestRegistry {
    handles: HashMap<String, AbortHandle>,
    current: Option<String>,
}

impl RequestRegistry {
    /// Register a new call as current, returning the one it displaces.
    pub(super) fn insert_current(
        &mut self,
        request_id: String,
        handle: AbortHandle,
    ) -> Option<(String, AbortHandle)> {
        let previous = self.take_current();
        self.handles.insert(request_id.clone(), handle);
        self.current = Some(request_id);
        previous
    }

    pub(super) fn take_current(&mut self) -> Option<(String, AbortHandle)> {
        let request_id = self.current.take()?;
        let handle = self.handles.remove(&request_id)?;
        Some((request_id, handle))
    }

    /// Drop a settled call. Clears `current` if it pointed at it.
    pub(super) fn remove(&mut self, request_id: &str) -> Option<AbortHandle> {
        if self.current.as_deref() == Some(request_id) {
            self.current = None;
        }
        self.handles.remove(request_id)
    }

    pub(super) fn drain(&mut self) -> Vec<(String, AbortHandle)> {
        self.current = None;
        self.handles.drain().collect()
    }

    #[cfg(test)]
    pub(super) fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub(super) fn len(&self) -> usize {
        self.handles.len()
    }
}
