//! Outstanding permission requests

use permission_core::{Callback, PermissionStatus, RequestId};
use smallvec::SmallVec;

/// Callbacks waiting for the next manager notification, keyed by request
///
/// Almost always holds zero or one waiter.
#[derive(Default)]
pub struct PendingRequests {
    waiters: SmallVec<[(RequestId, Callback); 1]>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: RequestId, callback: Callback) {
        self.waiters.push((id, callback));
    }

    /// Remove one waiter without resolving it
    pub fn remove(&mut self, id: RequestId) -> Option<Callback> {
        let index = self.waiters.iter().position(|(waiter, _)| *waiter == id)?;
        Some(self.waiters.remove(index).1)
    }

    /// Take every waiter, oldest first
    pub fn take_all(&mut self) -> Vec<(RequestId, Callback)> {
        self.waiters.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

impl std::fmt::Debug for PendingRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.waiters.iter().map(|(id, _)| id))
            .finish()
    }
}

/// Resolve drained waiters, in order
pub fn resolve_all(waiters: Vec<(RequestId, Callback)>, status: PermissionStatus) {
    for (id, callback) in waiters {
        tracing::debug!("Resolving permission request {} with {}", id, status);
        callback(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_remove_specific_waiter() {
        let mut pending = PendingRequests::new();
        let first = RequestId::new();
        let second = RequestId::new();
        pending.insert(first, Box::new(|_| {}));
        pending.insert(second, Box::new(|_| {}));

        assert!(pending.remove(first).is_some());
        assert!(pending.remove(first).is_none());
        assert_eq!(pending.len(), 1);
        assert!(pending.remove(second).is_some());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_resolve_all_in_insertion_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pending = PendingRequests::new();

        for tag in 0..3 {
            let seen = seen.clone();
            pending.insert(
                RequestId::new(),
                Box::new(move |status| seen.lock().unwrap().push((tag, status))),
            );
        }

        resolve_all(pending.take_all(), PermissionStatus::Denied);

        assert!(pending.is_empty());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (0, PermissionStatus::Denied),
                (1, PermissionStatus::Denied),
                (2, PermissionStatus::Denied),
            ]
        );
    }
}
