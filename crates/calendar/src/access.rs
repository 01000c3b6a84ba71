//! Calendar access gate and the capability it hands out.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::{error, info};

use crate::error::{CalendarError, Result};
use crate::store::CalendarStore;

struct GateInner<C> {
    store: Mutex<C>,
    granted: OnceCell<bool>,
}

/// Owns a calendar store and decides, once, whether it may be used.
///
/// Every read or write of the store goes through the gate's mutex, so
/// concurrent scheduling and removal calls against one store serialize.
pub struct CalendarGate<C: CalendarStore> {
    inner: Arc<GateInner<C>>,
}

impl<C: CalendarStore> Clone for CalendarGate<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CalendarStore> CalendarGate<C> {
    /// Wrap a store. Access is not requested until [`CalendarGate::authorize`].
    pub fn new(store: C) -> Self {
        Self {
            inner: Arc::new(GateInner {
                store: Mutex::new(store),
                granted: OnceCell::new(),
            }),
        }
    }

    /// Request access (only on first call) and return the capability.
    ///
    /// A store error while requesting counts as a denial.
    pub async fn authorize(&self) -> CalendarAccess<C> {
        let granted = *self
            .inner
            .granted
            .get_or_init(|| async {
                let mut store = self.inner.store.lock().await;
                match store.request_access().await {
                    Ok(granted) => {
                        info!(granted, "calendar access requested");
                        granted
                    }
                    Err(e) => {
                        error!(error = %e, "calendar access request failed");
                        false
                    }
                }
            })
            .await;

        CalendarAccess {
            inner: Arc::clone(&self.inner),
            granted,
        }
    }
}

/// Capability to use a calendar store, obtained from [`CalendarGate::authorize`].
pub struct CalendarAccess<C: CalendarStore> {
    inner: Arc<GateInner<C>>,
    granted: bool,
}

impl<C: CalendarStore> Clone for CalendarAccess<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            granted: self.granted,
        }
    }
}

impl<C: CalendarStore> std::fmt::Debug for CalendarAccess<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarAccess")
            .field("granted", &self.granted)
            .finish()
    }
}

impl<C: CalendarStore> CalendarAccess<C> {
    /// Whether access was granted.
    pub fn is_granted(&self) -> bool {
        self.granted
    }

    /// Fail with `PermissionDenied` unless granted.
    pub fn ensure_granted(&self) -> Result<()> {
        if self.granted {
            Ok(())
        } else {
            Err(CalendarError::PermissionDenied)
        }
    }

    /// Exclusive use of the store, checked against the grant first.
    pub async fn store(&self) -> Result<MutexGuard<'_, C>> {
        self.ensure_granted()?;
        Ok(self.inner.store.lock().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryCalendarStore;

    #[tokio::test]
    async fn test_access_requested_once() {
        let gate = CalendarGate::new(InMemoryCalendarStore::granted());

        let first = gate.authorize().await;
        let second = gate.clone().authorize().await;
        assert!(first.is_granted());
        assert!(second.is_granted());

        let store = first.store().await.unwrap();
        assert_eq!(store.access_requests(), 1);
    }

    #[tokio::test]
    async fn test_denied_access_blocks_store() {
        let gate = CalendarGate::new(InMemoryCalendarStore::denied());
        let access = gate.authorize().await;

        assert!(!access.is_granted());
        assert!(matches!(access.ensure_granted(), Err(CalendarError::PermissionDenied)));
        assert!(matches!(access.store().await, Err(CalendarError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_concurrent_users_serialize() {
        let gate = CalendarGate::new(InMemoryCalendarStore::granted());
        let access = gate.authorize().await;

        let guard = access.store().await.unwrap();
        let other = access.clone();
        let waiter = tokio::spawn(async move { other.store().await.map(|s| s.events().len()) });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        drop(guard);
        assert_eq!(waiter.await.unwrap().unwrap(), 0);
    }
}
