//! Process-wide drag session store.
//!
//! Day columns render independently but must all see one in-flight
//! cross-day drag. The store holds the published [`DragState`] plus the
//! short-lived after-effects of a gesture (snap-back, completion cooldown).
//! Writes go through [`DragSessionWriter`], which only the gesture machine
//! can obtain; everyone else reads snapshots or subscribes.

use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use super::session::DragState;
use super::snap_back::SnapBackAnimation;

/// What readers see: the projection plus a version bumped on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSnapshot {
    pub version: u64,
    pub state: Option<DragState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&DragSnapshot) + Send + Sync>;

#[derive(Default)]
struct StoreInner {
    version: u64,
    state: Option<DragState>,
    snap_back: Option<SnapBackAnimation>,
    completed: Option<(i64, Instant)>,
    next_subscription: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

#[derive(Clone, Default)]
pub struct DragSessionStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl std::fmt::Debug for DragSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("DragSessionStore")
            .field("version", &inner.version)
            .field("state", &inner.state)
            .finish()
    }
}

impl DragSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store shared by every view in this process.
    pub fn global() -> &'static DragSessionStore {
        static GLOBAL: OnceLock<DragSessionStore> = OnceLock::new();
        GLOBAL.get_or_init(DragSessionStore::new)
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> DragSnapshot {
        let inner = self.read();
        DragSnapshot {
            version: inner.version,
            state: inner.state.clone(),
        }
    }

    pub fn current(&self) -> Option<DragState> {
        self.read().state.clone()
    }

    pub fn version(&self) -> u64 {
        self.read().version
    }

    pub fn is_active(&self) -> bool {
        self.read().state.is_some()
    }

    /// Whether `event_id` is the event currently being dragged or resized.
    pub fn is_dragging_event(&self, event_id: i64) -> bool {
        self.read()
            .state
            .as_ref()
            .map_or(false, |state| state.event_id == event_id)
    }

    /// Active snap-back, if one is still running at `now`.
    pub fn snap_back(&self, now: Instant) -> Option<SnapBackAnimation> {
        self.read()
            .snap_back
            .as_ref()
            .filter(|anim| !anim.is_finished(now))
            .cloned()
    }

    /// True for a short while after a gesture on `event_id` finished, so
    /// renderers can swallow the click that follows the release.
    pub fn was_recently_completed(&self, event_id: i64, now: Instant) -> bool {
        self.read()
            .completed
            .map_or(false, |(id, until)| id == event_id && now < until)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&DragSnapshot) + Send + Sync + 'static,
    {
        let mut inner = self.write();
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.write();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    pub(crate) fn writer(&self) -> DragSessionWriter {
        DragSessionWriter {
            store: self.clone(),
        }
    }
}

/// Write access, held by the gesture machine.
#[derive(Debug, Clone)]
pub(crate) struct DragSessionWriter {
    store: DragSessionStore,
}

impl DragSessionWriter {
    pub(crate) fn store(&self) -> &DragSessionStore {
        &self.store
    }

    /// Replace the published projection. Listeners run synchronously,
    /// after the lock is released, so they may read the store.
    pub(crate) fn publish(&self, state: Option<DragState>) {
        let (snapshot, listeners) = {
            let mut inner = self.store.write();
            inner.version += 1;
            inner.state = state;
            if inner.state.is_some() {
                // A new gesture replaces whatever the last one left behind
                inner.snap_back = None;
            }
            let snapshot = DragSnapshot {
                version: inner.version,
                state: inner.state.clone(),
            };
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (snapshot, listeners)
        };

        log::debug!(
            "Drag store v{} -> {:?}",
            snapshot.version,
            snapshot.state.as_ref().map(|s| (s.event_id, s.phase))
        );

        for listener in listeners {
            listener(&snapshot);
        }
    }

    pub(crate) fn start_snap_back(&self, animation: SnapBackAnimation) {
        self.store.write().snap_back = Some(animation);
    }

    pub(crate) fn mark_completed(&self, event_id: i64, now: Instant, cooldown: Duration) {
        self.store.write().completed = Some((event_id, now + cooldown));
    }
}
