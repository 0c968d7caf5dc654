//! The mutation engine.
//!
//! A [`Store`] owns the current [`PageState`] and is the only place new
//! snapshots are produced. Handles are cheap clones sharing one inner
//! state, following a read-write lock pattern: many concurrent readers
//! (snapshots) while each transition takes the write lock for a full-value
//! replacement. Every transition publishes the new snapshot to all
//! subscribers in emission order.
//!
//! ```text
//! command ──→ Store ──→ PageState snapshot ──→ subscribers
//!    ↑                                             │
//!    └─────────────────────────────────────────────┘
//! ```

mod calls;
mod subscription;

pub use calls::{slot_call, PageCallOptions, SlotCall, SlotCallOptions};
pub use subscription::Subscription;

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use crate::failure::Failure;
use crate::page::{PageChanges, PageState, PageStatus, StateData};
use crate::slot::{SlotPayload, SlotState};

/// Clonable handle to one page's state and operation surface.
pub struct Store<D: StateData> {
    inner: Arc<StoreInner<D>>,
}

struct StoreInner<D: StateData> {
    state: RwLock<PageState<D>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<PageState<D>>>>,
    disposed: AtomicBool,
}

impl<D: StateData> Clone for Store<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: StateData> Store<D> {
    /// Create a store seeded with the caller's initial data.
    pub fn new(data: D) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(PageState::initial(data)),
                subscribers: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// A clone of the current state.
    pub fn snapshot(&self) -> PageState<D> {
        self.inner.state.read().clone()
    }

    /// Subscribe to every snapshot emitted after this call, in emission
    /// order. The subscription ends when the store is disposed.
    pub fn subscribe(&self) -> Subscription<D> {
        let (tx, rx) = mpsc::unbounded_channel();
        // The disposed flag is checked under the subscribers lock; dispose
        // sets it under the same lock, so a sender can never slip into a
        // disposed store and leave its receiver waiting forever.
        let mut subscribers = self.inner.subscribers.lock();
        if !self.is_disposed() {
            subscribers.push(tx);
        }
        Subscription::new(rx)
    }

    /// Stop emitting. Pending completions from in-flight calls are dropped
    /// silently; subscribers see end-of-stream after draining.
    pub fn dispose(&self) {
        let mut subscribers = self.inner.subscribers.lock();
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            tracing::debug!("store disposed");
            subscribers.clear();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Replace the state with `f(current)` and publish the new snapshot.
    ///
    /// No-op after dispose. Returns the snapshot that was published.
    ///
    /// The subscribers lock is held across both the commit and the sends:
    /// concurrent emitters through cloned handles would otherwise race
    /// between releasing the state lock and sending, delivering snapshots
    /// out of commit order.
    pub(crate) fn apply(
        &self,
        f: impl FnOnce(&PageState<D>) -> PageState<D>,
    ) -> Option<PageState<D>> {
        let mut subscribers = self.inner.subscribers.lock();
        if self.is_disposed() {
            tracing::debug!("state emission after dispose dropped");
            return None;
        }
        let snapshot = {
            let mut guard = self.inner.state.write();
            let next = f(&guard);
            *guard = next;
            guard.clone()
        };
        // Closed receivers are pruned as a side effect of the send.
        subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        Some(snapshot)
    }

    // --- page-level transitions -------------------------------------------

    pub fn emit_page_loading(&self) {
        tracing::debug!(status = ?PageStatus::Loading, "page transition");
        self.apply(|s| {
            s.copy_with(PageChanges {
                status: Some(PageStatus::Loading),
                clear_error: true,
                clear_message: true,
                ..PageChanges::default()
            })
        });
    }

    pub fn emit_page_refreshing(&self) {
        tracing::debug!(status = ?PageStatus::Refreshing, "page transition");
        self.apply(|s| {
            s.copy_with(PageChanges {
                status: Some(PageStatus::Refreshing),
                clear_error: true,
                clear_message: true,
                ..PageChanges::default()
            })
        });
    }

    /// Success clears any page error; the message is set when supplied and
    /// cleared otherwise, so a stale message never survives the transition.
    pub fn emit_page_success(&self, message: Option<String>) {
        tracing::debug!(status = ?PageStatus::Success, "page transition");
        let clear_message = message.is_none();
        self.apply(move |s| {
            s.copy_with(PageChanges {
                status: Some(PageStatus::Success),
                clear_error: true,
                message,
                clear_message,
                ..PageChanges::default()
            })
        });
    }

    pub fn emit_page_error(&self, failure: Failure) {
        tracing::debug!(status = ?PageStatus::Error, kind = %failure.kind, "page transition");
        self.apply(move |s| {
            s.copy_with(PageChanges {
                status: Some(PageStatus::Error),
                error: Some(failure),
                clear_message: true,
                ..PageChanges::default()
            })
        });
    }

    /// Back to `Initial` with error and message cleared; `data` and `slots`
    /// are untouched.
    pub fn reset_page(&self) {
        tracing::debug!("page reset");
        self.apply(|s| {
            s.copy_with(PageChanges {
                status: Some(PageStatus::Initial),
                clear_error: true,
                clear_message: true,
                ..PageChanges::default()
            })
        });
    }

    // --- slot-level transitions -------------------------------------------

    pub fn emit_slot_loading(&self, key: &str) {
        tracing::debug!(slot = %key, "slot loading");
        self.apply(|s| s.update_slot(key, SlotState::loading()));
    }

    pub fn emit_slot_success<T: Any + Send + Sync>(&self, key: &str, payload: T) {
        self.emit_slot_success_payload(key, Arc::new(payload));
    }

    pub fn emit_slot_success_payload(&self, key: &str, payload: SlotPayload) {
        tracing::debug!(slot = %key, "slot success");
        self.apply(move |s| s.update_slot(key, SlotState::success_payload(payload)));
    }

    pub fn emit_slot_error(&self, key: &str, failure: Failure) {
        tracing::debug!(slot = %key, kind = %failure.kind, "slot error");
        self.apply(move |s| s.update_slot(key, SlotState::error(failure)));
    }

    /// Put an explicit `Initial` entry back for `key`. The key stays
    /// present, distinguishing "explicitly reset" from "never loaded"
    /// (compare [`Store::remove_slot`], which deletes the key).
    pub fn reset_slot(&self, key: &str) {
        tracing::debug!(slot = %key, "slot reset");
        self.apply(|s| s.update_slot(key, SlotState::initial()));
    }

    /// Delete `key` from the slot map entirely. An absent key is a no-op
    /// and emits no snapshot.
    pub fn remove_slot(&self, key: &str) {
        if !self.inner.state.read().slots.contains_key(key) {
            return;
        }
        tracing::debug!(slot = %key, "slot removed");
        self.apply(|s| s.remove_slot(key));
    }

    pub fn clear_slots(&self) {
        tracing::debug!("slots cleared");
        self.apply(|s| s.clear_slots());
    }

    // --- data operations --------------------------------------------------

    /// Replace the data payload with `f(current)`.
    pub fn update_data(&self, f: impl FnOnce(&D) -> D) {
        self.apply(|s| s.copy_with(PageChanges::data(f(&s.data))));
    }

    /// Return the data payload to its caller-defined initial value.
    pub fn reset_data(&self) {
        self.apply(|s| s.copy_with(PageChanges::data(s.data.reset())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Doc {
        title: String,
    }

    impl StateData for Doc {
        fn reset(&self) -> Self {
            Self::default()
        }
    }

    #[test]
    fn transitions_follow_page_lifecycle() {
        let store = Store::new(Doc::default());
        assert!(store.snapshot().is_initial());

        store.emit_page_loading();
        assert!(store.snapshot().is_loading());

        store.emit_page_success(Some("loaded".into()));
        let state = store.snapshot();
        assert!(state.is_success());
        assert_eq!(state.message.as_deref(), Some("loaded"));

        store.emit_page_refreshing();
        assert!(store.snapshot().is_refreshing());

        store.emit_page_error(Failure::server("boom"));
        let state = store.snapshot();
        assert!(state.is_error());
        assert_eq!(state.error, Some(Failure::server("boom")));
        assert!(state.message.is_none());
    }

    #[test]
    fn loading_clears_previous_error_and_message() {
        let store = Store::new(Doc::default());
        store.emit_page_error(Failure::server("boom"));
        store.emit_page_loading();
        let state = store.snapshot();
        assert!(state.error.is_none());
        assert!(state.message.is_none());
    }

    #[test]
    fn success_without_message_clears_stale_message() {
        let store = Store::new(Doc::default());
        store.emit_page_success(Some("first".into()));
        store.emit_page_success(None);
        assert!(store.snapshot().message.is_none());
    }

    #[test]
    fn reset_page_keeps_data_and_slots() {
        let store = Store::new(Doc {
            title: "kept".into(),
        });
        store.emit_slot_success("side", 1_u8);
        store.emit_page_error(Failure::server("boom"));

        store.reset_page();
        let state = store.snapshot();
        assert!(state.is_initial());
        assert!(state.error.is_none());
        assert!(state.message.is_none());
        assert_eq!(state.data.title, "kept");
        assert!(state.is_slot_success("side"));
    }

    #[test]
    fn reset_slot_keeps_key_remove_slot_deletes_it() {
        let store = Store::new(Doc::default());
        store.emit_slot_success("a", 1_u8);
        store.reset_slot("a");
        let state = store.snapshot();
        assert!(state.slot("a").is_some());
        assert!(state.slot("a").unwrap().is_initial());

        store.remove_slot("a");
        assert!(store.snapshot().slot("a").is_none());
    }

    #[test]
    fn remove_absent_slot_emits_no_snapshot() {
        let store = Store::new(Doc::default());
        let mut sub = store.subscribe();
        let before = store.snapshot();

        store.remove_slot("never-added");

        assert!(sub.try_recv().is_none());
        assert_eq!(store.snapshot().updated_at, before.updated_at);
    }

    #[test]
    fn update_and_reset_data() {
        let store = Store::new(Doc::default());
        store.update_data(|d| Doc {
            title: format!("{}!", d.title),
        });
        assert_eq!(store.snapshot().data.title, "!");
        store.reset_data();
        assert_eq!(store.snapshot().data, Doc::default());
    }

    #[test]
    fn dispose_drops_further_emissions() {
        let store = Store::new(Doc::default());
        store.emit_page_loading();
        store.dispose();
        store.emit_page_success(None);
        // Snapshot still reflects the last pre-dispose state.
        assert!(store.snapshot().is_loading());
        assert!(store.is_disposed());
    }

    #[test]
    fn clones_share_state() {
        let store = Store::new(Doc::default());
        let other = store.clone();
        store.emit_page_loading();
        assert!(other.snapshot().is_loading());
    }
}
