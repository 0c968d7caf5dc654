use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::failure::Failure;
use crate::page::changes::PageChanges;
use crate::slot::{SlotState, SlotStatus};

/// Page-level lifecycle phase.
///
/// `Refreshing` is a reload while previous content is still on screen, as
/// opposed to the first `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    #[default]
    Initial,
    Loading,
    Refreshing,
    Success,
    Error,
}

/// Contract for the application-defined data payload carried by a page.
///
/// Any concrete struct qualifies; no base type is required. Copying with
/// overrides is `Clone` plus whatever copy-with methods the application
/// defines (use [`Patch`](crate::Patch) for fields that must distinguish
/// "keep" from "clear").
pub trait StateData: Clone + PartialEq + Send + Sync + 'static {
    /// The caller-defined initial value this data returns to on reset.
    fn reset(&self) -> Self;
}

/// One immutable snapshot of a page's state.
///
/// Exactly one `data` value exists at any time. Consumers receive clones of
/// snapshots, never a mutable reference; all mutation goes through the
/// owning [`Store`](crate::store::Store).
#[derive(Debug, Clone, PartialEq)]
pub struct PageState<D: StateData> {
    pub status: PageStatus,
    pub error: Option<Failure>,
    pub message: Option<String>,
    pub slots: HashMap<String, SlotState>,
    pub data: D,
    pub updated_at: SystemTime,
}

impl<D: StateData> PageState<D> {
    /// The seed state: `Initial` status, no error, no message, empty slots.
    pub fn initial(data: D) -> Self {
        Self {
            status: PageStatus::Initial,
            error: None,
            message: None,
            slots: HashMap::new(),
            data,
            updated_at: SystemTime::now(),
        }
    }

    /// Structural copy applying only the fields `changes` supplies.
    ///
    /// The `clear_error` / `clear_message` flags win over a value supplied
    /// for the same field in the same call. Stamps a fresh `updated_at`.
    pub fn copy_with(&self, changes: PageChanges<D>) -> Self {
        // Clearing wins over setting when both are signaled.
        let error = if changes.clear_error {
            None
        } else {
            changes.error.or_else(|| self.error.clone())
        };
        let message = if changes.clear_message {
            None
        } else {
            changes.message.or_else(|| self.message.clone())
        };
        Self {
            status: changes.status.unwrap_or(self.status),
            error,
            message,
            slots: changes.slots.unwrap_or_else(|| self.slots.clone()),
            data: changes.data.unwrap_or_else(|| self.data.clone()),
            updated_at: SystemTime::now(),
        }
    }

    /// Copy with one slot entry inserted or replaced.
    pub fn update_slot(&self, key: impl Into<String>, slot: SlotState) -> Self {
        let mut slots = self.slots.clone();
        slots.insert(key.into(), slot);
        self.copy_with(PageChanges {
            slots: Some(slots),
            ..PageChanges::default()
        })
    }

    /// Copy with one slot entry removed. An absent key is a true no-op:
    /// the returned state equals `self`, timestamp included.
    pub fn remove_slot(&self, key: &str) -> Self {
        if !self.slots.contains_key(key) {
            return self.clone();
        }
        let mut slots = self.slots.clone();
        slots.remove(key);
        self.copy_with(PageChanges {
            slots: Some(slots),
            ..PageChanges::default()
        })
    }

    /// Copy with several slot entries merged in at once, overwriting listed
    /// keys and preserving the rest.
    pub fn update_slots(&self, entries: impl IntoIterator<Item = (String, SlotState)>) -> Self {
        let mut slots = self.slots.clone();
        slots.extend(entries);
        self.copy_with(PageChanges {
            slots: Some(slots),
            ..PageChanges::default()
        })
    }

    /// Copy with an empty slot map; page status and data are preserved.
    pub fn clear_slots(&self) -> Self {
        self.copy_with(PageChanges {
            slots: Some(HashMap::new()),
            ..PageChanges::default()
        })
    }

    pub fn slot(&self, key: &str) -> Option<&SlotState> {
        self.slots.get(key)
    }

    /// Typed payload of a slot, absent on missing key, missing payload, or
    /// a type mismatch.
    pub fn slot_payload<T: std::any::Any + Send + Sync>(&self, key: &str) -> Option<std::sync::Arc<T>> {
        self.slots.get(key).and_then(|s| s.payload_as::<T>())
    }

    fn slot_has_status(&self, key: &str, status: SlotStatus) -> bool {
        self.slots.get(key).is_some_and(|s| s.status() == status)
    }

    pub fn is_slot_loading(&self, key: &str) -> bool {
        self.slot_has_status(key, SlotStatus::Loading)
    }

    pub fn is_slot_success(&self, key: &str) -> bool {
        self.slot_has_status(key, SlotStatus::Success)
    }

    pub fn is_slot_error(&self, key: &str) -> bool {
        self.slot_has_status(key, SlotStatus::Error)
    }

    pub fn any_slot_loading(&self) -> bool {
        self.slots.values().any(|s| s.is_loading())
    }

    /// Keys with a request currently in flight. Order is unspecified.
    pub fn loading_slot_keys(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|(_, s)| s.is_loading())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Keys whose last load failed. Order is unspecified.
    pub fn failed_slot_keys(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|(_, s)| s.is_error())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn is_initial(&self) -> bool {
        self.status == PageStatus::Initial
    }

    pub fn is_loading(&self) -> bool {
        self.status == PageStatus::Loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.status == PageStatus::Refreshing
    }

    pub fn is_success(&self) -> bool {
        self.status == PageStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == PageStatus::Error
    }

    /// Loading or refreshing.
    pub fn is_busy(&self) -> bool {
        matches!(self.status, PageStatus::Loading | PageStatus::Refreshing)
    }
}
