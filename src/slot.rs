//! Per-key loading regions ("slots").
//!
//! A slot tracks one independently loading part of a page, identified by a
//! string key in the page state's slot map. Slot values are replaced
//! wholesale on every transition; there is no partial field mutation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::failure::Failure;

/// Lifecycle phase of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Initial,
    Loading,
    Success,
    Error,
}

/// Type-erased slot payload. Cheap to clone; typed access goes through
/// [`SlotState::payload_as`].
pub type SlotPayload = Arc<dyn Any + Send + Sync>;

/// State of one slot at a point in time.
///
/// Invariants, enforced by construction:
/// - `Success` carries a payload and no error.
/// - `Error` carries an error and no payload.
/// - `updated_at` is stamped only on `Success`/`Error` transitions.
#[derive(Clone)]
pub struct SlotState {
    status: SlotStatus,
    payload: Option<SlotPayload>,
    error: Option<Failure>,
    updated_at: Option<SystemTime>,
}

impl SlotState {
    /// A slot that has never loaded (or was explicitly reset).
    pub fn initial() -> Self {
        Self {
            status: SlotStatus::Initial,
            payload: None,
            error: None,
            updated_at: None,
        }
    }

    /// A slot with a request in flight.
    pub fn loading() -> Self {
        Self {
            status: SlotStatus::Loading,
            payload: None,
            error: None,
            updated_at: None,
        }
    }

    /// A successfully loaded slot holding `payload`.
    pub fn success<T: Any + Send + Sync>(payload: T) -> Self {
        Self::success_payload(Arc::new(payload))
    }

    /// Like [`SlotState::success`] but takes an already erased payload.
    pub fn success_payload(payload: SlotPayload) -> Self {
        Self {
            status: SlotStatus::Success,
            payload: Some(payload),
            error: None,
            updated_at: Some(SystemTime::now()),
        }
    }

    /// A slot whose load failed.
    pub fn error(failure: Failure) -> Self {
        Self {
            status: SlotStatus::Error,
            payload: None,
            error: Some(failure),
            updated_at: Some(SystemTime::now()),
        }
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn is_initial(&self) -> bool {
        self.status == SlotStatus::Initial
    }

    pub fn is_loading(&self) -> bool {
        self.status == SlotStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == SlotStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == SlotStatus::Error
    }

    /// The raw erased payload, if any.
    pub fn payload(&self) -> Option<&SlotPayload> {
        self.payload.as_ref()
    }

    /// The payload downcast to `T`.
    ///
    /// Returns `None` when the slot has no payload or when the stored
    /// payload's runtime type differs; never panics.
    pub fn payload_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.payload
            .as_ref()
            .and_then(|p| Arc::clone(p).downcast::<T>().ok())
    }

    /// The failure recorded by the last `Error` transition, if any.
    pub fn failure(&self) -> Option<&Failure> {
        self.error.as_ref()
    }

    /// When the slot last reached a terminal status, if it has.
    pub fn updated_at(&self) -> Option<SystemTime> {
        self.updated_at
    }
}

impl Default for SlotState {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Debug for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotState")
            .field("status", &self.status)
            .field("has_payload", &self.payload.is_some())
            .field("error", &self.error)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Payloads are compared by identity (same `Arc`), everything else by value.
impl PartialEq for SlotState {
    fn eq(&self, other: &Self) -> bool {
        let payload_eq = match (&self.payload, &other.payload) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        payload_eq
            && self.status == other.status
            && self.error == other.error
            && self.updated_at == other.updated_at
    }
}
