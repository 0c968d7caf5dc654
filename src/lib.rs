//! Unified page/slot loading state for reactive UIs.
//!
//! One immutable [`PageState`] value combines a page-level lifecycle
//! status, an optional [`Failure`] and message, a map of independently
//! loading named slots, and an application-defined data payload. A
//! [`Store`] owns the state, produces new snapshots via copy-with
//! semantics, orchestrates async external calls, and publishes every
//! snapshot to subscribers.
//!
//! # Architecture
//!
//! ```text
//! async op ──→ Store ──→ copy_with ──→ PageState ──→ Subscription
//!                │                        ↑
//!                └── Failure / payload ───┘
//! ```
//!
//! - **[`PageState`]**: immutable snapshot; all fields, one timestamp
//! - **[`SlotState`]**: one keyed loading region, replaced wholesale
//! - **[`Store`]**: the only producer of new snapshots
//! - **[`Failure`]**: structured error value, never a panic
//!
//! External operations resolve to `Result<R, Failure>`; a panic crossing
//! the store's call boundary is normalized into an `Unknown` failure.
//! Rendering is out of scope: consumers read snapshots, nothing more.

pub mod failure;
pub mod page;
pub mod patch;
pub mod slot;
pub mod store;

pub use failure::{Failure, FailureKind};
pub use page::{PageChanges, PageState, PageStatus, StateData};
pub use patch::Patch;
pub use slot::{SlotPayload, SlotState, SlotStatus};
pub use store::{slot_call, PageCallOptions, SlotCall, SlotCallOptions, Store, Subscription};
