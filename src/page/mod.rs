//! The unified page state value.
//!
//! A [`PageState`] combines the page-level lifecycle status, an optional
//! page-level failure and message, the slot map, and the application's own
//! data payload into one immutable snapshot. Every change is a structural
//! copy; nothing is edited in place.

mod changes;
mod state;

pub use changes::PageChanges;
pub use state::{PageState, PageStatus, StateData};
