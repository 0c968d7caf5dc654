use std::collections::HashMap;

use crate::failure::Failure;
use crate::page::state::{PageStatus, StateData};
use crate::slot::SlotState;

/// Field overrides for [`PageState::copy_with`](crate::page::PageState::copy_with).
///
/// Only supplied fields change. `clear_error` / `clear_message` force the
/// field to absent and take precedence over a value supplied in the same
/// call.
#[derive(Debug, Clone)]
pub struct PageChanges<D: StateData> {
    pub status: Option<PageStatus>,
    pub error: Option<Failure>,
    pub message: Option<String>,
    pub slots: Option<HashMap<String, SlotState>>,
    pub data: Option<D>,
    pub clear_error: bool,
    pub clear_message: bool,
}

// Manual impl: a derive would require `D: Default`.
impl<D: StateData> Default for PageChanges<D> {
    fn default() -> Self {
        Self {
            status: None,
            error: None,
            message: None,
            slots: None,
            data: None,
            clear_error: false,
            clear_message: false,
        }
    }
}

impl<D: StateData> PageChanges<D> {
    /// Changeset that only moves the page status.
    pub fn status(status: PageStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Changeset that only replaces the data payload.
    pub fn data(data: D) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }
}
