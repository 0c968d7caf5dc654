use tokio::sync::mpsc;

use crate::page::{PageState, StateData};

/// Receiving half of a store subscription.
///
/// Delivers every snapshot emitted after [`subscribe`](crate::store::Store::subscribe)
/// was called, in emission order, with no coalescing. Ends (`recv`
/// returns `None`) once the store is disposed and buffered snapshots are
/// drained.
pub struct Subscription<D: StateData> {
    rx: mpsc::UnboundedReceiver<PageState<D>>,
}

impl<D: StateData> Subscription<D> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<PageState<D>>) -> Self {
        Self { rx }
    }

    /// Wait for the next snapshot.
    pub async fn recv(&mut self) -> Option<PageState<D>> {
        self.rx.recv().await
    }

    /// Take the next snapshot if one is already buffered.
    pub fn try_recv(&mut self) -> Option<PageState<D>> {
        self.rx.try_recv().ok()
    }
}
