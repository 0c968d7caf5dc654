//! Asynchronous call orchestration.
//!
//! External operations are plain futures resolving to `Result<R, Failure>`:
//! recoverable failures are values, never panics. A panic escaping an
//! operation is caught here (the only fault-to-value boundary) and
//! normalized into an `Unknown` failure, so the caller-visible contract is
//! identical to a modeled failure. Exactly one terminal emission happens
//! per call.
//!
//! Overlapping calls for the same slot key are a caller error: the
//! last-completing call's state wins, no sequencing is enforced.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;

use crate::failure::Failure;
use crate::page::StateData;
use crate::slot::{SlotPayload, SlotState};
use crate::store::Store;

/// Options for [`Store::execute_page_call`].
#[derive(Debug, Clone)]
pub struct PageCallOptions {
    /// Emit a busy status before awaiting the operation.
    pub show_loading: bool,
    /// Use `Refreshing` instead of `Loading` for the busy status.
    pub refresh: bool,
    /// Message attached to the success state.
    pub success_message: Option<String>,
}

impl Default for PageCallOptions {
    fn default() -> Self {
        Self {
            show_loading: true,
            refresh: false,
            success_message: None,
        }
    }
}

/// Options for [`Store::execute_slot_call`].
#[derive(Debug, Clone)]
pub struct SlotCallOptions {
    /// Emit slot loading before awaiting the operation.
    pub show_loading: bool,
    /// When false, a successful result resets the slot to `Initial`
    /// instead of storing the payload (only the act of completing
    /// matters, not the returned value).
    pub persist_payload: bool,
}

impl Default for SlotCallOptions {
    fn default() -> Self {
        Self {
            show_loading: true,
            persist_payload: true,
        }
    }
}

/// A boxed slot operation, as consumed by [`Store::execute_slot_calls`].
pub type SlotCall = BoxFuture<'static, Result<SlotPayload, Failure>>;

/// Erase a typed operation into a [`SlotCall`].
pub fn slot_call<R, F>(op: F) -> SlotCall
where
    F: Future<Output = Result<R, Failure>> + Send + 'static,
    R: Any + Send + Sync,
{
    op.map(|res| res.map(|value| Arc::new(value) as SlotPayload))
        .boxed()
}

impl<D: StateData> Store<D> {
    /// Run one page-scoped operation.
    ///
    /// Optionally emits loading (or refreshing), awaits `op`, then emits
    /// exactly one terminal page state: success with the hook invoked on
    /// the value, or error with the hook invoked on the failure. A panic
    /// inside `op` takes the failure path with an `Unknown` failure; no
    /// panic escapes this call.
    pub async fn execute_page_call<R, F>(
        &self,
        op: F,
        options: PageCallOptions,
        on_success: impl FnOnce(&R),
        on_error: impl FnOnce(&Failure),
    ) -> Result<R, Failure>
    where
        F: Future<Output = Result<R, Failure>>,
    {
        if options.show_loading {
            if options.refresh {
                self.emit_page_refreshing();
            } else {
                self.emit_page_loading();
            }
        }

        match run_guarded(op).await {
            Ok(value) => {
                self.emit_page_success(options.success_message);
                on_success(&value);
                Ok(value)
            }
            Err(failure) => {
                self.emit_page_error(failure.clone());
                on_error(&failure);
                Err(failure)
            }
        }
    }

    /// Run one slot-scoped operation for `key`.
    ///
    /// Same orchestration as [`Store::execute_page_call`], scoped to the
    /// slot. The stored payload is shared with the returned value.
    pub async fn execute_slot_call<R, F>(
        &self,
        key: &str,
        op: F,
        options: SlotCallOptions,
        on_success: impl FnOnce(&R),
        on_error: impl FnOnce(&Failure),
    ) -> Result<Arc<R>, Failure>
    where
        F: Future<Output = Result<R, Failure>>,
        R: Any + Send + Sync,
    {
        if options.show_loading {
            self.emit_slot_loading(key);
        }

        match run_guarded(op).await {
            Ok(value) => {
                let payload = Arc::new(value);
                if options.persist_payload {
                    let erased: SlotPayload = payload.clone();
                    self.emit_slot_success_payload(key, erased);
                } else {
                    self.reset_slot(key);
                }
                on_success(payload.as_ref());
                Ok(payload)
            }
            Err(failure) => {
                self.emit_slot_error(key, failure.clone());
                on_error(&failure);
                Err(failure)
            }
        }
    }

    /// Run several slot operations concurrently.
    ///
    /// All listed keys are marked loading in ONE batched emission, so no
    /// intermediate snapshot shows only some of them loading. Each
    /// operation's terminal slot state is emitted independently as it
    /// resolves, with no ordering across keys; a per-key panic is
    /// normalized without aborting the others. Resolves once every
    /// operation has settled, with one entry per key.
    pub async fn execute_slot_calls(
        &self,
        calls: Vec<(String, SlotCall)>,
    ) -> HashMap<String, Result<SlotPayload, Failure>> {
        if calls.is_empty() {
            return HashMap::new();
        }

        let loading: Vec<(String, SlotState)> = calls
            .iter()
            .map(|(key, _)| (key.clone(), SlotState::loading()))
            .collect();
        self.apply(move |s| s.update_slots(loading));

        let tasks = calls.into_iter().map(|(key, op)| async move {
            let result = run_guarded(op).await;
            match &result {
                Ok(payload) => self.emit_slot_success_payload(&key, payload.clone()),
                Err(failure) => self.emit_slot_error(&key, failure.clone()),
            }
            (key, result)
        });

        join_all(tasks).await.into_iter().collect()
    }
}

/// Await `op`, converting a panic into an `Unknown` failure.
async fn run_guarded<R, F>(op: F) -> Result<R, Failure>
where
    F: Future<Output = Result<R, Failure>>,
{
    match AssertUnwindSafe(op).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let failure = Failure::from_panic(panic);
            tracing::warn!(message = %failure.message, "external operation panicked");
            Err(failure)
        }
    }
}
