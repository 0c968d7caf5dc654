mod common;

use std::time::Duration;

use common::{init_tracing, Profile};
use pagestore::{slot_call, Failure, FailureKind, SlotCallOptions, Store};
use tokio::sync::oneshot;

#[tokio::test]
async fn slot_success_stores_payload() {
    init_tracing();
    let store = Store::new(Profile::default());

    let result = store
        .execute_slot_call(
            "list",
            async { Ok::<_, Failure>(vec![1_u32, 2, 3]) },
            SlotCallOptions::default(),
            |_| {},
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(*result, vec![1, 2, 3]);
    let state = store.snapshot();
    assert!(state.is_slot_success("list"));
    assert_eq!(*state.slot_payload::<Vec<u32>>("list").unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn slot_failure_stores_the_failure() {
    let store = Store::new(Profile::default());
    let failure = Failure::cache("evicted");

    let result = store
        .execute_slot_call(
            "list",
            async { Err::<u32, _>(failure.clone()) },
            SlotCallOptions::default(),
            |_| {},
            |_| {},
        )
        .await;

    assert_eq!(result.unwrap_err(), failure);
    let state = store.snapshot();
    assert!(state.is_slot_error("list"));
    assert_eq!(state.slot("list").unwrap().failure(), Some(&failure));
}

#[tokio::test]
async fn non_persisted_success_resets_slot_to_initial() {
    let store = Store::new(Profile::default());

    store
        .execute_slot_call(
            "submit",
            async { Ok::<_, Failure>(()) },
            SlotCallOptions {
                persist_payload: false,
                ..SlotCallOptions::default()
            },
            |_| {},
            |_| {},
        )
        .await
        .unwrap();

    let state = store.snapshot();
    let slot = state.slot("submit").expect("key stays present");
    assert!(slot.is_initial());
    assert!(slot.payload().is_none());
}

#[tokio::test]
async fn slot_call_emits_loading_first() {
    let store = Store::new(Profile::default());
    let mut sub = store.subscribe();

    store
        .execute_slot_call(
            "list",
            async { Ok::<_, Failure>(1_u8) },
            SlotCallOptions::default(),
            |_| {},
            |_| {},
        )
        .await
        .unwrap();

    let first = sub.try_recv().expect("loading snapshot");
    assert!(first.is_slot_loading("list"));
    let second = sub.try_recv().expect("terminal snapshot");
    assert!(second.is_slot_success("list"));
}

#[tokio::test]
async fn multi_slot_calls_mark_all_keys_loading_in_one_emission() {
    let store = Store::new(Profile::default());
    let mut sub = store.subscribe();

    let results = store
        .execute_slot_calls(vec![
            (
                "a".to_string(),
                slot_call(async { Ok::<_, Failure>(7_u32) }),
            ),
            (
                "b".to_string(),
                slot_call(async { Err::<u32, _>(Failure::server("boom")) }),
            ),
        ])
        .await;

    // First snapshot already shows both keys loading, never just one.
    let first = sub.try_recv().expect("batched loading snapshot");
    assert!(first.is_slot_loading("a"));
    assert!(first.is_slot_loading("b"));

    assert_eq!(results.len(), 2);
    assert_eq!(
        *results["a"]
            .as_ref()
            .unwrap()
            .clone()
            .downcast::<u32>()
            .unwrap(),
        7
    );
    assert_eq!(results["b"].as_ref().unwrap_err(), &Failure::server("boom"));

    let state = store.snapshot();
    assert!(state.is_slot_success("a"));
    assert!(state.is_slot_error("b"));
}

#[tokio::test]
async fn multi_slot_calls_report_loading_while_in_flight() {
    let store = Store::new(Profile::default());
    let (release_a, gate_a) = oneshot::channel::<()>();
    let (release_b, gate_b) = oneshot::channel::<()>();

    let task = tokio::spawn({
        let store = store.clone();
        async move {
            store
                .execute_slot_calls(vec![
                    (
                        "a".to_string(),
                        slot_call(async move {
                            gate_a.await.ok();
                            Ok::<_, Failure>("payload".to_string())
                        }),
                    ),
                    (
                        "b".to_string(),
                        slot_call(async move {
                            gate_b.await.ok();
                            Err::<String, _>(Failure::network("down"))
                        }),
                    ),
                ])
                .await
        }
    });

    // Both keys must report loading before either operation resolves.
    let mut both_loading = false;
    for _ in 0..100 {
        let state = store.snapshot();
        if state.is_slot_loading("a") && state.is_slot_loading("b") {
            both_loading = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(both_loading);

    release_a.send(()).unwrap();
    release_b.send(()).unwrap();

    let results = task.await.unwrap();
    assert_eq!(
        *results["a"]
            .as_ref()
            .unwrap()
            .clone()
            .downcast::<String>()
            .unwrap(),
        "payload"
    );
    assert_eq!(results["b"].as_ref().unwrap_err(), &Failure::network("down"));

    let state = store.snapshot();
    assert_eq!(
        *state.slot_payload::<String>("a").unwrap(),
        "payload".to_string()
    );
    assert!(state.is_slot_error("b"));
}

#[tokio::test]
async fn multi_slot_panic_is_isolated_per_key() {
    let store = Store::new(Profile::default());

    let results = store
        .execute_slot_calls(vec![
            (
                "ok".to_string(),
                slot_call(async { Ok::<_, Failure>(1_u8) }),
            ),
            (
                "bad".to_string(),
                slot_call::<u8, _>(async { panic!("slot blew up") }),
            ),
        ])
        .await;

    assert!(results["ok"].is_ok());
    let failure = results["bad"].as_ref().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Unknown);
    assert_eq!(failure.message, "slot blew up");

    let state = store.snapshot();
    assert!(state.is_slot_success("ok"));
    assert!(state.is_slot_error("bad"));
}

#[tokio::test]
async fn empty_multi_slot_call_emits_nothing() {
    let store = Store::new(Profile::default());
    let mut sub = store.subscribe();
    let results = store.execute_slot_calls(Vec::new()).await;
    assert!(results.is_empty());
    assert!(sub.try_recv().is_none());
}
