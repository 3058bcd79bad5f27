//! Tests for the correlation bridge against the mock engine.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::callback::Callback;
use crate::client::Client;
use crate::engine::Arg;
use crate::error::Error;
use crate::handle::CommandHandle;
use crate::handle::CommandHandles;
use crate::mock_engine::Fault;
use crate::mock_engine::MockEngine;
use crate::operation::CallbackShape;
use crate::operation::Operation;
use crate::outcome::Completion;
use crate::pending::PendingCalls;
use crate::status::ErrorKind;
use crate::status::code;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn create_args(name: &str) -> Vec<Arg> {
    vec![Arg::str(name), Arg::null()]
}

/// Polls until `check` holds or a second has passed.
async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

// --- Allocator ---

#[test]
fn test_command_handles_increase() {
    let handles = CommandHandles::new();
    let a = handles.next();
    let b = handles.next();
    let c = handles.next();

    assert_eq!(a, CommandHandle(1));
    assert!(b > a);
    assert!(c > b);
}

#[test]
fn test_concurrent_allocation_is_unique() {
    let handles = Arc::new(CommandHandles::new());
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let handles = handles.clone();
            thread::spawn(move || (0..1000).map(|_| handles.next()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for t in threads {
        for handle in t.join().unwrap() {
            assert!(seen.insert(handle), "handle {} allocated twice", handle);
        }
    }
    assert_eq!(seen.len(), 8000);
}

// --- Pending table ---

#[tokio::test]
async fn test_register_and_resolve() {
    let calls = PendingCalls::new();
    let rx = calls.register(CommandHandle(7), Operation::OpenPoolLedger).unwrap();
    assert_eq!(calls.len(), 1);

    calls.resolve(CommandHandle(7), Completion::new(0).with_handle(3));

    let completion = rx.await.unwrap();
    assert_eq!(completion.kind, ErrorKind::Success);
    assert_eq!(completion.handle, Some(3));
    assert!(calls.is_empty());
    assert_eq!(calls.protocol_violations(), 0);
}

#[test]
fn test_register_duplicate_is_rejected() {
    let calls = PendingCalls::new();
    let _rx = calls.register(CommandHandle(1), Operation::CloseWallet).unwrap();

    let err = calls.register(CommandHandle(1), Operation::CloseWallet).unwrap_err();
    assert_eq!(err, Error::DuplicateCorrelation(CommandHandle(1)));
    assert_eq!(calls.len(), 1);
}

#[test]
fn test_resolve_unknown_is_reported_not_raised() {
    init_tracing();
    let calls = PendingCalls::new();

    calls.resolve(CommandHandle(42), Completion::new(0));

    assert_eq!(calls.protocol_violations(), 1);
    assert!(calls.is_empty());
}

#[tokio::test]
async fn test_second_resolution_never_reaches_waiter() {
    let calls = PendingCalls::new();
    let rx = calls.register(CommandHandle(5), Operation::CreateWallet).unwrap();

    calls.resolve(CommandHandle(5), Completion::new(0));
    calls.resolve(CommandHandle(5), Completion::new(code::COMMON_IO_ERROR));

    let completion = rx.await.unwrap();
    assert_eq!(completion.kind, ErrorKind::Success);
    assert_eq!(calls.protocol_violations(), 1);
}

#[test]
fn test_discard_removes_slot() {
    let calls = PendingCalls::new();
    let _rx = calls.register(CommandHandle(9), Operation::DeleteWallet).unwrap();

    assert!(calls.discard(CommandHandle(9)));
    assert!(!calls.discard(CommandHandle(9)));
    assert!(calls.is_empty());
}

// --- Callback adapters ---

#[tokio::test]
async fn test_adapters_carry_their_shape() {
    let calls = Arc::new(PendingCalls::new());

    let simple = calls.register(CommandHandle(1), Operation::ClosePoolLedger).unwrap();
    let handle = calls.register(CommandHandle(2), Operation::OpenWallet).unwrap();
    let payload = calls.register(CommandHandle(3), Operation::SubmitRequest).unwrap();

    let Callback::Simple(cb) = Callback::for_shape(CallbackShape::Simple, calls.clone()) else {
        panic!("Expected simple adapter");
    };
    cb.complete(CommandHandle(1), 0);

    let Callback::Handle(cb) = Callback::for_shape(CallbackShape::Handle, calls.clone()) else {
        panic!("Expected handle adapter");
    };
    cb.complete(CommandHandle(2), 0, 11);

    let Callback::Payload(cb) = Callback::for_shape(CallbackShape::Payload, calls.clone()) else {
        panic!("Expected payload adapter");
    };
    cb.complete(CommandHandle(3), 0, Some(r#"{"op":"REPLY"}"#));

    let simple = simple.await.unwrap();
    assert_eq!(simple.handle, None);
    assert_eq!(simple.payload, None);

    assert_eq!(handle.await.unwrap().handle, Some(11));
    assert_eq!(payload.await.unwrap().payload.as_deref(), Some(r#"{"op":"REPLY"}"#));
}

#[tokio::test]
async fn test_failure_status_still_resolves() {
    let calls = Arc::new(PendingCalls::new());
    let rx = calls.register(CommandHandle(4), Operation::OpenWallet).unwrap();

    Callback::for_shape(CallbackShape::Handle, calls.clone())
        .fail(CommandHandle(4), code::WALLET_NOT_FOUND);

    let completion = rx.await.unwrap();
    assert_eq!(completion.status, code::WALLET_NOT_FOUND);
    assert_eq!(completion.kind, ErrorKind::NotFound);
}

// --- Gateway ---

#[tokio::test]
async fn test_call_round_trip() {
    init_tracing();
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());

    let outcome = client
        .call(Operation::CreatePoolLedgerConfig, create_args("sandbox"))
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.operation(), Operation::CreatePoolLedgerConfig);
    assert_eq!(outcome.invocation_status(), 0);
    assert_eq!(outcome.callback_status(), 0);
    assert!(engine.has_pool_config("sandbox"));
    assert!(client.pending().is_empty());
}

#[tokio::test]
async fn test_engine_failure_completes_with_outcome() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());

    client.call(Operation::CreatePoolLedgerConfig, create_args("twice")).await.unwrap();
    let outcome = client
        .call(Operation::CreatePoolLedgerConfig, create_args("twice"))
        .await
        .unwrap();

    assert_eq!(outcome.error_kind(), ErrorKind::AlreadyExists);
    assert_eq!(outcome.callback_status(), code::POOL_CONFIG_ALREADY_EXISTS);
}

#[tokio::test]
async fn test_handle_and_payload_results() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());

    client.call(Operation::CreatePoolLedgerConfig, create_args("ledger")).await.unwrap();
    let opened = client
        .call(Operation::OpenPoolLedger, vec![Arg::str("ledger"), Arg::str("{}")])
        .await
        .unwrap();
    let pool = opened.result_handle().expect("open returns a handle");

    let reply = client
        .call(Operation::SubmitRequest, vec![Arg::Int(pool), Arg::str(r#"{"reqId":1}"#)])
        .await
        .unwrap();
    let doc: serde_json::Value = serde_json::from_str(reply.result_payload().unwrap()).unwrap();
    assert_eq!(doc["op"], "REPLY");
    assert_eq!(doc["result"]["reqId"], 1);
}

#[tokio::test]
async fn test_engine_unavailable_allocates_nothing() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    engine.unload();

    let err = client.invoke(Operation::CreatePoolLedgerConfig, create_args("x")).unwrap_err();
    assert_eq!(err, Error::EngineUnavailable);
    assert_eq!(engine.invocation_count(), 0);
    assert!(client.pending().is_empty());

    engine.load();
    let call = client.invoke(Operation::CreatePoolLedgerConfig, create_args("x")).unwrap();
    assert_eq!(call.command(), CommandHandle(1));
    call.outcome().await.unwrap();
}

#[tokio::test]
async fn test_unencodable_argument_short_circuits() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());

    let err = client
        .invoke(Operation::CreatePoolLedgerConfig, create_args("bad\0name"))
        .unwrap_err();

    assert!(matches!(err, Error::ArgumentEncoding(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(engine.invocation_count(), 0);
    assert!(client.pending().is_empty());
}

#[test]
fn test_malformed_document_is_an_encoding_error() {
    let err = Arg::json("{not json").unwrap_err();
    assert!(matches!(err, Error::ArgumentEncoding(_)));
    assert_eq!(Arg::opt_json(None).unwrap(), Arg::null());
}

#[tokio::test]
async fn test_dispatch_failure_discards_slot() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    engine.fail_next(Fault::Refuse);

    let err = client.invoke(Operation::CreatePoolLedgerConfig, create_args("refused")).unwrap_err();

    assert!(matches!(err, Error::Dispatch { operation: Operation::CreatePoolLedgerConfig, .. }));
    assert!(client.pending().is_empty());
}

#[tokio::test]
async fn test_duplicate_callback_is_reported() {
    init_tracing();
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    engine.fail_next(Fault::DuplicateCallback { second_status: code::COMMON_IO_ERROR });

    let outcome = client
        .call(Operation::CreatePoolLedgerConfig, create_args("dup"))
        .await
        .unwrap();

    assert_eq!(outcome.error_kind(), ErrorKind::Success);
    assert!(eventually(|| client.pending().protocol_violations() == 1).await);
    assert_eq!(outcome.error_kind(), ErrorKind::Success);
}

#[tokio::test]
async fn test_deadline_leaves_slot_for_late_callback() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::builder(engine.clone())
        .deadline(Duration::from_millis(20))
        .build();
    engine.fail_next(Fault::Delay(Duration::from_millis(200)));

    let call = client.invoke(Operation::CreatePoolLedgerConfig, create_args("late")).unwrap();
    let command = call.command();
    let err = call.outcome().await.unwrap_err();

    assert!(matches!(err, Error::DeadlineElapsed { command: c, .. } if c == command));
    assert!(client.pending().contains(command));

    assert!(eventually(|| client.pending().is_empty()).await);
    assert_eq!(client.pending().protocol_violations(), 0);
}

#[tokio::test]
async fn test_late_open_after_deadline_is_released() {
    init_tracing();
    let engine = Arc::new(MockEngine::new());
    let client = Client::builder(engine.clone())
        .deadline(Duration::from_millis(20))
        .build();
    client
        .call(Operation::CreatePoolLedgerConfig, create_args("late_open"))
        .await
        .unwrap();

    engine.fail_next(Fault::Delay(Duration::from_millis(100)));
    let err = client
        .call(Operation::OpenPoolLedger, vec![Arg::str("late_open"), Arg::null()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(engine.is_pool_open("late_open"));

    assert!(eventually(|| !engine.is_pool_open("late_open")).await);
    assert_eq!(engine.invocations_of(Operation::ClosePoolLedger), 1);
    assert!(eventually(|| client.pending().is_empty()).await);
    assert_eq!(client.pending().protocol_violations(), 0);
}

#[tokio::test]
async fn test_dropped_call_releases_delivered_handle() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    client
        .call(Operation::CreatePoolLedgerConfig, create_args("unread"))
        .await
        .unwrap();

    let call = client
        .invoke(Operation::OpenPoolLedger, vec![Arg::str("unread"), Arg::null()])
        .unwrap();
    // Delivered into the channel, never read.
    assert!(eventually(|| client.pending().is_empty()).await);
    assert!(engine.is_pool_open("unread"));

    drop(call);
    assert!(eventually(|| !engine.is_pool_open("unread")).await);
    assert_eq!(engine.invocations_of(Operation::ClosePoolLedger), 1);
}

#[tokio::test]
async fn test_failed_open_is_not_released() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());

    let call = client
        .invoke(Operation::OpenWallet, vec![Arg::str("missing"), Arg::null(), Arg::null()])
        .unwrap();
    assert!(eventually(|| client.pending().is_empty()).await);
    drop(call);

    assert_eq!(engine.invocations_of(Operation::CloseWallet), 0);
}

#[tokio::test]
async fn test_immediate_status_is_kept_apart_from_result() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    engine.fail_next(Fault::ImmediateStatus(code::COMMON_INVALID_STATE));

    let call = client.invoke(Operation::CreatePoolLedgerConfig, create_args("imm")).unwrap();
    assert_eq!(call.invocation_status(), code::COMMON_INVALID_STATE);

    // The engine never calls back, so the only way out is a deadline.
    let err = call.with_deadline(Duration::from_millis(20)).outcome().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_abandon_fails_waiters() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    engine.fail_next(Fault::DropCallback);

    let call = client.invoke(Operation::CreatePoolLedgerConfig, create_args("lost")).unwrap();
    let command = call.command();
    assert_eq!(client.abandon_pending(), 1);

    assert_eq!(call.outcome().await.unwrap_err(), Error::Abandoned(command));
    assert!(client.pending().is_empty());
}

#[tokio::test]
async fn test_callback_after_abandon_is_reported_unknown() {
    init_tracing();
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    engine.fail_next(Fault::Delay(Duration::from_millis(50)));

    let call = client.invoke(Operation::CreatePoolLedgerConfig, create_args("orphan")).unwrap();
    let command = call.command();
    assert_eq!(client.abandon_pending(), 1);
    assert_eq!(call.outcome().await.unwrap_err(), Error::Abandoned(command));

    assert!(eventually(|| client.pending().protocol_violations() == 1).await);
    assert!(client.pending().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_resolve_out_of_order() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    {
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            engine.fail_next(Fault::Delay(Duration::from_millis(rng.gen_range(0..30))));
        }
    }

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .call(Operation::CreatePoolLedgerConfig, create_args(&format!("pool-{i}")))
                    .await
            })
        })
        .collect();

    let mut commands = HashSet::new();
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.is_success());
        commands.insert(outcome.command());
    }

    assert_eq!(commands.len(), 32);
    assert!(client.pending().is_empty());
    assert_eq!(client.pending().protocol_violations(), 0);
}

// --- Blocking ---

#[test]
fn test_call_blocking() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());

    let outcome = client
        .call_blocking(Operation::CreatePoolLedgerConfig, create_args("blocking"))
        .unwrap();
    assert!(outcome.is_success());

    let outcome = client
        .invoke(Operation::CreatePoolLedgerConfig, create_args("blocking"))
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(outcome.error_kind(), ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_blocking_inside_runtime_is_refused() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());

    let err = client
        .call_blocking(Operation::CreatePoolLedgerConfig, create_args("nested"))
        .unwrap_err();

    assert!(matches!(err, Error::Runtime(_)));
    assert_eq!(engine.invocation_count(), 0);
}

#[tokio::test]
async fn test_wait_inside_runtime_keeps_the_call() {
    let engine = Arc::new(MockEngine::new());
    let client = Client::new(engine.clone());
    client
        .call(Operation::CreatePoolLedgerConfig, create_args("nested_wait"))
        .await
        .unwrap();

    let mut call = client
        .invoke(Operation::OpenPoolLedger, vec![Arg::str("nested_wait"), Arg::null()])
        .unwrap();
    assert!(matches!(call.wait(), Err(Error::Runtime(_))));

    let outcome = call.outcome().await.unwrap();
    assert!(outcome.is_success());
    assert!(outcome.result_handle().is_some());
    assert!(engine.is_pool_open("nested_wait"));
    assert_eq!(engine.invocations_of(Operation::ClosePoolLedger), 0);
}
