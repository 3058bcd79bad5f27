//! In-memory engine stand-in.
//!
//! Behaves like the native engine closely enough to drive the bridge and the
//! lifecycle managers end to end: it keeps pool configurations, open pools and
//! wallets, answers with the engine's status codes, and delivers every callback
//! from a worker thread of its own. Faults can be queued to exercise the
//! bridge's protocol-violation and timeout paths.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use serde_json::json;

use crate::callback::Callback;
use crate::engine::Arg;
use crate::engine::Engine;
use crate::engine::EngineError;
use crate::engine::Invocation;
use crate::handle::CommandHandle;
use crate::operation::Operation;
use crate::status::code;

/// Misbehaviour applied to the next invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Accept the call but never invoke the callback.
    DropCallback,
    /// Invoke the callback a second time, carrying `second_status`.
    DuplicateCallback { second_status: i32 },
    /// Deliver the callback only after `Duration`.
    Delay(Duration),
    /// Return this immediate status and never invoke the callback.
    ImmediateStatus(i32),
    /// Refuse to dispatch the call.
    Refuse,
}

#[derive(Clone, Debug)]
struct Reply {
    status: i32,
    handle: i32,
    payload: Option<String>,
}

impl Reply {
    fn status(status: i32) -> Self {
        Self {
            status,
            handle: 0,
            payload: None,
        }
    }

    fn handle(handle: i32) -> Self {
        Self {
            status: code::SUCCESS,
            handle,
            payload: None,
        }
    }

    fn payload(payload: Value) -> Self {
        Self {
            status: code::SUCCESS,
            handle: 0,
            payload: Some(payload.to_string()),
        }
    }
}

struct Job {
    callback: Callback,
    command: CommandHandle,
    reply: Reply,
    delay: Option<Duration>,
    duplicate: Option<i32>,
}

impl Job {
    fn run(self) {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        deliver(&self.callback, self.command, &self.reply);
        if let Some(second_status) = self.duplicate {
            let mut second = self.reply.clone();
            second.status = second_status;
            deliver(&self.callback, self.command, &second);
        }
    }
}

fn deliver(callback: &Callback, command: CommandHandle, reply: &Reply) {
    if reply.status != code::SUCCESS {
        callback.fail(command, reply.status);
        return;
    }
    match callback {
        Callback::Simple(cb) => cb.complete(command, reply.status),
        Callback::Handle(cb) => cb.complete(command, reply.status, reply.handle),
        Callback::Payload(cb) => cb.complete(command, reply.status, reply.payload.as_deref()),
    }
}

struct WalletRecord {
    credentials: Option<String>,
}

#[derive(Default)]
struct State {
    pool_configs: HashSet<String>,
    open_pools: HashMap<i32, String>,
    wallets: HashMap<String, WalletRecord>,
    open_wallets: HashMap<i32, String>,
}

/// A fake engine for tests and examples.
pub struct MockEngine {
    state: Mutex<State>,
    faults: Mutex<VecDeque<Fault>>,
    calls: Mutex<Vec<Operation>>,
    loaded: AtomicBool,
    next_handle: AtomicI32,
    next_req_id: AtomicI32,
    worker: mpsc::Sender<Job>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn arg_str(args: &[Arg], index: usize) -> Option<&str> {
    args.get(index).and_then(Arg::as_str)
}

fn arg_int(args: &[Arg], index: usize) -> Option<i32> {
    args.get(index).and_then(Arg::as_int)
}

/// Status for a missing required parameter, matching the engine's numbering
/// (the command handle is parameter 1).
fn missing_param(index: usize) -> Reply {
    Reply::status(code::COMMON_INVALID_PARAM1 + 1 + index as i32)
}

fn parse(document: &str) -> Option<Value> {
    serde_json::from_str(document).ok()
}

impl MockEngine {
    pub fn new() -> Self {
        let (worker, jobs) = mpsc::channel::<Job>();

        // Exits once the engine, and with it the last sender, is dropped.
        thread::spawn(move || {
            while let Ok(job) = jobs.recv() {
                if job.delay.is_some() {
                    thread::spawn(move || job.run());
                } else {
                    job.run();
                }
            }
        });

        Self {
            state: Mutex::new(State::default()),
            faults: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            loaded: AtomicBool::new(true),
            next_handle: AtomicI32::new(1),
            next_req_id: AtomicI32::new(1),
            worker,
        }
    }

    /// Queues a fault for the next invocation. Faults apply in FIFO order.
    pub fn fail_next(&self, fault: Fault) {
        lock(&self.faults).push_back(fault);
    }

    pub fn unload(&self) {
        self.loaded.store(false, Ordering::SeqCst);
    }

    pub fn load(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }

    /// Total number of invocations the engine has received.
    pub fn invocation_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of invocations of one operation.
    pub fn invocations_of(&self, operation: Operation) -> usize {
        lock(&self.calls).iter().filter(|op| **op == operation).count()
    }

    pub fn has_pool_config(&self, name: &str) -> bool {
        lock(&self.state).pool_configs.contains(name)
    }

    pub fn has_wallet(&self, name: &str) -> bool {
        lock(&self.state).wallets.contains_key(name)
    }

    /// Whether the engine holds an open handle for the pool `name`.
    pub fn is_pool_open(&self, name: &str) -> bool {
        lock(&self.state).open_pools.values().any(|open| open == name)
    }

    pub fn is_wallet_open(&self, name: &str) -> bool {
        lock(&self.state).open_wallets.values().any(|open| open == name)
    }

    fn next_handle(&self) -> i32 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    fn execute(&self, operation: Operation, args: &[Arg]) -> Reply {
        let mut state = lock(&self.state);
        match operation {
            Operation::CreatePoolLedgerConfig => {
                let Some(name) = arg_str(args, 0) else { return missing_param(0) };
                if let Some(config) = arg_str(args, 1) {
                    let genesis = parse(config).and_then(|v| v.get("genesis_txn").cloned());
                    if !matches!(genesis, Some(Value::String(_))) {
                        return Reply::status(code::COMMON_INVALID_STRUCTURE);
                    }
                }
                if !state.pool_configs.insert(name.to_owned()) {
                    return Reply::status(code::POOL_CONFIG_ALREADY_EXISTS);
                }
                Reply::status(code::SUCCESS)
            }
            Operation::OpenPoolLedger => {
                let Some(name) = arg_str(args, 0) else { return missing_param(0) };
                if arg_str(args, 1).is_some_and(|config| parse(config).is_none()) {
                    return Reply::status(code::COMMON_INVALID_STRUCTURE);
                }
                if !state.pool_configs.contains(name) {
                    return Reply::status(code::POOL_LEDGER_NOT_CREATED);
                }
                if state.open_pools.values().any(|open| open == name) {
                    return Reply::status(code::COMMON_INVALID_STATE);
                }
                let handle = self.next_handle();
                state.open_pools.insert(handle, name.to_owned());
                Reply::handle(handle)
            }
            Operation::RefreshPoolLedger => {
                let Some(handle) = arg_int(args, 0) else { return missing_param(0) };
                if !state.open_pools.contains_key(&handle) {
                    return Reply::status(code::POOL_LEDGER_INVALID_HANDLE);
                }
                Reply::status(code::SUCCESS)
            }
            Operation::ClosePoolLedger => {
                let Some(handle) = arg_int(args, 0) else { return missing_param(0) };
                match state.open_pools.remove(&handle) {
                    Some(_) => Reply::status(code::SUCCESS),
                    None => Reply::status(code::POOL_LEDGER_INVALID_HANDLE),
                }
            }
            Operation::DeletePoolLedgerConfig => {
                let Some(name) = arg_str(args, 0) else { return missing_param(0) };
                if state.open_pools.values().any(|open| open == name) {
                    return Reply::status(code::COMMON_INVALID_STATE);
                }
                match state.pool_configs.remove(name) {
                    true => Reply::status(code::SUCCESS),
                    false => Reply::status(code::POOL_LEDGER_NOT_CREATED),
                }
            }
            Operation::CreateWallet => {
                if arg_str(args, 0).is_none() {
                    return missing_param(0);
                }
                let Some(name) = arg_str(args, 1) else { return missing_param(1) };
                if arg_str(args, 2).is_some_and(|xtype| xtype != "default") {
                    return Reply::status(code::WALLET_UNKNOWN_TYPE);
                }
                if state.wallets.contains_key(name) {
                    return Reply::status(code::WALLET_ALREADY_EXISTS);
                }
                let credentials = arg_str(args, 4).map(str::to_owned);
                state.wallets.insert(name.to_owned(), WalletRecord { credentials });
                Reply::status(code::SUCCESS)
            }
            Operation::OpenWallet => {
                let Some(name) = arg_str(args, 0) else { return missing_param(0) };
                let Some(record) = state.wallets.get(name) else {
                    return Reply::status(code::WALLET_NOT_FOUND);
                };
                if record.credentials.as_deref() != arg_str(args, 2) {
                    return Reply::status(code::COMMON_INVALID_STRUCTURE);
                }
                if state.open_wallets.values().any(|open| open == name) {
                    return Reply::status(code::WALLET_ALREADY_OPENED);
                }
                let handle = self.next_handle();
                state.open_wallets.insert(handle, name.to_owned());
                Reply::handle(handle)
            }
            Operation::CloseWallet => {
                let Some(handle) = arg_int(args, 0) else { return missing_param(0) };
                match state.open_wallets.remove(&handle) {
                    Some(_) => Reply::status(code::SUCCESS),
                    None => Reply::status(code::WALLET_INVALID_HANDLE),
                }
            }
            Operation::DeleteWallet => {
                let Some(name) = arg_str(args, 0) else { return missing_param(0) };
                let Some(record) = state.wallets.get(name) else {
                    return Reply::status(code::WALLET_NOT_FOUND);
                };
                if record.credentials.as_deref() != arg_str(args, 1) {
                    return Reply::status(code::COMMON_INVALID_STRUCTURE);
                }
                if state.open_wallets.values().any(|open| open == name) {
                    return Reply::status(code::COMMON_INVALID_STATE);
                }
                state.wallets.remove(name);
                Reply::status(code::SUCCESS)
            }
            Operation::SubmitRequest => {
                let Some(pool) = arg_int(args, 0) else { return missing_param(0) };
                if !state.open_pools.contains_key(&pool) {
                    return Reply::status(code::POOL_LEDGER_INVALID_HANDLE);
                }
                let Some(request) = arg_str(args, 1).and_then(parse) else {
                    return Reply::status(code::COMMON_INVALID_STRUCTURE);
                };
                Reply::payload(json!({ "op": "REPLY", "result": request }))
            }
            Operation::SignAndSubmitRequest => {
                let Some(pool) = arg_int(args, 0) else { return missing_param(0) };
                let Some(wallet) = arg_int(args, 1) else { return missing_param(1) };
                let Some(did) = arg_str(args, 2) else { return missing_param(2) };
                if !state.open_pools.contains_key(&pool) {
                    return Reply::status(code::POOL_LEDGER_INVALID_HANDLE);
                }
                if !state.open_wallets.contains_key(&wallet) {
                    return Reply::status(code::WALLET_INVALID_HANDLE);
                }
                let Some(request) = arg_str(args, 3).and_then(parse) else {
                    return Reply::status(code::COMMON_INVALID_STRUCTURE);
                };
                Reply::payload(json!({
                    "op": "REPLY",
                    "result": {
                        "identifier": did,
                        "request": request,
                        "signature": "mock-signature",
                    },
                }))
            }
            Operation::BuildGetDdoRequest
            | Operation::BuildNymRequest
            | Operation::BuildAttribRequest
            | Operation::BuildGetAttribRequest
            | Operation::BuildGetNymRequest
            | Operation::BuildSchemaRequest
            | Operation::BuildGetSchemaRequest
            | Operation::BuildNodeRequest
            | Operation::BuildGetTxnRequest => {
                drop(state);
                self.build_request(operation, args)
            }
        }
    }

    fn build_request(&self, operation: Operation, args: &[Arg]) -> Reply {
        let Some(submitter) = arg_str(args, 0) else { return missing_param(0) };

        let (txn_type, fields) = match operation {
            Operation::BuildGetTxnRequest => {
                let Some(seq_no) = arg_int(args, 1) else { return missing_param(1) };
                ("3", json!({ "data": seq_no }))
            }
            _ => {
                let Some(target) = arg_str(args, 1) else { return missing_param(1) };
                let rest: Vec<Value> = args[2..]
                    .iter()
                    .map(|arg| match arg {
                        Arg::Str(s) => json!(s),
                        Arg::Int(i) => json!(i),
                        Arg::Bool(b) => json!(b),
                    })
                    .collect();
                let txn_type = match operation {
                    Operation::BuildNymRequest => "1",
                    Operation::BuildAttribRequest => "100",
                    Operation::BuildSchemaRequest => "101",
                    Operation::BuildGetAttribRequest => "104",
                    Operation::BuildGetNymRequest => "105",
                    Operation::BuildGetSchemaRequest => "107",
                    Operation::BuildGetDdoRequest => "120",
                    _ => "0",
                };
                (txn_type, json!({ "dest": target, "args": rest }))
            }
        };

        let req_id = self.next_req_id.fetch_add(1, Ordering::Relaxed);
        Reply::payload(json!({
            "identifier": submitter,
            "reqId": req_id,
            "operation": { "type": txn_type, "fields": fields },
        }))
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MockEngine {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn invoke(&self, invocation: Invocation<'_>, callback: Callback) -> Result<i32, EngineError> {
        lock(&self.calls).push(invocation.operation);
        let fault = lock(&self.faults).pop_front();

        match fault {
            Some(Fault::Refuse) => return Err(EngineError("dispatch refused".into())),
            Some(Fault::ImmediateStatus(status)) => return Ok(status),
            _ => {}
        }

        let reply = self.execute(invocation.operation, invocation.args);
        if fault == Some(Fault::DropCallback) {
            return Ok(code::SUCCESS);
        }

        let job = Job {
            callback,
            command: invocation.command,
            reply,
            delay: match fault {
                Some(Fault::Delay(delay)) => Some(delay),
                _ => None,
            },
            duplicate: match fault {
                Some(Fault::DuplicateCallback { second_status }) => Some(second_status),
                _ => None,
            },
        };

        self.worker
            .send(job)
            .map_err(|_| EngineError("engine worker stopped".into()))?;
        Ok(code::SUCCESS)
    }
}
