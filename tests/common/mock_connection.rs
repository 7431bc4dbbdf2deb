//! Mock lock server for testing sessions, pools and the coordinator.
//!
//! Every [`MockConnector`] clone talks to the same in-memory "server", which
//! keeps a lock table keyed by name and records each call it sees. Replies can
//! be scripted per operation; unscripted calls follow GET_LOCK/RELEASE_LOCK
//! semantics without ever blocking.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use db_mutex_core::error::{MutexError, MutexResult};
use db_mutex_core::timeout::WaitTimeout;
use db_mutex_core::traits::{LockConnector, NamedLockConnection, NamedMutex};

/// A call observed by the mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(usize),
    GetLock { conn: usize, name: String, wait: i64 },
    ReleaseLock { conn: usize, name: String },
    Close(usize),
    Disconnect(usize),
}

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Scalar(Option<i64>),
    Fail(String),
}

#[derive(Default)]
struct Server {
    next_id: usize,
    held: HashMap<String, usize>,
    get_lock_replies: VecDeque<Reply>,
    release_lock_replies: VecDeque<Reply>,
    fail_connects: usize,
    get_lock_delay: Duration,
    calls: Vec<Call>,
}

impl Server {
    fn drop_locks_of(&mut self, conn: usize) {
        self.held.retain(|_, owner| *owner != conn);
    }
}

fn reply(reply: Reply) -> MutexResult<Option<i64>> {
    match reply {
        Reply::Scalar(value) => Ok(value),
        Reply::Fail(message) => Err(MutexError::transport(std::io::Error::other(message))),
    }
}

/// Connector handing out [`MockConnection`]s to a shared mock server.
#[derive(Clone, Default)]
pub struct MockConnector {
    server: Arc<Mutex<Server>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_get_lock(&self, value: Option<i64>) {
        self.server.lock().unwrap().get_lock_replies.push_back(Reply::Scalar(value));
    }

    pub fn push_get_lock_error(&self, message: &str) {
        self.server
            .lock()
            .unwrap()
            .get_lock_replies
            .push_back(Reply::Fail(message.to_string()));
    }

    pub fn push_release_lock(&self, value: Option<i64>) {
        self.server
            .lock()
            .unwrap()
            .release_lock_replies
            .push_back(Reply::Scalar(value));
    }

    pub fn push_release_lock_error(&self, message: &str) {
        self.server
            .lock()
            .unwrap()
            .release_lock_replies
            .push_back(Reply::Fail(message.to_string()));
    }

    /// Delays every GET_LOCK answer by `delay`.
    pub fn delay_get_lock(&self, delay: Duration) {
        self.server.lock().unwrap().get_lock_delay = delay;
    }

    /// Makes the next `count` connects fail.
    pub fn fail_connects(&self, count: usize) {
        self.server.lock().unwrap().fail_connects = count;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.server.lock().unwrap().calls.clone()
    }

    pub fn connects(&self) -> usize {
        self.count(|call| matches!(call, Call::Connect(_)))
    }

    pub fn get_lock_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::GetLock { .. }))
    }

    pub fn release_lock_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::ReleaseLock { .. }))
    }

    /// Ids of connections closed gracefully.
    pub fn closed(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Close(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Connection currently holding `name` on the server, if any.
    pub fn holder(&self, name: &str) -> Option<usize> {
        self.server.lock().unwrap().held.get(name).copied()
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.server
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }
}

impl LockConnector for MockConnector {
    type Connection = MockConnection;

    const BACKEND: &'static str = "mock";

    async fn connect(&self) -> MutexResult<MockConnection> {
        let mut server = self.server.lock().unwrap();
        if server.fail_connects > 0 {
            server.fail_connects -= 1;
            return Err(MutexError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        server.next_id += 1;
        let id = server.next_id;
        server.calls.push(Call::Connect(id));
        Ok(MockConnection {
            id,
            server: Arc::clone(&self.server),
            closed: false,
        })
    }
}

/// One session on the mock server.
pub struct MockConnection {
    id: usize,
    server: Arc<Mutex<Server>>,
    closed: bool,
}

impl MockConnection {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl NamedLockConnection for MockConnection {
    async fn get_lock(&mut self, name: &str, wait: WaitTimeout) -> MutexResult<Option<i64>> {
        let delay = self.server.lock().unwrap().get_lock_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut server = self.server.lock().unwrap();
        server.calls.push(Call::GetLock {
            conn: self.id,
            name: name.to_string(),
            wait: wait.as_secs(),
        });
        if let Some(scripted) = server.get_lock_replies.pop_front() {
            return reply(scripted);
        }
        match server.held.get(name) {
            Some(owner) if *owner != self.id => Ok(Some(0)),
            _ => {
                server.held.insert(name.to_string(), self.id);
                Ok(Some(1))
            }
        }
    }

    async fn release_lock(&mut self, name: &str) -> MutexResult<Option<i64>> {
        let mut server = self.server.lock().unwrap();
        server.calls.push(Call::ReleaseLock {
            conn: self.id,
            name: name.to_string(),
        });
        if let Some(scripted) = server.release_lock_replies.pop_front() {
            return reply(scripted);
        }
        match server.held.get(name) {
            Some(owner) if *owner == self.id => {
                server.held.remove(name);
                Ok(Some(1))
            }
            Some(_) => Ok(Some(0)),
            None => Ok(None),
        }
    }

    async fn close(mut self) -> MutexResult<()> {
        self.closed = true;
        let mut server = self.server.lock().unwrap();
        server.calls.push(Call::Close(self.id));
        server.drop_locks_of(self.id);
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Ok(mut server) = self.server.lock() {
            server.calls.push(Call::Disconnect(self.id));
            server.drop_locks_of(self.id);
        }
    }
}

/// A call observed by [`RecordingMutex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutexCall {
    Lock(Duration),
    Unlock,
}

/// A [`NamedMutex`] that answers with fixed results and records every call.
pub struct RecordingMutex {
    name: String,
    held: bool,
    lock_result: bool,
    unlock_result: bool,
    pub calls: Vec<MutexCall>,
}

impl RecordingMutex {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            held: false,
            lock_result: true,
            unlock_result: true,
            calls: Vec::new(),
        }
    }

    pub fn lock_returns(mut self, result: bool) -> Self {
        self.lock_result = result;
        self
    }

    pub fn unlock_returns(mut self, result: bool) -> Self {
        self.unlock_result = result;
        self
    }
}

impl NamedMutex for RecordingMutex {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_locked(&self) -> bool {
        self.held
    }

    async fn lock(&mut self, wait: Duration) -> MutexResult<bool> {
        self.calls.push(MutexCall::Lock(wait));
        self.held = self.lock_result;
        Ok(self.lock_result)
    }

    async fn unlock(&mut self) -> MutexResult<bool> {
        self.calls.push(MutexCall::Unlock);
        self.held = false;
        Ok(self.unlock_result)
    }
}
