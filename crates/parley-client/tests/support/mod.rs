//! Shared test fixtures: a fake handshake and an in-process echo service.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, EnvFilter};

use parley_client::transport::{ConversationSetup, EnvelopeReceiver, MessageTransport};
use parley_core::error::Result;
use parley_core::{ConversationParams, Envelope};

pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Hands out `C1`, `C2`, ... with a fixed client timeout.
pub struct FakeSetup {
    next: AtomicUsize,
    timeout_ms: u64,
    queue_size: usize,
}

impl FakeSetup {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            next: AtomicUsize::new(1),
            timeout_ms,
            queue_size: 4,
        }
    }
}

#[async_trait]
impl ConversationSetup for FakeSetup {
    async fn start_conversation(&self, _service_type: &str) -> Result<ConversationParams> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(ConversationParams::new(format!("C{n}"), self.timeout_ms, self.queue_size))
    }
}

/// What the echo service observed from clients.
#[derive(Default)]
pub struct ServerLog {
    pub received: Mutex<Vec<(String, u64)>>,
    pub terminated: Mutex<Vec<String>>,
    pub client_errors: Mutex<Vec<(String, String)>>,
}

pub struct EchoServer {
    pub log: Arc<ServerLog>,
    task: JoinHandle<()>,
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Echo every payload back, preceded by `progress_steps` progress envelopes.
/// Replies are sent twice to exercise duplicate suppression; client-side
/// duplicates are suppressed here by sequence number.
pub fn spawn_echo_server(
    mut rx: EnvelopeReceiver,
    reply_to: Arc<dyn MessageTransport>,
    progress_steps: usize,
) -> EchoServer {
    let log = Arc::new(ServerLog::default());
    let server_log = Arc::clone(&log);
    let task = tokio::spawn(async move {
        let mut highest: HashMap<String, u64> = HashMap::new();
        let mut outgoing: HashMap<String, u64> = HashMap::new();
        while let Some(env) = rx.recv().await {
            let id = env.conversation_id().to_string();
            if highest.get(&id).is_some_and(|h| env.seq() <= *h) {
                continue;
            }
            highest.insert(id.clone(), env.seq());
            server_log.received.lock().unwrap().push((id.clone(), env.seq()));

            if env.is_terminate() {
                server_log.terminated.lock().unwrap().push(id);
                continue;
            }
            if env.is_exception() {
                let text = env.exception_description().unwrap_or_default();
                server_log.client_errors.lock().unwrap().push((id, text));
                continue;
            }

            let next = outgoing.entry(id.clone()).or_insert(0);
            let mut replies = Vec::new();
            for step in 0..progress_steps {
                replies.push(Envelope::progress(&id, *next, format!("step {step}")));
                *next += 1;
            }
            let reply = match env.into_payload() {
                Some(p) => Envelope::message(&id, *next, p),
                None => Envelope::empty(&id, *next),
            };
            replies.push(reply);
            *next += 1;

            for r in replies {
                let _ = reply_to.send(r.clone());
                let _ = reply_to.send(r);
            }
        }
    });
    EchoServer { log, task }
}
