//! Isolated execution of LLM-authored code fragments.
//!
//! The child side is an embedded JavaScript engine running on a dedicated
//! thread with no ambient authority: no filesystem, no network, no
//! subprocesses, only the documented seven-name API. Host and child
//! communicate exclusively over message channels; `callLlm` and `gitLog`
//! requests carry correlation ids and are answered by injected effects on
//! the host side, with `gitLog` arguments passing the sanitizer first.
//!
//! A timed-out `execute` fails that call only. The sandbox stays alive and
//! keeps its global state, so the driving loop can feed the failure back to
//! the model and try again.

mod child;
mod gitargs;

pub use gitargs::{ALLOWED_FLAGS, DANGEROUS_CHARS, MAX_LOG_COUNT, sanitize_git_log_args};

use std::collections::HashSet;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::index::TrailerIndex;
use crate::llm::ChatMessage;
use crate::models::WorkingMemory;
use crate::{Error, Result};

/// Default per-`execute` wall-clock timeout.
pub const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait for the child to come up.
const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Plain-data environment the child receives at init.
#[derive(Debug, Clone)]
pub struct SandboxEnv {
    /// The trailer index the `query` API runs against.
    pub index: TrailerIndex,
    /// Session working memory, if any.
    pub working_memory: Option<WorkingMemory>,
    /// Stored scope keys, for the `scopeKeys` global.
    pub scope_keys: Vec<String>,
}

impl SandboxEnv {
    /// Builds an environment from an index and optional working memory.
    #[must_use]
    pub fn new(index: TrailerIndex, working_memory: Option<WorkingMemory>) -> Self {
        let scope_keys = index.scope_keys();
        Self {
            index,
            working_memory,
            scope_keys,
        }
    }
}

/// Result of one `execute` call.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutput {
    /// Captured `console.log` output.
    pub stdout: String,
    /// The fragment's completion value rendered as text, if any.
    pub return_value: Option<String>,
    /// Stringified exception message, or `None` on success.
    pub error: Option<String>,
    /// Whether `done()` was called.
    pub done: bool,
    /// The answer passed to `done()`.
    pub done_answer: Option<String>,
    /// Number of `callLlm` requests served during this execution.
    pub sub_calls: usize,
}

/// Effect invoked for the child's `callLlm` requests.
pub type LlmEffect = Box<dyn FnMut(&[ChatMessage]) -> Result<String>>;

/// Effect invoked for the child's `gitLog` requests, after sanitization.
pub type GitLogEffect = Box<dyn FnMut(&[String]) -> Result<String>>;

/// Host → child control messages.
pub(crate) enum ControlMessage {
    Init(Box<SandboxEnv>),
    Execute { seq: u64, code: String },
    Shutdown,
}

/// Host → child request responses. Errors cross as strings and surface as
/// exceptions inside the fragment.
pub(crate) enum ResponseMessage {
    Llm {
        id: u64,
        result: std::result::Result<String, String>,
    },
    GitLog {
        id: u64,
        result: std::result::Result<String, String>,
    },
}

/// Child → host messages.
pub(crate) enum ChildMessage {
    Ready,
    LlmRequest {
        id: u64,
        messages: Vec<ChatMessage>,
    },
    GitLogRequest {
        id: u64,
        args: Vec<String>,
    },
    Result {
        seq: u64,
        output: ExecutionOutput,
    },
}

/// Host handle to one sandbox instance.
pub struct Sandbox {
    control_tx: Sender<ControlMessage>,
    response_tx: Sender<ResponseMessage>,
    child_rx: Receiver<ChildMessage>,
    llm: LlmEffect,
    git_log: GitLogEffect,
    timeout: Duration,
    next_seq: u64,
    stale_seqs: HashSet<u64>,
    terminated: bool,
    _handle: JoinHandle<()>,
}

impl Sandbox {
    /// Spawns the child, sends it the environment, and waits for `ready`.
    ///
    /// # Errors
    ///
    /// Fails when the child cannot be spawned or does not come up.
    pub fn new(env: SandboxEnv, llm: LlmEffect, git_log: GitLogEffect) -> Result<Self> {
        let (control_tx, control_rx) = channel::<ControlMessage>();
        let (response_tx, response_rx) = channel::<ResponseMessage>();
        let (child_tx, child_rx) = channel::<ChildMessage>();

        let handle = std::thread::Builder::new()
            .name("gitrecall-sandbox".to_string())
            .spawn(move || child::child_main(&control_rx, response_rx, &child_tx))
            .map_err(|e| Error::OperationFailed {
                operation: "spawn_sandbox".to_string(),
                cause: e.to_string(),
            })?;

        control_tx
            .send(ControlMessage::Init(Box::new(env)))
            .map_err(|_| sandbox_gone())?;

        match child_rx.recv_timeout(READY_TIMEOUT) {
            Ok(ChildMessage::Ready) => {},
            Ok(_) => {
                return Err(Error::OperationFailed {
                    operation: "sandbox_init".to_string(),
                    cause: "unexpected message before ready".to_string(),
                });
            },
            Err(e) => {
                return Err(Error::OperationFailed {
                    operation: "sandbox_init".to_string(),
                    cause: e.to_string(),
                });
            },
        }

        Ok(Self {
            control_tx,
            response_tx,
            child_rx,
            llm,
            git_log,
            timeout: DEFAULT_EXECUTE_TIMEOUT,
            next_seq: 0,
            stale_seqs: HashSet::new(),
            terminated: false,
            _handle: handle,
        })
    }

    /// Overrides the per-execute timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Executes one code fragment, serving its API requests until it posts
    /// a result or the timeout expires.
    ///
    /// Only one execution may be outstanding at a time; execution errors
    /// inside the fragment are data (`output.error`), not an `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SandboxExecutionTimedOut`] on deadline expiry
    /// (the sandbox itself survives), or an operation failure when the
    /// child is gone.
    pub fn execute(&mut self, code: &str) -> Result<ExecutionOutput> {
        if self.terminated {
            return Err(Error::OperationFailed {
                operation: "sandbox_execute".to_string(),
                cause: "sandbox already terminated".to_string(),
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.control_tx
            .send(ControlMessage::Execute {
                seq,
                code: code.to_string(),
            })
            .map_err(|_| sandbox_gone())?;

        let deadline = Instant::now() + self.timeout;
        let mut sub_calls = 0_usize;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.stale_seqs.insert(seq);
                tracing::warn!(seq, "sandbox execution timed out");
                return Err(Error::SandboxExecutionTimedOut);
            }

            match self.child_rx.recv_timeout(remaining) {
                Ok(ChildMessage::LlmRequest { id, messages }) => {
                    sub_calls += 1;
                    let result = (self.llm)(&messages).map_err(|e| e.to_string());
                    self.response_tx
                        .send(ResponseMessage::Llm { id, result })
                        .map_err(|_| sandbox_gone())?;
                },
                Ok(ChildMessage::GitLogRequest { id, args }) => {
                    let result = sanitize_git_log_args(&args)
                        .and_then(|clean| (self.git_log)(&clean))
                        .map_err(|e| e.to_string());
                    self.response_tx
                        .send(ResponseMessage::GitLog { id, result })
                        .map_err(|_| sandbox_gone())?;
                },
                Ok(ChildMessage::Result { seq: result_seq, mut output }) => {
                    if result_seq == seq {
                        output.sub_calls = sub_calls;
                        return Ok(output);
                    }
                    // a late result from an execution that already timed out
                    if self.stale_seqs.remove(&result_seq) {
                        tracing::debug!(seq = result_seq, "dropping stale sandbox result");
                    }
                },
                Ok(ChildMessage::Ready) => {},
                Err(RecvTimeoutError::Timeout) => {
                    self.stale_seqs.insert(seq);
                    tracing::warn!(seq, "sandbox execution timed out");
                    return Err(Error::SandboxExecutionTimedOut);
                },
                Err(RecvTimeoutError::Disconnected) => return Err(sandbox_gone()),
            }
        }
    }

    /// Shuts the child down. Idempotent; returns whether this call
    /// performed the termination.
    pub fn terminate(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        self.terminated = true;
        let _ = self.control_tx.send(ControlMessage::Shutdown);
        true
    }

    /// Whether [`Sandbox::terminate`] has run.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn sandbox_gone() -> Error {
    Error::OperationFailed {
        operation: "sandbox_execute".to_string(),
        cause: "sandbox channel closed".to_string(),
    }
}
