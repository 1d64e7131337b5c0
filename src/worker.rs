use std::path::Path;

pub mod extract;
pub mod runner;

pub use extract::{extract_payload, BraceSpanExtractor, PayloadExtractor};
pub use runner::ProcessRunner;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker script missing or interpreter not found: {binary}")]
    Spawn { binary: String },
    #[error("worker exited with code {exit_code}")]
    NonZeroExit {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    #[error("worker timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("no payload found in worker output")]
    NoPayloadFound,
    #[error("worker payload failed to decode: {reason}")]
    MalformedPayload { reason: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Full captured output of one worker process run to completion.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// One-shot worker transport. The default implementation spawns a fresh
/// process per call; alternate transports (persistent worker, RPC) or a
/// canned-output fake for tests substitute here without touching the
/// orchestrator.
pub trait WorkerRunner: Send + Sync {
    /// Starts the named worker script, writes `input` to its stdin once,
    /// and drains output until the process terminates.
    fn run(&self, script: &str, input: &str) -> Result<WorkerOutcome, WorkerError>;
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> WorkerError {
    WorkerError::Io {
        path: path.display().to_string(),
        source,
    }
}
