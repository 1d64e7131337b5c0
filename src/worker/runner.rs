use crate::config::WorkerConfig;
use crate::worker::{io_error, WorkerError, WorkerOutcome, WorkerRunner};
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns one short-lived interpreter process per call. No pooling, no
/// reuse; concurrent calls produce concurrent processes, bounded by the
/// configured gate.
pub struct ProcessRunner {
    interpreter: String,
    script_dir: PathBuf,
    timeout: Duration,
    gate: ConcurrencyGate,
}

impl ProcessRunner {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            script_dir: config.script_dir.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            gate: ConcurrencyGate::new(config.max_concurrent),
        }
    }
}

impl WorkerRunner for ProcessRunner {
    fn run(&self, script: &str, input: &str) -> Result<WorkerOutcome, WorkerError> {
        let _permit = self.gate.acquire();

        let script_path = self.script_dir.join(script);
        let mut command = Command::new(&self.interpreter);
        command
            .arg(&script_path)
            .current_dir(&self.script_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(WorkerError::Spawn {
                    binary: self.interpreter.clone(),
                })
            }
            Err(err) => return Err(io_error(&script_path, err)),
        };

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io_error(&script_path, std::io::Error::other("missing stdin pipe")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io_error(&script_path, std::io::Error::other("missing stdout pipe")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io_error(&script_path, std::io::Error::other("missing stderr pipe")))?;

        // Single write, then EOF. A worker that exits before reading must not
        // fail the call here; its exit status decides below.
        if let Err(err) = stdin.write_all(input.as_bytes()) {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io_error(&script_path, err));
            }
        }
        drop(stdin);

        let stdout_reader = thread::spawn(move || {
            let mut buf = String::new();
            let mut reader = BufReader::new(stdout);
            let _ = reader.read_to_string(&mut buf);
            buf
        });
        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            let mut reader = BufReader::new(stderr);
            let _ = reader.read_to_string(&mut buf);
            buf
        });

        let start = Instant::now();
        let exit_status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        child.wait().map_err(|e| io_error(&script_path, e))?;
                        let _stdout = stdout_reader.join().unwrap_or_default();
                        let _stderr = stderr_reader.join().unwrap_or_default();
                        return Err(WorkerError::Timeout {
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                    }
                    thread::sleep(WAIT_POLL_INTERVAL);
                }
                Err(err) => return Err(io_error(&script_path, err)),
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !exit_status.success() {
            return Err(WorkerError::NonZeroExit {
                exit_code: exit_status.code().unwrap_or(-1),
                stdout,
                stderr,
            });
        }

        Ok(WorkerOutcome {
            stdout,
            stderr,
            exit_code: exit_status.code(),
        })
    }
}

/// Caps the number of live worker processes. Callers over the limit block
/// until a permit frees up.
struct ConcurrencyGate {
    limit: usize,
    active: Mutex<usize>,
    freed: Condvar,
}

impl ConcurrencyGate {
    fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            active: Mutex::new(0),
            freed: Condvar::new(),
        }
    }

    fn acquire(&self) -> GatePermit<'_> {
        let mut active = lock_active(&self.active);
        while *active >= self.limit {
            active = match self.freed.wait(active) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
        *active += 1;
        GatePermit { gate: self }
    }
}

fn lock_active(active: &Mutex<usize>) -> MutexGuard<'_, usize> {
    match active.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

struct GatePermit<'a> {
    gate: &'a ConcurrencyGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        let mut active = lock_active(&self.gate.active);
        *active = active.saturating_sub(1);
        drop(active);
        self.gate.freed.notify_one();
    }
}
