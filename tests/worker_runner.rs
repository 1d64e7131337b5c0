use growthgate::config::WorkerConfig;
use growthgate::worker::{extract_payload, ProcessRunner, WorkerError, WorkerRunner};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::tempdir;

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

fn runner_for(dir: &Path, timeout_secs: u64) -> ProcessRunner {
    ProcessRunner::new(&WorkerConfig {
        interpreter: "/bin/sh".to_string(),
        script_dir: dir.to_path_buf(),
        growth_script: "model.sh".to_string(),
        chat_script: "chat.sh".to_string(),
        timeout_secs,
        max_concurrent: 2,
    })
}

#[test]
fn captures_noisy_output_and_payload_survives_extraction() {
    let dir = tempdir().expect("tempdir");
    write_script(
        &dir.path().join("model.sh"),
        "#!/bin/sh\necho 'loading model'\necho '{\"reply\":\"ok\"}'\necho 'shutting down'\n",
    );

    let runner = runner_for(dir.path(), 5);
    let outcome = runner.run("model.sh", "{}").expect("success");
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.stdout.contains("loading model"));

    let payload = extract_payload(&outcome.stdout).expect("payload");
    assert_eq!(payload["reply"], "ok");
}

#[test]
fn writes_request_to_stdin_exactly_once() {
    let dir = tempdir().expect("tempdir");
    write_script(&dir.path().join("model.sh"), "#!/bin/sh\ncat\n");

    let runner = runner_for(dir.path(), 5);
    let outcome = runner
        .run("model.sh", "{\"Sex\":[\"M\"]}")
        .expect("success");
    assert_eq!(outcome.stdout, "{\"Sex\":[\"M\"]}");
}

#[test]
fn nonzero_exit_preserves_captured_output() {
    let dir = tempdir().expect("tempdir");
    write_script(
        &dir.path().join("model.sh"),
        "#!/bin/sh\necho 'partial diagnostics'\necho 'model file missing' >&2\nexit 3\n",
    );

    let runner = runner_for(dir.path(), 5);
    match runner.run("model.sh", "{}") {
        Err(WorkerError::NonZeroExit {
            exit_code,
            stdout,
            stderr,
        }) => {
            assert_eq!(exit_code, 3);
            assert!(stdout.contains("partial diagnostics"));
            assert!(stderr.contains("model file missing"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn hung_worker_is_killed_at_the_deadline() {
    let dir = tempdir().expect("tempdir");
    write_script(&dir.path().join("model.sh"), "#!/bin/sh\nsleep 30\n");

    let runner = runner_for(dir.path(), 1);
    match runner.run("model.sh", "{}") {
        Err(WorkerError::Timeout { timeout_ms }) => assert_eq!(timeout_ms, 1000),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn missing_interpreter_is_a_spawn_error() {
    let dir = tempdir().expect("tempdir");
    write_script(&dir.path().join("model.sh"), "#!/bin/sh\necho hi\n");

    let runner = ProcessRunner::new(&WorkerConfig {
        interpreter: "/nonexistent/python3".to_string(),
        script_dir: dir.path().to_path_buf(),
        growth_script: "model.sh".to_string(),
        chat_script: "chat.sh".to_string(),
        timeout_secs: 5,
        max_concurrent: 2,
    });
    match runner.run("model.sh", "{}") {
        Err(WorkerError::Spawn { binary }) => assert_eq!(binary, "/nonexistent/python3"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn worker_that_ignores_stdin_still_succeeds() {
    let dir = tempdir().expect("tempdir");
    write_script(
        &dir.path().join("model.sh"),
        "#!/bin/sh\necho '{\"success\":true}'\n",
    );

    let runner = runner_for(dir.path(), 5);
    let outcome = runner.run("model.sh", "{}").expect("success");
    assert!(outcome.stdout.contains("success"));
}
