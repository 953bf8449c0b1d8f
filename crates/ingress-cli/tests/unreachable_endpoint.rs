use std::fs;
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

mod common;
use common::{ingress_command, pick_unused_port, run_with_timeout};

#[test]
fn load_test_reports_connection_errors_per_batch_size() {
    let work = tempfile::tempdir().expect("tempdir");
    let local = work.path().join("outgoing");
    fs::create_dir_all(&local).expect("local dir");
    fs::write(local.join("a.txt"), "alpha").expect("write a");
    fs::write(local.join("b.txt"), "bravo").expect("write b");
    let report = work.path().join("reports/run.tap");

    let port = pick_unused_port();
    let mut cmd = ingress_command(work.path());
    cmd.args(["--no-input", "load-test", "--host", "127.0.0.1"])
        .args(["--port", &port.to_string()])
        .args(["--username", "bronx", "--password", "secret"])
        .arg("--local-dir")
        .arg(&local)
        .args(["--remote-dir", "/ingress", "--interval", "0"])
        .args(["--batch-sizes", "1,2", "--connect-timeout", "2"])
        .arg("--report")
        .arg(&report);

    let output = run_with_timeout(cmd, Duration::from_secs(30));
    assert!(
        output.status.success(),
        "load-test failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let text = fs::read_to_string(&report).expect("read report");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5, "report:\n{text}");
    assert_eq!(lines[0], "TAP version 14");
    assert_eq!(lines[1], "# Total tests for batch size 1: 2");
    assert!(lines[2].starts_with("not ok 1 - Connection error: "), "{}", lines[2]);
    assert_eq!(lines[3], "# Total tests for batch size 2: 4");
    assert!(lines[4].starts_with("not ok 2 - Connection error: "), "{}", lines[4]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(connection failed)"), "stdout:\n{stdout}");
}

#[test]
fn fail_on_error_sets_exit_status_and_json_summary_is_printed() {
    let work = tempfile::tempdir().expect("tempdir");
    let local = work.path().join("outgoing");
    fs::create_dir_all(&local).expect("local dir");
    fs::write(local.join("a.txt"), "alpha").expect("write a");

    let port = pick_unused_port();
    let mut cmd = ingress_command(work.path());
    cmd.env("INGRESS_PASSWORD", "secret")
        .args(["--no-input", "load-test", "--host"])
        .arg(format!("127.0.0.1:{port}"))
        .args(["-u", "bronx", "--interval", "0", "-b", "1"])
        .arg("--local-dir")
        .arg(&local)
        .args(["--json", "--fail-on-error"]);

    let output = run_with_timeout(cmd, Duration::from_secs(30));
    assert!(!output.status.success());

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json summary on stdout");
    let attempts = summary["batches"][0]["attempts"]
        .as_array()
        .expect("attempts array");
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["outcome"]["status"], "connection_failed");

    // Default report path is relative to the working directory.
    assert!(work.path().join("loadtest.tap").exists());
}

#[test]
fn missing_values_fail_without_prompting() {
    let work = tempfile::tempdir().expect("tempdir");
    let mut cmd = ingress_command(work.path());
    cmd.args(["--no-input", "load-test", "--host", "127.0.0.1"]);

    let output = run_with_timeout(cmd, Duration::from_secs(30));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Username"), "stderr:\n{stderr}");
}

#[test]
fn health_check_against_closed_port_reports_failure() {
    let work = tempfile::tempdir().expect("tempdir");
    let port = pick_unused_port();
    let mut cmd = ingress_command(work.path());
    cmd.args(["--no-input", "health", "--host", "127.0.0.1"])
        .args(["--port", &port.to_string()])
        .args(["-u", "bronx", "--password", "secret"])
        .args(["--count", "1", "--no-bell", "--connect-timeout", "2"]);

    let output = run_with_timeout(cmd, Duration::from_secs(30));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("one status line");
    assert!(
        line.contains(&format!("SFTP connection to 127.0.0.1:{port} failed:")),
        "{line}"
    );
}

#[test]
fn health_check_against_silent_server_times_out() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind silent listener");
    let port = listener.local_addr().expect("listener addr").port();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => held.push(stream),
                Err(_) => break,
            }
        }
    });

    let work = tempfile::tempdir().expect("tempdir");
    let mut cmd = ingress_command(work.path());
    cmd.args(["--no-input", "health", "--host", "127.0.0.1"])
        .args(["--port", &port.to_string()])
        .args(["-u", "bronx", "--password", "secret"])
        .args(["--count", "1", "--no-bell", "--handshake-timeout", "1"]);

    let output = run_with_timeout(cmd, Duration::from_secs(30));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("one status line");
    assert!(
        line.contains(&format!("SFTP connection to 127.0.0.1:{port} failed:")),
        "{line}"
    );
}
