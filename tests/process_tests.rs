//! Tests against the real `workshop-api` binary.
//!
//! These check what only a separate process can show: the exit status the
//! orchestrator observes after a crash and after SIGTERM.
//!
//! Run with: cargo test --test process_tests
#![cfg(unix)]

use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;

/// Owns one spawned server process; kills it on drop if it is still running.
struct ServerProcess {
    child: Child,
    port: u16,
    _data_dir: tempfile::TempDir,
}

impl ServerProcess {
    fn start() -> Self {
        let data_dir = tempfile::tempdir().expect("temp data dir");
        let port = Self::free_port();

        let child = Command::new(env!("CARGO_BIN_EXE_workshop-api"))
            .env_clear()
            .env("HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .env("DATA_DIR", data_dir.path())
            .env("HOSTNAME", "process-test")
            .env("RUST_LOG", "workshop_api=warn")
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .expect("Failed to start server");

        let server = Self {
            child,
            port,
            _data_dir: data_dir,
        };
        server.wait_for_ready();
        server
    }

    /// Ask the OS for an unused port, then release it for the server.
    fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr").port()
    }

    fn wait_for_ready(&self) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if TcpStream::connect(("127.0.0.1", self.port)).is_ok() {
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        panic!("Server did not start listening on port {}", self.port);
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    fn send_sigterm(&self) {
        let status = Command::new("kill")
            .args(["-TERM", &self.child.id().to_string()])
            .status()
            .expect("Failed to run kill");
        assert!(status.success());
    }

    /// Poll for exit without blocking the async test runtime.
    async fn wait_for_exit(&mut self, timeout: Duration) -> ExitStatus {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait().expect("try_wait") {
                return status;
            }
            assert!(
                Instant::now() < deadline,
                "Server still running after {:?}",
                timeout
            );
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[tokio::test]
async fn test_crash_exits_with_status_one() {
    let mut server = ServerProcess::start();
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/crash"))
        .send()
        .await
        .expect("crash request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["pod"], "process-test");

    let status = server.wait_for_exit(Duration::from_secs(5)).await;
    assert_eq!(status.code(), Some(1));
}

#[tokio::test]
async fn test_sigterm_exits_cleanly_after_in_flight_work() {
    let mut server = ServerProcess::start();
    let client = reqwest::Client::new();

    let work = {
        let url = server.url("/api/work?ms=400");
        tokio::spawn(async move { client.post(url).send().await.map(|r| r.status()) })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    server.send_sigterm();

    let status = work.await.unwrap().expect("in-flight request completed");
    assert_eq!(status, 200);

    let exit = server.wait_for_exit(Duration::from_secs(10)).await;
    assert_eq!(exit.code(), Some(0));
}

#[tokio::test]
async fn test_sigterm_when_idle_exits_cleanly() {
    let mut server = ServerProcess::start();

    let health = reqwest::get(server.url("/healthz")).await.expect("health request");
    assert_eq!(health.status(), 200);

    server.send_sigterm();
    let exit = server.wait_for_exit(Duration::from_secs(10)).await;
    assert_eq!(exit.code(), Some(0));
}
