//! End to end: a running server persists snapshots on SIGUSR1 and keeps
//! serving, then persists once more on SIGTERM and exits.
#![cfg(unix)]

use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RData, RecordType};
use serde_json::json;
use tempfile::TempDir;

struct ServerProcess {
    child: Child,
}

impl ServerProcess {
    fn start(config: &Path) -> Self {
        let child = Command::new(env!("CARGO_BIN_EXE_dnsfun"))
            .arg("--config")
            .arg(config)
            .arg("serve")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn dnsfun");
        Self { child }
    }

    fn signal(&self, name: &str) {
        let status = Command::new("kill")
            .arg(format!("-{name}"))
            .arg(self.child.id().to_string())
            .status()
            .expect("run kill");
        assert!(status.success(), "kill -{name} failed");
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn wait_exit(&mut self, timeout: Duration) -> Option<std::process::ExitStatus> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Some(status);
            }
            sleep(Duration::from_millis(50));
        }
        None
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn free_udp_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

fn write_config(dir: &Path, port: u16, snapshot: &Path) -> PathBuf {
    let config = format!(
        r#"
[server]
address = "127.0.0.1:{port}"
domain = "dns.test"

[fx]
enabled = true
snapshot_enabled = true
snapshot_file = {snapshot}
refresh_interval_secs = 31536000
rates_url = "http://127.0.0.1:9/unreachable"
"#,
        snapshot = toml_string(&snapshot.display().to_string()),
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, config).unwrap();
    path
}

fn toml_string(s: &str) -> String {
    serde_json::to_string(s).unwrap()
}

fn seed_rates(path: &Path) {
    let rates = json!({
        "base": "USD",
        "rates": { "USD": 1.0, "INR": 80.0 },
        "fetched_at": chrono::Utc::now().to_rfc3339(),
    });
    std::fs::write(path, serde_json::to_vec(&rates).unwrap()).unwrap();
}

/// Ask `1usd-inr.fx.` and return the TXT answer, if the server replied.
fn convert(server: SocketAddr) -> Option<String> {
    let client = UdpSocket::bind("127.0.0.1:0").ok()?;
    client.set_read_timeout(Some(Duration::from_millis(200))).ok()?;

    let mut request = Message::new();
    request
        .set_id(42)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .add_query(Query::query(
            Name::from_ascii("1usd-inr.fx.").unwrap(),
            RecordType::TXT,
        ));
    client.send_to(&request.to_vec().ok()?, server).ok()?;

    let mut buf = [0u8; 4096];
    let (len, _) = client.recv_from(&mut buf).ok()?;
    let reply = Message::from_vec(&buf[..len]).ok()?;
    match reply.answers().first()?.data() {
        Some(RData::TXT(txt)) => Some(
            txt.txt_data()
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect(),
        ),
        _ => None,
    }
}

fn wait_until(timeout: Duration, mut ready: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if ready() {
            return true;
        }
        sleep(Duration::from_millis(50));
    }
    false
}

fn inr_rate(path: &Path) -> f64 {
    let bytes = std::fs::read(path).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    value["rates"]["INR"].as_f64().unwrap()
}

#[test]
fn usr1_snapshots_and_keeps_serving_then_term_snapshots_and_exits() {
    let tmp = TempDir::new().unwrap();
    let snapshot = tmp.path().join("state").join("fx.snapshot");
    std::fs::create_dir_all(snapshot.parent().unwrap()).unwrap();
    seed_rates(&snapshot);

    let port = free_udp_port();
    let config = write_config(tmp.path(), port, &snapshot);
    let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();

    let mut server = ServerProcess::start(&config);

    let mut answer = None;
    assert!(
        wait_until(Duration::from_secs(20), || {
            answer = convert(addr);
            answer.is_some()
        }),
        "server never answered"
    );
    assert_eq!(answer.as_deref(), Some("1.00 USD = 80.00 INR"));

    // Force a snapshot: the file comes back and the server stays up.
    std::fs::remove_file(&snapshot).unwrap();
    server.signal("USR1");
    assert!(
        wait_until(Duration::from_secs(10), || snapshot.exists()),
        "SIGUSR1 did not write a snapshot"
    );
    assert_eq!(inr_rate(&snapshot), 80.0);
    sleep(Duration::from_millis(200));
    assert!(server.is_running(), "SIGUSR1 must not stop the server");
    assert_eq!(convert(addr).as_deref(), Some("1.00 USD = 80.00 INR"));

    // Terminate: the final sweep completes before the process exits.
    std::fs::remove_file(&snapshot).unwrap();
    server.signal("TERM");
    let status = server
        .wait_exit(Duration::from_secs(10))
        .expect("server exits after SIGTERM");
    assert!(status.success(), "unexpected exit status {status:?}");
    assert!(snapshot.exists(), "SIGTERM sweep did not write a snapshot");
    assert_eq!(inr_rate(&snapshot), 80.0);
    assert!(!snapshot.with_file_name("fx.snapshot.tmp").exists());
}
