#![cfg(all(target_os = "linux", feature = "cli"))]

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::os::fd::FromRawFd;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/usio-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// The controller side of a pseudo-terminal. The daemon opens the slave path.
struct FakeBoard {
    slave_path: PathBuf,
    master: Arc<Mutex<File>>,
    _slave: File,
}

impl FakeBoard {
    fn open() -> Self {
        let mut master: libc::c_int = -1;
        let mut slave: libc::c_int = -1;
        // SAFETY: out-pointers are valid; name/termios/winsize are optional and null.
        let rc = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null(),
                std::ptr::null(),
            )
        };
        assert_eq!(rc, 0, "openpty should succeed");
        let slave_path =
            std::fs::read_link(format!("/proc/self/fd/{slave}")).expect("pty slave path");

        // SAFETY: both descriptors came from openpty and are owned from here on.
        let (master, slave) = unsafe { (File::from_raw_fd(master), File::from_raw_fd(slave)) };

        Self {
            slave_path,
            master: Arc::new(Mutex::new(master)),
            _slave: slave,
        }
    }

    /// Answer every command the daemon sends the way the controller firmware does.
    fn start_echoing(&self) {
        let reader = self
            .master
            .lock()
            .unwrap()
            .try_clone()
            .expect("master clone");
        let master = Arc::clone(&self.master);

        thread::spawn(move || {
            for line in BufReader::new(reader).lines() {
                let Ok(line) = line else { break };
                let Some(body) = line.trim().strip_prefix("$PC") else {
                    continue;
                };
                let mut fields = body.split(',');
                let sentence = fields.next().unwrap_or_default().to_string();
                let args: Vec<i64> = fields.map(|f| f.parse().unwrap_or(0)).collect();

                let reply = match sentence.as_str() {
                    "RWS" => format!("$PCSOP,{},{},{}\r\n", args[0], args[1], args[2]),
                    "RRS" => format!("$PCSOP,{},{},1\r\n", args[0], args[1]),
                    "RIP" => format!("$PCSIP,{},{},0\r\n", args[0], args[1]),
                    "WDC" => format!("$PCWDS,{},{}\r\n", args[0], args[1]),
                    _ => continue,
                };
                if master.lock().unwrap().write_all(reply.as_bytes()).is_err() {
                    break;
                }
            }
        });
    }

    fn send(&self, line: &str) {
        self.master
            .lock()
            .unwrap()
            .write_all(line.as_bytes())
            .expect("write to pty master");
    }
}

fn write_config(dir: &Path, device: &Path, extra: &str) -> (PathBuf, PathBuf) {
    let socket = dir.join("usio.sock");
    let config = dir.join("usio.conf");
    std::fs::write(
        &config,
        format!(
            "uart_dev = \"{}\"\nuart_speed = 115200\ncontrol_socket = \"{}\"\nresponse_timeout = 200\n{extra}\n",
            device.display(),
            socket.display()
        ),
    )
    .expect("config should be writable");
    (config, socket)
}

fn start_daemon(config: &Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_usio"))
        .arg("--config")
        .arg(config)
        .arg("--log-level")
        .arg("error")
        .arg("run")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("daemon should start")
}

fn wait_for_path(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        assert!(
            start.elapsed() < timeout,
            "timed out waiting for {}",
            path.display()
        );
        thread::sleep(Duration::from_millis(25));
    }
}

fn ctl(socket: &Path, words: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_usio"))
        .arg("ctl")
        .arg(socket)
        .args(words)
        .arg("--format")
        .arg("text")
        .output()
        .expect("ctl should run")
}

fn stop(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn ctl_queries_round_trip_through_the_serial_link() {
    let dir = unique_temp_dir("e2e-ctl");
    let board = FakeBoard::open();
    board.start_echoing();
    let (config, socket) = write_config(&dir, &board.slave_path, "");

    let daemon = start_daemon(&config);
    wait_for_path(&socket, Duration::from_secs(5));

    let out = ctl(&socket, &["relay_set", "3", "1"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "ok\n");

    let out = ctl(&socket, &["relay_get", "3"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout), "1\n");

    let out = ctl(&socket, &["input_get", "2"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout), "0\n");

    let out = ctl(&socket, &["wdt_on"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout), "ok\n");

    let out = ctl(&socket, &["wdt_reset"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout), "ok\n");

    let out = ctl(&socket, &["relay_flip", "1"]);
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "error: unknown command \"relay_flip\"\n"
    );

    stop(daemon);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn silent_controller_reports_operation_failure() {
    let dir = unique_temp_dir("e2e-silent");
    let board = FakeBoard::open();
    let (config, socket) = write_config(&dir, &board.slave_path, "repeat_count = 2");

    let daemon = start_daemon(&config);
    wait_for_path(&socket, Duration::from_secs(5));

    let out = ctl(&socket, &["relay_set", "1", "1"]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "can't set relay 1 state to 1 (no confirmation after 2 attempts)\n"
    );

    stop(daemon);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn controller_event_runs_action_script() {
    let dir = unique_temp_dir("e2e-event");
    let script = dir.join("on_event.sh");
    std::fs::write(&script, "#!/bin/sh\necho \"$1 $2 $3\" >> events.txt\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let board = FakeBoard::open();
    let extra = format!(
        "exec_path = \"{}\"\nexec_script = \"{}\"",
        dir.display(),
        script.display()
    );
    let (config, socket) = write_config(&dir, &board.slave_path, &extra);

    let daemon = start_daemon(&config);
    wait_for_path(&socket, Duration::from_secs(5));

    board.send("$PCAIP,0,4,1\r\n$PCASP,0\r\n");

    let events = dir.join("events.txt");
    let start = Instant::now();
    loop {
        let text = std::fs::read_to_string(&events).unwrap_or_default();
        if text.lines().count() >= 2 {
            assert_eq!(text, "io_input 4 1\nrestart 0 0\n");
            break;
        }
        assert!(start.elapsed() < Duration::from_secs(5), "events not handled: {text:?}");
        thread::sleep(Duration::from_millis(25));
    }

    stop(daemon);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn sigterm_stops_daemon_and_removes_socket() {
    let dir = unique_temp_dir("e2e-sigterm");
    let board = FakeBoard::open();
    let (config, socket) = write_config(&dir, &board.slave_path, "");

    let mut daemon = start_daemon(&config);
    wait_for_path(&socket, Duration::from_secs(5));

    // SAFETY: signalling our own child process.
    let rc = unsafe { libc::kill(daemon.id() as libc::pid_t, libc::SIGTERM) };
    assert_eq!(rc, 0);

    let status = daemon.wait().expect("daemon should exit");
    assert_eq!(status.code(), Some(0));
    assert!(!socket.exists(), "socket file should be removed on shutdown");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn check_config_rejects_zero_attempts() {
    let dir = unique_temp_dir("check-config");
    let (config, _) = write_config(&dir, Path::new("/dev/ttyS1"), "repeat_count = 0");

    let out = Command::new(env!("CARGO_BIN_EXE_usio"))
        .arg("--config")
        .arg(&config)
        .arg("check-config")
        .output()
        .expect("check-config should run");

    assert_eq!(out.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&out.stderr).contains("repeat_count"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn check_config_prints_resolved_values() {
    let dir = unique_temp_dir("check-config-ok");
    let (config, _) = write_config(&dir, Path::new("/dev/ttyS1"), "");

    let out = Command::new(env!("CARGO_BIN_EXE_usio"))
        .arg("--config")
        .arg(&config)
        .arg("check-config")
        .arg("--json")
        .output()
        .expect("check-config should run");

    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json output");
    assert_eq!(value["uart_speed"], 115200);
    assert_eq!(value["repeat_count"], 3);
    assert_eq!(value["response_timeout"], 200);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_config_fails_fast() {
    let out = Command::new(env!("CARGO_BIN_EXE_usio"))
        .arg("--config")
        .arg("/nonexistent/usio.conf")
        .arg("run")
        .output()
        .expect("run should start");

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("can't read config"));
}
