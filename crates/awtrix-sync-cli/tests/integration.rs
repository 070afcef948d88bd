#![allow(deprecated)]
use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use tempfile::TempDir;

fn awtrix_sync(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("awtrix-sync").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("AWTRIX_IP")
        .env_remove("AWTRIX_SYNC_CONFIG")
        .env_remove("AWTRIX_STATE_DIR")
        .env_remove("AWTRIX_APPS_DIR")
        .env_remove("PRODUCTIVE_API_KEY")
        .env_remove("PRODUCTIVE_ORG_ID")
        .env("RUST_LOG", "warn");
    cmd
}

fn write_app(dir: &TempDir, file: &str, body: &str) {
    let apps = dir.path().join("apps");
    std::fs::create_dir_all(&apps).unwrap();
    std::fs::write(apps.join(file), body).unwrap();
}

const HELLO: &str = r##"{"name":"Hello","slides":[{"text":"Hi","duration":5,"color":"#FFFFFF"}]}"##;

// ---------------------------------------------------------------------------
// Startup validation
// ---------------------------------------------------------------------------

#[test]
fn missing_device_address_exits_with_code_1() {
    let dir = TempDir::new().unwrap();
    awtrix_sync(&dir)
        .arg("--once")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("device address is missing"));
}

#[test]
fn unreadable_config_file_exits_with_code_1() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("awtrix-sync.yaml"), "device: [oops").unwrap();
    awtrix_sync(&dir)
        .args(["--once", "--device", "127.0.0.1:1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn json_requires_once() {
    let dir = TempDir::new().unwrap();
    awtrix_sync(&dir)
        .args(["--json", "--device", "127.0.0.1:1"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// One-shot cycles
// ---------------------------------------------------------------------------

#[test]
fn once_publishes_apps_and_commits_known_units() {
    let dir = TempDir::new().unwrap();
    write_app(&dir, "hello.json", HELLO);

    let mut server = mockito::Server::new();
    let publish = server
        .mock("POST", "/api/custom")
        .match_query(Matcher::UrlEncoded("name".into(), "Hello".into()))
        .match_body(Matcher::JsonString(
            r##"[{"text":"Hi","duration":5,"color":"#FFFFFF","noScroll":false}]"##.into(),
        ))
        .with_status(200)
        .create();

    let output = awtrix_sync(&dir)
        .args(["--once", "--json", "--device", server.host_with_port().as_str()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["published"], serde_json::json!(["Hello"]));
    assert_eq!(report["failures"], serde_json::json!([]));
    publish.assert();

    let known = std::fs::read_to_string(dir.path().join("known_apps.json")).unwrap();
    let known: Vec<String> = serde_json::from_str(&known).unwrap();
    assert_eq!(known, vec!["Hello"]);
}

#[test]
fn once_deletes_units_that_disappeared() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("apps")).unwrap();
    std::fs::write(dir.path().join("known_apps.json"), r#"["Gone"]"#).unwrap();

    let mut server = mockito::Server::new();
    let delete = server
        .mock("POST", "/api/custom")
        .match_query(Matcher::UrlEncoded("name".into(), "Gone".into()))
        .match_body("")
        .with_status(200)
        .create();

    awtrix_sync(&dir)
        .args(["--once", "--device", server.host_with_port().as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gone").and(predicate::str::contains("removed")));
    delete.assert();

    let known = std::fs::read_to_string(dir.path().join("known_apps.json")).unwrap();
    assert_eq!(serde_json::from_str::<Vec<String>>(&known).unwrap(), Vec::<String>::new());
}

#[test]
fn once_buffers_payload_when_device_refuses() {
    let dir = TempDir::new().unwrap();
    write_app(&dir, "hello.json", HELLO);

    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/custom")
        .match_query(Matcher::Any)
        .with_status(500)
        .create();

    awtrix_sync(&dir)
        .args(["--once", "--device", server.host_with_port().as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("publish failed"))
        .stdout(predicate::str::contains("Pending payloads: 1"));

    let pending = std::fs::read_to_string(dir.path().join("awtrix_pending_data.json")).unwrap();
    let pending: serde_json::Value = serde_json::from_str(&pending).unwrap();
    assert_eq!(pending[0]["unit"], "Hello");
}

#[test]
fn state_dir_flag_relocates_state_files() {
    let dir = TempDir::new().unwrap();
    write_app(&dir, "hello.json", HELLO);

    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/custom")
        .match_query(Matcher::Any)
        .with_status(200)
        .create();

    awtrix_sync(&dir)
        .args([
            "--once",
            "--device",
            server.host_with_port().as_str(),
            "--state-dir",
            "state",
        ])
        .assert()
        .success();

    assert!(dir.path().join("state/known_apps.json").exists());
    assert!(!dir.path().join("known_apps.json").exists());
}

#[test]
fn device_can_come_from_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("apps")).unwrap();

    let server = mockito::Server::new();
    std::fs::write(
        dir.path().join("awtrix-sync.yaml"),
        format!("device:\n  address: {}\n", server.host_with_port()),
    )
    .unwrap();

    awtrix_sync(&dir)
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do."));
}
