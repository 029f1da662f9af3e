use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn transcribe_writes_template_and_updates_ledger() {
    let workdir = tempdir().expect("Creating temp dir failed");
    let output = workdir.path().join("transcripts");
    let ledger = workdir.path().join("raw").join("sources.json");
    let url = "https://play.goconsensus.com/a1b2c3";

    let mut cmd = Command::cargo_bin("plm-bridge").expect("Binary exists");
    cmd.arg("transcribe")
        .arg("--url")
        .arg(url)
        .arg("--output")
        .arg(&output)
        .arg("--update-sources")
        .arg("--sources")
        .arg(&ledger);

    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("Transcript template saved")
                .and(predicate::str::contains("Platform: consensus"))
                .and(predicate::str::contains("Updated sources ledger")),
        );

    let written: Vec<_> = std::fs::read_dir(&output)
        .expect("Output dir created")
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("a1b2c3_") && name.ends_with(".md"), "unexpected name {name}");

    let ledger: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&ledger).unwrap()).unwrap();
    assert_eq!(ledger["videos"][0]["url"], url);
    assert_eq!(ledger["videos"][0]["status"], "transcribed");
    assert_eq!(ledger["metadata"]["processed"], 1);
}

#[test]
fn transcribe_without_update_flag_leaves_ledger_alone() {
    let workdir = tempdir().unwrap();
    let ledger = workdir.path().join("sources.json");

    Command::cargo_bin("plm-bridge")
        .unwrap()
        .args(["transcribe", "--url", "https://vimeo.com/12345", "--output"])
        .arg(workdir.path().join("out"))
        .arg("--sources")
        .arg(&ledger)
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform: unknown"));

    assert!(!ledger.exists());
}

#[test]
fn build_with_missing_plan_reports_read_failure() {
    Command::cargo_bin("plm-bridge")
        .unwrap()
        .args(["build", "--plan", "/no/such/plan.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read plan file"));
}

#[test]
fn build_with_invalid_plan_reports_parse_failure() {
    let plan = NamedTempFile::new().expect("Creating temp plan failed");
    write(plan.path(), b"components: [:::").unwrap();

    Command::cargo_bin("plm-bridge")
        .unwrap()
        .arg("build")
        .arg("--plan")
        .arg(plan.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse plan YAML"));
}

#[test]
fn info_fails_cleanly_when_server_is_unreachable() {
    Command::cargo_bin("plm-bridge")
        .unwrap()
        .arg("info")
        .env("TEAMCENTER_URL", "http://127.0.0.1:9/tc")
        .env("TEAMCENTER_USER", "engineer")
        .env("TEAMCENTER_PASS", "pw")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect to http://127.0.0.1:9/tc"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use plm_bridge::cli::{run, Cli, Commands};

    let workdir = tempdir().unwrap();
    let cli = Cli {
        command: Commands::Transcribe {
            url: "https://play.goconsensus.com/trace".to_string(),
            output: workdir.path().join("out"),
            update_sources: false,
            sources: workdir.path().join("sources.json"),
        },
    };

    run(cli).await.expect("Transcribe needs no server");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
