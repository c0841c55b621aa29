use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{read_to_string, write};
use std::path::Path;
use tempfile::TempDir;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Shop</title>
<link rel='pingback' href='https://example.com/xmlrpc.php' />
<link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Lato" />
<script async src="https://www.googletagmanager.com/gtag/js?id=G-1"></script>
<link rel="stylesheet" id="widget-css" href="wp-content/widget.css" media="all">
</head>
<body>
<a href="https://example.com/contact/">Contact</a>
<a href="https://wa.me/5511999999999?text=Hi">Chat</a>
</body>
</html>
"#;

/// Writes the sample page into a fresh temp dir.
fn page_in_tempdir() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("Creating temp dir failed");
    let file = dir.path().join("index.html");
    write(&file, PAGE).expect("Writing sample page failed");
    (dir, file)
}

fn htmlpatch() -> Command {
    let mut cmd = Command::cargo_bin("htmlpatch").expect("Binary exists");
    cmd.env_remove("HTMLPATCH_CACHE_TOKEN");
    cmd
}

#[test]
fn clean_happy_flow_strips_tracking_and_overwrites_file() {
    let (_dir, file) = page_in_tempdir();

    htmlpatch()
        .arg("clean")
        .arg(&file)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("strip-gtag-scripts")
                .and(predicate::str::contains("written to")),
        );

    let patched = read_to_string(&file).expect("patched file");
    assert!(!patched.contains("googletagmanager"));
    assert!(!patched.contains("fonts.googleapis.com"));
    assert!(!patched.contains("pingback"));
    assert!(patched.contains("widget.css"));
}

#[test]
fn missing_file_fails_with_diagnostic() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("nope.html");

    htmlpatch()
        .arg("clean")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    assert!(!missing.exists(), "nothing may be created for a missing input");
}

#[test]
fn dry_run_reports_but_leaves_file_untouched() {
    let (_dir, file) = page_in_tempdir();

    htmlpatch()
        .args(["clean", "--dry-run"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("dry run"));

    assert_eq!(read_to_string(&file).unwrap(), PAGE);
}

#[test]
fn backup_keeps_the_original_next_to_the_file() {
    let (dir, file) = page_in_tempdir();

    htmlpatch()
        .args(["clean", "--backup"])
        .arg(&file)
        .assert()
        .success();

    let backup = dir.path().join("index.html.bak");
    assert_eq!(read_to_string(backup).unwrap(), PAGE);
    assert_ne!(read_to_string(&file).unwrap(), PAGE);
}

#[test]
fn output_flag_writes_elsewhere() {
    let (dir, file) = page_in_tempdir();
    let out = dir.path().join("out.html");

    htmlpatch()
        .args(["clean", "--output"])
        .arg(&out)
        .arg(&file)
        .assert()
        .success();

    assert_eq!(read_to_string(&file).unwrap(), PAGE);
    assert!(!read_to_string(&out).unwrap().contains("googletagmanager"));
}

#[test]
fn json_format_prints_a_parseable_report() {
    let (_dir, file) = page_in_tempdir();

    let output = htmlpatch()
        .args(["--format", "json", "domain", "--domain", "example.com"])
        .arg(&file)
        .output()
        .expect("run htmlpatch");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON report");
    assert_eq!(report["written"], true);
    assert_eq!(report["remaining_mentions"], 0);
    assert!(report["substitutions"].as_u64().unwrap() >= 2);
    assert!(report["rules"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["rule"] == "relativize-urls" && r["outcome"]["status"] == "applied"));

    let patched = read_to_string(&file).unwrap();
    assert!(patched.contains(r#"href="contact/""#));
}

#[test]
fn domain_without_a_domain_is_a_missing_parameter() {
    let (_dir, file) = page_in_tempdir();

    htmlpatch()
        .arg("domain")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing parameter `domain`"));

    assert_eq!(read_to_string(&file).unwrap(), PAGE);
}

#[test]
fn whatsapp_rewrites_links_to_configured_number() {
    let (_dir, file) = page_in_tempdir();

    htmlpatch()
        .args(["whatsapp", "--number", "+1 (555) 010-9999", "--message", "Hello there!"])
        .arg(&file)
        .assert()
        .success();

    let patched = read_to_string(&file).unwrap();
    assert!(patched.contains("https://wa.me/15550109999?text=Hello%20there%21"));
    assert!(!patched.contains("5511999999999"));
}

#[test]
fn second_run_finds_nothing_and_does_not_write() {
    let (_dir, file) = page_in_tempdir();

    htmlpatch().arg("clean").arg(&file).assert().success();
    htmlpatch()
        .arg("clean")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("No references found"));
}

#[test]
fn run_chains_presets_from_config_file() {
    let (dir, file) = page_in_tempdir();
    let config = dir.path().join("htmlpatch.yaml");
    write(
        &config,
        "domain: example.com\ncache:\n  token: \"42\"\npipeline: [clean, domain, cache-bust]\n",
    )
    .unwrap();

    htmlpatch()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&file)
        .assert()
        .success();

    let patched = read_to_string(&file).unwrap();
    assert!(!patched.contains("example.com"));
    // No </style> in the page, so the no-cache meta block has no anchor.
    assert!(!patched.contains("htmlpatch:no-cache"));
    assert!(patched.contains(r#"id="htmlpatch-cache-refresh""#));
}

#[test]
fn run_rejects_unknown_presets() {
    let (_dir, file) = page_in_tempdir();

    htmlpatch()
        .args(["run", "--preset", "clean,teleport"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preset"));
}

#[test]
fn images_without_uploads_dir_fails() {
    let (dir, file) = page_in_tempdir();
    assert!(!Path::new(&dir.path().join("wp-content")).exists());

    htmlpatch()
        .arg("images")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("uploads"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
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
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[test]
fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use htmlpatch::cli::{run, Cli, Commands, OutputFormat, TargetArgs};

    // A missing target is fine: the event must be emitted before anything fails.
    let cli = Cli {
        config: None,
        format: OutputFormat::Text,
        command: Commands::Clean {
            target: TargetArgs {
                file: std::path::PathBuf::from("dummy.html"),
                output: None,
                backup: false,
                dry_run: true,
            },
        },
    };

    let _ = run(cli);

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
