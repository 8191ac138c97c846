use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::NamedTempFile;

/// Creates a config file with default credentials pointing at `base_url`.
fn create_config(base_url: &str) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        format!(
            "contentstack:\n  api_key: test-api-key\n  delivery_token: test-delivery-token\n  environment: preview\ndelivery:\n  base_url: \"{base_url}\"\n  timeout_secs: 5\n"
        ),
    )
    .expect("Writing temp config failed");
    config
}

fn create_request(body: serde_json::Value) -> NamedTempFile {
    let request = NamedTempFile::new().expect("Creating temp request file failed");
    write(request.path(), body.to_string()).expect("Writing temp request failed");
    request
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("flag-preview").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("preview")
            .and(predicate::str::contains("discover"))
            .and(predicate::str::contains("serve")),
    );
}

#[test]
fn fetch_without_credentials_fails_with_configuration_error() {
    let config = NamedTempFile::new().expect("temp file");
    write(config.path(), "preview:\n  fallback_content_type: page\n").unwrap();

    let mut cmd = Command::cargo_bin("flag-preview").expect("Binary exists");
    cmd.arg("fetch")
        .arg("--config")
        .arg(config.path())
        .arg("--entry-id")
        .arg("blt0f6ddaddb7222b8d");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing Contentstack configuration"));
}

#[test]
fn preview_with_empty_request_api_key_prints_configuration_error() {
    // Port 9 is never contacted: the request is rejected before any client is built.
    let config = create_config("http://127.0.0.1:9");
    let request = create_request(serde_json::json!({
        "variation": {"value": {
            "cmsType": "contentstack",
            "entryId": "blt0f6ddaddb7222b8d",
            "environment": "preview",
            "contentType": "page"
        }},
        "config": {"contentstack": {"apiKey": "", "deliveryToken": "token", "environment": "preview"}}
    }));

    let mut cmd = Command::cargo_bin("flag-preview").expect("Binary exists");
    cmd.arg("preview")
        .arg("--config")
        .arg(config.path())
        .arg("--request")
        .arg(request.path());

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Configuration Error").and(predicate::str::contains("400")));
}

#[tokio::test(flavor = "multi_thread")]
async fn preview_prints_asset_preview_from_delivery_api() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/blt211dac063fd6e948"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "asset": {
                "uid": "blt211dac063fd6e948",
                "filename": "terms.pdf",
                "url": "https://assets.contentstack.io/terms.pdf",
                "content_type": "application/pdf"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_config(&server.uri());
    let request = create_request(serde_json::json!({
        "variation": {"value": {
            "cmsType": "contentstack",
            "entryId": "blt211dac063fd6e948",
            "environment": "preview",
            "contentType": "asset"
        }}
    }));

    let (config_path, request_path) = (config.path().to_owned(), request.path().to_owned());
    let assert = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("flag-preview")
            .expect("Binary exists")
            .arg("preview")
            .arg("--config")
            .arg(config_path)
            .arg("--request")
            .arg(request_path)
            .assert()
    })
    .await
    .expect("CLI task panicked");

    assert.success().stdout(
        predicate::str::contains("\"assetType\": \"file\"")
            .and(predicate::str::contains("terms.pdf")),
    );
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

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use flag_preview::cli::{run, Cli, Commands};

    // A missing config file makes run() fail, but only after the first event.
    let cli = Cli {
        command: Commands::Fetch {
            config: std::path::PathBuf::from("dummy.yaml"),
            entry_id: "blt1".to_string(),
            content_type: None,
            environment: None,
            preview: false,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err(), "dummy config path should not load");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
