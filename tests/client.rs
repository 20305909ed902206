use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use cotacao::client::{ClientError, fetch_quotation, run};
use cotacao::config::ClientConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_server(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cotacao"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

fn config(server_url: String, output_path: PathBuf) -> ClientConfig {
    ClientConfig {
        server_url,
        timeout: Duration::from_millis(300),
        output_path,
    }
}

#[tokio::test]
async fn writes_bid_over_previous_file() {
    let server = mock_server(ResponseTemplate::new(200).set_body_string(r#"{"bid":"5.30"}"#)).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cotacao.txt");
    fs::write(&output, "Dólar: 4.00\nstale\n").unwrap();

    run(&config(format!("{}/cotacao", server.uri()), output.clone())).await;

    assert_eq!(fs::read_to_string(&output).unwrap(), "Dólar: 5.30\n");
}

#[tokio::test]
async fn slow_server_leaves_file_untouched() {
    let server = mock_server(
        ResponseTemplate::new(200)
            .set_body_string(r#"{"bid":"5.30"}"#)
            .set_delay(Duration::from_millis(1000)),
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cotacao.txt");
    fs::write(&output, "Dólar: 4.00\n").unwrap();

    run(&config(format!("{}/cotacao", server.uri()), output.clone())).await;

    assert_eq!(fs::read_to_string(&output).unwrap(), "Dólar: 4.00\n");
}

#[tokio::test]
async fn unreachable_server_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cotacao.txt");

    run(&config("http://127.0.0.1:1/cotacao".to_string(), output.clone())).await;

    assert!(!output.exists());
}

#[tokio::test]
async fn server_error_leaves_file_untouched() {
    let server = mock_server(ResponseTemplate::new(500).set_body_string("internal server error")).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cotacao.txt");
    fs::write(&output, "Dólar: 4.00\n").unwrap();

    run(&config(format!("{}/cotacao", server.uri()), output.clone())).await;

    assert_eq!(fs::read_to_string(&output).unwrap(), "Dólar: 4.00\n");
}

#[tokio::test]
async fn fetch_reports_deadline_and_parse_failures() {
    let http = reqwest::Client::new();

    let slow = mock_server(
        ResponseTemplate::new(200)
            .set_body_string(r#"{"bid":"5.30"}"#)
            .set_delay(Duration::from_millis(1000)),
    )
    .await;
    let err = fetch_quotation(&http, &format!("{}/cotacao", slow.uri()), Duration::from_millis(300))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::DeadlineExceeded(_)));

    let garbled = mock_server(ResponseTemplate::new(200).set_body_string("5.30")).await;
    let err = fetch_quotation(&http, &format!("{}/cotacao", garbled.uri()), Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)), "{err:?}");
}
