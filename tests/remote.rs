//! Remote decision source over real HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mockscript::adapters::live::LiveExec;
use mockscript::config::{NestedPolicy, RemotePolicy};
use mockscript::decision::remote;
use mockscript::intercept::{ResumeExecutor, ScriptTask};
use mockscript::shell::{parse, Environment, ExitStatus, RunnerConfig, StdStreams};
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One parsed SSE frame.
#[derive(Debug, Default)]
struct Frame {
    id: String,
    event: String,
    data: String,
}

fn parse_frames(text: &str) -> Vec<Frame> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .filter_map(|block| {
            let mut frame = Frame::default();
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("id:") {
                    frame.id = value.trim().to_string();
                } else if let Some(value) = line.strip_prefix("event:") {
                    frame.event = value.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    frame.data.push_str(value.trim());
                }
            }
            (!frame.event.is_empty()).then_some(frame)
        })
        .collect()
}

async fn start(script: &str, policy: RemotePolicy) -> (SocketAddr, JoinHandle<std::io::Result<Option<ExitStatus>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let program = parse(script, "remote.sh").unwrap();
    let mut env = Environment::new();
    if let Ok(path) = std::env::var("PATH") {
        env.insert("PATH".to_string(), path);
    }
    let config = RunnerConfig::new(std::env::temp_dir()).with_env(env).with_streams(StdStreams::discard());
    let session = ScriptTask::spawn(program, config, None).unwrap();
    let resume = ResumeExecutor::new(Arc::new(LiveExec::default()), NestedPolicy::FallThrough);
    let webapp = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("webapp");
    let server = tokio::spawn(async move {
        remote::serve(listener, session, resume, policy, &webapp, std::future::pending()).await
    });
    (addr, server)
}

async fn post_code(client: &reqwest::Client, addr: SocketAddr, body: &str) -> StatusCode {
    client
        .post(format!("http://{addr}/return"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
        .status()
}

#[tokio::test(flavor = "multi_thread")]
async fn client_decides_the_call_and_sees_the_result() {
    let (addr, server) = start("deploy --prod\nexit $?", RemotePolicy::ForcedExit).await;
    let client = reqwest::Client::new();

    let mut events = client.get(format!("http://{addr}/exec")).send().await.unwrap();
    assert_eq!(events.status(), StatusCode::OK);

    let second = client.get(format!("http://{addr}/exec")).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    assert_eq!(post_code(&client, addr, "not json").await, StatusCode::BAD_REQUEST);
    assert_eq!(post_code(&client, addr, r#"{"exitCode": 300}"#).await, StatusCode::BAD_REQUEST);

    release(&client, addr, r#"{"exitCode": 7}"#).await;

    let mut body = String::new();
    while let Some(chunk) = tokio::time::timeout(Duration::from_secs(5), events.chunk()).await.unwrap().unwrap() {
        body.push_str(&String::from_utf8_lossy(&chunk));
    }
    let frames = parse_frames(&body);
    assert_eq!(frames.len(), 2, "{body}");
    assert_eq!(frames[0].id, "1");
    assert_eq!(frames[0].event, "invocation");
    let invocation: serde_json::Value = serde_json::from_str(&frames[0].data).unwrap();
    assert_eq!(invocation["args"], serde_json::json!(["deploy", "--prod"]));
    assert_eq!(frames[1].id, "2");
    assert_eq!(frames[1].event, "result");
    let result: serde_json::Value = serde_json::from_str(&frames[1].data).unwrap();
    assert_eq!(result["exitCode"], 7);

    let outcome = server.await.unwrap().unwrap();
    assert_eq!(outcome, Some(ExitStatus::new(7)));
}

async fn release(client: &reqwest::Client, addr: SocketAddr, body: &str) {
    for _ in 0..100 {
        match post_code(client, addr, body).await {
            StatusCode::ACCEPTED => return,
            StatusCode::CONFLICT => tokio::time::sleep(Duration::from_millis(20)).await,
            other => panic!("unexpected status {other}"),
        }
    }
    panic!("no call became pending");
}

#[tokio::test(flavor = "multi_thread")]
async fn fall_through_policy_lets_a_posted_code_override_the_real_status() {
    let (addr, server) = start("sh -c true\nexit $?", RemotePolicy::FallThrough).await;
    let client = reqwest::Client::new();
    release(&client, addr, r#"{"exitCode": 9}"#).await;
    let outcome = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap().unwrap();
    assert_eq!(outcome, Some(ExitStatus::new(9)));

    let (addr, server) = start("sh -c 'exit 4'\nexit $?", RemotePolicy::FallThrough).await;
    release(&client, addr, r#"{"exitCode": 0}"#).await;
    let outcome = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap().unwrap();
    assert_eq!(outcome, Some(ExitStatus::new(4)));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_assets_are_served() {
    let (addr, server) = start("wait-for-it", RemotePolicy::ForcedExit).await;
    let client = reqwest::Client::new();

    let page = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("id=\"execution\""));

    let script = client.get(format!("http://{addr}/webapp/exec.js")).send().await.unwrap();
    assert_eq!(script.status(), StatusCode::OK);
    assert!(script.text().await.unwrap().contains("EventSource"));

    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn server_stops_once_the_script_finishes() {
    let (addr, server) = start("true", RemotePolicy::ForcedExit).await;
    let client = reqwest::Client::new();

    let outcome = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap().unwrap();
    assert_eq!(outcome, Some(ExitStatus::SUCCESS));
    assert!(client.get(format!("http://{addr}/exec")).send().await.is_err());
}
