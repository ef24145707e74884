//! `OpenAiClient` against a one-shot local chat-completions server.

use std::time::Duration;

use cpf_llm::{GenerationRequest, LlmError, OpenAiClient, OpenAiConfig, TextGenerator};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = vec![0u8; 8192];
            // Read until the JSON body has arrived.
            loop {
                let n = socket.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.ends_with(b"}") {
                    break;
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&request).to_string());

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}/v1"), rx)
}

fn client(base_url: &str) -> OpenAiClient {
    let config = OpenAiConfig::new("sk-test")
        .with_base_url(base_url)
        .with_model("gpt-4o-mini")
        .with_timeout(Duration::from_secs(5));
    OpenAiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_generate_posts_chat_completion_and_returns_content() {
    let (base_url, request) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"You may use OA savings for the downpayment."}}]}"#,
    )
    .await;

    let reply = client(&base_url)
        .generate(
            GenerationRequest::new("You are a CPF specialist.")
                .with_user("Query: downpayment")
                .with_temperature(0.5)
                .with_max_tokens(1000),
        )
        .await
        .unwrap();
    assert_eq!(reply, "You may use OA savings for the downpayment.");

    let raw = request.await.unwrap();
    let lowered = raw.to_lowercase();
    assert!(lowered.starts_with("post /v1/chat/completions"));
    assert!(lowered.contains("authorization: bearer sk-test"));
    assert!(raw.contains(r#""role":"system""#));
    assert!(raw.contains(r#""max_tokens":1000"#));
}

#[tokio::test]
async fn test_error_status_surfaces_api_message() {
    let (base_url, _request) = serve_once(
        "401 Unauthorized",
        r#"{"error":{"message":"Incorrect API key provided"}}"#,
    )
    .await;

    let err = client(&base_url)
        .generate(GenerationRequest::new("sys").with_user("hi"))
        .await
        .unwrap_err();

    match err {
        LlmError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("Expected Status, got {:?}", other),
    }
}
