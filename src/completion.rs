//! Clients for the text-completion endpoint that generates prompts.

use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use serde::Serialize;

use crate::error::{DiaryError, Result};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/openai";

#[async_trait]
pub trait CompletionClient: Send + Sync + 'static {
    /// Returns the text generated for `cue`.
    async fn complete(&self, cue: &str) -> Result<String>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
}

/// POSTs `{"prompt": cue}` and reads the streamed text body to the end.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCompletionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        HttpCompletionClient {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, cue: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&CompletionRequest { prompt: cue })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiaryError::CompletionStatus { status });
        }

        // Chunks may split a multi-byte character, so decode once at the end.
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }

        let text = String::from_utf8_lossy(&body).into_owned();
        debug!("Completion received ({} bytes)", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Serves one request, answering with `parts` written one at a time.
    /// Resolves to the request body.
    async fn serve_once(parts: Vec<Vec<u8>>) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/openai", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];

            let header_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
            let content_length: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse().unwrap())
                .unwrap_or(0);
            while request.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
            }

            for part in parts {
                socket.write_all(&part).await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            let _ = socket.shutdown().await;

            String::from_utf8(request[header_end..].to_vec()).unwrap()
        });

        (url, handle)
    }

    fn chunk(bytes: &[u8]) -> Vec<u8> {
        let mut out = format!("{:x}\r\n", bytes.len()).into_bytes();
        out.extend_from_slice(bytes);
        out.extend_from_slice(b"\r\n");
        out
    }

    fn client(url: String) -> HttpCompletionClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpCompletionClient::with_client(http, url)
    }

    #[tokio::test]
    async fn posts_cue_and_joins_chunks_split_inside_a_character() {
        let text = "Qu'est-ce qui t'a rendu heureux ☕?";
        let bytes = text.as_bytes();
        // Split inside the three-byte cup.
        let cut = text.find('☕').unwrap() + 1;

        let (url, server) = serve_once(vec![
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec(),
            chunk(&bytes[..cut]),
            chunk(&bytes[cut..]),
            b"0\r\n\r\n".to_vec(),
        ])
        .await;

        let completion = client(url).complete("Reflect upon your day.").await.unwrap();
        assert_eq!(completion, text);

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "prompt": "Reflect upon your day." }));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (url, server) = serve_once(vec![
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
        ])
        .await;

        let err = client(url).complete("hello").await.unwrap_err();
        assert!(matches!(
            err,
            DiaryError::CompletionStatus { status } if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
        server.await.unwrap();
    }
}
