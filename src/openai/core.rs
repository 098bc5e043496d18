use std::time::Duration;
use tokio::sync::mpsc;

use anyhow::{Error, Result};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    Reasoning { reasoning: String },

    Stop {},
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    #[allow(dead_code)]
    index: usize,
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[allow(dead_code)]
    id: String,
    choices: Vec<CompletionChunkChoice>,
}

/// Requests a streaming chat completion from an OpenAI compatible API
/// and forwards each content fragment through `tx` as it arrives. The
/// accumulated full response text is returned once the server signals
/// the end of the stream.
pub async fn completion_stream(
    tx: mpsc::UnboundedSender<String>,
    messages: &Vec<Message>,
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<String, Error> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60))
        .json(&payload)
        .send()
        .await?;

    let mut stream = response.bytes_stream();

    let mut content_buf = String::from("");
    let mut reasoning_buf = String::from("");
    let mut buffer = String::new();

    'outer: while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let chunk_str = std::str::from_utf8(&chunk)?;

        // Append new data to buffer. This is necessary to handle SSE
        // fragmentation over HTTP/2 frames.
        buffer.push_str(chunk_str);

        // Process all complete SSE events from the buffer
        while let Some(event_end) = buffer.find("\n\n") {
            let event_data = buffer[..event_end].to_string();
            buffer = buffer[event_end + 2..].to_string();

            // Skip empty events
            let event_data = event_data.trim();
            if event_data.is_empty() {
                continue;
            }

            // Parse SSE events
            if !event_data.starts_with("data: ") {
                continue;
            }

            // Extract the JSON payload (after "data: ")
            let data = event_data[6..].trim();

            // Data can sometimes be empty. Not sure why.
            if data.is_empty() {
                continue;
            }

            // Handle the end of the stream
            if data == "[DONE]" {
                break 'outer;
            }

            // Process the delta
            let chunk = serde_json::from_str::<CompletionChunk>(data).inspect_err(|e| {
                tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e)
            })?;
            let Some(choice) = chunk.choices.first() else {
                continue;
            };

            match &choice.delta {
                Delta::Content { content } => {
                    content_buf += content;

                    // Forward the fragment to the receiver channel.
                    // (The result is ignored here because we want to
                    // finish accumulating the response even if the
                    // caller went away.)
                    let _ = tx.send(content.clone());

                    if choice.finish_reason.is_some() {
                        break 'outer;
                    }
                }
                Delta::Reasoning { reasoning } => {
                    if choice.finish_reason.is_some() {
                        break 'outer;
                    }
                    reasoning_buf += reasoning;
                }
                Delta::Stop {} => {
                    break 'outer;
                }
            }
        }
    }

    Ok(content_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::new(Role::User, "Hello world");
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"role":"user","content":"Hello world"}"#
        );
    }

    #[test]
    fn test_delta_content_deserialization() {
        let json = r#"{"content":"Hello"}"#;
        let delta: Delta = serde_json::from_str(json).unwrap();
        match delta {
            Delta::Content { content } => assert_eq!(content, "Hello"),
            _ => panic!("Expected Content variant"),
        }
    }

    #[test]
    fn test_delta_reasoning_deserialization() {
        let json = r#"{"reasoning":"Thinking..."}"#;
        let delta: Delta = serde_json::from_str(json).unwrap();
        match delta {
            Delta::Reasoning { reasoning } => assert_eq!(reasoning, "Thinking..."),
            _ => panic!("Expected Reasoning variant"),
        }
    }

    #[test]
    fn test_delta_stop_deserialization() {
        let json = r#"{}"#;
        let delta: Delta = serde_json::from_str(json).unwrap();
        match delta {
            Delta::Stop {} => {}
            _ => panic!("Expected Stop variant"),
        }
    }

    #[tokio::test]
    async fn test_completion_stream_content() {
        let mut server = mockito::Server::new_async().await;

        // SSE response with content chunks
        let sse_response = r#"data: {"id":"chunk1","choices":[{"index":0,"delta":{"content":"SELECT * "},"finish_reason":null}]}

data: {"id":"chunk2","choices":[{"index":0,"delta":{"content":"FROM Asset_Master"},"finish_reason":null}]}

data: {"id":"chunk3","choices":[{"index":0,"delta":{"content":""},"finish_reason":"stop"}]}

data: [DONE]

"#;

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_response)
            .create();

        let messages = vec![Message::new(Role::User, "show all assets")];
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server_url = server.url();

        let handle = tokio::spawn(async move {
            completion_stream(tx, &messages, server_url.as_str(), "test-key", "test").await
        });

        let result = tokio::time::timeout(tokio::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        mock.assert();
        assert_eq!(result, "SELECT * FROM Asset_Master");

        // The channel should have received each content fragment in order
        assert_eq!(rx.try_recv().unwrap(), "SELECT * ");
        assert_eq!(rx.try_recv().unwrap(), "FROM Asset_Master");
    }

    #[tokio::test]
    async fn test_completion_stream_skips_reasoning() {
        let mut server = mockito::Server::new_async().await;

        // A reasoning delta followed by content. Reasoning is
        // accumulated but never forwarded.
        let sse_response = r#"data: {"id":"chunk1","choices":[{"index":0,"delta":{"reasoning":"Thinking"},"finish_reason":null}]}

data: {"id":"chunk2","choices":[{"index":0,"delta":{"content":"Done!"},"finish_reason":"stop"}]}

data: [DONE]

"#;

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_response)
            .create();

        let messages = vec![Message::new(Role::User, "think about this")];
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server_url = server.url();

        let handle = tokio::spawn(async move {
            completion_stream(tx, &messages, server_url.as_str(), "test-key", "test").await
        });

        let result = tokio::time::timeout(tokio::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        mock.assert();
        assert_eq!(result, "Done!");
        assert_eq!(rx.try_recv().unwrap(), "Done!");
        assert!(rx.try_recv().is_err());
    }
}
