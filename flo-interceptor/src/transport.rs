//! The `reqwest`-backed [`ApiTransport`] implementation.
//!
//! Every outbound provider request passes through here exactly once. This is
//! where a bare `/api/<provider>/...` path picked by an adapter turns into a
//! real socket: hub-mode rewrites the destination and swaps in a hub token,
//! otherwise the locally configured per-provider key is injected and the
//! request goes straight to the provider's own host. Either way, the
//! provider adapters above this never see a credential.

use crate::config::InterceptorConfig;
use crate::error::InterceptorError;
use async_trait::async_trait;
use bytes::Bytes;
use flo_loop::transport::ApiTransport;
use flo_provider::{HttpRequestSpec, ProviderError, RawStreamEvent};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Channel capacity for the per-request raw-event stream. Matches the
/// relay's worker-queue depth convention: generous enough that a slow
/// consumer doesn't stall the HTTP read loop under ordinary load.
const EVENT_CHANNEL_DEPTH: usize = 64;

fn default_host(provider: &str) -> Option<&'static str> {
    match provider {
        "anthropic" => Some("https://api.anthropic.com"),
        "openai" => Some("https://api.openai.com"),
        "ollama" => Some("http://localhost:11434"),
        _ => None,
    }
}

/// Extract the provider name and path suffix from a `/api/<provider>/...` spec.
fn split_provider_path(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("/api/")?;
    let (provider, suffix) = rest.split_once('/')?;
    Some((provider, suffix))
}

/// The header an authenticated request to `provider` carries its key under.
fn auth_header_name(provider: &str) -> &'static str {
    match provider {
        "anthropic" => "x-api-key",
        _ => "authorization",
    }
}

fn auth_header_value(provider: &str, key: &str) -> String {
    match provider {
        "anthropic" => key.to_string(),
        _ => format!("Bearer {key}"),
    }
}

fn apply_auth_header(
    builder: reqwest::RequestBuilder,
    provider: &str,
    config: &InterceptorConfig,
) -> Result<reqwest::RequestBuilder, InterceptorError> {
    if !config.has_key(provider) {
        // Ollama has no credential to inject; everything else requires one.
        if provider == "ollama" {
            return Ok(builder);
        }
        return Err(InterceptorError::MissingCredential(provider.to_string()));
    }

    let header_value = config
        .with_key(provider, |key| auth_header_value(provider, key))
        .expect("has_key just confirmed this provider has a key");
    Ok(builder.header(auth_header_name(provider), header_value))
}

/// Frames a byte stream for a given provider into [`RawStreamEvent`]s.
///
/// Ollama emits NDJSON (one JSON object per line); Anthropic and OpenAI emit
/// SSE (`event:`/`data:` blocks, blank-line terminated). Each provider crate
/// exposes its own `events_from_lines` that already knows its own framing —
/// this only owns splitting the byte stream into complete lines.
fn frame_lines(provider: &str, buf: &str) -> Vec<RawStreamEvent> {
    match provider {
        "ollama" => flo_provider_ollama::events_from_lines(buf.lines()),
        "openai" => flo_provider_openai::events_from_lines(buf.lines()),
        _ => flo_provider_anthropic::events_from_lines(buf.lines()),
    }
}

/// The live [`ApiTransport`]: injects credentials (or routes through a hub),
/// issues the request via `reqwest`, and frames the response body into
/// [`RawStreamEvent`]s as bytes arrive.
pub struct InterceptingTransport {
    config: Arc<RwLock<InterceptorConfig>>,
    client: reqwest::Client,
}

impl InterceptingTransport {
    /// Build a transport sharing ownership of the live interceptor configuration.
    pub fn new(config: Arc<RwLock<InterceptorConfig>>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn build_url(&self, provider: &str, suffix: &str) -> Result<String, InterceptorError> {
        let config = self.config.read().await;
        if config.hub_active() {
            let hub_url = config.hub_http_url().expect("hub_active implies a url");
            return Ok(format!("{}/api/{}/{}", hub_url.trim_end_matches('/'), provider, suffix));
        }
        let host = config
            .api_base_url()
            .map(str::to_string)
            .or_else(|| default_host(provider).map(str::to_string))
            .ok_or_else(|| InterceptorError::Config(format!("unknown provider: {provider}")))?;
        Ok(format!("{}/{}", host.trim_end_matches('/'), suffix))
    }
}

#[async_trait]
impl ApiTransport for InterceptingTransport {
    async fn send(
        &self,
        spec: HttpRequestSpec,
    ) -> Result<mpsc::Receiver<Result<RawStreamEvent, ProviderError>>, ProviderError> {
        let (provider, suffix) = split_provider_path(&spec.url)
            .ok_or_else(|| ProviderError::Other(Box::new(InterceptorError::Config(format!(
                "malformed request path: {}",
                spec.url
            )))))?;

        let url = self
            .build_url(provider, suffix)
            .await
            .map_err(|e| ProviderError::Other(Box::new(e)))?;

        let mut builder = self.client.post(&url).json(&spec.body);
        for (name, value) in &spec.headers {
            builder = builder.header(name, value);
        }

        let config = self.config.read().await;
        if config.hub_active() {
            builder = builder.header("x-api-provider", provider);
            if let Some(token) = config.with_hub_token(|token| token.to_string()) {
                builder = builder.header("x-hub-token", token);
            }
        } else {
            builder = apply_auth_header(builder, provider, &config)
                .map_err(|e| ProviderError::Other(Box::new(e)))?;
        }
        drop(config);

        tracing::debug!(provider, url = %url, "issuing provider request");

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Other(Box::new(InterceptorError::Network(e.to_string()))))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Other(Box::new(InterceptorError::Provider {
                status: status.as_u16(),
                body,
            })));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        let provider = provider.to_string();
        tokio::spawn(drive_stream(response, provider, tx));

        Ok(rx)
    }
}

async fn drive_stream(
    response: reqwest::Response,
    provider: String,
    tx: mpsc::Sender<Result<RawStreamEvent, ProviderError>>,
) {
    let mut byte_stream = response.bytes_stream();
    let mut line_buf = String::new();

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk: Bytes = match chunk_result {
            Ok(b) => b,
            Err(e) => {
                let _ = tx
                    .send(Err(ProviderError::Other(Box::new(InterceptorError::Network(e.to_string())))))
                    .await;
                return;
            }
        };
        let Ok(chunk_str) = std::str::from_utf8(&chunk) else {
            let _ = tx
                .send(Err(ProviderError::Parse("response body was not valid UTF-8".into())))
                .await;
            return;
        };
        line_buf.push_str(chunk_str);

        if let Some(last_newline) = line_buf.rfind('\n') {
            let complete = line_buf[..=last_newline].to_string();
            line_buf.drain(..=last_newline);
            for event in frame_lines(&provider, &complete) {
                if tx.send(Ok(event)).await.is_err() {
                    return;
                }
            }
        }
    }

    if !line_buf.trim().is_empty() {
        for event in frame_lines(&provider, &line_buf) {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_provider_path_extracts_provider_and_suffix() {
        let (provider, suffix) = split_provider_path("/api/anthropic/v1/messages").unwrap();
        assert_eq!(provider, "anthropic");
        assert_eq!(suffix, "v1/messages");
    }

    #[test]
    fn split_provider_path_rejects_malformed_url() {
        assert!(split_provider_path("/anthropic/v1/messages").is_none());
        assert!(split_provider_path("/api/anthropic").is_none());
    }

    #[test]
    fn default_host_known_providers() {
        assert_eq!(default_host("anthropic"), Some("https://api.anthropic.com"));
        assert_eq!(default_host("openai"), Some("https://api.openai.com"));
        assert_eq!(default_host("ollama"), Some("http://localhost:11434"));
        assert_eq!(default_host("mystery"), None);
    }

    #[test]
    fn frame_lines_dispatches_ollama_as_ndjson() {
        let events = frame_lines("ollama", "{\"done\":false}\n{\"done\":true}\n");
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event_type.is_none()));
    }

    #[test]
    fn frame_lines_dispatches_anthropic_as_sse() {
        let sse = "event: message_stop\ndata: {}\n\n";
        let events = frame_lines("anthropic", sse);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type.as_deref(), Some("message_stop"));
    }

    #[tokio::test]
    async fn build_url_uses_default_host_with_no_overrides() {
        let config = Arc::new(RwLock::new(InterceptorConfig::new()));
        let transport = InterceptingTransport::new(config);
        let url = transport.build_url("anthropic", "v1/messages").await.unwrap();
        assert_eq!(url, "https://api.anthropic.com/v1/messages");
    }

    #[tokio::test]
    async fn build_url_prefers_hub_when_active() {
        let mut cfg = InterceptorConfig::new();
        cfg.configure_hub(
            crate::config::MessageSource::PrimaryDocument,
            true,
            Some("https://hub.example.com".into()),
            Some("tok".into()),
        )
        .unwrap();
        let transport = InterceptingTransport::new(Arc::new(RwLock::new(cfg)));
        let url = transport.build_url("anthropic", "v1/messages").await.unwrap();
        assert_eq!(url, "https://hub.example.com/api/anthropic/v1/messages");
    }

    #[tokio::test]
    async fn build_url_honors_api_base_override() {
        let mut cfg = InterceptorConfig::new();
        cfg.configure_api_base(
            crate::config::MessageSource::PrimaryDocument,
            "https://proxy.example.com".into(),
        )
        .unwrap();
        let transport = InterceptingTransport::new(Arc::new(RwLock::new(cfg)));
        let url = transport.build_url("anthropic", "v1/messages").await.unwrap();
        assert_eq!(url, "https://proxy.example.com/v1/messages");
    }
}
