//! Webhook notifier.
//!
//! Posts report text to a chat webhook as JSON `{"content": ...}`.
//! Messages over the size ceiling are split into sequential chunks
//! sent with a short pause in between (the endpoint rate-limits).
//! Delivery is best-effort: failures are logged, never retried, and
//! never fail the run.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Split `text` into chunks of at most `limit` characters, preserving
/// content exactly: the chunks concatenate back to the original.
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 || text.is_empty() {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

pub struct WebhookNotifier {
    http: Client,
    webhook_url: String,
    chunk_limit: usize,
    chunk_delay: Duration,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String, chunk_limit: usize, chunk_delay: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("KRXSCAN/0.1.0")
            .build()
            .context("Failed to build HTTP client for webhook")?;

        Ok(Self {
            http,
            webhook_url,
            chunk_limit,
            chunk_delay,
        })
    }

    /// Deliver `text`, chunked if needed. Best-effort: each chunk is an
    /// independent message; a failed chunk is logged and dropped.
    pub async fn send(&self, text: &str) {
        let chunks = chunk_message(text, self.chunk_limit);
        let total = chunks.len();

        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
            match self.post_chunk(chunk).await {
                Ok(()) => debug!(chunk = i + 1, total, "Webhook chunk delivered"),
                Err(e) => warn!(chunk = i + 1, total, error = %e, "Webhook delivery failed"),
            }
        }
        info!(chunks = total, chars = text.chars().count(), "Notification sent");
    }

    async fn post_chunk(&self, chunk: &str) -> Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&json!({ "content": chunk }))
            .send()
            .await
            .context("Webhook request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Webhook returned {status}");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
