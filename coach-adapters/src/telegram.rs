//! Telegram Bot API transport.

use std::{fmt, time::Duration};

use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::http_client::{DEFAULT_TIMEOUT, HyperClient, build_https_client, sanitize_base_url, send};
use crate::services::{ServiceError, ServiceResult};

const SERVICE: &str = "Telegram";

/// Maximum length of one outbound message.
pub const MESSAGE_LIMIT: usize = 4096;

/// An inbound update.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Update {
    /// Monotonic update identifier.
    pub update_id: i64,
    /// New message, when the update carries one.
    #[serde(default)]
    pub message: Option<Message>,
}

/// An inbound message.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Identifier within the chat.
    pub message_id: i64,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Sender, absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Text body; `None` for stickers, photos and the like.
    #[serde(default)]
    pub text: Option<String>,
}

/// Chat identity.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct Chat {
    /// Chat identifier.
    pub id: i64,
}

/// Message sender.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct User {
    /// User identifier.
    pub id: i64,
    /// Public handle.
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Long-polling Telegram client.
pub struct TelegramClient {
    client: HyperClient,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Creates a client for the bot identified by `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] when the token is empty.
    pub fn new(token: impl Into<String>) -> ServiceResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ServiceError::configuration(SERVICE, "bot token is empty"));
        }
        Ok(Self {
            client: build_https_client(),
            base_url: "https://api.telegram.org/".to_owned(),
            token,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Overrides the API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if the URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> ServiceResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())
            .map_err(|reason| ServiceError::configuration(SERVICE, reason))?;
        Ok(self)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
        limit: Duration,
    ) -> ServiceResult<T> {
        let uri = format!("{}bot{}/{method}", self.base_url, self.token)
            .parse::<Uri>()
            .map_err(|err| ServiceError::configuration(SERVICE, format!("invalid URL: {err}")))?;
        let body = serde_json::to_vec(payload).map_err(|err| ServiceError::decode(SERVICE, err))?;
        let request = Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|err| ServiceError::transport(SERVICE, err))?;

        let reply = send(&self.client, request, limit)
            .await
            .map_err(|err| ServiceError::transport(SERVICE, err))?;
        let envelope: Envelope<T> = serde_json::from_slice(&reply.body).map_err(|err| {
            if reply.status.is_success() {
                ServiceError::decode(SERVICE, err)
            } else {
                ServiceError::Status {
                    service: SERVICE,
                    status: reply.status.as_u16(),
                    body: reply.body_text(),
                }
            }
        })?;

        if !envelope.ok || !reply.status.is_success() {
            return Err(ServiceError::Status {
                service: SERVICE,
                status: reply.status.as_u16(),
                body: envelope
                    .description
                    .unwrap_or_else(|| "Unknown error".to_owned()),
            });
        }
        envelope
            .result
            .ok_or_else(|| ServiceError::decode(SERVICE, format!("{method} returned no result")))
    }

    /// Long-polls for updates after `offset`, waiting up to `wait`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the request fails.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        wait: Duration,
    ) -> ServiceResult<Vec<Update>> {
        let mut payload = json!({"timeout": wait.as_secs(), "allowed_updates": ["message"]});
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }
        self.call("getUpdates", &payload, self.timeout + wait).await
    }

    /// Sends `text`, split into [`MESSAGE_LIMIT`]-sized messages.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when any part cannot be delivered.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> ServiceResult<()> {
        let parts = split_message(text, MESSAGE_LIMIT);
        debug!(
            service = SERVICE,
            chat_id,
            parts = parts.len(),
            chars = text.chars().count(),
            "sending reply"
        );
        for part in parts {
            let payload = serde_json::to_value(SendMessage { chat_id, text: &part })
                .map_err(|err| ServiceError::decode(SERVICE, err))?;
            let _: serde_json::Value = self.call("sendMessage", &payload, self.timeout).await?;
        }
        Ok(())
    }

    /// Shows the "typing" indicator in `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the request fails.
    pub async fn send_chat_action(&self, chat_id: i64) -> ServiceResult<()> {
        let payload = json!({"chat_id": chat_id, "action": "typing"});
        let _: bool = self.call("sendChatAction", &payload, self.timeout).await?;
        Ok(())
    }
}

/// Splits `text` into parts of at most `limit` characters, preferring line
/// boundaries.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            parts.push(std::mem::take(&mut current).trim_end().to_owned());
            current_len = 0;
        }
        if line_len > limit {
            let chars = line.chars().collect::<Vec<_>>();
            let mut chunks = chars.chunks(limit).peekable();
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() {
                    parts.push(chunk.iter().collect());
                } else {
                    current = chunk.iter().collect();
                    current_len = chunk.len();
                }
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }
    let tail = current.trim_end();
    if !tail.is_empty() || parts.is_empty() {
        parts.push(tail.to_owned());
    }
    parts
}
