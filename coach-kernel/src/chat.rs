//! Chat front end: access gate, message routing, and the polling loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use coach_adapters::services::ServiceResult;
use coach_adapters::telegram::{Message, TelegramClient};

use crate::reply::format_run_result;
use crate::scheduler::TaskScheduler;
use crate::service::QuestionHandler;

/// Reply to chats outside the allow-list.
pub const PRIVATE_REPLY: &str = "Sorry, this bot is private.";

/// Reply to messages without text.
pub const NON_TEXT_REPLY: &str = "Sorry, I can only process text messages.";

const POLL_WAIT: Duration = Duration::from_secs(30);
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Onboarding text sent for `/start`.
#[must_use]
pub fn welcome_text(chat_id: i64) -> String {
    format!(
        "👋 Welcome to Sport Coach!\n\n\
         I'm your AI running coach powered by Claude. Ask me anything about your training!\n\n\
         **Your Chat ID**: {chat_id}\n\
         Add this to your .env file as TELEGRAM_CHAT_ID\n\n\
         **Examples**:\n\
         - \"What's today's workout?\"\n\
         - \"How's my fitness looking?\"\n\
         - \"Should I run today? I'm feeling tired\"\n\
         - \"Can you create this week's plan?\"\n\n\
         Just ask naturally - no commands needed!"
    )
}

/// Reply sent when a run fails.
#[must_use]
pub fn error_reply(reason: &str) -> String {
    format!("❌ Sorry, something went wrong. Please try again.\n\nError: {reason}")
}

/// Allow-list of the single chat the bot serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatGate {
    allowed: Option<i64>,
}

impl ChatGate {
    /// Creates a gate. Without an allowed chat every chat is admitted.
    #[must_use]
    pub fn new(allowed: Option<i64>) -> Self {
        if allowed.is_none() {
            warn!("no allowed chat configured; the bot will answer every chat");
        }
        Self { allowed }
    }

    /// Whether messages from `chat_id` are served.
    #[must_use]
    pub fn permits(&self, chat_id: i64) -> bool {
        self.allowed.is_none_or(|allowed| allowed == chat_id)
    }
}

/// Classification of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// The `/start` onboarding command.
    Start,
    /// Any other slash command; ignored.
    Command(&'a str),
    /// A free-text question for the coach.
    Question(&'a str),
    /// A message without usable text.
    NonText,
}

impl<'a> Inbound<'a> {
    /// Classifies `message`.
    #[must_use]
    pub fn classify(message: &'a Message) -> Self {
        let Some(text) = message
            .text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
        else {
            return Self::NonText;
        };
        match text.strip_prefix('/') {
            Some(command) => {
                let name = command
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .split('@')
                    .next()
                    .unwrap_or_default();
                if name == "start" {
                    Self::Start
                } else {
                    Self::Command(name)
                }
            }
            None => Self::Question(text),
        }
    }
}

/// Long-polling chat bot answering questions through a [`QuestionHandler`].
#[derive(Clone)]
pub struct ChatBot {
    client: Arc<TelegramClient>,
    gate: ChatGate,
    handler: Arc<dyn QuestionHandler>,
    scheduler: TaskScheduler,
    poll_wait: Duration,
}

impl std::fmt::Debug for ChatBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBot")
            .field("client", &self.client)
            .field("gate", &self.gate)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl ChatBot {
    /// Creates a bot.
    #[must_use]
    pub fn new(
        client: Arc<TelegramClient>,
        gate: ChatGate,
        handler: Arc<dyn QuestionHandler>,
        scheduler: TaskScheduler,
    ) -> Self {
        Self {
            client,
            gate,
            handler,
            scheduler,
            poll_wait: POLL_WAIT,
        }
    }

    /// Overrides the long-poll wait.
    #[must_use]
    pub const fn with_poll_wait(mut self, wait: Duration) -> Self {
        self.poll_wait = wait;
        self
    }

    /// Routes one inbound message and sends the reply.
    ///
    /// Run failures are reported to the chat; only delivery failures are
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns the transport error when a reply cannot be sent.
    pub async fn handle(&self, message: Message) -> ServiceResult<()> {
        let chat_id = message.chat.id;
        if !self.gate.permits(chat_id) {
            info!(chat_id, "rejected message from unauthorised chat");
            return self.client.send_message(chat_id, PRIVATE_REPLY).await;
        }

        match Inbound::classify(&message) {
            Inbound::Start => self.client.send_message(chat_id, &welcome_text(chat_id)).await,
            Inbound::Command(command) => {
                debug!(chat_id, command, "ignoring command");
                Ok(())
            }
            Inbound::NonText => self.client.send_message(chat_id, NON_TEXT_REPLY).await,
            Inbound::Question(question) => {
                info!(chat_id, question, "question received");
                if let Err(err) = self.client.send_chat_action(chat_id).await {
                    warn!(chat_id, error = %err, "typing indicator failed");
                }
                let reply = match self.handler.answer(question.to_owned()).await {
                    Ok(outcome) => format_run_result(outcome.result()),
                    Err(err) => {
                        error!(chat_id, error = %err, "coaching run failed");
                        error_reply(&err.to_string())
                    }
                };
                self.client.send_message(chat_id, &reply).await
            }
        }
    }

    /// Fetches one batch of updates and schedules a handler per message.
    ///
    /// Returns the offset to acknowledge on the next poll.
    ///
    /// # Errors
    ///
    /// Returns the transport error when polling fails.
    pub async fn poll_once(&self, offset: Option<i64>) -> ServiceResult<Option<i64>> {
        let updates = self.client.get_updates(offset, self.poll_wait).await?;
        let mut next = offset;
        for update in updates {
            next = Some(next.map_or(update.update_id + 1, |n| n.max(update.update_id + 1)));
            let Some(message) = update.message else {
                continue;
            };
            let bot = self.clone();
            let spawned = self
                .scheduler
                .spawn(async move {
                    if let Err(err) = bot.handle(message).await {
                        warn!(error = %err, "failed to deliver reply");
                    }
                })
                .await;
            if spawned.is_err() {
                warn!(update_id = update.update_id, "scheduler closed; dropping update");
            }
        }
        Ok(next)
    }

    /// Polls until `shutdown` resolves, then stops accepting new work and
    /// waits for runs already in flight to deliver their replies.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut offset = None;
        info!("chat bot polling started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                polled = self.poll_once(offset) => match polled {
                    Ok(next) => offset = next,
                    Err(err) => {
                        warn!(error = %err, retry_in = ?RETRY_DELAY, "polling failed");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                },
            }
        }
        info!("chat bot polling stopped; draining in-flight runs");
        self.scheduler.shutdown().await;
        info!("chat bot stopped");
    }
}
