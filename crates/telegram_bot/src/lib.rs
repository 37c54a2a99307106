//! Telegram bot.
//!
//! Commands are parsed with [`commands::Command`]; any other text is handed
//! to the engine's assistant, which classifies it and answers in Spanish.

use std::sync::Arc;

use chrono_tz::Tz;
use engine::{Assistant, JsonFileStore};
use providers::{Composer, DolarApi};
use teloxide::prelude::*;

mod commands;
mod handlers;
mod parsing;
mod ui;

/// The assistant the bot runs with.
pub type BotAssistant = Assistant<JsonFileStore, DolarApi, Composer>;

const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Caracas;

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    assistant: Arc<BotAssistant>,
    timezone: Tz,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    assistant: Arc<BotAssistant>,
    timezone: Tz,
}

impl Bot {
    pub fn new(
        token: &str,
        allowed_users: Option<Vec<UserId>>,
        assistant: BotAssistant,
        timezone: Tz,
    ) -> Result<Self, String> {
        if token.trim().is_empty() {
            return Err("missing telegram token".to_string());
        }

        Ok(Self {
            token: token.to_string(),
            allowed_users,
            assistant: Arc::new(assistant),
            timezone,
        })
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            assistant: Arc::clone(&self.assistant),
            timezone: self.timezone,
        };

        Dispatcher::builder(bot, handlers::schema())
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    assistant: Option<BotAssistant>,
    timezone: Option<Tz>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    /// Telegram ids allowed to use the bot. An empty list allows everyone.
    pub fn allowed_users(mut self, allowed_users: &[u64]) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users.iter().copied().map(UserId).collect());
        }
        self
    }

    pub fn assistant(mut self, assistant: BotAssistant) -> BotBuilder {
        self.assistant = Some(assistant);
        self
    }

    /// Timezone of the records' wall-clock timestamps. Defaults to Caracas.
    pub fn timezone(mut self, timezone: Tz) -> BotBuilder {
        self.timezone = Some(timezone);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        let assistant = self
            .assistant
            .ok_or_else(|| "missing assistant".to_string())?;
        Bot::new(
            &self.token,
            self.allowed_users,
            assistant,
            self.timezone.unwrap_or(DEFAULT_TIMEZONE),
        )
    }
}
