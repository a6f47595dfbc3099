//! Telegram-backed delivery seam for the dispatcher.

use std::path::Path;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::InputFile;

use sitepulse_dispatch::{DispatchError, Transport};

/// Delivers dispatcher messages through the Telegram Bot API.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Wraps a bot handle.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DispatchError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|_| ())
            .map_err(|e| DispatchError::Delivery(e.to_string()))
    }

    async fn send_file(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> Result<(), DispatchError> {
        self.bot
            .send_document(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .caption(caption.to_string())
            .await
            .map(|_| ())
            .map_err(|e| DispatchError::Delivery(e.to_string()))
    }
}
