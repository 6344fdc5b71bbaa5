use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::{
    payloads::{SendDocumentSetters, SendMessageSetters},
    prelude::*,
    types::{ChatId, InputFile, ParseMode},
};
use tracing::{debug, info};

use mail2tg_relay::delivery::FormattingMode;
use mail2tg_relay::outbound::ChatDelivery;
use mail2tg_relay::receivers::DestinationId;

/// Telegram Bot API client
pub struct TelegramBot {
    bot: Bot,
}

impl TelegramBot {
    /// Checks the token against `getMe` before anything is relayed.
    pub async fn connect(token: &str) -> Result<Self> {
        let bot = Bot::new(token);
        let me = bot
            .get_me()
            .await
            .context("telegram bot authorization failed")?;
        info!(username = ?me.username, "Bot authorized");
        Ok(Self { bot })
    }
}

// The legacy Markdown mode treats `*text*` as bold and needs no escaping.
#[allow(deprecated)]
fn parse_mode(mode: FormattingMode) -> Option<ParseMode> {
    match mode {
        FormattingMode::Plain => None,
        FormattingMode::Emphasis => Some(ParseMode::Markdown),
    }
}

#[async_trait]
impl ChatDelivery for TelegramBot {
    async fn send_text(&self, to: DestinationId, body: &str, mode: FormattingMode) -> Result<()> {
        let mut req = self.bot.send_message(ChatId(to.0), body);
        if let Some(pm) = parse_mode(mode) {
            req = req.parse_mode(pm);
        }
        req.await?;
        debug!(chat_id=%to, len=body.len(), "telegram text sent");
        Ok(())
    }

    async fn send_file(
        &self,
        to: DestinationId,
        filename: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()> {
        let size = bytes.len();
        let input = InputFile::memory(bytes).file_name(filename.to_string());
        let mut req = self.bot.send_document(ChatId(to.0), input);
        if !caption.is_empty() {
            req = req.caption(caption);
        }
        req.await?;
        debug!(chat_id=%to, filename, size, "telegram document sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(deprecated)]
    fn emphasis_is_legacy_markdown() {
        assert!(matches!(
            parse_mode(FormattingMode::Emphasis),
            Some(ParseMode::Markdown)
        ));
        assert!(parse_mode(FormattingMode::Plain).is_none());
    }
}
