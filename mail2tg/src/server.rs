use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};

use mail2tg_relay::outbound::ChatDelivery;
use mail2tg_relay::receivers::Receivers;
use mail2tg_relay::relay::Relay;

use crate::config::*;
use crate::smtp::SmtpServer;
use crate::telegram::TelegramBot;

pub struct Server {
    smtp_server: Arc<SmtpServer>,
}

impl Server {
    /// Startup: every failure here is fatal.
    pub async fn from_config(config: Config) -> Result<Self> {
        let receivers = Receivers::new(config.receivers)?;
        let bot = TelegramBot::connect(&config.bot.token).await?;
        Ok(Self::new(config.smtp, receivers, Arc::new(bot)))
    }

    pub fn new(
        smtp: SmtpConfig,
        receivers: Receivers,
        client: Arc<dyn ChatDelivery + Send + Sync>,
    ) -> Self {
        let relay = Relay::new(receivers, client);
        Self {
            smtp_server: SmtpServer::new(smtp, relay),
        }
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!("Starting mail2tg...");

        let (exit_signal, _provoke_exit) = watch_ctrl_c();
        self.smtp_server.run(exit_signal).await
    }
}

pub fn watch_ctrl_c() -> (watch::Receiver<bool>, Arc<watch::Sender<bool>>) {
    let (send_cancel, watch_cancel) = watch::channel(false);
    let send_cancel = Arc::new(send_cancel);
    let send_cancel_2 = send_cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install CTRL+C signal handler: {}", e);
            return;
        }
        info!("Received CTRL+C, shutting down.");
        let _ = send_cancel.send(true);
    });
    (watch_cancel, send_cancel_2)
}
