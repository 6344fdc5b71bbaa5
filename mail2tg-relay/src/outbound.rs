use anyhow::Result;
use async_trait::async_trait;

use crate::delivery::{FormattingMode, OutboundDelivery};
use crate::receivers::DestinationId;

/// The chat side of the relay.
#[async_trait]
pub trait ChatDelivery: Send + Sync {
    async fn send_text(&self, to: DestinationId, body: &str, mode: FormattingMode) -> Result<()>;
    async fn send_file(
        &self,
        to: DestinationId,
        filename: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()>;
}

pub async fn deliver(
    client: &(dyn ChatDelivery + Send + Sync),
    to: DestinationId,
    delivery: OutboundDelivery,
) -> Result<()> {
    match delivery {
        OutboundDelivery::TextMessage { body, mode } => client.send_text(to, &body, mode).await,
        OutboundDelivery::FileAttachment {
            filename,
            bytes,
            caption,
        } => client.send_file(to, &filename, bytes, &caption).await,
    }
}
