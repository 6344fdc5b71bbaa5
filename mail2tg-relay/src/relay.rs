use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use tracing::{error, info};

use mail2tg_mime::header::parse_message;
use mail2tg_mime::walk::extract;

use crate::delivery::{compose, OutboundDelivery};
use crate::outbound::{deliver, ChatDelivery};
use crate::receivers::{DestinationId, Receivers};
use crate::RelayError;

/// A message as accepted by the listener.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub origin: SocketAddr,
    pub sender: String,
    /// Only the first one is used
    pub recipients: Vec<String>,
    pub data: Vec<u8>,
}

/// Everything needed to relay a message, built once at startup and
/// shared read-only between connections.
pub struct Relay {
    receivers: Receivers,
    client: Arc<dyn ChatDelivery + Send + Sync>,
}

impl Relay {
    pub fn new(receivers: Receivers, client: Arc<dyn ChatDelivery + Send + Sync>) -> Arc<Self> {
        Arc::new(Self { receivers, client })
    }

    /// Relay a message. Never fails: anything going wrong is logged and
    /// the message is dropped.
    pub async fn handle(&self, msg: InboundMessage) {
        let (to, delivery) = match self.prepare(&msg, &Local::now()) {
            Ok(x) => x,
            Err(e) => {
                error!(origin=%msg.origin, error=%e, "dropping mail");
                return;
            }
        };

        info!(chat_id=%to, "relaying message");
        if let Err(e) = deliver(self.client.as_ref(), to, delivery).await {
            error!(chat_id=%to, error=%e, "unable to deliver message");
        }
    }

    /// Parse, extract, route and compose, without sending anything.
    pub fn prepare<Tz: TimeZone>(
        &self,
        msg: &InboundMessage,
        received_at: &DateTime<Tz>,
    ) -> Result<(DestinationId, OutboundDelivery), RelayError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let recipient = msg.recipients.first().ok_or(RelayError::NoRecipient)?;
        let (headers, body) = parse_message(&msg.data)?;
        let subject = headers.get("Subject").unwrap_or_default();
        let from = msg.sender.trim_matches(' ');
        let to = Receivers::normalize(recipient);
        info!(origin=%msg.origin, from=%from, to=%to, subject=%subject, "received mail");

        let content = extract(&headers, body).map_err(RelayError::Content)?;
        let to = self.receivers.resolve(recipient)?;
        Ok((to, compose(content, subject, received_at)))
    }
}
