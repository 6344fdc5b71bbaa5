use std::net::SocketAddr;
use std::time::Duration;
use std::{pin::Pin, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use duplexify::Duplex;
use futures::{io, AsyncRead, AsyncReadExt, AsyncWrite};
use futures::{stream, stream::FuturesUnordered, StreamExt};
use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::watch;
use tokio_util::compat::*;
use tracing::{debug, error, info, warn};

use smtp_message::{Email, EscapedDataReader, Reply, ReplyCode};
use smtp_server::{reply, Config, ConnectionMetadata, Decision, MailMetadata};

use mail2tg_relay::relay::{InboundMessage, Relay};

use crate::config::SmtpConfig;

pub struct SmtpServer {
    bind_addr: String,
    hostname: String,
    relay: Arc<Relay>,
}

impl SmtpServer {
    pub fn new(config: SmtpConfig, relay: Arc<Relay>) -> Arc<Self> {
        Arc::new(Self {
            bind_addr: config.listen,
            hostname: config.name,
            relay,
        })
    }

    pub async fn run(self: &Arc<Self>, mut must_exit: watch::Receiver<bool>) -> Result<()> {
        let tcp = TcpListener::bind(self.bind_addr.as_str()).await?;
        info!("SMTP server listening on {}", self.bind_addr);

        let mut connections = FuturesUnordered::new();

        while !*must_exit.borrow() {
            let wait_conn_finished = async {
                if connections.is_empty() {
                    futures::future::pending().await
                } else {
                    connections.next().await
                }
            };
            let (socket, remote_addr) = select! {
                a = tcp.accept() => match accepted(a) {
                    Some(x) => x,
                    None => {
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
                _ = wait_conn_finished => continue,
                _ = must_exit.changed() => continue,
            };
            debug!(%remote_addr, "smtp connection accepted");

            let conn = tokio::spawn(smtp_server::interact(
                socket.compat(),
                smtp_server::IsAlreadyTls::No,
                Conn { remote_addr },
                self.clone(),
            ));

            connections.push(conn);
        }
        drop(tcp);

        info!("SMTP server shutting down, draining remaining connections...");
        while connections.next().await.is_some() {}

        Ok(())
    }
}

/// Pause after a failed accept, so that running out of file descriptors
/// does not spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept errors (EMFILE, a connection reset before accept...) only
/// concern one client, the listener keeps going.
fn accepted<T>(res: io::Result<T>) -> Option<T> {
    match res {
        Ok(x) => Some(x),
        Err(e) => {
            error!(error=%e, "unable to accept smtp connection");
            None
        }
    }
}

// ----

pub struct Conn {
    remote_addr: SocketAddr,
}

/// Envelope collected while the SMTP transaction goes on
pub struct Envelope {
    from: String,
    to: Vec<String>,
}

fn address(email: &Email) -> String {
    match email.hostname.as_ref() {
        Some(h) => format!("{}@{}", email.localpart, h),
        None => email.localpart.to_string(),
    }
}

#[async_trait]
impl Config for SmtpServer {
    type Protocol = smtp_server::protocol::Smtp;

    type ConnectionUserMeta = Conn;
    type MailUserMeta = Envelope;

    fn hostname(&self, _conn_meta: &ConnectionMetadata<Conn>) -> &str {
        &self.hostname
    }

    fn can_do_tls(&self, _conn_meta: &ConnectionMetadata<Conn>) -> bool {
        false
    }

    async fn new_mail(&self, _conn_meta: &mut ConnectionMetadata<Conn>) -> Envelope {
        Envelope {
            from: String::new(),
            to: vec![],
        }
    }

    async fn tls_accept<IO>(
        &self,
        _io: IO,
        _conn_meta: &mut ConnectionMetadata<Conn>,
    ) -> io::Result<Duplex<Pin<Box<dyn Send + AsyncRead>>, Pin<Box<dyn Send + AsyncWrite>>>>
    where
        IO: Send + AsyncRead + AsyncWrite,
    {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "TLS not implemented for SMTP server",
        ))
    }

    async fn filter_from(
        &self,
        from: Option<Email>,
        meta: &mut MailMetadata<Envelope>,
        _conn_meta: &mut ConnectionMetadata<Conn>,
    ) -> Decision<Option<Email>> {
        meta.user.from = from.as_ref().map(address).unwrap_or_default();
        Decision::Accept {
            reply: reply::okay_from().convert(),
            res: from,
        }
    }

    async fn filter_to(
        &self,
        to: Email,
        meta: &mut MailMetadata<Envelope>,
        _conn_meta: &mut ConnectionMetadata<Conn>,
    ) -> Decision<Email> {
        meta.user.to.push(address(&to));
        Decision::Accept {
            reply: reply::okay_to().convert(),
            res: to,
        }
    }

    async fn handle_mail<'resp, R>(
        &'resp self,
        reader: &mut EscapedDataReader<'_, R>,
        meta: MailMetadata<Envelope>,
        conn_meta: &'resp mut ConnectionMetadata<Conn>,
    ) -> Pin<Box<dyn futures::Stream<Item = Decision<()>> + Send + 'resp>>
    where
        R: Send + Unpin + AsyncRead,
    {
        let mut data = Vec::new();
        if let Err(e) = reader.read_to_end(&mut data).await {
            warn!(error=%e, "unable to read mail data");
            return Box::pin(stream::once(async {
                Decision::Reject {
                    reply: Reply {
                        code: ReplyCode::POLICY_REASON,
                        ecode: None,
                        text: vec![smtp_message::MaybeUtf8::Utf8("io error".to_string())],
                    },
                }
            }));
        }
        reader.complete();

        // Whatever happens past this point the mail is accepted, a relay
        // failure is only logged
        self.relay
            .handle(InboundMessage {
                origin: conn_meta.user.remote_addr,
                sender: meta.user.from,
                recipients: meta.user.to,
                data,
            })
            .await;

        Box::pin(stream::once(async {
            Decision::Accept {
                reply: reply::okay_mail().convert(),
                res: (),
            }
        }))
    }
}
