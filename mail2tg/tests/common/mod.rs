#![allow(dead_code)]
pub mod constants;
pub mod fragments;

use std::collections::HashMap;
use std::io::Read;
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::watch;

use mail2tg::config::SmtpConfig;
use mail2tg::smtp::SmtpServer;
use mail2tg_relay::delivery::FormattingMode;
use mail2tg_relay::outbound::ChatDelivery;
use mail2tg_relay::receivers::{DestinationId, Receivers};
use mail2tg_relay::relay::Relay;

use constants::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat: i64,
        body: String,
        mode: FormattingMode,
    },
    File {
        chat: i64,
        filename: String,
        bytes: Vec<u8>,
        caption: String,
    },
}

/// Stands in for Telegram, keeps what would have been sent
#[derive(Default)]
pub struct Recorder {
    sent: Mutex<Vec<Sent>>,
}

impl Recorder {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatDelivery for Recorder {
    async fn send_text(&self, to: DestinationId, body: &str, mode: FormattingMode) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(Sent::Text {
                chat: to.0,
                body: body.to_string(),
                mode,
            });
        Ok(())
    }

    async fn send_file(
        &self,
        to: DestinationId,
        filename: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(Sent::File {
                chat: to.0,
                filename: filename.to_string(),
                bytes,
                caption: caption.to_string(),
            });
        Ok(())
    }
}

pub fn mail2tg_smtp_dev(
    mut fx: impl FnMut(&mut TcpStream, &Recorder) -> Result<()>,
) -> Result<()> {
    // Check port is not used (= free) before starting the test
    let mut max_retry = 20;
    loop {
        max_retry -= 1;
        match (TcpStream::connect(SMTP_ADDR), max_retry) {
            (Ok(_), 0) => bail!("something is listening on {} and prevent the test from starting", SMTP_ADDR),
            (Ok(_), _) => println!("something is listening on {}, maybe a previous server quitting, retrying soon...", SMTP_ADDR),
            (Err(_), _) => {
                println!("test ready to start, {} is free!", SMTP_ADDR);
                break
            }
        }
        thread::sleep(SMALL_DELAY);
    }

    // Start server, Telegram replaced by a recorder
    let recorder = Arc::new(Recorder::default());
    let receivers = Receivers::new(HashMap::from([
        ("*".to_string(), WILDCARD_CHAT.to_string()),
        ("ops@example.tld".to_string(), OPS_CHAT.to_string()),
        (BROKEN_RCPT.to_string(), "abc".to_string()),
    ]))?;
    let relay = Relay::new(receivers, recorder.clone());
    let server = SmtpServer::new(
        SmtpConfig {
            listen: SMTP_ADDR.to_string(),
            name: "mail2tg.test".to_string(),
        },
        relay,
    );
    let (exit_tx, exit_rx) = watch::channel(false);
    let daemon = thread::spawn(move || -> Result<()> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        rt.block_on(server.run(exit_rx))
    });

    // Check that our server is correctly listening on the free port
    let mut max_retry = 20;
    let mut smtp_socket = loop {
        max_retry -= 1;
        match (TcpStream::connect(SMTP_ADDR), max_retry) {
            (Err(e), 0) => bail!("no more retry, last error is: {}", e),
            (Err(e), _) => {
                println!("unable to connect: {} ; will retry soon...", e);
            }
            (Ok(v), _) => break v,
        }
        thread::sleep(SMALL_DELAY);
    };

    println!("-- ready to test smtp relay --");
    let result = fx(&mut smtp_socket, &recorder);
    println!("-- test teardown --");

    // the server may already have closed its side after QUIT
    let _ = smtp_socket.shutdown(Shutdown::Both);
    exit_tx.send(true).context("server should be told to exit")?;
    daemon
        .join()
        .map_err(|_| anyhow!("server thread panicked"))?
        .context("server should exit cleanly")?;

    result.context("all tests passed")
}

pub fn read_lines<'a, F: Read>(
    reader: &mut F,
    buffer: &'a mut [u8],
    stop_marker: Option<&[u8]>,
) -> Result<&'a [u8]> {
    let mut nbytes = 0;
    loop {
        let read = reader.read(&mut buffer[nbytes..])?;
        if read == 0 {
            bail!("connection closed after: {}", String::from_utf8_lossy(&buffer[..nbytes]));
        }
        nbytes += read;
        let pre_condition = match stop_marker {
            None => true,
            Some(mark) => buffer[..nbytes].windows(mark.len()).any(|w| w == mark),
        };
        if pre_condition && nbytes >= 2 && &buffer[nbytes - 2..nbytes] == &b"\r\n"[..] {
            break;
        }
    }
    println!("read: {}", std::str::from_utf8(&buffer[..nbytes])?);
    Ok(&buffer[..nbytes])
}
