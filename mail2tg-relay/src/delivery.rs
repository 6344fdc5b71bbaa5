use std::fmt;

use chrono::{DateTime, TimeZone};

use mail2tg_mime::types::ExtractedContent;

/// Name of the attachment carrying HTML mail
pub const REPORT_FILENAME: &str = "report.html";

/// `Mon, 02 Jan 2006 15:04:05 -0700`
pub const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormattingMode {
    Plain,
    /// Lightweight markup, `*bold*`. Sent as is, never escaped.
    Emphasis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundDelivery {
    TextMessage {
        body: String,
        mode: FormattingMode,
    },
    FileAttachment {
        filename: String,
        bytes: Vec<u8>,
        caption: String,
    },
}

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Build the one delivery a message turns into. Decoded HTML, when
/// present, is sent as a file and any text is dropped.
pub fn compose<Tz: TimeZone>(
    content: ExtractedContent,
    subject: &str,
    received_at: &DateTime<Tz>,
) -> OutboundDelivery
where
    Tz::Offset: fmt::Display,
{
    let timestamp = format_timestamp(received_at);

    if content.has_file() {
        return OutboundDelivery::FileAttachment {
            filename: REPORT_FILENAME.to_string(),
            bytes: content.file,
            caption: format!("{} ({})", subject, timestamp),
        };
    }

    OutboundDelivery::TextMessage {
        body: format!(
            "*{}* ({})\n{}",
            subject,
            timestamp,
            String::from_utf8_lossy(&content.text)
        ),
        mode: FormattingMode::Emphasis,
    }
}
