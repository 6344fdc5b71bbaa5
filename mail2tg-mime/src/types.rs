use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MimeError {
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),
    #[error("malformed content-type: {0:?}")]
    MalformedContentType(String),
    #[error("multipart content-type has no boundary parameter")]
    MissingBoundary,
    #[error("no boundary delimiter found in multipart body")]
    MissingDelimiter,
    #[error("multipart part is not followed by a boundary delimiter")]
    UnterminatedPart,
    #[error("base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Header fields in their original order, values already unfolded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers(pub Vec<(String, String)>);

impl Headers {
    /// First value of the field, name matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentType {
    /// Lowercased `type/subtype`
    pub media_type: String,
    /// Lowercased names, verbatim values
    pub params: HashMap<String, String>,
}

impl ContentType {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn kind(&self) -> Result<MediaKind, MimeError> {
        if self.media_type.starts_with("multipart/") {
            return self
                .param("boundary")
                .map(|b| MediaKind::Multipart(b.to_string()))
                .ok_or(MimeError::MissingBoundary);
        }

        Ok(match self.media_type.as_str() {
            "text/html" => MediaKind::Html,
            "text/plain" => MediaKind::PlainText,
            other => MediaKind::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    PlainText,
    Html,
    Multipart(String),
    Other(String),
}

impl MediaKind {
    /// Classify a part from its raw `Content-Type` value.
    ///
    /// Parts are matched by prefix on the value as it was received, so
    /// `text/html; charset=utf-8` is HTML but `TEXT/HTML` is not. Parts
    /// are never descended into, a nested multipart is `Other`.
    pub fn sniff(raw: &str) -> Self {
        if raw.starts_with("text/html") {
            MediaKind::Html
        } else if raw.starts_with("text/plain") {
            MediaKind::PlainText
        } else {
            MediaKind::Other(raw.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEncoding {
    SevenBit,
    EightBit,
    Base64,
    /// Anything else, including an absent header. Passed through untouched.
    Identity,
}

impl TransferEncoding {
    /// Maps a `Content-Transfer-Encoding` value. Matching is exact:
    /// `BASE64` is not base64.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some("base64") => TransferEncoding::Base64,
            Some("7bit") => TransferEncoding::SevenBit,
            Some("8bit") => TransferEncoding::EightBit,
            _ => TransferEncoding::Identity,
        }
    }
}

/// One depth-one part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentPart<'a> {
    /// Raw `Content-Type` value, empty when the part has none
    pub content_type: String,
    pub encoding: TransferEncoding,
    pub body: &'a [u8],
}

impl<'a> ContentPart<'a> {
    pub fn kind(&self) -> MediaKind {
        MediaKind::sniff(&self.content_type)
    }
}

/// What the walker kept from a message.
///
/// `file` holds decoded HTML and wins over `text` when both are filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub text: Vec<u8>,
    pub file: Vec<u8>,
}

impl ExtractedContent {
    pub fn has_file(&self) -> bool {
        !self.file.is_empty()
    }
}
