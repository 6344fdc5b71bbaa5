use tracing::{info, warn};

use crate::decode::decode;
use crate::header::{content_type, parse_message};
use crate::types::*;

/// Pull the relayable content out of a parsed message.
///
/// | top-level type | kept                                   |
/// |----------------|----------------------------------------|
/// | `multipart/*`  | every `text/html` part, decoded, as file |
/// | `text/html`    | the body, decoded, as file             |
/// | anything else  | the raw body, verbatim, as text        |
///
/// A part that can't be read, or a single html body that can't be
/// decoded, fails the whole message. Inside a readable multipart, an
/// html part that fails to decode is logged and skipped. A malformed
/// `Content-Type` makes the body opaque text.
pub fn extract(headers: &Headers, body: &[u8]) -> Result<ExtractedContent, MimeError> {
    let mut content = ExtractedContent::default();

    match classify(headers) {
        MediaKind::Multipart(boundary) => {
            for part in Parts::new(body, &boundary) {
                let part = part?;
                info!(content_type=%part.content_type, "found part");

                if part.kind() != MediaKind::Html {
                    continue;
                }
                match decode(part.body, &part.encoding) {
                    Ok(bytes) => content.file.extend_from_slice(&bytes),
                    Err(e) => warn!(error=%e, "skipping undecodable html part"),
                }
            }
        }
        MediaKind::Html => {
            let encoding = TransferEncoding::from_header(headers.get("Content-Transfer-Encoding"));
            content.file.extend_from_slice(&decode(body, &encoding)?);
        }
        MediaKind::PlainText | MediaKind::Other(_) => content.text.extend_from_slice(body),
    }

    Ok(content)
}

/// Top-level classification. Anything that can't be understood
/// degrades to plain text.
pub fn classify(headers: &Headers) -> MediaKind {
    let raw = match headers.get("Content-Type") {
        Some(v) => v,
        None => return MediaKind::PlainText,
    };

    match content_type(raw).and_then(|ct| ct.kind()) {
        Ok(kind) => kind,
        Err(e) => {
            warn!(error=%e, "unusable content-type, reading body as plain text");
            MediaKind::PlainText
        }
    }
}

/// Depth-one iterator over the parts of a multipart body.
///
/// Single pass, borrowed from the body. Each item is either a part or
/// the reason it could not be read; iteration stops at the close
/// delimiter, or after an error that leaves no delimiter to resync on.
pub struct Parts<'a> {
    body: &'a [u8],
    dash_boundary: Vec<u8>,
    cursor: usize,
    state: PartsState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PartsState {
    Preamble,
    InPart,
    Done,
}

struct Delimiter {
    /// End of the content before the delimiter line, line break excluded
    content_end: usize,
    /// First byte after the delimiter line
    next: usize,
    close: bool,
}

impl<'a> Parts<'a> {
    pub fn new(body: &'a [u8], boundary: &str) -> Self {
        Self {
            body,
            dash_boundary: format!("--{}", boundary).into_bytes(),
            cursor: 0,
            state: PartsState::Preamble,
        }
    }

    /// A delimiter is `--boundary` (or `--boundary--`) at the start of a
    /// line, followed by optional padding and the end of the line.
    fn next_delimiter(&self) -> Option<Delimiter> {
        let from = self.cursor;
        let mut search = from;

        while let Some(pos) = find(&self.body[search..], &self.dash_boundary).map(|p| p + search) {
            search = pos + 1;

            let at_line_start = (pos == 0 && from == 0) || (pos > 0 && self.body[pos - 1] == b'\n');
            if !at_line_start {
                continue;
            }

            let after = &self.body[pos + self.dash_boundary.len()..];
            let (close, after) = match after.strip_prefix(b"--") {
                Some(rest) => (true, rest),
                None => (false, after),
            };
            let padding = after.iter().take_while(|c| **c == b' ' || **c == b'\t').count();
            let tail = &after[padding..];
            let eol = if tail.starts_with(b"\r\n") {
                2
            } else if tail.starts_with(b"\n") || tail.is_empty() {
                tail.len().min(1)
            } else {
                continue;
            };

            let content_end = match pos {
                0 => 0,
                p if p >= 2 && self.body[p - 2] == b'\r' => p - 2,
                p => p - 1,
            };
            return Some(Delimiter {
                content_end: content_end.max(from),
                next: self.body.len() - tail.len() + eol,
                close,
            });
        }

        None
    }
}

impl<'a> Iterator for Parts<'a> {
    type Item = Result<ContentPart<'a>, MimeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                PartsState::Done => return None,
                PartsState::Preamble => match self.next_delimiter() {
                    None => {
                        self.state = PartsState::Done;
                        return Some(Err(MimeError::MissingDelimiter));
                    }
                    Some(d) if d.close => {
                        self.state = PartsState::Done;
                        return None;
                    }
                    Some(d) => {
                        self.cursor = d.next;
                        self.state = PartsState::InPart;
                    }
                },
                PartsState::InPart => {
                    let start = self.cursor;
                    let delimiter = match self.next_delimiter() {
                        Some(d) => d,
                        None => {
                            self.state = PartsState::Done;
                            return Some(Err(MimeError::UnterminatedPart));
                        }
                    };

                    self.cursor = delimiter.next;
                    if delimiter.close {
                        self.state = PartsState::Done;
                    }
                    let body = self.body;
                    return Some(read_part(&body[start..delimiter.content_end]));
                }
            }
        }
    }
}

fn read_part(raw: &[u8]) -> Result<ContentPart<'_>, MimeError> {
    let (headers, body) = parse_message(raw)?;
    Ok(ContentPart {
        content_type: headers.get("Content-Type").unwrap_or_default().to_string(),
        encoding: TransferEncoding::from_header(headers.get("Content-Transfer-Encoding")),
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
