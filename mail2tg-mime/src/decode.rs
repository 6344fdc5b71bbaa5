use std::borrow::Cow;

use base64::Engine;

use crate::types::*;

/// Undo the transfer encoding of a part body.
///
/// Only base64 is decoded; every other encoding, quoted-printable
/// included, is returned as is.
pub fn decode<'a>(body: &'a [u8], encoding: &TransferEncoding) -> Result<Cow<'a, [u8]>, MimeError> {
    match encoding {
        TransferEncoding::Base64 => {
            // Encoded bodies are wrapped at 76 columns
            let compact = body
                .iter()
                .copied()
                .filter(|c| *c != b'\r' && *c != b'\n')
                .collect::<Vec<_>>();
            let decoded = base64::engine::general_purpose::STANDARD.decode(compact)?;
            Ok(Cow::Owned(decoded))
        }
        TransferEncoding::SevenBit | TransferEncoding::EightBit | TransferEncoding::Identity => {
            Ok(Cow::Borrowed(body))
        }
    }
}
