pub mod delivery;
pub mod outbound;
pub mod receivers;
pub mod relay;

use thiserror::Error;

use mail2tg_mime::types::MimeError;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("no wildcard receiver (*) found in config")]
    MissingWildcard,
    #[error("message has no recipient")]
    NoRecipient,
    #[error("unreadable message: {0}")]
    Mail(#[from] MimeError),
    #[error("unable to extract content: {0}")]
    Content(MimeError),
    #[error("wrong chat id {0:?}: not int64")]
    InvalidDestinationId(String),
}
