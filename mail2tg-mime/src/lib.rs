//! A lenient reader for the handful of MIME features a mail relay needs.
//!
//! ## Layout
//!
//! ```text
//! header  RFC 5322 header block, Content-Type parsing and classification
//! decode  Content-Transfer-Encoding handling (base64, identity)
//! walk    depth-one multipart iteration and content extraction
//! ```
//!
//! ## RFC References
//!
//! Internet Message Format - https://datatracker.ietf.org/doc/html/rfc5322
//! MIME Part One (format) - https://datatracker.ietf.org/doc/html/rfc2045
//! MIME Part Two (media types) - https://datatracker.ietf.org/doc/html/rfc2046

pub mod decode;
pub mod header;
pub mod types;
pub mod walk;
