//! # ferry-protocol
//!
//! The small slice of HTTP/1.1 the configuration portal speaks.
//!
//! Requests are read until their headers and announced body have arrived,
//! then parsed leniently; responses are complete HTML pages with
//! `Connection: close`. Form values use a fixed decoding table (see
//! [`codec`]).

pub mod codec;
pub mod request;
pub mod response;

pub use codec::{decode_form_value, parse_pairs};
pub use request::{is_complete, HttpRequest, Method, ParseError};
pub use response::{respond, HttpResponse, CHUNK_SIZE};
