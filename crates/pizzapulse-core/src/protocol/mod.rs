//! Protocol modules (inbound events + outbound lines).
//!
//! - `event`: the vocabulary the request-handling layer reports in (HTTP method,
//!   auth outcome, session shape, request shape).
//! - `line`: the text line pushed to the time-series sink.
//!
//! Classification is permissive: a foreign-shaped method or status maps to
//! "nothing to record" instead of an error.

pub mod event;
pub mod line;
