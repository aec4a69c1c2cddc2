//! HTTP middleware: access guard and request ID tracking.

pub mod guard;
pub mod request_id;
