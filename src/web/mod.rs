//! HTTP-facing streaming layer.

pub mod stream_handlers;
