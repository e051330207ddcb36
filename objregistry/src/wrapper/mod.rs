//! Wrappers around [`crate::EndpointResolver`] implementations.

#[cfg(feature = "tracing")]
pub mod trace;
