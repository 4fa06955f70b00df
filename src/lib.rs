//! Publishes Asterisk manager (AMI) events to Kafka.
//!
//! Events are filtered with manager.conf-style `eventfilter` rules,
//! rendered as JSON or raw AMI text with the node's identity injected,
//! and handed to a non-blocking producer.

pub mod config;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod server;
pub mod sources;

pub use error::{AppError, Result};
pub use pipeline::{Outcome, PublishPipeline, RawEvent};
