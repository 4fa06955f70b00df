pub mod event;
pub mod executor;
pub mod filter;
pub mod normalizer;
pub mod producer;
pub mod snapshot;

pub use event::RawEvent;
pub use executor::{Outcome, PublishPipeline};
