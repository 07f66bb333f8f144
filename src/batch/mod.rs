//! Bounded fan-out of per-URL remote calls
//!
//! Turns an ordered list of sitemap entries into concurrent remote calls and
//! collates the results back into input order.
//!
//! - [`partition`] - splits entries into fixed-size batches
//! - [`collator`] - invocation-scoped URL -> result map
//! - [`scheduler`] - nested batch / per-URL task groups

mod collator;
mod partition;
mod scheduler;

pub use collator::Collator;
pub use partition::{create_batches, DEFAULT_BATCH_SIZE};
pub use scheduler::{fan_out, BatchOptions, Collated};
