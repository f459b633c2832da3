//! Command scheduling module
//!
//! - `router` - Classification policy: run once, queue as VIP, or retry
//! - `priority_queue` - Shared max-priority queue of VIP commands
//! - `workers` - Worker pool draining the VIP queue

pub mod priority_queue;
pub mod router;
pub mod workers;

pub use priority_queue::{VipEntry, VipQueue};
pub use router::{CommandRouter, RetriesExhausted, RetryPolicy, RouteOutcome};
pub use workers::PriorityScheduler;
