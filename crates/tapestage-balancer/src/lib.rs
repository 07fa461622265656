//! tapestage load balancer: whole-tape placement across readers.
//!
//! Given a [`Workload`](tapestage_core::Workload) and a reader count, the
//! balancer hands out tape groups one at a time, largest first, always to
//! the reader with the smallest accumulated size. A tape group is never
//! split. The pass is single-threaded, has no backtracking, and is fully
//! deterministic for a given input.
//!
//! # Components
//!
//! - **`assignment`**: Per-reader accumulation record
//! - **`placer`**: Ordering, least-loaded selection, size-budget variant
//! - **`plan`**: The finished set of assignments plus summary figures

pub mod assignment;
pub mod error;
pub mod placer;
pub mod plan;

pub use assignment::Assignment;
pub use error::{BalanceError, BalanceResult};
pub use placer::{BalanceStrategy, WorkerCount, balance, ordered_groups};
pub use plan::BalancePlan;
