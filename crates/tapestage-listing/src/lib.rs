//! Source listing adapter.
//!
//! Turns the output of the tape listing tool into a normalized
//! [`Workload`](tapestage_core::Workload). Nothing downstream sees listing
//! text; the balancer only consumes the workload.
//!
//! # Components
//!
//! - **`parse`**: Line formats and listing text → workload
//! - **`source`**: Where the listing comes from (tool invocation or a captured file)

pub mod error;
pub mod parse;
pub mod source;

pub use error::{ListingError, ListingResult};
pub use parse::parse_listing;
pub use source::{ListingSource, fetch_listing, load_workload};
