//! tapestage-dispatch: hands each reader's assignment to the retrieval tool.
//!
//! For every non-empty [`Assignment`](tapestage_balancer::Assignment) the
//! dispatcher spawns one tokio task that writes the reader's file list to a
//! temporary file and runs the retrieval command against it. Tasks share no
//! mutable state and a failing reader never stops its siblings.
//!
//! # Architecture
//!
//! ```text
//! Dispatcher
//!   ├── Retriever (external command seam; CommandRetriever in production)
//!   └── Per-reader task
//!       ├── FileListArtifact (temp file, removed on every exit path)
//!       └── deadline / shutdown race
//! ```
//!
//! [`DispatchHandle::wait`] joins every task into a [`DispatchReport`];
//! [`DispatchHandle::detach`] leaves them running in the background.

pub mod artifact;
pub mod dispatcher;
pub mod error;
pub mod report;
pub mod retriever;

pub use artifact::FileListArtifact;
pub use dispatcher::{DispatchHandle, Dispatcher};
pub use error::{DispatchError, DispatchResult};
pub use report::{DispatchReport, WorkerOutcome, WorkerStatus, WorkerSummary};
pub use retriever::{CommandRetriever, Retriever};
