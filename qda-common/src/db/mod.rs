//! Project database access
//!
//! Read-only queries that materialise the flat rows consumed by
//! [`crate::analysis`], plus schema creation for new project databases.

pub mod init;
pub mod queries;
pub mod segments;

pub use init::init_project_database;
pub use queries::*;
pub use segments::{
    count_segments, search_segments, AttributeFilter, AttributeOperator, AttributeTarget,
    SegmentQuery,
};
