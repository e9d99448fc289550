//! HTTP API handlers for qda-rv

pub mod coders;
pub mod comparisons;
pub mod error;
pub mod frequencies;
pub mod health;
pub mod segments;
pub mod tree;

pub use coders::get_coders;
pub use comparisons::{export_comparisons, get_comparisons};
pub use error::ApiError;
pub use frequencies::{export_frequencies, get_frequencies};
pub use health::health_routes;
pub use segments::search_segments;
pub use tree::get_code_tree;
