//! Report computations over a snapshot of project data
//!
//! - [`tree`]: flat category/code rows into a forest
//! - [`frequency`]: per-coder code and category frequencies
//! - [`agreement`]: two-coder agreement and Cohen's Kappa on coded text
//!
//! All functions are synchronous and take owned or borrowed snapshots; none
//! of them touch the database.

pub mod agreement;
pub mod frequency;
pub mod tree;

pub use agreement::{
    calculate_agreement, compare_codes, AgreementSummary, CodeComparison, CoderPair,
    ComparisonOutcome, DocumentAgreement, Kappa, UndefinedReason,
};
pub use frequency::{aggregate, tally_codings, CodeCounts, CodeFrequency, FrequencyReport, FrequencyRow};
pub use tree::{CodeTree, EntityRef, TreeNode};
