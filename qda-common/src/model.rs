//! Project data models
//!
//! Rows as read from a project database. Identifiers are the SQLite integer
//! keys (`catid`, `cid`, `source.id`).

use serde::{Deserialize, Serialize};

/// A grouping node in the code hierarchy (`code_cat`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Parent category (`supercatid`); `None` for top-level categories
    pub parent_id: Option<i64>,
    pub owner: Option<String>,
    pub memo: Option<String>,
    pub date: Option<String>,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
            owner: None,
            memo: None,
            date: None,
        }
    }
}

/// A code applied to spans of data (`code_name`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub id: i64,
    pub name: String,
    /// Owning category (`catid`); `None` for unfiled codes
    pub category_id: Option<i64>,
    pub owner: Option<String>,
    pub memo: Option<String>,
    pub date: Option<String>,
    /// Display color, e.g. `#F8E0E0`
    pub color: Option<String>,
}

impl Code {
    pub fn new(id: i64, name: impl Into<String>, category_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            category_id,
            owner: None,
            memo: None,
            date: None,
            color: None,
        }
    }
}

/// One coded text interval `[start, end)` within a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedInterval {
    pub code_id: i64,
    pub document_id: i64,
    pub coder: String,
    pub start: i64,
    pub end: i64,
}

/// Character length of a text document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLength {
    pub document_id: i64,
    pub length: usize,
}

/// One coded occurrence (text or image) attributed to a coder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingOwner {
    pub code_id: i64,
    pub coder: String,
}

/// Where a coded segment lies within its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentRegion {
    /// Character range of a text source, with the coded text
    Text {
        start: i64,
        end: i64,
        text: Option<String>,
    },
    /// Rectangle on an image, in pixels
    Image {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
    /// Time range of an audio or video source, in milliseconds
    Av { start: i64, end: i64 },
}

/// A coded segment returned by segment search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodedSegment {
    pub code_id: i64,
    pub code_name: String,
    pub color: Option<String>,
    pub file_id: i64,
    pub file_name: String,
    /// Media file for image, audio and video sources
    pub media_path: Option<String>,
    pub coder: Option<String>,
    pub memo: Option<String>,
    #[serde(flatten)]
    pub region: SegmentRegion,
}
