//! Coded segment search
//!
//! Selects coded text, coded image regions and coded audio/video ranges for
//! a set of codes. Results can be restricted to files, to cases, to one
//! coder, to a text fragment, and to files or cases whose attributes match.
//!
//! A text segment belongs to a case when it lies inside one of the case's
//! spans of the same file. Image and av segments belong to every case linked
//! to their file. The search fragment is matched against the coded text of
//! text segments and against the memo of image and av segments.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::model::{CodedSegment, SegmentRegion};
use crate::{Error, Result};

/// Whether an attribute describes files or cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeTarget {
    File,
    Case,
}

impl AttributeTarget {
    /// Value of `attribute.attr_type`
    fn attr_type(self) -> &'static str {
        match self {
            AttributeTarget::File => "file",
            AttributeTarget::Case => "case",
        }
    }
}

/// Comparison between an attribute value and the filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeOperator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<>")]
    NotEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
}

impl AttributeOperator {
    fn sql(self) -> &'static str {
        match self {
            AttributeOperator::Equal => "=",
            AttributeOperator::NotEqual => "<>",
            AttributeOperator::Less => "<",
            AttributeOperator::LessOrEqual => "<=",
            AttributeOperator::Greater => ">",
            AttributeOperator::GreaterOrEqual => ">=",
            AttributeOperator::Like => "LIKE",
            AttributeOperator::Between => "BETWEEN",
            AttributeOperator::In => "IN",
            AttributeOperator::NotIn => "NOT IN",
        }
    }

    fn accepts(self, value_count: usize) -> bool {
        match self {
            AttributeOperator::Between => value_count == 2,
            AttributeOperator::In | AttributeOperator::NotIn => value_count > 0,
            _ => value_count == 1,
        }
    }
}

/// Selects files or cases by the value of one of their attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    /// Attribute name (`attribute.name`)
    pub name: String,
    pub target: AttributeTarget,
    pub operator: AttributeOperator,
    pub values: Vec<String>,
    /// Compare as numbers (`CAST(value AS REAL)`) rather than as text
    #[serde(default)]
    pub numeric: bool,
}

enum BoundValue<'a> {
    Text(&'a str),
    Number(f64),
}

/// An attribute filter with its values checked and converted for binding
struct PreparedAttribute<'a> {
    filter: &'a AttributeFilter,
    values: Vec<BoundValue<'a>>,
}

impl AttributeFilter {
    fn prepare(&self) -> Result<PreparedAttribute<'_>> {
        if !self.operator.accepts(self.values.len()) {
            return Err(Error::InvalidInput(format!(
                "attribute '{}': {} does not take {} value(s)",
                self.name,
                self.operator.sql(),
                self.values.len()
            )));
        }
        if self.numeric && self.operator == AttributeOperator::Like {
            return Err(Error::InvalidInput(format!(
                "attribute '{}': LIKE compares text, not numbers",
                self.name
            )));
        }

        let values = self
            .values
            .iter()
            .map(|value| {
                if !self.numeric {
                    return Ok(BoundValue::Text(value.as_str()));
                }
                value.trim().parse::<f64>().map(BoundValue::Number).map_err(|_| {
                    Error::InvalidInput(format!(
                        "attribute '{}': '{}' is not a number",
                        self.name, value
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PreparedAttribute {
            filter: self,
            values,
        })
    }
}

/// Segment search filters; empty lists and `None` mean "no restriction"
/// except for `code_ids`, which must name at least one code to match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentQuery {
    pub code_ids: Vec<i64>,
    pub file_ids: Vec<i64>,
    pub case_ids: Vec<i64>,
    pub coder: Option<String>,
    pub search_text: Option<String>,
    /// Every filter must match (file filters on the segment's file, case
    /// filters on one case containing the segment)
    pub attributes: Vec<AttributeFilter>,
}

impl SegmentQuery {
    fn prepare_attributes(&self) -> Result<Vec<PreparedAttribute<'_>>> {
        self.attributes.iter().map(AttributeFilter::prepare).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Text,
    Image,
    Av,
}

/// Display order of kinds within one code and file
const SEGMENT_KINDS: [SegmentKind; 3] = [SegmentKind::Text, SegmentKind::Image, SegmentKind::Av];

impl SegmentKind {
    fn rank(self) -> i64 {
        match self {
            SegmentKind::Text => 0,
            SegmentKind::Image => 1,
            SegmentKind::Av => 2,
        }
    }

    fn from_rank(rank: i64) -> Option<Self> {
        SEGMENT_KINDS.into_iter().find(|kind| kind.rank() == rank)
    }

    fn table(self) -> &'static str {
        match self {
            SegmentKind::Text => "code_text",
            SegmentKind::Image => "code_image",
            SegmentKind::Av => "code_av",
        }
    }

    /// Column holding the source id
    fn file_column(self) -> &'static str {
        match self {
            SegmentKind::Text => "code_text.fid",
            SegmentKind::Image => "code_image.id",
            SegmentKind::Av => "code_av.id",
        }
    }

    fn search_column(self) -> &'static str {
        match self {
            SegmentKind::Text => "code_text.seltext",
            SegmentKind::Image => "code_image.memo",
            SegmentKind::Av => "code_av.memo",
        }
    }

    /// pos0, pos1, x, y, width, height, seltext
    fn region_columns(self) -> &'static str {
        match self {
            SegmentKind::Text => {
                "code_text.pos0 AS pos0, code_text.pos1 AS pos1, NULL AS x, NULL AS y, \
                 NULL AS width, NULL AS height, code_text.seltext AS seltext"
            }
            SegmentKind::Image => {
                "NULL AS pos0, NULL AS pos1, CAST(code_image.x1 AS INTEGER) AS x, \
                 CAST(code_image.y1 AS INTEGER) AS y, CAST(code_image.width AS INTEGER) AS width, \
                 CAST(code_image.height AS INTEGER) AS height, NULL AS seltext"
            }
            SegmentKind::Av => {
                "code_av.pos0 AS pos0, code_av.pos1 AS pos1, NULL AS x, NULL AS y, \
                 NULL AS width, NULL AS height, NULL AS seltext"
            }
        }
    }

    /// Ties a segment to a `case_text` span of its file
    fn case_span_condition(self) -> String {
        let mut condition = format!("case_text.fid = {}", self.file_column());
        if self == SegmentKind::Text {
            condition.push_str(
                " AND code_text.pos0 >= case_text.pos0 AND code_text.pos1 <= case_text.pos1",
            );
        }
        condition
    }
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

fn push_value<'a>(builder: &mut QueryBuilder<'a, Sqlite>, value: &BoundValue<'a>) {
    match value {
        BoundValue::Text(text) => builder.push_bind(*text),
        BoundValue::Number(number) => builder.push_bind(*number),
    };
}

/// Subquery selecting the ids of files or cases matching one attribute filter
fn push_attribute_ids<'a>(builder: &mut QueryBuilder<'a, Sqlite>, attribute: &PreparedAttribute<'a>) {
    let filter = attribute.filter;
    builder
        .push("SELECT id FROM attribute WHERE attr_type = ")
        .push_bind(filter.target.attr_type())
        .push(" AND name = ")
        .push_bind(filter.name.as_str())
        .push(if filter.numeric {
            " AND CAST(value AS REAL) "
        } else {
            " AND value "
        })
        .push(filter.operator.sql());

    match (filter.operator, attribute.values.as_slice()) {
        (AttributeOperator::Between, [low, high]) => {
            builder.push(" ");
            push_value(builder, low);
            builder.push(" AND ");
            push_value(builder, high);
        }
        (AttributeOperator::In | AttributeOperator::NotIn, values) => {
            builder.push(" (");
            let mut separated = builder.separated(", ");
            for value in values {
                match value {
                    BoundValue::Text(text) => separated.push_bind(*text),
                    BoundValue::Number(number) => separated.push_bind(*number),
                };
            }
            separated.push_unseparated(")");
        }
        (_, [value]) => {
            builder.push(" ");
            push_value(builder, value);
        }
        // Value counts are checked when the filter is prepared
        _ => {
            builder.push(" NULL");
        }
    }
}

/// One SELECT of the segment union, for one kind of coding
fn push_kind_select<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    kind: SegmentKind,
    query: &'a SegmentQuery,
    attributes: &[PreparedAttribute<'a>],
) {
    let table = kind.table();
    let file_column = kind.file_column();

    builder.push(format!(
        "SELECT {rank} AS kind_rank, {table}.cid AS code_id, code_name.name AS code_name, \
         code_name.color AS color, source.id AS file_id, source.name AS file_name, \
         source.mediapath AS media_path, {table}.owner AS coder, {table}.memo AS memo, \
         {region} \
         FROM {table} \
         JOIN code_name ON code_name.cid = {table}.cid \
         JOIN source ON source.id = {file_column} \
         WHERE {table}.cid IN (",
        rank = kind.rank(),
        region = kind.region_columns(),
    ));
    push_id_list(builder, &query.code_ids);

    if !query.file_ids.is_empty() {
        builder.push(format!(" AND {} IN (", file_column));
        push_id_list(builder, &query.file_ids);
    }

    if !query.case_ids.is_empty() {
        builder.push(format!(
            " AND EXISTS (SELECT 1 FROM case_text WHERE {} AND case_text.caseid IN (",
            kind.case_span_condition()
        ));
        push_id_list(builder, &query.case_ids);
        builder.push(")");
    }

    if let Some(coder) = &query.coder {
        builder
            .push(format!(" AND {}.owner = ", table))
            .push_bind(coder.as_str());
    }

    if let Some(text) = &query.search_text {
        builder
            .push(format!(" AND {} LIKE ", kind.search_column()))
            .push_bind(format!("%{}%", text));
    }

    for attribute in attributes
        .iter()
        .filter(|a| a.filter.target == AttributeTarget::File)
    {
        builder.push(format!(" AND {} IN (", file_column));
        push_attribute_ids(builder, attribute);
        builder.push(")");
    }

    let mut case_attributes = attributes
        .iter()
        .filter(|a| a.filter.target == AttributeTarget::Case)
        .peekable();
    if case_attributes.peek().is_some() {
        builder.push(format!(
            " AND EXISTS (SELECT 1 FROM case_text WHERE {}",
            kind.case_span_condition()
        ));
        for attribute in case_attributes {
            builder.push(" AND case_text.caseid IN (");
            push_attribute_ids(builder, attribute);
            builder.push(")");
        }
        builder.push(")");
    }
}

fn push_segment_union<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    query: &'a SegmentQuery,
    attributes: &[PreparedAttribute<'a>],
) {
    for (i, kind) in SEGMENT_KINDS.into_iter().enumerate() {
        if i > 0 {
            builder.push(" UNION ALL ");
        }
        push_kind_select(builder, kind, query, attributes);
    }
}

/// Number of segments matching `query`
///
/// # Errors
/// Returns [`Error::InvalidInput`] for a malformed attribute filter.
pub async fn count_segments(pool: &SqlitePool, query: &SegmentQuery) -> Result<i64> {
    if query.code_ids.is_empty() {
        return Ok(0);
    }
    let attributes = query.prepare_attributes()?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM (");
    push_segment_union(&mut builder, query, &attributes);
    builder.push(")");

    let count = builder.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count)
}

type SegmentRow = (
    i64,
    String,
    Option<String>,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
);

fn segment_from_row(row: SegmentRow) -> Result<CodedSegment> {
    let (
        code_id,
        code_name,
        color,
        file_id,
        file_name,
        media_path,
        coder,
        memo,
        kind_rank,
        pos0,
        pos1,
        x,
        y,
        width,
        height,
        text,
    ) = row;

    let region = match SegmentKind::from_rank(kind_rank) {
        Some(SegmentKind::Text) => SegmentRegion::Text {
            start: pos0.unwrap_or_default(),
            end: pos1.unwrap_or_default(),
            text,
        },
        Some(SegmentKind::Image) => SegmentRegion::Image {
            x: x.unwrap_or_default(),
            y: y.unwrap_or_default(),
            width: width.unwrap_or_default(),
            height: height.unwrap_or_default(),
        },
        Some(SegmentKind::Av) => SegmentRegion::Av {
            start: pos0.unwrap_or_default(),
            end: pos1.unwrap_or_default(),
        },
        None => {
            return Err(Error::Internal(format!(
                "unknown segment kind {}",
                kind_rank
            )))
        }
    };

    Ok(CodedSegment {
        code_id,
        code_name,
        color,
        file_id,
        file_name,
        media_path,
        coder,
        memo,
        region,
    })
}

/// Segments matching `query`, ordered by code name, file name, kind (text,
/// image, av) and position
///
/// # Errors
/// Returns [`Error::InvalidInput`] for a malformed attribute filter.
pub async fn search_segments(
    pool: &SqlitePool,
    query: &SegmentQuery,
    limit: i64,
    offset: i64,
) -> Result<Vec<CodedSegment>> {
    if query.code_ids.is_empty() {
        return Ok(Vec::new());
    }
    let attributes = query.prepare_attributes()?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT code_id, code_name, color, file_id, file_name, media_path, coder, memo, \
         kind_rank, pos0, pos1, x, y, width, height, seltext FROM (",
    );
    push_segment_union(&mut builder, query, &attributes);
    builder
        .push(") ORDER BY code_name, file_name, kind_rank, pos0, y, x LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = builder
        .build_query_as::<SegmentRow>()
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(segment_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(operator: AttributeOperator, values: &[&str], numeric: bool) -> AttributeFilter {
        AttributeFilter {
            name: "age".to_string(),
            target: AttributeTarget::Case,
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
            numeric,
        }
    }

    #[test]
    fn test_attribute_value_counts() {
        assert!(filter(AttributeOperator::Equal, &["30"], true).prepare().is_ok());
        assert!(filter(AttributeOperator::Equal, &[], false).prepare().is_err());
        assert!(filter(AttributeOperator::Between, &["20", "40"], true).prepare().is_ok());
        assert!(filter(AttributeOperator::Between, &["20"], true).prepare().is_err());
        assert!(filter(AttributeOperator::In, &["a", "b", "c"], false).prepare().is_ok());
        assert!(filter(AttributeOperator::NotIn, &[], false).prepare().is_err());
    }

    #[test]
    fn test_numeric_attribute_values_must_parse() {
        let err = filter(AttributeOperator::Greater, &["thirty"], true)
            .prepare()
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(filter(AttributeOperator::Like, &["3%"], true).prepare().is_err());
        assert!(filter(AttributeOperator::Like, &["3%"], false).prepare().is_ok());
    }

    #[test]
    fn test_attribute_filter_json() {
        let parsed: AttributeFilter = serde_json::from_str(
            r#"{"name": "age", "target": "case", "operator": "not in", "values": ["1", "2"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.operator, AttributeOperator::NotIn);
        assert_eq!(parsed.target, AttributeTarget::Case);
        assert!(!parsed.numeric);
    }

    #[test]
    fn test_kind_rank_round_trip() {
        for kind in SEGMENT_KINDS {
            assert_eq!(SegmentKind::from_rank(kind.rank()), Some(kind));
        }
        assert_eq!(SegmentKind::from_rank(7), None);
    }
}
