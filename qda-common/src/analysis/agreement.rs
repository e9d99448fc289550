//! Inter-coder agreement over coded text
//!
//! For one code and two coders, every character of every text document is
//! counted as uncoded, coded by one of the coders, or coded by both. From
//! those counts the calculator derives percent agreement and a Cohen's Kappa
//! taken over the characters coded by either coder.
//!
//! Kappa uses `Pe = Pyes * Pno`. Reports produced by earlier releases rely on
//! that value, so it is kept even though the textbook form is `Pyes + Pno`.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::tree::CodeTree;
use crate::model::{CodedInterval, DocumentLength};
use crate::{Error, Result};

/// The two coders being compared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoderPair {
    first: String,
    second: String,
}

impl CoderPair {
    /// Both coders must be named and must differ
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Result<Self> {
        let first = first.into();
        let second = second.into();
        if first.is_empty() || second.is_empty() {
            return Err(Error::InvalidInput("two coders must be selected".to_string()));
        }
        if first == second {
            return Err(Error::InvalidInput(format!(
                "cannot compare coder {} with themself",
                first
            )));
        }
        Ok(Self { first, second })
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// Same coders, opposite order
    pub fn swapped(&self) -> Self {
        Self {
            first: self.second.clone(),
            second: self.first.clone(),
        }
    }
}

impl fmt::Display for CoderPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.first, self.second)
    }
}

/// Why Kappa could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    DivisionByZero,
}

/// Cohen's Kappa, or the reason it is undefined
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Kappa {
    Defined { value: f64 },
    Undefined { reason: UndefinedReason },
}

impl Kappa {
    pub fn value(&self) -> Option<f64> {
        match self {
            Kappa::Defined { value } => Some(*value),
            Kappa::Undefined { .. } => None,
        }
    }
}

impl fmt::Display for Kappa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kappa::Defined { value } => write!(f, "{}", DecimalDisplay(*value)),
            Kappa::Undefined {
                reason: UndefinedReason::DivisionByZero,
            } => write!(f, "undefined (division by zero)"),
        }
    }
}

/// Character counts for one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentAgreement {
    pub document_id: i64,
    pub characters: u64,
    pub uncoded: u64,
    pub single_coded: u64,
    pub dual_coded: u64,
    /// Characters coded by the first coder, counted once per interval
    pub coded_first: u64,
    /// Characters coded by the second coder, counted once per interval
    pub coded_second: u64,
}

/// Agreement between two coders for one code across the corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementSummary {
    pub code_id: i64,
    pub characters: u64,
    pub uncoded: u64,
    pub single_coded: u64,
    pub dual_coded: u64,
    pub coded_first: u64,
    pub coded_second: u64,
    /// Characters coded by either coder
    pub unique_codings: u64,
    pub agreement_percent: f64,
    pub disagreement_percent: f64,
    pub dual_coded_percent: f64,
    pub uncoded_percent: f64,
    pub kappa: Kappa,
    pub documents: Vec<DocumentAgreement>,
}

/// Compare two coders' use of one code over all text documents
///
/// `intervals` may hold rows for other codes and coders; they are ignored.
/// Every document in `documents` contributes its length, coded or not.
///
/// # Errors
/// - [`Error::MissingDocument`] if an interval names a document not in `documents`
/// - [`Error::IntervalOutOfBounds`] if an interval ends past its document or
///   starts after it ends
pub fn calculate_agreement(
    code_id: i64,
    pair: &CoderPair,
    documents: &[DocumentLength],
    intervals: &[CodedInterval],
) -> Result<AgreementSummary> {
    let lengths: HashMap<i64, usize> = documents
        .iter()
        .map(|doc| (doc.document_id, doc.length))
        .collect();

    // Per document: (first coder intervals, second coder intervals)
    let mut by_document: HashMap<i64, (Vec<&CodedInterval>, Vec<&CodedInterval>)> =
        HashMap::new();
    for interval in intervals.iter().filter(|i| i.code_id == code_id) {
        let is_first = interval.coder == pair.first;
        if !is_first && interval.coder != pair.second {
            continue;
        }
        let length = *lengths
            .get(&interval.document_id)
            .ok_or(Error::MissingDocument {
                code_id,
                document_id: interval.document_id,
            })?;
        if interval.start < 0 || interval.start > interval.end || interval.end > length as i64 {
            return Err(Error::IntervalOutOfBounds {
                code_id,
                document_id: interval.document_id,
                start: interval.start,
                end: interval.end,
                length,
            });
        }
        let entry = by_document.entry(interval.document_id).or_default();
        if is_first {
            entry.0.push(interval);
        } else {
            entry.1.push(interval);
        }
    }

    let no_intervals = (Vec::new(), Vec::new());
    let per_document: Vec<DocumentAgreement> = documents
        .iter()
        .map(|doc| {
            let (first, second) = by_document.get(&doc.document_id).unwrap_or(&no_intervals);
            document_coverage(doc, first, second)
        })
        .collect();

    Ok(summarize(code_id, per_document))
}

/// Classify every character of one document by how many codings cover it
fn document_coverage(
    doc: &DocumentLength,
    first: &[&CodedInterval],
    second: &[&CodedInterval],
) -> DocumentAgreement {
    let mut coverage = vec![0u8; doc.length];
    let mut mark = |intervals: &[&CodedInterval]| -> u64 {
        let mut marked = 0u64;
        for interval in intervals {
            // Bounds were checked when the intervals were grouped
            let span = &mut coverage[interval.start as usize..interval.end as usize];
            for count in span.iter_mut() {
                *count = count.saturating_add(1);
            }
            marked += span.len() as u64;
        }
        marked
    };
    let coded_first = mark(first);
    let coded_second = mark(second);

    let mut result = DocumentAgreement {
        document_id: doc.document_id,
        characters: doc.length as u64,
        coded_first,
        coded_second,
        ..Default::default()
    };
    for count in coverage {
        match count {
            0 => result.uncoded += 1,
            1 => result.single_coded += 1,
            _ => result.dual_coded += 1,
        }
    }
    result
}

fn summarize(code_id: i64, documents: Vec<DocumentAgreement>) -> AgreementSummary {
    let mut characters = 0;
    let mut uncoded = 0;
    let mut single_coded = 0;
    let mut dual_coded = 0;
    let mut coded_first = 0;
    let mut coded_second = 0;
    for doc in &documents {
        characters += doc.characters;
        uncoded += doc.uncoded;
        single_coded += doc.single_coded;
        dual_coded += doc.dual_coded;
        coded_first += doc.coded_first;
        coded_second += doc.coded_second;
    }

    let percent = |count: u64| {
        if characters == 0 {
            0.0
        } else {
            round_to(100.0 * count as f64 / characters as f64, 2)
        }
    };
    let agreement_percent = percent(dual_coded + uncoded);
    let disagreement_percent = if characters == 0 {
        0.0
    } else {
        round_to(100.0 - agreement_percent, 2)
    };

    let unique_codings = (coded_first + coded_second).saturating_sub(dual_coded);
    let kappa = cohens_kappa(coded_first, coded_second, dual_coded, unique_codings);
    if kappa.value().is_none() {
        debug!(code_id, unique_codings, "Kappa undefined: division by zero");
    }

    AgreementSummary {
        code_id,
        characters,
        uncoded,
        single_coded,
        dual_coded,
        coded_first,
        coded_second,
        unique_codings,
        agreement_percent,
        disagreement_percent,
        dual_coded_percent: percent(dual_coded),
        uncoded_percent: percent(uncoded),
        kappa,
        documents,
    }
}

fn cohens_kappa(coded_first: u64, coded_second: u64, dual_coded: u64, unique_codings: u64) -> Kappa {
    const UNDEFINED: Kappa = Kappa::Undefined {
        reason: UndefinedReason::DivisionByZero,
    };
    if unique_codings == 0 {
        return UNDEFINED;
    }

    let unique = unique_codings as f64;
    let first = coded_first as f64;
    let second = coded_second as f64;

    let po = dual_coded as f64 / unique;
    let p_yes = (first / unique) * (second / unique);
    let p_no = ((unique - first) / unique) * ((unique - second) / unique);
    let pe = p_yes * p_no;
    if 1.0 - pe == 0.0 {
        return UNDEFINED;
    }

    Kappa::Defined {
        value: round_to((po - pe) / (1.0 - pe), 4),
    }
}

/// Formats a float with at least one decimal place (`90.0`, `0.5895`)
pub(crate) struct DecimalDisplay(pub f64);

impl fmt::Display for DecimalDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_finite() && self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Round to `places` decimals, ties to even
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Outcome of comparing one code
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Computed(AgreementSummary),
    Failed { error: String },
}

/// Agreement for one code of the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeComparison {
    pub code_id: i64,
    pub name: String,
    pub outcome: ComparisonOutcome,
}

/// Compare two coders on every code of `tree`, in display order
///
/// A code whose intervals fail validation is reported as
/// [`ComparisonOutcome::Failed`]; the remaining codes are still computed.
pub fn compare_codes(
    tree: &CodeTree,
    pair: &CoderPair,
    documents: &[DocumentLength],
    intervals: &[CodedInterval],
) -> Vec<CodeComparison> {
    let mut by_code: HashMap<i64, Vec<CodedInterval>> = HashMap::new();
    for interval in intervals {
        by_code
            .entry(interval.code_id)
            .or_default()
            .push(interval.clone());
    }

    tree.walk()
        .into_iter()
        .filter_map(|idx| tree.node(idx))
        .filter(|node| !node.entity.is_category())
        .map(|node| {
            let code_id = node.entity.id();
            let code_intervals = by_code.get(&code_id).map(Vec::as_slice).unwrap_or_default();
            let outcome = match calculate_agreement(code_id, pair, documents, code_intervals) {
                Ok(summary) => ComparisonOutcome::Computed(summary),
                Err(e) => {
                    tracing::warn!(code_id, error = %e, "Agreement calculation failed");
                    ComparisonOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            CodeComparison {
                code_id,
                name: node.name.clone(),
                outcome,
            }
        })
        .collect()
}
