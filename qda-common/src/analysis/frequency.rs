//! Code and category frequencies
//!
//! Every code carries a count per coder of how often it was applied (text and
//! image codings). A category's counts are the sums over all codes nested
//! beneath it, at any depth.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::tree::{CodeTree, EntityRef};
use crate::model::CodingOwner;

/// Coded occurrences of one code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeFrequency {
    /// Occurrences per coder
    pub per_coder: BTreeMap<String, u64>,
    /// Occurrences by all coders
    pub total: u64,
}

/// Frequencies keyed by code id
pub type CodeCounts = HashMap<i64, CodeFrequency>;

/// Count coded occurrences per code and coder
pub fn tally_codings(rows: &[CodingOwner]) -> CodeCounts {
    let mut counts = CodeCounts::new();
    for row in rows {
        let entry = counts.entry(row.code_id).or_default();
        *entry.per_coder.entry(row.coder.clone()).or_insert(0) += 1;
        entry.total += 1;
    }
    counts
}

/// Frequencies of one tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyRow {
    pub entity: EntityRef,
    pub name: String,
    pub depth: usize,
    /// Counts indexed like [`FrequencyReport::coders`]
    pub counts: Vec<u64>,
    pub total: u64,
}

/// Frequencies for every node of a code tree, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyReport {
    pub coders: Vec<String>,
    pub rows: Vec<FrequencyRow>,
}

impl FrequencyReport {
    pub fn get(&self, entity: EntityRef) -> Option<&FrequencyRow> {
        self.rows.iter().find(|row| row.entity == entity)
    }

    /// Count for one node and coder; `None` if either is unknown
    pub fn count(&self, entity: EntityRef, coder: &str) -> Option<u64> {
        let position = self.coders.iter().position(|c| c == coder)?;
        self.get(entity).map(|row| row.counts[position])
    }
}

#[derive(Debug, Clone)]
struct Tally {
    counts: Vec<u64>,
    total: u64,
}

impl Tally {
    fn absorb(&mut self, other: &Tally) {
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        self.total += other.total;
    }
}

/// Attach per-coder counts to every node of `tree`
///
/// `coders` fixes the order of the count vectors. Coders missing from
/// `counts` contribute zero; coders missing from `coders` still contribute
/// to totals.
pub fn aggregate(tree: &CodeTree, coders: &[String], counts: &CodeCounts) -> FrequencyReport {
    let position: HashMap<&str, usize> = coders
        .iter()
        .enumerate()
        .map(|(i, coder)| (coder.as_str(), i))
        .collect();

    let empty = Tally {
        counts: vec![0; coders.len()],
        total: 0,
    };
    let mut tallies = vec![empty; tree.len()];

    for (idx, node) in tree.nodes().iter().enumerate() {
        let EntityRef::Code(code_id) = node.entity else {
            continue;
        };
        let Some(frequency) = counts.get(&code_id) else {
            continue;
        };
        for (coder, count) in &frequency.per_coder {
            if let Some(&pos) = position.get(coder.as_str()) {
                tallies[idx].counts[pos] += count;
            }
        }
        tallies[idx].total = frequency.total;
    }

    // Codes into the category that holds them directly
    for (idx, node) in tree.nodes().iter().enumerate() {
        if let (EntityRef::Code(_), Some(parent)) = (node.entity, node.parent) {
            let code_tally = tallies[idx].clone();
            tallies[parent].absorb(&code_tally);
        }
    }

    // Leaf categories first, so each category is complete before it is
    // folded into its parent
    for &idx in tree.bottom_up() {
        if let Some(parent) = tree.nodes()[idx].parent {
            let category_tally = tallies[idx].clone();
            tallies[parent].absorb(&category_tally);
        }
    }

    let rows = tree
        .walk()
        .into_iter()
        .map(|idx| {
            let node = &tree.nodes()[idx];
            let Tally { counts, total } = tallies[idx].clone();
            FrequencyRow {
                entity: node.entity,
                name: node.name.clone(),
                depth: node.depth,
                counts,
                total,
            }
        })
        .collect();

    FrequencyReport {
        coders: coders.to_vec(),
        rows,
    }
}
