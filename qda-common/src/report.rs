//! Plain-text reports

use std::fmt::Write;

use crate::analysis::agreement::DecimalDisplay;
use crate::analysis::{CodeComparison, CoderPair, ComparisonOutcome, FrequencyReport};

/// Code frequency report, one line per tree node, indented by depth
///
/// Lines are separated by CRLF.
pub fn render_frequency_text(report: &FrequencyReport) -> String {
    let mut text = String::from("CODING FREQUENCIES\r\n");
    for row in &report.rows {
        let kind = if row.entity.is_category() { "Category" } else { "Code" };
        let _ = write!(
            text,
            "\r\n{}{}: {}, Frequency: {}",
            "--".repeat(row.depth),
            kind,
            row.name,
            row.total
        );
    }
    text
}

/// Coder comparison report for every compared code
pub fn render_comparison_text(pair: &CoderPair, comparisons: &[CodeComparison]) -> String {
    let mut text = format!("====CODER COMPARISON====\nSelected coders: {}\n", pair);
    for comparison in comparisons {
        let _ = write!(text, "\n{} (cid:{})\n", comparison.name, comparison.code_id);
        match &comparison.outcome {
            ComparisonOutcome::Computed(summary) => {
                let _ = write!(
                    text,
                    "agreement: {}%, dual coded: {}%, uncoded: {}%, disagreement: {}%, Kappa: {}",
                    DecimalDisplay(summary.agreement_percent),
                    DecimalDisplay(summary.dual_coded_percent),
                    DecimalDisplay(summary.uncoded_percent),
                    DecimalDisplay(summary.disagreement_percent),
                    summary.kappa
                );
            }
            ComparisonOutcome::Failed { error } => {
                let _ = write!(text, "error: {}", error);
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, compare_codes, tally_codings, CodeTree};
    use crate::model::{Category, Code, CodedInterval, CodingOwner, DocumentLength};

    fn tree() -> CodeTree {
        let categories = vec![Category::new(1, "Feelings", None)];
        let codes = vec![Code::new(2, "happy", Some(1)), Code::new(3, "other", None)];
        CodeTree::build(&categories, &codes).unwrap()
    }

    #[test]
    fn test_frequency_text() {
        let rows = vec![
            CodingOwner {
                code_id: 2,
                coder: "ann".to_string(),
            },
            CodingOwner {
                code_id: 2,
                coder: "ben".to_string(),
            },
        ];
        let report = aggregate(&tree(), &["ann".to_string()], &tally_codings(&rows));
        let text = render_frequency_text(&report);

        assert_eq!(
            text,
            "CODING FREQUENCIES\r\n\
             \r\nCategory: Feelings, Frequency: 2\
             \r\n--Code: happy, Frequency: 2\
             \r\nCode: other, Frequency: 0"
        );
    }

    #[test]
    fn test_comparison_text() {
        let pair = CoderPair::new("ann", "ben").unwrap();
        let intervals = vec![
            CodedInterval {
                code_id: 2,
                document_id: 1,
                coder: "ann".to_string(),
                start: 0,
                end: 5,
            },
            CodedInterval {
                code_id: 2,
                document_id: 1,
                coder: "ben".to_string(),
                start: 0,
                end: 5,
            },
        ];
        let docs = [DocumentLength {
            document_id: 1,
            length: 10,
        }];
        let comparisons = compare_codes(&tree(), &pair, &docs, &intervals);
        let text = render_comparison_text(&pair, &comparisons);

        assert!(text.starts_with("====CODER COMPARISON====\nSelected coders: ann, ben\n"));
        assert_eq!(
            text,
            "====CODER COMPARISON====\nSelected coders: ann, ben\n\
             \nhappy (cid:2)\n\
             agreement: 100.0%, dual coded: 50.0%, uncoded: 50.0%, disagreement: 0.0%, Kappa: 1.0\
             \nother (cid:3)\n\
             agreement: 100.0%, dual coded: 0.0%, uncoded: 100.0%, disagreement: 0.0%, \
             Kappa: undefined (division by zero)"
        );
    }
}
