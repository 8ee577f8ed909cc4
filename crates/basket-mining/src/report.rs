//! Text and Markdown rendering of an [`Analysis`].

use std::fmt::{self, Write};

use crate::analysis::Analysis;

/// Which parts of an analysis to render, and how many rows of each.
///
/// # Examples
///
/// ```
/// use basket_mining::report::ReportOptions;
///
/// let opts = ReportOptions { limit: 5, ..ReportOptions::default() };
/// assert!(opts.rules && opts.itemsets && opts.cooccurrence);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Maximum rows per section.
    pub limit: usize,
    pub itemsets: bool,
    pub rules: bool,
    pub cooccurrence: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            itemsets: true,
            rules: true,
            cooccurrence: true,
        }
    }
}

/// Render `analysis` as plain-text tables.
pub fn render_text(analysis: &Analysis, options: &ReportOptions) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_text(&mut out, analysis, options);
    out
}

fn write_text(out: &mut String, analysis: &Analysis, options: &ReportOptions) -> fmt::Result {
    let meta = &analysis.meta;
    writeln!(out, "Basket Analysis: {}", meta.source)?;
    writeln!(out, "{}", "=".repeat(17 + meta.source.len()))?;
    writeln!(
        out,
        "{} transactions, {} items ({})",
        meta.n_transactions, meta.n_items, meta.layout
    )?;
    writeln!(
        out,
        "min support {:.3}, min confidence {:.2}",
        meta.min_support, meta.min_confidence
    )?;
    if meta.support_fallback_applied {
        writeln!(
            out,
            "note: nothing was frequent at {:.3}; lowered support to {:.3}",
            meta.requested_min_support, meta.min_support
        )?;
    }
    if meta.confidence_fallback_applied {
        writeln!(
            out,
            "note: no rule reached {:.2}; lowered confidence to {:.2}",
            meta.requested_min_confidence, meta.min_confidence
        )?;
    }

    if options.itemsets {
        writeln!(out, "\nFrequent Itemsets ({})", analysis.itemsets.len())?;
        writeln!(out, "{:<50} {:>8} {:>6}", "Itemset", "Support", "Count")?;
        writeln!(out, "{}", "-".repeat(66))?;
        for f in analysis.itemsets.iter().take(options.limit) {
            writeln!(
                out,
                "{:<50} {:>8.3} {:>6}",
                f.itemset.to_string(),
                f.support,
                f.count
            )?;
        }
        write_truncation(out, analysis.itemsets.len(), options.limit)?;
    }

    if options.rules {
        writeln!(out, "\nAssociation Rules ({})", analysis.rules.len())?;
        if analysis.rules.is_empty() {
            writeln!(out, "No rules reached the confidence threshold.")?;
        } else {
            writeln!(
                out,
                "{:<50} {:>8} {:>10} {:>6}",
                "Rule", "Support", "Confidence", "Lift"
            )?;
            writeln!(out, "{}", "-".repeat(77))?;
            for rule in analysis.rules.iter().take(options.limit) {
                writeln!(
                    out,
                    "{:<50} {:>8.3} {:>10.3} {:>6.2}",
                    rule.to_string(),
                    rule.support,
                    rule.confidence,
                    rule.lift
                )?;
            }
            write_truncation(out, analysis.rules.len(), options.limit)?;
        }
    }

    if options.cooccurrence {
        let pairs = analysis.cooccurrence.top_pairs(options.limit);
        writeln!(out, "\nTop Co-occurring Pairs")?;
        if pairs.is_empty() {
            writeln!(out, "No items appear together.")?;
        }
        for pair in pairs {
            writeln!(
                out,
                "{:<24} {:<24} {:>6}",
                pair.item_a, pair.item_b, pair.co_occurrences
            )?;
        }
    }

    Ok(())
}

fn write_truncation(out: &mut String, total: usize, limit: usize) -> fmt::Result {
    if total > limit {
        writeln!(out, "... and {} more", total - limit)?;
    }
    Ok(())
}

/// Render `analysis` as Markdown.
pub fn render_markdown(analysis: &Analysis, options: &ReportOptions) -> String {
    let meta = &analysis.meta;
    let mut out = String::new();
    out.push_str(&format!("# Basket Analysis: {}\n\n", meta.source));
    out.push_str(&format!(
        "**{}** transactions, **{}** items ({}). Min support {:.3}, min confidence {:.2}.\n",
        meta.n_transactions, meta.n_items, meta.layout, meta.min_support, meta.min_confidence
    ));
    if meta.support_fallback_applied {
        out.push_str(&format!(
            "\n> Support lowered from {:.3} to {:.3} because nothing was frequent.\n",
            meta.requested_min_support, meta.min_support
        ));
    }
    if meta.confidence_fallback_applied {
        out.push_str(&format!(
            "\n> Confidence lowered from {:.2} to {:.2} because no rule passed.\n",
            meta.requested_min_confidence, meta.min_confidence
        ));
    }

    if options.itemsets {
        out.push_str(&format!(
            "\n## Frequent Itemsets ({})\n\n",
            analysis.itemsets.len()
        ));
        out.push_str("| Itemset | Support | Count |\n");
        out.push_str("|---------|---------|-------|\n");
        for f in analysis.itemsets.iter().take(options.limit) {
            out.push_str(&format!(
                "| {} | {:.3} | {} |\n",
                f.itemset, f.support, f.count
            ));
        }
    }

    if options.rules {
        out.push_str(&format!(
            "\n## Association Rules ({})\n\n",
            analysis.rules.len()
        ));
        if analysis.rules.is_empty() {
            out.push_str("No rules reached the confidence threshold.\n");
        } else {
            out.push_str("| Antecedent | Consequent | Support | Confidence | Lift |\n");
            out.push_str("|------------|------------|---------|------------|------|\n");
            for rule in analysis.rules.iter().take(options.limit) {
                out.push_str(&format!(
                    "| {} | {} | {:.3} | {:.3} | {:.2} |\n",
                    rule.antecedent, rule.consequent, rule.support, rule.confidence, rule.lift
                ));
            }
        }
    }

    if options.cooccurrence {
        let pairs = analysis.cooccurrence.top_pairs(options.limit);
        out.push_str("\n## Top Co-occurring Pairs\n\n");
        if pairs.is_empty() {
            out.push_str("No items appear together.\n");
        } else {
            out.push_str("| Item A | Item B | Transactions |\n");
            out.push_str("|--------|--------|--------------|\n");
            for pair in pairs {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    pair.item_a, pair.item_b, pair.co_occurrences
                ));
            }
        }
    }

    out
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_text(self, &ReportOptions::default()))
    }
}

impl Analysis {
    /// Render with default [`ReportOptions`] as Markdown.
    pub fn to_markdown(&self) -> String {
        render_markdown(self, &ReportOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample_dataset;

    fn groceries() -> Analysis {
        sample_dataset("groceries").unwrap().analyze().unwrap()
    }

    #[test]
    fn text_lists_every_section() {
        let text = groceries().to_string();
        assert!(text.contains("Basket Analysis: Grocery Store (sample)"));
        assert!(text.contains("Frequent Itemsets"));
        assert!(text.contains("Association Rules"));
        assert!(text.contains("{butter} => {bread}"));
        assert!(text.contains("Top Co-occurring Pairs"));
    }

    #[test]
    fn limit_truncates_sections() {
        let analysis = groceries();
        let options = ReportOptions {
            limit: 2,
            ..ReportOptions::default()
        };
        let text = render_text(&analysis, &options);
        assert!(text.contains(&format!("... and {} more", analysis.rules.len() - 2)));
    }

    #[test]
    fn sections_can_be_disabled() {
        let options = ReportOptions {
            itemsets: false,
            cooccurrence: false,
            ..ReportOptions::default()
        };
        let text = render_text(&groceries(), &options);
        assert!(!text.contains("Frequent Itemsets"));
        assert!(!text.contains("Co-occurring"));
        assert!(text.contains("Association Rules"));
    }

    #[test]
    fn markdown_has_tables() {
        let md = groceries().to_markdown();
        assert!(md.starts_with("# Basket Analysis"));
        assert!(md.contains("| Antecedent | Consequent |"));
        assert!(md.contains("| {butter} | {bread} |"));
        assert!(md.contains("## Top Co-occurring Pairs"));
    }
}
