//! Budget-bounded evidence packaging.
//!
//! Walks ranked evidence in order, appending `Title:` / `Summary:` /
//! `Source:` stanzas until the character budget would be exceeded. The last
//! admitted stanza is truncated to fit rather than dropped. An item is only
//! admitted if its title and source URL both survive, so a citation can be
//! reconstructed for everything that reaches the generator.

use serde::{Deserialize, Serialize};

use crate::core::config::ContextConfig;
use crate::retrieve::Evidence;

/// A reconstructable reference to an admitted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// The bounded text package handed to the generator, plus the citations of
/// every document that contributed to it.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

pub struct ContextAssembler {
    config: ContextConfig,
}

impl ContextAssembler {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Assemble up to `limit` evidence items under the character budget.
    ///
    /// `limit = 1` is the single-best-match mode; passing the retriever's
    /// top-k gives the broader multi-source mode.
    pub fn assemble(&self, evidence: &[Evidence], limit: usize) -> AssembledContext {
        let budget = self.config.max_chars;
        let mut context = AssembledContext::default();
        let mut used = 0usize;

        for item in evidence.iter().take(limit.max(1)) {
            let title = &item.document.title;
            let url = &item.document.source_url;
            let excerpt: String = item
                .document
                .abstract_text
                .chars()
                .take(self.config.excerpt_chars)
                .collect();

            let block = format_block(title, &excerpt, url);
            let block_len = block.chars().count();

            if used + block_len <= budget {
                context.text.push_str(&block);
                used += block_len;
                context.citations.push(Citation {
                    title: title.clone(),
                    url: url.clone(),
                });
                continue;
            }

            // The full stanza does not fit; truncate its excerpt into the
            // remaining budget. The title and URL must survive intact, or
            // the item is not admitted at all.
            let skeleton_len = format_block(title, "", url).chars().count();
            let remaining = budget.saturating_sub(used);
            if remaining > skeleton_len {
                let truncated: String = excerpt.chars().take(remaining - skeleton_len).collect();
                let block = format_block(title, &truncated, url);
                used += block.chars().count();
                context.text.push_str(&block);
                context.citations.push(Citation {
                    title: title.clone(),
                    url: url.clone(),
                });
            }
            break;
        }

        debug_assert!(used <= budget);
        context
    }
}

fn format_block(title: &str, excerpt: &str, url: &str) -> String {
    format!("Title: {title}\nSummary: {excerpt}\nSource: {url}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::corpus::{Document, Origin};

    fn evidence(title: &str, abstract_text: &str, score: f32) -> Evidence {
        Evidence {
            document: Document {
                title: title.to_string(),
                abstract_text: abstract_text.to_string(),
                source_url: format!("https://example.org/{}", title.replace(' ', "-")),
                origin: Origin::Arxiv,
                ingested_at: Utc::now(),
            },
            score,
        }
    }

    fn assembler(max_chars: usize, excerpt_chars: usize) -> ContextAssembler {
        ContextAssembler::new(ContextConfig {
            max_chars,
            excerpt_chars,
        })
    }

    #[test]
    fn packs_items_in_rank_order_with_citations() {
        let items = vec![
            evidence("First Paper", "Most relevant abstract.", 0.9),
            evidence("Second Paper", "Less relevant abstract.", 0.5),
        ];

        let context = assembler(4000, 1000).assemble(&items, 5);

        assert_eq!(context.citations.len(), 2);
        assert_eq!(context.citations[0].title, "First Paper");
        let first = context.text.find("First Paper").unwrap();
        let second = context.text.find("Second Paper").unwrap();
        assert!(first < second);
        assert!(context.text.contains("Source: https://example.org/First-Paper"));
    }

    #[test]
    fn never_exceeds_budget_even_with_one_oversized_abstract() {
        let items = vec![evidence("Huge Paper", &"word ".repeat(5000), 0.9)];

        for budget in [50, 120, 400, 4000] {
            let context = assembler(budget, 100_000).assemble(&items, 5);
            assert!(
                context.char_len() <= budget,
                "budget {budget} exceeded: {}",
                context.char_len()
            );
        }
    }

    #[test]
    fn truncates_last_admitted_item_instead_of_dropping_it() {
        let items = vec![
            evidence("Fits", "short abstract", 0.9),
            evidence("Partial", &"x".repeat(500), 0.5),
        ];

        // Budget admits the first stanza whole and part of the second.
        let context = assembler(160, 1000).assemble(&items, 5);

        assert_eq!(context.citations.len(), 2);
        assert!(context.text.contains("Title: Partial"));
        assert!(context.char_len() <= 160);
    }

    #[test]
    fn item_without_room_for_its_citation_is_not_admitted() {
        let items = vec![evidence(
            "A Title Much Longer Than The Whole Budget Allows",
            "abstract",
            0.9,
        )];

        let context = assembler(20, 1000).assemble(&items, 5);
        assert!(context.is_empty());
        assert!(context.text.is_empty());
    }

    #[test]
    fn single_best_match_mode_takes_one_item() {
        let items = vec![
            evidence("Best", "top abstract", 0.9),
            evidence("Runner Up", "second abstract", 0.8),
        ];

        let context = assembler(4000, 1000).assemble(&items, 1);
        assert_eq!(context.citations.len(), 1);
        assert_eq!(context.citations[0].title, "Best");
        assert!(!context.text.contains("Runner Up"));
    }

    #[test]
    fn per_item_excerpt_cap_applies_before_budgeting() {
        let items = vec![evidence("Capped", &"a".repeat(3000), 0.9)];

        let context = assembler(4000, 100).assemble(&items, 5);
        let summary_line = context
            .text
            .lines()
            .find(|l| l.starts_with("Summary: "))
            .unwrap();
        assert_eq!(summary_line.chars().count(), "Summary: ".len() + 100);
    }
}
