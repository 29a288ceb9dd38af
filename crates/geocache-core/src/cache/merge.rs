//! Merge-on-read: folding contexts from general to specific.

use std::collections::HashMap;

use crate::models::{CachedContext, CachedSection};

/// Accumulates sections across contexts absorbed in ascending specificity.
#[derive(Debug, Default)]
pub struct SectionAccumulator {
    sections: Vec<CachedSection>,
    positions: HashMap<String, usize>,
    order: Vec<String>,
}

impl SectionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a context more specific than everything absorbed so far.
    pub fn absorb(&mut self, context: CachedContext) {
        if !context.section_order.is_empty() {
            self.order = context.section_order;
        }

        for section in context.sections {
            match self.positions.get(&section.section_type) {
                Some(&index) => self.sections[index].merge_from(section),
                None => {
                    self.positions
                        .insert(section.section_type.clone(), self.sections.len());
                    self.sections.push(section);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections in the last recorded display order, followed by any types
    /// the order does not mention, in the order they were first seen.
    pub fn into_sections(self) -> Vec<CachedSection> {
        if self.order.is_empty() {
            return self.sections;
        }

        let mut slots: Vec<Option<CachedSection>> = self.sections.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(slots.len());
        for section_type in &self.order {
            if let Some(&index) = self.positions.get(section_type) {
                if let Some(section) = slots[index].take() {
                    ordered.push(section);
                }
            }
        }
        ordered.extend(slots.into_iter().flatten());
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{GeoLevel, StorageKey};
    use crate::models::LocationSummary;
    use serde_json::json;

    fn context(level: GeoLevel, sections: Vec<CachedSection>, order: &[&str]) -> CachedContext {
        let key = StorageKey {
            level,
            key: level.as_str().to_string(),
        };
        CachedContext::new(
            &key,
            LocationSummary::new(),
            sections,
            order.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn merge(contexts: Vec<CachedContext>) -> Vec<CachedSection> {
        let mut accumulator = SectionAccumulator::new();
        for context in contexts {
            accumulator.absorb(context);
        }
        accumulator.into_sections()
    }

    #[test]
    fn test_specific_values_win() {
        let merged = merge(vec![
            context(
                GeoLevel::Country,
                vec![CachedSection::new("overview", "Overview", json!({ "a": 1, "shared": "nation" }))],
                &[],
            ),
            context(
                GeoLevel::Locality,
                vec![CachedSection::new("overview", "Overview", json!({ "b": 2, "shared": "city" }))],
                &[],
            ),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].content,
            json!({ "a": 1, "b": 2, "shared": "city" })
        );
    }

    #[test]
    fn test_order_from_most_specific_context_wins() {
        let merged = merge(vec![
            context(
                GeoLevel::Country,
                vec![
                    CachedSection::new("a", "A", json!({})),
                    CachedSection::new("b", "B", json!({})),
                ],
                &["a", "b"],
            ),
            context(
                GeoLevel::Locality,
                vec![CachedSection::new("c", "C", json!({}))],
                &["c", "b"],
            ),
        ]);

        let types: Vec<&str> = merged.iter().map(|s| s.section_type.as_str()).collect();
        assert_eq!(types, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_empty_order_keeps_earlier_order() {
        let merged = merge(vec![
            context(
                GeoLevel::Country,
                vec![
                    CachedSection::new("a", "A", json!({})),
                    CachedSection::new("b", "B", json!({})),
                ],
                &["b", "a"],
            ),
            context(GeoLevel::AdminArea, vec![CachedSection::new("a", "A", json!({}))], &[]),
        ]);
        let types: Vec<&str> = merged.iter().map(|s| s.section_type.as_str()).collect();
        assert_eq!(types, vec!["b", "a"]);
    }

    #[test]
    fn test_no_order_uses_accumulation_order() {
        let mut accumulator = SectionAccumulator::new();
        assert!(accumulator.is_empty());
        accumulator.absorb(context(
            GeoLevel::Country,
            vec![
                CachedSection::new("z", "Z", json!(1)),
                CachedSection::new("y", "Y", json!(2)),
            ],
            &[],
        ));
        assert!(!accumulator.is_empty());
        let types: Vec<String> = accumulator
            .into_sections()
            .into_iter()
            .map(|s| s.section_type)
            .collect();
        assert_eq!(types, vec!["z", "y"]);
    }
}
