//! Static knowledge about the game-sales schema: human-readable column
//! descriptions and the relationship checklist handed to the model.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::types::DatasetSchema;

/// Registry of known column names and what they mean for the analysis.
/// Columns absent from this map get a generated description from their
/// inferred kind.
pub static COLUMN_DESCRIPTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            "creator",
            "studio/creator name (text); groups titles and can explain quality or marketing differences",
        ),
        (
            "genres",
            "genre(s) (comma-separated text); shapes the player profile and type of engagement",
        ),
        (
            "negative_rating",
            "number of negative reviews (int); a dissatisfaction-risk signal",
        ),
        (
            "positive_rating",
            "number of positive reviews (int); a rough quality/word-of-mouth signal",
        ),
        (
            "play_time",
            "play time in minutes (int); proxy for engagement and retention, often heavily skewed",
        ),
        (
            "price",
            "price (float); entry barrier, interacts with sales and popularity",
        ),
        (
            "age",
            "player age in years (int); demographic segmentation (beware gaps and bias)",
        ),
        (
            "purchase_date",
            "purchase date; useful for seasonality and sale-event effects",
        ),
        (
            "release_date",
            "release date; product age, affects player base and lifecycle",
        ),
        (
            "achievements",
            "number of achievements earned (int); activity and depth of play",
        ),
        (
            "achievement_progress",
            "achievement completion percentage (float 0-100); content-exploration measure",
        ),
        (
            "items_owned",
            "number of paid items owned (int); monetization and economic engagement",
        ),
        (
            "platforms",
            "target platforms (list/text); reach and hardware barriers",
        ),
        (
            "interface_languages",
            "interface languages (list); accessibility, may raise regional popularity",
        ),
        (
            "subtitle_languages",
            "subtitle languages (list); accessibility of narrative content",
        ),
        (
            "dubbing_languages",
            "dubbing languages (list); higher production cost, may improve comfort",
        ),
        (
            "current_players",
            "players right now (int); momentary popularity (noisy; watch the trend)",
        ),
        (
            "peak_24h_players",
            "24-hour player peak (int); daily activity potential",
        ),
        (
            "peak_players",
            "all-time player record (int); historical reach of the title",
        ),
        (
            "copies_sold",
            "copies sold (int); commercial scale (full data often unavailable)",
        ),
    ])
});

/// One relationship hint, included only when its column requirements are met.
pub struct ChecklistRule {
    /// Every one of these columns must be present.
    pub requires_all: &'static [&'static str],
    /// At least one of these columns must be present (empty = no constraint).
    pub requires_any: &'static [&'static str],
    pub hint: &'static str,
}

impl ChecklistRule {
    /// Whether this rule applies to the given schema.
    pub fn applies(&self, schema: &DatasetSchema) -> bool {
        schema.has_all(self.requires_all)
            && (self.requires_any.is_empty() || schema.has_any(self.requires_any))
    }
}

/// Relationship checklist, in fixed priority order. Rules are evaluated
/// independently; any number of them may apply at once.
pub static CHECKLIST_RULES: &[ChecklistRule] = &[
    ChecklistRule {
        requires_all: &["play_time", "genres"],
        requires_any: &[],
        hint: "How play time (play_time) depends on genres.",
    },
    ChecklistRule {
        requires_all: &["price", "play_time"],
        requires_any: &[],
        hint: "Effect of price on play_time — does a higher price correlate with shorter play time?",
    },
    ChecklistRule {
        requires_all: &["positive_rating", "negative_rating"],
        requires_any: &[],
        hint: "Review balance (positive vs. negative) versus popularity/retention.",
    },
    ChecklistRule {
        requires_all: &["release_date", "play_time"],
        requires_any: &[],
        hint: "Effect of title age (release_date) on activity — aging titles versus newer ones.",
    },
    ChecklistRule {
        requires_all: &["purchase_date"],
        requires_any: &[],
        hint: "Purchase seasonality (purchase_date) — spikes around sales and holidays.",
    },
    ChecklistRule {
        requires_all: &["platforms", "play_time"],
        requires_any: &[],
        hint: "Engagement differences between platforms.",
    },
    ChecklistRule {
        requires_all: &[],
        requires_any: &[
            "interface_languages",
            "subtitle_languages",
            "dubbing_languages",
        ],
        hint: "Effect of the number of supported languages on popularity.",
    },
    ChecklistRule {
        requires_all: &["items_owned", "play_time"],
        requires_any: &[],
        hint: "Link between monetization (items_owned) and play time (engagement).",
    },
    ChecklistRule {
        requires_all: &["current_players", "peak_24h_players", "peak_players"],
        requires_any: &[],
        hint: "Check consistency of current popularity against historical records (trend/deviations).",
    },
    ChecklistRule {
        requires_all: &["copies_sold", "positive_rating"],
        requires_any: &[],
        hint: "Whether high sales go hand in hand with quality (positive reviews).",
    },
];

/// Collect the hints whose requirements the schema satisfies, in priority
/// order.
pub fn applicable_hints(schema: &DatasetSchema) -> Vec<&'static str> {
    CHECKLIST_RULES
        .iter()
        .filter(|rule| rule.applies(schema))
        .map(|rule| rule.hint)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_registry_covers_known_columns() {
        assert!(COLUMN_DESCRIPTIONS.contains_key("price"));
        assert!(COLUMN_DESCRIPTIONS.contains_key("genres"));
        assert!(!COLUMN_DESCRIPTIONS.contains_key("no_such_column"));
        assert_eq!(COLUMN_DESCRIPTIONS.len(), 20);
    }

    #[test]
    fn test_hints_require_all_columns() {
        let df = df! {
            "price" => &[10.0],
            "play_time" => &[120i64],
        }
        .unwrap();
        let schema = DatasetSchema::from_frame(&df);
        let hints = applicable_hints(&schema);
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("price"));
    }

    #[test]
    fn test_any_of_language_rule() {
        let df = df! {
            "subtitle_languages" => &["en,pl"],
        }
        .unwrap();
        let schema = DatasetSchema::from_frame(&df);
        let hints = applicable_hints(&schema);
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("languages"));
    }

    #[test]
    fn test_multiple_hints_in_priority_order() {
        let df = df! {
            "play_time" => &[100i64],
            "genres" => &["RPG"],
            "price" => &[20.0],
            "items_owned" => &[3i64],
        }
        .unwrap();
        let schema = DatasetSchema::from_frame(&df);
        let hints = applicable_hints(&schema);
        assert_eq!(hints.len(), 3);
        assert!(hints[0].contains("genres"));
        assert!(hints[1].contains("price"));
        assert!(hints[2].contains("monetization"));
    }

    #[test]
    fn test_no_matching_columns_no_hints() {
        let df = df! {
            "unrelated" => &[1i64],
        }
        .unwrap();
        let schema = DatasetSchema::from_frame(&df);
        assert!(applicable_hints(&schema).is_empty());
    }
}
