//! Modifier definitions and rolled instances

mod catalog;
pub mod weights;

pub use catalog::ModifierCatalog;
pub use weights::{SlotGroup, WeightCondition, WeightMatcher};

use crate::types::{is_visible_tag, AffixType, ModType};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive range a single stat value rolls within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRange {
    pub min: f64,
    pub max: f64,
}

impl StatRange {
    pub fn new(min: f64, max: f64) -> Self {
        StatRange { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Sample a value uniformly within the range
    ///
    /// Integral bounds produce integral values; fractional bounds are rounded
    /// to two decimals.
    pub fn roll(&self, rng: &mut impl Rng) -> f64 {
        if self.min >= self.max {
            return self.min;
        }
        if self.min.fract() == 0.0 && self.max.fract() == 0.0 {
            rng.gen_range(self.min as i64..=self.max as i64) as f64
        } else {
            let value = rng.gen_range(self.min..=self.max);
            ((value * 100.0).round() / 100.0).clamp(self.min, self.max)
        }
    }
}

/// A modifier: either a catalog entry or a rolled instance on an item
///
/// Instances are copies of catalog entries with `current_values` populated;
/// the catalog entry itself is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    pub mod_type: ModType,
    /// Lower is stronger
    #[serde(default = "default_tier")]
    pub tier: u32,
    /// Template with `#` or `{n}` placeholders, one per stat range
    pub stat_text: String,
    /// Ranges for hybrid/multi-stat modifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stat_ranges: Vec<StatRange>,
    /// Legacy single-stat bounds, used when `stat_ranges` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_max: Option<f64>,
    /// Rolled values, one per range (absent on catalog entries)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub current_values: Vec<f64>,
    #[serde(default)]
    pub required_item_level: u32,
    /// Spawn weight; 0 never spawns
    #[serde(default)]
    pub weight: u32,
    /// Mutual-exclusivity key, at most one modifier per group per item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_group: Option<String>,
    /// Declared exclusion groups; two modifiers sharing one conflict
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusion_groups: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Legacy category/slot-group applicability list (empty = any item)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applicable_items: Vec<String>,
    /// Ordered first-match-wins weight table, supersedes `applicable_items`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_conditions: Option<Vec<WeightCondition>>,
    /// Unique-item-only
    #[serde(default)]
    pub is_exclusive: bool,
    /// Only obtainable through an essence
    #[serde(default)]
    pub is_essence_only: bool,
    #[serde(default)]
    pub is_fractured: bool,
    #[serde(default)]
    pub is_desecrated: bool,
    #[serde(default)]
    pub is_unrevealed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unrevealed_id: Option<u32>,
}

fn default_tier() -> u32 {
    1
}

impl Modifier {
    /// Create a bare modifier entry with a single stat range
    pub fn new(name: &str, mod_type: ModType, stat_text: &str, min: f64, max: f64) -> Self {
        Modifier {
            name: name.to_string(),
            mod_type,
            tier: 1,
            stat_text: stat_text.to_string(),
            stat_ranges: vec![StatRange::new(min, max)],
            stat_min: None,
            stat_max: None,
            current_values: Vec::new(),
            required_item_level: 1,
            weight: 1000,
            mod_group: None,
            exclusion_groups: Vec::new(),
            tags: Vec::new(),
            applicable_items: Vec::new(),
            weight_conditions: None,
            is_exclusive: false,
            is_essence_only: false,
            is_fractured: false,
            is_desecrated: false,
            is_unrevealed: false,
            unrevealed_id: None,
        }
    }

    /// Placeholder occupying a slot until a desecrated modifier is revealed
    pub fn unrevealed(affix: AffixType, id: u32) -> Self {
        let mut placeholder = Modifier::new(
            "Unrevealed Desecrated Modifier",
            affix.mod_type(),
            "Unrevealed Desecrated Modifier",
            0.0,
            0.0,
        );
        placeholder.stat_ranges.clear();
        placeholder.weight = 0;
        placeholder.tags = vec!["desecrated".to_string(), "unrevealed".to_string()];
        placeholder.is_desecrated = true;
        placeholder.is_unrevealed = true;
        placeholder.unrevealed_id = Some(id);
        placeholder
    }

    pub fn with_tier(mut self, tier: u32) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_level(mut self, required_item_level: u32) -> Self {
        self.required_item_level = required_item_level;
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.mod_group = Some(group.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_applicable(mut self, items: &[&str]) -> Self {
        self.applicable_items = items.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.stat_ranges.push(StatRange::new(min, max));
        self
    }

    /// Affix slot this modifier occupies, if explicit
    pub fn affix_type(&self) -> Option<AffixType> {
        self.mod_type.affix()
    }

    /// Effective stat ranges, normalizing the legacy `stat_min`/`stat_max` form
    pub fn ranges(&self) -> Vec<StatRange> {
        if !self.stat_ranges.is_empty() {
            return self.stat_ranges.clone();
        }
        match (self.stat_min, self.stat_max) {
            (Some(min), Some(max)) => vec![StatRange::new(min, max)],
            (Some(v), None) | (None, Some(v)) => vec![StatRange::new(v, v)],
            (None, None) => Vec::new(),
        }
    }

    /// First rolled value, for single-stat modifiers
    pub fn current_value(&self) -> Option<f64> {
        self.current_values.first().copied()
    }

    /// Sample one value per range, replacing any previous roll
    pub fn roll_values(&mut self, rng: &mut impl Rng) {
        self.current_values = self.ranges().iter().map(|r| r.roll(&mut *rng)).collect();
    }

    /// Create a rolled instance of this catalog entry
    pub fn instantiate(&self, rng: &mut impl Rng) -> Modifier {
        let mut instance = self.clone();
        instance.roll_values(rng);
        instance.is_fractured = false;
        instance
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Tags that are meaningful to players
    pub fn visible_tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str).filter(|t| is_visible_tag(t))
    }

    /// Whether removal mechanics may take this modifier off an item
    pub fn is_removable(&self) -> bool {
        !self.is_fractured
    }

    /// Stat text with placeholders replaced by rolled values
    pub fn display_text(&self) -> String {
        let mut values = self.current_values.iter();
        let mut out = String::with_capacity(self.stat_text.len());
        let mut chars = self.stat_text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '#' => match values.next() {
                    Some(v) => out.push_str(&format_value(*v)),
                    None => out.push('#'),
                },
                '{' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next == '}' {
                            closed = true;
                            break;
                        }
                        inner.push(next);
                    }
                    let is_placeholder = closed && inner.chars().all(|ch| ch.is_ascii_digit());
                    match (is_placeholder, values.next()) {
                        (true, Some(v)) => out.push_str(&format_value(*v)),
                        _ => {
                            out.push('{');
                            out.push_str(&inner);
                            if closed {
                                out.push('}');
                            }
                        }
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
