//! Exclusion engine - Pairwise conflicts between a candidate and existing modifiers
//!
//! Rules are evaluated in declaration order and come in two kinds:
//! - tag rules: at most one modifier carrying the tag per affix type
//! - pattern rules: stat-text templates (numeric placeholders as wildcards);
//!   a candidate matching any pattern conflicts with an existing modifier that
//!   also matches a pattern of the same rule

use crate::config::ConfigError;
use crate::item::Item;
use crate::modifier::{weights, Modifier};
use crate::types::AffixType;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Wildcard standing in for a numeric placeholder
const NUMBER_WILDCARD: &str = r"(?:[+-]?\d+(?:\.\d+)?|#|\{\d*\})";

/// Conflict rule as declared in configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRule {
    #[serde(default)]
    pub name: String,
    /// Mutually exclusive tag, e.g. "ailment"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Stat-text templates
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Categories or slot groups the rule applies to (empty = all)
    #[serde(default)]
    pub applicable_items: Vec<String>,
}

#[derive(Debug, Clone)]
enum RuleKind {
    Tag(String),
    Patterns(Vec<Regex>),
}

#[derive(Debug, Clone)]
struct CompiledRule {
    name: String,
    kind: RuleKind,
    applicable_items: Vec<String>,
}

impl CompiledRule {
    fn applies_to(&self, item: &Item) -> bool {
        weights::legacy_applicable(&self.applicable_items, item)
    }

    /// Existing modifiers this rule alone puts in conflict with the candidate
    fn conflicts<'m>(
        &self,
        candidate: &Modifier,
        existing: &[&'m Modifier],
        affix: AffixType,
    ) -> Vec<&'m Modifier> {
        let hit = |other: &Modifier| match &self.kind {
            RuleKind::Tag(tag) => {
                candidate.has_tag(tag) && other.affix_type() == Some(affix) && other.has_tag(tag)
            }
            RuleKind::Patterns(regexes) => {
                text_matches(regexes, &candidate.stat_text) && text_matches(regexes, &other.stat_text)
            }
        };
        existing
            .iter()
            .copied()
            .filter(|other| is_comparable(candidate, other) && hit(*other))
            .collect()
    }
}

/// Turn a stat-text template into an anchored regex
pub fn template_to_regex(template: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("^");
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    let flush = |literal: &mut String, pattern: &mut String| {
        pattern.push_str(&regex::escape(literal));
        literal.clear();
    };

    while let Some(c) = chars.next() {
        if c == '#' {
            flush(&mut literal, &mut pattern);
            pattern.push_str(NUMBER_WILDCARD);
        } else if c == '{' {
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
            if closed && inner.chars().all(|ch| ch.is_ascii_digit()) {
                flush(&mut literal, &mut pattern);
                pattern.push_str(NUMBER_WILDCARD);
            } else {
                literal.push('{');
                literal.push_str(&inner);
                if closed {
                    literal.push('}');
                }
            }
        } else if c.is_ascii_digit() {
            flush(&mut literal, &mut pattern);
            while matches!(chars.peek(), Some(d) if d.is_ascii_digit() || *d == '.') {
                chars.next();
            }
            pattern.push_str(NUMBER_WILDCARD);
        } else {
            literal.push(c);
        }
    }
    flush(&mut literal, &mut pattern);
    pattern.push('$');
    Regex::new(&pattern)
}

/// Stat text matches if the whole text or any single line matches
fn text_matches(regexes: &[Regex], text: &str) -> bool {
    regexes
        .iter()
        .any(|re| re.is_match(text) || text.lines().any(|line| re.is_match(line)))
}

/// Evaluates declared conflict rules
#[derive(Debug, Clone, Default)]
pub struct ExclusionEngine {
    rules: Vec<CompiledRule>,
}

impl ExclusionEngine {
    /// Compile rules; a rule must be exactly one of tag or patterns
    pub fn new(rules: Vec<ExclusionRule>) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(rules.len());

        for rule in rules {
            let kind = match (&rule.tag, rule.patterns.is_empty()) {
                (Some(tag), true) => RuleKind::Tag(tag.clone()),
                (None, false) => {
                    let regexes = rule
                        .patterns
                        .iter()
                        .map(|p| template_to_regex(p))
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|e| {
                            ConfigError::ValidationError(format!(
                                "Exclusion rule '{}': bad pattern: {}",
                                rule.name, e
                            ))
                        })?;
                    RuleKind::Patterns(regexes)
                }
                _ => {
                    return Err(ConfigError::ValidationError(format!(
                        "Exclusion rule '{}' must declare either a tag or patterns",
                        rule.name
                    )))
                }
            };
            compiled.push(CompiledRule {
                name: rule.name,
                kind,
                applicable_items: rule.applicable_items,
            });
        }

        Ok(ExclusionEngine { rules: compiled })
    }

    pub fn empty() -> Self {
        ExclusionEngine::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Existing modifiers that conflict with the candidate
    ///
    /// `affix` is the slot the candidate would occupy. Unrevealed placeholders
    /// never count, and a modifier identical to the candidate is not matched
    /// against itself.
    pub fn conflicts<'m>(
        &self,
        candidate: &Modifier,
        existing: &[&'m Modifier],
        item: &Item,
        affix: AffixType,
    ) -> Vec<&'m Modifier> {
        let mut found: Vec<&'m Modifier> = Vec::new();

        for rule in self.rules.iter().filter(|r| r.applies_to(item)) {
            let hits = rule.conflicts(candidate, existing, affix);
            if hits.is_empty() {
                continue;
            }
            log::trace!("'{}' excluded by rule '{}'", candidate.name, rule.name);
            for other in hits {
                push_unique(&mut found, other);
            }
        }

        found
    }

    /// Names of the rules that exclude the candidate, in declaration order
    pub fn matching_rules(
        &self,
        candidate: &Modifier,
        existing: &[&Modifier],
        item: &Item,
        affix: AffixType,
    ) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.applies_to(item) && !r.conflicts(candidate, existing, affix).is_empty())
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Conflicts of a candidate against every explicit modifier on an item
    pub fn item_conflicts<'m>(
        &self,
        candidate: &Modifier,
        item: &'m Item,
        affix: AffixType,
    ) -> Vec<&'m Modifier> {
        let existing: Vec<&Modifier> = item.explicit_mods().collect();
        self.conflicts(candidate, &existing, item, affix)
    }

    pub fn has_conflict(&self, candidate: &Modifier, item: &Item, affix: AffixType) -> bool {
        !self.item_conflicts(candidate, item, affix).is_empty()
    }
}

fn is_comparable(candidate: &Modifier, other: &Modifier) -> bool {
    !other.is_unrevealed && !(other.name == candidate.name && other.mod_type == candidate.mod_type)
}

fn push_unique<'m>(found: &mut Vec<&'m Modifier>, modifier: &'m Modifier) {
    if !found.iter().any(|m| std::ptr::eq(*m, modifier)) {
        found.push(modifier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModType, Rarity};

    fn engine() -> ExclusionEngine {
        ExclusionEngine::new(vec![
            ExclusionRule {
                name: "one ailment per affix".to_string(),
                tag: Some("ailment".to_string()),
                ..Default::default()
            },
            ExclusionRule {
                name: "flat and percent armour".to_string(),
                patterns: vec![
                    "+# to Armour".to_string(),
                    "#% increased Armour".to_string(),
                ],
                applicable_items: vec!["armour".to_string()],
                ..Default::default()
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_template_regex() {
        let re = template_to_regex("Adds # to # Fire Damage").unwrap();
        assert!(re.is_match("Adds # to # Fire Damage"));
        assert!(re.is_match("Adds 5 to 12 Fire Damage"));
        assert!(re.is_match("Adds {0} to {1} Fire Damage"));
        assert!(!re.is_match("Adds 5 to 12 Fire Damage to Attacks"));

        let re = template_to_regex("+35 to maximum Life").unwrap();
        assert!(re.is_match("+# to maximum Life"));
        assert!(re.is_match("+1.5 to maximum Life"));
    }

    #[test]
    fn test_tag_rule_same_affix_only() {
        let engine = engine();
        let item = Item::new("Gloves", "gloves", 70).with_rarity(Rarity::Rare);
        let bleed = Modifier::new("of Bleeding", ModType::Suffix, "#% chance to cause Bleeding", 5.0, 10.0)
            .with_tags(&["ailment", "physical"]);
        let poison_suffix = Modifier::new("of Venom", ModType::Suffix, "#% chance to Poison", 5.0, 10.0)
            .with_tags(&["ailment", "chaos"]);
        let ignite_prefix = Modifier::new("Searing", ModType::Prefix, "#% chance to Ignite", 5.0, 10.0)
            .with_tags(&["ailment", "fire"]);

        let conflicts = engine.conflicts(&bleed, &[&poison_suffix], &item, AffixType::Suffix);
        assert_eq!(conflicts.len(), 1);

        let conflicts = engine.conflicts(&bleed, &[&ignite_prefix], &item, AffixType::Suffix);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_pattern_rule_scoped_by_category() {
        let engine = engine();
        let flat = Modifier::new("Lacquered", ModType::Prefix, "+# to Armour", 10.0, 20.0);
        let percent = Modifier::new("Reinforced", ModType::Prefix, "#% increased Armour", 15.0, 26.0);

        let helmet = Item::new("Helmet", "helmet", 70).with_rarity(Rarity::Rare);
        assert_eq!(engine.conflicts(&flat, &[&percent], &helmet, AffixType::Prefix).len(), 1);

        let ring = Item::new("Ring", "ring", 70).with_rarity(Rarity::Rare);
        assert!(engine.conflicts(&flat, &[&percent], &ring, AffixType::Prefix).is_empty());
    }

    #[test]
    fn test_only_conflicting_rules_reported() {
        let engine = engine();
        let helmet = Item::new("Helmet", "helmet", 70).with_rarity(Rarity::Rare);
        let flat = Modifier::new("Lacquered", ModType::Prefix, "+# to Armour", 10.0, 20.0);
        let percent = Modifier::new("Reinforced", ModType::Prefix, "#% increased Armour", 15.0, 26.0);
        let bleed = Modifier::new("of Bleeding", ModType::Suffix, "#% chance to cause Bleeding", 5.0, 10.0)
            .with_tags(&["ailment"]);
        let venom = Modifier::new("of Venom", ModType::Suffix, "#% chance to Poison", 5.0, 10.0)
            .with_tags(&["ailment"]);

        let existing = [&percent, &venom];
        assert_eq!(
            engine.matching_rules(&flat, &existing, &helmet, AffixType::Prefix),
            vec!["flat and percent armour"]
        );
        assert_eq!(
            engine.matching_rules(&bleed, &existing, &helmet, AffixType::Suffix),
            vec!["one ailment per affix"]
        );
        assert!(engine
            .matching_rules(&bleed, &[&percent], &helmet, AffixType::Suffix)
            .is_empty());
    }

    #[test]
    fn test_self_match_and_unrevealed_excluded() {
        let engine = engine();
        let helmet = Item::new("Helmet", "helmet", 70).with_rarity(Rarity::Rare);
        let flat = Modifier::new("Lacquered", ModType::Prefix, "+# to Armour", 10.0, 20.0);
        assert!(engine.conflicts(&flat, &[&flat], &helmet, AffixType::Prefix).is_empty());

        let mut hidden = Modifier::new("Hidden", ModType::Suffix, "#% chance to Poison", 1.0, 2.0)
            .with_tags(&["ailment"]);
        hidden.is_unrevealed = true;
        let bleed = Modifier::new("of Bleeding", ModType::Suffix, "#% chance to cause Bleeding", 5.0, 10.0)
            .with_tags(&["ailment"]);
        assert!(engine.conflicts(&bleed, &[&hidden], &helmet, AffixType::Suffix).is_empty());
    }

    #[test]
    fn test_hybrid_line_match() {
        let engine = engine();
        let helmet = Item::new("Helmet", "helmet", 70).with_rarity(Rarity::Rare);
        let hybrid = Modifier::new("Fortified", ModType::Prefix, "#% increased Armour\n+# to maximum Life", 10.0, 20.0)
            .with_range(5.0, 10.0);
        let flat = Modifier::new("Lacquered", ModType::Prefix, "+# to Armour", 10.0, 20.0);
        assert!(!engine.conflicts(&flat, &[&hybrid], &helmet, AffixType::Prefix).is_empty());
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let result = ExclusionEngine::new(vec![ExclusionRule {
            name: "empty".to_string(),
            ..Default::default()
        }]);
        assert!(result.is_err());
    }
}
