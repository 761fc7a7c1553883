//! Spawn-weight evaluation and item applicability
//!
//! Two paths decide whether (and how heavily) a modifier can spawn on an item:
//! - `weight_conditions`: an ordered `(key, weight)` table, first match wins,
//!   no match means weight 0
//! - the legacy `applicable_items` list of categories and slot groups, which
//!   grants the modifier's flat `weight` on a match
//!
//! When a modifier carries a non-empty weight table it is authoritative and the
//! legacy list is ignored.

use super::Modifier;
use crate::config::ConfigError;
use crate::item::Item;
use serde::{Deserialize, Serialize};

/// One-handed weapon categories
pub const ONE_HAND_WEAPONS: &[&str] = &[
    "claw",
    "dagger",
    "wand",
    "one_hand_sword",
    "one_hand_axe",
    "one_hand_mace",
    "sceptre",
    "spear",
    "flail",
];

/// Two-handed weapon categories
pub const TWO_HAND_WEAPONS: &[&str] = &[
    "bow",
    "crossbow",
    "staff",
    "quarterstaff",
    "two_hand_sword",
    "two_hand_axe",
    "two_hand_mace",
];

pub const ARMOUR: &[&str] = &["helmet", "body_armour", "gloves", "boots", "shield", "buckler", "focus"];

pub const JEWELLERY: &[&str] = &["ring", "amulet", "belt"];

const CASTER_WEAPONS: &[&str] = &["wand", "sceptre", "staff"];

const RANGED_WEAPONS: &[&str] = &["bow", "crossbow"];

const OFFHANDS: &[&str] = &["shield", "buckler", "focus", "quiver"];

const OTHER_CATEGORIES: &[&str] = &["quiver", "jewel"];

/// Whether the name is a concrete item category
pub fn is_known_category(name: &str) -> bool {
    [ONE_HAND_WEAPONS, TWO_HAND_WEAPONS, ARMOUR, JEWELLERY, OTHER_CATEGORIES]
        .iter()
        .any(|group| group.contains(&name))
}

/// Generic grouping of item categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotGroup {
    Weapon,
    OneHandWeapon,
    TwoHandWeapon,
    MartialWeapon,
    CasterWeapon,
    RangedWeapon,
    Armour,
    Jewellery,
    Offhand,
}

impl SlotGroup {
    pub fn from_key(key: &str) -> Option<SlotGroup> {
        match key {
            "weapon" => Some(SlotGroup::Weapon),
            "one_hand_weapon" => Some(SlotGroup::OneHandWeapon),
            "two_hand_weapon" => Some(SlotGroup::TwoHandWeapon),
            "martial_weapon" => Some(SlotGroup::MartialWeapon),
            "caster_weapon" => Some(SlotGroup::CasterWeapon),
            "ranged_weapon" => Some(SlotGroup::RangedWeapon),
            "armour" => Some(SlotGroup::Armour),
            "jewellery" => Some(SlotGroup::Jewellery),
            "offhand" => Some(SlotGroup::Offhand),
            _ => None,
        }
    }

    /// Whether the category belongs to this group
    pub fn contains(self, category: &str) -> bool {
        match self {
            SlotGroup::Weapon => {
                ONE_HAND_WEAPONS.contains(&category) || TWO_HAND_WEAPONS.contains(&category)
            }
            SlotGroup::OneHandWeapon => ONE_HAND_WEAPONS.contains(&category),
            SlotGroup::TwoHandWeapon => TWO_HAND_WEAPONS.contains(&category),
            SlotGroup::MartialWeapon => {
                SlotGroup::Weapon.contains(category) && !CASTER_WEAPONS.contains(&category)
            }
            SlotGroup::CasterWeapon => CASTER_WEAPONS.contains(&category),
            SlotGroup::RangedWeapon => RANGED_WEAPONS.contains(&category),
            SlotGroup::Armour => ARMOUR.contains(&category),
            SlotGroup::Jewellery => JEWELLERY.contains(&category),
            SlotGroup::Offhand => OFFHANDS.contains(&category),
        }
    }
}

/// One `(key, weight)` row of a weight table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightCondition {
    #[serde(alias = "weight_key", alias = "match_key")]
    pub key: String,
    #[serde(alias = "weight_val")]
    pub weight: u32,
}

impl WeightCondition {
    pub fn new(key: &str, weight: u32) -> Self {
        WeightCondition {
            key: key.to_string(),
            weight,
        }
    }
}

/// Parsed form of a weight-table key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightMatcher<'a> {
    /// `default`: matches every item
    Default,
    /// Exact item category, e.g. `ring`
    Category(&'a str),
    /// Generic slot group, e.g. `weapon`
    SlotGroup(SlotGroup),
    /// Shield sub-type carried as a base tag, e.g. `str_dex_shield`
    ShieldSubtype(&'a str),
    /// Base tag excluding a family of modifiers, e.g. `no_fire_spell_mods`
    ExcludedTag(&'a str),
    /// Any other base tag, e.g. `str_armour`
    BaseTag(&'a str),
}

impl<'a> WeightMatcher<'a> {
    pub fn parse(key: &'a str) -> Result<WeightMatcher<'a>, ConfigError> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ConfigError::ValidationError(format!(
                "Malformed weight key '{}'",
                key
            )));
        }

        if key == "default" {
            return Ok(WeightMatcher::Default);
        }
        if let Some(group) = SlotGroup::from_key(key) {
            return Ok(WeightMatcher::SlotGroup(group));
        }
        if key.ends_with("_shield") {
            return Ok(WeightMatcher::ShieldSubtype(key));
        }
        if key.starts_with("no_") {
            return Ok(WeightMatcher::ExcludedTag(key));
        }
        if is_known_category(key) {
            return Ok(WeightMatcher::Category(key));
        }
        Ok(WeightMatcher::BaseTag(key))
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            WeightMatcher::Default => true,
            WeightMatcher::Category(category) => item.category == *category,
            WeightMatcher::SlotGroup(group) => group.contains(&item.category),
            WeightMatcher::ShieldSubtype(tag) => {
                item.category == "shield" && item.has_base_tag(tag)
            }
            WeightMatcher::ExcludedTag(tag) | WeightMatcher::BaseTag(tag) => item.has_base_tag(tag),
        }
    }
}

/// Validate every key of a weight table
pub fn validate_conditions(conditions: &[WeightCondition]) -> Result<(), ConfigError> {
    for condition in conditions {
        WeightMatcher::parse(&condition.key)?;
    }
    Ok(())
}

/// Evaluate a weight table against an item, first match wins
pub fn conditional_weight(conditions: &[WeightCondition], item: &Item) -> u32 {
    conditions
        .iter()
        .find(|c| {
            WeightMatcher::parse(&c.key)
                .map(|m| m.matches(item))
                .unwrap_or(false)
        })
        .map(|c| c.weight)
        .unwrap_or(0)
}

/// Legacy category matching: direct category, slot group, or `any`
pub fn category_matches(key: &str, item: &Item) -> bool {
    key == "any"
        || key == item.category
        || SlotGroup::from_key(key)
            .map(|group| group.contains(&item.category))
            .unwrap_or(false)
}

/// Legacy applicability list; an empty list applies to every item
pub fn legacy_applicable(applicable_items: &[String], item: &Item) -> bool {
    applicable_items.is_empty() || applicable_items.iter().any(|key| category_matches(key, item))
}

/// Spawn weight of a modifier on a given item (0 = ineligible)
pub fn spawn_weight(modifier: &Modifier, item: &Item) -> u32 {
    match modifier.weight_conditions.as_deref() {
        Some(conditions) if !conditions.is_empty() => conditional_weight(conditions, item),
        _ => {
            if legacy_applicable(&modifier.applicable_items, item) {
                modifier.weight
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModType;

    fn shield(tags: &[&str]) -> Item {
        Item::new("Braced Tower Shield", "shield", 80).with_base_tags(tags)
    }

    #[test]
    fn test_parse_matcher_kinds() {
        assert_eq!(WeightMatcher::parse("default").unwrap(), WeightMatcher::Default);
        assert_eq!(WeightMatcher::parse("ring").unwrap(), WeightMatcher::Category("ring"));
        assert_eq!(
            WeightMatcher::parse("weapon").unwrap(),
            WeightMatcher::SlotGroup(SlotGroup::Weapon)
        );
        assert_eq!(
            WeightMatcher::parse("str_int_shield").unwrap(),
            WeightMatcher::ShieldSubtype("str_int_shield")
        );
        assert_eq!(
            WeightMatcher::parse("no_fire_spell_mods").unwrap(),
            WeightMatcher::ExcludedTag("no_fire_spell_mods")
        );
        assert_eq!(
            WeightMatcher::parse("str_armour").unwrap(),
            WeightMatcher::BaseTag("str_armour")
        );
        assert!(WeightMatcher::parse("").is_err());
        assert!(WeightMatcher::parse("Body Armour").is_err());
    }

    #[test]
    fn test_direct_category() {
        let ring = Item::new("Iron Ring", "ring", 50);
        let conditions = vec![WeightCondition::new("ring", 800), WeightCondition::new("default", 0)];
        assert_eq!(conditional_weight(&conditions, &ring), 800);

        let belt = Item::new("Heavy Belt", "belt", 50);
        assert_eq!(conditional_weight(&conditions, &belt), 0);
    }

    #[test]
    fn test_slot_group() {
        let conditions = vec![WeightCondition::new("weapon", 500), WeightCondition::new("default", 0)];
        let sword = Item::new("Broadsword", "two_hand_sword", 60);
        let gloves = Item::new("Suede Bracers", "gloves", 60);
        assert_eq!(conditional_weight(&conditions, &sword), 500);
        assert_eq!(conditional_weight(&conditions, &gloves), 0);

        let caster = vec![WeightCondition::new("caster_weapon", 300)];
        assert_eq!(conditional_weight(&caster, &Item::new("Wand", "wand", 10)), 300);
        assert_eq!(conditional_weight(&caster, &sword), 0);
    }

    #[test]
    fn test_shield_subtype() {
        let conditions = vec![
            WeightCondition::new("str_shield", 1000),
            WeightCondition::new("dex_shield", 0),
            WeightCondition::new("default", 0),
        ];
        assert_eq!(conditional_weight(&conditions, &shield(&["str_shield"])), 1000);
        assert_eq!(conditional_weight(&conditions, &shield(&["dex_shield"])), 0);

        // A base tag alone is not enough without the shield category
        let helmet = Item::new("Iron Greathelm", "helmet", 60).with_base_tags(&["str_shield"]);
        assert_eq!(conditional_weight(&conditions, &helmet), 0);
    }

    #[test]
    fn test_excluded_tag_precedes_group() {
        let conditions = vec![
            WeightCondition::new("no_fire_spell_mods", 0),
            WeightCondition::new("caster_weapon", 600),
        ];
        let wand = Item::new("Withered Wand", "wand", 40);
        let restricted = Item::new("Withered Wand", "wand", 40).with_base_tags(&["no_fire_spell_mods"]);
        assert_eq!(conditional_weight(&conditions, &wand), 600);
        assert_eq!(conditional_weight(&conditions, &restricted), 0);
    }

    #[test]
    fn test_default_fallback() {
        let conditions = vec![WeightCondition::new("amulet", 100), WeightCondition::new("default", 40)];
        assert_eq!(conditional_weight(&conditions, &Item::new("Gloves", "gloves", 1)), 40);
        assert_eq!(conditional_weight(&[], &Item::new("Gloves", "gloves", 1)), 0);
    }

    #[test]
    fn test_weighted_table_supersedes_legacy() {
        let mut m = Modifier::new("Hale", ModType::Prefix, "+# to maximum Life", 10.0, 19.0)
            .with_applicable(&["ring"]);
        let ring = Item::new("Iron Ring", "ring", 50);
        let boots = Item::new("Leather Boots", "boots", 50);
        assert_eq!(spawn_weight(&m, &ring), 1000);
        assert_eq!(spawn_weight(&m, &boots), 0);

        m.weight_conditions = Some(vec![WeightCondition::new("boots", 250)]);
        assert_eq!(spawn_weight(&m, &ring), 0);
        assert_eq!(spawn_weight(&m, &boots), 250);
    }

    #[test]
    fn test_legacy_slot_group() {
        let m = Modifier::new("Hale", ModType::Prefix, "+# to maximum Life", 10.0, 19.0)
            .with_applicable(&["armour"]);
        assert_eq!(spawn_weight(&m, &Item::new("Helmet", "helmet", 1)), 1000);
        assert_eq!(spawn_weight(&m, &Item::new("Wand", "wand", 1)), 0);
        assert!(legacy_applicable(&[], &Item::new("Wand", "wand", 1)));
    }
}
