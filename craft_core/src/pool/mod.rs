//! ModifierPool - Legal candidates for an item and weighted selection
//!
//! Selection runs in a fixed order:
//! 1. catalog entries of the requested kind
//! 2. item-level gate, optional modifier-level floor, mod group and declared
//!    exclusion groups, category applicability / spawn weight, and the
//!    desecrated/essence/unique-only switches of the `SelectionFilter`
//! 3. the exclusion engine against the item's current modifiers
//! 4. weighted random pick over the survivors
//! 5. instantiation with freshly rolled values
//!
//! An empty result is a normal outcome (`None`), not an error.

use crate::exclusion::ExclusionEngine;
use crate::item::Item;
use crate::modifier::{weights, Modifier, ModifierCatalog};
use crate::types::{AffixType, ModType};
use rand::Rng;
use std::collections::{BTreeSet, HashSet};

/// Extra constraints for a selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionFilter {
    /// Minimum `required_item_level` of candidates (Greater/Perfect orbs, bones)
    pub min_mod_level: Option<u32>,
    /// Allow desecrated modifiers alongside ordinary ones
    pub include_desecrated: bool,
    /// Only desecrated modifiers (reveal)
    pub desecrated_only: bool,
    pub include_essence_only: bool,
    /// Allow unique-only modifiers alongside ordinary ones
    pub include_exclusive: bool,
    /// Only unique-only modifiers
    pub exclusive_only: bool,
    /// Candidate must share at least one of these visible tags
    pub shared_tags: Option<BTreeSet<String>>,
    /// Candidate must carry this tag
    pub required_tag: Option<String>,
    /// Names already offered or chosen
    pub excluded_names: Vec<String>,
}

impl SelectionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_mod_level(mut self, level: Option<u32>) -> Self {
        self.min_mod_level = level;
        self
    }

    pub fn with_shared_tags(mut self, tags: BTreeSet<String>) -> Self {
        self.shared_tags = Some(tags);
        self
    }

    pub fn with_required_tag(mut self, tag: Option<String>) -> Self {
        self.required_tag = tag;
        self
    }

    /// Filter used when revealing desecrated modifiers
    pub fn desecrated() -> Self {
        SelectionFilter {
            desecrated_only: true,
            ..Default::default()
        }
    }

    /// Filter used when rolling unique-only modifiers
    pub fn exclusive() -> Self {
        SelectionFilter {
            exclusive_only: true,
            ..Default::default()
        }
    }
}

/// A legal candidate with its spawn weight on the target item
#[derive(Debug, Clone, Copy)]
pub struct WeightedCandidate<'a> {
    pub modifier: &'a Modifier,
    pub weight: u32,
}

/// Weighted random choice: draw in `[0, total)` and walk cumulative weights
///
/// Zero-weight entries are never returned. `None` when nothing has weight.
pub fn weighted_choice<'c, T>(
    entries: &'c [T],
    weight_of: impl Fn(&T) -> u32,
    rng: &mut impl Rng,
) -> Option<&'c T> {
    let total: u64 = entries.iter().map(|e| weight_of(e) as u64).sum();
    if total == 0 {
        return None;
    }

    let draw = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    for entry in entries {
        let weight = weight_of(entry) as u64;
        if weight == 0 {
            continue;
        }
        cumulative += weight;
        if cumulative > draw {
            return Some(entry);
        }
    }
    None
}

/// View over the catalog and exclusion rules answering selection queries
#[derive(Debug, Clone, Copy)]
pub struct ModifierPool<'a> {
    catalog: &'a ModifierCatalog,
    exclusions: &'a ExclusionEngine,
}

impl<'a> ModifierPool<'a> {
    pub fn new(catalog: &'a ModifierCatalog, exclusions: &'a ExclusionEngine) -> Self {
        ModifierPool {
            catalog,
            exclusions,
        }
    }

    pub fn catalog(&self) -> &'a ModifierCatalog {
        self.catalog
    }

    pub fn exclusions(&self) -> &'a ExclusionEngine {
        self.exclusions
    }

    /// Candidates of one kind legal on the item right now, with weights
    pub fn eligible(
        &self,
        item: &Item,
        mod_type: ModType,
        filter: &SelectionFilter,
    ) -> Vec<WeightedCandidate<'a>> {
        let existing: Vec<&Modifier> = item.explicit_mods().collect();
        let present_groups: BTreeSet<&str> = existing
            .iter()
            .filter(|m| !m.is_unrevealed)
            .filter_map(|m| m.mod_group.as_deref())
            .collect();
        let present_names: HashSet<(&str, ModType)> = existing
            .iter()
            .map(|m| (m.name.as_str(), m.mod_type))
            .collect();
        let present_exclusions: BTreeSet<&str> = existing
            .iter()
            .flat_map(|m| m.exclusion_groups.iter().map(String::as_str))
            .collect();

        self.catalog
            .of_type(mod_type)
            .filter(|m| passes_filter(m, item, filter))
            .filter(|m| !present_names.contains(&(m.name.as_str(), m.mod_type)))
            .filter(|m| {
                m.mod_group
                    .as_deref()
                    .map(|g| !present_groups.contains(g))
                    .unwrap_or(true)
            })
            .filter(|m| {
                !m.exclusion_groups
                    .iter()
                    .any(|g| present_exclusions.contains(g.as_str()))
            })
            .filter_map(|m| {
                let weight = weights::spawn_weight(m, item);
                (weight > 0).then_some(WeightedCandidate { modifier: m, weight })
            })
            .filter(|c| match mod_type.affix() {
                Some(affix) => self
                    .exclusions
                    .conflicts(c.modifier, &existing, item, affix)
                    .is_empty(),
                None => true,
            })
            .collect()
    }

    /// Pick one modifier of the given affix type, weighted, and roll it
    pub fn select(
        &self,
        item: &Item,
        affix: AffixType,
        filter: &SelectionFilter,
        rng: &mut impl Rng,
    ) -> Option<Modifier> {
        self.select_of_type(item, affix.mod_type(), filter, rng)
    }

    pub fn select_of_type(
        &self,
        item: &Item,
        mod_type: ModType,
        filter: &SelectionFilter,
        rng: &mut impl Rng,
    ) -> Option<Modifier> {
        let candidates = self.eligible(item, mod_type, filter);
        let chosen = weighted_choice(&candidates, |c| c.weight, rng)?;
        log::debug!(
            "Selected {} '{}' (T{}) from {} candidates",
            mod_type,
            chosen.modifier.name,
            chosen.modifier.tier,
            candidates.len()
        );
        Some(chosen.modifier.instantiate(rng))
    }

    /// Pick one modifier across several affix types as a single weighted pool
    pub fn select_any(
        &self,
        item: &Item,
        affixes: &[AffixType],
        filter: &SelectionFilter,
        rng: &mut impl Rng,
    ) -> Option<Modifier> {
        let candidates: Vec<WeightedCandidate<'a>> = affixes
            .iter()
            .flat_map(|a| self.eligible(item, a.mod_type(), filter))
            .collect();
        let chosen = weighted_choice(&candidates, |c| c.weight, rng)?;
        Some(chosen.modifier.instantiate(rng))
    }

    /// Up to `count` distinct modifiers (by name and mod group), weighted
    /// without replacement
    pub fn select_distinct(
        &self,
        item: &Item,
        affix: AffixType,
        filter: &SelectionFilter,
        count: usize,
        rng: &mut impl Rng,
    ) -> Vec<Modifier> {
        let mut candidates = self.eligible(item, affix.mod_type(), filter);
        let mut chosen = Vec::with_capacity(count);

        while chosen.len() < count {
            let Some(pick) = weighted_choice(&candidates, |c| c.weight, rng).copied() else {
                break;
            };
            candidates.retain(|c| {
                c.modifier.name != pick.modifier.name
                    && (pick.modifier.mod_group.is_none()
                        || c.modifier.mod_group != pick.modifier.mod_group)
            });
            chosen.push(pick.modifier.instantiate(rng));
        }

        chosen
    }
}

fn passes_filter(m: &Modifier, item: &Item, filter: &SelectionFilter) -> bool {
    if m.is_unrevealed || m.required_item_level > item.item_level {
        return false;
    }
    if let Some(floor) = filter.min_mod_level {
        if m.required_item_level < floor {
            return false;
        }
    }
    if filter.desecrated_only {
        if !m.is_desecrated {
            return false;
        }
    } else if m.is_desecrated && !filter.include_desecrated {
        return false;
    }
    if m.is_essence_only && !filter.include_essence_only {
        return false;
    }
    if filter.exclusive_only {
        if !m.is_exclusive {
            return false;
        }
    } else if m.is_exclusive && !filter.include_exclusive {
        return false;
    }
    if let Some(tags) = &filter.shared_tags {
        if !m.visible_tags().any(|t| tags.contains(t)) {
            return false;
        }
    }
    if let Some(tag) = &filter.required_tag {
        if !m.has_tag(tag) {
            return false;
        }
    }
    !filter.excluded_names.iter().any(|n| *n == m.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ExclusionRule;
    use crate::types::Rarity;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn catalog() -> ModifierCatalog {
        ModifierCatalog::new(vec![
            Modifier::new("Hale", ModType::Prefix, "+# to maximum Life", 10.0, 19.0)
                .with_group("IncreasedLife")
                .with_tags(&["life"]),
            Modifier::new("Robust", ModType::Prefix, "+# to maximum Life", 60.0, 79.0)
                .with_group("IncreasedLife")
                .with_tags(&["life"])
                .with_level(44),
            Modifier::new("Heated", ModType::Prefix, "Adds # to # Fire Damage", 2.0, 4.0)
                .with_range(5.0, 8.0)
                .with_group("FireDamage")
                .with_tags(&["fire", "damage", "attack"])
                .with_applicable(&["weapon"]),
            Modifier::new("Never", ModType::Prefix, "+# to Nothing", 1.0, 1.0).with_weight(0),
            Modifier::new("of the Ice", ModType::Suffix, "+#% to Cold Resistance", 6.0, 10.0)
                .with_group("ColdResistance")
                .with_tags(&["cold", "resistance"]),
            Modifier::new("of Venom", ModType::Suffix, "#% chance to Poison", 5.0, 10.0)
                .with_tags(&["ailment", "chaos"]),
            Modifier::new("of Bleeding", ModType::Suffix, "#% chance to cause Bleeding", 5.0, 10.0)
                .with_tags(&["ailment", "physical"]),
        ])
        .unwrap()
    }

    fn engine() -> ExclusionEngine {
        ExclusionEngine::new(vec![ExclusionRule {
            name: "ailment".to_string(),
            tag: Some("ailment".to_string()),
            ..Default::default()
        }])
        .unwrap()
    }

    fn names(candidates: &[WeightedCandidate<'_>]) -> Vec<String> {
        candidates.iter().map(|c| c.modifier.name.clone()).collect()
    }

    #[test]
    fn test_item_level_and_category_gates() {
        let catalog = catalog();
        let engine = engine();
        let pool = ModifierPool::new(&catalog, &engine);

        let ring = Item::new("Iron Ring", "ring", 20).with_rarity(Rarity::Rare);
        let eligible = names(&pool.eligible(&ring, ModType::Prefix, &SelectionFilter::new()));
        assert_eq!(eligible, vec!["Hale".to_string()]);

        let sword = Item::new("Broadsword", "two_hand_sword", 80).with_rarity(Rarity::Rare);
        let eligible = names(&pool.eligible(&sword, ModType::Prefix, &SelectionFilter::new()));
        assert_eq!(eligible.len(), 3);
        assert!(!eligible.contains(&"Never".to_string()));
    }

    #[test]
    fn test_min_mod_level_floor() {
        let catalog = catalog();
        let engine = engine();
        let pool = ModifierPool::new(&catalog, &engine);
        let ring = Item::new("Iron Ring", "ring", 80).with_rarity(Rarity::Rare);

        let filter = SelectionFilter::new().with_min_mod_level(Some(40));
        assert_eq!(names(&pool.eligible(&ring, ModType::Prefix, &filter)), vec!["Robust".to_string()]);
    }

    #[test]
    fn test_mod_group_and_tag_exclusion() {
        let catalog = catalog();
        let engine = engine();
        let pool = ModifierPool::new(&catalog, &engine);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let hale = catalog.get("Hale", ModType::Prefix).unwrap().instantiate(&mut rng);
        let venom = catalog.get("of Venom", ModType::Suffix).unwrap().instantiate(&mut rng);
        let ring = Item::new("Iron Ring", "ring", 80)
            .with_rarity(Rarity::Rare)
            .with_prefix(hale)
            .with_suffix(venom);

        assert!(pool.eligible(&ring, ModType::Prefix, &SelectionFilter::new()).is_empty());
        let suffixes = names(&pool.eligible(&ring, ModType::Suffix, &SelectionFilter::new()));
        assert_eq!(suffixes, vec!["of the Ice".to_string()]);
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let catalog = ModifierCatalog::new(vec![
            Modifier::new("Common", ModType::Prefix, "+# to Armour", 1.0, 5.0).with_weight(10),
            Modifier::new("Never", ModType::Prefix, "+# to Nothing", 1.0, 1.0).with_weight(0),
        ])
        .unwrap();
        let engine = ExclusionEngine::empty();
        let pool = ModifierPool::new(&catalog, &engine);
        let item = Item::new("Helmet", "helmet", 80).with_rarity(Rarity::Rare);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..500 {
            let m = pool.select(&item, AffixType::Prefix, &SelectionFilter::new(), &mut rng).unwrap();
            assert_eq!(m.name, "Common");
        }
    }

    #[test]
    fn test_weighted_choice_distribution() {
        let entries = [("a", 1u32), ("b", 3u32), ("c", 0u32)];
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut b_count = 0;
        for _ in 0..4000 {
            let pick = weighted_choice(&entries, |e| e.1, &mut rng).unwrap();
            assert_ne!(pick.0, "c");
            if pick.0 == "b" {
                b_count += 1;
            }
        }
        // Expect roughly 75%
        assert!(b_count > 2700 && b_count < 3300, "b picked {} times", b_count);

        let empty: [(&str, u32); 1] = [("z", 0)];
        assert!(weighted_choice(&empty, |e| e.1, &mut rng).is_none());
    }

    #[test]
    fn test_select_returns_none_when_exhausted() {
        let catalog = catalog();
        let engine = engine();
        let pool = ModifierPool::new(&catalog, &engine);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let item = Item::new("Iron Ring", "ring", 1).with_rarity(Rarity::Rare);
        let filter = SelectionFilter::new().with_min_mod_level(Some(90));
        assert!(pool.select(&item, AffixType::Prefix, &filter, &mut rng).is_none());
    }

    #[test]
    fn test_select_distinct() {
        let catalog = catalog();
        let engine = engine();
        let pool = ModifierPool::new(&catalog, &engine);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let sword = Item::new("Broadsword", "two_hand_sword", 80).with_rarity(Rarity::Rare);

        let picks = pool.select_distinct(&sword, AffixType::Prefix, &SelectionFilter::new(), 3, &mut rng);
        // Hale and Robust share a group, so only two distinct groups exist
        assert_eq!(picks.len(), 2);
        assert_ne!(picks[0].mod_group, picks[1].mod_group);
    }

    #[test]
    fn test_shared_tags_filter() {
        let catalog = catalog();
        let engine = ExclusionEngine::empty();
        let pool = ModifierPool::new(&catalog, &engine);
        let ring = Item::new("Iron Ring", "ring", 80).with_rarity(Rarity::Rare);
        let tags: BTreeSet<String> = ["chaos".to_string()].into_iter().collect();
        let filter = SelectionFilter::new().with_shared_tags(tags);
        assert_eq!(names(&pool.eligible(&ring, ModType::Suffix, &filter)), vec!["of Venom".to_string()]);
    }
}
