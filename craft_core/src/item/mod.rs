//! Item - The mutable entity being crafted

use crate::error::Rejection;
use crate::modifier::Modifier;
use crate::types::{AffixType, BonePart, BoneType, Rarity};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Pending desecrated modifier, paired with a placeholder in the affix lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnrevealedMod {
    /// Matches `unrevealed_id` on the placeholder modifier
    pub id: u32,
    pub affix: AffixType,
    pub bone_type: BoneType,
    pub bone_part: BonePart,
    /// Floor on the revealed modifier's required item level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_modifier_level: Option<u32>,
    /// Boss tag every reveal candidate must carry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_boss_tag: Option<String>,
}

/// Position of an explicit modifier on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModSlot {
    pub affix: AffixType,
    pub index: usize,
}

/// An item being crafted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Base type name, e.g. "Iron Ring"
    pub base_type: String,
    /// Item category, e.g. "ring" or "body_armour"
    pub category: String,
    /// Base tags such as attribute requirements or shield sub-types
    #[serde(default)]
    pub base_tags: Vec<String>,
    pub rarity: Rarity,
    pub item_level: u32,
    #[serde(default)]
    pub quality: u32,
    #[serde(default)]
    pub prefix_mods: Vec<Modifier>,
    #[serde(default)]
    pub suffix_mods: Vec<Modifier>,
    #[serde(default)]
    pub implicit_mods: Vec<Modifier>,
    #[serde(default)]
    pub unrevealed_mods: Vec<UnrevealedMod>,
    #[serde(default)]
    pub corrupted: bool,
    #[serde(default)]
    pub mirrored: bool,
}

impl Item {
    /// Create a Normal item with no modifiers
    pub fn new(base_type: &str, category: &str, item_level: u32) -> Self {
        Item {
            base_type: base_type.to_string(),
            category: category.to_string(),
            base_tags: Vec::new(),
            rarity: Rarity::Normal,
            item_level,
            quality: 0,
            prefix_mods: Vec::new(),
            suffix_mods: Vec::new(),
            implicit_mods: Vec::new(),
            unrevealed_mods: Vec::new(),
            corrupted: false,
            mirrored: false,
        }
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_base_tags(mut self, tags: &[&str]) -> Self {
        self.base_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_prefix(mut self, modifier: Modifier) -> Self {
        self.prefix_mods.push(modifier);
        self
    }

    pub fn with_suffix(mut self, modifier: Modifier) -> Self {
        self.suffix_mods.push(modifier);
        self
    }

    pub fn with_implicit(mut self, modifier: Modifier) -> Self {
        self.implicit_mods.push(modifier);
        self
    }

    pub fn has_base_tag(&self, tag: &str) -> bool {
        self.base_tags.iter().any(|t| t == tag)
    }

    // === Locks ===

    /// Corrupted and mirrored items reject every further mechanic
    pub fn ensure_modifiable(&self) -> Result<(), Rejection> {
        if self.corrupted {
            return Err(Rejection::Corrupted);
        }
        if self.mirrored {
            return Err(Rejection::Mirrored);
        }
        Ok(())
    }

    pub fn ensure_rarity(&self, required: Rarity) -> Result<(), Rejection> {
        if self.rarity != required {
            return Err(Rejection::WrongRarity {
                required,
                actual: self.rarity,
            });
        }
        Ok(())
    }

    // === Affix access ===

    pub fn mods(&self, affix: AffixType) -> &[Modifier] {
        match affix {
            AffixType::Prefix => &self.prefix_mods,
            AffixType::Suffix => &self.suffix_mods,
        }
    }

    pub fn mods_mut(&mut self, affix: AffixType) -> &mut Vec<Modifier> {
        match affix {
            AffixType::Prefix => &mut self.prefix_mods,
            AffixType::Suffix => &mut self.suffix_mods,
        }
    }

    /// Prefixes then suffixes
    pub fn explicit_mods(&self) -> impl Iterator<Item = &Modifier> {
        self.prefix_mods.iter().chain(self.suffix_mods.iter())
    }

    pub fn explicit_count(&self) -> usize {
        self.prefix_mods.len() + self.suffix_mods.len()
    }

    pub fn max_affixes(&self, affix: AffixType) -> usize {
        self.rarity.max_affixes(affix)
    }

    pub fn has_room(&self, affix: AffixType) -> bool {
        self.mods(affix).len() < self.max_affixes(affix)
    }

    /// Affix types with at least one free slot
    pub fn open_affixes(&self) -> Vec<AffixType> {
        AffixType::all()
            .into_iter()
            .filter(|a| self.has_room(*a))
            .collect()
    }

    /// Total free slots across both affix types
    pub fn open_slots(&self) -> usize {
        AffixType::all()
            .iter()
            .map(|a| self.max_affixes(*a).saturating_sub(self.mods(*a).len()))
            .sum()
    }

    /// Whether both affix lists respect the current rarity's caps
    pub fn within_caps(&self) -> bool {
        self.prefix_mods.len() <= self.rarity.max_prefixes()
            && self.suffix_mods.len() <= self.rarity.max_suffixes()
    }

    // === Queries ===

    pub fn has_mod_group(&self, group: &str) -> bool {
        self.explicit_mods()
            .any(|m| m.mod_group.as_deref() == Some(group))
    }

    pub fn fractured_count(&self) -> usize {
        self.explicit_mods().filter(|m| m.is_fractured).count()
    }

    pub fn has_fractured(&self) -> bool {
        self.fractured_count() > 0
    }

    pub fn has_desecrated(&self) -> bool {
        self.explicit_mods().any(|m| m.is_desecrated)
    }

    pub fn has_unrevealed(&self) -> bool {
        !self.unrevealed_mods.is_empty() || self.explicit_mods().any(|m| m.is_unrevealed)
    }

    /// Player-visible tags across revealed explicit modifiers
    pub fn visible_tags(&self) -> BTreeSet<String> {
        self.explicit_mods()
            .filter(|m| !m.is_unrevealed)
            .flat_map(|m| m.visible_tags())
            .map(str::to_string)
            .collect()
    }

    /// Slots of explicit modifiers matching a predicate
    pub fn slots_where<F>(&self, affixes: &[AffixType], predicate: F) -> Vec<ModSlot>
    where
        F: Fn(&Modifier) -> bool,
    {
        let mut slots = Vec::new();
        for affix in affixes {
            for (index, modifier) in self.mods(*affix).iter().enumerate() {
                if predicate(modifier) {
                    slots.push(ModSlot {
                        affix: *affix,
                        index,
                    });
                }
            }
        }
        slots
    }

    /// Slots holding modifiers that removal mechanics may take off
    pub fn removable_slots(&self, affixes: &[AffixType]) -> Vec<ModSlot> {
        self.slots_where(affixes, Modifier::is_removable)
    }

    pub fn modifier_at(&self, slot: ModSlot) -> Option<&Modifier> {
        self.mods(slot.affix).get(slot.index)
    }

    // === Mutation ===

    /// Attach a rolled modifier to its affix list
    ///
    /// Implicits go to the implicit list; the caller is responsible for
    /// checking room beforehand.
    pub fn attach(&mut self, modifier: Modifier) {
        match modifier.affix_type() {
            Some(affix) => self.mods_mut(affix).push(modifier),
            None => self.implicit_mods.push(modifier),
        }
    }

    /// Remove the modifier at a slot, dropping its unrevealed record if any
    ///
    /// Fractured modifiers are never removed; `None` is returned instead.
    pub fn remove_at(&mut self, slot: ModSlot) -> Option<Modifier> {
        let list = self.mods_mut(slot.affix);
        if slot.index >= list.len() || list[slot.index].is_fractured {
            return None;
        }
        let removed = list.remove(slot.index);
        if let Some(id) = removed.unrevealed_id {
            self.unrevealed_mods.retain(|u| u.id != id);
        }
        Some(removed)
    }

    /// Remove one random modifier among the given slots
    pub fn remove_random(&mut self, slots: &[ModSlot], rng: &mut impl Rng) -> Option<Modifier> {
        let slot = *slots.choose(rng)?;
        self.remove_at(slot)
    }

    /// Remove every non-fractured explicit modifier, returning how many went
    pub fn strip_removable(&mut self) -> usize {
        let before = self.explicit_count();
        self.prefix_mods.retain(|m| m.is_fractured);
        self.suffix_mods.retain(|m| m.is_fractured);
        let kept: BTreeSet<u32> = self.explicit_mods().filter_map(|m| m.unrevealed_id).collect();
        self.unrevealed_mods.retain(|u| kept.contains(&u.id));
        before - self.explicit_count()
    }

    /// Next free id for an unrevealed placeholder
    pub fn next_unrevealed_id(&self) -> u32 {
        self.explicit_mods()
            .filter_map(|m| m.unrevealed_id)
            .chain(self.unrevealed_mods.iter().map(|u| u.id))
            .max()
            .map(|id| id + 1)
            .unwrap_or(1)
    }

    pub fn unrevealed(&self, id: u32) -> Option<&UnrevealedMod> {
        self.unrevealed_mods.iter().find(|u| u.id == id)
    }

    /// Locate the placeholder for an unrevealed record
    pub fn placeholder_slot(&self, id: u32) -> Option<ModSlot> {
        self.slots_where(&AffixType::all(), |m| m.unrevealed_id == Some(id) && m.is_unrevealed)
            .into_iter()
            .next()
    }

    // === Boundary serialization ===

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Item, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn prefix(name: &str) -> Modifier {
        Modifier::new(name, ModType::Prefix, "+# to maximum Life", 10.0, 19.0)
    }

    fn suffix(name: &str) -> Modifier {
        Modifier::new(name, ModType::Suffix, "+#% to Fire Resistance", 6.0, 10.0)
    }

    #[test]
    fn test_room() {
        let item = Item::new("Iron Ring", "ring", 50)
            .with_rarity(Rarity::Magic)
            .with_prefix(prefix("Hale"));
        assert!(!item.has_room(AffixType::Prefix));
        assert!(item.has_room(AffixType::Suffix));
        assert_eq!(item.open_affixes(), vec![AffixType::Suffix]);
        assert_eq!(item.open_slots(), 1);
    }

    #[test]
    fn test_fractured_not_removed() {
        let mut locked = prefix("Hale");
        locked.is_fractured = true;
        let mut item = Item::new("Iron Ring", "ring", 50)
            .with_rarity(Rarity::Rare)
            .with_prefix(locked)
            .with_suffix(suffix("of the Furnace"));

        assert!(item.remove_at(ModSlot { affix: AffixType::Prefix, index: 0 }).is_none());
        assert_eq!(item.removable_slots(&AffixType::all()).len(), 1);
        assert_eq!(item.strip_removable(), 1);
        assert_eq!(item.prefix_mods.len(), 1);
        assert!(item.suffix_mods.is_empty());
    }

    #[test]
    fn test_remove_random_only_from_slots() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut item = Item::new("Iron Ring", "ring", 50)
            .with_rarity(Rarity::Rare)
            .with_prefix(prefix("Hale"))
            .with_suffix(suffix("of the Furnace"));
        let slots = item.removable_slots(&[AffixType::Suffix]);
        let removed = item.remove_random(&slots, &mut rng).unwrap();
        assert_eq!(removed.name, "of the Furnace");
        assert_eq!(item.prefix_mods.len(), 1);
    }

    #[test]
    fn test_unrevealed_bookkeeping() {
        let mut item = Item::new("Iron Ring", "ring", 50).with_rarity(Rarity::Rare);
        let id = item.next_unrevealed_id();
        assert_eq!(id, 1);
        item.attach(Modifier::unrevealed(AffixType::Suffix, id));
        item.unrevealed_mods.push(UnrevealedMod {
            id,
            affix: AffixType::Suffix,
            bone_type: BoneType::Gnawed,
            bone_part: BonePart::Collarbone,
            min_modifier_level: None,
            required_boss_tag: None,
        });
        assert!(item.has_unrevealed());
        assert_eq!(item.next_unrevealed_id(), 2);
        assert_eq!(item.placeholder_slot(id), Some(ModSlot { affix: AffixType::Suffix, index: 0 }));

        item.remove_at(ModSlot { affix: AffixType::Suffix, index: 0 });
        assert!(!item.has_unrevealed());
    }

    #[test]
    fn test_visible_tags_skip_hidden() {
        let item = Item::new("Iron Ring", "ring", 50)
            .with_rarity(Rarity::Rare)
            .with_prefix(prefix("Hale").with_tags(&["life", "essence"]))
            .with_suffix(Modifier::unrevealed(AffixType::Suffix, 1));
        let tags = item.visible_tags();
        assert!(tags.contains("life"));
        assert!(!tags.contains("essence"));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut hale = prefix("Hale").with_range(3.0, 5.0).instantiate(&mut rng);
        hale.is_fractured = true;
        let mut item = Item::new("Iron Ring", "ring", 50)
            .with_rarity(Rarity::Rare)
            .with_prefix(hale)
            .with_suffix(Modifier::unrevealed(AffixType::Suffix, 1));
        item.unrevealed_mods.push(UnrevealedMod {
            id: 1,
            affix: AffixType::Suffix,
            bone_type: BoneType::Ancient,
            bone_part: BonePart::Rib,
            min_modifier_level: Some(40),
            required_boss_tag: Some("ulaman".to_string()),
        });
        item.corrupted = true;
        item.quality = 20;

        let json = item.to_json().unwrap();
        let back = Item::from_json(&json).unwrap();
        assert_eq!(back, item);
    }
}
