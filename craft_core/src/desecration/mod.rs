//! Desecration - Abyssal bones add a hidden modifier revealed later
//!
//! Applying a bone appends an unrevealed placeholder plus an `UnrevealedMod`
//! record describing how the eventual reveal is constrained. The reveal itself
//! is a separate step (see `reveal`), triggered by the caller.

pub mod reveal;

pub use reveal::{apply_revealed, reveal_candidates, RevealSession, REVEAL_CANDIDATES};

use crate::error::Rejection;
use crate::item::{Item, ModSlot, UnrevealedMod};
use crate::modifier::{weights, Modifier};
use crate::omen::OmenContext;
use crate::types::{AffixType, BonePart, BoneType, Rarity};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Abyssal bone definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneDef {
    pub name: String,
    pub bone_type: BoneType,
    pub bone_part: BonePart,
    #[serde(default = "default_stack_size")]
    pub stack_size: u32,
    /// Categories or slot groups; empty means the part's default families
    #[serde(default)]
    pub applicable_items: Vec<String>,
    /// Floor on the revealed modifier's required item level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_modifier_level: Option<u32>,
    /// Highest item level the bone can be used on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_item_level: Option<u32>,
}

fn default_stack_size() -> u32 {
    1
}

/// Item families a bone part fits when the bone lists none
pub fn part_targets(part: BonePart) -> &'static [&'static str] {
    match part {
        BonePart::Jawbone => &["weapon", "quiver"],
        BonePart::Rib => &["armour"],
        BonePart::Collarbone => &["jewellery"],
        BonePart::Cranium => &["jewel"],
        BonePart::Vertebrae => &["waystone"],
    }
}

impl BoneDef {
    pub fn fits(&self, item: &Item) -> bool {
        if self.applicable_items.is_empty() {
            part_targets(self.bone_part)
                .iter()
                .any(|key| weights::category_matches(key, item))
        } else {
            weights::legacy_applicable(&self.applicable_items, item)
        }
    }
}

fn removable_in(item: &Item, affix: AffixType) -> Vec<ModSlot> {
    item.slots_where(&[affix], |m| m.is_removable() && !m.is_unrevealed)
}

/// Affix types the placeholder may go into, and whether a removal is needed
///
/// Returns the candidate types; every candidate either has room already or
/// holds a removable modifier.
fn placement_options(item: &Item, ctx: &OmenContext) -> Result<Vec<AffixType>, Rejection> {
    if let Some(forced) = ctx.add_affix {
        if item.has_room(forced) || !removable_in(item, forced).is_empty() {
            return Ok(vec![forced]);
        }
        return Err(Rejection::NoRoomFor(forced));
    }

    let open = item.open_affixes();
    if !open.is_empty() {
        return Ok(open);
    }

    // Full item: one modifier goes first
    if let Some(forced) = ctx.remove_affix {
        if removable_in(item, forced).is_empty() {
            return Err(Rejection::NoRemovableModifiers);
        }
        return Ok(vec![forced]);
    }

    let with_removable: Vec<AffixType> = AffixType::all()
        .into_iter()
        .filter(|a| !removable_in(item, *a).is_empty())
        .collect();
    let most = with_removable
        .iter()
        .map(|a| item.mods(*a).len())
        .max()
        .ok_or(Rejection::NoRemovableModifiers)?;
    Ok(with_removable
        .into_iter()
        .filter(|a| item.mods(*a).len() == most)
        .collect())
}

/// Legality of a bone on an item
pub fn check(bone: &BoneDef, item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Rare)?;
    if item.has_unrevealed() {
        return Err(Rejection::HasUnrevealed);
    }
    if item.has_desecrated() {
        return Err(Rejection::HasDesecrated);
    }
    if !bone.fits(item) {
        return Err(Rejection::UnsupportedCategory {
            category: item.category.clone(),
        });
    }
    if let Some(max) = bone.max_item_level {
        if item.item_level > max {
            return Err(Rejection::ItemLevelTooHigh {
                item_level: item.item_level,
                max,
            });
        }
    }
    placement_options(item, ctx).map(|_| ())
}

/// Apply a bone: make room if needed, then append the placeholder and its record
pub fn apply(
    bone: &BoneDef,
    item: &mut Item,
    ctx: &OmenContext,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    let options = placement_options(item, ctx)?;
    let affix = *options.choose(rng).ok_or(Rejection::NoRoom)?;

    let mut message = String::new();
    if !item.has_room(affix) {
        let slots = removable_in(item, affix);
        let removed = item
            .remove_random(&slots, rng)
            .ok_or(Rejection::NoRoomFor(affix))?;
        log::debug!("{} removed {} to make room", bone.name, removed.name);
        message = format!("Removed {}; ", removed.name);
    }

    let id = item.next_unrevealed_id();
    item.attach(Modifier::unrevealed(affix, id));
    item.unrevealed_mods.push(UnrevealedMod {
        id,
        affix,
        bone_type: bone.bone_type,
        bone_part: bone.bone_part,
        min_modifier_level: bone.min_modifier_level,
        required_boss_tag: ctx.boss_tag.clone(),
    });

    message.push_str(&format!("Added an unrevealed desecrated {} (id {})", affix, id));
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rib() -> BoneDef {
        BoneDef {
            name: "Preserved Rib".to_string(),
            bone_type: BoneType::Preserved,
            bone_part: BonePart::Rib,
            stack_size: 10,
            applicable_items: Vec::new(),
            min_modifier_level: None,
            max_item_level: None,
        }
    }

    fn plain(name: &str, mod_type: ModType) -> Modifier {
        Modifier::new(name, mod_type, "+# to Something", 1.0, 5.0)
    }

    fn full_rare() -> Item {
        let mut item = Item::new("Helmet", "helmet", 80).with_rarity(Rarity::Rare);
        for i in 0..3 {
            item.prefix_mods.push(plain(&format!("P{}", i), ModType::Prefix));
            item.suffix_mods.push(plain(&format!("S{}", i), ModType::Suffix));
        }
        item
    }

    #[test]
    fn test_bone_adds_placeholder_and_record() {
        let mut rng = ChaCha8Rng::seed_from_u64(61);
        let mut item = Item::new("Helmet", "helmet", 80)
            .with_rarity(Rarity::Rare)
            .with_prefix(plain("Hale", ModType::Prefix));
        let ctx = OmenContext {
            boss_tag: Some("ulaman".to_string()),
            ..Default::default()
        };
        check(&rib(), &item, &ctx).unwrap();
        apply(&rib(), &mut item, &ctx, &mut rng).unwrap();

        assert_eq!(item.unrevealed_mods.len(), 1);
        let record = &item.unrevealed_mods[0];
        assert_eq!(record.bone_type, BoneType::Preserved);
        assert_eq!(record.required_boss_tag.as_deref(), Some("ulaman"));
        assert!(item.placeholder_slot(record.id).is_some());
        assert_eq!(check(&rib(), &item, &ctx), Err(Rejection::HasUnrevealed));
    }

    #[test]
    fn test_full_item_loses_one_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(62);
        let mut item = full_rare();
        item.prefix_mods[0].is_fractured = true;
        apply(&rib(), &mut item, &OmenContext::default(), &mut rng).unwrap();
        assert_eq!(item.explicit_count(), 6);
        assert!(item.prefix_mods[0].is_fractured);
        assert!(item.has_unrevealed());
        assert!(item.within_caps());
    }

    #[test]
    fn test_part_and_level_gates() {
        let ring = Item::new("Iron Ring", "ring", 80).with_rarity(Rarity::Rare);
        assert!(matches!(
            check(&rib(), &ring, &OmenContext::default()),
            Err(Rejection::UnsupportedCategory { .. })
        ));

        let mut ancient = rib();
        ancient.bone_type = BoneType::Ancient;
        ancient.max_item_level = Some(64);
        let helmet = Item::new("Helmet", "helmet", 80).with_rarity(Rarity::Rare);
        assert_eq!(
            check(&ancient, &helmet, &OmenContext::default()),
            Err(Rejection::ItemLevelTooHigh { item_level: 80, max: 64 })
        );
    }

    #[test]
    fn test_forced_prefix_placement() {
        let mut rng = ChaCha8Rng::seed_from_u64(63);
        let ctx = OmenContext {
            add_affix: Some(AffixType::Prefix),
            ..Default::default()
        };
        for _ in 0..10 {
            let mut item = full_rare();
            apply(&rib(), &mut item, &ctx, &mut rng).unwrap();
            assert_eq!(item.suffix_mods.len(), 3);
            assert!(item.prefix_mods.iter().any(|m| m.is_unrevealed));
        }
    }
}
