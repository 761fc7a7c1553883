//! Essences - Guaranteed modifiers from a per-item-type effect table
//!
//! An essence never draws from the weighted pool. Its modifier comes from the
//! first effect entry matching the item's category, with a tier fixed by the
//! essence's strength.

use crate::error::Rejection;
use crate::exclusion::ExclusionEngine;
use crate::item::{Item, ModSlot};
use crate::mechanic::steps::describe;
use crate::modifier::{weights, Modifier};
use crate::omen::OmenContext;
use crate::types::{AffixType, Rarity};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tag carried by the modifier an abyssal essence grants
pub const ABYSSAL_MARK_TAG: &str = "abyssal_mark";

/// Tag carried by every essence-granted modifier
pub const ESSENCE_TAG: &str = "essence";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EssenceMechanic {
    /// Magic to Rare, adding the guaranteed modifier
    MagicToRare,
    /// On a Rare: remove one modifier, then add the guaranteed one
    RemoveAddRare,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EssenceStrength {
    Lesser,
    #[default]
    Normal,
    Greater,
    Perfect,
    Corrupted,
}

impl EssenceStrength {
    /// Tier ceiling of the guaranteed modifier
    ///
    /// The rolled range always comes from the effect table. Catalog
    /// validation keeps those ranges ordered by strength for each effect.
    pub fn tier(self) -> u32 {
        match self {
            EssenceStrength::Lesser => 5,
            EssenceStrength::Normal => 4,
            EssenceStrength::Greater => 3,
            EssenceStrength::Corrupted => 2,
            EssenceStrength::Perfect => 1,
        }
    }
}

/// Affix type an effect lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectAffix {
    Prefix,
    Suffix,
    /// Whichever type has room once any removal is done
    Any,
}

impl EffectAffix {
    pub fn fixed(self) -> Option<AffixType> {
        match self {
            EffectAffix::Prefix => Some(AffixType::Prefix),
            EffectAffix::Suffix => Some(AffixType::Suffix),
            EffectAffix::Any => None,
        }
    }
}

/// One row of an essence's effect table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssenceEffect {
    /// Category, slot group or "any"
    pub item_type: String,
    pub modifier_type: EffectAffix,
    pub effect_text: String,
    pub value_min: f64,
    pub value_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_group: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssenceDef {
    pub name: String,
    pub mechanic: EssenceMechanic,
    #[serde(default)]
    pub strength: EssenceStrength,
    /// Grants a mark of the abyssal lord (one per item, none with desecrated mods)
    #[serde(default)]
    pub abyssal_mark: bool,
    #[serde(default)]
    pub effects: Vec<EssenceEffect>,
}

impl EssenceDef {
    /// First effect entry applicable to the item's category
    pub fn effect_for(&self, item: &Item) -> Option<&EssenceEffect> {
        self.effects
            .iter()
            .find(|e| weights::category_matches(&e.item_type, item))
    }

    /// Build the guaranteed modifier for an affix slot, values rolled
    pub fn guaranteed_modifier(
        &self,
        effect: &EssenceEffect,
        affix: AffixType,
        rng: &mut impl Rng,
    ) -> Modifier {
        let mut modifier = Modifier::new(
            &self.name,
            affix.mod_type(),
            &effect.effect_text,
            effect.value_min,
            effect.value_max,
        )
        .with_tier(self.strength.tier())
        .with_weight(0);
        modifier.mod_group = effect.mod_group.clone();
        modifier.tags = effect.tags.clone();
        modifier.tags.push(ESSENCE_TAG.to_string());
        if self.abyssal_mark {
            modifier.tags.push(ABYSSAL_MARK_TAG.to_string());
        }
        modifier.is_essence_only = true;
        modifier.instantiate(rng)
    }
}

fn has_mark(item: &Item) -> bool {
    item.explicit_mods().any(|m| m.has_tag(ABYSSAL_MARK_TAG))
}

/// Affix types the removal step may draw from
///
/// An omen-forced removal type wins. Otherwise a fixed effect type that is
/// full must be the one emptied; any other case removes from either type.
fn removal_affixes(effect: &EssenceEffect, item: &Item, ctx: &OmenContext) -> Vec<AffixType> {
    if let Some(forced) = ctx.remove_affix {
        return vec![forced];
    }
    match effect.modifier_type.fixed() {
        Some(target) if !item.has_room(target) => vec![target],
        _ => AffixType::all().to_vec(),
    }
}

fn removable(item: &Item, affixes: &[AffixType]) -> Vec<ModSlot> {
    item.slots_where(affixes, |m| m.is_removable() && !m.is_unrevealed)
}

/// Whether the guaranteed modifier still fits after removing from `removed`
fn fits_after_removal(effect: &EssenceEffect, item: &Item, removed: AffixType) -> Result<(), Rejection> {
    match effect.modifier_type.fixed() {
        Some(target) if target != removed && !item.has_room(target) => Err(Rejection::NoRoomFor(target)),
        _ => Ok(()),
    }
}

/// Legality of an essence on an item under the given omens
pub fn check(def: &EssenceDef, item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    match def.mechanic {
        EssenceMechanic::MagicToRare => item.ensure_rarity(Rarity::Magic)?,
        EssenceMechanic::RemoveAddRare => {
            item.ensure_rarity(Rarity::Rare)?;
            if item.explicit_count() == 0 {
                return Err(Rejection::NoModifiers);
            }
        }
    }

    let effect = def.effect_for(item).ok_or_else(|| Rejection::UnsupportedCategory {
        category: item.category.clone(),
    })?;

    if let Some(group) = &effect.mod_group {
        if item.has_mod_group(group) {
            return Err(Rejection::ModGroupPresent { group: group.clone() });
        }
    }

    if def.abyssal_mark {
        if item.has_desecrated() {
            return Err(Rejection::HasDesecrated);
        }
        if has_mark(item) {
            return Err(Rejection::MarkPresent {
                mark: def.name.clone(),
            });
        }
    }

    if def.mechanic == EssenceMechanic::RemoveAddRare {
        let affixes = removal_affixes(effect, item, ctx);
        let slots = removable(item, &affixes);
        if slots.is_empty() {
            return Err(Rejection::NoRemovableModifiers);
        }
        // Every candidate removal shares one affix type when it is forced
        if let [only] = affixes.as_slice() {
            fits_after_removal(effect, item, *only)?;
        }
    }

    Ok(())
}

/// Apply an essence: optional removal, then the guaranteed modifier
///
/// The guaranteed modifier's affix type depends only on the room left after
/// removal, never on which type an omen forced to be removed. It must not
/// conflict with what remains on the item under `exclusions`.
pub fn apply(
    def: &EssenceDef,
    item: &mut Item,
    exclusions: &ExclusionEngine,
    ctx: &OmenContext,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    let effect = def
        .effect_for(item)
        .ok_or_else(|| Rejection::UnsupportedCategory {
            category: item.category.clone(),
        })?
        .clone();

    let mut removed = Vec::new();
    match def.mechanic {
        EssenceMechanic::MagicToRare => {
            item.rarity = Rarity::Rare;
        }
        EssenceMechanic::RemoveAddRare => {
            let affixes = removal_affixes(&effect, item, ctx);
            let slots = removable(item, &affixes);
            let modifier = item
                .remove_random(&slots, rng)
                .ok_or(Rejection::NoRemovableModifiers)?;
            log::debug!("{} removed {}", def.name, modifier.name);
            removed.push(modifier.name);
        }
    }

    let affix = match effect.modifier_type.fixed() {
        Some(target) if item.has_room(target) => target,
        Some(target) => return Err(Rejection::NoRoomFor(target)),
        None => *item.open_affixes().choose(rng).ok_or(Rejection::NoRoom)?,
    };

    let modifier = def.guaranteed_modifier(&effect, affix, rng);
    if let Some(existing) = exclusions.item_conflicts(&modifier, item, affix).first() {
        return Err(Rejection::ModifierConflict {
            candidate: def.name.clone(),
            existing: existing.name.clone(),
        });
    }
    let added = modifier.display_text();
    item.attach(modifier);

    if removed.is_empty() {
        Ok(format!("{} upgraded the item to Rare with {}", def.name, added))
    } else {
        Ok(format!("{} replaced {} with {}", def.name, describe(&removed), added))
    }
}
