//! Fracturing, Vaal, Chance and Mirror

use super::reforge::reroll_all;
use super::steps::{add_to_open, describe};
use super::{ChanceOptions, OrbOptions, VaalOptions};
use crate::error::Rejection;
use crate::item::{Item, ModSlot};
use crate::omen::OmenContext;
use crate::pool::{weighted_choice, ModifierPool, SelectionFilter};
use crate::types::{AffixType, ModType, Rarity};
use rand::seq::SliceRandom;
use rand::Rng;

/// Modifiers required on an item before it can be fractured
pub const FRACTURE_MIN_MODIFIERS: usize = 4;

/// Most unique-only modifiers rolled by a successful Chance
const UNIQUE_MAX_MODIFIERS: usize = 4;

// === Fracturing ===

fn fracturable_slots(item: &Item) -> Vec<ModSlot> {
    item.slots_where(&AffixType::all(), |m| !m.is_unrevealed && !m.is_fractured)
}

pub(super) fn check_fracturing(item: &Item) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Rare)?;
    if item.has_fractured() {
        return Err(Rejection::AlreadyFractured);
    }
    let count = item.explicit_count();
    if count < FRACTURE_MIN_MODIFIERS {
        return Err(Rejection::NotEnoughModifiers {
            required: FRACTURE_MIN_MODIFIERS,
            actual: count,
        });
    }
    if fracturable_slots(item).is_empty() {
        return Err(Rejection::NoFracturableModifiers);
    }
    Ok(())
}

/// Lock one random revealed modifier permanently
pub(super) fn fracture(item: &mut Item, rng: &mut impl Rng) -> Result<String, Rejection> {
    let slot = *fracturable_slots(item)
        .choose(rng)
        .ok_or(Rejection::NoFracturableModifiers)?;
    let modifier = item
        .mods_mut(slot.affix)
        .get_mut(slot.index)
        .ok_or(Rejection::NoFracturableModifiers)?;
    modifier.is_fractured = true;
    Ok(format!("Fractured {}", modifier.name))
}

// === Vaal ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VaalOutcome {
    NoChange,
    RerollValues,
    CorruptedImplicit,
}

/// Corrupt the item with one weighted outcome
///
/// A corrupted-implicit outcome with nothing to roll degrades to no change.
pub(super) fn vaal(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    opts: &VaalOptions,
    rng: &mut impl Rng,
) -> String {
    item.corrupted = true;

    let outcomes = [
        (VaalOutcome::NoChange, opts.no_change_weight),
        (VaalOutcome::RerollValues, opts.reroll_values_weight),
        (VaalOutcome::CorruptedImplicit, opts.corrupted_implicit_weight),
    ];
    let outcome = weighted_choice(&outcomes, |o| o.1, rng)
        .map(|o| o.0)
        .unwrap_or(VaalOutcome::NoChange);

    match outcome {
        VaalOutcome::NoChange => "Corrupted with no other effect".to_string(),
        VaalOutcome::RerollValues => {
            let count = reroll_all(item, rng);
            format!("Corrupted and rerolled {} modifier values", count)
        }
        VaalOutcome::CorruptedImplicit => {
            let filter = SelectionFilter::new().with_required_tag(Some("corrupted".to_string()));
            match pool.select_of_type(item, ModType::Implicit, &filter, rng) {
                Some(implicit) => {
                    let name = implicit.name.clone();
                    item.implicit_mods = vec![implicit];
                    format!("Corrupted with implicit {}", name)
                }
                None => "Corrupted with no other effect".to_string(),
            }
        }
    }
}

// === Chance ===

pub(super) fn check_chance(item: &Item) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Normal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChanceOutcome {
    Magic,
    Rare,
    Unique,
}

/// Upgrade a Normal item to a weighted random rarity
///
/// The Unique outcome only competes when unique-only modifiers exist for
/// the item.
pub(super) fn chance(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    opts: &ChanceOptions,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    let exclusive = SelectionFilter::exclusive();
    let unique_possible = AffixType::all()
        .iter()
        .any(|a| !pool.eligible(item, a.mod_type(), &exclusive).is_empty());

    let outcomes = [
        (ChanceOutcome::Magic, opts.magic_weight),
        (ChanceOutcome::Rare, opts.rare_weight),
        (
            ChanceOutcome::Unique,
            if unique_possible { opts.unique_weight } else { 0 },
        ),
    ];
    let outcome = weighted_choice(&outcomes, |o| o.1, rng)
        .map(|o| o.0)
        .unwrap_or(ChanceOutcome::Magic);

    match outcome {
        ChanceOutcome::Magic => {
            super::additive::transmute(item, pool, &OrbOptions::default(), &OmenContext::default(), rng)
        }
        ChanceOutcome::Rare => {
            super::additive::alchemise(item, pool, &OrbOptions::default(), &OmenContext::default(), rng)
        }
        ChanceOutcome::Unique => {
            item.rarity = Rarity::Unique;
            let mut added = Vec::new();
            while added.len() < UNIQUE_MAX_MODIFIERS {
                match add_to_open(item, pool, None, &exclusive, rng) {
                    Ok(name) => added.push(name),
                    Err(_) => break,
                }
            }
            if added.is_empty() {
                return Err(Rejection::NoEligibleAny);
            }
            Ok(format!("Chanced into a Unique item with {}", describe(&added)))
        }
    }
}

// === Mirror ===

/// Lock the item as a mirrored copy
pub(super) fn mirror(item: &mut Item) -> String {
    item.mirrored = true;
    format!("Mirrored {}", item.base_type)
}
