//! Orbs that add modifiers: Transmutation, Augmentation, Alchemy, Regal, Exalted

use super::steps::{add_one, add_to_open, describe, roll_filter};
use super::OrbOptions;
use crate::error::Rejection;
use crate::item::Item;
use crate::omen::OmenContext;
use crate::pool::ModifierPool;
use crate::types::{AffixType, Rarity};
use rand::seq::SliceRandom;
use rand::Rng;

/// Forced affix must have room on the item as it will be after the upgrade
fn ensure_forced_room(item: &Item, ctx: &OmenContext, rarity: Rarity) -> Result<(), Rejection> {
    if let Some(affix) = ctx.add_affix {
        if item.mods(affix).len() >= rarity.max_affixes(affix) {
            return Err(Rejection::NoRoomFor(affix));
        }
    }
    Ok(())
}

fn ensure_tags_to_share(item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    if ctx.homogenise && item.visible_tags().is_empty() {
        return Err(Rejection::NoModifiers);
    }
    Ok(())
}

// === Transmutation ===

pub(super) fn check_transmutation(item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Normal)?;
    ensure_forced_room(item, ctx, Rarity::Magic)
}

/// Normal to Magic with one or two modifiers
pub(super) fn transmute(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    opts: &OrbOptions,
    ctx: &OmenContext,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    item.rarity = Rarity::Magic;
    let filter = roll_filter(opts, ctx);

    let first = match ctx.add_affix {
        Some(affix) => add_one(item, pool, affix, &filter, rng)?,
        None => add_to_open(item, pool, None, &filter, rng)?,
    };
    let mut added = vec![first];

    // A second modifier of the other type half the time
    if ctx.add_affix.is_none() && rng.gen_bool(0.5) {
        if let Some(affix) = item.open_affixes().first().copied() {
            if let Ok(name) = add_one(item, pool, affix, &filter, rng) {
                added.push(name);
            }
        }
    }

    Ok(format!("Transmuted into a Magic item with {}", describe(&added)))
}

// === Augmentation ===

pub(super) fn check_augmentation(item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Magic)?;
    if item.open_slots() == 0 {
        return Err(Rejection::NoRoom);
    }
    ensure_forced_room(item, ctx, Rarity::Magic)
}

/// Fill the missing affix type on a Magic item
pub(super) fn augment(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    opts: &OrbOptions,
    ctx: &OmenContext,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    let filter = roll_filter(opts, ctx);
    let name = add_to_open(item, pool, ctx.add_affix, &filter, rng)?;
    Ok(format!("Augmented with {}", name))
}

// === Alchemy ===

pub(super) fn check_alchemy(item: &Item) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Normal)
}

/// Target prefix/suffix split for a four-modifier alchemy roll
fn alchemy_split(ctx: &OmenContext, rng: &mut impl Rng) -> (usize, usize) {
    match ctx.max_affix {
        Some(AffixType::Prefix) => (3, 1),
        Some(AffixType::Suffix) => (1, 3),
        None => {
            let prefixes = rng.gen_range(2..=3);
            (prefixes, 4 - prefixes)
        }
    }
}

/// Normal to Rare with four modifiers
///
/// If one affix type runs out of candidates, the remaining additions go to
/// the other type while it has room. Fewer than four in total is a rejection.
pub(super) fn alchemise(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    opts: &OrbOptions,
    ctx: &OmenContext,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    item.rarity = Rarity::Rare;
    let filter = roll_filter(opts, ctx);
    let (prefixes, suffixes) = alchemy_split(ctx, rng);

    let required = prefixes + suffixes;
    let mut plan: Vec<AffixType> = std::iter::repeat(AffixType::Prefix)
        .take(prefixes)
        .chain(std::iter::repeat(AffixType::Suffix).take(suffixes))
        .collect();
    plan.shuffle(rng);

    let mut added = Vec::new();
    let mut shortfall = 0;
    for affix in plan {
        match add_one(item, pool, affix, &filter, rng) {
            Ok(name) => added.push(name),
            Err(_) => shortfall += 1,
        }
    }
    for _ in 0..shortfall {
        match add_to_open(item, pool, None, &filter, rng) {
            Ok(name) => added.push(name),
            Err(_) => break,
        }
    }

    if added.len() < required {
        return Err(Rejection::IncompleteRoll {
            required,
            rolled: added.len(),
        });
    }
    Ok(format!("Alchemised into a Rare item with {}", describe(&added)))
}

// === Regal ===

pub(super) fn check_regal(item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Magic)?;
    ensure_forced_room(item, ctx, Rarity::Rare)?;
    ensure_tags_to_share(item, ctx)
}

/// Magic to Rare with one added modifier
///
/// The affix type follows the room left: whichever type is open, or a coin
/// flip when both are.
pub(super) fn regal(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    opts: &OrbOptions,
    ctx: &OmenContext,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    item.rarity = Rarity::Rare;
    let filter = roll_filter(opts, ctx);
    let name = add_to_open(item, pool, ctx.add_affix, &filter, rng)?;
    Ok(format!("Upgraded to Rare with {}", name))
}

// === Exalted ===

pub(super) fn check_exalted(item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Rare)?;
    let needed = ctx.additions();
    match ctx.add_affix {
        Some(affix) => {
            let free = item.max_affixes(affix).saturating_sub(item.mods(affix).len());
            if free < needed {
                return Err(Rejection::NoRoomFor(affix));
            }
        }
        None => {
            if item.open_slots() < needed {
                return Err(Rejection::NoRoom);
            }
        }
    }
    ensure_tags_to_share(item, ctx)
}

/// Add one modifier (or more with extra-addition omens) to a Rare item
///
/// Every addition draws against the tags the item had before the first one.
pub(super) fn exalt(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    opts: &OrbOptions,
    ctx: &OmenContext,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    let filter = roll_filter(opts, ctx);
    let mut added = Vec::with_capacity(ctx.additions());
    for _ in 0..ctx.additions() {
        added.push(add_to_open(item, pool, ctx.add_affix, &filter, rng)?);
    }
    Ok(format!("Exalted with {}", describe(&added)))
}
