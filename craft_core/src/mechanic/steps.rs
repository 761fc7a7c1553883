//! Building blocks shared by the currency mechanics

use super::OrbOptions;
use crate::error::Rejection;
use crate::item::{Item, ModSlot};
use crate::modifier::Modifier;
use crate::omen::OmenContext;
use crate::pool::{ModifierPool, SelectionFilter};
use crate::types::AffixType;
use rand::seq::SliceRandom;
use rand::Rng;

/// Selection filter for one roll: orb tier floor plus the homogenising tag set
pub(crate) fn roll_filter(opts: &OrbOptions, ctx: &OmenContext) -> SelectionFilter {
    let filter = SelectionFilter::new().with_min_mod_level(opts.min_mod_level);
    if ctx.homogenise {
        filter.with_shared_tags(ctx.existing_tags.clone())
    } else {
        filter
    }
}

/// Add one rolled modifier of a fixed affix type
pub(crate) fn add_one(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    affix: AffixType,
    filter: &SelectionFilter,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    if !item.has_room(affix) {
        return Err(Rejection::NoRoomFor(affix));
    }
    let modifier = pool
        .select(item, affix, filter, rng)
        .ok_or(Rejection::NoEligibleModifiers(affix))?;
    Ok(attach(item, modifier))
}

/// Add one modifier into any open affix type
///
/// A forced affix restricts the choice to that type. Otherwise open types are
/// tried in random order; with a shared-tag constraint they are pooled into a
/// single weighted draw.
pub(crate) fn add_to_open(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    forced: Option<AffixType>,
    filter: &SelectionFilter,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    if let Some(affix) = forced {
        return add_one(item, pool, affix, filter, rng);
    }

    let mut open = item.open_affixes();
    if open.is_empty() {
        return Err(Rejection::NoRoom);
    }

    if filter.shared_tags.is_some() {
        let modifier = pool
            .select_any(item, &open, filter, rng)
            .ok_or(Rejection::NoEligibleAny)?;
        return Ok(attach(item, modifier));
    }

    open.shuffle(rng);
    for affix in &open {
        if let Some(modifier) = pool.select(item, *affix, filter, rng) {
            return Ok(attach(item, modifier));
        }
    }
    Err(match open.as_slice() {
        [only] => Rejection::NoEligibleModifiers(*only),
        _ => Rejection::NoEligibleAny,
    })
}

fn attach(item: &mut Item, modifier: Modifier) -> String {
    let name = modifier.name.clone();
    item.attach(modifier);
    name
}

/// Slots a removal may target under the active omens
pub(crate) fn removal_slots(item: &Item, ctx: &OmenContext) -> Vec<ModSlot> {
    item.slots_where(&ctx.removal_affixes(), |m| {
        m.is_removable() && (!ctx.desecrated_only_removal || m.is_desecrated)
    })
}

/// Remove one modifier among `slots`
///
/// With `lowest_level` the pick is restricted to the lowest required item
/// level (ties broken at random).
pub(crate) fn remove_one(
    item: &mut Item,
    slots: &[ModSlot],
    lowest_level: bool,
    rng: &mut impl Rng,
) -> Result<Modifier, Rejection> {
    let candidates: Vec<ModSlot> = if lowest_level {
        let level = |slot: &ModSlot| {
            item.modifier_at(*slot)
                .map(|m| m.required_item_level)
                .unwrap_or(u32::MAX)
        };
        match slots.iter().map(level).min() {
            Some(lowest) => slots.iter().copied().filter(|s| level(s) == lowest).collect(),
            None => Vec::new(),
        }
    } else {
        slots.to_vec()
    };

    item.remove_random(&candidates, rng)
        .ok_or(Rejection::NoRemovableModifiers)
}

/// Human-readable list of modifier names
pub(crate) fn describe(names: &[String]) -> String {
    if names.is_empty() {
        "nothing".to_string()
    } else {
        names.join(", ")
    }
}
