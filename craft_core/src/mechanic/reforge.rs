//! Orbs that remove, replace or reroll: Chaos, Annulment, Scouring, Divine

use super::steps::{add_one, describe, removal_slots, remove_one, roll_filter};
use super::OrbOptions;
use crate::error::Rejection;
use crate::item::Item;
use crate::omen::OmenContext;
use crate::pool::ModifierPool;
use crate::types::{AffixType, Rarity};
use rand::Rng;

fn ensure_removable(item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    if item.explicit_count() == 0 {
        return Err(Rejection::NoModifiers);
    }
    if removal_slots(item, ctx).is_empty() {
        return Err(Rejection::NoRemovableModifiers);
    }
    Ok(())
}

// === Chaos ===

pub(super) fn check_chaos(item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Rare)?;
    ensure_removable(item, ctx)
}

/// Replace one removable modifier with a fresh one of the same affix type
pub(super) fn chaos(
    item: &mut Item,
    pool: &ModifierPool<'_>,
    opts: &OrbOptions,
    ctx: &OmenContext,
    rng: &mut impl Rng,
) -> Result<String, Rejection> {
    let slots = removal_slots(item, ctx);
    let removed = remove_one(item, &slots, ctx.remove_lowest_level, rng)?;
    let affix = removed.affix_type().unwrap_or(AffixType::Prefix);

    let filter = roll_filter(opts, ctx);
    let added = add_one(item, pool, affix, &filter, rng)?;
    Ok(format!("Replaced {} with {}", removed.name, added))
}

// === Annulment ===

pub(super) fn check_annulment(item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
    item.ensure_rarity(Rarity::Rare)?;
    ensure_removable(item, ctx)
}

/// Remove one removable modifier (more with extra-removal omens)
///
/// An item left without explicit modifiers drops to Magic.
pub(super) fn annul(item: &mut Item, ctx: &OmenContext, rng: &mut impl Rng) -> Result<String, Rejection> {
    let mut removed = Vec::new();
    for i in 0..ctx.removals() {
        let slots = removal_slots(item, ctx);
        if slots.is_empty() && i > 0 {
            break;
        }
        removed.push(remove_one(item, &slots, ctx.remove_lowest_level, rng)?.name);
    }

    if item.explicit_count() == 0 {
        item.rarity = Rarity::Magic;
    }
    Ok(format!("Removed {}", describe(&removed)))
}

// === Scouring ===

pub(super) fn check_scouring(item: &Item) -> Result<(), Rejection> {
    ensure_removable(item, &OmenContext::default())
}

/// Strip every removable modifier from an item of any rarity; rarity falls to
/// the lowest that fits what is left (fractured modifiers stay)
pub(super) fn scour(item: &mut Item) -> String {
    let removed = item.strip_removable();
    item.rarity = Rarity::smallest_fitting(item.prefix_mods.len(), item.suffix_mods.len());
    format!("Scoured {} modifiers, item is now {}", removed, item.rarity)
}

// === Divine ===

fn has_rollable(item: &Item) -> bool {
    item.explicit_mods()
        .chain(item.implicit_mods.iter())
        .any(|m| !m.ranges().is_empty())
}

pub(super) fn check_divine(item: &Item) -> Result<(), Rejection> {
    if !has_rollable(item) {
        return Err(Rejection::NoModifiers);
    }
    Ok(())
}

/// Reroll the values of every modifier, fractured ones included
pub(super) fn divine(item: &mut Item, rng: &mut impl Rng) -> String {
    reroll_all(item, rng);
    "Rerolled modifier values".to_string()
}

pub(super) fn reroll_all(item: &mut Item, rng: &mut impl Rng) -> usize {
    let mut count = 0;
    for modifier in item
        .prefix_mods
        .iter_mut()
        .chain(item.suffix_mods.iter_mut())
        .chain(item.implicit_mods.iter_mut())
    {
        if !modifier.ranges().is_empty() {
            modifier.roll_values(rng);
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ExclusionEngine;
    use crate::modifier::{Modifier, ModifierCatalog};
    use crate::types::ModType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn catalog() -> ModifierCatalog {
        ModifierCatalog::new(vec![
            Modifier::new("Hale", ModType::Prefix, "+# to maximum Life", 10.0, 19.0).with_group("Life"),
            Modifier::new("Lacquered", ModType::Prefix, "+# to Armour", 10.0, 19.0).with_group("Armour"),
            Modifier::new("of the Ice", ModType::Suffix, "+#% to Cold Resistance", 6.0, 10.0)
                .with_group("ColdResistance"),
            Modifier::new("of the Furnace", ModType::Suffix, "+#% to Fire Resistance", 6.0, 10.0)
                .with_group("FireResistance"),
        ])
        .unwrap()
    }

    fn rare_with(catalog: &ModifierCatalog, rng: &mut ChaCha8Rng, fracture_prefix: bool) -> Item {
        let mut hale = catalog.get("Hale", ModType::Prefix).unwrap().instantiate(rng);
        hale.is_fractured = fracture_prefix;
        Item::new("Helmet", "helmet", 80)
            .with_rarity(Rarity::Rare)
            .with_prefix(hale)
            .with_suffix(catalog.get("of the Ice", ModType::Suffix).unwrap().instantiate(rng))
    }

    #[test]
    fn test_chaos_keeps_affix_type_and_count() {
        let catalog = catalog();
        let engine = ExclusionEngine::empty();
        let pool = ModifierPool::new(&catalog, &engine);
        let mut rng = ChaCha8Rng::seed_from_u64(31);

        for _ in 0..20 {
            let mut item = rare_with(&catalog, &mut rng, true);
            chaos(&mut item, &pool, &OrbOptions::default(), &OmenContext::default(), &mut rng).unwrap();
            assert_eq!(item.prefix_mods.len(), 1);
            assert_eq!(item.suffix_mods.len(), 1);
            assert!(item.prefix_mods[0].is_fractured);
        }
    }

    #[test]
    fn test_annul_to_magic_when_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(32);
        let catalog = catalog();
        let mut item = Item::new("Helmet", "helmet", 80)
            .with_rarity(Rarity::Rare)
            .with_prefix(catalog.get("Hale", ModType::Prefix).unwrap().instantiate(&mut rng));
        annul(&mut item, &OmenContext::default(), &mut rng).unwrap();
        assert_eq!(item.explicit_count(), 0);
        assert_eq!(item.rarity, Rarity::Magic);
    }

    #[test]
    fn test_annul_never_touches_fractured() {
        let catalog = catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(33);
        let mut item = rare_with(&catalog, &mut rng, true);
        annul(&mut item, &OmenContext::default(), &mut rng).unwrap();
        assert_eq!(item.prefix_mods.len(), 1);
        assert!(item.suffix_mods.is_empty());
        assert_eq!(check_annulment(&item, &OmenContext::default()), Err(Rejection::NoRemovableModifiers));
    }

    #[test]
    fn test_scour_keeps_fractured() {
        let catalog = catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(34);
        let mut item = rare_with(&catalog, &mut rng, true);
        check_scouring(&item).unwrap();
        scour(&mut item);
        assert_eq!(item.prefix_mods.len(), 1);
        assert_eq!(item.rarity, Rarity::Magic);

        let mut plain = rare_with(&catalog, &mut rng, false);
        scour(&mut plain);
        assert_eq!(plain.rarity, Rarity::Normal);
        assert_eq!(check_scouring(&plain), Err(Rejection::NoModifiers));
    }

    #[test]
    fn test_scour_unique() {
        let catalog = catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(36);
        let mut item = rare_with(&catalog, &mut rng, false).with_rarity(Rarity::Unique);
        check_scouring(&item).unwrap();
        scour(&mut item);
        assert_eq!(item.explicit_count(), 0);
        assert_eq!(item.rarity, Rarity::Normal);
    }

    #[test]
    fn test_divine_rerolls_within_ranges() {
        let catalog = catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(35);
        let mut item = rare_with(&catalog, &mut rng, true);
        for _ in 0..20 {
            divine(&mut item, &mut rng);
            for m in item.explicit_mods() {
                let range = m.ranges()[0];
                assert!(range.contains(m.current_values[0]));
            }
        }
        assert!(item.prefix_mods[0].is_fractured);
        assert_eq!(check_divine(&Item::new("Helmet", "helmet", 1)), Err(Rejection::NoModifiers));
    }
}
