//! Revealing an unrevealed desecrated modifier
//!
//! A reveal offers up to three distinct desecrated candidates scoped by the
//! stored `UnrevealedMod` record. Reroll omens are consumed here, at reveal
//! time, never when the bone was applied.

use crate::error::Rejection;
use crate::item::Item;
use crate::mechanic::MechanicClass;
use crate::modifier::Modifier;
use crate::omen::{check_compatibility, OmenContext, OmenDef};
use crate::pool::{ModifierPool, SelectionFilter};
use crate::types::AffixType;
use rand::Rng;

/// Candidates offered per reveal
pub const REVEAL_CANDIDATES: usize = 3;

fn reveal_filter(
    item: &Item,
    id: u32,
    excluded: &[String],
) -> Result<(SelectionFilter, AffixType), Rejection> {
    let record = item.unrevealed(id).ok_or(Rejection::UnknownUnrevealed(id))?;
    let mut filter = SelectionFilter::desecrated()
        .with_min_mod_level(record.min_modifier_level)
        .with_required_tag(record.required_boss_tag.clone());
    filter.excluded_names = excluded.to_vec();
    Ok((filter, record.affix))
}

/// Up to three distinct desecrated candidates for an unrevealed modifier
pub fn reveal_candidates(
    item: &Item,
    id: u32,
    pool: &ModifierPool<'_>,
    rng: &mut impl Rng,
) -> Result<Vec<Modifier>, Rejection> {
    let (filter, affix) = reveal_filter(item, id, &[])?;
    let candidates = pool.select_distinct(item, affix, &filter, REVEAL_CANDIDATES, rng);
    if candidates.is_empty() {
        return Err(Rejection::NoRevealCandidates);
    }
    Ok(candidates)
}

/// Replace the placeholder with a concrete desecrated modifier
///
/// Nothing changes unless the modifier fits the placeholder's affix type and
/// conflicts with nothing already on the item.
pub fn apply_revealed(
    item: &mut Item,
    id: u32,
    mut modifier: Modifier,
    pool: &ModifierPool<'_>,
) -> Result<String, Rejection> {
    item.ensure_modifiable()?;
    let record = item.unrevealed(id).ok_or(Rejection::UnknownUnrevealed(id))?;
    let affix = record.affix;
    let slot = item.placeholder_slot(id).ok_or(Rejection::UnknownUnrevealed(id))?;

    if modifier.affix_type() != Some(affix) {
        return Err(Rejection::NoRoomFor(affix));
    }
    if let Some(existing) = pool.exclusions().item_conflicts(&modifier, item, affix).first() {
        return Err(Rejection::ModifierConflict {
            candidate: modifier.name.clone(),
            existing: existing.name.clone(),
        });
    }

    modifier.is_desecrated = true;
    modifier.is_unrevealed = false;
    modifier.unrevealed_id = None;
    if !modifier.has_tag("desecrated") {
        modifier.tags.push("desecrated".to_string());
    }

    let message = format!("Revealed {}", modifier.display_text());
    item.mods_mut(affix)[slot.index] = modifier;
    item.unrevealed_mods.retain(|u| u.id != id);
    Ok(message)
}

/// One reveal in progress: the offered candidates and any rerolls left
#[derive(Debug, Clone, PartialEq)]
pub struct RevealSession {
    unrevealed_id: u32,
    candidates: Vec<Modifier>,
    rerolls_remaining: u32,
}

impl RevealSession {
    /// Draw the first candidate set, consuming reveal omens
    pub fn open(
        item: &Item,
        id: u32,
        pool: &ModifierPool<'_>,
        omens: &[OmenDef],
        rng: &mut impl Rng,
    ) -> Result<Self, Rejection> {
        item.ensure_modifiable()?;
        check_compatibility(omens, MechanicClass::Reveal, "reveal")?;
        let ctx = OmenContext::from_omens(omens)?;
        let candidates = reveal_candidates(item, id, pool, rng)?;
        Ok(RevealSession {
            unrevealed_id: id,
            candidates,
            rerolls_remaining: ctx.rerolls,
        })
    }

    pub fn unrevealed_id(&self) -> u32 {
        self.unrevealed_id
    }

    pub fn candidates(&self) -> &[Modifier] {
        &self.candidates
    }

    pub fn rerolls_remaining(&self) -> u32 {
        self.rerolls_remaining
    }

    /// Replace the offered set, preferring modifiers not offered before
    pub fn reroll(
        &mut self,
        item: &Item,
        pool: &ModifierPool<'_>,
        rng: &mut impl Rng,
    ) -> Result<(), Rejection> {
        if self.rerolls_remaining == 0 {
            return Err(Rejection::RerollUnavailable);
        }

        let offered: Vec<String> = self.candidates.iter().map(|m| m.name.clone()).collect();
        let (filter, affix) = reveal_filter(item, self.unrevealed_id, &offered)?;
        let mut fresh = pool.select_distinct(item, affix, &filter, REVEAL_CANDIDATES, rng);
        if fresh.is_empty() {
            fresh = reveal_candidates(item, self.unrevealed_id, pool, rng)?;
        }

        self.rerolls_remaining -= 1;
        self.candidates = fresh;
        Ok(())
    }

    /// Commit one of the offered candidates
    pub fn choose(self, item: &mut Item, index: usize, pool: &ModifierPool<'_>) -> Result<String, Rejection> {
        let modifier = self
            .candidates
            .into_iter()
            .nth(index)
            .ok_or(Rejection::InvalidChoice(index))?;
        apply_revealed(item, self.unrevealed_id, modifier, pool)
    }
}
