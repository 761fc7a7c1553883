//! Mechanics - One state transition per currency
//!
//! Currencies form a closed set (`Currency`), so every dispatch over them is an
//! exhaustive `match`. Omen behaviour reaches a mechanic through an
//! `OmenContext` derived once per `apply` call.

mod additive;
mod reforge;
mod special;
pub(crate) mod steps;

use crate::desecration::{self, BoneDef};
use crate::error::{CraftError, Rejection};
use crate::essence::{self, EssenceDef};
use crate::item::Item;
use crate::omen::OmenContext;
use crate::pool::ModifierPool;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// State transition applied to an item
///
/// `apply` either succeeds and mutates the item, or fails and leaves it
/// exactly as it was.
pub trait Mechanic {
    /// Display name
    fn name(&self) -> &str;

    /// Pure legality check
    fn can_apply(&self, item: &Item) -> Result<(), Rejection>;

    /// Check legality, then mutate the item in place
    fn apply<R: Rng>(
        &self,
        item: &mut Item,
        pool: &ModifierPool<'_>,
        rng: &mut R,
    ) -> Result<String, CraftError>;
}

/// Mechanic class named by currency configuration and omen compatibility tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanicClass {
    Transmutation,
    Augmentation,
    Alchemy,
    Regal,
    Exalted,
    Chaos,
    Divine,
    Annulment,
    Fracturing,
    Scouring,
    Vaal,
    Chance,
    Mirror,
    Essence,
    Desecration,
    /// Revealing a desecrated modifier (target of reroll omens)
    Reveal,
}

impl MechanicClass {
    pub fn label(self) -> &'static str {
        match self {
            MechanicClass::Transmutation => "transmutation",
            MechanicClass::Augmentation => "augmentation",
            MechanicClass::Alchemy => "alchemy",
            MechanicClass::Regal => "regal",
            MechanicClass::Exalted => "exalted",
            MechanicClass::Chaos => "chaos",
            MechanicClass::Divine => "divine",
            MechanicClass::Annulment => "annulment",
            MechanicClass::Fracturing => "fracturing",
            MechanicClass::Scouring => "scouring",
            MechanicClass::Vaal => "vaal",
            MechanicClass::Chance => "chance",
            MechanicClass::Mirror => "mirror",
            MechanicClass::Essence => "essence",
            MechanicClass::Desecration => "desecration",
            MechanicClass::Reveal => "reveal",
        }
    }
}

/// Options for the standard orbs (Greater/Perfect tiers raise the floor)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbOptions {
    #[serde(default)]
    pub min_mod_level: Option<u32>,
}

/// Outcome weights for a Vaal Orb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaalOptions {
    #[serde(default = "default_outcome_weight")]
    pub no_change_weight: u32,
    #[serde(default = "default_outcome_weight")]
    pub reroll_values_weight: u32,
    #[serde(default = "default_outcome_weight")]
    pub corrupted_implicit_weight: u32,
}

impl Default for VaalOptions {
    fn default() -> Self {
        VaalOptions {
            no_change_weight: 1,
            reroll_values_weight: 1,
            corrupted_implicit_weight: 1,
        }
    }
}

fn default_outcome_weight() -> u32 {
    1
}

/// Outcome weights for an Orb of Chance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChanceOptions {
    #[serde(default = "default_magic_weight")]
    pub magic_weight: u32,
    #[serde(default = "default_rare_weight")]
    pub rare_weight: u32,
    #[serde(default = "default_unique_weight")]
    pub unique_weight: u32,
}

impl Default for ChanceOptions {
    fn default() -> Self {
        ChanceOptions {
            magic_weight: default_magic_weight(),
            rare_weight: default_rare_weight(),
            unique_weight: default_unique_weight(),
        }
    }
}

fn default_magic_weight() -> u32 {
    70
}
fn default_rare_weight() -> u32 {
    25
}
fn default_unique_weight() -> u32 {
    5
}

/// Concrete currency behaviour
#[derive(Debug, Clone, PartialEq)]
pub enum Currency {
    Transmutation(OrbOptions),
    Augmentation(OrbOptions),
    Alchemy(OrbOptions),
    Regal(OrbOptions),
    Exalted(OrbOptions),
    Chaos(OrbOptions),
    Divine,
    Annulment,
    Fracturing,
    Scouring,
    Vaal(VaalOptions),
    Chance(ChanceOptions),
    Mirror,
    Essence(EssenceDef),
    Desecration(BoneDef),
}

impl Currency {
    pub fn class(&self) -> MechanicClass {
        match self {
            Currency::Transmutation(_) => MechanicClass::Transmutation,
            Currency::Augmentation(_) => MechanicClass::Augmentation,
            Currency::Alchemy(_) => MechanicClass::Alchemy,
            Currency::Regal(_) => MechanicClass::Regal,
            Currency::Exalted(_) => MechanicClass::Exalted,
            Currency::Chaos(_) => MechanicClass::Chaos,
            Currency::Divine => MechanicClass::Divine,
            Currency::Annulment => MechanicClass::Annulment,
            Currency::Fracturing => MechanicClass::Fracturing,
            Currency::Scouring => MechanicClass::Scouring,
            Currency::Vaal(_) => MechanicClass::Vaal,
            Currency::Chance(_) => MechanicClass::Chance,
            Currency::Mirror => MechanicClass::Mirror,
            Currency::Essence(_) => MechanicClass::Essence,
            Currency::Desecration(_) => MechanicClass::Desecration,
        }
    }

    /// Legality under the given omen context
    pub fn check(&self, item: &Item, ctx: &OmenContext) -> Result<(), Rejection> {
        item.ensure_modifiable()?;
        match self {
            Currency::Transmutation(_) => additive::check_transmutation(item, ctx),
            Currency::Augmentation(_) => additive::check_augmentation(item, ctx),
            Currency::Alchemy(_) => additive::check_alchemy(item),
            Currency::Regal(_) => additive::check_regal(item, ctx),
            Currency::Exalted(_) => additive::check_exalted(item, ctx),
            Currency::Chaos(_) => reforge::check_chaos(item, ctx),
            Currency::Divine => reforge::check_divine(item),
            Currency::Annulment => reforge::check_annulment(item, ctx),
            Currency::Fracturing => special::check_fracturing(item),
            Currency::Scouring => reforge::check_scouring(item),
            Currency::Vaal(_) => Ok(()),
            Currency::Chance(_) => special::check_chance(item),
            Currency::Mirror => Ok(()),
            Currency::Essence(def) => essence::check(def, item, ctx),
            Currency::Desecration(bone) => desecration::check(bone, item, ctx),
        }
    }

    /// Mutate the item; callers run `check` first and roll back on error
    pub(crate) fn execute<R: Rng>(
        &self,
        item: &mut Item,
        pool: &ModifierPool<'_>,
        ctx: &OmenContext,
        rng: &mut R,
    ) -> Result<String, CraftError> {
        let message = match self {
            Currency::Transmutation(opts) => additive::transmute(item, pool, opts, ctx, rng)?,
            Currency::Augmentation(opts) => additive::augment(item, pool, opts, ctx, rng)?,
            Currency::Alchemy(opts) => additive::alchemise(item, pool, opts, ctx, rng)?,
            Currency::Regal(opts) => additive::regal(item, pool, opts, ctx, rng)?,
            Currency::Exalted(opts) => additive::exalt(item, pool, opts, ctx, rng)?,
            Currency::Chaos(opts) => reforge::chaos(item, pool, opts, ctx, rng)?,
            Currency::Divine => reforge::divine(item, rng),
            Currency::Annulment => reforge::annul(item, ctx, rng)?,
            Currency::Fracturing => special::fracture(item, rng)?,
            Currency::Scouring => reforge::scour(item),
            Currency::Vaal(opts) => special::vaal(item, pool, opts, rng),
            Currency::Chance(opts) => special::chance(item, pool, opts, rng)?,
            Currency::Mirror => special::mirror(item),
            Currency::Essence(def) => essence::apply(def, item, pool.exclusions(), ctx, rng)?,
            Currency::Desecration(bone) => desecration::apply(bone, item, ctx, rng)?,
        };
        Ok(message)
    }
}

/// Run `check` then `execute` on a working copy, committing only on success
pub(crate) fn apply_atomically<R: Rng>(
    currency: &Currency,
    item: &mut Item,
    pool: &ModifierPool<'_>,
    ctx: &OmenContext,
    rng: &mut R,
) -> Result<String, CraftError> {
    currency.check(item, ctx)?;

    let mut working = item.clone();
    let message = currency.execute(&mut working, pool, ctx, rng)?;
    if !working.within_caps() {
        log::error!("{} left the item over its affix limits", currency.class().label());
        return Err(Rejection::CapsExceeded(working.rarity).into());
    }

    *item = working;
    Ok(message)
}

impl Mechanic for Currency {
    fn name(&self) -> &str {
        self.class().label()
    }

    fn can_apply(&self, item: &Item) -> Result<(), Rejection> {
        self.check(item, &OmenContext::default())
    }

    fn apply<R: Rng>(
        &self,
        item: &mut Item,
        pool: &ModifierPool<'_>,
        rng: &mut R,
    ) -> Result<String, CraftError> {
        let ctx = OmenContext::default().with_item(item);
        apply_atomically(self, item, pool, &ctx, rng)
    }
}
