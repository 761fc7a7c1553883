//! Simulator - Check-then-apply entry point for boundary code
//!
//! The simulator resolves names through the current catalog snapshot, runs the
//! composed mechanic and flattens the outcome into a `CraftOutcome`. Domain
//! rejections become unsuccessful outcomes; configuration problems are
//! returned as `Err` so they can be reported as content bugs.

use crate::catalog::{Catalog, SharedCatalog};
use crate::config::ConfigError;
use crate::desecration::RevealSession;
use crate::error::{CraftError, Rejection};
use crate::factory::MechanicFactory;
use crate::item::Item;
use crate::mechanic::Mechanic;
use crate::modifier::Modifier;
use crate::pool::ModifierPool;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Structured result of one crafting action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftOutcome {
    pub success: bool,
    /// What happened on success, why not on failure
    pub message: String,
}

impl CraftOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        CraftOutcome {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        CraftOutcome {
            success: false,
            message: message.into(),
        }
    }

    fn rejected(subject: &str, rejection: &Rejection) -> Self {
        log::warn!("{} rejected: {}", subject, rejection);
        CraftOutcome::failure(rejection.to_string())
    }
}

/// What a reveal chooser wants to do with the offered candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealDecision {
    Choose(usize),
    Reroll,
}

fn config_error(subject: &str, err: ConfigError) -> ConfigError {
    log::error!("{}: {}", subject, err);
    err
}

/// Split a mechanic result into an outcome or a configuration error
fn settle(subject: &str, result: Result<String, CraftError>) -> Result<CraftOutcome, ConfigError> {
    match result {
        Ok(message) => {
            log::debug!("{}: {}", subject, message);
            Ok(CraftOutcome::success(message))
        }
        Err(CraftError::Rejected(rejection)) => Ok(CraftOutcome::rejected(subject, &rejection)),
        Err(CraftError::Config(message)) => Err(config_error(
            subject,
            ConfigError::ValidationError(message),
        )),
    }
}

/// Synchronous crafting front end over a reloadable catalog
#[derive(Debug, Clone)]
pub struct Simulator {
    catalog: Arc<SharedCatalog>,
}

impl Simulator {
    pub fn new(catalog: Arc<SharedCatalog>) -> Self {
        Simulator { catalog }
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        Simulator::new(Arc::new(SharedCatalog::new(catalog)))
    }

    /// The shared handle, for reloads
    pub fn shared_catalog(&self) -> &Arc<SharedCatalog> {
        &self.catalog
    }

    /// Whether `currency` with `omens` could be applied to `item` right now
    pub fn can_apply(
        &self,
        item: &Item,
        currency: &str,
        omens: &[&str],
    ) -> Result<CraftOutcome, ConfigError> {
        let catalog = self.catalog.snapshot();
        let mechanic = MechanicFactory::new(&catalog)
            .create(currency, omens)
            .map_err(|e| config_error(currency, e))?;

        Ok(match mechanic.can_apply(item) {
            Ok(()) => CraftOutcome::success(format!("{} can be applied", currency)),
            Err(rejection) => CraftOutcome::failure(rejection.to_string()),
        })
    }

    /// Apply a named currency with omens, using the thread-local RNG
    pub fn apply_currency(
        &self,
        item: &mut Item,
        currency: &str,
        omens: &[&str],
    ) -> Result<CraftOutcome, ConfigError> {
        self.apply_currency_with_rng(item, currency, omens, &mut rand::thread_rng())
    }

    /// Apply a named currency with omens
    ///
    /// On an unsuccessful outcome the item is exactly as it was before the call.
    pub fn apply_currency_with_rng<R: Rng>(
        &self,
        item: &mut Item,
        currency: &str,
        omens: &[&str],
        rng: &mut R,
    ) -> Result<CraftOutcome, ConfigError> {
        let catalog = self.catalog.snapshot();
        let mechanic = MechanicFactory::new(&catalog)
            .create(currency, omens)
            .map_err(|e| config_error(currency, e))?;
        Simulator::apply_mechanic(&mechanic, item, &catalog.pool(), rng)
    }

    /// Apply an already composed mechanic against an explicit pool
    pub fn apply_mechanic<M: Mechanic, R: Rng>(
        mechanic: &M,
        item: &mut Item,
        pool: &ModifierPool<'_>,
        rng: &mut R,
    ) -> Result<CraftOutcome, ConfigError> {
        let result = mechanic.apply(item, pool, rng);
        settle(mechanic.name(), result)
    }

    /// Reveal an unrevealed desecrated modifier
    ///
    /// `chooser` sees the offered candidates and the rerolls left, and either
    /// picks one or asks for a reroll (allowed only with a reroll omen).
    pub fn reveal_with<F, R>(
        &self,
        item: &mut Item,
        unrevealed_id: u32,
        omens: &[&str],
        mut chooser: F,
        rng: &mut R,
    ) -> Result<CraftOutcome, ConfigError>
    where
        F: FnMut(&[Modifier], u32) -> RevealDecision,
        R: Rng,
    {
        let catalog = self.catalog.snapshot();
        let omen_defs = MechanicFactory::new(&catalog)
            .omens(omens)
            .map_err(|e| config_error("reveal", e))?;
        let pool = catalog.pool();

        let mut session = match RevealSession::open(item, unrevealed_id, &pool, &omen_defs, rng) {
            Ok(session) => session,
            Err(rejection) => return Ok(CraftOutcome::rejected("reveal", &rejection)),
        };

        loop {
            match chooser(session.candidates(), session.rerolls_remaining()) {
                RevealDecision::Reroll => {
                    if let Err(rejection) = session.reroll(item, &pool, rng) {
                        return Ok(CraftOutcome::rejected("reveal", &rejection));
                    }
                }
                RevealDecision::Choose(index) => {
                    let result = session.choose(item, index, &pool).map_err(CraftError::from);
                    return settle("reveal", result);
                }
            }
        }
    }

    /// Reveal by picking uniformly among the offered candidates
    pub fn reveal_random<R: Rng>(
        &self,
        item: &mut Item,
        unrevealed_id: u32,
        rng: &mut R,
    ) -> Result<CraftOutcome, ConfigError> {
        let pick = rng.gen::<u32>();
        self.reveal_with(
            item,
            unrevealed_id,
            &[],
            |candidates, _| RevealDecision::Choose(pick as usize % candidates.len().max(1)),
            rng,
        )
    }
}
