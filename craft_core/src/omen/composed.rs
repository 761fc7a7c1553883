//! A currency with its omens attached

use super::{check_compatibility, OmenContext, OmenDef};
use crate::error::{CraftError, Rejection};
use crate::item::Item;
use crate::mechanic::{apply_atomically, Currency, Mechanic, MechanicClass};
use crate::pool::ModifierPool;
use rand::Rng;

/// Currency decorated with a set of omens
///
/// Omens never run on their own. They are folded into an `OmenContext` that
/// the wrapped currency consults, so composition order does not matter.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedMechanic {
    name: String,
    currency: Currency,
    omens: Vec<OmenDef>,
}

impl ComposedMechanic {
    pub fn new(name: &str, currency: Currency, omens: Vec<OmenDef>) -> Self {
        ComposedMechanic {
            name: name.to_string(),
            currency,
            omens,
        }
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn class(&self) -> MechanicClass {
        self.currency.class()
    }

    pub fn omens(&self) -> &[OmenDef] {
        &self.omens
    }

    /// Compatibility plus the folded context, without touching an item
    pub fn context(&self) -> Result<OmenContext, Rejection> {
        check_compatibility(&self.omens, self.class(), &self.name)?;
        OmenContext::from_omens(&self.omens)
    }
}

impl Mechanic for ComposedMechanic {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_apply(&self, item: &Item) -> Result<(), Rejection> {
        let ctx = self.context()?.with_item(item);
        self.currency.check(item, &ctx)
    }

    fn apply<R: Rng>(
        &self,
        item: &mut Item,
        pool: &ModifierPool<'_>,
        rng: &mut R,
    ) -> Result<String, CraftError> {
        let ctx = self.context()?.with_item(item);
        let message = apply_atomically(&self.currency, item, pool, &ctx, rng)?;
        if self.omens.is_empty() {
            return Ok(message);
        }
        let names: Vec<&str> = self.omens.iter().map(|o| o.name.as_str()).collect();
        log::debug!("{} consumed omens: {}", self.name, names.join(", "));
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ExclusionEngine;
    use crate::mechanic::OrbOptions;
    use crate::modifier::{Modifier, ModifierCatalog};
    use crate::omen::OmenRule;
    use crate::types::{AffixType, ModType, Rarity};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn catalog() -> ModifierCatalog {
        ModifierCatalog::new(vec![
            Modifier::new("Hale", ModType::Prefix, "+# to maximum Life", 10.0, 19.0).with_group("Life"),
            Modifier::new("Lacquered", ModType::Prefix, "+# to Armour", 10.0, 19.0).with_group("Armour"),
            Modifier::new("of the Ice", ModType::Suffix, "+#% to Cold Resistance", 6.0, 10.0)
                .with_group("ColdResistance"),
        ])
        .unwrap()
    }

    #[test]
    fn test_forced_prefix_addition() {
        let catalog = catalog();
        let engine = ExclusionEngine::empty();
        let pool = ModifierPool::new(&catalog, &engine);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let omen = OmenDef::new(
            "Omen of Sinistral Exaltation",
            MechanicClass::Exalted,
            vec![OmenRule::ForceAddAffix {
                affix: AffixType::Prefix,
            }],
        );
        let mechanic = ComposedMechanic::new("Exalted Orb", Currency::Exalted(OrbOptions::default()), vec![omen]);

        for _ in 0..10 {
            let mut item = Item::new("Helmet", "helmet", 80).with_rarity(Rarity::Rare);
            mechanic.apply(&mut item, &pool, &mut rng).unwrap();
            assert_eq!(item.prefix_mods.len(), 1);
            assert!(item.suffix_mods.is_empty());
        }
    }

    #[test]
    fn test_incompatible_omen_rejected_before_item_checks() {
        let omen = OmenDef::new(
            "Omen of Whittling",
            MechanicClass::Chaos,
            vec![OmenRule::RemoveLowestLevel],
        );
        let mechanic = ComposedMechanic::new("Exalted Orb", Currency::Exalted(OrbOptions::default()), vec![omen]);
        let item = Item::new("Helmet", "helmet", 80);
        assert_eq!(
            mechanic.can_apply(&item),
            Err(Rejection::IncompatibleOmen {
                omen: "Omen of Whittling".to_string(),
                currency: "Exalted Orb".to_string(),
            })
        );
    }
}
