//! Omens - Declarative modifiers of a currency's behaviour
//!
//! An omen is data: a name, the mechanic class it may accompany, and a list of
//! rules. Before a currency runs, all attached omens are folded into a single
//! `OmenContext`; mechanics read that context instead of asking which omens
//! are present.

mod composed;

pub use composed::ComposedMechanic;

use crate::error::Rejection;
use crate::item::Item;
use crate::mechanic::MechanicClass;
use crate::types::AffixType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One behavioural adjustment carried by an omen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum OmenRule {
    /// Additions must target this affix type
    ForceAddAffix { affix: AffixType },
    /// Removals must target this affix type
    ForceRemoveAffix { affix: AffixType },
    ExtraAdditions { count: u32 },
    ExtraRemovals { count: u32 },
    /// Additions must share a visible tag with the item's existing modifiers
    HomogeniseTags,
    /// Removal picks the modifier with the lowest required item level
    RemoveLowestLevel,
    /// Skew an alchemy roll to the maximum count of this affix type
    MaxAffix { affix: AffixType },
    /// Removal may only take desecrated modifiers
    DesecratedOnlyRemoval,
    /// Revealed desecrated modifiers must carry this boss tag
    BossTag { tag: String },
    /// Allow rerolling the reveal candidate set
    RerollReveal {
        #[serde(default = "default_rerolls")]
        count: u32,
    },
}

fn default_rerolls() -> u32 {
    1
}

/// Omen definition as loaded from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmenDef {
    pub name: String,
    /// Mechanic class this omen may be combined with
    pub affected_currency: MechanicClass,
    #[serde(default)]
    pub rules: Vec<OmenRule>,
}

impl OmenDef {
    pub fn new(name: &str, affected_currency: MechanicClass, rules: Vec<OmenRule>) -> Self {
        OmenDef {
            name: name.to_string(),
            affected_currency,
            rules,
        }
    }

    pub fn is_compatible(&self, class: MechanicClass) -> bool {
        self.affected_currency == class
    }
}

/// Reject any omen whose class differs from the currency's
pub fn check_compatibility(
    omens: &[OmenDef],
    class: MechanicClass,
    currency: &str,
) -> Result<(), Rejection> {
    match omens.iter().find(|o| !o.is_compatible(class)) {
        Some(omen) => Err(Rejection::IncompatibleOmen {
            omen: omen.name.clone(),
            currency: currency.to_string(),
        }),
        None => Ok(()),
    }
}

/// Effective behaviour of a set of omens for one apply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OmenContext {
    pub add_affix: Option<AffixType>,
    pub remove_affix: Option<AffixType>,
    pub extra_additions: u32,
    pub extra_removals: u32,
    pub homogenise: bool,
    pub remove_lowest_level: bool,
    pub max_affix: Option<AffixType>,
    pub desecrated_only_removal: bool,
    pub boss_tag: Option<String>,
    pub rerolls: u32,
    /// Visible tags on the item before this apply mutates it
    pub existing_tags: BTreeSet<String>,
    pub(crate) sources: Sources,
}

/// Which omen set each exclusive setting, for conflict messages
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Sources {
    add_affix: Option<String>,
    remove_affix: Option<String>,
    max_affix: Option<String>,
    boss_tag: Option<String>,
}

impl OmenContext {
    /// Fold omen rules in order
    ///
    /// Two omens asking for different values of the same exclusive setting
    /// (forced affix, alchemy skew, boss tag) conflict.
    pub fn from_omens(omens: &[OmenDef]) -> Result<Self, Rejection> {
        let mut ctx = OmenContext::default();
        for omen in omens {
            for rule in &omen.rules {
                ctx.fold(&omen.name, rule)?;
            }
        }
        Ok(ctx)
    }

    fn fold(&mut self, omen: &str, rule: &OmenRule) -> Result<(), Rejection> {
        match rule {
            OmenRule::ForceAddAffix { affix } => {
                set_exclusive(&mut self.add_affix, &mut self.sources.add_affix, *affix, omen)?
            }
            OmenRule::ForceRemoveAffix { affix } => set_exclusive(
                &mut self.remove_affix,
                &mut self.sources.remove_affix,
                *affix,
                omen,
            )?,
            OmenRule::ExtraAdditions { count } => self.extra_additions += count,
            OmenRule::ExtraRemovals { count } => self.extra_removals += count,
            OmenRule::HomogeniseTags => self.homogenise = true,
            OmenRule::RemoveLowestLevel => self.remove_lowest_level = true,
            OmenRule::MaxAffix { affix } => {
                set_exclusive(&mut self.max_affix, &mut self.sources.max_affix, *affix, omen)?
            }
            OmenRule::DesecratedOnlyRemoval => self.desecrated_only_removal = true,
            OmenRule::BossTag { tag } => set_exclusive(
                &mut self.boss_tag,
                &mut self.sources.boss_tag,
                tag.clone(),
                omen,
            )?,
            OmenRule::RerollReveal { count } => self.rerolls += count,
        }
        Ok(())
    }

    /// Capture the item's visible tags before any mutation
    pub fn with_item(mut self, item: &Item) -> Self {
        self.existing_tags = item.visible_tags();
        self
    }

    /// Modifiers an additive mechanic adds in one use
    pub fn additions(&self) -> usize {
        1 + self.extra_additions as usize
    }

    /// Modifiers a removal mechanic takes in one use
    pub fn removals(&self) -> usize {
        1 + self.extra_removals as usize
    }

    /// Affix types removal may target
    pub fn removal_affixes(&self) -> Vec<AffixType> {
        match self.remove_affix {
            Some(affix) => vec![affix],
            None => AffixType::all().to_vec(),
        }
    }
}

fn set_exclusive<T: PartialEq + Clone>(
    slot: &mut Option<T>,
    source: &mut Option<String>,
    value: T,
    omen: &str,
) -> Result<(), Rejection> {
    match slot {
        Some(current) if *current != value => Err(Rejection::ConflictingOmens {
            first: source.clone().unwrap_or_default(),
            second: omen.to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            *slot = Some(value);
            *source = Some(omen.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;
    use crate::types::{ModType, Rarity};

    fn sinistral() -> OmenDef {
        OmenDef::new(
            "Omen of Sinistral Exaltation",
            MechanicClass::Exalted,
            vec![OmenRule::ForceAddAffix {
                affix: AffixType::Prefix,
            }],
        )
    }

    fn dextral() -> OmenDef {
        OmenDef::new(
            "Omen of Dextral Exaltation",
            MechanicClass::Exalted,
            vec![OmenRule::ForceAddAffix {
                affix: AffixType::Suffix,
            }],
        )
    }

    fn greater() -> OmenDef {
        OmenDef::new(
            "Omen of Greater Exaltation",
            MechanicClass::Exalted,
            vec![OmenRule::ExtraAdditions { count: 1 }],
        )
    }

    #[test]
    fn test_fold_combines_rules() {
        let ctx = OmenContext::from_omens(&[sinistral(), greater()]).unwrap();
        assert_eq!(ctx.add_affix, Some(AffixType::Prefix));
        assert_eq!(ctx.additions(), 2);
        assert_eq!(ctx.removals(), 1);
    }

    #[test]
    fn test_opposing_force_conflicts() {
        let err = OmenContext::from_omens(&[sinistral(), dextral()]).unwrap_err();
        assert_eq!(
            err,
            Rejection::ConflictingOmens {
                first: "Omen of Sinistral Exaltation".to_string(),
                second: "Omen of Dextral Exaltation".to_string(),
            }
        );
    }

    #[test]
    fn test_compatibility() {
        let omens = [sinistral()];
        assert!(check_compatibility(&omens, MechanicClass::Exalted, "Exalted Orb").is_ok());
        let err = check_compatibility(&omens, MechanicClass::Chaos, "Chaos Orb").unwrap_err();
        assert!(matches!(err, Rejection::IncompatibleOmen { .. }));
    }

    #[test]
    fn test_existing_tags_snapshot() {
        let item = Item::new("Iron Ring", "ring", 50)
            .with_rarity(Rarity::Rare)
            .with_prefix(
                Modifier::new("Hale", ModType::Prefix, "+# to maximum Life", 1.0, 2.0)
                    .with_tags(&["life", "essence"]),
            );
        let ctx = OmenContext::default().with_item(&item);
        assert!(ctx.existing_tags.contains("life"));
        assert!(!ctx.existing_tags.contains("essence"));
    }

    #[test]
    fn test_rules_from_toml() {
        let text = r#"
name = "Omen of Whittling"
affected_currency = "chaos"
rules = [{ rule = "remove_lowest_level" }, { rule = "force_remove_affix", affix = "suffix" }]
"#;
        let omen: OmenDef = toml::from_str(text).unwrap();
        assert_eq!(omen.affected_currency, MechanicClass::Chaos);
        assert_eq!(omen.rules.len(), 2);
        assert_eq!(
            omen.rules[1],
            OmenRule::ForceRemoveAffix {
                affix: AffixType::Suffix
            }
        );
    }
}
