//! Example Crafting - A scripted crafting session demonstrating craft_core
//!
//! This example shows:
//! - Loading the bundled crafting content
//! - Taking a Normal base through Transmutation, Augmentation, Regal and Exalted
//! - Omens changing how a currency behaves
//! - Abyssal bones and revealing the desecrated modifier
//!
//! Run with `RUST_LOG=debug` to see every selection and removal.

use craft_core::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// One scripted step: currency name plus the omens used with it
struct Step {
    currency: &'static str,
    omens: &'static [&'static str],
}

const SESSION: &[Step] = &[
    Step { currency: "Orb of Transmutation", omens: &[] },
    Step { currency: "Orb of Augmentation", omens: &[] },
    Step { currency: "Regal Orb", omens: &["Omen of Homogenising Coronation"] },
    Step { currency: "Exalted Orb", omens: &["Omen of Sinistral Exaltation"] },
    Step { currency: "Chaos Orb", omens: &["Omen of Whittling"] },
    Step { currency: "Preserved Rib", omens: &["Omen of the Sovereign"] },
];

fn load_catalog() -> Catalog {
    // Manifest-relative first, then relative to the working directory
    let manifest_config = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config");
    let config_paths = [manifest_config.as_path(), Path::new("config"), Path::new("../config")];

    config_paths
        .iter()
        .find_map(|path| {
            if !path.exists() {
                return None;
            }
            match Catalog::load_from_dir(path) {
                Ok(catalog) => Some(catalog),
                Err(e) => {
                    eprintln!("Error loading config from '{}': {}", path.display(), e);
                    None
                }
            }
        })
        .unwrap_or_else(|| {
            eprintln!("ERROR: Could not find config directory.");
            eprintln!("Looked in:");
            for path in &config_paths {
                eprintln!("  - {}", path.display());
            }
            std::process::exit(1);
        })
}

fn print_item(item: &Item) {
    println!("  {} ({}, ilvl {})", item.base_type, item.rarity, item.item_level);
    for modifier in &item.prefix_mods {
        println!("    [P] {}{}", modifier.display_text(), flags(modifier));
    }
    for modifier in &item.suffix_mods {
        println!("    [S] {}{}", modifier.display_text(), flags(modifier));
    }
}

fn flags(modifier: &Modifier) -> &'static str {
    if modifier.is_fractured {
        " (fractured)"
    } else if modifier.is_unrevealed {
        " (unrevealed)"
    } else if modifier.is_desecrated {
        " (desecrated)"
    } else {
        ""
    }
}

fn report(label: &str, outcome: Result<CraftOutcome, ConfigError>) {
    match outcome {
        Ok(outcome) if outcome.success => println!("{}: {}", label, outcome.message),
        Ok(outcome) => println!("{}: failed - {}", label, outcome.message),
        Err(e) => eprintln!("{}: configuration error - {}", label, e),
    }
}

fn main() {
    env_logger::init();

    let simulator = Simulator::from_catalog(load_catalog());
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut item = Item::new("Plate Vest", "body_armour", 75).with_base_tags(&["str_armour"]);
    println!("Starting item:");
    print_item(&item);
    println!();

    for step in SESSION {
        let label = if step.omens.is_empty() {
            step.currency.to_string()
        } else {
            format!("{} + {}", step.currency, step.omens.join(" + "))
        };
        let outcome = simulator.apply_currency_with_rng(&mut item, step.currency, step.omens, &mut rng);
        report(&label, outcome);
        print_item(&item);
        println!();
    }
    log::info!("Scripted session finished after {} steps", SESSION.len());

    if let Some(id) = item.unrevealed_mods.first().map(|u| u.id) {
        let outcome = simulator.reveal_with(
            &mut item,
            id,
            &[],
            |candidates, _| {
                println!("Reveal candidates:");
                for (i, candidate) in candidates.iter().enumerate() {
                    println!("  {}: {}", i, candidate.display_text());
                }
                RevealDecision::Choose(0)
            },
            &mut rng,
        );
        report("Reveal", outcome);
        print_item(&item);
        println!();
    }

    match item.to_json() {
        Ok(json) => println!("Final item as JSON:\n{}", json),
        Err(e) => eprintln!("Could not serialize item: {}", e),
    }
}
