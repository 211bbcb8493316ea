//! `raven knowledge` — Print the built-in music knowledge.

use raven_companion::{Category, KnowledgeBase};

fn print_category(category: &Category) {
    println!("🎸 {} ({})", category.display_name().to_uppercase(), category.key);
    for entity in &category.entities {
        println!("   • {} ({}) - {}", entity.name, entity.active_period, entity.descriptor);
    }
    if !category.sample_items.is_empty() {
        println!("   Songs:");
        for song in &category.sample_items {
            println!("     ♪ {song}");
        }
    }
    println!();
}

/// The categories to show: all of them, or the one named by `key`.
fn select<'a>(
    knowledge: &'a KnowledgeBase,
    key: Option<&str>,
) -> Result<Vec<&'a Category>, Box<dyn std::error::Error>> {
    match key {
        Some(key) => {
            let found = knowledge.lookup_category(key).ok_or_else(|| {
                format!(
                    "Unknown category '{key}'. Known: {}",
                    knowledge.category_keys().collect::<Vec<_>>().join(", ")
                )
            })?;
            Ok(vec![found])
        }
        None => Ok(knowledge.all_categories().iter().collect()),
    }
}

fn to_json(categories: &[&Category]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(categories)
}

pub fn run(category: Option<&str>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let knowledge = KnowledgeBase::new();
    let categories = select(&knowledge, category)?;

    if json {
        println!("{}", to_json(&categories)?);
    } else {
        categories.into_iter().for_each(print_category);
    }

    Ok(())
}
