//! Music knowledge base — genres, bands and sample songs.
//!
//! Built once from embedded data and never mutated afterwards. Shared
//! read-only (behind an `Arc`) by the classifier and the lookup engine.

use serde::Serialize;

/// A named band inside a genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub name: String,
    /// Years active, e.g. "1981-present"
    pub active_period: String,
    /// One-line description of the band's sound
    pub descriptor: String,
}

/// A genre with its bands, example songs and a fixed discussion sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub key: String,
    pub entities: Vec<Entity>,
    pub sample_items: Vec<String>,
    pub blurb: String,
}

impl Category {
    /// Human form of the key: `pop_punk` → `pop punk`.
    pub fn display_name(&self) -> String {
        self.key.replace('_', " ")
    }
}

/// Stable reference to an entity: its category key and declaration index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub category: String,
    pub index: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KnowledgeError {
    #[error("duplicate category key: {0}")]
    DuplicateCategory(String),

    #[error("category '{0}' has an empty key or blurb")]
    EmptyCategory(String),

    #[error("duplicate entity '{entity}' in category '{category}'")]
    DuplicateEntity { category: String, entity: String },

    #[error("entity with empty name in category '{0}'")]
    EmptyEntityName(String),
}

/// Ordered, immutable collection of categories.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    categories: Vec<Category>,
}

impl KnowledgeBase {
    /// The built-in music knowledge base.
    pub fn new() -> Self {
        let categories = builtin_categories();
        debug_assert!(validate(&categories).is_ok(), "embedded knowledge is malformed");
        Self { categories }
    }

    /// Build from caller-supplied categories, rejecting malformed data.
    pub fn from_categories(categories: Vec<Category>) -> Result<Self, KnowledgeError> {
        validate(&categories)?;
        Ok(Self { categories })
    }

    pub fn lookup_category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn all_categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_keys(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.key.as_str())
    }

    /// First entity whose name appears (case-insensitively) inside `text`.
    ///
    /// Scans categories in declaration order, then entities in declaration
    /// order; the first hit wins.
    pub fn find_entity_by_name_substring(&self, text: &str) -> Option<(&Category, &Entity)> {
        self.find_entity_ref(text).and_then(|r| self.entity(&r))
    }

    /// Same scan as [`find_entity_by_name_substring`](Self::find_entity_by_name_substring),
    /// returning a reference that can be stored.
    pub fn find_entity_ref(&self, text: &str) -> Option<EntityRef> {
        let text = text.to_lowercase();
        self.categories.iter().find_map(|category| {
            category
                .entities
                .iter()
                .position(|e| text.contains(&e.name.to_lowercase()))
                .map(|index| EntityRef {
                    category: category.key.clone(),
                    index,
                })
        })
    }

    pub fn entity(&self, entity_ref: &EntityRef) -> Option<(&Category, &Entity)> {
        let category = self.lookup_category(&entity_ref.category)?;
        category.entities.get(entity_ref.index).map(|e| (category, e))
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(categories: &[Category]) -> Result<(), KnowledgeError> {
    let mut keys = std::collections::HashSet::new();
    for category in categories {
        if category.key.is_empty() || category.blurb.is_empty() {
            return Err(KnowledgeError::EmptyCategory(category.key.clone()));
        }
        if !keys.insert(category.key.as_str()) {
            return Err(KnowledgeError::DuplicateCategory(category.key.clone()));
        }
        let mut names = std::collections::HashSet::new();
        for entity in &category.entities {
            if entity.name.trim().is_empty() {
                return Err(KnowledgeError::EmptyEntityName(category.key.clone()));
            }
            if !names.insert(entity.name.to_lowercase()) {
                return Err(KnowledgeError::DuplicateEntity {
                    category: category.key.clone(),
                    entity: entity.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn band(name: &str, active_period: &str, descriptor: &str) -> Entity {
    Entity {
        name: name.into(),
        active_period: active_period.into(),
        descriptor: descriptor.into(),
    }
}

fn category(key: &str, entities: Vec<Entity>, songs: &[&str], blurb: &str) -> Category {
    Category {
        key: key.into(),
        entities,
        sample_items: songs.iter().map(|s| s.to_string()).collect(),
        blurb: blurb.into(),
    }
}

fn builtin_categories() -> Vec<Category> {
    vec![
        category(
            "punk",
            vec![
                band("The Ramones", "1974-1996", "Fast, short, catchy - the godfathers of punk"),
                band("Sex Pistols", "1975-1978", "Raw anarchist energy that changed everything"),
                band("The Clash", "1976-1986", "Political punk with reggae and ska influences"),
                band("Bad Religion", "1980-present", "Intellectual punk with complex harmonies"),
                band("Dead Kennedys", "1978-1986", "Hardcore punk with biting social commentary"),
                band("Black Flag", "1976-1986", "Aggressive hardcore that defined the scene"),
            ],
            &[
                "Blitzkrieg Bop - The Ramones",
                "Anarchy in the U.K. - Sex Pistols",
                "London Calling - The Clash",
                "American Jesus - Bad Religion",
            ],
            "Punk is like... pure rebellion in sound form 🖤 Raw, fast, and unapologetic. It's about saying 'fuck the system' with three chords and attitude.",
        ),
        category(
            "pop_punk",
            vec![
                band("Green Day", "1987-present", "Punk rock made mainstream without losing the edge"),
                band("Blink-182", "1992-present", "Juvenile humor meets catchy hooks and fast guitars"),
                band("Fall Out Boy", "2001-present", "Emo-tinged pop punk with literary lyrics"),
                band("Paramore", "2004-present", "Hayley Williams' powerhouse vocals over driving punk"),
                band("The Offspring", "1984-present", "Surf punk meets alternative rock attitude"),
                band("Sum 41", "1996-present", "Canadian punk with metal influences"),
            ],
            &[
                "Basket Case - Green Day",
                "All the Small Things - Blink-182",
                "Sugar, We're Goin Down - Fall Out Boy",
                "Misery Business - Paramore",
            ],
            "Pop punk is like... punk's younger sibling who went mainstream but kept the attitude ⚡ Catchy hooks with rebellious spirit.",
        ),
        category(
            "metal",
            vec![
                band("Black Sabbath", "1968-2017", "The dark lords who invented heavy metal"),
                band("Iron Maiden", "1975-present", "Epic storytelling with Bruce Dickinson's soaring vocals"),
                band("Metallica", "1981-present", "Thrash metal legends who conquered the world"),
                band("Slipknot", "1995-present", "Masked chaos with crushing heaviness"),
                band("System of a Down", "1994-present", "Political metal with Armenian influences"),
                band("Tool", "1990-present", "Progressive metal with complex time signatures"),
            ],
            &[
                "Paranoid - Black Sabbath",
                "The Number of the Beast - Iron Maiden",
                "Master of Puppets - Metallica",
                "Duality - Slipknot",
            ],
            "Metal is where I go when I need to feel powerful 💀 Heavy riffs, thunderous drums, and vocals that can shake your soul. It's cathartic chaos.",
        ),
        category(
            "emo",
            vec![
                band("My Chemical Romance", "2001-2013, 2019-present", "Theatrical darkness with massive anthems"),
                band("Taking Back Sunday", "1999-present", "Dual vocals and emotional intensity"),
                band("Dashboard Confessional", "1999-present", "Acoustic-driven confessional songwriting"),
                band("The Used", "2001-present", "Raw emotion meets post-hardcore aggression"),
                band("Hawthorne Heights", "2001-present", "Screaming vocals over melodic instrumentals"),
                band("Panic! At The Disco", "2004-present", "Circus-like theatricality with emo roots"),
            ],
            &[
                "Welcome to the Black Parade - My Chemical Romance",
                "Cute Without the 'E' - Taking Back Sunday",
                "Hands Down - Dashboard Confessional",
                "I Write Sins Not Tragedies - Panic! At The Disco",
            ],
            "Emo is emotional honesty set to music 🥀 It's about feeling everything deeply and not being ashamed of it. My heart lives in emo lyrics.",
        ),
        category(
            "alternative",
            vec![
                band("The Cure", "1978-present", "Gothic post-punk with Robert Smith's distinctive voice"),
                band("Siouxsie and the Banshees", "1976-1996", "Pioneering post-punk with dark glamour"),
                band("Joy Division", "1976-1980", "Haunting post-punk that defined melancholy"),
                band("Bauhaus", "1978-1983", "The godfathers of goth rock"),
                band("The Smiths", "1982-1987", "Jangly guitars with Morrissey's wit and melancholy"),
            ],
            &[
                "Just Like Heaven - The Cure",
                "Cities in Dust - Siouxsie and the Banshees",
                "Love Will Tear Us Apart - Joy Division",
                "Bela Lugosi's Dead - Bauhaus",
            ],
            "Alternative is where the outcasts found their voice 🌙 It's moody, introspective, and beautifully dark. Gothic romance in music form.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_data_is_well_formed() {
        assert!(KnowledgeBase::from_categories(builtin_categories()).is_ok());
    }

    #[test]
    fn categories_keep_declaration_order() {
        let kb = KnowledgeBase::new();
        let keys: Vec<_> = kb.category_keys().collect();
        assert_eq!(keys, vec!["punk", "pop_punk", "metal", "emo", "alternative"]);
        let sizes: Vec<_> = kb.all_categories().iter().map(|c| c.entities.len()).collect();
        assert_eq!(sizes, vec![6, 6, 6, 6, 5]);
    }

    #[test]
    fn lookup_category_by_key() {
        let kb = KnowledgeBase::new();
        let metal = kb.lookup_category("metal").unwrap();
        assert_eq!(metal.sample_items.len(), 4);
        assert!(kb.lookup_category("jazz").is_none());
        assert_eq!(kb.lookup_category("pop_punk").unwrap().display_name(), "pop punk");
    }

    #[test]
    fn finds_entity_case_insensitively() {
        let kb = KnowledgeBase::new();
        let (category, entity) = kb
            .find_entity_by_name_substring("have you heard METALLICA live?")
            .unwrap();
        assert_eq!(category.key, "metal");
        assert_eq!(entity.name, "Metallica");
    }

    #[test]
    fn first_declared_entity_wins() {
        let kb = KnowledgeBase::new();
        // Paramore (pop_punk) is declared before The Cure (alternative).
        let (category, entity) = kb
            .find_entity_by_name_substring("the cure or paramore?")
            .unwrap();
        assert_eq!(category.key, "pop_punk");
        assert_eq!(entity.name, "Paramore");

        // Within one category, declaration order decides too.
        let (_, entity) = kb
            .find_entity_by_name_substring("tool opened for slipknot")
            .unwrap();
        assert_eq!(entity.name, "Slipknot");
    }

    #[test]
    fn entity_ref_resolves_back() {
        let kb = KnowledgeBase::new();
        let r = kb.find_entity_ref("sex pistols forever").unwrap();
        assert_eq!(r, EntityRef { category: "punk".into(), index: 1 });
        assert_eq!(kb.entity(&r).unwrap().1.name, "Sex Pistols");
        assert!(kb.entity(&EntityRef { category: "punk".into(), index: 99 }).is_none());
    }

    #[test]
    fn no_entity_in_plain_text() {
        let kb = KnowledgeBase::new();
        assert!(kb.find_entity_by_name_substring("what a lovely day").is_none());
    }

    #[test]
    fn rejects_duplicate_keys() {
        let cats = vec![
            category("punk", vec![], &[], "a"),
            category("punk", vec![], &[], "b"),
        ];
        assert_eq!(
            KnowledgeBase::from_categories(cats).unwrap_err(),
            KnowledgeError::DuplicateCategory("punk".into())
        );
    }

    #[test]
    fn rejects_duplicate_entities_within_category() {
        let cats = vec![category(
            "metal",
            vec![band("Tool", "x", "y"), band("tool", "x", "z")],
            &[],
            "blurb",
        )];
        assert!(matches!(
            KnowledgeBase::from_categories(cats),
            Err(KnowledgeError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn same_name_allowed_across_categories() {
        let cats = vec![
            category("a", vec![band("Twin", "x", "first")], &[], "blurb a"),
            category("b", vec![band("Twin", "x", "second")], &[], "blurb b"),
        ];
        let kb = KnowledgeBase::from_categories(cats).unwrap();
        let (_, entity) = kb.find_entity_by_name_substring("twin").unwrap();
        assert_eq!(entity.descriptor, "first");
    }
}
