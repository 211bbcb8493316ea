//! Prefix commands (`!recommend`, `!vibe`, ...).
//!
//! Each command is stateless and answers in one shot; none of them touch the
//! conversation context.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use raven_core::channel::{Card, CardField};

use crate::lookup::LookupEngine;
use crate::persona::flirty_greeting;

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Card(Card),
}

const VIBES: &[&str] = &[
    "Feeling like 3am energy with My Chemical Romance on repeat 🖤",
    "In my feels with some Dashboard Confessional... *stares dramatically into the distance* 🥀",
    "Need something heavy. Time for some Slipknot to match my mood 💀",
    "Craving that raw punk energy... Sex Pistols it is ⚡",
    "Soft goth hours with The Cure playing softly 🌙",
    "Angry but make it aesthetic - Rage Against the Machine vibes 🔥",
    "Nostalgic emo kid energy... *adjusts striped arm warmers* 🖤",
];

const LYRICS: &[&str] = &[
    "\"I'm not okay, I'm not okay, I'm not okay, you wear me out\" - My Chemical Romance 🖤",
    "\"The best of us can find happiness in misery\" - Fall Out Boy 🥀",
    "\"I write sins not tragedies\" - Panic! At The Disco ⚡",
    "\"So cut my wrists and black my eyes\" - Hawthorne Heights 💀",
    "\"You're just a sad song with nothing to say\" - Taking Back Sunday 🌙",
    "\"I'm drowning in the sea of my own tears\" - Dashboard Confessional 🖤",
    "\"We are the kids from yesterday\" - My Chemical Romance 🥀",
];

const PLAYLISTS: &[(&str, [&str; 5])] = &[
    (
        "heartbreak",
        [
            "Dashboard Confessional - Hands Down",
            "My Chemical Romance - Helena",
            "Taking Back Sunday - Cute Without the 'E'",
            "The Used - The Taste of Ink",
            "Hawthorne Heights - Ohio Is for Lovers",
        ],
    ),
    (
        "anger",
        [
            "Slipknot - Duality",
            "System of a Down - Chop Suey!",
            "Rage Against the Machine - Killing in the Name",
            "Korn - Freak on a Leash",
            "Limp Bizkit - Break Stuff",
        ],
    ),
    (
        "nostalgia",
        [
            "Green Day - Time of Your Life",
            "Blink-182 - I Miss You",
            "Fall Out Boy - Centuries",
            "Paramore - The Only Exception",
            "Simple Plan - I'm Just a Kid",
        ],
    ),
    (
        "rebellion",
        [
            "Sex Pistols - Anarchy in the U.K.",
            "The Clash - London Calling",
            "Bad Religion - American Jesus",
            "Rise Against - Savior",
            "Anti-Flag - Die for the Government",
        ],
    ),
    (
        "romance",
        [
            "The Cure - Just Like Heaven",
            "Siouxsie and the Banshees - Cities in Dust",
            "Panic! At The Disco - I Write Sins Not Tragedies",
            "Fall Out Boy - Sugar, We're Goin Down",
            "Paramore - Still Into You",
        ],
    ),
];

pub struct CommandSet {
    lookup: Arc<LookupEngine>,
    rng: Mutex<StdRng>,
    prefix: String,
}

impl CommandSet {
    pub fn new(lookup: Arc<LookupEngine>, rng: StdRng, prefix: impl Into<String>) -> Self {
        Self {
            lookup,
            rng: Mutex::new(rng),
            prefix: prefix.into(),
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a parsed command. `name` is already lowercased.
    pub fn handle(&self, name: &str, args: Option<&str>, username: &str) -> Reply {
        match name {
            "recommend" | "rec" | "music" => self.recommend(args),
            "vibe" | "mood" => self.vibe(username),
            "lyrics" | "quote" => self.lyrics(args),
            "playlist" | "mix" => self.playlist(args),
            "about" | "info" => Reply::Card(self.about()),
            "help" => Reply::Text(self.help()),
            _ => Reply::Text(format!(
                "*raises eyebrow* That's not a command I know, babe. Try `{}help` 🖤",
                self.prefix
            )),
        }
    }

    fn recommend(&self, genre: Option<&str>) -> Reply {
        let text = self.lookup.recommend_for_genre(genre).unwrap_or_else(|| {
            format!(
                "*flips through vinyl collection* What vibe are you going for, babe? \
                 Try `{p}recommend punk` or `{p}recommend metal` 🖤",
                p = self.prefix
            )
        });
        Reply::Text(text)
    }

    fn vibe(&self, username: &str) -> Reply {
        let mut rng = self.rng();
        let greeting = flirty_greeting(username, &mut *rng);
        let vibe = VIBES.choose(&mut *rng).copied().unwrap_or_default();
        Reply::Text(format!("{greeting}\n\nCurrent vibe: {vibe}"))
    }

    fn lyrics(&self, query: Option<&str>) -> Reply {
        let text = match query {
            Some(query) => format!(
                "*searches through lyric journals* Looking for something about '{query}'... \
                 Let me feel into that energy 🖤"
            ),
            None => {
                let line = LYRICS.choose(&mut *self.rng()).copied().unwrap_or_default();
                format!("*whispers poetically*\n\n{line}")
            }
        };
        Reply::Text(text)
    }

    fn playlist(&self, theme: Option<&str>) -> Reply {
        let theme = match theme {
            Some(theme) => theme.to_string(),
            None => PLAYLISTS
                .choose(&mut *self.rng())
                .map(|(name, _)| name.to_string())
                .unwrap_or_default(),
        };
        let key = theme.to_lowercase();
        let Some((_, songs)) = PLAYLISTS.iter().find(|(name, _)| *name == key) else {
            return Reply::Text(format!(
                "*tilts head mysteriously* What kind of {theme} energy are you going for? \
                 Try heartbreak, anger, nostalgia, rebellion, or romance 🖤"
            ));
        };

        let mut out = format!(
            "🎵 **{} PLAYLIST** 🎵\n*curated with dark love*\n\n",
            theme.to_uppercase()
        );
        for (i, song) in songs.iter().enumerate() {
            out.push_str(&format!("{}. {song}\n", i + 1));
        }
        out.push_str("\n*adjusts headphones* This should hit your soul just right, gorgeous 🖤");
        Reply::Text(out)
    }

    fn about(&self) -> Card {
        let p = &self.prefix;
        Card {
            title: "🖤 About Raven 🖤".into(),
            description:
                "Your emo AI companion with a passion for dark music and deeper connections"
                    .into(),
            color: 0x000000,
            fields: vec![
                CardField {
                    name: "Personality".into(),
                    value: "Edgy • Emo • Flirty • Music Obsessed".into(),
                    inline: false,
                },
                CardField {
                    name: "Music Knowledge".into(),
                    value: "Punk • Pop Punk • Metal • Emo • Alternative".into(),
                    inline: false,
                },
                CardField {
                    name: "Commands".into(),
                    value: format!(
                        "`{p}recommend` - Get music recommendations\n\
                         `{p}vibe` - Check my current mood\n\
                         `{p}lyrics` - Get meaningful lyrics\n\
                         `{p}playlist` - Create themed playlists"
                    ),
                    inline: false,
                },
            ],
            footer: Some("DM me or mention me for deeper conversations 🥀".into()),
        }
    }

    fn help(&self) -> String {
        let p = &self.prefix;
        format!(
            "🖤 **RAVEN'S COMMANDS** 🖤\n\n\
             **Music Commands:**\n\
             `{p}recommend [genre]` - Get music recommendations\n\
             `{p}vibe` - Check my current mood\n\
             `{p}lyrics [query]` - Get meaningful lyrics\n\
             `{p}playlist [theme]` - Create themed playlists\n\n\
             **Interaction:**\n\
             - DM me for private conversations\n\
             - Mention me in servers for responses\n\
             - I respond to music discussions naturally\n\n\
             **Genres I know:** punk, pop punk, metal, emo, alternative\n\n\
             *whispers* Just talk to me like a real person... I'm here for you 🥀"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn commands() -> CommandSet {
        CommandSet::new(
            Arc::new(LookupEngine::seeded(4)),
            StdRng::seed_from_u64(4),
            "!",
        )
    }

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Text(t) => t,
            Reply::Card(c) => panic!("expected text, got card {}", c.title),
        }
    }

    #[test]
    fn recommend_aliases_share_behaviour() {
        let c = commands();
        for name in ["recommend", "rec", "music"] {
            let reply = text(c.handle(name, Some("metal"), "Ash"));
            assert!(reply.contains("Here's some metal"), "{name}");
        }
    }

    #[test]
    fn recommend_unknown_genre_hints() {
        let reply = text(commands().handle("recommend", Some("polka"), "Ash"));
        assert!(reply.contains("What vibe are you going for"));
        assert!(reply.contains("`!recommend punk`"));
    }

    #[test]
    fn vibe_has_greeting_and_vibe() {
        let reply = text(commands().handle("mood", None, "Ash"));
        assert!(reply.contains("Ash"));
        let vibe = reply.split("\n\nCurrent vibe: ").nth(1).unwrap();
        assert!(VIBES.contains(&vibe));
    }

    #[test]
    fn lyrics_random_or_query() {
        let c = commands();
        let random = text(c.handle("lyrics", None, "Ash"));
        let line = random.strip_prefix("*whispers poetically*\n\n").unwrap();
        assert!(LYRICS.contains(&line));

        let query = text(c.handle("quote", Some("rain"), "Ash"));
        assert!(query.contains("'rain'"));
    }

    #[test]
    fn playlist_known_theme_lists_five_songs() {
        let reply = text(commands().handle("playlist", Some("Romance"), "Ash"));
        assert!(reply.starts_with("🎵 **ROMANCE PLAYLIST** 🎵"));
        assert!(reply.contains("1. The Cure - Just Like Heaven"));
        assert!(reply.contains("5. Paramore - Still Into You"));
    }

    #[test]
    fn playlist_random_theme_is_known() {
        let reply = text(commands().handle("mix", None, "Ash"));
        assert!(reply.contains("PLAYLIST"));
        assert_eq!(reply.lines().filter(|l| l.starts_with(char::is_numeric)).count(), 5);
    }

    #[test]
    fn playlist_unknown_theme_lists_themes() {
        let reply = text(commands().handle("playlist", Some("joy"), "Ash"));
        assert!(reply.contains("What kind of joy energy"));
        assert!(reply.contains("heartbreak, anger, nostalgia, rebellion, or romance"));
    }

    #[test]
    fn about_is_a_card() {
        for name in ["about", "info"] {
            let Reply::Card(card) = commands().handle(name, None, "Ash") else {
                panic!("expected card");
            };
            assert_eq!(card.title, "🖤 About Raven 🖤");
            assert_eq!(card.fields.len(), 3);
            assert!(card.footer.is_some());
        }
    }

    #[test]
    fn help_uses_configured_prefix() {
        let c = CommandSet::new(Arc::new(LookupEngine::seeded(1)), StdRng::seed_from_u64(1), "?");
        let reply = text(c.handle("help", None, "Ash"));
        assert!(reply.contains("`?recommend [genre]`"));
        assert!(!reply.contains("`!"));
    }

    #[test]
    fn unknown_command() {
        let reply = text(commands().handle("dance", None, "Ash"));
        assert!(reply.contains("That's not a command I know"));
    }
}
