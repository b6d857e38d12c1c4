//! Area naming.
//!
//! Names are display-only. A namer never reads or advances the world's
//! RNG cursor, and an area with no name still works everywhere; it just
//! shows the distance label.

use crate::{rng::RngCursor, types::AreaId};

/// What a namer gets to look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaNamingContext {
    pub area_id:        AreaId,
    pub distance:       u32,
    /// Human-readable features: "ore vein", "wolf camp", ...
    pub features:       Vec<String>,
    pub neighbor_names: Vec<String>,
}

pub trait AreaNamer {
    /// A short display name, or `None` to fall back to the distance label.
    fn name_area(&self, ctx: &AreaNamingContext) -> Option<String>;
}

/// Never names anything. Stands in for an unavailable generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackNamer;

impl AreaNamer for FallbackNamer {
    fn name_area(&self, _ctx: &AreaNamingContext) -> Option<String> {
        None
    }
}

/// Deterministic names from curated word lists. The stream is keyed by
/// the area id alone, so a name never depends on discovery order.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordListNamer;

impl WordListNamer {
    fn pick<'a>(cursor: &mut RngCursor, words: &'a [&'a str]) -> &'a str {
        let (u, next) = cursor.draw("name.word");
        *cursor = next;
        let index = ((u * words.len() as f64) as usize).min(words.len() - 1);
        words[index]
    }

    /// Landform nouns, nudged by what the area contains.
    fn nouns_for(features: &[String]) -> &'static [&'static str] {
        if features.iter().any(|f| f == "fishing spot") {
            &["Shallows", "Mere", "Fen", "Reach", "Banks", "Tarn"]
        } else if features.iter().any(|f| f == "ore vein") {
            &["Crags", "Scar", "Hollow", "Tor", "Delve", "Ridge"]
        } else if features.iter().any(|f| f == "tree stand") {
            &["Wood", "Thicket", "Holt", "Glade", "Copse", "Weald"]
        } else {
            &["Heath", "Barrens", "Moor", "Downs", "Waste", "Flats"]
        }
    }

    /// Adjectives grow grimmer with distance.
    fn adjectives_for(distance: u32) -> &'static [&'static str] {
        match distance {
            0..=1 => &["Green", "Quiet", "Mossy", "Amber", "Willow", "Bright"],
            2..=3 => &["Grey", "Windward", "Tangled", "Cold", "Lonely", "Broken"],
            _     => &["Ashen", "Hollow", "Drowned", "Sunless", "Bleak", "Forsaken"],
        }
    }
}

impl AreaNamer for WordListNamer {
    fn name_area(&self, ctx: &AreaNamingContext) -> Option<String> {
        let mut cursor = RngCursor::new(format!("name:{}", ctx.area_id));
        let adjective = Self::pick(&mut cursor, Self::adjectives_for(ctx.distance));
        let noun = Self::pick(&mut cursor, Self::nouns_for(&ctx.features));
        let name = format!("{adjective} {noun}");
        if ctx.neighbor_names.iter().any(|n| *n == name) {
            // Avoid twin names next door.
            Some(format!("{name} {}", ctx.distance))
        } else {
            Some(name)
        }
    }
}
