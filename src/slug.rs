//! Slug generation for entity and topic page identifiers.
//!
//! Every page-bearing thing in a site (articles at all three levels, topics)
//! gets a URL-safe identifier derived from its title. Titles are free text
//! and frequently collide ("Notes", "Untitled", repeated section names), so
//! slugs are handed out by a single [`SlugGenerator`] that remembers every
//! slug it has produced during a run and disambiguates repeats with a
//! numeric suffix:
//!
//! ```text
//! "Demo Day"   → demo_day
//! "Demo Day"   → demo_day2
//! "Demo  Day!" → demo_day3
//! ```
//!
//! The generator is owned by the tree freeze pass and threaded through it
//! explicitly. It is never shared between runs, so slugs are stable for a
//! given content tree but carry no state across rebuilds.

use std::collections::HashMap;

/// Normalize a title into slug form.
///
/// - Lowercases the title
/// - Replaces every character outside `[a-z0-9]` with an underscore
/// - Collapses consecutive underscores into one
/// - Strips leading and trailing underscores
///
/// Normalization alone does not guarantee uniqueness; see [`SlugGenerator`].
pub fn normalize(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_underscore = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            prev_underscore = false;
        } else if !prev_underscore {
            slug.push('_');
            prev_underscore = true;
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// Hands out unique slugs for one generator lifetime.
///
/// The first title that normalizes to a given string gets the bare slug;
/// each later occurrence gets the next integer appended directly (no
/// separator), in first-seen order.
#[derive(Debug, Default)]
pub struct SlugGenerator {
    seen: HashMap<String, u32>,
}

impl SlugGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next unique slug for `title`.
    pub fn generate(&mut self, title: &str) -> String {
        let base = normalize(title);
        match self.seen.get_mut(&base) {
            Some(count) => {
                *count += 1;
                format!("{}{}", base, count)
            }
            None => {
                self.seen.insert(base.clone(), 1);
                base
            }
        }
    }
}
