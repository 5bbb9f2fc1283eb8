//! Default feed content
//!
//! Every post is rolled from its own seeded RNG, so a session seed fully
//! determines the feed regardless of the order posts are generated in.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Mood of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PostKind {
    #[default]
    Neutral,
    Positive,
    Negative,
    /// Rare; liking one grants a grace window after it scrolls past
    Gold,
}

impl PostKind {
    pub const ALL: [PostKind; 4] = [
        PostKind::Neutral,
        PostKind::Positive,
        PostKind::Negative,
        PostKind::Gold,
    ];

    /// Map a uniform roll in [0, 1) onto the kind weights (10 / 30 / 30 / 30)
    pub fn from_roll(roll: f32) -> Self {
        if roll < 0.10 {
            PostKind::Gold
        } else if roll < 0.40 {
            PostKind::Positive
        } else if roll < 0.70 {
            PostKind::Negative
        } else {
            PostKind::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Neutral => "Neutral",
            PostKind::Positive => "Positive",
            PostKind::Negative => "Negative",
            PostKind::Gold => "Gold",
        }
    }
}

/// Overlay applied to a post by gameplay effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PostSpecial {
    #[default]
    None,
    Cat,
    Fire,
    Ice,
    SnoopDog,
}

impl PostSpecial {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostSpecial::None => "",
            PostSpecial::Cat => "Cat",
            PostSpecial::Fire => "Fire",
            PostSpecial::Ice => "Ice",
            PostSpecial::SnoopDog => "SnoopDog",
        }
    }
}

/// One feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Logical index in the feed
    pub index: usize,
    pub kind: PostKind,
    pub special: PostSpecial,
}

impl Post {
    pub fn new(index: usize, kind: PostKind) -> Self {
        Self {
            index,
            kind,
            special: PostSpecial::None,
        }
    }

    /// Roll post `index` of the session seeded with `session_seed`
    pub fn generate(session_seed: u64, index: usize) -> Self {
        let seed = session_seed.wrapping_add((index as u64).wrapping_mul(777));
        let mut rng = Pcg32::seed_from_u64(seed);
        Self::new(index, PostKind::from_roll(rng.random::<f32>()))
    }

    pub fn set_special(&mut self, special: PostSpecial) {
        self.special = special;
    }

    pub fn is_special(&self) -> bool {
        self.special != PostSpecial::None
    }

    /// Text shown on the post
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.kind.as_str())?;
        if self.is_special() {
            write!(f, " [{}]", self.special.as_str())?;
        }
        Ok(())
    }
}

/// Generate the first `count` posts of a session
pub fn feed(session_seed: u64, count: usize) -> Vec<Post> {
    (0..count).map(|i| Post::generate(session_seed, i)).collect()
}
