//! Keyword classification of exercise names
//!
//! Every classification is an ordered rule table evaluated top to bottom;
//! the first rule with a matching keyword wins. Keywords match at the start
//! of a word, so "row" hits "Barbell Row" but not "Narrow-Grip Bench".

use crate::models::{MovementPattern, Tier};

/// One (predicate, result) entry of an ordered rule table
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<T> {
  pub keywords: &'static [&'static str],
  pub result: T,
}

impl<T: Copy> KeywordRule<T> {
  pub fn matches(&self, normalized: &str) -> bool {
    self.keywords.iter().any(|kw| contains_word_start(normalized, kw))
  }
}

/// Lowercase, punctuation to spaces, whitespace collapsed
pub fn normalize_name(name: &str) -> String {
  name
    .to_lowercase()
    .chars()
    .map(|c| if c.is_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

fn contains_word_start(haystack: &str, keyword: &str) -> bool {
  haystack
    .match_indices(keyword)
    .any(|(i, _)| i == 0 || haystack.as_bytes()[i - 1] == b' ')
}

/// Evaluate a rule table against an exercise name
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], name: &str) -> Option<T> {
  let normalized = normalize_name(name);
  rules.iter().find(|r| r.matches(&normalized)).map(|r| r.result)
}

/// ---------------------------------------------------------------------------
/// Movement Pattern
/// ---------------------------------------------------------------------------

/// Precedence matters:
/// - carries first ("farmer" names are otherwise unclassifiable)
/// - upright row is a vertical push, checked before any row keyword
/// - hinge before squat so "Romanian deadlift" and "sumo deadlift" stay hinges
/// - lunge before squat so "split squat" is a lunge
/// - vertical pull before horizontal pull so "pull-up" never falls to "row"
pub const MOVEMENT_RULES: &[KeywordRule<MovementPattern>] = &[
  KeywordRule {
    keywords: &["carry", "farmer", "suitcase walk", "yoke", "waiter walk"],
    result: MovementPattern::Carry,
  },
  KeywordRule {
    keywords: &["upright row"],
    result: MovementPattern::PushVert,
  },
  KeywordRule {
    keywords: &[
      "deadlift", "rdl", "romanian", "good morning", "hip thrust", "glute bridge", "swing",
      "hinge", "back extension", "hyperextension", "pull through",
    ],
    result: MovementPattern::Hinge,
  },
  KeywordRule {
    keywords: &["lunge", "split squat", "bulgarian", "step up", "stepup", "pistol"],
    result: MovementPattern::Lunge,
  },
  KeywordRule {
    keywords: &["squat", "leg press", "hack", "wall sit", "thruster"],
    result: MovementPattern::Squat,
  },
  KeywordRule {
    keywords: &["pull up", "pullup", "chin up", "chinup", "pulldown", "pull down", "muscle up"],
    result: MovementPattern::PullVert,
  },
  KeywordRule {
    keywords: &["row", "face pull", "reverse fly", "rear delt", "inverted"],
    result: MovementPattern::PullHoriz,
  },
  KeywordRule {
    keywords: &[
      "overhead press", "shoulder press", "military press", "push press", "arnold press",
      "landmine press", "ohp", "z press", "handstand", "pike push",
    ],
    result: MovementPattern::PushVert,
  },
  KeywordRule {
    keywords: &[
      "bench", "chest press", "push up", "pushup", "dip", "fly", "flye", "floor press",
      "incline press", "decline press", "dumbbell press", "pec deck",
    ],
    result: MovementPattern::PushHoriz,
  },
];

/// Tag an exercise with its movement pattern
pub fn classify_movement(name: &str) -> MovementPattern {
  first_match(MOVEMENT_RULES, name).unwrap_or(MovementPattern::Unknown)
}

/// ---------------------------------------------------------------------------
/// Tier
/// ---------------------------------------------------------------------------

/// Prehab/mobility/core is checked first so "Plank" or "Face Pull" never
/// reads as a compound through a shared keyword
pub const TIER_RULES: &[KeywordRule<Tier>] = &[
  KeywordRule {
    keywords: &[
      "plank", "dead bug", "bird dog", "pallof", "face pull", "band pull apart",
      "external rotation", "internal rotation", "clamshell", "mobility", "stretch", "foam roll",
      "crunch", "sit up", "situp", "leg raise", "hollow", "russian twist", "ab wheel", "abs",
      "core", "prehab", "cat cow", "hip circle", "copenhagen", "tibialis", "y raise",
    ],
    result: Tier::Prehab,
  },
  KeywordRule {
    keywords: &[
      "squat", "deadlift", "rdl", "bench press", "overhead press", "military press",
      "shoulder press", "push press", "barbell row", "pendlay", "t bar row", "pull up",
      "pullup", "chin up", "chinup", "hip thrust", "lunge", "clean", "snatch", "leg press",
      "dip", "good morning",
    ],
    result: Tier::Compound,
  },
];

/// Compression tier; anything not prehab or compound is an accessory
pub fn classify_tier(name: &str) -> Tier {
  first_match(TIER_RULES, name).unwrap_or(Tier::Accessory)
}

/// ---------------------------------------------------------------------------
/// Unilateral
/// ---------------------------------------------------------------------------

const UNILATERAL_RULES: &[KeywordRule<bool>] = &[KeywordRule {
  keywords: &[
    "single arm", "single leg", "one arm", "one leg", "alternating", "unilateral", "split squat",
    "bulgarian", "lunge", "step up", "suitcase", "pistol",
  ],
  result: true,
}];

/// Each side is worked separately, roughly doubling time under tension
pub fn is_unilateral(name: &str) -> bool {
  first_match(UNILATERAL_RULES, name).unwrap_or(false)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
