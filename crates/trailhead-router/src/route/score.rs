/// Specificity scoring for compiled patterns
///
/// Every segment gets one integer; vectors are compared position by
/// position. Higher means "more specific, try first".
///
/// # Priority Order (per segment)
///
/// 1. **Root** `/` → 900
/// 2. **Static** → 800, plus up to 99 for longer literal text
/// 3. **Param with custom constraint** → 700
/// 4. **Plain param** → 600
/// 5. **Wildcard** (`.*` constraint) → 200
///
/// Optional segments lose 80, repeatable segments lose 200. Zero-or-more
/// segments (`:p*`) lose a further 400 so they land below zero; a pattern
/// ending in one then ranks after the same pattern without it.
use std::cmp::Ordering;
use std::fmt;

use super::pattern::{ParamToken, Token};

pub const ROOT: i32 = 900;
pub const STATIC: i32 = 800;
pub const STATIC_LENGTH_BONUS_MAX: i32 = 99;
pub const DYNAMIC: i32 = 600;
pub const BONUS_CUSTOM_CONSTRAINT: i32 = 100;
pub const BONUS_WILDCARD: i32 = -500;
pub const PENALTY_REPEATABLE: i32 = -200;
pub const PENALTY_OPTIONAL: i32 = -80;
pub const PENALTY_ZERO_OR_MORE: i32 = -400;

/// Ordered per-segment score of a compiled pattern
///
/// `Ord` ranks more specific scores as greater.
///
/// # Examples
///
/// ```
/// use trailhead_router::route::{pattern::tokenize, score::Score};
///
/// let fixed = Score::from_tokens(&tokenize("/users/new").unwrap());
/// let dynamic = Score::from_tokens(&tokenize("/users/:id").unwrap());
/// assert!(fixed > dynamic);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Score(Vec<i32>);

impl Score {
    /// Scores a token sequence (pure function)
    pub fn from_tokens(tokens: &[Token]) -> Self {
        if tokens.is_empty() {
            return Score(vec![ROOT]);
        }
        Score(tokens.iter().map(segment_score).collect())
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }
}

/// Score of a single segment
pub fn segment_score(token: &Token) -> i32 {
    match token {
        Token::Static(text) => {
            let bonus = i32::try_from(text.chars().count())
                .unwrap_or(STATIC_LENGTH_BONUS_MAX)
                .min(STATIC_LENGTH_BONUS_MAX);
            STATIC + bonus
        }
        Token::Param(param) => param_score(param),
    }
}

fn param_score(param: &ParamToken) -> i32 {
    let mut score = DYNAMIC;
    if param.constraint.is_some() {
        score += BONUS_CUSTOM_CONSTRAINT;
    }
    if param.is_wildcard() {
        score += BONUS_WILDCARD;
    }
    if param.repeatable {
        score += PENALTY_REPEATABLE;
    }
    if param.optional {
        score += PENALTY_OPTIONAL;
    }
    if param.optional && param.repeatable {
        score += PENALTY_ZERO_OR_MORE;
    }
    score
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        if let Some(decided) = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.cmp(b))
            .find(|ordering| ordering.is_ne())
        {
            return decided;
        }

        // One vector is a prefix of the other: the longer one is more
        // specific, unless its single extra segment is a zero-or-more wildcard.
        match self.0.len().cmp(&other.0.len()) {
            Ordering::Equal => Ordering::Equal,
            Ordering::Greater if ends_with_negative_extra(&self.0, &other.0) => Ordering::Less,
            Ordering::Greater => Ordering::Greater,
            Ordering::Less if ends_with_negative_extra(&other.0, &self.0) => Ordering::Greater,
            Ordering::Less => Ordering::Less,
        }
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn ends_with_negative_extra(longer: &[i32], shorter: &[i32]) -> bool {
    longer.len() == shorter.len() + 1 && longer.last().is_some_and(|last| *last < 0)
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(i32::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
