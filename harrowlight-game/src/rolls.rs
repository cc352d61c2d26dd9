//! Dice roll resolution.
use rand::Rng;

use crate::data::{DiceSpec, Roll, RollTarget, StringOrList};
use crate::state::PlayerState;

/// Die used when a roll omits its dice spec or the spec fails to parse.
pub const DEFAULT_DIE_SIDES: i32 = 20;

/// Comparison applied between the roll value and the resolved target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollComparison {
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
}

impl RollComparison {
    /// Parse the comparator tag. An absent tag means strictly greater;
    /// an unrecognized tag settles on greater-or-equal.
    #[must_use]
    pub fn parse(tag: Option<&str>) -> Self {
        match tag {
            None | Some("gt") => Self::GreaterThan,
            Some("lte") => Self::LessOrEqual,
            Some(_) => Self::GreaterOrEqual,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
        }
    }

    #[must_use]
    pub const fn compare(self, value: i32, target: i32) -> bool {
        match self {
            Self::GreaterThan => value > target,
            Self::LessOrEqual => value <= target,
            Self::GreaterOrEqual => value >= target,
        }
    }
}

/// Number of sides encoded by a dice spec. Only one die is ever thrown,
/// so the count part of an `"NdS"` expression is discarded.
#[must_use]
pub fn dice_sides(spec: Option<&DiceSpec>) -> i32 {
    match spec {
        None => DEFAULT_DIE_SIDES,
        Some(DiceSpec::Sides(sides)) if *sides > 0 => *sides,
        Some(DiceSpec::Sides(_)) => DEFAULT_DIE_SIDES,
        Some(DiceSpec::Expr(expr)) => expr
            .split_once(['d', 'D'])
            .and_then(|(_, sides)| sides.trim().parse::<i32>().ok())
            .filter(|sides| *sides > 0)
            .unwrap_or(DEFAULT_DIE_SIDES),
    }
}

/// Result of resolving a roll: the success flag, a player-facing summary,
/// and the provisional destination spec. Destination candidate sets are
/// left uncollapsed; the transition resolver draws for them separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome<'a> {
    pub success: bool,
    pub summary: String,
    pub destination: &'a StringOrList,
}

/// Draw the die and resolve the roll against the current state.
pub fn resolve_roll<'a, R: Rng + ?Sized>(
    roll: &'a Roll,
    state: &PlayerState,
    rng: &mut R,
) -> RollOutcome<'a> {
    let sides = dice_sides(roll.dice.as_ref());
    let raw = rng.gen_range(1..=sides);
    resolve_with_raw(roll, state, raw)
}

/// Resolve a roll given an already-drawn raw die value. Deterministic:
/// the same draw always yields the same outcome and summary.
#[must_use]
pub fn resolve_with_raw<'a>(roll: &'a Roll, state: &PlayerState, raw: i32) -> RollOutcome<'a> {
    let bonus = roll
        .bonus_stat
        .as_deref()
        .map(|stat| (stat, state.attribute(stat)));
    let value = raw + bonus.map_or(0, |(_, bonus)| bonus);
    let target = match &roll.target {
        RollTarget::Value(target) => *target,
        RollTarget::Stat(stat) => state.attribute(stat),
    };
    let comparison = RollComparison::parse(roll.condition.as_deref());
    let success = comparison.compare(value, target);
    let verdict = if success { "success" } else { "failure" };
    let summary = match bonus {
        Some((stat, bonus)) => format!(
            "Rolled {raw} + {bonus} ({stat}) = {value} vs {target} ({}): {verdict}",
            comparison.symbol()
        ),
        None => format!(
            "Rolled {raw} vs {target} ({}): {verdict}",
            comparison.symbol()
        ),
    };
    let destination = if success {
        &roll.success_node
    } else {
        &roll.failure_node
    };
    RollOutcome {
        success,
        summary,
        destination,
    }
}
