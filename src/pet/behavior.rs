// Behavior transition model
//
// A Markov chain over animation names. Each capability combination has its own
// hand-authored table so every repertoire stays row-stochastic on its own,
// without renormalising around missing animations.

use super::action::{Action, INTERACT, MOVE, RELAX, SIT, SLEEP, SPECIAL};
use super::capability::CapabilitySet;
use crate::core::math::approx_equal;
use log::{debug, warn};
use rand::Rng;

/// How far a row's sum may stray from 1.0
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Chance of turning around when idle gives way to walking
pub const DEFAULT_TURN_PROBABILITY: f64 = 0.4;

/// Behavior model errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BehaviorError {
    #[error("Unknown animation state: {0}")]
    UnknownAnimationState(String),

    #[error("Transition row for {state} sums to {sum}, expected 1.0")]
    InvalidTransitionRow { state: String, sum: f64 },

    #[error("Malformed transition table: {0}")]
    MalformedTable(String),
}

/// The four capability combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repertoire {
    Default,
    Vehicle,
    NoSpecial,
    VehicleNoSpecial,
}

impl Repertoire {
    pub fn for_capabilities(caps: CapabilitySet) -> Self {
        match (caps.has_rest_state, caps.has_special) {
            (true, true) => Self::Default,
            (false, true) => Self::Vehicle,
            (true, false) => Self::NoSpecial,
            (false, false) => Self::VehicleNoSpecial,
        }
    }
}

/// Row-stochastic transition matrix over an ordered list of animation names
///
/// Rows are indexed by the current animation, columns by the next one. The
/// first name is the repertoire's idle entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TransitionTable {
    /// Build a table, checking that it is square over `names`
    ///
    /// Row sums are not checked here; sampling reports a bad row when it is
    /// actually used, and [`TransitionTable::validate`] checks all of them.
    pub fn new(names: &[&str], rows: Vec<Vec<f64>>) -> Result<Self, BehaviorError> {
        if names.is_empty() {
            return Err(BehaviorError::MalformedTable("no animation names".into()));
        }
        if rows.len() != names.len() {
            return Err(BehaviorError::MalformedTable(format!(
                "{} rows for {} names",
                rows.len(),
                names.len()
            )));
        }
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != names.len()) {
            return Err(BehaviorError::MalformedTable(format!(
                "row {} ({}) has {} columns, expected {}",
                index,
                names[index],
                row.len(),
                names.len()
            )));
        }

        Ok(Self::authored(names, rows))
    }

    /// Built-in tables are checked by tests instead of at runtime
    fn authored(names: &[&str], rows: Vec<Vec<f64>>) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            rows,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Idle entry (first name)
    pub fn idle(&self) -> &str {
        &self.names[0]
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Check that every row is a probability distribution
    pub fn validate(&self) -> Result<(), BehaviorError> {
        for index in 0..self.names.len() {
            self.checked_row(index)?;
        }
        Ok(())
    }

    fn checked_row(&self, index: usize) -> Result<&[f64], BehaviorError> {
        let row = &self.rows[index];
        let sum: f64 = row.iter().sum();
        if row.iter().any(|p| *p < 0.0) || !approx_equal(sum, 1.0, ROW_SUM_TOLERANCE) {
            return Err(BehaviorError::InvalidTransitionRow {
                state: self.names[index].clone(),
                sum,
            });
        }
        Ok(row)
    }

    /// Pick the next animation after `from` using a uniform draw in `[0, 1)`
    ///
    /// Returns the first column whose cumulative probability reaches `draw`.
    /// Zero-probability columns are never returned.
    pub fn sample(&self, from: &str, draw: f64) -> Result<&str, BehaviorError> {
        let index = self
            .index_of(from)
            .ok_or_else(|| BehaviorError::UnknownAnimationState(from.to_string()))?;
        let row = self.checked_row(index)?;

        let mut cumulative = 0.0;
        let mut chosen = None;
        for (column, &probability) in row.iter().enumerate() {
            if probability <= 0.0 {
                continue;
            }
            cumulative += probability;
            chosen = Some(column);
            if cumulative >= draw {
                break;
            }
        }

        // A draw just under 1.0 can outrun rounding in the cumulative sum;
        // the last reachable column takes it.
        chosen
            .map(|column| self.names[column].as_str())
            .ok_or_else(|| BehaviorError::InvalidTransitionRow {
                state: from.to_string(),
                sum: 0.0,
            })
    }
}

/// One transition table per capability combination
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTables {
    pub default: TransitionTable,
    pub vehicle: TransitionTable,
    pub no_special: TransitionTable,
    pub vehicle_no_special: TransitionTable,
}

impl TransitionTables {
    /// The stock tables shipped with the pet
    pub fn standard() -> Self {
        Self {
            default: TransitionTable::authored(
                &[RELAX, INTERACT, MOVE, SIT, SLEEP, SPECIAL],
                vec![
                    vec![0.5, 0.0, 0.2, 0.1, 0.1, 0.1],
                    vec![0.7, 0.0, 0.2, 0.05, 0.0, 0.05],
                    vec![0.5, 0.0, 0.4, 0.05, 0.0, 0.05],
                    vec![0.3, 0.0, 0.0, 0.5, 0.2, 0.0],
                    vec![0.2, 0.0, 0.0, 0.1, 0.7, 0.0],
                    vec![0.7, 0.0, 0.2, 0.0, 0.0, 0.1],
                ],
            ),
            vehicle: TransitionTable::authored(
                &[RELAX, INTERACT, MOVE, SPECIAL],
                vec![
                    vec![0.6, 0.0, 0.3, 0.1],
                    vec![0.7, 0.0, 0.25, 0.05],
                    vec![0.5, 0.0, 0.45, 0.05],
                    vec![0.7, 0.0, 0.2, 0.1],
                ],
            ),
            no_special: TransitionTable::authored(
                &[RELAX, INTERACT, MOVE, SIT, SLEEP],
                vec![
                    vec![0.55, 0.0, 0.25, 0.1, 0.1],
                    vec![0.7, 0.0, 0.2, 0.1, 0.0],
                    vec![0.5, 0.0, 0.4, 0.1, 0.0],
                    vec![0.3, 0.0, 0.0, 0.5, 0.2],
                    vec![0.2, 0.0, 0.0, 0.1, 0.7],
                ],
            ),
            vehicle_no_special: TransitionTable::authored(
                &[RELAX, INTERACT, MOVE],
                vec![
                    vec![0.6, 0.0, 0.4],
                    vec![0.7, 0.0, 0.3],
                    vec![0.5, 0.0, 0.5],
                ],
            ),
        }
    }

    pub fn get(&self, repertoire: Repertoire) -> &TransitionTable {
        match repertoire {
            Repertoire::Default => &self.default,
            Repertoire::Vehicle => &self.vehicle,
            Repertoire::NoSpecial => &self.no_special,
            Repertoire::VehicleNoSpecial => &self.vehicle_no_special,
        }
    }

    pub fn all(&self) -> [(Repertoire, &TransitionTable); 4] {
        [
            (Repertoire::Default, &self.default),
            (Repertoire::Vehicle, &self.vehicle),
            (Repertoire::NoSpecial, &self.no_special),
            (Repertoire::VehicleNoSpecial, &self.vehicle_no_special),
        ]
    }
}

impl Default for TransitionTables {
    fn default() -> Self {
        Self::standard()
    }
}

/// Samples the pet's next action when the current one completes
#[derive(Debug, Clone)]
pub struct BehaviorModel {
    tables: TransitionTables,
    turn_probability: f64,
}

impl BehaviorModel {
    pub fn new(tables: TransitionTables, turn_probability: f64) -> Self {
        Self {
            tables,
            turn_probability: turn_probability.clamp(0.0, 1.0),
        }
    }

    pub fn standard() -> Self {
        Self::new(TransitionTables::standard(), DEFAULT_TURN_PROBABILITY)
    }

    /// Table governing a character with these capabilities
    pub fn repertoire(&self, caps: CapabilitySet) -> &TransitionTable {
        self.tables.get(Repertoire::for_capabilities(caps))
    }

    /// Deterministic core of the transition step
    ///
    /// `draw` selects the next animation; `turn_draw` decides whether an
    /// idle-to-walk transition turns around. Both are uniform in `[0, 1)`.
    pub fn select_next_action_with(
        &self,
        current: &Action,
        caps: CapabilitySet,
        draw: f64,
        turn_draw: f64,
    ) -> Result<Action, BehaviorError> {
        let next = self.repertoire(caps).sample(&current.animation, draw)?;

        let mut facing = current.facing;
        if current.is(RELAX) && next == MOVE && turn_draw < self.turn_probability {
            facing = facing.flipped();
        }

        Ok(Action::new(next, facing))
    }

    pub fn select_next_action<R: Rng + ?Sized>(
        &self,
        current: &Action,
        caps: CapabilitySet,
        rng: &mut R,
    ) -> Result<Action, BehaviorError> {
        let draw = rng.gen::<f64>();
        let turn_draw = rng.gen::<f64>();
        self.select_next_action_with(current, caps, draw, turn_draw)
    }

    /// Sample the next action, degrading to idle on any error
    pub fn next_action_or_idle<R: Rng + ?Sized>(
        &self,
        current: &Action,
        caps: CapabilitySet,
        rng: &mut R,
    ) -> Action {
        match self.select_next_action(current, caps, rng) {
            Ok(next) => {
                debug!("Behavior: {} -> {} ({:?})", current.animation, next.animation, next.facing);
                next
            }
            Err(err) => {
                warn!("Behavior reset to idle: {}", err);
                Action::new(self.repertoire(caps).idle(), current.facing)
            }
        }
    }
}

impl Default for BehaviorModel {
    fn default() -> Self {
        Self::standard()
    }
}
