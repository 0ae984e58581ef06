//! Turn phases and the configured phase order.
//!
//! A turn is partitioned into ordered stages. [`Phase`] is the closed set of
//! stage tags; [`PhaseOrder`] is the subset a scheduler actually runs, in the
//! order it runs them.

use crate::error::ConfigError;

/// Named stage within a turn.
///
/// Tags are totally ordered by declaration: `Start < Move < Action < End`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Phase {
    /// Turn setup: spawns, status ticks, enemy intent selection.
    Start,
    /// Movement resolution.
    Move,
    /// Attacks, abilities, interactions.
    Action,
    /// Cleanup and end-of-turn triggers.
    End,
}

/// Which side is taking the current turn.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Side {
    #[default]
    Player,
    Enemy,
}

impl Side {
    /// Returns the opposing side.
    pub const fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Non-empty, strictly ascending sequence of phases run by a scheduler.
///
/// The order is validated on construction, so the index of a phase within
/// the order is consistent with the [`Phase`] ordering itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseOrder {
    phases: Box<[Phase]>,
}

impl PhaseOrder {
    /// Builds a phase order, rejecting empty or non-ascending input.
    pub fn new(phases: impl IntoIterator<Item = Phase>) -> Result<Self, ConfigError> {
        let phases: Vec<Phase> = phases.into_iter().collect();

        if phases.is_empty() {
            return Err(ConfigError::EmptyPhaseOrder);
        }

        for pair in phases.windows(2) {
            if pair[0] >= pair[1] {
                return Err(ConfigError::PhaseOrderNotAscending {
                    before: pair[0],
                    after: pair[1],
                });
            }
        }

        Ok(Self {
            phases: phases.into_boxed_slice(),
        })
    }

    /// Every phase tag, in declaration order.
    pub fn standard() -> Self {
        use strum::IntoEnumIterator;

        Self {
            phases: Phase::iter().collect(),
        }
    }

    pub fn first(&self) -> Phase {
        self.phases[0]
    }

    pub fn last(&self) -> Phase {
        self.phases[self.phases.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// A validated order is never empty.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Phase> {
        self.phases.get(index).copied()
    }

    /// Position of `phase` within this order, if it is part of it.
    pub fn index_of(&self, phase: Phase) -> Option<usize> {
        self.phases.binary_search(&phase).ok()
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.index_of(phase).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = Phase> + '_ {
        self.phases.iter().copied()
    }

    pub fn as_slice(&self) -> &[Phase] {
        &self.phases
    }
}

impl Default for PhaseOrder {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_totally_ordered() {
        assert!(Phase::Start < Phase::Move);
        assert!(Phase::Move < Phase::Action);
        assert!(Phase::Action < Phase::End);
    }

    #[test]
    fn parses_case_insensitive_names() {
        assert_eq!("move".parse::<Phase>().unwrap(), Phase::Move);
        assert_eq!("END".parse::<Phase>().unwrap(), Phase::End);
        assert_eq!(Phase::Action.to_string(), "action");
    }

    #[test]
    fn standard_order_contains_every_phase() {
        let order = PhaseOrder::standard();
        assert_eq!(
            order.as_slice(),
            &[Phase::Start, Phase::Move, Phase::Action, Phase::End]
        );
        assert_eq!(order.first(), Phase::Start);
        assert_eq!(order.last(), Phase::End);
    }

    #[test]
    fn subset_order_indexes_by_position() {
        let order = PhaseOrder::new([Phase::Start, Phase::Move, Phase::End]).unwrap();
        assert_eq!(order.index_of(Phase::End), Some(2));
        assert_eq!(order.index_of(Phase::Action), None);
        assert!(!order.contains(Phase::Action));
        assert_eq!(order.len(), 3);
        assert!(!order.is_empty());
    }

    #[test]
    fn rejects_empty_order() {
        assert!(matches!(
            PhaseOrder::new(Vec::<Phase>::new()),
            Err(ConfigError::EmptyPhaseOrder)
        ));
    }

    #[test]
    fn rejects_duplicates_and_descending_phases() {
        assert!(matches!(
            PhaseOrder::new([Phase::Move, Phase::Move]),
            Err(ConfigError::PhaseOrderNotAscending { .. })
        ));
        assert!(matches!(
            PhaseOrder::new([Phase::End, Phase::Start]),
            Err(ConfigError::PhaseOrderNotAscending {
                before: Phase::End,
                after: Phase::Start
            })
        ));
    }

    #[test]
    fn side_opponent_flips() {
        assert_eq!(Side::Player.opponent(), Side::Enemy);
        assert_eq!(Side::Enemy.opponent(), Side::Player);
    }
}
