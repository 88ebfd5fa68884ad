//! Hidden-state graph: tag identities, topologies, and transition tables.

use std::fmt;

use bincode::{Decode, Encode};

use crate::errors::{NominatoError, Result};

/// Number of hidden states.
pub const NUM_STATES: usize = 6;

/// Default tolerance when checking that outgoing probabilities sum to one.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Identity of a hidden state.
///
/// The declaration order is the fixed enumeration order used wherever a
/// deterministic ordering matters, in particular for breaking ties between
/// equally probable predecessors during decoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Encode, Decode)]
#[repr(u8)]
pub enum StateId {
    /// Given name.
    FirstName,
    /// Connective particle attached to the given name.
    ParticleFirstName,
    /// First surname.
    LastName1,
    /// Connective particle attached to the first surname.
    ParticleLastName1,
    /// Second surname.
    LastName2,
    /// Connective particle attached to the second surname.
    ParticleLastName2,
}

impl StateId {
    /// All states in the fixed enumeration order.
    pub const ALL: [Self; NUM_STATES] = [
        Self::FirstName,
        Self::ParticleFirstName,
        Self::LastName1,
        Self::ParticleLastName1,
        Self::LastName2,
        Self::ParticleLastName2,
    ];

    /// Position of the state in the fixed enumeration order.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn from_index(i: usize) -> Self {
        Self::ALL[i]
    }

    /// Name of the state.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstName => "FirstName",
            Self::ParticleFirstName => "ParticleFirstName",
            Self::LastName1 => "LastName1",
            Self::ParticleLastName1 => "ParticleLastName1",
            Self::LastName2 => "LastName2",
            Self::ParticleLastName2 => "ParticleLastName2",
        }
    }

    /// Checks if the state tags a connective particle rather than a name
    /// word.
    pub const fn is_particle(self) -> bool {
        matches!(
            self,
            Self::ParticleFirstName | Self::ParticleLastName1 | Self::ParticleLastName2
        )
    }

    /// The structural field the state contributes to. Particle states
    /// contribute to their parent content state's field.
    pub const fn field(self) -> NameField {
        match self {
            Self::FirstName | Self::ParticleFirstName => NameField::FirstName,
            Self::LastName1 | Self::ParticleLastName1 => NameField::LastName1,
            Self::LastName2 | Self::ParticleLastName2 => NameField::LastName2,
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural output field of a decoded name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Encode, Decode)]
pub enum NameField {
    /// Given name.
    FirstName,
    /// First surname.
    LastName1,
    /// Second surname.
    LastName2,
}

impl NameField {
    /// All fields in slot order.
    pub const ALL: [Self; 3] = [Self::FirstName, Self::LastName1, Self::LastName2];

    /// The content state of the field.
    pub const fn content_state(self) -> StateId {
        match self {
            Self::FirstName => StateId::FirstName,
            Self::LastName1 => StateId::LastName1,
            Self::LastName2 => StateId::LastName2,
        }
    }

    /// The particle state attached to the field.
    pub const fn particle_state(self) -> StateId {
        match self {
            Self::FirstName => StateId::ParticleFirstName,
            Self::LastName1 => StateId::ParticleLastName1,
            Self::LastName2 => StateId::ParticleLastName2,
        }
    }
}

/// Fixed ordering of structural slots in the input names.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Encode, Decode)]
pub enum Topology {
    /// Sequences shaped `FirstName LastName1 LastName2`.
    #[default]
    ForenameFirst,
    /// Sequences shaped `LastName1 LastName2 FirstName`.
    SurnameFirst,
}

impl Topology {
    /// The default transition table of the topology, estimated from a
    /// large registry of names.
    pub fn default_transitions(self) -> TransitionTable {
        match self {
            Self::ForenameFirst => TransitionTable::forename_first(),
            Self::SurnameFirst => TransitionTable::surname_first(),
        }
    }
}

impl std::str::FromStr for Topology {
    type Err = &'static str;

    fn from_str(topology: &str) -> Result<Self, Self::Err> {
        match topology {
            "forename-first" => Ok(Self::ForenameFirst),
            "surname-first" => Ok(Self::SurnameFirst),
            _ => Err("Could not parse a topology"),
        }
    }
}

/// Transition probabilities between hidden states, including the START and
/// END pseudostates.
#[derive(Clone, Debug, Encode, Decode)]
pub struct TransitionTable {
    start: [f64; NUM_STATES],
    table: [[f64; NUM_STATES]; NUM_STATES],
    end: [f64; NUM_STATES],
}

impl TransitionTable {
    /// An all-zero table; fill it with [`Self::set`], [`Self::set_start`],
    /// and [`Self::set_end`].
    pub const fn empty() -> Self {
        Self {
            start: [0.0; NUM_STATES],
            table: [[0.0; NUM_STATES]; NUM_STATES],
            end: [0.0; NUM_STATES],
        }
    }

    /// The default table for forename-first sequences.
    pub fn forename_first() -> Self {
        use StateId::*;
        let mut t = Self::empty();
        t.set_start(FirstName, 1.0);
        t.set(FirstName, FirstName, 0.334);
        t.set(FirstName, ParticleFirstName, 0.010);
        t.set(FirstName, LastName1, 0.648);
        t.set(FirstName, ParticleLastName1, 0.008);
        t.set(ParticleFirstName, FirstName, 1.0);
        t.set(LastName1, LastName1, 0.010);
        t.set(LastName1, ParticleLastName1, 0.010);
        t.set(LastName1, LastName2, 0.945);
        t.set(LastName1, ParticleLastName2, 0.001);
        t.set_end(LastName1, 0.034);
        t.set(ParticleLastName1, LastName1, 1.0);
        t.set(LastName2, LastName2, 0.004);
        t.set(LastName2, ParticleLastName2, 0.004);
        t.set_end(LastName2, 0.992);
        t.set(ParticleLastName2, LastName2, 1.0);
        t
    }

    /// The default table for surname-first sequences.
    pub fn surname_first() -> Self {
        use StateId::*;
        let mut t = Self::empty();
        t.set_start(LastName1, 0.990);
        t.set_start(ParticleLastName1, 0.010);
        t.set(LastName1, LastName1, 0.010);
        t.set(LastName1, ParticleLastName1, 0.010);
        t.set(LastName1, LastName2, 0.945);
        t.set(LastName1, ParticleLastName2, 0.001);
        t.set(LastName1, FirstName, 0.034);
        t.set(ParticleLastName1, LastName1, 1.0);
        t.set(LastName2, LastName2, 0.004);
        t.set(LastName2, ParticleLastName2, 0.004);
        t.set(LastName2, FirstName, 0.992);
        t.set(ParticleLastName2, LastName2, 1.0);
        t.set(FirstName, FirstName, 0.334);
        t.set(FirstName, ParticleFirstName, 0.010);
        t.set_end(FirstName, 0.656);
        t.set(ParticleFirstName, FirstName, 1.0);
        t
    }

    /// Sets the probability of the transition `from -> to`.
    pub fn set(&mut self, from: StateId, to: StateId, prob: f64) {
        self.table[from.index()][to.index()] = prob;
    }

    /// Sets the probability of the transition `START -> to`.
    pub fn set_start(&mut self, to: StateId, prob: f64) {
        self.start[to.index()] = prob;
    }

    /// Sets the probability of the transition `from -> END`.
    pub fn set_end(&mut self, from: StateId, prob: f64) {
        self.end[from.index()] = prob;
    }

    /// Gets the probability of the transition `from -> to`.
    pub const fn prob(&self, from: StateId, to: StateId) -> f64 {
        self.table[from.index()][to.index()]
    }

    /// Gets the probability of the transition `START -> to`.
    pub const fn start(&self, to: StateId) -> f64 {
        self.start[to.index()]
    }

    /// Gets the probability of the transition `from -> END`.
    pub const fn end(&self, from: StateId) -> f64 {
        self.end[from.index()]
    }

    pub(crate) const fn start_probs(&self) -> &[f64; NUM_STATES] {
        &self.start
    }

    pub(crate) const fn probs(&self) -> &[[f64; NUM_STATES]; NUM_STATES] {
        &self.table
    }

    pub(crate) const fn end_probs(&self) -> &[f64; NUM_STATES] {
        &self.end
    }

    /// Checks that the outgoing probabilities of START and of every state
    /// sum to one within `tolerance`.
    ///
    /// # Errors
    ///
    /// [`NominatoError::MalformedGraph`] names the offending state.
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        let start_sum: f64 = self.start.iter().sum();
        if (start_sum - 1.0).abs() > tolerance {
            return Err(NominatoError::malformed_graph("START", start_sum));
        }
        for state in StateId::ALL {
            let i = state.index();
            let sum = self.table[i].iter().sum::<f64>() + self.end[i];
            if (sum - 1.0).abs() > tolerance {
                return Err(NominatoError::malformed_graph(state.name(), sum));
            }
        }
        Ok(())
    }
}

/// A validated state graph: a topology plus its transition table.
#[derive(Clone, Debug)]
pub struct StateGraph {
    topology: Topology,
    transitions: TransitionTable,
}

impl StateGraph {
    /// Builds a graph after validating the table within
    /// [`DEFAULT_TOLERANCE`].
    ///
    /// # Errors
    ///
    /// [`NominatoError::MalformedGraph`] when a row of outgoing
    /// probabilities does not sum to one.
    pub fn new(topology: Topology, transitions: TransitionTable) -> Result<Self> {
        Self::with_tolerance(topology, transitions, DEFAULT_TOLERANCE)
    }

    /// Builds a graph with an explicit validation tolerance.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn with_tolerance(
        topology: Topology,
        transitions: TransitionTable,
        tolerance: f64,
    ) -> Result<Self> {
        transitions.validate(tolerance)?;
        Ok(Self {
            topology,
            transitions,
        })
    }

    /// Gets the topology.
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Gets the reference to the transition table.
    pub const fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_are_valid() {
        for topology in [Topology::ForenameFirst, Topology::SurnameFirst] {
            let graph = StateGraph::new(topology, topology.default_transitions());
            assert!(graph.is_ok(), "{topology:?}");
        }
    }

    #[test]
    fn test_malformed_row_is_rejected() {
        let mut table = TransitionTable::forename_first();
        table.set(StateId::LastName2, StateId::LastName2, 0.5);
        let result = StateGraph::new(Topology::ForenameFirst, table);
        assert!(matches!(result, Err(NominatoError::MalformedGraph(_))));
    }

    #[test]
    fn test_malformed_start_is_rejected() {
        let mut table = TransitionTable::forename_first();
        table.set_start(StateId::LastName1, 0.5);
        let result = StateGraph::new(Topology::ForenameFirst, table);
        assert!(matches!(result, Err(NominatoError::MalformedGraph(_))));
    }

    #[test]
    fn test_tolerance_allows_tiny_drift() {
        let mut table = TransitionTable::forename_first();
        table.set_start(StateId::FirstName, 1.0 - 1e-8);
        assert!(StateGraph::new(Topology::ForenameFirst, table).is_ok());
    }

    #[test]
    fn test_state_ordering_is_stable() {
        for (i, state) in StateId::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
            assert_eq!(StateId::from_index(i), *state);
        }
    }

    #[test]
    fn test_particle_states_map_to_parent_fields() {
        assert_eq!(StateId::ParticleLastName1.field(), NameField::LastName1);
        assert_eq!(NameField::LastName1.particle_state(), StateId::ParticleLastName1);
        assert!(StateId::ParticleLastName1.is_particle());
        assert!(!StateId::LastName1.is_particle());
    }
}
