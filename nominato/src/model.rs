//! Trained tagging models: accumulation of corpora, freezing, and
//! persistence.

pub mod distribution;
pub mod graph;

use std::io::{Read, Write};

use bincode::{Decode, Encode};
use hashbrown::HashMap;

use crate::errors::{NominatoError, Result};
use crate::model::distribution::{
    Distribution, SmoothingStrategy, ZeroFill, vocabulary_union,
};
use crate::model::graph::{
    DEFAULT_TOLERANCE, NUM_STATES, NameField, StateGraph, StateId, Topology, TransitionTable,
};
use crate::tokenizer::{Symbol, Tokenizer, TokenizerConfig};

/// Magic bytes identifying a serialized Nominato model file.
pub const MODEL_MAGIC: &[u8] = b"NominatoTagger 0.1\n";

const MODEL_MAGIC_LEN: usize = MODEL_MAGIC.len();

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Serialized payload of a model.
#[derive(Debug, Encode, Decode)]
struct ModelData {
    tokenizer: TokenizerConfig,
    topology: Topology,
    transitions: TransitionTable,
    tolerance: f64,
    vocabulary: Vec<String>,
    // One row per state in StateId order, one column per vocabulary entry.
    emissions: Vec<Vec<f64>>,
}

/// An immutable trained model: a state graph plus per-state emission
/// distributions over a shared vocabulary.
///
/// A model is constructed once, by [`ModelBuilder::build`] or
/// [`Model::read`], and is read-only afterwards, so it can be shared
/// freely across decoding threads.
#[derive(Debug)]
pub struct Model {
    data: ModelData,
    symbol_ids: HashMap<String, u32>,
    log_emissions: Vec<Vec<f64>>,
    log_start: [f64; NUM_STATES],
    log_transitions: [[f64; NUM_STATES]; NUM_STATES],
    log_end: [f64; NUM_STATES],
}

impl Model {
    fn freeze(data: ModelData) -> Self {
        let symbol_ids = data
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as u32))
            .collect();
        let log_emissions = data
            .emissions
            .iter()
            .map(|row| row.iter().map(|&p| p.ln()).collect())
            .collect();

        let mut log_start = [f64::NEG_INFINITY; NUM_STATES];
        let mut log_transitions = [[f64::NEG_INFINITY; NUM_STATES]; NUM_STATES];
        let mut log_end = [f64::NEG_INFINITY; NUM_STATES];
        for i in 0..NUM_STATES {
            log_start[i] = data.transitions.start_probs()[i].ln();
            log_end[i] = data.transitions.end_probs()[i].ln();
            for j in 0..NUM_STATES {
                log_transitions[i][j] = data.transitions.probs()[i][j].ln();
            }
        }

        Self {
            data,
            symbol_ids,
            log_emissions,
            log_start,
            log_transitions,
            log_end,
        }
    }

    /// Gets the topology of the model.
    pub const fn topology(&self) -> Topology {
        self.data.topology
    }

    /// Gets the reference to the transition table.
    pub const fn transitions(&self) -> &TransitionTable {
        &self.data.transitions
    }

    /// Gets the reference to the tokenizer configuration the model was
    /// trained with.
    pub const fn tokenizer_config(&self) -> &TokenizerConfig {
        &self.data.tokenizer
    }

    /// Gets the shared vocabulary, sorted.
    pub fn vocabulary(&self) -> &[String] {
        &self.data.vocabulary
    }

    /// Probability that `state` emits `symbol`; exactly zero when the
    /// symbol is outside the state's extended distribution.
    pub fn emission(&self, state: StateId, symbol: &str) -> f64 {
        self.symbol_ids
            .get(symbol)
            .map_or(0.0, |&id| self.data.emissions[state.index()][id as usize])
    }

    pub(crate) fn symbol_id(&self, symbol: &str) -> Option<u32> {
        self.symbol_ids.get(symbol).copied()
    }

    #[inline(always)]
    pub(crate) fn log_emission(&self, state: usize, symbol_id: usize) -> f64 {
        self.log_emissions[state][symbol_id]
    }

    #[inline(always)]
    pub(crate) fn log_start(&self, state: usize) -> f64 {
        self.log_start[state]
    }

    #[inline(always)]
    pub(crate) fn log_transition(&self, from: usize, to: usize) -> f64 {
        self.log_transitions[from][to]
    }

    #[inline(always)]
    pub(crate) fn log_end(&self, state: usize) -> f64 {
        self.log_end[state]
    }

    /// Serializes the model into `wtr`.
    ///
    /// Probabilities are written bit-exactly, so a read round-trips to the
    /// same model.
    ///
    /// # Errors
    ///
    /// [`NominatoError`] is returned on I/O or encoding failures.
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(MODEL_MAGIC)?;
        bincode::encode_into_std_write(&self.data, &mut wtr, bincode_config())?;
        log::debug!(
            "wrote model ({} symbols, {:?})",
            self.data.vocabulary.len(),
            self.data.topology
        );
        Ok(())
    }

    /// Deserializes a model from `rdr`.
    ///
    /// # Errors
    ///
    /// [`NominatoError`] is returned when the magic bytes do not match,
    /// the payload is truncated or inconsistent, or reading fails.
    pub fn read<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut magic = [0u8; MODEL_MAGIC_LEN];
        rdr.read_exact(&mut magic)?;
        if magic != MODEL_MAGIC {
            return Err(NominatoError::invalid_format(
                "model",
                "unrecognized magic bytes",
            ));
        }
        let data: ModelData = bincode::decode_from_std_read(&mut rdr, bincode_config())?;
        if data.emissions.len() != NUM_STATES
            || data
                .emissions
                .iter()
                .any(|row| row.len() != data.vocabulary.len())
        {
            return Err(NominatoError::invalid_format(
                "model",
                "emission rows do not match the vocabulary",
            ));
        }
        data.transitions.validate(data.tolerance)?;
        log::debug!(
            "read model ({} symbols, {:?})",
            data.vocabulary.len(),
            data.topology
        );
        Ok(Self::freeze(data))
    }
}

/// Accounting rule for corpora that attribute one frequency to both
/// surname slots at once.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SharedCountPolicy {
    /// Adds the shared weight to the numerators of both surname states.
    #[default]
    CountIntoBoth,
    /// Drops shared counts entirely.
    Ignore,
}

/// Accumulates frequency-labeled corpora and freezes them into a
/// [`Model`].
pub struct ModelBuilder {
    tokenizer: Tokenizer,
    topology: Topology,
    transitions: Option<TransitionTable>,
    counts: [HashMap<String, f64>; NUM_STATES],
    shared_policy: SharedCountPolicy,
    smoothing: Box<dyn SmoothingStrategy>,
    tolerance: f64,
}

impl ModelBuilder {
    /// Creates a new builder.
    ///
    /// # Errors
    ///
    /// [`NominatoError::InvalidArgument`] when the tokenizer configuration
    /// is rejected.
    pub fn new(config: TokenizerConfig, topology: Topology) -> Result<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new(config)?,
            topology,
            transitions: None,
            counts: std::array::from_fn(|_| HashMap::new()),
            shared_policy: SharedCountPolicy::default(),
            smoothing: Box::new(ZeroFill),
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    /// Replaces the topology's default transition table.
    pub fn transitions(mut self, table: TransitionTable) -> Self {
        self.transitions = Some(table);
        self
    }

    /// Replaces the zero-fill vocabulary extension with another smoothing
    /// strategy.
    pub fn smoothing<S>(mut self, strategy: S) -> Self
    where
        S: SmoothingStrategy + 'static,
    {
        self.smoothing = Box::new(strategy);
        self
    }

    /// Sets the accounting rule for shared surname counts.
    pub fn shared_count_policy(mut self, policy: SharedCountPolicy) -> Self {
        self.shared_policy = policy;
        self
    }

    /// Sets the validation tolerance for the transition table.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Adds one corpus entry: a text whose words all belong to `field`,
    /// weighted by `weight`.
    ///
    /// Particle phrases inside the text feed the field's particle state;
    /// name words feed its content state.
    pub fn add_entry(&mut self, field: NameField, text: &str, weight: f64) {
        let obs = self.tokenizer.tokenize(text);
        for token in obs.tokens() {
            let state = match token.symbol() {
                Symbol::Particle(_) => field.particle_state(),
                Symbol::Suffix(_) => field.content_state(),
            };
            *self.counts[state.index()]
                .entry(token.symbol().as_str().to_string())
                .or_insert(0.0) += weight;
        }
    }

    /// Adds a surname entry whose frequency is attributed to both surname
    /// slots at once, according to the configured [`SharedCountPolicy`].
    pub fn add_shared_surname(&mut self, text: &str, weight: f64) {
        match self.shared_policy {
            SharedCountPolicy::CountIntoBoth => {
                self.add_entry(NameField::LastName1, text, weight);
                self.add_entry(NameField::LastName2, text, weight);
            }
            SharedCountPolicy::Ignore => {}
        }
    }

    /// Seeds every particle state with the configured particle set at the
    /// given weight, so a corpus without particle occurrences still yields
    /// a usable particle distribution.
    pub fn seed_particles(&mut self, weight: f64) {
        let phrases: Vec<String> = self.tokenizer.particle_phrases().collect();
        for field in NameField::ALL {
            let counts = &mut self.counts[field.particle_state().index()];
            for phrase in &phrases {
                *counts.entry(phrase.clone()).or_insert(0.0) += weight;
            }
        }
    }

    /// Freezes the accumulated corpora into an immutable [`Model`].
    ///
    /// All six per-state distributions are estimated, the shared
    /// vocabulary is formed as the union of their supports, and every
    /// distribution is extended over it by the smoothing strategy.
    ///
    /// # Errors
    ///
    /// - [`NominatoError::EmptyCorpus`] when a state has zero total
    ///   weight.
    /// - [`NominatoError::MalformedGraph`] when the transition table is
    ///   rejected.
    /// - [`NominatoError::InvalidArgument`] when a weight is invalid.
    pub fn build(self) -> Result<Model> {
        let Self {
            tokenizer,
            topology,
            transitions,
            counts,
            shared_policy: _,
            smoothing,
            tolerance,
        } = self;

        let table = transitions.unwrap_or_else(|| topology.default_transitions());
        let graph = StateGraph::with_tolerance(topology, table, tolerance)?;

        let mut dists = Vec::with_capacity(NUM_STATES);
        for (state, state_counts) in StateId::ALL.iter().zip(counts) {
            dists.push(Distribution::estimate(state.name(), state_counts)?);
        }
        let vocabulary = vocabulary_union(&dists);
        let emissions: Vec<Vec<f64>> = dists
            .iter()
            .map(|d| smoothing.emission_row(d, &vocabulary))
            .collect();
        log::info!(
            "built model: {} symbols in the shared vocabulary, {:?}",
            vocabulary.len(),
            graph.topology()
        );

        Ok(Model::freeze(ModelData {
            tokenizer: tokenizer.config().clone(),
            topology: graph.topology(),
            transitions: graph.transitions().clone(),
            tolerance,
            vocabulary,
            emissions,
        }))
    }
}
