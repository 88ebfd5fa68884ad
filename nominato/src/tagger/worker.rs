//! Provider of a routine for tagging.

use crate::errors::{NominatoError, Result};
use crate::model::graph::{NameField, StateId};
use crate::tagger::Tagger;
use crate::tagger::lattice::Lattice;
use crate::tokenizer::Observation;

/// The three structural fields of a decoded name.
///
/// Particle words are attached to their content field, so a decoded
/// `"de la torre"` stays together in the surname it belongs to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Fields {
    /// Given name.
    pub first_name: String,

    /// First surname.
    pub last_name_1: String,

    /// Second surname.
    pub last_name_2: String,
}

impl Fields {
    /// Gets the value of one field.
    pub fn get(&self, field: NameField) -> &str {
        match field {
            NameField::FirstName => &self.first_name,
            NameField::LastName1 => &self.last_name_1,
            NameField::LastName2 => &self.last_name_2,
        }
    }

    fn push(&mut self, field: NameField, word: &str) {
        let dst = match field {
            NameField::FirstName => &mut self.first_name,
            NameField::LastName1 => &mut self.last_name_1,
            NameField::LastName2 => &mut self.last_name_2,
        };
        if !dst.is_empty() {
            dst.push(' ');
        }
        dst.push_str(word);
    }
}

/// Provider of a routine for tagging.
///
/// It holds the internal data structures used in decoding, which can be
/// reused to avoid unnecessary memory reallocation.
pub struct Worker {
    tagger: Tagger,
    obs: Observation,
    symbol_ids: Vec<u32>,
    lattice: Lattice,
    path: Vec<StateId>,
    log_prob: f64,
}

impl Worker {
    /// Creates a new instance.
    pub(crate) fn new(tagger: Tagger) -> Self {
        Self {
            tagger,
            obs: Observation::default(),
            symbol_ids: vec![],
            lattice: Lattice::default(),
            path: vec![],
            log_prob: f64::NEG_INFINITY,
        }
    }

    /// Gets the reference to the tagger the worker belongs to.
    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    /// Resets the input to the given raw name string, tokenizing it with
    /// the model's tokenizer.
    pub fn reset_name<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        let obs = self.tagger.tokenizer().tokenize(input.as_ref());
        self.reset_observation(obs);
    }

    /// Resets the input to an already tokenized observation.
    pub fn reset_observation(&mut self, obs: Observation) {
        self.obs = obs;
        self.symbol_ids.clear();
        self.path.clear();
        self.log_prob = f64::NEG_INFINITY;
    }

    /// Decodes the current observation into the most probable state path.
    ///
    /// On success the path is available through [`Self::states`] and the
    /// reconstructed fields through [`Self::fields`]. An empty observation
    /// yields an empty path. A failure leaves the worker reusable; the
    /// shared model is never affected.
    ///
    /// # Errors
    ///
    /// - [`NominatoError::UnknownSymbol`] when an observation symbol has
    ///   zero probability in every state, i.e. it is absent from the
    ///   shared vocabulary.
    /// - [`NominatoError::NoTerminalPath`] when every candidate path is
    ///   eliminated before the end of the observation.
    pub fn tag(&mut self) -> Result<()> {
        self.lookup_symbols()?;
        self.path.clear();
        if self.symbol_ids.is_empty() {
            self.log_prob = 0.0;
            return Ok(());
        }
        self.log_prob = self.lattice.viterbi(self.tagger.model(), &self.symbol_ids)?;
        self.lattice.backtrack(&mut self.path);
        Ok(())
    }

    /// Computes the total log-likelihood of the current observation over
    /// all state paths (forward algorithm), for confidence reporting.
    ///
    /// # Errors
    ///
    /// The same kinds as [`Self::tag`].
    pub fn log_likelihood(&mut self) -> Result<f64> {
        self.lookup_symbols()?;
        if self.symbol_ids.is_empty() {
            return Ok(0.0);
        }
        self.lattice.forward(self.tagger.model(), &self.symbol_ids)
    }

    fn lookup_symbols(&mut self) -> Result<()> {
        if self.symbol_ids.len() == self.obs.len() && !self.obs.is_empty() {
            return Ok(());
        }
        let model = self.tagger.model();
        self.symbol_ids.clear();
        for (i, token) in self.obs.tokens().iter().enumerate() {
            let symbol = token.symbol().as_str();
            match model.symbol_id(symbol) {
                Some(id) => self.symbol_ids.push(id),
                None => return Err(NominatoError::unknown_symbol(i, symbol)),
            }
        }
        Ok(())
    }

    /// Gets the observation currently set.
    pub fn observation(&self) -> &Observation {
        &self.obs
    }

    /// Gets the number of tokens of the current observation.
    pub fn num_tokens(&self) -> usize {
        self.obs.len()
    }

    /// Gets the decoded state path, one state per observation token.
    ///
    /// Empty until [`Self::tag`] succeeds.
    pub fn states(&self) -> &[StateId] {
        &self.path
    }

    /// Gets the decoded state of the `i`-th token.
    ///
    /// # Panics
    ///
    /// It will panic when [`Self::tag`] has not succeeded for the current
    /// input.
    pub fn state(&self, i: usize) -> StateId {
        self.path[i]
    }

    /// Gets the log-probability of the decoded path; negative infinity
    /// until [`Self::tag`] succeeds.
    pub fn path_log_prob(&self) -> f64 {
        self.log_prob
    }

    /// Reconstructs the three structural fields from the decoded path,
    /// attaching the words of particle tokens to their content field.
    pub fn fields(&self) -> Fields {
        let mut fields = Fields::default();
        for (token, state) in self.obs.tokens().iter().zip(&self.path) {
            for word in token.words() {
                fields.push(state.field(), word);
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::{Topology, TransitionTable};
    use crate::model::{Model, ModelBuilder};
    use crate::tokenizer::TokenizerConfig;

    #[track_caller]
    fn build_test_model(topology: Topology) -> Model {
        let mut builder = ModelBuilder::new(TokenizerConfig::default(), topology).unwrap();
        builder.add_entry(NameField::FirstName, "albe", 8.0);
        builder.add_entry(NameField::FirstName, "maria", 2.0);
        builder.add_entry(NameField::LastName1, "lopz", 6.0);
        builder.add_entry(NameField::LastName1, "de la torre", 1.0);
        builder.add_entry(NameField::LastName2, "garc", 5.0);
        builder.add_entry(NameField::LastName2, "torre", 1.0);
        builder.seed_particles(1.0);
        builder.build().unwrap()
    }

    #[track_caller]
    fn test_worker() -> Worker {
        Tagger::new(build_test_model(Topology::ForenameFirst))
            .unwrap()
            .new_worker()
    }

    #[test]
    fn test_forename_first_path() {
        let mut worker = test_worker();
        worker.reset_name("albe lopz garc");
        worker.tag().unwrap();
        assert_eq!(
            worker.states(),
            [StateId::FirstName, StateId::LastName1, StateId::LastName2]
        );
    }

    #[test]
    fn test_surname_first_path() {
        let model = build_test_model(Topology::SurnameFirst);
        let mut worker = Tagger::new(model).unwrap().new_worker();
        worker.reset_name("lopz garc albe");
        worker.tag().unwrap();
        assert_eq!(
            worker.states(),
            [StateId::LastName1, StateId::LastName2, StateId::FirstName]
        );
    }

    #[test]
    fn test_path_length_matches_observation() {
        let mut worker = test_worker();
        for name in ["albe lopz", "albe lopz garc", "albe albe lopz garc"] {
            worker.reset_name(name);
            worker.tag().unwrap();
            assert_eq!(worker.states().len(), worker.num_tokens(), "{name}");
        }
    }

    #[test]
    fn test_particle_words_stay_with_their_surname() {
        let mut worker = test_worker();
        worker.reset_name("Albe de la Torre GARC");
        worker.tag().unwrap();
        assert_eq!(
            worker.states(),
            [
                StateId::FirstName,
                StateId::ParticleLastName1,
                StateId::LastName1,
                StateId::LastName2,
            ]
        );
        let fields = worker.fields();
        assert_eq!(fields.first_name, "albe");
        assert_eq!(fields.get(NameField::LastName1), "de la torre");
        assert_eq!(fields.last_name_2, "garc");
    }

    #[test]
    fn test_unknown_symbol_is_reported_with_its_position() {
        let mut worker = test_worker();
        worker.reset_name("albe zzzz garc");
        match worker.tag() {
            Err(NominatoError::UnknownSymbol(e)) => {
                assert_eq!(e.position(), 1);
                assert_eq!(e.symbol(), "zzzz");
            }
            r => panic!("unexpected result: {r:?}"),
        }
    }

    #[test]
    fn test_one_word_name_has_no_terminal_path() {
        // The forename-first graph assigns no END mass to FirstName.
        let mut worker = test_worker();
        worker.reset_name("albe");
        assert!(matches!(
            worker.tag(),
            Err(NominatoError::NoTerminalPath(_))
        ));
    }

    #[test]
    fn test_failure_keeps_the_worker_reusable() {
        let mut worker = test_worker();
        worker.reset_name("albe zzzz");
        assert!(worker.tag().is_err());
        worker.reset_name("albe lopz garc");
        worker.tag().unwrap();
        assert_eq!(worker.states().len(), 3);
    }

    #[test]
    fn test_empty_name_yields_empty_path() {
        let mut worker = test_worker();
        worker.reset_name("");
        worker.tag().unwrap();
        assert!(worker.states().is_empty());
        assert_eq!(worker.fields(), Fields::default());
    }

    #[test]
    fn test_forward_likelihood_bounds_the_best_path() {
        let mut worker = test_worker();
        worker.reset_name("albe lopz garc");
        worker.tag().unwrap();
        let path_log_prob = worker.path_log_prob();
        let log_likelihood = worker.log_likelihood().unwrap();
        assert!(path_log_prob.is_finite());
        // The sum over all paths can never fall below the best path.
        assert!(log_likelihood >= path_log_prob - 1e-12);
    }

    #[test]
    fn test_single_state_symbols_decode_to_that_state() {
        // A table that lets LastName1 both start and end the sequence, so
        // a run of symbols seen only in that state's corpus stays there.
        let mut table = TransitionTable::empty();
        table.set_start(StateId::LastName1, 1.0);
        table.set(StateId::LastName1, StateId::LastName1, 0.5);
        table.set_end(StateId::LastName1, 0.5);
        table.set(StateId::FirstName, StateId::FirstName, 0.5);
        table.set_end(StateId::FirstName, 0.5);
        table.set(StateId::LastName2, StateId::LastName2, 0.5);
        table.set_end(StateId::LastName2, 0.5);
        table.set(StateId::ParticleFirstName, StateId::FirstName, 1.0);
        table.set(StateId::ParticleLastName1, StateId::LastName1, 1.0);
        table.set(StateId::ParticleLastName2, StateId::LastName2, 1.0);

        let mut builder =
            ModelBuilder::new(TokenizerConfig::default(), Topology::SurnameFirst).unwrap();
        builder.add_entry(NameField::FirstName, "albe", 1.0);
        builder.add_entry(NameField::LastName1, "lopz", 2.0);
        builder.add_entry(NameField::LastName1, "vega", 1.0);
        builder.add_entry(NameField::LastName2, "garc", 1.0);
        builder.seed_particles(1.0);
        let model = builder.transitions(table).build().unwrap();

        let mut worker = Tagger::new(model).unwrap().new_worker();
        worker.reset_name("lopz vega lopz");
        worker.tag().unwrap();
        assert_eq!(
            worker.states(),
            [StateId::LastName1, StateId::LastName1, StateId::LastName1]
        );
    }

    #[test]
    fn test_tie_breaks_keep_the_first_enumerated_predecessor() {
        // FirstName and LastName1 reach LastName2 with identical scores;
        // the decoder must keep FirstName, the first in StateId order.
        let mut table = TransitionTable::empty();
        table.set_start(StateId::FirstName, 0.5);
        table.set_start(StateId::LastName1, 0.5);
        table.set(StateId::FirstName, StateId::LastName2, 1.0);
        table.set(StateId::LastName1, StateId::LastName2, 1.0);
        table.set_end(StateId::LastName2, 1.0);
        table.set(StateId::ParticleFirstName, StateId::FirstName, 1.0);
        table.set(StateId::ParticleLastName1, StateId::LastName1, 1.0);
        table.set(StateId::ParticleLastName2, StateId::LastName2, 1.0);

        let mut builder =
            ModelBuilder::new(TokenizerConfig::default(), Topology::ForenameFirst).unwrap();
        builder.add_entry(NameField::FirstName, "x", 1.0);
        builder.add_entry(NameField::LastName1, "x", 1.0);
        builder.add_entry(NameField::LastName2, "y", 1.0);
        builder.seed_particles(1.0);
        let model = builder.transitions(table).build().unwrap();

        let mut worker = Tagger::new(model).unwrap().new_worker();
        worker.reset_name("x y");
        worker.tag().unwrap();
        assert_eq!(worker.states(), [StateId::FirstName, StateId::LastName2]);
    }
}
