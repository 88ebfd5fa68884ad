//! Viterbi-based tagging of observations.
pub(crate) mod lattice;
pub mod worker;

use std::sync::Arc;

use crate::errors::Result;
use crate::model::Model;
use crate::tagger::worker::Worker;
use crate::tokenizer::Tokenizer;

/// Tagger.
///
/// It wraps an immutable [`Model`] and hands out per-thread [`Worker`]s.
/// Cloning a tagger only clones the inner [`Arc`], so many workers can
/// decode concurrently against the same model.
#[derive(Clone)]
pub struct Tagger {
    model: Arc<Model>,
    tokenizer: Arc<Tokenizer>,
}

impl Tagger {
    /// Creates a new tagger.
    ///
    /// The model is moved into the tagger. If you need to share the model
    /// among multiple taggers, use [`Tagger::from_shared_model`].
    ///
    /// # Errors
    ///
    /// [`crate::errors::NominatoError`] is returned when the tokenizer
    /// configuration stored in the model is rejected.
    pub fn new(model: Model) -> Result<Self> {
        Self::from_shared_model(Arc::new(model))
    }

    /// Creates a new tagger from a shared model.
    ///
    /// This is useful for multi-threaded scenarios where multiple tagger
    /// instances need to share the same model data without reloading it.
    ///
    /// # Errors
    ///
    /// See [`Tagger::new`].
    pub fn from_shared_model(model: Arc<Model>) -> Result<Self> {
        let tokenizer = Tokenizer::new(model.tokenizer_config().clone())?;
        Ok(Self {
            model,
            tokenizer: Arc::new(tokenizer),
        })
    }

    /// Gets the reference to the model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Gets the reference to the tokenizer configured by the model.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Creates a new worker.
    pub fn new_worker(&self) -> Worker {
        Worker::new(self.clone())
    }
}
