//! # Nominato
//!
//! Nominato is a tagger for unstructured personal-name strings based on
//! the viterbi algorithm. It assigns a structural role — given name,
//! first surname, second surname, or a connective particle such as
//! `"de la"` — to every word of a name, using a discrete hidden Markov
//! model trained on frequency data.
//!
//! ## Examples
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nominato::{ModelBuilder, NameField, StateId, Tagger, TokenizerConfig, Topology};
//!
//! let mut builder = ModelBuilder::new(TokenizerConfig::default(), Topology::ForenameFirst)?;
//! builder.add_entry(NameField::FirstName, "maria", 6.0);
//! builder.add_entry(NameField::FirstName, "jose", 4.0);
//! builder.add_entry(NameField::LastName1, "de la torre", 5.0);
//! builder.add_entry(NameField::LastName2, "garcia", 5.0);
//! builder.seed_particles(1.0);
//! let model = builder.build()?;
//!
//! let tagger = Tagger::new(model)?;
//! let mut worker = tagger.new_worker();
//!
//! worker.reset_name("José de la Torre García");
//! worker.tag()?;
//! assert_eq!(
//!     worker.states(),
//!     [
//!         StateId::FirstName,
//!         StateId::ParticleLastName1,
//!         StateId::LastName1,
//!         StateId::LastName2,
//!     ]
//! );
//!
//! let fields = worker.fields();
//! assert_eq!(fields.first_name, "jose");
//! assert_eq!(fields.last_name_1, "de la torre");
//! assert_eq!(fields.last_name_2, "garcia");
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod errors;
pub mod evaluate;
pub mod model;
pub mod tagger;
pub mod tokenizer;

pub use evaluate::{Outcome, Summary, TaggedExample, evaluate};
pub use model::distribution::{Additive, Distribution, SmoothingStrategy, ZeroFill};
pub use model::graph::{NameField, StateGraph, StateId, Topology, TransitionTable};
pub use model::{Model, ModelBuilder, SharedCountPolicy};
pub use tagger::Tagger;
pub use tagger::worker::{Fields, Worker};
pub use tokenizer::{CaseFold, Observation, Symbol, Tokenizer, TokenizerConfig};

/// Version number of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
