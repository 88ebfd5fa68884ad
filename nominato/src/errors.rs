//! Definition of errors.

use std::error::Error;
use std::fmt;

/// A specialized Result type for Nominato.
pub type Result<T, E = NominatoError> = std::result::Result<T, E>;

/// The error type for Nominato.
#[derive(Debug, thiserror::Error)]
pub enum NominatoError {
    /// The error variant for [`MalformedGraphError`].
    #[error(transparent)]
    MalformedGraph(MalformedGraphError),

    /// The error variant for [`UnknownSymbolError`].
    #[error(transparent)]
    UnknownSymbol(UnknownSymbolError),

    /// The error variant for [`NoTerminalPathError`].
    #[error(transparent)]
    NoTerminalPath(NoTerminalPathError),

    /// The error variant for [`EmptyCorpusError`].
    #[error(transparent)]
    EmptyCorpus(EmptyCorpusError),

    /// The error variant for [`InvalidArgumentError`].
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// The error variant for [`InvalidFormatError`].
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// The error variant for [`std::io::Error`].
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The error variant for [`bincode::error::EncodeError`].
    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),

    /// The error variant for [`bincode::error::DecodeError`].
    #[error(transparent)]
    Decode(#[from] bincode::error::DecodeError),
}

impl NominatoError {
    pub(crate) fn malformed_graph(state: &'static str, sum: f64) -> Self {
        Self::MalformedGraph(MalformedGraphError { state, sum })
    }

    pub(crate) fn unknown_symbol<S>(position: usize, symbol: S) -> Self
    where
        S: Into<String>,
    {
        Self::UnknownSymbol(UnknownSymbolError {
            position,
            symbol: symbol.into(),
        })
    }

    pub(crate) fn no_terminal_path(position: usize) -> Self {
        Self::NoTerminalPath(NoTerminalPathError { position })
    }

    pub(crate) fn empty_corpus(corpus: &'static str) -> Self {
        Self::EmptyCorpus(EmptyCorpusError { corpus })
    }

    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }
}

/// Error used when the outgoing transition probabilities of a state do not
/// sum to one within the configured tolerance.
#[derive(Debug)]
pub struct MalformedGraphError {
    /// Name of the state whose outgoing probabilities are off.
    pub(crate) state: &'static str,

    /// The actual sum of the outgoing probabilities.
    pub(crate) sum: f64,
}

impl MalformedGraphError {
    /// Name of the state whose outgoing probabilities are off.
    pub const fn state(&self) -> &'static str {
        self.state
    }

    /// The actual sum of the outgoing probabilities.
    pub const fn sum(&self) -> f64 {
        self.sum
    }
}

impl fmt::Display for MalformedGraphError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MalformedGraphError: outgoing probabilities of {} sum to {}, not 1",
            self.state, self.sum
        )
    }
}

impl Error for MalformedGraphError {}

/// Error used when an observation contains a symbol with zero probability
/// in every state.
#[derive(Debug)]
pub struct UnknownSymbolError {
    /// Position of the offending symbol in the observation.
    pub(crate) position: usize,

    /// The offending symbol.
    pub(crate) symbol: String,
}

impl UnknownSymbolError {
    /// Position of the offending symbol in the observation.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The offending symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl fmt::Display for UnknownSymbolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "UnknownSymbolError: symbol {:?} at position {} has zero probability in every state",
            self.symbol, self.position
        )
    }
}

impl Error for UnknownSymbolError {}

/// Error used when every state path is eliminated before the end of the
/// observation is reached.
#[derive(Debug)]
pub struct NoTerminalPathError {
    /// Position at which the last surviving path was eliminated; equals the
    /// observation length when the paths die at the terminal step.
    pub(crate) position: usize,
}

impl NoTerminalPathError {
    /// Position at which the last surviving path was eliminated.
    pub const fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for NoTerminalPathError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "NoTerminalPathError: no surviving state path at position {}",
            self.position
        )
    }
}

impl Error for NoTerminalPathError {}

/// Error used when a training corpus has zero total frequency.
#[derive(Debug)]
pub struct EmptyCorpusError {
    /// Name of the corpus (the state it trains).
    pub(crate) corpus: &'static str,
}

impl EmptyCorpusError {
    /// Name of the corpus (the state it trains).
    pub const fn corpus(&self) -> &'static str {
        self.corpus
    }
}

impl fmt::Display for EmptyCorpusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "EmptyCorpusError: training corpus for {} has zero total frequency",
            self.corpus
        )
    }
}

impl Error for EmptyCorpusError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// Error used when the input format is invalid.
#[derive(Debug)]
pub struct InvalidFormatError {
    /// Name of the format.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}
