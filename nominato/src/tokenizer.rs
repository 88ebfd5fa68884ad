//! Normalization and symbolization of raw name strings.

use bincode::{Decode, Encode};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::errors::{NominatoError, Result};

/// The default particle set, taken from Municipal Register data.
pub const DEFAULT_PARTICLES: &[&str] = &[
    "da", "de", "de la", "de las", "de los", "del", "di", "dl", "do", "dos", "el", "ep", "i",
    "la", "las", "los", "le", "san", "van",
];

/// The default word pattern: runs of letters, optionally joined by hyphens.
pub const DEFAULT_WORD_PATTERN: &str = "[A-Za-z]+(?:-[A-Za-z]+)*";

/// The default suffix length kept as the observable symbol of a name word.
pub const DEFAULT_SUFFIX_LEN: usize = 4;

/// Case transform applied after accent stripping.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Encode, Decode)]
pub enum CaseFold {
    /// Lower-cases the text.
    #[default]
    Lower,
    /// Upper-cases the text.
    Upper,
    /// Leaves the case untouched.
    None,
}

impl std::str::FromStr for CaseFold {
    type Err = &'static str;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "lower" => Ok(Self::Lower),
            "upper" => Ok(Self::Upper),
            "none" => Ok(Self::None),
            _ => Err("Could not parse a case mode"),
        }
    }
}

/// Configuration of a [`Tokenizer`].
#[derive(Clone, Debug, Encode, Decode)]
pub struct TokenizerConfig {
    /// Closed set of connective particle phrases, possibly multi-word.
    pub particles: Vec<String>,

    /// Number of trailing characters kept as the symbol of a name word.
    pub suffix_len: usize,

    /// Case transform applied during normalization.
    pub case: CaseFold,

    /// Regular expression matching one lexical word.
    pub word_pattern: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            particles: DEFAULT_PARTICLES.iter().map(|p| p.to_string()).collect(),
            suffix_len: DEFAULT_SUFFIX_LEN,
            case: CaseFold::Lower,
            word_pattern: DEFAULT_WORD_PATTERN.to_string(),
        }
    }
}

/// An observable token: a recognized particle phrase or the suffix of a
/// name word.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Symbol {
    /// A connective phrase from the configured closed set, e.g. `"de la"`.
    Particle(String),

    /// The trailing characters of a name word (the whole word when it is
    /// shorter than the configured suffix length).
    Suffix(String),
}

impl Symbol {
    /// Gets the textual form of the symbol.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Particle(s) | Self::Suffix(s) => s,
        }
    }

    /// Checks if the symbol is a particle.
    pub const fn is_particle(&self) -> bool {
        matches!(self, Self::Particle(_))
    }
}

/// One observation position: a symbol plus the original words it covers.
///
/// A multi-word particle such as `"de la"` covers two words but stands for
/// a single observation position.
#[derive(Clone, Debug)]
pub struct ObservedToken {
    symbol: Symbol,
    words: Vec<String>,
}

impl ObservedToken {
    /// Creates a new token from a symbol and the words it covers.
    pub fn new(symbol: Symbol, words: Vec<String>) -> Self {
        Self { symbol, words }
    }

    /// Gets the symbol of the token.
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Gets the words covered by the token.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Gets the surface form: the covered words joined by single spaces.
    pub fn surface(&self) -> String {
        self.words.join(" ")
    }
}

/// A tokenized name: an ordered sequence of observed tokens.
#[derive(Clone, Debug, Default)]
pub struct Observation {
    tokens: Vec<ObservedToken>,
}

impl Observation {
    /// Creates an observation directly from tokens.
    pub fn from_tokens(tokens: Vec<ObservedToken>) -> Self {
        Self { tokens }
    }

    /// Gets the number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Checks if the observation has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Gets the tokens.
    pub fn tokens(&self) -> &[ObservedToken] {
        &self.tokens
    }

    /// Creates an iterator over the symbols of the tokens.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.tokens.iter().map(ObservedToken::symbol)
    }
}

/// Converter from raw name strings into observations.
///
/// All methods are pure; a tokenizer holds only its configuration and the
/// compiled word pattern, so it is cheap to share between threads.
pub struct Tokenizer {
    config: TokenizerConfig,
    // Normalized particle phrases split into words, longest phrase first,
    // so a scan can match greedily.
    particles: Vec<Vec<String>>,
    word_regex: Regex,
}

impl Tokenizer {
    /// Creates a new tokenizer.
    ///
    /// # Errors
    ///
    /// [`NominatoError`] is returned when the word pattern does not compile,
    /// the suffix length is zero, or a particle phrase normalizes to
    /// nothing.
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        if config.suffix_len == 0 {
            return Err(NominatoError::invalid_argument(
                "suffix_len",
                "must be positive",
            ));
        }
        let word_regex = Regex::new(&config.word_pattern)
            .map_err(|e| NominatoError::invalid_argument("word_pattern", e.to_string()))?;

        let mut particles = Vec::with_capacity(config.particles.len());
        for phrase in &config.particles {
            let words: Vec<String> = normalize_text(phrase, config.case)
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if words.is_empty() {
                return Err(NominatoError::invalid_argument(
                    "particles",
                    format!("particle phrase {phrase:?} normalizes to nothing"),
                ));
            }
            particles.push(words);
        }
        particles.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        particles.dedup();

        Ok(Self {
            config,
            particles,
            word_regex,
        })
    }

    /// Gets the reference to the configuration.
    pub const fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Gets the normalized particle phrases, longest phrase first.
    pub fn particle_phrases(&self) -> impl Iterator<Item = String> + '_ {
        self.particles.iter().map(|words| words.join(" "))
    }

    /// Normalizes a text string: decomposes it, strips combining marks and
    /// any remaining non-ASCII characters, and applies the configured case
    /// transform.
    pub fn normalize(&self, text: &str) -> String {
        normalize_text(text, self.config.case)
    }

    /// Extracts the lexical words matching the configured word pattern.
    pub fn split_words(&self, text: &str) -> Vec<String> {
        self.word_regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Classifies a single word as a particle or a name word, mapping name
    /// words to their suffix symbol.
    pub fn classify(&self, word: &str) -> Symbol {
        if self.match_particle(&[word]).is_some() {
            Symbol::Particle(word.to_string())
        } else {
            self.to_symbol(word)
        }
    }

    /// Maps a name word to the symbol of its last `suffix_len` characters.
    /// Words not longer than the suffix length stand for themselves.
    pub fn to_symbol(&self, word: &str) -> Symbol {
        let len = word.chars().count();
        if len <= self.config.suffix_len {
            return Symbol::Suffix(word.to_string());
        }
        let start = word
            .char_indices()
            .nth(len - self.config.suffix_len)
            .map(|(i, _)| i)
            .unwrap_or(0);
        Symbol::Suffix(word[start..].to_string())
    }

    /// Normalizes a name string and converts it into an observation.
    ///
    /// Particle phrases are matched greedily against the word sequence,
    /// longest phrase first, so `"de la"` is never consumed as a bare
    /// `"de"` followed by a name word `"la"`.
    pub fn tokenize(&self, text: &str) -> Observation {
        let normalized = self.normalize(text);
        let words = self.split_words(&normalized);

        let mut tokens = Vec::with_capacity(words.len());
        let mut i = 0;
        while i < words.len() {
            if let Some(phrase) = self.match_particle(&words[i..]) {
                let end = i + phrase.len();
                tokens.push(ObservedToken::new(
                    Symbol::Particle(phrase.join(" ")),
                    words[i..end].to_vec(),
                ));
                i = end;
            } else {
                tokens.push(ObservedToken::new(
                    self.to_symbol(&words[i]),
                    vec![words[i].clone()],
                ));
                i += 1;
            }
        }
        Observation { tokens }
    }

    // The particles are ordered longest phrase first, so the first hit is
    // the greedy match.
    fn match_particle<W>(&self, words: &[W]) -> Option<&[String]>
    where
        W: AsRef<str>,
    {
        self.particles
            .iter()
            .find(|phrase| {
                phrase.len() <= words.len()
                    && phrase.iter().zip(words).all(|(p, w)| p == w.as_ref())
            })
            .map(|phrase| phrase.as_slice())
    }
}

fn normalize_text(text: &str, case: CaseFold) -> String {
    let stripped: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(char::is_ascii)
        .collect();
    match case {
        CaseFold::Lower => stripped.to_lowercase(),
        CaseFold::Upper => stripped.to_uppercase(),
        CaseFold::None => stripped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn default_tokenizer() -> Tokenizer {
        Tokenizer::new(TokenizerConfig::default()).unwrap()
    }

    #[test]
    fn test_normalize_strips_accents() {
        let tokenizer = default_tokenizer();
        assert_eq!(tokenizer.normalize("María-José"), "maria-jose");
        assert_eq!(tokenizer.normalize("GARCÍA"), "garcia");
        assert_eq!(tokenizer.normalize("Muñoz"), "munoz");
    }

    #[test]
    fn test_normalize_upper() {
        let config = TokenizerConfig {
            case: CaseFold::Upper,
            ..Default::default()
        };
        let tokenizer = Tokenizer::new(config).unwrap();
        assert_eq!(tokenizer.normalize("José"), "JOSE");
    }

    #[test]
    fn test_short_word_is_its_own_suffix() {
        let tokenizer = default_tokenizer();
        assert_eq!(tokenizer.to_symbol("eva"), Symbol::Suffix("eva".into()));
        assert_eq!(tokenizer.to_symbol("jose"), Symbol::Suffix("jose".into()));
        assert_eq!(
            tokenizer.to_symbol("rodriguez"),
            Symbol::Suffix("guez".into())
        );
    }

    #[test]
    fn test_classify_particle() {
        let tokenizer = default_tokenizer();
        assert_eq!(tokenizer.classify("de"), Symbol::Particle("de".into()));
        assert_eq!(tokenizer.classify("torre"), Symbol::Suffix("orre".into()));
    }

    #[test]
    fn test_multiword_particle_is_matched_greedily() {
        let tokenizer = default_tokenizer();
        let obs = tokenizer.tokenize("maria de las nieves");
        let symbols: Vec<&Symbol> = obs.symbols().collect();
        assert_eq!(
            symbols,
            [
                &Symbol::Suffix("aria".into()),
                &Symbol::Particle("de las".into()),
                &Symbol::Suffix("eves".into()),
            ]
        );
    }

    #[test]
    fn test_particle_prefers_longest_phrase() {
        let tokenizer = default_tokenizer();
        let obs = tokenizer.tokenize("de la torre");
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.tokens()[0].symbol(), &Symbol::Particle("de la".into()));
        assert_eq!(obs.tokens()[0].words(), ["de", "la"]);
        assert_eq!(obs.tokens()[1].symbol(), &Symbol::Suffix("orre".into()));
    }

    #[test]
    fn test_hyphenated_word_is_one_token() {
        let tokenizer = default_tokenizer();
        let obs = tokenizer.tokenize("Julio-José Pérez");
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.tokens()[0].symbol(), &Symbol::Suffix("jose".into()));
        assert_eq!(obs.tokens()[0].surface(), "julio-jose");
    }

    #[test]
    fn test_tokenize_empty() {
        let tokenizer = default_tokenizer();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize(" ,;").is_empty());
    }

    #[test]
    fn test_bad_word_pattern() {
        let config = TokenizerConfig {
            word_pattern: "[".to_string(),
            ..Default::default()
        };
        let result = Tokenizer::new(config);
        assert!(matches!(result, Err(NominatoError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_suffix_len() {
        let config = TokenizerConfig {
            suffix_len: 0,
            ..Default::default()
        };
        let result = Tokenizer::new(config);
        assert!(matches!(result, Err(NominatoError::InvalidArgument(_))));
    }
}
