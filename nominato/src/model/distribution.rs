//! Discrete emission distributions estimated from frequency data.

use hashbrown::HashMap;

use crate::errors::{NominatoError, Result};

/// A discrete probability distribution over the symbols observed in one
/// state's training corpus.
///
/// The weighted counts and the corpus total are kept as estimated, so a
/// [`SmoothingStrategy`] can rework them when the distribution is extended
/// over the shared vocabulary.
#[derive(Clone, Debug)]
pub struct Distribution {
    counts: HashMap<String, f64>,
    total: f64,
}

impl Distribution {
    /// Estimates a distribution from `(symbol, frequency)` pairs.
    ///
    /// Frequencies of repeated symbols accumulate. `name` identifies the
    /// corpus in error reports.
    ///
    /// # Errors
    ///
    /// - [`NominatoError::InvalidArgument`] when a frequency is negative or
    ///   not finite.
    /// - [`NominatoError::EmptyCorpus`] when the total frequency is zero.
    pub fn estimate<I>(name: &'static str, corpus: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut counts = HashMap::new();
        let mut total = 0.0;
        for (symbol, freq) in corpus {
            if !freq.is_finite() || freq < 0.0 {
                return Err(NominatoError::invalid_argument(
                    "frequency",
                    format!("invalid frequency {freq} for symbol {symbol:?}"),
                ));
            }
            *counts.entry(symbol).or_insert(0.0) += freq;
            total += freq;
        }
        if total <= 0.0 {
            return Err(NominatoError::empty_corpus(name));
        }
        Ok(Self { counts, total })
    }

    /// Probability of `symbol`: its weighted count over the corpus total,
    /// or exactly zero when the symbol was never observed.
    pub fn prob(&self, symbol: &str) -> f64 {
        self.counts.get(symbol).map_or(0.0, |c| c / self.total)
    }

    /// Total weight of the corpus the distribution was estimated from.
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Number of distinct symbols in the support.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Checks if the support is empty. Always false for an estimated
    /// distribution.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Creates an iterator over the observed symbols.
    pub fn support(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub(crate) fn count(&self, symbol: &str) -> f64 {
        self.counts.get(symbol).copied().unwrap_or(0.0)
    }
}

/// Sorted union of the supports of the given distributions.
///
/// Every state's emission row is laid out over this shared vocabulary, so
/// a symbol unseen by one state still has an explicit probability there.
pub fn vocabulary_union<'a, I>(dists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Distribution>,
{
    let mut vocab: Vec<String> = dists
        .into_iter()
        .flat_map(|d| d.counts.keys().cloned())
        .collect();
    vocab.sort_unstable();
    vocab.dedup();
    vocab
}

/// Policy for extending a state's distribution over the shared vocabulary.
///
/// The strategy is consulted once, at model-build time; the decoder only
/// ever sees the finished emission rows.
pub trait SmoothingStrategy {
    /// Produces one emission probability per vocabulary entry.
    fn emission_row(&self, dist: &Distribution, vocabulary: &[String]) -> Vec<f64>;
}

/// Extends a distribution with exact zeros for symbols outside its support.
///
/// Probabilities over the original support are left untouched, so they
/// still sum to one.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroFill;

impl SmoothingStrategy for ZeroFill {
    fn emission_row(&self, dist: &Distribution, vocabulary: &[String]) -> Vec<f64> {
        vocabulary.iter().map(|s| dist.prob(s)).collect()
    }
}

/// Additive (Laplace) smoothing with pseudo-count `alpha`.
///
/// Every vocabulary symbol receives nonzero probability, at the price of
/// shifting mass away from the observed support.
#[derive(Clone, Copy, Debug)]
pub struct Additive {
    /// The pseudo-count added to every vocabulary symbol.
    pub alpha: f64,
}

impl SmoothingStrategy for Additive {
    fn emission_row(&self, dist: &Distribution, vocabulary: &[String]) -> Vec<f64> {
        let denom = dist.total() + self.alpha * vocabulary.len() as f64;
        vocabulary
            .iter()
            .map(|s| (dist.count(s) + self.alpha) / denom)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_exact_probabilities() {
        let dist = Distribution::estimate(
            "test",
            vec![("rcia".to_string(), 3.0), ("opez".to_string(), 1.0)],
        )
        .unwrap();
        assert_eq!(dist.prob("rcia"), 0.75);
        assert_eq!(dist.prob("opez"), 0.25);
        assert_eq!(dist.prob("orre"), 0.0);
        assert_eq!(dist.total(), 4.0);
    }

    #[test]
    fn test_estimate_accumulates_repeated_symbols() {
        let dist = Distribution::estimate(
            "test",
            vec![("jose".to_string(), 1.0), ("jose".to_string(), 1.0)],
        )
        .unwrap();
        assert_eq!(dist.len(), 1);
        assert_eq!(dist.prob("jose"), 1.0);
    }

    #[test]
    fn test_estimate_empty_corpus() {
        let result = Distribution::estimate("test", vec![]);
        assert!(matches!(result, Err(NominatoError::EmptyCorpus(_))));

        let result = Distribution::estimate("test", vec![("jose".to_string(), 0.0)]);
        assert!(matches!(result, Err(NominatoError::EmptyCorpus(_))));
    }

    #[test]
    fn test_estimate_rejects_invalid_frequency() {
        let result = Distribution::estimate("test", vec![("jose".to_string(), -1.0)]);
        assert!(matches!(result, Err(NominatoError::InvalidArgument(_))));
    }

    #[test]
    fn test_support_sums_to_one() {
        let dist = Distribution::estimate(
            "test",
            vec![
                ("aria".to_string(), 7.0),
                ("jose".to_string(), 2.0),
                ("isco".to_string(), 13.0),
            ],
        )
        .unwrap();
        let sum: f64 = dist.support().map(|s| dist.prob(s)).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_fill_extension() {
        let a = Distribution::estimate("a", vec![("aria".to_string(), 1.0)]).unwrap();
        let b = Distribution::estimate(
            "b",
            vec![("rcia".to_string(), 1.0), ("opez".to_string(), 3.0)],
        )
        .unwrap();

        let vocab = vocabulary_union([&a, &b]);
        assert_eq!(vocab, ["aria", "opez", "rcia"]);

        let row = ZeroFill.emission_row(&a, &vocab);
        assert_eq!(row, [1.0, 0.0, 0.0]);
        let row = ZeroFill.emission_row(&b, &vocab);
        assert_eq!(row, [0.0, 0.75, 0.25]);
    }

    #[test]
    fn test_additive_row_sums_to_one() {
        let a = Distribution::estimate("a", vec![("aria".to_string(), 1.0)]).unwrap();
        let b = Distribution::estimate("b", vec![("rcia".to_string(), 3.0)]).unwrap();

        let vocab = vocabulary_union([&a, &b]);
        let row = Additive { alpha: 0.5 }.emission_row(&a, &vocab);
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(row.iter().all(|&p| p > 0.0));
    }
}
