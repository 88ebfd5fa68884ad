//! Batch evaluation of decoded field assignments against gold labels.

use crate::tagger::worker::{Fields, Worker};
use crate::tokenizer::Tokenizer;

/// A gold-labeled example: a raw name string plus the words of each
/// structural field.
#[derive(Clone, Debug, Default)]
pub struct TaggedExample {
    /// Raw, unstructured name string.
    pub text: String,

    /// Gold given name.
    pub first_name: String,

    /// Gold first surname, particles included.
    pub last_name_1: String,

    /// Gold second surname, particles included.
    pub last_name_2: String,
}

/// Outcome of decoding one example.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// All three decoded fields match the gold labels.
    Correct,
    /// The decoder produced a path, but at least one field differs.
    FieldMismatch,
    /// The decoder failed on the example.
    DecodeFailure,
}

/// Tally of outcomes over a batch of examples.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// Number of examples seen.
    pub total: usize,

    /// Number of [`Outcome::Correct`] examples.
    pub correct: usize,

    /// Number of [`Outcome::FieldMismatch`] examples.
    pub field_mismatches: usize,

    /// Number of [`Outcome::DecodeFailure`] examples.
    pub decode_failures: usize,
}

impl Summary {
    /// Adds one outcome to the tally.
    pub fn tally(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::FieldMismatch => self.field_mismatches += 1,
            Outcome::DecodeFailure => self.decode_failures += 1,
        }
    }

    /// Fraction of examples decoded to the exact gold fields; zero for an
    /// empty batch.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Decodes every example and tallies the outcomes.
///
/// Per-example decode failures are counted and skipped; they never abort
/// the batch or invalidate the worker.
pub fn evaluate<'a, I>(examples: I, worker: &mut Worker) -> Summary
where
    I: IntoIterator<Item = &'a TaggedExample>,
{
    let mut summary = Summary::default();
    for example in examples {
        summary.tally(outcome_of(example, worker));
    }
    summary
}

/// Decodes a single example and classifies the result.
pub fn outcome_of(example: &TaggedExample, worker: &mut Worker) -> Outcome {
    worker.reset_name(&example.text);
    if let Err(e) = worker.tag() {
        log::debug!("decode failure for {:?}: {}", example.text, e);
        return Outcome::DecodeFailure;
    }
    let decoded = worker.fields();
    let gold = gold_fields(example, worker.tagger().tokenizer());
    if decoded == gold {
        Outcome::Correct
    } else {
        Outcome::FieldMismatch
    }
}

// Gold labels go through the same normalization and word splitting as the
// decoded text, so the comparison is insensitive to case and accents.
fn gold_fields(example: &TaggedExample, tokenizer: &Tokenizer) -> Fields {
    Fields {
        first_name: normalized_words(tokenizer, &example.first_name),
        last_name_1: normalized_words(tokenizer, &example.last_name_1),
        last_name_2: normalized_words(tokenizer, &example.last_name_2),
    }
}

fn normalized_words(tokenizer: &Tokenizer, text: &str) -> String {
    tokenizer.split_words(&tokenizer.normalize(text)).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;
    use crate::model::graph::{NameField, Topology};
    use crate::tagger::Tagger;
    use crate::tokenizer::TokenizerConfig;

    #[track_caller]
    fn test_worker() -> Worker {
        let mut builder =
            ModelBuilder::new(TokenizerConfig::default(), Topology::ForenameFirst).unwrap();
        builder.add_entry(NameField::FirstName, "albe", 8.0);
        builder.add_entry(NameField::LastName1, "de la torre", 4.0);
        builder.add_entry(NameField::LastName1, "lopz", 4.0);
        builder.add_entry(NameField::LastName2, "garc", 5.0);
        builder.seed_particles(1.0);
        Tagger::new(builder.build().unwrap()).unwrap().new_worker()
    }

    fn example(text: &str, fields: [&str; 3]) -> TaggedExample {
        TaggedExample {
            text: text.to_string(),
            first_name: fields[0].to_string(),
            last_name_1: fields[1].to_string(),
            last_name_2: fields[2].to_string(),
        }
    }

    #[test]
    fn test_correct_example() {
        let mut worker = test_worker();
        let ex = example("albe lopz garc", ["albe", "lopz", "garc"]);
        assert_eq!(outcome_of(&ex, &mut worker), Outcome::Correct);
    }

    #[test]
    fn test_particles_merge_into_the_gold_field() {
        let mut worker = test_worker();
        let ex = example("Albe de la Torre GARC", ["Albe", "de la Torre", "garc"]);
        assert_eq!(outcome_of(&ex, &mut worker), Outcome::Correct);
    }

    #[test]
    fn test_field_mismatch() {
        let mut worker = test_worker();
        let ex = example("albe lopz garc", ["albe", "garc", "lopz"]);
        assert_eq!(outcome_of(&ex, &mut worker), Outcome::FieldMismatch);
    }

    #[test]
    fn test_summary_invariant_over_a_mixed_batch() {
        let mut worker = test_worker();
        let examples = vec![
            example("albe lopz garc", ["albe", "lopz", "garc"]),
            example("albe de la torre garc", ["albe", "de la torre", "garc"]),
            example("albe lopz garc", ["albe", "garc", "lopz"]),
            // Unknown suffix: decoding fails, the batch continues.
            example("albe zzzz garc", ["albe", "zzzz", "garc"]),
            // One word cannot reach the end of the forename-first graph.
            example("albe", ["albe", "", ""]),
        ];

        let summary = evaluate(&examples, &mut worker);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.field_mismatches, 1);
        assert_eq!(summary.decode_failures, 2);
        assert_eq!(
            summary.correct + summary.field_mismatches + summary.decode_failures,
            summary.total
        );
        assert_eq!(summary.accuracy(), 0.4);
    }

    #[test]
    fn test_empty_batch() {
        let mut worker = test_worker();
        let summary = evaluate(&[], &mut worker);
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.accuracy(), 0.0);
    }
}
