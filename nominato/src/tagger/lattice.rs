//! Log-domain dynamic-programming table shared by the Viterbi and forward
//! passes.

use crate::errors::{NominatoError, Result};
use crate::model::Model;
use crate::model::graph::{NUM_STATES, StateId};

const INVALID_IDX: u8 = u8::MAX;

/// A reusable DP table: one column per observation position, one cell per
/// hidden state.
#[derive(Default)]
pub struct Lattice {
    scores: Vec<[f64; NUM_STATES]>,
    backptrs: Vec<[u8; NUM_STATES]>,
    final_state: u8,
    len: usize, // number of columns in use
}

impl Lattice {
    fn reset(&mut self, len: usize) {
        self.len = len;
        self.final_state = INVALID_IDX;
        if self.scores.len() < len {
            self.scores.resize(len, [f64::NEG_INFINITY; NUM_STATES]);
            self.backptrs.resize(len, [INVALID_IDX; NUM_STATES]);
        }
    }

    /// Runs the Viterbi recursion over `symbol_ids` and returns the
    /// log-probability of the best complete path.
    ///
    /// Predecessors are scanned in [`StateId::ALL`] order with a strict
    /// `>` comparison, so ties between equally scoring predecessors always
    /// keep the first-enumerated one; a later predecessor never displaces
    /// an earlier one with the same score.
    ///
    /// # Errors
    ///
    /// [`NominatoError::NoTerminalPath`] when every path is eliminated at
    /// some position (including the terminal step).
    pub fn viterbi(&mut self, model: &Model, symbol_ids: &[u32]) -> Result<f64> {
        self.reset(symbol_ids.len());
        if symbol_ids.is_empty() {
            return Ok(0.0);
        }

        for s in 0..NUM_STATES {
            self.scores[0][s] = model.log_start(s) + model.log_emission(s, symbol_ids[0] as usize);
            self.backptrs[0][s] = INVALID_IDX;
        }
        self.check_column(0)?;

        for (t, &symbol_id) in symbol_ids.iter().enumerate().skip(1) {
            for s in 0..NUM_STATES {
                let mut best = f64::NEG_INFINITY;
                let mut best_idx = INVALID_IDX;
                for p in 0..NUM_STATES {
                    let score = self.scores[t - 1][p] + model.log_transition(p, s);
                    if score > best {
                        best = score;
                        best_idx = p as u8;
                    }
                }
                self.scores[t][s] = best + model.log_emission(s, symbol_id as usize);
                self.backptrs[t][s] = best_idx;
            }
            self.check_column(t)?;
        }

        let last = symbol_ids.len() - 1;
        let mut best = f64::NEG_INFINITY;
        let mut best_state = INVALID_IDX;
        for s in 0..NUM_STATES {
            let score = self.scores[last][s] + model.log_end(s);
            if score > best {
                best = score;
                best_state = s as u8;
            }
        }
        if best_state == INVALID_IDX {
            return Err(NominatoError::no_terminal_path(symbol_ids.len()));
        }
        self.final_state = best_state;
        Ok(best)
    }

    /// Recovers the best path found by the last successful
    /// [`Self::viterbi`] call, oldest position first.
    pub fn backtrack(&self, path: &mut Vec<StateId>) {
        path.clear();
        if self.len == 0 || self.final_state == INVALID_IDX {
            return;
        }
        let mut s = usize::from(self.final_state);
        path.push(StateId::from_index(s));
        for t in (1..self.len).rev() {
            s = usize::from(self.backptrs[t][s]);
            path.push(StateId::from_index(s));
        }
        path.reverse();
    }

    /// Runs the forward pass: the total log-probability of the observation
    /// summed over all complete paths, combined with log-sum-exp.
    ///
    /// # Errors
    ///
    /// [`NominatoError::NoTerminalPath`] under the same conditions as
    /// [`Self::viterbi`].
    pub fn forward(&mut self, model: &Model, symbol_ids: &[u32]) -> Result<f64> {
        self.reset(symbol_ids.len());
        if symbol_ids.is_empty() {
            return Ok(0.0);
        }

        for s in 0..NUM_STATES {
            self.scores[0][s] = model.log_start(s) + model.log_emission(s, symbol_ids[0] as usize);
        }
        self.check_column(0)?;

        for (t, &symbol_id) in symbol_ids.iter().enumerate().skip(1) {
            for s in 0..NUM_STATES {
                let mut terms = [f64::NEG_INFINITY; NUM_STATES];
                for p in 0..NUM_STATES {
                    terms[p] = self.scores[t - 1][p] + model.log_transition(p, s);
                }
                self.scores[t][s] =
                    log_sum_exp(&terms) + model.log_emission(s, symbol_id as usize);
            }
            self.check_column(t)?;
        }

        let last = symbol_ids.len() - 1;
        let mut terms = [f64::NEG_INFINITY; NUM_STATES];
        for s in 0..NUM_STATES {
            terms[s] = self.scores[last][s] + model.log_end(s);
        }
        let total = log_sum_exp(&terms);
        if total == f64::NEG_INFINITY {
            return Err(NominatoError::no_terminal_path(symbol_ids.len()));
        }
        Ok(total)
    }

    fn check_column(&self, t: usize) -> Result<()> {
        if self.scores[t].iter().all(|&s| s == f64::NEG_INFINITY) {
            return Err(NominatoError::no_terminal_path(t));
        }
        Ok(())
    }
}

// Shifting by the maximum keeps the exponentials in range.
fn log_sum_exp(terms: &[f64]) -> f64 {
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = terms.iter().map(|&t| (t - max).exp()).sum();
    max + sum.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sum_exp_matches_direct_sum() {
        let terms = [(0.2f64).ln(), (0.3f64).ln(), (0.5f64).ln()];
        assert!((log_sum_exp(&terms) - 0.0f64).abs() < 1e-12);
    }

    #[test]
    fn test_log_sum_exp_of_nothing_is_neg_infinity() {
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
        assert_eq!(
            log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]),
            f64::NEG_INFINITY
        );
    }
}
