//! Greedy case construction.
//!
//! Each case starts from one unsatisfied obligation (the seed). The remaining
//! parameters are filled one at a time in shuffled order. Every candidate
//! value is scored by:
//! 1. how many unsatisfied obligations it closes within the look-back window,
//! 2. its node count (how many unsatisfied obligations mention it at all),
//! 3. random jitter.
//!
//! The highest score wins.

use rand::seq::SliceRandom;
use rand::Rng;
use tmatrix_ir::ParameterSpace;
use tracing::trace;

use super::universe::{Entry, Obligation, ObligationUniverse};

/// Candidate score, compared field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    pub open: usize,
    pub frequency: usize,
    pub jitter: u64,
}

/// Builds one case per call against a live universe.
#[derive(Debug, Clone, Copy)]
pub struct CaseBuilder<'s> {
    space: &'s ParameterSpace,
    /// Look-back window: the largest requirement arity.
    window: usize,
}

impl<'s> CaseBuilder<'s> {
    pub fn new(space: &'s ParameterSpace, window: usize) -> Self {
        Self { space, window }
    }

    /// Build the next case, or `None` once every obligation is covered.
    ///
    /// The returned vector holds the chosen value position per parameter.
    /// The universe is only read here; coverage is applied separately.
    pub fn build<R: Rng + ?Sized>(
        &self,
        universe: &mut ObligationUniverse,
        rng: &mut R,
    ) -> Option<Vec<usize>> {
        let seed = universe.next_seed()?;

        let mut placed: Vec<Entry> = Vec::with_capacity(self.space.len());
        let mut assigned = vec![false; self.space.len()];
        for &entry in seed.entries() {
            placed.push(entry);
            assigned[entry.param] = true;
        }

        let mut rest: Vec<usize> = (0..self.space.len()).filter(|&p| !assigned[p]).collect();
        rest.shuffle(rng);

        for param in rest {
            let mut best: Option<(Score, Entry)> = None;
            for value in 0..self.space.domain(param).len() {
                let candidate = Entry { param, value };
                let score = Score {
                    open: self.open_obligations(universe, &placed, candidate),
                    frequency: universe.node_count(candidate),
                    jitter: rng.gen(),
                };
                if best.map_or(true, |(top, _)| score > top) {
                    best = Some((score, candidate));
                }
            }
            if let Some((score, chosen)) = best {
                trace!(
                    param = self.space.name(param),
                    value = chosen.value,
                    open = score.open,
                    frequency = score.frequency,
                    "chose value"
                );
                placed.push(chosen);
            }
        }

        let mut case = vec![0; self.space.len()];
        for entry in placed {
            case[entry.param] = entry.value;
        }
        Some(case)
    }

    /// Count unsatisfied obligations formed by `candidate` plus the `j`
    /// most recently placed entries, for each `j` below the window.
    fn open_obligations(
        &self,
        universe: &ObligationUniverse,
        placed: &[Entry],
        candidate: Entry,
    ) -> usize {
        let i = placed.len();
        let mut entries = vec![candidate];
        let mut open = 0;
        for j in 0..self.window.min(i + 1) {
            if j > 0 {
                entries.push(placed[i - j]);
            }
            if universe.is_unsatisfied(&Obligation::new(entries.clone())) {
                open += 1;
            }
        }
        open
    }
}
