//! Phase-setting search.
//!
//! Tries every ordering of a set of phase settings and keeps the one that
//! yields the largest final signal, for either amplifier wiring.

use crate::debug;
use crate::orchestration::batch::run_chain;
use crate::orchestration::ring::run_ring;
use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::program::Program;

/// How amplifier instances are connected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Wiring {
    /// Each instance runs to completion before the next starts.
    #[default]
    Serial,
    /// Instances run concurrently, the last feeding the first.
    Feedback,
}

/// Best phase ordering found by [`search`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Best {
    pub phases: Vec<Word>,
    pub signal: Word,
}

/// Returns every ordering of `items` (Heap's algorithm).
///
/// The first entry is `items` itself. Duplicates in the input produce
/// duplicate orderings.
pub fn permutations(items: &[Word]) -> Vec<Vec<Word>> {
    let mut current = items.to_vec();
    let mut out = vec![current.clone()];
    let mut counters = vec![0usize; current.len()];

    let mut i = 1;
    while i < current.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            current.swap(j, i);
            out.push(current.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    out
}

/// Runs one ordering through the given wiring.
pub fn signal_for(
    program: &Program,
    phases: &[Word],
    wiring: Wiring,
    signal: Word,
) -> Result<Option<Word>, VMError> {
    match wiring {
        Wiring::Serial => run_chain(program, phases, signal),
        Wiring::Feedback => run_ring(program, phases, signal),
    }
}

/// Finds the ordering of `phases` with the largest final signal.
///
/// Orderings that produce no signal are skipped; ties keep the first
/// ordering found. Returns `None` if no ordering produced a signal.
pub fn search(
    program: &Program,
    phases: &[Word],
    wiring: Wiring,
    signal: Word,
) -> Result<Option<Best>, VMError> {
    let mut best: Option<Best> = None;
    for candidate in permutations(phases) {
        let Some(value) = signal_for(program, &candidate, wiring, signal)? else {
            debug!("phases {candidate:?}: no signal");
            continue;
        };
        if best.as_ref().is_none_or(|b| value > b.signal) {
            best = Some(Best {
                phases: candidate,
                signal: value,
            });
        }
    }
    Ok(best)
}
