//! Minimal re-ranking of a sparse ordered sequence.
//!
//! Moving an item to another item's rank only reassigns the sequence
//! numbers of the items between the two endpoints (inclusive); everything
//! outside the range keeps its number bit-for-bit. The set of sequence
//! numbers in use never changes, so holes left by deletions survive and
//! no new ones appear.
//!
//! Moving `i1` to `i4`'s rank over the numbers `0 2 6 8 9`:
//!
//! ```text
//! seq  0   2   6   8   9          0   2   6   8   9
//! id   i0  i1  i2  i3  i4   =>    i0  i2  i3  i4  i1
//! ```
//!
//! `i1` takes the last affected number, every other affected item shifts
//! one rank towards the front. The backward move is the mirror image.

use crate::{EngineError, ResultEngine};

/// One `(id, sequence_no)` tuple of the affected range, ascending by
/// sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SeqEntry {
    pub id: i32,
    pub seq: i32,
}

/// Check that the fetched range actually brackets the two endpoints.
///
/// A violation means the caller's view of the order has diverged from the
/// store (stale cache, or a direction flag that contradicts the stored
/// sequence numbers). Retrying cannot help, so this fails fast before any
/// write is issued.
pub(crate) fn validate_range(entries: &[SeqEntry], id_a: i32, id_b: i32) -> ResultEngine<()> {
    if entries.len() < 2 {
        return Err(EngineError::Inconsistent(format!(
            "expected at least 2 affected items between {id_a} and {id_b}, got {}",
            entries.len()
        )));
    }
    let first = entries[0].id;
    let last = entries[entries.len() - 1].id;
    if first != id_a || last != id_b {
        return Err(EngineError::Inconsistent(format!(
            "affected range [{first}, {last}] does not bracket [{id_a}, {id_b}]"
        )));
    }
    Ok(())
}

/// Compute the `(id, new_sequence_no)` reassignments for a validated
/// range.
///
/// `forward` is true when the moving item is the first entry (it travels
/// towards larger sequence numbers), false when it is the last. Every
/// entry of the range receives a new number; ids outside the range are
/// not part of the plan at all.
pub(crate) fn plan_reassignments(entries: &[SeqEntry], forward: bool) -> Vec<(i32, i32)> {
    let last_index = entries.len() - 1;
    let first_seq = entries[0].seq;
    let last_seq = entries[last_index].seq;

    let mut moves = Vec::with_capacity(entries.len());
    if forward {
        moves.push((entries[0].id, last_seq));
        for i in 1..=last_index {
            moves.push((entries[i].id, entries[i - 1].seq));
        }
    } else {
        for i in 0..last_index {
            moves.push((entries[i].id, entries[i + 1].seq));
        }
        moves.push((entries[last_index].id, first_seq));
    }
    moves
}
