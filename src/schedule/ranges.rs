use super::grid::Grid;
use super::slot_utils::{is_break, SLOTS_PER_DAY};
use super::types::{Batch, Day};

/// Finds runs of free, non-break slots on `day` that are at least
/// `min_length` long.
///
/// Each qualifying run yields only its first `min_length` slots as an
/// inclusive `(start, end)` range, so callers get blocks of exactly the
/// requested duration. Ranges come back in slot order.
pub fn find_consecutive_runs(
    grid: &Grid,
    day: Day,
    batch: Option<Batch>,
    min_length: usize,
) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    if min_length == 0 {
        return ranges;
    }

    let mut run_start: Option<usize> = None;
    let mut run_len = 0;

    let flush = |start: Option<usize>, len: usize, ranges: &mut Vec<(usize, usize)>| {
        if let Some(start) = start {
            if len >= min_length {
                ranges.push((start, start + min_length - 1));
            }
        }
    };

    for slot in 0..SLOTS_PER_DAY {
        if !is_break(slot) && grid.is_available(day, slot, batch) {
            run_start.get_or_insert(slot);
            run_len += 1;
        } else {
            flush(run_start.take(), run_len, &mut ranges);
            run_len = 0;
        }
    }
    flush(run_start, run_len, &mut ranges);

    ranges
}
