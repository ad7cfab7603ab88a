use std::ops::RangeInclusive;

use crate::config::{Curriculum, LabRotationEntry};
use crate::parser::TeacherBindings;
use super::grid::Grid;
use super::random::SlotRng;
use super::ranges::find_consecutive_runs;
use super::slot_utils::{is_break, SLOTS_PER_DAY};
use super::types::{CellAssignment, Category, Day, Shortfall, ShortfallKind, Track};

/// Places the lab rotation and then the cohort-wide lab
pub fn schedule_labs<R: SlotRng>(
    grid: &mut Grid,
    curriculum: &Curriculum,
    bindings: &TeacherBindings,
    rng: &mut R,
) -> Vec<Shortfall> {
    let mut shortfalls = schedule_lab_rotation(grid, curriculum, rng);
    shortfalls.extend(schedule_cohort_lab(grid, curriculum, bindings));
    shortfalls
}

/// Places each non-free rotation entry as one block of `lab_duration` slots.
///
/// The day's preferred start is tried first. Otherwise a free block is drawn
/// at random from the day's runs, afternoon blocks first. A block that clashes
/// with a co-teacher leaves the entry unplaced; there is no second draw.
pub fn schedule_lab_rotation<R: SlotRng>(
    grid: &mut Grid,
    curriculum: &Curriculum,
    rng: &mut R,
) -> Vec<Shortfall> {
    let duration = curriculum.lab_duration;
    let mut shortfalls = Vec::new();

    for entry in &curriculum.lab_rotation {
        let Some(lab) = entry.lab.as_deref() else {
            continue;
        };
        let label = format!("{} Lab", lab);
        let cell = CellAssignment::lab(&label, &label, &entry.teachers.join(", "));

        let preferred = curriculum.lab_start_for(entry.day);
        let preferred_block = preferred..=preferred.saturating_add(duration).saturating_sub(1);
        if duration > 0 && block_is_clear(grid, entry, preferred_block.clone()) {
            commit_block(grid, entry, preferred_block, &cell);
            continue;
        }

        let ranges = find_consecutive_runs(grid, entry.day, Some(entry.batch), duration);
        let afternoon: Vec<(usize, usize)> = ranges
            .iter()
            .filter(|(start, _)| *start >= curriculum.afternoon_start)
            .copied()
            .collect();
        let pool = if afternoon.is_empty() { &ranges } else { &afternoon };

        match rng.choose(pool) {
            Some(&(start, end)) if !grid.any_teacher_conflict(entry.day, start..=end, &entry.teachers) => {
                commit_block(grid, entry, start..=end, &cell);
            }
            Some(&(start, end)) => {
                log::warn!(
                    "{} for {} on {}: slots {}-{} clash with a co-teacher, left unplaced",
                    label, entry.batch, entry.day, start, end
                );
                shortfalls.push(rotation_shortfall(&label, entry));
            }
            None => {
                log::warn!("{} for {} on {}: no free block, left unplaced", label, entry.batch, entry.day);
                shortfalls.push(rotation_shortfall(&label, entry));
            }
        }
    }

    shortfalls
}

/// Places the single-slot cohort lab at its fixed cell of the main track
pub fn schedule_cohort_lab(
    grid: &mut Grid,
    curriculum: &Curriculum,
    bindings: &TeacherBindings,
) -> Option<Shortfall> {
    let lab = curriculum.cohort_lab.as_ref()?;
    let teacher = bindings.teacher_for(&lab.binding, &curriculum.placeholder_teacher);

    let open = grid.is_available(lab.day, lab.slot, None) && !grid.has_teacher_conflict(lab.day, lab.slot, &teacher);
    if open
        && grid
            .assign(Track::Main, lab.day, lab.slot, CellAssignment::lab(&lab.code, &lab.name, &teacher))
            .is_ok()
    {
        log::debug!("{} placed on {} slot {} ({})", lab.code, lab.day, lab.slot, teacher);
        return None;
    }

    log::warn!("{} skipped: {} slot {} is taken for {}", lab.code, lab.day, lab.slot, teacher);
    Some(Shortfall {
        kind: ShortfallKind::CohortLab,
        subject: lab.code.clone(),
        day: Some(lab.day),
        batch: None,
        missing: 1,
    })
}

fn block_is_clear(grid: &Grid, entry: &LabRotationEntry, block: RangeInclusive<usize>) -> bool {
    *block.end() < SLOTS_PER_DAY
        && block
            .clone()
            .all(|slot| !is_break(slot) && grid.is_available(entry.day, slot, Some(entry.batch)))
        && !grid.any_teacher_conflict(entry.day, block, &entry.teachers)
}

fn commit_block(grid: &mut Grid, entry: &LabRotationEntry, block: RangeInclusive<usize>, cell: &CellAssignment) {
    let track = Track::Batch(entry.batch);
    for slot in block {
        if let Err(e) = grid.assign(track, entry.day, slot, cell.clone()) {
            log::error!("Lab block commit failed: {}", e);
        }
    }
    log::debug!("{} placed for {} on {} ({})", cell.subject, entry.batch, entry.day, cell.teacher);
}

fn rotation_shortfall(label: &str, entry: &LabRotationEntry) -> Shortfall {
    Shortfall {
        kind: ShortfallKind::LabRotation,
        subject: label.to_string(),
        day: Some(entry.day),
        batch: Some(entry.batch),
        missing: 1,
    }
}

/// Runs of identical lab cells in one track on one day, as inclusive slot ranges
pub fn lab_blocks(grid: &Grid, track: Track, day: Day) -> Vec<(usize, usize)> {
    let row = grid.matrix(track).row(day);
    let mut blocks: Vec<(usize, usize)> = Vec::new();
    for (slot, cell) in row.iter().enumerate() {
        let Some(cell) = cell.as_ref().filter(|c| c.category == Category::Lab) else {
            continue;
        };
        match blocks.last_mut() {
            Some((_, end)) if *end + 1 == slot && row[*end].as_ref().map(|c| &c.subject) == Some(&cell.subject) => {
                *end = slot;
            }
            _ => blocks.push((slot, slot)),
        }
    }
    blocks
}
