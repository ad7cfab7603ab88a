use std::collections::HashSet;

use crate::config::{CoreSubject, Curriculum};
use crate::parser::TeacherBindings;
use super::grid::Grid;
use super::random::SlotRng;
use super::slot_utils::teaching_slots;
use super::types::{CellAssignment, Day, Shortfall, ShortfallKind, Track};

/// Places theory and tutorial hours of every core subject in the main track.
///
/// Subjects are handled in definition order, so earlier subjects get first
/// claim on contested cells.
pub fn schedule_core_subjects<R: SlotRng>(
    grid: &mut Grid,
    curriculum: &Curriculum,
    bindings: &TeacherBindings,
    rng: &mut R,
) -> Vec<Shortfall> {
    let mut shortfalls = Vec::new();

    for subject in &curriculum.core_subjects {
        let teacher = bindings.teacher_for(&subject.code, &curriculum.placeholder_teacher);
        shortfalls.extend(schedule_subject(grid, subject, &teacher, rng));
    }

    shortfalls
}

/// Places one subject's theory then tutorial sessions with `teacher`
pub fn schedule_subject<R: SlotRng>(
    grid: &mut Grid,
    subject: &CoreSubject,
    teacher: &str,
    rng: &mut R,
) -> Vec<Shortfall> {
    let mut candidates: Vec<(Day, usize)> = Day::ALL
        .into_iter()
        .flat_map(|day| teaching_slots().map(move |slot| (day, slot)))
        .filter(|&(day, slot)| is_open(grid, day, slot, teacher))
        .collect();
    rng.shuffle(&mut candidates);

    let mut shortfalls = Vec::new();

    let theory = CellAssignment::core(&subject.code, &subject.name, teacher);
    let theory_days = spread_sessions(grid, &candidates, subject.theory, &HashSet::new(), &theory);
    if theory_days.placed < subject.theory {
        shortfalls.push(core_shortfall(ShortfallKind::Theory, &subject.code, subject.theory - theory_days.placed));
    }

    let tutorial = CellAssignment::core(&subject.tutorial_code(), &subject.tutorial_name(), teacher);
    let tutorial_days = spread_sessions(grid, &candidates, subject.tutorial, &theory_days.days, &tutorial);
    if tutorial_days.placed < subject.tutorial {
        shortfalls.push(core_shortfall(
            ShortfallKind::Tutorial,
            &subject.tutorial_code(),
            subject.tutorial - tutorial_days.placed,
        ));
    }

    for s in &shortfalls {
        log::warn!("{} ({}): {} session(s) could not be placed", s.subject, teacher, s.missing);
    }
    shortfalls
}

struct Spread {
    placed: u32,
    days: HashSet<Day>,
}

/// Places up to `target` copies of `cell` from `candidates`.
///
/// The first sweep takes at most one cell per day and skips `avoid_days`; the
/// second sweep fills any remaining hours without the day restriction. Every
/// cell is re-checked against the live grid before it is taken.
fn spread_sessions(
    grid: &mut Grid,
    candidates: &[(Day, usize)],
    target: u32,
    avoid_days: &HashSet<Day>,
    cell: &CellAssignment,
) -> Spread {
    let mut spread = Spread {
        placed: 0,
        days: HashSet::new(),
    };

    for &(day, slot) in candidates {
        if spread.placed >= target {
            break;
        }
        if avoid_days.contains(&day) || spread.days.contains(&day) {
            continue;
        }
        if place(grid, day, slot, cell) {
            spread.days.insert(day);
            spread.placed += 1;
        }
    }

    for &(day, slot) in candidates {
        if spread.placed >= target {
            break;
        }
        if place(grid, day, slot, cell) {
            spread.days.insert(day);
            spread.placed += 1;
        }
    }

    spread
}

fn is_open(grid: &Grid, day: Day, slot: usize, teacher: &str) -> bool {
    grid.is_available(day, slot, None) && !grid.has_teacher_conflict(day, slot, teacher)
}

fn place(grid: &mut Grid, day: Day, slot: usize, cell: &CellAssignment) -> bool {
    if !is_open(grid, day, slot, &cell.teacher) {
        return false;
    }
    match grid.assign(Track::Main, day, slot, cell.clone()) {
        Ok(()) => {
            log::debug!("{} placed on {} slot {} ({})", cell.subject, day, slot, cell.teacher);
            true
        }
        Err(e) => {
            log::error!("Core placement failed: {}", e);
            false
        }
    }
}

fn core_shortfall(kind: ShortfallKind, subject: &str, missing: u32) -> Shortfall {
    Shortfall {
        kind,
        subject: subject.to_string(),
        day: None,
        batch: None,
        missing,
    }
}
