use std::collections::HashSet;

use crate::config::{Curriculum, Elective};
use crate::parser::TeacherBindings;
use super::grid::Grid;
use super::random::SlotRng;
use super::slot_utils::teaching_slots;
use super::types::{Batch, CellAssignment, Day, Shortfall, ShortfallKind, Track};

/// Electives never run on this day
pub const ELECTIVE_FREE_DAY: Day = Day::Saturday;

/// Elective `i` is taught to batch `i` with its bound teacher
struct Stream<'a> {
    elective: &'a Elective,
    batch: Batch,
    teacher: String,
}

/// Places the weekly elective sessions.
///
/// A session puts all three electives at one shared (day, slot), one per batch
/// matrix. The first sweep wants a fresh day and a fresh slot index for every
/// session; the second keeps only the fresh slot index.
pub fn schedule_electives<R: SlotRng>(
    grid: &mut Grid,
    curriculum: &Curriculum,
    bindings: &TeacherBindings,
    rng: &mut R,
) -> Vec<Shortfall> {
    let required = curriculum.elective_sessions;
    let streams: Vec<Stream> = curriculum
        .electives
        .iter()
        .zip(Batch::ALL)
        .map(|(elective, batch)| Stream {
            elective,
            batch,
            teacher: bindings.teacher_for(&elective.code, &curriculum.placeholder_teacher),
        })
        .collect();
    let teachers: Vec<&str> = streams.iter().map(|s| s.teacher.as_str()).collect();

    if !grid.teacher_match().all_distinct(&teachers) {
        log::warn!(
            "Elective teachers {:?} overlap; simultaneous sessions cannot be placed",
            teachers
        );
    }

    let mut days: Vec<Day> = Day::ALL.into_iter().filter(|&d| d != ELECTIVE_FREE_DAY).collect();
    rng.shuffle(&mut days);

    let mut candidates: Vec<(Day, usize)> = days
        .iter()
        .flat_map(|&day| teaching_slots().map(move |slot| (day, slot)))
        .filter(|&(day, slot)| session_is_open(grid, day, slot, &teachers))
        .collect();
    rng.shuffle(&mut candidates);

    let mut used_days: HashSet<Day> = HashSet::new();
    let mut used_slots: HashSet<usize> = HashSet::new();
    let mut placed = 0;

    for &(day, slot) in &candidates {
        if placed >= required {
            break;
        }
        let fresh_day = !used_days.contains(&day) || used_days.len() >= days.len();
        if fresh_day && !used_slots.contains(&slot) && commit_session(grid, &streams, &teachers, day, slot) {
            used_days.insert(day);
            used_slots.insert(slot);
            placed += 1;
        }
    }

    for &(day, slot) in &candidates {
        if placed >= required {
            break;
        }
        if !used_slots.contains(&slot) && commit_session(grid, &streams, &teachers, day, slot) {
            used_slots.insert(slot);
            placed += 1;
        }
    }

    if placed >= required {
        return Vec::new();
    }

    let codes: Vec<&str> = streams.iter().map(|s| s.elective.code.as_str()).collect();
    log::warn!(
        "Electives {}: {} of {} weekly sessions could not be placed",
        codes.join("/"),
        required - placed,
        required
    );
    vec![Shortfall {
        kind: ShortfallKind::Elective,
        subject: codes.join("/"),
        day: None,
        batch: None,
        missing: required - placed,
    }]
}

/// Whether every batch is free at (day, slot) and the elective teachers are
/// free and distinct from each other
pub fn session_is_open(grid: &Grid, day: Day, slot: usize, teachers: &[&str]) -> bool {
    Batch::ALL.into_iter().all(|b| grid.is_available(day, slot, Some(b)))
        && teachers.iter().all(|t| !grid.has_teacher_conflict(day, slot, t))
        && grid.teacher_match().all_distinct(teachers)
}

fn commit_session(grid: &mut Grid, streams: &[Stream], teachers: &[&str], day: Day, slot: usize) -> bool {
    if !session_is_open(grid, day, slot, teachers) {
        return false;
    }
    for stream in streams {
        let cell = CellAssignment::elective(&stream.elective.code, &stream.elective.name, &stream.teacher);
        if let Err(e) = grid.assign(Track::Batch(stream.batch), day, slot, cell) {
            log::error!("Elective placement failed: {}", e);
        }
    }
    log::debug!("Electives placed on {} slot {}", day, slot);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::random::{InOrder, SeededRng};

    fn distinct_bindings() -> TeacherBindings {
        [("IM551", "Asha"), ("IM552", "Bala"), ("IM555", "Chitra")].into_iter().collect()
    }

    fn session_cells(grid: &Grid) -> Vec<(Day, usize)> {
        let mut cells: Vec<(Day, usize)> = grid
            .occupied()
            .filter(|(track, _, _, _)| *track == Track::Batch(Batch::B1))
            .map(|(_, day, slot, _)| (day, slot))
            .collect();
        cells.sort();
        cells
    }

    #[test]
    fn test_sessions_are_synchronised_across_batches() {
        let mut grid = Grid::default();
        let shortfalls = schedule_electives(&mut grid, &Curriculum::default(), &distinct_bindings(), &mut SeededRng::from_seed(9));
        assert!(shortfalls.is_empty());

        let cells = session_cells(&grid);
        assert_eq!(cells.len(), 3);
        for &(day, slot) in &cells {
            assert_ne!(day, Day::Saturday);
            assert!(grid.is_available(day, slot, None));
            let b1 = grid.cell(Track::Batch(Batch::B1), day, slot).unwrap();
            let b2 = grid.cell(Track::Batch(Batch::B2), day, slot).unwrap();
            let b3 = grid.cell(Track::Batch(Batch::B3), day, slot).unwrap();
            assert_eq!((b1.subject.as_str(), b1.teacher.as_str()), ("IM551", "Asha"));
            assert_eq!((b2.subject.as_str(), b2.teacher.as_str()), ("IM552", "Bala"));
            assert_eq!((b3.subject.as_str(), b3.teacher.as_str()), ("IM555", "Chitra"));
        }

        let days: HashSet<Day> = cells.iter().map(|(d, _)| *d).collect();
        let slots: HashSet<usize> = cells.iter().map(|(_, s)| *s).collect();
        assert_eq!(days.len(), 3);
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_in_order_takes_diagonal() {
        let mut grid = Grid::default();
        schedule_electives(&mut grid, &Curriculum::default(), &distinct_bindings(), &mut InOrder);
        assert_eq!(
            session_cells(&grid),
            vec![(Day::Monday, 0), (Day::Tuesday, 1), (Day::Wednesday, 2)]
        );
    }

    #[test]
    fn test_second_sweep_reuses_days() {
        let mut grid = Grid::default();
        // Only Monday has room for all three batches
        for day in [Day::Tuesday, Day::Wednesday, Day::Thursday, Day::Friday] {
            for slot in teaching_slots() {
                grid.assign(Track::Batch(Batch::B2), day, slot, CellAssignment::core("X", "X", "Other"))
                    .unwrap();
            }
        }
        let shortfalls = schedule_electives(&mut grid, &Curriculum::default(), &distinct_bindings(), &mut InOrder);
        assert!(shortfalls.is_empty());
        assert_eq!(
            session_cells(&grid),
            vec![(Day::Monday, 0), (Day::Monday, 1), (Day::Monday, 2)]
        );
    }

    #[test]
    fn test_teacher_clash_blocks_cell() {
        let mut grid = Grid::default();
        grid.assign(Track::Main, Day::Monday, 0, CellAssignment::core("IM51", "SMA", "Bala"))
            .unwrap();
        schedule_electives(&mut grid, &Curriculum::default(), &distinct_bindings(), &mut InOrder);
        assert!(grid.cell(Track::Batch(Batch::B1), Day::Monday, 0).is_none());
        assert_eq!(session_cells(&grid)[0], (Day::Monday, 1));
    }

    #[test]
    fn test_shared_placeholder_teacher_places_nothing() {
        let mut grid = Grid::default();
        let shortfalls = schedule_electives(&mut grid, &Curriculum::default(), &TeacherBindings::new(), &mut InOrder);
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].kind, ShortfallKind::Elective);
        assert_eq!(shortfalls[0].missing, 3);
        assert_eq!(shortfalls[0].subject, "IM551/IM552/IM555");
        assert_eq!(grid.occupied().count(), 0);
    }

    #[test]
    fn test_slot_indices_cap_sessions() {
        let mut grid = Grid::default();
        let curriculum = Curriculum {
            elective_sessions: 9,
            ..Curriculum::default()
        };
        let shortfalls = schedule_electives(&mut grid, &curriculum, &distinct_bindings(), &mut SeededRng::from_seed(1));
        // Only seven distinct teaching slot indices exist
        assert_eq!(session_cells(&grid).len(), 7);
        assert_eq!(shortfalls[0].missing, 2);
    }
}
