//! Structural checks over a finished grid.
//!
//! Detects:
//! - Sessions in the break slot
//! - A teacher holding two cells at the same (day, slot)
//! - Lab blocks of the wrong length
//! - Electives outside the batch tracks or not running in all batches at once

use crate::config::Curriculum;
use super::grid::Grid;
use super::labs::lab_blocks;
use super::slot_utils::{is_break, SLOTS_PER_DAY};
use super::types::{Batch, Category, Day, Track};

pub type ValidationResult = Result<(), Vec<ValidationError>>;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    BreakOccupied,
    TeacherDoubleBooked,
    LabBlockLength,
    ElectiveInMainTrack,
    ElectiveNotSynchronized,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Checks every invariant a generated grid must hold.
///
/// Batch labs must span exactly `lab_duration` slots; labs in the main
/// track are single-slot. Teacher comparison follows the grid's own
/// `TeacherMatch`.
pub fn validate_grid(grid: &Grid, curriculum: &Curriculum) -> ValidationResult {
    let mut errors = Vec::new();

    for (track, day, slot, cell) in grid.occupied() {
        if is_break(slot) {
            errors.push(ValidationError::new(
                ValidationErrorKind::BreakOccupied,
                format!("{} on {} {} sits in the break", cell.subject, track, day),
            ));
        }
    }

    check_teachers(grid, &mut errors);
    check_labs(grid, curriculum, &mut errors);
    check_electives(grid, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_teachers(grid: &Grid, errors: &mut Vec<ValidationError>) {
    let policy = grid.teacher_match();
    for day in Day::ALL {
        for slot in 0..SLOTS_PER_DAY {
            let cells: Vec<(Track, &str)> = Grid::tracks()
                .filter_map(|track| grid.cell(track, day, slot).map(|c| (track, c.teacher.as_str())))
                .collect();
            for (i, (track_a, a)) in cells.iter().enumerate() {
                for (track_b, b) in &cells[i + 1..] {
                    if policy.matches(a, b) {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::TeacherDoubleBooked,
                            format!("{} and {} share a teacher on {} slot {} ({} / {})", track_a, track_b, day, slot, a, b),
                        ));
                    }
                }
            }
        }
    }
}

fn check_labs(grid: &Grid, curriculum: &Curriculum, errors: &mut Vec<ValidationError>) {
    for track in Grid::tracks() {
        let expected = match track {
            Track::Main => 1,
            Track::Batch(_) => curriculum.lab_duration,
        };
        for day in Day::ALL {
            for (start, end) in lab_blocks(grid, track, day) {
                if end - start + 1 != expected {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::LabBlockLength,
                        format!(
                            "lab on {} {} spans slots {}-{}, expected {} slot(s)",
                            track, day, start, end, expected
                        ),
                    ));
                }
            }
        }
    }
}

fn check_electives(grid: &Grid, errors: &mut Vec<ValidationError>) {
    let is_elective = |track: Track, day: Day, slot: usize| {
        grid.cell(track, day, slot)
            .map(|c| c.category == Category::Elective)
            .unwrap_or(false)
    };

    for day in Day::ALL {
        for slot in 0..SLOTS_PER_DAY {
            if is_elective(Track::Main, day, slot) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ElectiveInMainTrack,
                    format!("elective in the main track on {} slot {}", day, slot),
                ));
            }
            let in_batches = Batch::ALL
                .into_iter()
                .filter(|b| is_elective(Track::Batch(*b), day, slot))
                .count();
            if in_batches > 0 && in_batches < Batch::ALL.len() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ElectiveNotSynchronized,
                    format!("only {} batch(es) have an elective on {} slot {}", in_batches, day, slot),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::conflict::TeacherMatch;
    use crate::schedule::types::CellAssignment;

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_empty_grid_is_valid() {
        assert!(validate_grid(&Grid::default(), &Curriculum::default()).is_ok());
    }

    #[test]
    fn test_detects_double_booking() {
        let mut grid = Grid::default();
        grid.assign(Track::Main, Day::Monday, 0, CellAssignment::core("A", "A", "Rao")).unwrap();
        grid.assign(Track::Batch(Batch::B2), Day::Monday, 0, CellAssignment::core("B", "B", "Rao")).unwrap();
        assert_eq!(
            kinds(validate_grid(&grid, &Curriculum::default())),
            vec![ValidationErrorKind::TeacherDoubleBooked]
        );
    }

    #[test]
    fn test_co_teacher_overlap_depends_on_policy() {
        let build = |policy| {
            let mut grid = Grid::new(policy);
            grid.assign(Track::Batch(Batch::B1), Day::Monday, 6, CellAssignment::lab("L", "L", "SK, Hema")).unwrap();
            grid.assign(Track::Batch(Batch::B1), Day::Monday, 7, CellAssignment::lab("L", "L", "SK, Hema")).unwrap();
            grid.assign(Track::Main, Day::Monday, 6, CellAssignment::core("A", "A", "SK")).unwrap();
            grid
        };
        assert!(validate_grid(&build(TeacherMatch::Exact), &Curriculum::default()).is_ok());
        assert_eq!(
            kinds(validate_grid(&build(TeacherMatch::PerTeacher), &Curriculum::default())),
            vec![ValidationErrorKind::TeacherDoubleBooked]
        );
    }

    #[test]
    fn test_detects_short_lab_and_unsynchronised_elective() {
        let mut grid = Grid::default();
        grid.assign(Track::Batch(Batch::B1), Day::Friday, 2, CellAssignment::lab("L", "L", "SK")).unwrap();
        grid.assign(Track::Batch(Batch::B3), Day::Friday, 6, CellAssignment::elective("E", "E", "Asha"))
            .unwrap();
        assert_eq!(
            kinds(validate_grid(&grid, &Curriculum::default())),
            vec![ValidationErrorKind::LabBlockLength, ValidationErrorKind::ElectiveNotSynchronized]
        );
    }

    #[test]
    fn test_detects_elective_in_main_track() {
        let mut grid = Grid::default();
        grid.assign(Track::Main, Day::Friday, 6, CellAssignment::elective("E", "E", "Asha")).unwrap();
        assert_eq!(
            kinds(validate_grid(&grid, &Curriculum::default())),
            vec![ValidationErrorKind::ElectiveInMainTrack]
        );
    }
}
