use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};
use super::conflict::TeacherMatch;
use super::slot_utils::{is_break, SLOTS_PER_DAY};
use super::types::{Batch, CellAssignment, Day, Track, BATCH_COUNT, DAY_COUNT};

pub type DayRow = [Option<CellAssignment>; SLOTS_PER_DAY];

/// One day x slot matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    cells: [DayRow; DAY_COUNT],
}

impl Matrix {
    pub fn get(&self, day: Day, slot: usize) -> Option<&CellAssignment> {
        self.cells[day.index()].get(slot).and_then(Option::as_ref)
    }

    pub fn row(&self, day: Day) -> &DayRow {
        &self.cells[day.index()]
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}

/// The weekly schedule: one cohort-wide matrix plus one per batch.
///
/// Cells are write-once for the life of the grid; `assign` refuses to
/// overwrite an occupied cell or to write into the break slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    main: Matrix,
    batches: [Matrix; BATCH_COUNT],
    teacher_match: TeacherMatch,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(TeacherMatch::default())
    }
}

impl Grid {
    pub fn new(teacher_match: TeacherMatch) -> Self {
        Self {
            main: Matrix::default(),
            batches: Default::default(),
            teacher_match,
        }
    }

    pub fn teacher_match(&self) -> TeacherMatch {
        self.teacher_match
    }

    pub fn matrix(&self, track: Track) -> &Matrix {
        match track {
            Track::Main => &self.main,
            Track::Batch(b) => &self.batches[b.index()],
        }
    }

    fn matrix_mut(&mut self, track: Track) -> &mut Matrix {
        match track {
            Track::Main => &mut self.main,
            Track::Batch(b) => &mut self.batches[b.index()],
        }
    }

    pub fn tracks() -> impl Iterator<Item = Track> {
        std::iter::once(Track::Main).chain(Batch::ALL.into_iter().map(Track::Batch))
    }

    pub fn cell(&self, track: Track, day: Day, slot: usize) -> Option<&CellAssignment> {
        self.matrix(track).get(day, slot)
    }

    /// Whether the cell at (day, slot) of the main matrix, or of `batch`'s
    /// matrix when given, is free and not the break.
    pub fn is_available(&self, day: Day, slot: usize, batch: Option<Batch>) -> bool {
        if is_break(slot) || slot >= SLOTS_PER_DAY {
            return false;
        }
        self.cell(Track::from(batch), day, slot).is_none()
    }

    /// Whether `teacher` already holds any cell at (day, slot), in the main
    /// matrix or in any batch matrix.
    pub fn has_teacher_conflict(&self, day: Day, slot: usize, teacher: &str) -> bool {
        Self::tracks().any(|track| {
            self.cell(track, day, slot)
                .map(|placed| self.teacher_match.matches(&placed.teacher, teacher))
                .unwrap_or(false)
        })
    }

    /// Whether any of `teachers` conflicts at any of `slots` on `day`
    pub fn any_teacher_conflict<S, T>(&self, day: Day, slots: S, teachers: &[T]) -> bool
    where
        S: IntoIterator<Item = usize>,
        T: AsRef<str>,
    {
        slots.into_iter().any(|slot| {
            teachers
                .iter()
                .any(|t| self.has_teacher_conflict(day, slot, t.as_ref()))
        })
    }

    pub fn assign(&mut self, track: Track, day: Day, slot: usize, cell: CellAssignment) -> Result<()> {
        if is_break(slot) {
            return Err(TimetableError::BreakSlot(slot));
        }
        match self.matrix_mut(track).cells[day.index()].get_mut(slot) {
            Some(target) if target.is_none() => {
                *target = Some(cell);
                Ok(())
            }
            _ => Err(TimetableError::CellOccupied { track, day, slot }),
        }
    }

    /// Every occupied cell as (track, day, slot, assignment)
    pub fn occupied(&self) -> impl Iterator<Item = (Track, Day, usize, &CellAssignment)> + '_ {
        Self::tracks().flat_map(move |track| {
            Day::ALL.into_iter().flat_map(move |day| {
                self.matrix(track)
                    .row(day)
                    .iter()
                    .enumerate()
                    .filter_map(move |(slot, cell)| cell.as_ref().map(|c| (track, day, slot, c)))
            })
        })
    }
}
