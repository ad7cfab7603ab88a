use crate::config::Curriculum;
use crate::error::Result;
use crate::parser::TeacherBindings;
use super::electives::schedule_electives;
use super::grid::Grid;
use super::labs::schedule_labs;
use super::random::SlotRng;
use super::theory::schedule_core_subjects;
use super::types::GeneratedTimetable;

/// Runs one full generation on a fresh grid.
///
/// The curriculum is validated first. Passes run in a fixed order (labs,
/// core subjects, electives) and never undo each other's placements.
/// Requirements that do not fit are returned as shortfalls next to the grid.
pub fn generate_timetable<R: SlotRng>(
    curriculum: &Curriculum,
    bindings: &TeacherBindings,
    rng: &mut R,
) -> Result<GeneratedTimetable> {
    curriculum.validate()?;
    let mut grid = Grid::new(curriculum.teacher_match);

    let mut shortfalls = schedule_labs(&mut grid, curriculum, bindings, rng);
    shortfalls.extend(schedule_core_subjects(&mut grid, curriculum, bindings, rng));
    shortfalls.extend(schedule_electives(&mut grid, curriculum, bindings, rng));

    let timetable = GeneratedTimetable { grid, shortfalls };
    log::info!(
        "Generated timetable: {} cells filled, {} bindings, {} session(s) unplaced",
        timetable.grid.occupied().count(),
        bindings.len(),
        timetable.missing_sessions()
    );
    Ok(timetable)
}
