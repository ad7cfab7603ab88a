pub mod types;
pub mod slot_utils;
pub mod conflict;
pub mod grid;
pub mod ranges;
pub mod random;
pub mod labs;
pub mod theory;
pub mod electives;
pub mod generate;
pub mod validation;

pub use types::{Batch, CellAssignment, Category, Day, GeneratedTimetable, Shortfall, ShortfallKind, Track};
pub use conflict::TeacherMatch;
pub use grid::Grid;
pub use random::{InOrder, SeededRng, SlotRng};
pub use slot_utils::{slot_to_time, BREAK_SLOT, SLOTS_PER_DAY};
pub use generate::generate_timetable;
pub use validation::validate_grid;
