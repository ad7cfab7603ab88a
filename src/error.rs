use thiserror::Error;

use crate::schedule::types::{Day, Track};

#[derive(Error, Debug)]
pub enum TimetableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid teacher binding on line {line}: {reason}")]
    InvalidBinding { line: usize, reason: String },
    #[error("Invalid curriculum: {0}")]
    InvalidCurriculum(String),
    #[error("Cell {track} {day} slot {slot} is already occupied")]
    CellOccupied { track: Track, day: Day, slot: usize },
    #[error("Slot {0} is the break and cannot be assigned")]
    BreakSlot(usize),
}

pub type Result<T> = std::result::Result<T, TimetableError>;
