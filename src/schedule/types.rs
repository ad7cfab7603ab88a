use std::fmt;

use serde::{Deserialize, Serialize};

use super::grid::Grid;

pub const DAY_COUNT: usize = 6;
pub const BATCH_COUNT: usize = 3;

/// Teaching day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; DAY_COUNT] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the three parallel sub-cohorts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Batch {
    B1,
    B2,
    B3,
}

impl Batch {
    pub const ALL: [Batch; BATCH_COUNT] = [Batch::B1, Batch::B2, Batch::B3];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Batch::B1 => "B1",
            Batch::B2 => "B2",
            Batch::B3 => "B3",
        }
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which matrix of the grid a cell lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Track {
    Main,
    Batch(Batch),
}

impl From<Option<Batch>> for Track {
    fn from(batch: Option<Batch>) -> Self {
        match batch {
            Some(b) => Track::Batch(b),
            None => Track::Main,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Main => f.write_str("main"),
            Track::Batch(b) => write!(f, "batch {}", b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Core,
    Lab,
    Elective,
}

/// A session placed into one grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellAssignment {
    pub subject: String,
    pub name: String,
    pub teacher: String,
    #[serde(rename = "type")]
    pub category: Category,
}

impl CellAssignment {
    pub fn core(subject: &str, name: &str, teacher: &str) -> Self {
        Self {
            subject: subject.to_string(),
            name: name.to_string(),
            teacher: teacher.to_string(),
            category: Category::Core,
        }
    }

    pub fn lab(subject: &str, name: &str, teacher: &str) -> Self {
        Self {
            category: Category::Lab,
            ..Self::core(subject, name, teacher)
        }
    }

    pub fn elective(subject: &str, name: &str, teacher: &str) -> Self {
        Self {
            category: Category::Elective,
            ..Self::core(subject, name, teacher)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallKind {
    Theory,
    Tutorial,
    LabRotation,
    CohortLab,
    Elective,
}

/// A requirement the passes could not fully place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub kind: ShortfallKind,
    pub subject: String,
    pub day: Option<Day>,
    pub batch: Option<Batch>,
    pub missing: u32,
}

/// Result of one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTimetable {
    pub grid: Grid,
    pub shortfalls: Vec<Shortfall>,
}

impl GeneratedTimetable {
    pub fn is_complete(&self) -> bool {
        self.shortfalls.is_empty()
    }

    pub fn missing_sessions(&self) -> u32 {
        self.shortfalls.iter().map(|s| s.missing).sum()
    }
}
