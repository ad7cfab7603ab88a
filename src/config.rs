use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};
use crate::schedule::conflict::TeacherMatch;
use crate::schedule::slot_utils::{is_break, SLOTS_PER_DAY};
use crate::schedule::types::{Batch, Day, BATCH_COUNT};

/// Environment variable naming a curriculum JSON file
pub const CURRICULUM_ENV: &str = "TIMETABLE_CURRICULUM";

/// Environment variable fixing the server's random seed
pub const SEED_ENV: &str = "TIMETABLE_SEED";

/// A subject taught to the whole cohort in the main track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSubject {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub theory: u32,
    #[serde(default)]
    pub tutorial: u32,
    /// Informational; lab sessions come from the lab rotation
    #[serde(default)]
    pub lab: u32,
}

impl CoreSubject {
    pub fn new(code: &str, name: &str, theory: u32, tutorial: u32, lab: u32) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            theory,
            tutorial,
            lab,
        }
    }

    pub fn hours(&self) -> u32 {
        self.theory + self.tutorial + self.lab
    }

    pub fn tutorial_code(&self) -> String {
        format!("{} (T)", self.code)
    }

    pub fn tutorial_name(&self) -> String {
        format!("{} (Tutorial)", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elective {
    pub code: String,
    pub name: String,
}

impl Elective {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// Lab a batch attends on a given day; `lab: None` means the batch is free
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabRotationEntry {
    pub day: Day,
    pub batch: Batch,
    #[serde(default)]
    pub lab: Option<String>,
    #[serde(default)]
    pub teachers: Vec<String>,
}

impl LabRotationEntry {
    pub fn new(day: Day, batch: Batch, lab: &str, teachers: &[&str]) -> Self {
        Self {
            day,
            batch,
            lab: Some(lab.to_string()),
            teachers: teachers.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn free(day: Day, batch: Batch) -> Self {
        Self {
            day,
            batch,
            lab: None,
            teachers: Vec::new(),
        }
    }

    pub fn is_free(&self) -> bool {
        self.lab.is_none()
    }
}

/// Single-slot lab for the whole cohort at a fixed cell of the main track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortLab {
    pub code: String,
    pub name: String,
    /// Subject code whose teacher binding runs this lab
    pub binding: String,
    pub day: Day,
    pub slot: usize,
}

/// Everything the engine needs besides the per-run teacher bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Curriculum {
    pub core_subjects: Vec<CoreSubject>,
    pub electives: Vec<Elective>,
    pub lab_rotation: Vec<LabRotationEntry>,
    pub lab_start: BTreeMap<Day, usize>,
    pub default_lab_start: usize,
    pub afternoon_start: usize,
    pub lab_duration: usize,
    pub elective_sessions: u32,
    pub cohort_lab: Option<CohortLab>,
    pub placeholder_teacher: String,
    pub teacher_match: TeacherMatch,
}

impl Default for Curriculum {
    fn default() -> Self {
        use Batch::*;
        use Day::*;

        Self {
            core_subjects: vec![
                CoreSubject::new("IM51", "SMA (Simulation Modelling & Analysis)", 3, 2, 0),
                CoreSubject::new("IM52", "CIM (Computer Integrated Manufacturing)", 2, 0, 2),
                CoreSubject::new("IM53", "OM (Operations Management)", 3, 0, 0),
                CoreSubject::new("IM54", "ERP (Enterprise Resource Planning)", 3, 0, 0),
                CoreSubject::new("HS510", "EVS (Environmental Science)", 1, 0, 0),
                CoreSubject::new("IMAEC59", "Risk Management", 1, 0, 0),
                CoreSubject::new("AL58", "Research Methodology & IPR", 3, 0, 0),
            ],
            electives: vec![
                Elective::new("IM551", "HFE (Human Factors Engineering)"),
                Elective::new("IM552", "DBMS (Database Management Systems)"),
                Elective::new("IM555", "Digital Manufacturing"),
            ],
            lab_rotation: vec![
                LabRotationEntry::new(Monday, B1, "FPD", &["SK", "Sudheer"]),
                LabRotationEntry::new(Monday, B2, "ERP", &["Hamritha", "Niranjan"]),
                LabRotationEntry::free(Monday, B3),
                LabRotationEntry::free(Tuesday, B1),
                LabRotationEntry::new(Tuesday, B2, "FPD", &["SK", "Niranjan"]),
                LabRotationEntry::new(Tuesday, B3, "ERP", &["Hamritha", "Sudheer"]),
                LabRotationEntry::new(Thursday, B1, "ERP", &["SK", "Hema"]),
                LabRotationEntry::free(Thursday, B2),
                LabRotationEntry::new(Thursday, B3, "FPD", &["Hamritha", "Sudheer"]),
            ],
            lab_start: BTreeMap::from([(Monday, 6), (Tuesday, 6), (Thursday, 2)]),
            default_lab_start: 6,
            afternoon_start: 5,
            lab_duration: 2,
            elective_sessions: 3,
            cohort_lab: Some(CohortLab {
                code: "IM52 Lab".to_string(),
                name: "CIM Lab".to_string(),
                binding: "IM52".to_string(),
                day: Saturday,
                slot: 1,
            }),
            placeholder_teacher: "Teacher".to_string(),
            teacher_match: TeacherMatch::Exact,
        }
    }
}

impl Curriculum {
    /// Reads a curriculum from a JSON file; omitted fields keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let curriculum: Curriculum = serde_json::from_str(&text)?;
        curriculum.validate()?;
        Ok(curriculum)
    }

    /// Loads the file named by `TIMETABLE_CURRICULUM`, or the built-in default
    pub fn from_env() -> Result<Self> {
        match std::env::var(CURRICULUM_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                log::info!("Loading curriculum from {}", path);
                Self::load(path.trim())
            }
            _ => Ok(Self::default()),
        }
    }

    /// Preferred first slot of a lab block on `day`
    pub fn lab_start_for(&self, day: Day) -> usize {
        self.lab_start.get(&day).copied().unwrap_or(self.default_lab_start)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(TimetableError::InvalidCurriculum(msg));

        if self.electives.len() != BATCH_COUNT {
            return invalid(format!(
                "expected {} electives (one per batch), found {}",
                BATCH_COUNT,
                self.electives.len()
            ));
        }
        if self.lab_duration == 0 || self.lab_duration > SLOTS_PER_DAY {
            return invalid(format!("lab duration {} is out of range", self.lab_duration));
        }
        if self.afternoon_start >= SLOTS_PER_DAY {
            return invalid(format!("afternoon start {} is out of range", self.afternoon_start));
        }
        for (day, slot) in self.lab_start.iter().map(|(d, s)| (Some(*d), *s)).chain([(None, self.default_lab_start)]) {
            if slot >= SLOTS_PER_DAY {
                let day = day.map(|d| d.to_string()).unwrap_or_else(|| "default".to_string());
                return invalid(format!("lab start slot {} for {} is out of range", slot, day));
            }
        }
        if let Some(lab) = &self.cohort_lab {
            if lab.slot >= SLOTS_PER_DAY || is_break(lab.slot) {
                return invalid(format!("cohort lab slot {} is not assignable", lab.slot));
            }
        }

        let mut codes = HashSet::new();
        for subject in &self.core_subjects {
            if !codes.insert(subject.code.as_str()) {
                return invalid(format!("duplicate subject code {}", subject.code));
            }
        }
        for elective in &self.electives {
            if !codes.insert(elective.code.as_str()) {
                return invalid(format!("duplicate subject code {}", elective.code));
            }
        }

        let mut rotation = HashSet::new();
        for entry in &self.lab_rotation {
            if !rotation.insert((entry.day, entry.batch)) {
                return invalid(format!("duplicate lab rotation entry for {} {}", entry.day, entry.batch));
            }
            if !entry.is_free() && entry.teachers.is_empty() {
                return invalid(format!("lab on {} for {} has no teachers", entry.day, entry.batch));
            }
        }

        Ok(())
    }
}
