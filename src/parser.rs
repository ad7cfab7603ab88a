use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};

/// Subject code -> teacher identity for one generation run.
///
/// Codes and teachers are trimmed however they arrive, so JSON and CSV
/// input yield the same identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, String>", into = "HashMap<String, String>")]
pub struct TeacherBindings(HashMap<String, String>);

impl TeacherBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: &str, teacher: &str) -> Option<String> {
        self.0.insert(code.trim().to_string(), teacher.trim().to_string())
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Bound teacher for `code`, or `placeholder` when unbound or blank
    pub fn teacher_for(&self, code: &str, placeholder: &str) -> String {
        match self.get(code) {
            Some(teacher) if !teacher.trim().is_empty() => teacher.to_string(),
            _ => placeholder.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TeacherBindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Self::new();
        for (code, teacher) in iter {
            let (code, teacher): (String, String) = (code.into(), teacher.into());
            bindings.insert(&code, &teacher);
        }
        bindings
    }
}

impl From<HashMap<String, String>> for TeacherBindings {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<TeacherBindings> for HashMap<String, String> {
    fn from(bindings: TeacherBindings) -> Self {
        bindings.0
    }
}

/// Request body shape: either `{"teachers": {...}}` or a bare map
#[derive(Deserialize)]
#[serde(untagged)]
enum BindingsDocument {
    Wrapped { teachers: TeacherBindings },
    Bare(TeacherBindings),
}

/// Parses bindings from JSON text
pub fn bindings_from_json(text: &str) -> Result<TeacherBindings> {
    let doc: BindingsDocument = serde_json::from_str(text)?;
    Ok(match doc {
        BindingsDocument::Wrapped { teachers } => teachers,
        BindingsDocument::Bare(teachers) => teachers,
    })
}

/// Parses bindings from CSV with a header row.
///
/// The subject column is the first header mentioning "subject" or "code",
/// the teacher column the first mentioning "teacher"; otherwise columns 0
/// and 1. Later rows for the same subject replace earlier ones. Rows with a
/// blank teacher are skipped so the subject falls back to the placeholder.
pub fn bindings_from_csv<R: Read>(input: R) -> Result<TeacherBindings> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);

    let headers = reader.headers()?.clone();
    let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let subject_col = lower
        .iter()
        .position(|h| h.contains("subject") || h.contains("code"))
        .unwrap_or(0);
    let teacher_col = lower.iter().position(|h| h.contains("teacher")).unwrap_or(1);

    let mut bindings = TeacherBindings::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        // header is line 1
        let line = index + 2;

        let subject = record.get(subject_col).unwrap_or("");
        let teacher = record.get(teacher_col).unwrap_or("");

        if subject.is_empty() {
            if teacher.is_empty() {
                continue;
            }
            return Err(TimetableError::InvalidBinding {
                line,
                reason: format!("teacher '{}' has no subject code", teacher),
            });
        }
        if teacher.is_empty() {
            log::debug!("Line {}: no teacher for {}, using placeholder", line, subject);
            continue;
        }

        if let Some(previous) = bindings.insert(subject, teacher) {
            log::info!("Line {}: {} rebound from {} to {}", line, subject, previous, teacher);
        }
    }

    Ok(bindings)
}

/// Loads bindings from a `.json` or CSV file
pub fn load_bindings<P: AsRef<Path>>(path: P) -> Result<TeacherBindings> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let text = std::fs::read_to_string(path)?;
        bindings_from_json(&text)
    } else {
        let file = std::fs::File::open(path)?;
        bindings_from_csv(file)
    }
}
