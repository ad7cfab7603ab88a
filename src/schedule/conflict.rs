use serde::{Deserialize, Serialize};

/// How two teacher identities are compared when checking for double-booking.
///
/// Co-taught labs store their teachers as one joined identity ("SK, Sudheer").
/// `Exact` compares the joined strings as-is, so that lab does not block a
/// separate session taught by "SK" alone. `PerTeacher` splits joined identities
/// on `,` and `/` and reports a match when any individual appears on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherMatch {
    #[default]
    Exact,
    PerTeacher,
}

impl TeacherMatch {
    pub fn matches(self, placed: &str, teacher: &str) -> bool {
        match self {
            TeacherMatch::Exact => placed == teacher,
            TeacherMatch::PerTeacher => {
                split_teachers(placed).any(|a| split_teachers(teacher).any(|b| a == b))
            }
        }
    }

    /// True when no two of the given identities match each other
    pub fn all_distinct(self, teachers: &[&str]) -> bool {
        teachers.iter().enumerate().all(|(i, a)| {
            teachers[i + 1..].iter().all(|b| !self.matches(a, b))
        })
    }
}

/// Individual names inside a joined identity
pub fn split_teachers(identity: &str) -> impl Iterator<Item = &str> {
    identity
        .split(|c: char| c == ',' || c == '/')
        .map(str::trim)
        .filter(|name| !name.is_empty())
}
