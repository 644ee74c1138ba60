use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActivityError {
    #[error("activity name cannot be empty")]
    EmptyName,

    #[error("unknown grade level: {0}")]
    UnknownGrade(String),

    #[error("unknown subject: {0}")]
    UnknownSubject(String),
}

//
// ─── GRADE LEVEL ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeLevel {
    Third,
    Fifth,
}

impl GradeLevel {
    pub const ALL: [GradeLevel; 2] = [GradeLevel::Third, GradeLevel::Fifth];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GradeLevel::Third => "third",
            GradeLevel::Fifth => "fifth",
        }
    }

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            GradeLevel::Third => 3,
            GradeLevel::Fifth => 5,
        }
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeLevel::Third => f.write_str("3rd grade"),
            GradeLevel::Fifth => f.write_str("5th grade"),
        }
    }
}

impl FromStr for GradeLevel {
    type Err = ActivityError;

    /// Accepts `third`/`fifth`, `3`/`5` and `3rd`/`5th`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "third" | "3" | "3rd" => Ok(GradeLevel::Third),
            "fifth" | "5" | "5th" => Ok(GradeLevel::Fifth),
            _ => Err(ActivityError::UnknownGrade(s.to_string())),
        }
    }
}

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Reading,
    Math,
    SocialStudies,
    Science,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::Reading,
        Subject::Math,
        Subject::SocialStudies,
        Subject::Science,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Reading => "reading",
            Subject::Math => "math",
            Subject::SocialStudies => "social_studies",
            Subject::Science => "science",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Reading => f.write_str("Reading"),
            Subject::Math => f.write_str("Math"),
            Subject::SocialStudies => f.write_str("Social Studies"),
            Subject::Science => f.write_str("Science"),
        }
    }
}

impl FromStr for Subject {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "reading" => Ok(Subject::Reading),
            "math" => Ok(Subject::Math),
            "social_studies" => Ok(Subject::SocialStudies),
            "science" => Ok(Subject::Science),
            _ => Err(ActivityError::UnknownSubject(s.to_string())),
        }
    }
}

//
// ─── ACTIVITY ID ───────────────────────────────────────────────────────────────
//

/// Stable identifier derived from an activity's display name.
///
/// The name is trimmed, lowercased, and every run of whitespace becomes a
/// single hyphen: `"States and  Capitals"` → `"states-and-capitals"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    /// Derive the id from a display name.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::EmptyName` when the name is blank.
    pub fn from_display_name(name: &str) -> Result<Self, ActivityError> {
        let slug = name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() {
            return Err(ActivityError::EmptyName);
        }
        Ok(Self(slug))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ActivityId {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_display_name(s)
    }
}

//
// ─── ACTIVITY KEY ──────────────────────────────────────────────────────────────
//

/// Key under which a progress store aggregates completions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityKey {
    pub grade: GradeLevel,
    pub subject: Subject,
    pub activity: ActivityId,
}

impl ActivityKey {
    #[must_use]
    pub fn new(grade: GradeLevel, subject: Subject, activity: ActivityId) -> Self {
        Self {
            grade,
            subject,
            activity,
        }
    }

    /// Build a key straight from an activity display name.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::EmptyName` when the name is blank.
    pub fn for_activity(
        grade: GradeLevel,
        subject: Subject,
        display_name: &str,
    ) -> Result<Self, ActivityError> {
        Ok(Self::new(
            grade,
            subject,
            ActivityId::from_display_name(display_name)?,
        ))
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.grade.as_str(),
            self.subject.as_str(),
            self.activity
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_id_is_lowercased_and_hyphenated() {
        let id = ActivityId::from_display_name("States and Capitals").unwrap();
        assert_eq!(id.as_str(), "states-and-capitals");
    }

    #[test]
    fn activity_id_collapses_whitespace_runs() {
        let id = ActivityId::from_display_name("  Multiplication\tFacts  Quiz ").unwrap();
        assert_eq!(id.as_str(), "multiplication-facts-quiz");
    }

    #[test]
    fn blank_activity_name_is_rejected() {
        assert_eq!(
            ActivityId::from_display_name("   ").unwrap_err(),
            ActivityError::EmptyName
        );
    }

    #[test]
    fn grade_parses_common_spellings() {
        assert_eq!("3".parse::<GradeLevel>().unwrap(), GradeLevel::Third);
        assert_eq!("5th".parse::<GradeLevel>().unwrap(), GradeLevel::Fifth);
        assert_eq!("Fifth".parse::<GradeLevel>().unwrap(), GradeLevel::Fifth);
        assert!("4".parse::<GradeLevel>().is_err());
    }

    #[test]
    fn subject_parses_display_and_storage_forms() {
        for subject in Subject::ALL {
            assert_eq!(subject.as_str().parse::<Subject>().unwrap(), subject);
            assert_eq!(subject.to_string().parse::<Subject>().unwrap(), subject);
        }
    }

    #[test]
    fn key_display_is_path_like() {
        let key =
            ActivityKey::for_activity(GradeLevel::Fifth, Subject::SocialStudies, "US States")
                .unwrap();
        assert_eq!(key.to_string(), "fifth/social_studies/us-states");
    }
}
