//! Event categories used for activity accounting and health queries.

use crate::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Enrollment,
    Instructor,
    Person,
    Group,
}

impl EventCategory {
    /// Every category, in reporting order.
    pub const ALL: [EventCategory; 4] = [
        EventCategory::Enrollment,
        EventCategory::Instructor,
        EventCategory::Person,
        EventCategory::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Enrollment => "enrollment",
            EventCategory::Instructor => "instructor",
            EventCategory::Person => "person",
            EventCategory::Group => "group",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EnvelopeError::UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "Enrollment".parse::<EventCategory>().unwrap(),
            EventCategory::Enrollment
        );
        assert_eq!(" group ".parse::<EventCategory>().unwrap(), EventCategory::Group);
    }

    #[test]
    fn test_parse_unknown_category() {
        assert!(matches!(
            "course".parse::<EventCategory>(),
            Err(EnvelopeError::UnknownCategory(_))
        ));
    }
}
