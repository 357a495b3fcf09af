//! # Domain Handlers
//!
//! One handler per declared (message type, version) pair. Routing is a
//! closed match over header values and runs before any key lookup or
//! decryption.
//!
//! | Handler | MessageType | Version | Category |
//! |---------|-------------|---------|----------|
//! | Enrollment | `uw-student-registration-v2` | `2` | enrollment |
//! | InstructorAdd | `uw-instructor-add` | `1` | instructor |
//! | InstructorDrop | `uw-instructor-drop` | `1` | instructor |
//! | Person | `uw-person-change-v1` | `1` | person |
//! | Group | `gws` | `UWIT-1` | group |

pub mod enrollment;
pub mod group;
pub mod instructor;
pub mod person;

pub use enrollment::EnrollmentHandler;
pub use group::{GroupAction, GroupHandler, GroupOwner};
pub use instructor::{InstructorChange, InstructorHandler};
pub use person::PersonHandler;

use crate::domain::errors::UnknownMessageTypeError;
use shared_types::{EnvelopeHeader, EventCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Enrollment,
    InstructorAdd,
    InstructorDrop,
    Person,
    Group,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 5] = [
        HandlerKind::Enrollment,
        HandlerKind::InstructorAdd,
        HandlerKind::InstructorDrop,
        HandlerKind::Person,
        HandlerKind::Group,
    ];

    /// The (message type, version) pair this handler accepts.
    pub fn declared(&self) -> (&'static str, &'static str) {
        match self {
            HandlerKind::Enrollment => ("uw-student-registration-v2", "2"),
            HandlerKind::InstructorAdd => ("uw-instructor-add", "1"),
            HandlerKind::InstructorDrop => ("uw-instructor-drop", "1"),
            HandlerKind::Person => ("uw-person-change-v1", "1"),
            HandlerKind::Group => ("gws", "UWIT-1"),
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            HandlerKind::Enrollment => EventCategory::Enrollment,
            HandlerKind::InstructorAdd | HandlerKind::InstructorDrop => EventCategory::Instructor,
            HandlerKind::Person => EventCategory::Person,
            HandlerKind::Group => EventCategory::Group,
        }
    }

    /// Group notifications are authenticated by the transport and carry no
    /// envelope signature fields.
    pub fn requires_signature(&self) -> bool {
        !matches!(self, HandlerKind::Group)
    }

    /// Select the handler for an envelope header.
    pub fn route(header: &EnvelopeHeader) -> Result<HandlerKind, UnknownMessageTypeError> {
        let message_type = header.message_type_or_empty();
        let version = header.version_or_empty();

        HandlerKind::ALL
            .into_iter()
            .find(|kind| kind.declared() == (message_type, version))
            .ok_or_else(|| UnknownMessageTypeError {
                message_type: message_type.to_string(),
                version: version.to_string(),
            })
    }
}
