//! # Event Dispatch Subsystem (EC-03)
//!
//! Routes authenticated, decrypted change events to domain handlers and
//! accounts for what they load.
//!
//! ## Message Types
//!
//! | MessageType | Version | Handler | Activity category |
//! |-------------|---------|---------|-------------------|
//! | `uw-student-registration-v2` | `2` | Enrollment | enrollment |
//! | `uw-instructor-add` | `1` | Instructor (add) | instructor |
//! | `uw-instructor-drop` | `1` | Instructor (drop) | instructor |
//! | `uw-person-change-v1` | `1` | Person | person |
//! | `gws` | `UWIT-1` | Group | group |
//!
//! ## Failure Isolation
//!
//! | Failure | Scope | Response class |
//! |---------|-------|----------------|
//! | Unknown action code | one event, skipped | - |
//! | Malformed event inside a batch | one event, skipped | - |
//! | Nested group lookup refused | one nested group, skipped | - |
//! | Malformed envelope, unknown type | message | 400 |
//! | Signature, key or decryption failure | message | 401 |
//! | Sink, store or lookup failure | message, applied records stay | 500 |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/  - in-memory record store, fixed upstream lookups   │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - EventIngestApi                            │
//! │  ports/outbound.rs - UpdateSink, ScheduleGate, IdentityStore,  │
//! │                      GroupStore, MembershipLookup, Roster      │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service.rs - EventEngine pipeline                             │
//! │  handlers/  - enrollment, instructor, person, group routing    │
//! │  domain/    - records, payload shapes, policy, errors          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{MemoryRecordStore, StaticMembership, StaticScheduleGate};
pub use domain::config::{DispatchConfig, DEFAULT_CAMPUS};
pub use domain::errors::{
    IngestError, LoadError, ResponseClass, SkipReason, UnknownActionError,
    UnknownMessageTypeError,
};
pub use domain::outcome::{EventOutcome, HandlerReport};
pub use domain::policy::PolicyError;
pub use domain::records::{
    CourseMember, CourseMemberKey, EnrollmentRole, EnrollmentStatus, EnrollmentUpdate,
    GroupMember, GroupRecord, IdentityRecord, MemberGroupRecord, MemberType, Priority,
    SectionRef, DELETED_BY_EVENT,
};
pub use handlers::{
    EnrollmentHandler, GroupAction, GroupHandler, GroupOwner, HandlerKind, InstructorChange,
    InstructorHandler, PersonHandler,
};
pub use ports::inbound::EventIngestApi;
pub use ports::outbound::{
    EffectiveMembers, GroupStore, IdentityStore, LookupError, MembershipError, MembershipLookup,
    OfficialRoster, ScheduleGate, SinkError, StoreError, UpdateSink,
};
pub use service::{EnginePorts, EventEngine};
