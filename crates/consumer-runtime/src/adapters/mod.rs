//! # Runtime Adapters
//!
//! Outbound port implementations backed by the upstream HTTP services, plus
//! the file that carries activity buckets between runs.

pub mod activity_file;
pub mod certificates;
pub mod http;
pub mod key_service;
pub mod membership;
pub mod schedule;

pub use activity_file::{ActivityFileError, FileActivityStore};
pub use certificates::HttpCertificateFetcher;
pub use http::{HttpError, HttpGetter, HttpResponse};
pub use key_service::HttpKeyService;
pub use membership::{expand_members, GwsMembership, MemberSource, ACT_AS_HEADER};
pub use schedule::SwsScheduleGate;
