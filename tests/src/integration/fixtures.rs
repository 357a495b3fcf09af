//! Test fixtures: a fully wired engine over in-memory upstreams, and
//! builders for signed, encrypted envelopes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ec_01_message_extraction::{
    canonical_signing_string, ExtractionConfig, InMemoryKeyCache, MessageExtractionService,
    ResolvedKey, StaticCertificates, StaticKeyService,
};
use ec_02_activity_log::{ActivityConfig, ActivityLog, InMemoryActivityStore};
use ec_03_event_dispatch::{
    DispatchConfig, EnginePorts, EventEngine, MemoryRecordStore, StaticMembership,
    StaticScheduleGate,
};
use serde_json::Value;
use shared_crypto::testing::TestSigner;
use shared_crypto::{encrypt, Iv, SecretKey, SignatureDigest};
use shared_types::{Envelope, EnvelopeHeader, FixedTimeSource, TimeSource};
use std::sync::Arc;

pub const NOW: u64 = 1_700_000_000;
pub const OLD_SECRET: &str = "MDEyMzQ1Njc4OWFiY2RlZg=="; // 0123456789abcdef
pub const NEW_SECRET: &str = "ZmVkY2JhOTg3NjU0MzIxMA=="; // fedcba9876543210
pub const IV_B64: &str = "BwcHBwcHBwcHBwcHBwcHBw==";
pub const CERT_URL: &str = "https://certs.example.edu/signing.pem";
pub const TIMESTAMP: &str = "2024-09-20T08:00:00Z";

pub const ENROLLMENT: (&str, &str) = ("uw-student-registration-v2", "2");
pub const INSTRUCTOR_ADD: (&str, &str) = ("uw-instructor-add", "1");
pub const PERSON: (&str, &str) = ("uw-person-change-v1", "1");
pub const GROUP: (&str, &str) = ("gws", "UWIT-1");

/// Engine plus handles on every in-memory collaborator.
pub struct World {
    pub engine: EventEngine,
    pub keys: Arc<StaticKeyService>,
    pub cache: Arc<InMemoryKeyCache>,
    pub store: Arc<MemoryRecordStore>,
    pub activity: Arc<InMemoryActivityStore>,
    pub log: Arc<ActivityLog>,
    pub schedule: Arc<StaticScheduleGate>,
    pub membership: Arc<StaticMembership>,
    pub clock: Arc<FixedTimeSource>,
    pub signer: TestSigner,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default(), DispatchConfig::default())
    }

    pub fn with_config(extraction: ExtractionConfig, dispatch: DispatchConfig) -> Self {
        let signer = TestSigner::generate();
        let certificates = Arc::new(StaticCertificates::new());
        certificates.insert(CERT_URL, signer.public_key_pem());

        let keys = Arc::new(StaticKeyService::new());
        let cache = Arc::new(InMemoryKeyCache::new());
        let clock = Arc::new(FixedTimeSource::new(NOW));
        let time: Arc<dyn TimeSource> = clock.clone();

        let activity = Arc::new(InMemoryActivityStore::new());
        let log = Arc::new(ActivityLog::new(
            activity.clone(),
            time.clone(),
            ActivityConfig::default(),
        ));

        let store = Arc::new(MemoryRecordStore::new());
        let schedule = Arc::new(StaticScheduleGate::new());
        let membership = Arc::new(StaticMembership::new());

        let extraction = Arc::new(MessageExtractionService::new(
            extraction,
            keys.clone(),
            cache.clone(),
            certificates,
        ));
        let engine = EventEngine::new(
            extraction,
            log.clone(),
            EnginePorts::with_store(store.clone(), schedule.clone(), membership.clone(), time),
            dispatch,
        );

        Self {
            engine,
            keys,
            cache,
            store,
            activity,
            log,
            schedule,
            membership,
            clock,
            signer,
        }
    }

    pub fn minute(&self) -> i64 {
        self.clock.current_minute()
    }

    /// Publish `secret` as the current key for a message type.
    pub fn rotate_current_key(&self, message_type: &str, id: &str, secret: &str) {
        self.keys
            .set_current(message_type, ResolvedKey::new(id, secret));
    }

    /// An envelope encrypted under `secret` and signed by the test signer.
    pub fn signed(&self, kind: (&str, &str), message_id: &str, secret: &str, payload: &Value) -> Envelope {
        let mut envelope = unsigned(kind, message_id, secret, payload);
        envelope.header.signing_cert_url = Some(CERT_URL.into());
        sign(&self.signer, &mut envelope);
        envelope
    }

    /// A group-service envelope: action context in the header, no signature.
    pub fn group_event(&self, action: &str, group: &str, secret: &str, body: &Value) -> Envelope {
        let mut envelope = unsigned(GROUP, "g-1", secret, body);
        let context = serde_json::json!({"action": action, "group": group}).to_string();
        envelope.header.message_context = Some(STANDARD.encode(context));
        envelope
    }
}

/// Base64 ciphertext of `plaintext` under `secret`.
pub fn seal(secret: &str, plaintext: &str) -> String {
    let key = SecretKey::from_base64(secret).unwrap();
    let iv = Iv::from_base64(IV_B64).unwrap();
    STANDARD.encode(encrypt(&key, &iv, plaintext.as_bytes()))
}

pub fn unsigned(kind: (&str, &str), message_id: &str, secret: &str, payload: &Value) -> Envelope {
    Envelope::new(
        EnvelopeHeader {
            message_type: Some(kind.0.into()),
            version: Some(kind.1.into()),
            message_id: Some(message_id.into()),
            timestamp: Some(TIMESTAMP.into()),
            encoding: Some("base64".into()),
            iv: Some(IV_B64.into()),
            ..Default::default()
        },
        seal(secret, &payload.to_string()),
    )
}

pub fn sign(signer: &TestSigner, envelope: &mut Envelope) {
    let text = canonical_signing_string(envelope).unwrap();
    let signature = signer.sign(SignatureDigest::Sha1, text.as_bytes());
    envelope.header.signature = Some(STANDARD.encode(signature));
}

pub fn enrollment_payload(code: &str, reg_id: &str) -> Value {
    serde_json::json!({"Events": [{
        "Action": {"Code": code},
        "Person": {"UWRegID": reg_id},
        "Section": {
            "Course": {"Year": 2024, "Quarter": "autumn",
                       "CurriculumAbbreviation": "CSE", "CourseNumber": "142"},
            "SectionID": "A"
        },
        "LastModified": TIMESTAMP
    }]})
}

pub fn instructor_payload(previous: &[&str], current: &[&str]) -> Value {
    let snapshot = |ids: &[&str]| {
        let listed: Vec<Value> = ids
            .iter()
            .map(|id| serde_json::json!({"RegID": id}))
            .collect();
        serde_json::json!({
            "Course": {"Year": 2024, "Quarter": "spring", "CurriculumAbbreviation": "MATH",
                       "CourseNumber": "124", "CourseCampus": "Bothell"},
            "SectionID": "A",
            "IndependentStudy": false,
            "Meetings": [{"Instructors": listed}]
        })
    };
    serde_json::json!({"Previous": snapshot(previous), "Current": snapshot(current)})
}
