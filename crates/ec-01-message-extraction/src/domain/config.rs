//! Extraction configuration.

use shared_crypto::SignatureDigest;

/// Settings for authentication and decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Verify the envelope signature before decrypting.
    pub validate_signature: bool,
    /// Digest the upstream signer uses.
    pub digest: SignatureDigest,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            validate_signature: true,
            digest: SignatureDigest::Sha1,
        }
    }
}

impl ExtractionConfig {
    pub fn with_validate_signature(mut self, enabled: bool) -> Self {
        self.validate_signature = enabled;
        self
    }

    pub fn with_digest(mut self, digest: SignatureDigest) -> Self {
        self.digest = digest;
        self
    }
}
