//! Test utilities: RSA signing keys and envelope body encryption.
//!
//! Available with the `test-utils` feature flag.

use crate::signatures::SignatureDigest;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Small RSA key for fast test signing. Never use outside tests.
const TEST_KEY_BITS: usize = 1024;

/// RSA key pair that signs like the upstream notification service.
pub struct TestSigner {
    private: RsaPrivateKey,
}

impl TestSigner {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), TEST_KEY_BITS)
            .expect("rsa key generation failed");
        Self { private }
    }

    /// Public key as an SPKI PEM document.
    pub fn public_key_pem(&self) -> String {
        RsaPublicKey::from(&self.private)
            .to_public_key_pem(LineEnding::LF)
            .expect("pem encoding failed")
    }

    /// Sign `message`, returning raw signature bytes.
    pub fn sign(&self, digest: SignatureDigest, message: &[u8]) -> Vec<u8> {
        match digest {
            SignatureDigest::Sha1 => SigningKey::<sha1::Sha1>::new(self.private.clone())
                .sign(message)
                .to_vec(),
            SignatureDigest::Sha256 => SigningKey::<sha2::Sha256>::new(self.private.clone())
                .sign(message)
                .to_vec(),
        }
    }
}
