//! # Envelope Signatures
//!
//! RSA PKCS#1 v1.5 verification against the public key of a signing
//! certificate fetched by reference from the envelope header.
//!
//! The certificate document may be an X.509 `CERTIFICATE` PEM or a bare
//! SubjectPublicKeyInfo `PUBLIC KEY` PEM.

use crate::CryptoError;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use std::str::FromStr;
use x509_cert::der::{DecodePem, Encode};
use x509_cert::Certificate;

/// Digest the signer applied before signing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignatureDigest {
    /// SHA-1 (what the upstream notification service signs with)
    #[default]
    Sha1,
    /// SHA-256
    Sha256,
}

impl FromStr for SignatureDigest {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(SignatureDigest::Sha1),
            "sha256" | "sha-256" => Ok(SignatureDigest::Sha256),
            other => Err(CryptoError::InvalidCertificate(format!(
                "unsupported signature digest {other}"
            ))),
        }
    }
}

/// Public key of a signing certificate.
#[derive(Clone, Debug)]
pub struct SigningCertificate {
    key: RsaPublicKey,
}

impl SigningCertificate {
    /// Wrap an already-parsed RSA public key.
    pub fn from_public_key(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Parse a PEM certificate or public key document.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidCertificate` if the document is not PEM,
    /// is not a certificate/SPKI, or does not carry an RSA key.
    pub fn from_pem(document: &[u8]) -> Result<Self, CryptoError> {
        let text = std::str::from_utf8(document)
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;

        let key = if text.contains("BEGIN CERTIFICATE") {
            let cert = Certificate::from_pem(text.as_bytes())
                .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
            let spki = cert
                .tbs_certificate
                .subject_public_key_info
                .to_der()
                .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
            RsaPublicKey::from_public_key_der(&spki)
                .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?
        } else {
            RsaPublicKey::from_public_key_pem(text.trim())
                .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?
        };

        Ok(Self { key })
    }

    /// Verify `signature` over `message`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidSignatureFormat` if the signature bytes are malformed
    /// - `CryptoError::SignatureVerificationFailed` if the signature does not match
    pub fn verify(
        &self,
        digest: SignatureDigest,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        let signature =
            Signature::try_from(signature).map_err(|_| CryptoError::InvalidSignatureFormat)?;

        let outcome = match digest {
            SignatureDigest::Sha1 => {
                VerifyingKey::<sha1::Sha1>::new(self.key.clone()).verify(message, &signature)
            }
            SignatureDigest::Sha256 => {
                VerifyingKey::<sha2::Sha256>::new(self.key.clone()).verify(message, &signature)
            }
        };

        outcome.map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}
