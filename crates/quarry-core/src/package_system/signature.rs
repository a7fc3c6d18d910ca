use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use sha2::{Digest, Sha256};

use crate::package_system::descriptor::PackageDescriptor;

/// Error type for signature material parsing
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid verifying key: {0}")]
    InvalidKey(String),
}

/// Compute the SHA-256 content hash of an archive.
pub fn content_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Parse a PEM-encoded ECDSA P-256 verifying key.
pub fn verifying_key_from_pem(pem: &str) -> Result<VerifyingKey, SignatureError> {
    VerifyingKey::from_public_key_pem(pem).map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

/// Whether `signature` is a valid ECDSA P-256 signature over `hash` by the
/// holder of `key`. A malformed signature is simply not valid.
pub fn is_signed_by(hash: &[u8; 32], signature: &[u8], key: &VerifyingKey) -> bool {
    match Signature::from_slice(signature) {
        Ok(sig) => key.verify(hash, &sig).is_ok(),
        Err(_) => false,
    }
}

/// Whether the descriptor carries a valid signature over its content hash.
/// This is a trust signal only; nothing in the load pipeline enforces it.
pub fn descriptor_is_signed_by(descriptor: &PackageDescriptor, key: &VerifyingKey) -> bool {
    match &descriptor.signature {
        Some(signature) => is_signed_by(&descriptor.hash, signature, key),
        None => false,
    }
}
