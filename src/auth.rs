//! Instruction authentication
//!
//! Envelopes submitted over HTTP carry an Ed25519 signature by the key
//! registered for their `sender`. The signed message is
//! `SIGNING_DOMAIN || serde_json(envelope)`, where the envelope is serialized
//! in its canonical form (field declaration order, hex lowercased, optional
//! fields as `null`). Clients sign what `SignedEnvelope::sign` signs.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::instruction::Envelope;
use crate::types::Address;

/// Prefix separating instruction signatures from any other use of the key.
pub const SIGNING_DOMAIN: &[u8] = b"htlc-bridge/instruction/v1:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No signing key registered for {0}")]
    UnknownSigner(Address),

    #[error("Invalid signature format: {0}")]
    MalformedSignature(String),

    #[error("Invalid public key: {0}")]
    MalformedPublicKey(String),

    #[error("Signature does not match sender {0}")]
    InvalidSignature(Address),

    #[error("Failed to encode instruction: {0}")]
    Encoding(String),
}

/// Bytes a sender signs for `envelope`.
pub fn signing_message(envelope: &Envelope) -> Result<Vec<u8>, AuthError> {
    let body = serde_json::to_vec(envelope).map_err(|e| AuthError::Encoding(e.to_string()))?;
    let mut message = Vec::with_capacity(SIGNING_DOMAIN.len() + body.len());
    message.extend_from_slice(SIGNING_DOMAIN);
    message.extend_from_slice(&body);
    Ok(message)
}

/// An envelope together with its sender's signature, as POSTed to `/instructions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub envelope: Envelope,
    /// Ed25519 signature over `signing_message(envelope)` (hex, 64 bytes, optional 0x)
    pub signature: String,
}

impl SignedEnvelope {
    /// Signs `envelope` with `key`.
    ///
    /// # Arguments
    ///
    /// * `envelope` - Instruction and claimed sender
    /// * `key` - The sender's signing key
    ///
    /// # Returns
    ///
    /// * `Ok(SignedEnvelope)` - Envelope with a 0x-prefixed hex signature
    /// * `Err(AuthError::Encoding)` - The envelope could not be serialized
    pub fn sign(envelope: Envelope, key: &SigningKey) -> Result<Self, AuthError> {
        let message = signing_message(&envelope)?;
        let signature = key.sign(&message);
        Ok(Self {
            envelope,
            signature: format!("0x{}", hex::encode(signature.to_bytes())),
        })
    }
}

/// Ed25519 public keys by sender address.
#[derive(Debug, Clone, Default)]
pub struct SignerRegistry {
    keys: BTreeMap<Address, VerifyingKey>,
}

impl SignerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the key for `address`.
    pub fn register(&mut self, address: Address, key: VerifyingKey) {
        self.keys.insert(address, key);
    }

    /// Registers a hex-encoded public key for `address`.
    pub fn register_hex(&mut self, address: Address, public_key: &str) -> Result<(), AuthError> {
        let key = parse_public_key(public_key)?;
        self.register(address, key);
        Ok(())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Checks that `signed` was signed by the key registered for its sender.
    ///
    /// Senders without a registered key are refused.
    pub fn verify(&self, signed: &SignedEnvelope) -> Result<(), AuthError> {
        let sender = &signed.envelope.sender;
        let key = self.keys.get(sender).ok_or_else(|| {
            warn!("Instruction from unregistered sender {}", sender);
            AuthError::UnknownSigner(sender.clone())
        })?;
        let signature = parse_signature(&signed.signature)?;
        let message = signing_message(&signed.envelope)?;

        key.verify_strict(&message, &signature).map_err(|e| {
            warn!("Signature verification failed for {}: {}", sender, e);
            AuthError::InvalidSignature(sender.clone())
        })?;
        debug!("Verified signature of {}", sender);
        Ok(())
    }
}

/// Parses a hex Ed25519 public key (32 bytes, optional 0x).
pub fn parse_public_key(s: &str) -> Result<VerifyingKey, AuthError> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| AuthError::MalformedPublicKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
        AuthError::MalformedPublicKey(format!("expected 32 bytes, got {}", b.len()))
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| AuthError::MalformedPublicKey(e.to_string()))
}

/// Hex encoding of a public key, as written in `[[signers]]`.
pub fn public_key_hex(key: &VerifyingKey) -> String {
    format!("0x{}", hex::encode(key.as_bytes()))
}

fn parse_signature(s: &str) -> Result<Signature, AuthError> {
    let sig_hex = s.strip_prefix("0x").unwrap_or(s);
    if sig_hex.len() != 128 {
        return Err(AuthError::MalformedSignature(format!(
            "expected 128 hex characters (64 bytes), got {}",
            sig_hex.len()
        )));
    }
    let bytes = hex::decode(sig_hex).map_err(|_| AuthError::MalformedSignature("not valid hex".to_string()))?;
    let bytes: [u8; 64] = bytes
        .try_into()
        .map_err(|_| AuthError::MalformedSignature("expected 64 bytes".to_string()))?;
    Ok(Signature::from_bytes(&bytes))
}
