//! ECDSA key management for vault signers
//!
//! Provides key pair generation, recoverable signing, and signer
//! recovery using the secp256k1 elliptic curve. Signatures are the
//! 65-byte recoverable form `r || s || v`; identities are 20-byte
//! addresses derived from the Keccak-256 hash of the public key.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::keccak256;
use crate::core::Address;

/// Length of a recoverable signature: 32-byte r, 32-byte s, 1-byte v
pub const SIGNATURE_BYTES: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (uncompressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize_uncompressed())
    }

    /// The signer address for this key pair
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest, producing a recoverable 65-byte signature
    pub fn sign_digest(&self, digest: &[u8; 32]) -> [u8; SIGNATURE_BYTES] {
        sign_recoverable(&self.secret_key, digest)
    }
}

/// Convert a public key to its 20-byte address
///
/// Address = last 20 bytes of Keccak-256 over the uncompressed public
/// key without its 0x04 tag byte.
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

/// Parse a public key from a hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign a 32-byte digest with a secret key
///
/// The recovery byte is encoded as `27 + recovery_id`.
pub fn sign_recoverable(secret_key: &SecretKey, digest: &[u8; 32]) -> [u8; SIGNATURE_BYTES] {
    let secp = Secp256k1::new();
    let message = Message::from_digest(*digest);
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut out = [0u8; SIGNATURE_BYTES];
    out[..64].copy_from_slice(&compact);
    out[64] = 27 + recovery_id.to_i32() as u8;
    out
}

/// Recover the signer address from a digest and a 65-byte signature
///
/// Accepts recovery bytes in both raw (0/1) and offset (27/28) form.
pub fn recover_address(
    digest: &[u8; 32],
    signature: &[u8; SIGNATURE_BYTES],
) -> Result<Address, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest(*digest);

    let v = signature[64];
    let recovery = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => return Err(KeyError::InvalidRecoveryId(other)),
    };
    let recovery_id =
        RecoveryId::from_i32(recovery as i32).map_err(|_| KeyError::InvalidRecoveryId(v))?;

    let sig = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;
    let public_key = secp
        .recover_ecdsa(&message, &sig)
        .map_err(|_| KeyError::InvalidSignature)?;

    Ok(public_key_to_address(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert!(!kp.private_key_hex().is_empty());
        assert!(!kp.public_key_hex().is_empty());
        assert!(!kp.address().is_zero());
    }

    #[test]
    fn test_known_address_derivation() {
        // Private key 0x01 has a well-known address
        let kp = KeyPair::from_private_key_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(kp.address().to_hex(), "7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"authorize this");

        let signature = kp.sign_digest(&digest);
        let recovered = recover_address(&digest, &signature).unwrap();
        assert_eq!(recovered, kp.address());
    }

    #[test]
    fn test_recover_accepts_raw_recovery_byte() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"raw recovery byte");

        let mut signature = kp.sign_digest(&digest);
        signature[64] -= 27;
        let recovered = recover_address(&digest, &signature).unwrap();
        assert_eq!(recovered, kp.address());
    }

    #[test]
    fn test_recover_rejects_bad_recovery_byte() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"bad recovery byte");

        let mut signature = kp.sign_digest(&digest);
        signature[64] = 42;
        assert!(matches!(
            recover_address(&digest, &signature),
            Err(KeyError::InvalidRecoveryId(42))
        ));
    }

    #[test]
    fn test_tampered_signature_recovers_other_address() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"tamper check");

        let mut signature = kp.sign_digest(&digest);
        signature[10] ^= 0xFF;
        match recover_address(&digest, &signature) {
            Ok(address) => assert_ne!(address, kp.address()),
            Err(KeyError::InvalidSignature) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_key_pair_from_hex_roundtrip() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.address(), kp2.address());
    }
}
