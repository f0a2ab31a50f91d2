use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};

use crate::{error::LedgerError, Hash};

/// Hex encoding of an uncompressed secp256k1 public key.
pub type Address = String;

/// A secp256k1 key pair. The address is derived from the public half.
#[derive(Clone, Debug)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());
        Self {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, LedgerError> {
        let bytes =
            hex::decode(secret_hex.trim()).map_err(|e| LedgerError::InvalidKey(e.to_string()))?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|e| LedgerError::InvalidKey(e.to_string()))?;
        let public_key = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret_key);
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    pub fn address(&self) -> Address {
        hex::encode(self.public_key.serialize_uncompressed())
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Deterministic (RFC 6979) ECDSA signature over `digest`, DER encoded as hex.
    pub fn sign(&self, digest: &Hash) -> String {
        let secp = Secp256k1::signing_only();
        let sig = secp.sign_ecdsa(&Message::from_digest(*digest), &self.secret_key);
        hex::encode(&*sig.serialize_der())
    }
}

pub fn public_key_from_address(address: &str) -> Result<PublicKey, LedgerError> {
    let bytes =
        hex::decode(address).map_err(|_| LedgerError::InvalidAddress(address.to_string()))?;
    PublicKey::from_slice(&bytes).map_err(|_| LedgerError::InvalidAddress(address.to_string()))
}

/// Checks a hex DER signature against the key encoded in `address`.
/// A signature that cannot be decoded simply does not verify.
pub fn verify(address: &str, digest: &Hash, signature_hex: &str) -> Result<bool, LedgerError> {
    let public_key = public_key_from_address(address)?;
    let Ok(der) = hex::decode(signature_hex) else {
        return Ok(false);
    };
    let Ok(sig) = Signature::from_der(&der) else {
        return Ok(false);
    };
    let secp = Secp256k1::verification_only();
    Ok(secp
        .verify_ecdsa(&Message::from_digest(*digest), &sig, &public_key)
        .is_ok())
}
