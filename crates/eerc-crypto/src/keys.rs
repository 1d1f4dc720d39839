//! key derivation from a wallet signature
//!
//! the user signs a fixed registration message with their wallet; the
//! signature bytes are hashed and clamped into a babyjubjub scalar:
//!
//! ```text
//! digest = keccak256(signature bytes)
//! digest[0]  &= 0xf8          clear cofactor bits
//! digest[31] &= 0x7f
//! digest[31] |= 0x40          fix the top bit
//! sk = le_int(digest) mod l   (0 maps to 1)
//! pk = sk·G
//! ```
//!
//! the same signature always yields the same key, so the signature itself
//! is the secret. none of these values are ever logged.

use core::fmt;

use ark_ff::{One, PrimeField, Zero};
use rand_core::{CryptoRng, RngCore};
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::curve::{self, Point};
use crate::field::{Fq, Fr};
use crate::poseidon;
use crate::{Error, Result};

/// hex digits in a 65-byte `r || s || v` signature
pub const SIGNATURE_HEX_LEN: usize = 130;

/// the message a wallet signs to register
pub fn registration_message(address: &str) -> String {
    format!(
        "eERC\nRegistering user with\n Address:{}",
        address.to_lowercase()
    )
}

/// keccak256 of the signature bytes, clamped
pub fn clamped_digest(signature: &str) -> Result<[u8; 32]> {
    let hex_digits = signature
        .strip_prefix("0x")
        .or_else(|| signature.strip_prefix("0X"))
        .unwrap_or(signature);

    if hex_digits.len() < SIGNATURE_HEX_LEN {
        return Err(Error::InvalidSignatureFormat(format!(
            "expected at least {} hex digits, got {}",
            SIGNATURE_HEX_LEN,
            hex_digits.len()
        )));
    }
    let mut bytes = hex::decode(hex_digits)
        .map_err(|e| Error::InvalidSignatureFormat(e.to_string()))?;

    let mut digest: [u8; 32] = Keccak256::digest(&bytes).into();
    bytes.zeroize();

    digest[0] &= 0xf8;
    digest[31] &= 0x7f;
    digest[31] |= 0x40;
    Ok(digest)
}

/// babyjubjub secret scalar
///
/// never zero. the scalar is wiped on drop and hidden from `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Fr);

impl PrivateKey {
    /// derive from a hex wallet signature
    pub fn from_signature(signature: &str) -> Result<Self> {
        let mut digest = clamped_digest(signature)?;
        let key = Self::from_digest(&digest);
        digest.zeroize();
        Ok(key)
    }

    /// reduce a clamped digest into a key
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let scalar = curve::reduce_le_bytes(digest);
        if scalar.is_zero() {
            Self(Fr::one())
        } else {
            Self(scalar)
        }
    }

    /// wrap an existing scalar
    pub fn from_scalar(scalar: Fr) -> Result<Self> {
        if scalar.is_zero() {
            return Err(Error::InvalidFieldElement("private key must be nonzero".into()));
        }
        Ok(Self(scalar))
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(curve::random_scalar(rng))
    }

    pub fn scalar(&self) -> &Fr {
        &self.0
    }

    pub fn public_key(&self) -> Point {
        Point::generator().mul_scalar(&self.0)
    }

    /// scalar lifted into the base field, for poseidon inputs
    pub(crate) fn as_base(&self) -> Fq {
        curve::scalar_to_base(&self.0)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.0 .0 .0.zeroize();
    }
}

/// signature hex to private key
pub fn derive_private_key(signature: &str) -> Result<PrivateKey> {
    PrivateKey::from_signature(signature)
}

/// secret key with its public key
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub private_key: PrivateKey,
    pub public_key: Point,
}

impl KeyPair {
    pub fn new(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    pub fn from_signature(signature: &str) -> Result<Self> {
        Ok(Self::new(PrivateKey::from_signature(signature)?))
    }
}

/// `poseidon(chain_id, sk, address)`, the value submitted at registration
pub fn registration_hash(chain_id: u64, key: &PrivateKey, address: &str) -> Result<Fq> {
    let address = parse_address(address)?;
    Ok(poseidon::hash3(&[Fq::from(chain_id), key.as_base(), address]))
}

/// a 20-byte `0x` address as a field element
pub fn parse_address(address: &str) -> Result<Fq> {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| Error::InvalidFieldElement(format!("address {:?} lacks 0x", address)))?;
    let bytes = hex::decode(digits)
        .map_err(|e| Error::InvalidFieldElement(format!("address {:?}: {}", address, e)))?;
    if bytes.len() != 20 {
        return Err(Error::InvalidFieldElement(format!(
            "address {:?} is {} bytes, expected 20",
            address,
            bytes.len()
        )));
    }
    Ok(Fq::from_be_bytes_mod_order(&bytes))
}

/// compare a derived public key with the one recorded for `address`
pub fn verify_public_key(derived: &Point, recorded: &Point, address: &str) -> Result<()> {
    if derived != recorded {
        return Err(Error::KeyMismatch {
            address: address.to_lowercase(),
        });
    }
    Ok(())
}
