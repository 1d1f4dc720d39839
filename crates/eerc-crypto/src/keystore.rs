//! persisted user key record
//!
//! written once at registration so later tools (balance checks, deposits)
//! don't need a fresh wallet signature. the file holds the private key in
//! the clear; it is created owner-readable only on unix.

use core::fmt;
use std::fs;
use std::path::Path;

use ark_ff::Zero;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::curve::Point;
use crate::field::{self, Fq, Fr};
use crate::keys::{self, KeyPair, PrivateKey};
use crate::{Error, Result};

/// private key in both forms the tooling has used
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyRecord {
    /// the derived scalar as a plain integer, always below the subgroup order
    #[serde(with = "crate::field::biguint")]
    pub raw: BigUint,
    /// reduced scalar used for curve operations
    #[serde(with = "crate::field::decimal")]
    pub formatted: Fr,
}

impl fmt::Debug for PrivateKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKeyRecord(<redacted>)")
    }
}

impl Drop for PrivateKeyRecord {
    fn drop(&mut self) {
        self.formatted.0 .0.zeroize();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKeys {
    pub address: String,
    pub private_key: PrivateKeyRecord,
    pub public_key: Point,
    #[serde(
        with = "crate::field::decimal_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub registration_hash: Option<Fq>,
}

impl UserKeys {
    /// derive the full record from a registration signature
    pub fn derive(address: &str, signature: &str, chain_id: u64) -> Result<Self> {
        let mut digest = keys::clamped_digest(signature)?;
        let private_key = PrivateKey::from_digest(&digest);
        digest.zeroize();

        let registration_hash = keys::registration_hash(chain_id, &private_key, address)?;
        let mut record = Self::from_key_pair(address, &KeyPair::new(private_key));
        record.registration_hash = Some(registration_hash);
        Ok(record)
    }

    /// record for a key pair whose signature preimage is not known
    pub fn from_key_pair(address: &str, pair: &KeyPair) -> Self {
        let formatted = *pair.private_key.scalar();
        Self {
            address: address.to_lowercase(),
            private_key: PrivateKeyRecord {
                raw: field::to_biguint(&formatted),
                formatted,
            },
            public_key: pair.public_key,
            registration_hash: None,
        }
    }

    /// rebuild the key pair, checking the record is self-consistent
    pub fn key_pair(&self) -> Result<KeyPair> {
        let formatted = self.private_key.formatted;
        if formatted.is_zero() {
            return Err(self.mismatch());
        }

        if field::to_biguint(&formatted) != self.private_key.raw {
            return Err(self.mismatch());
        }

        let private_key = PrivateKey::from_scalar(formatted)?;
        keys::verify_public_key(&private_key.public_key(), &self.public_key, &self.address)?;
        Ok(KeyPair::new(private_key))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        info!(address = %self.address, path = %path.display(), "saved user keys");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let keys: UserKeys = serde_json::from_str(&content)?;
        debug!(address = %keys.address, "loaded user keys");
        Ok(keys)
    }

    fn mismatch(&self) -> Error {
        Error::KeyMismatch {
            address: self.address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve;
    use tempfile::tempdir;

    const ADDRESS: &str = "0x00000000000000000000000000000000000000Aa";

    fn signature() -> String {
        let bytes: Vec<u8> = (0..65u32).map(|i| (i * 7 % 256) as u8).collect();
        format!("0x{}", hex::encode(bytes))
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys").join("user.json");

        let record = UserKeys::derive(ADDRESS, &signature(), 43113).unwrap();
        record.save(&path).unwrap();
        let loaded = UserKeys::load(&path).unwrap();

        assert_eq!(loaded, record);
        assert_eq!(loaded.address, ADDRESS.to_lowercase());
        assert!(loaded.registration_hash.is_some());

        let pair = loaded.key_pair().unwrap();
        let expected = KeyPair::from_signature(&signature()).unwrap();
        assert_eq!(pair.private_key, expected.private_key);
        assert_eq!(pair.public_key, expected.public_key);
    }

    #[test]
    fn test_json_is_decimal_text() {
        let record = UserKeys::derive(ADDRESS, &signature(), 1).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json["privateKey"]["formatted"],
            "1904996032393332861495964808588014020600143251904631625017412462261682334498"
        );
        assert!(json["privateKey"]["raw"].is_string());
        assert!(json["publicKey"]["x"].is_string());
        assert!(json["registrationHash"].is_string());
    }

    #[test]
    fn test_raw_is_the_reduced_scalar() {
        let record = UserKeys::derive(ADDRESS, &signature(), 1).unwrap();
        assert!(record.private_key.raw < curve::subgroup_order());
        assert_eq!(record.private_key.raw, field::to_biguint(&record.private_key.formatted));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["privateKey"]["raw"], json["privateKey"]["formatted"]);
    }

    #[test]
    fn test_tampered_raw_is_rejected() {
        let mut record = UserKeys::derive(ADDRESS, &signature(), 1).unwrap();
        record.private_key.raw += curve::subgroup_order();
        assert!(matches!(record.key_pair(), Err(Error::KeyMismatch { .. })));

        record.private_key.raw = field::to_biguint(&record.private_key.formatted) + 1u32;
        assert!(matches!(record.key_pair(), Err(Error::KeyMismatch { .. })));
    }

    #[test]
    fn test_tampered_public_key_is_rejected() {
        let mut record = UserKeys::derive(ADDRESS, &signature(), 1).unwrap();
        record.public_key = record.public_key.double();
        assert!(matches!(record.key_pair(), Err(Error::KeyMismatch { .. })));
    }

    #[test]
    fn test_tampered_scalar_is_rejected() {
        let mut record = UserKeys::derive(ADDRESS, &signature(), 1).unwrap();
        record.private_key.formatted += Fr::from(1u64);
        assert!(matches!(record.key_pair(), Err(Error::KeyMismatch { .. })));

        let mut zero = UserKeys::derive(ADDRESS, &signature(), 1).unwrap();
        zero.private_key.formatted = Fr::zero();
        assert!(matches!(zero.key_pair(), Err(Error::KeyMismatch { .. })));
    }

    #[test]
    fn test_from_key_pair_is_consistent() {
        let pair = KeyPair::new(PrivateKey::from_scalar(Fr::from(99u64)).unwrap());
        let record = UserKeys::from_key_pair(ADDRESS, &pair);
        assert!(record.registration_hash.is_none());
        assert_eq!(record.key_pair().unwrap().public_key, pair.public_key);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("registrationHash").is_none());
    }

    #[test]
    fn test_out_of_range_scalar_fails_to_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let record = UserKeys::from_key_pair(
            ADDRESS,
            &KeyPair::new(PrivateKey::from_scalar(Fr::from(5u64)).unwrap()),
        );
        let mut json = serde_json::to_value(&record).unwrap();
        json["privateKey"]["formatted"] = curve::subgroup_order().to_string().into();
        fs::write(&path, json.to_string()).unwrap();

        assert!(matches!(UserKeys::load(&path), Err(Error::Serialization(_))));
        assert!(matches!(
            UserKeys::load(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let record = UserKeys::derive(ADDRESS, &signature(), 1).unwrap();
        let shown = format!("{:?}", record);
        assert!(!shown.contains("1904996"));
    }
}
