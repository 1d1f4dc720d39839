//! auditor view of transfer commitments
//!
//! every transfer also carries a PCT to the auditor's key whose plaintext
//! is `[amount, sender.x, sender.y]`. the auditor opens them one by one;
//! a commitment addressed to someone else fails authentication and is
//! reported on its own without stopping the rest.

use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::curve::Point;
use crate::field::{self, Fq};
use crate::keys::PrivateKey;
use crate::poseidon::Pct;
use crate::{Error, Result};

/// decrypted transfer commitment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditNote {
    #[serde(with = "crate::field::integer")]
    pub amount: u64,
    /// sender public key, resolvable to an address through the registrar
    pub sender: Point,
}

impl AuditNote {
    pub fn new(amount: u64, sender: Point) -> Self {
        Self { amount, sender }
    }

    /// encrypt this note to the auditor
    pub fn seal<R: RngCore + CryptoRng>(&self, auditor: &Point, rng: &mut R) -> Result<Pct> {
        let plaintext = [Fq::from(self.amount), self.sender.x, self.sender.y];
        Pct::encrypt(&plaintext, auditor, rng)
    }

    /// decrypt a commitment with the auditor key
    pub fn open(auditor: &PrivateKey, commitment: &Pct) -> Result<Self> {
        let plaintext = commitment.decrypt(auditor, 3)?;
        let amount = field::to_u64(&plaintext[0])
            .ok_or_else(|| Error::UndecodableCiphertext("audited amount does not fit in 64 bits".into()))?;
        Ok(Self::new(amount, Point::new(plaintext[1], plaintext[2])))
    }
}

/// open every commitment, keeping each failure in place
pub fn open_all(auditor: &PrivateKey, commitments: &[Pct]) -> Vec<Result<AuditNote>> {
    commitments
        .iter()
        .enumerate()
        .map(|(i, pct)| {
            AuditNote::open(auditor, pct).inspect_err(|e| {
                warn!(commitment = i, error = %e, "commitment not readable with auditor key");
            })
        })
        .collect()
}
