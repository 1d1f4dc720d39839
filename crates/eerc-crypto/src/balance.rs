//! balance reconstruction from a ledger snapshot
//!
//! the ledger keeps two views of a balance: the homomorphic EGCT and a
//! list of per-deposit PCTs. a non-empty EGCT is authoritative. an empty
//! one means the balance so far only exists as PCTs, which are summed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::elgamal::{self, Egct};
use crate::keys::PrivateKey;
use crate::params::DecodeParams;
use crate::poseidon::Pct;
use crate::{Error, Result};

/// a PCT appended to the ledger for one deposit or transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountPct {
    pub pct: Pct,
    #[serde(with = "crate::field::integer")]
    pub index: u64,
}

/// what the ledger's `balanceOf(user, tokenId)` returns
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedBalance {
    pub egct: Egct,
    #[serde(with = "crate::field::integer")]
    pub nonce: u64,
    #[serde(rename = "amountPCTs", default)]
    pub amount_pcts: Vec<AmountPct>,
    #[serde(rename = "balancePCT", default)]
    pub balance_pct: Pct,
    #[serde(with = "crate::field::integer", default)]
    pub transaction_index: u64,
}

/// reconstructs plaintext balances under fixed decoding parameters
#[derive(Clone, Copy, Debug, Default)]
pub struct BalanceReconstructor {
    params: DecodeParams,
}

impl BalanceReconstructor {
    pub fn new(params: DecodeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DecodeParams {
        &self.params
    }

    /// EGCT if non-empty, otherwise the sum of every decryptable PCT
    pub fn reconstruct<'a, I>(
        &self,
        key: &PrivateKey,
        egct: &Egct,
        amount_pcts: I,
        balance_pct: &'a Pct,
    ) -> Result<u64>
    where
        I: IntoIterator<Item = &'a Pct>,
    {
        if !egct.is_empty() {
            return elgamal::decrypt_balance(key, egct, &self.params);
        }

        let mut total: u64 = 0;
        let mut skipped = 0usize;

        let candidates = core::iter::once(balance_pct).chain(amount_pcts);
        for (position, pct) in candidates.enumerate() {
            if pct.is_zero() {
                continue;
            }
            match pct.decrypt_amount(key) {
                Ok(amount) => {
                    total = total.checked_add(amount).ok_or(Error::BalanceOverflow)?;
                }
                Err(e) => {
                    skipped += 1;
                    if position == 0 {
                        warn!(error = %e, "skipping undecryptable balance pct");
                    } else {
                        warn!(entry = position - 1, error = %e, "skipping undecryptable amount pct");
                    }
                }
            }
        }

        debug!(skipped, "reconstructed balance from pcts");
        Ok(total)
    }

    /// reconstruct from a full ledger snapshot
    pub fn reconstruct_snapshot(&self, key: &PrivateKey, balance: &EncryptedBalance) -> Result<u64> {
        self.reconstruct(
            key,
            &balance.egct,
            balance.amount_pcts.iter().map(|a| &a.pct),
            &balance.balance_pct,
        )
    }
}

/// [`BalanceReconstructor::reconstruct`] under [`DecodeParams::V1`]
pub fn reconstruct<'a, I>(key: &PrivateKey, egct: &Egct, amount_pcts: I, balance_pct: &'a Pct) -> Result<u64>
where
    I: IntoIterator<Item = &'a Pct>,
{
    BalanceReconstructor::default().reconstruct(key, egct, amount_pcts, balance_pct)
}
