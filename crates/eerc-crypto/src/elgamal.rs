//! exponential elgamal ciphertexts (EGCT) over babyjubjub
//!
//! the amount is encoded as `amount·G`, so ciphertexts add homomorphically
//! and the ledger can update balances without seeing them. decryption only
//! recovers the point; the amount comes from a bounded discrete log.

use core::ops::Add;

use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::{self, Point};
use crate::field::Fr;
use crate::keys::PrivateKey;
use crate::params::DecodeParams;
use crate::{Error, Result};

/// elgamal ciphertext as stored on the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Egct {
    /// c1 = r·G (ephemeral key)
    pub c1: Point,
    /// c2 = amount·G + r·PK
    pub c2: Point,
}

impl Egct {
    pub fn new(c1: Point, c2: Point) -> Self {
        Self { c1, c2 }
    }

    /// all-zero ciphertext the ledger holds before any balance exists
    pub fn empty() -> Self {
        Self::new(Point::zero(), Point::zero())
    }

    pub fn is_empty(&self) -> bool {
        self.c1.is_zero() && self.c2.is_zero()
    }

    /// both components are curve points
    pub fn is_well_formed(&self) -> bool {
        self.c1.is_on_curve() && self.c2.is_on_curve()
    }

    /// encrypt an amount to `pk`
    pub fn encrypt<R: RngCore + CryptoRng>(amount: u64, pk: &Point, rng: &mut R) -> (Self, Fr) {
        let r = curve::random_scalar(rng);
        (Self::encrypt_with_randomness(amount, pk, &r), r)
    }

    /// encrypt with caller-chosen randomness
    pub fn encrypt_with_randomness(amount: u64, pk: &Point, r: &Fr) -> Self {
        let g = Point::generator();
        Self {
            c1: g.mul_scalar(r),
            c2: g.mul_u64(amount) + pk.mul_scalar(r),
        }
    }

    /// `c2 - sk·c1 = amount·G`
    pub fn decrypt_point(&self, key: &PrivateKey) -> Point {
        self.c2 - self.c1.mul_scalar(key.scalar())
    }
}

impl Default for Egct {
    fn default() -> Self {
        Self::empty()
    }
}

impl Add for Egct {
    type Output = Egct;

    /// encrypts the sum of both amounts
    fn add(self, rhs: Egct) -> Egct {
        if self.is_empty() {
            return rhs;
        }
        if rhs.is_empty() {
            return self;
        }
        Egct::new(self.c1 + rhs.c1, self.c2 + rhs.c2)
    }
}

/// bounded discrete log solver for `amount·G`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscreteLog {
    ceiling: u64,
}

impl DiscreteLog {
    pub fn new(ceiling: u64) -> Self {
        Self { ceiling }
    }

    pub fn from_params(params: &DecodeParams) -> Self {
        Self::new(params.dlog_ceiling)
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// find `i ≤ ceiling` with `i·G == target`
    pub fn solve(&self, target: &Point) -> Result<u64> {
        let g = Point::generator();
        let mut acc = Point::identity();
        for i in 0..=self.ceiling {
            if acc == *target {
                return Ok(i);
            }
            acc = acc + g;
        }
        Err(Error::DiscreteLogNotFound {
            ceiling: self.ceiling,
        })
    }
}

impl Default for DiscreteLog {
    fn default() -> Self {
        Self::from_params(&DecodeParams::V1)
    }
}

/// decrypt a balance EGCT to its integer amount
pub fn decrypt_balance(key: &PrivateKey, egct: &Egct, params: &DecodeParams) -> Result<u64> {
    if !egct.is_well_formed() {
        return Err(Error::UndecodableCiphertext("egct component is not a curve point".into()));
    }
    let point = egct.decrypt_point(key);
    let amount = DiscreteLog::from_params(params).solve(&point)?;
    debug!(ceiling = params.dlog_ceiling, "decrypted balance egct");
    Ok(amount)
}
