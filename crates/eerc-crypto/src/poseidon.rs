//! poseidon permutation and poseidon ciphertexts (PCT)
//!
//! the permutation is circomlib's bn254 poseidon (x^5 s-box) driven by the
//! round constants and mds matrices shipped with light-poseidon.
//!
//! the cipher is the poseidon sponge encryption used by maci/zk-kit:
//!
//! ```text
//! state = [0, K.x, K.y, nonce + len·2^128]          width 4, rate 3
//! for each 3-element block m:
//!     state = perm(state); state[1..4] += m; emit state[1..4]
//! state = perm(state); emit state[1]                 authentication element
//! ```
//!
//! `K` is an ecdh point: the sender picks `r`, publishes `auth = r·G` and
//! uses `r·PK`; the owner recomputes it as `sk·auth`.

use std::sync::OnceLock;

use ark_ff::{Field, Zero};
use light_poseidon::{parameters::bn254_x5, PoseidonParameters};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::curve::{self, Point};
use crate::field::{self, Fq};
use crate::keys::PrivateKey;
use crate::{Error, Result};

/// field elements in an on-chain PCT
pub const PCT_LEN: usize = 7;

/// ciphertext elements in a PCT (3-element block + authentication element)
pub const PCT_CIPHERTEXT_LEN: usize = 4;

/// largest plaintext a PCT can carry
pub const PCT_MAX_PLAINTEXT: usize = 3;

const CIPHER_WIDTH: usize = 4;
const CIPHER_RATE: usize = CIPHER_WIDTH - 1;

/// poseidon permutation of a fixed width
pub struct Permutation {
    params: PoseidonParameters<Fq>,
}

impl Permutation {
    /// circom parameters for `width` (2..=13)
    pub fn new(width: usize) -> Result<Self> {
        let width = u8::try_from(width)
            .map_err(|_| Error::Poseidon(format!("unsupported width {}", width)))?;
        let params = bn254_x5::get_poseidon_parameters::<Fq>(width)?;
        Ok(Self { params })
    }

    pub fn width(&self) -> usize {
        self.params.width
    }

    /// apply the permutation in place
    pub fn permute(&self, state: &mut [Fq]) -> Result<()> {
        if state.len() != self.width() {
            return Err(Error::Poseidon(format!(
                "state has {} elements, permutation width is {}",
                state.len(),
                self.width()
            )));
        }
        self.apply(state);
        Ok(())
    }

    /// round function; `state.len()` is the width
    fn apply(&self, state: &mut [Fq]) {
        let p = &self.params;
        let half_full = p.full_rounds / 2;
        let rounds = p.full_rounds + p.partial_rounds;

        for round in 0..rounds {
            for (i, s) in state.iter_mut().enumerate() {
                *s += p.ark[round * p.width + i];
            }

            if round < half_full || round >= half_full + p.partial_rounds {
                for s in state.iter_mut() {
                    *s = s.pow([p.alpha]);
                }
            } else {
                state[0] = state[0].pow([p.alpha]);
            }

            let mixed: Vec<Fq> = p
                .mds
                .iter()
                .map(|row| {
                    row.iter()
                        .zip(state.iter())
                        .fold(Fq::zero(), |acc, (m, s)| acc + *m * s)
                })
                .collect();
            state.copy_from_slice(&mixed);
        }
    }

    /// circom `Poseidon(n)` hash with n = width - 1 inputs
    pub fn hash(&self, inputs: &[Fq]) -> Result<Fq> {
        if inputs.len() + 1 != self.width() {
            return Err(Error::Poseidon(format!(
                "expected {} inputs, got {}",
                self.width() - 1,
                inputs.len()
            )));
        }
        let mut state = Vec::with_capacity(self.width());
        state.push(Fq::zero());
        state.extend_from_slice(inputs);
        self.apply(&mut state);
        Ok(state[0])
    }
}

fn cipher_permutation() -> &'static Permutation {
    static PERM: OnceLock<Permutation> = OnceLock::new();
    PERM.get_or_init(|| Permutation::new(CIPHER_WIDTH).expect("width 4 is a circom width"))
}

/// `Poseidon(3)`, as used for the registration hash
pub fn hash3(inputs: &[Fq; 3]) -> Fq {
    let mut state = [Fq::zero(), inputs[0], inputs[1], inputs[2]];
    cipher_permutation().apply(&mut state);
    state[0]
}

fn two_pow_128() -> Fq {
    Fq::from(2u64).pow([128u64])
}

fn initial_state(key: &Point, nonce: u128, length: usize) -> [Fq; CIPHER_WIDTH] {
    let domain = Fq::from(nonce) + Fq::from(length as u64) * two_pow_128();
    [Fq::zero(), key.x, key.y, domain]
}

/// ciphertext length for a plaintext of `length` elements
pub fn ciphertext_len(length: usize) -> usize {
    length.div_ceil(CIPHER_RATE) * CIPHER_RATE + 1
}

/// encrypt under a shared key point
pub fn encrypt(plaintext: &[Fq], key: &Point, nonce: u128) -> Vec<Fq> {
    let perm = cipher_permutation();
    let mut state = initial_state(key, nonce, plaintext.len());
    let mut ciphertext = Vec::with_capacity(ciphertext_len(plaintext.len()));

    let mut padded = plaintext.to_vec();
    padded.resize(ciphertext_len(plaintext.len()) - 1, Fq::zero());

    for block in padded.chunks(CIPHER_RATE) {
        perm.apply(&mut state);
        for (i, m) in block.iter().enumerate() {
            state[i + 1] += m;
            ciphertext.push(state[i + 1]);
        }
    }

    perm.apply(&mut state);
    ciphertext.push(state[1]);
    ciphertext
}

/// decrypt and authenticate a ciphertext of a `length`-element plaintext
pub fn decrypt(ciphertext: &[Fq], key: &Point, nonce: u128, length: usize) -> Result<Vec<Fq>> {
    let expected = ciphertext_len(length);
    if ciphertext.len() != expected {
        return Err(Error::UndecodableCiphertext(format!(
            "expected {} ciphertext elements for length {}, got {}",
            expected,
            length,
            ciphertext.len()
        )));
    }

    let perm = cipher_permutation();
    let mut state = initial_state(key, nonce, length);
    let (body, tag) = ciphertext.split_at(expected - 1);
    let mut message = Vec::with_capacity(body.len());

    for block in body.chunks(CIPHER_RATE) {
        perm.apply(&mut state);
        for (i, c) in block.iter().enumerate() {
            message.push(*c - state[i + 1]);
            state[i + 1] = *c;
        }
    }

    if message[length..].iter().any(|m| !m.is_zero()) {
        return Err(Error::UndecodableCiphertext("nonzero padding".into()));
    }

    perm.apply(&mut state);
    if state[1] != tag[0] {
        return Err(Error::UndecodableCiphertext("authentication failed".into()));
    }

    message.truncate(length);
    Ok(message)
}

/// on-chain poseidon ciphertext: `[ct0, ct1, ct2, ct3, auth.x, auth.y, nonce]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pct {
    pub ciphertext: [Fq; PCT_CIPHERTEXT_LEN],
    /// `r·G`, lets the key owner recompute the shared key
    pub auth_key: Point,
    pub nonce: Fq,
}

impl Pct {
    /// the all-zero "absent" value
    pub fn zero() -> Self {
        Self {
            ciphertext: [Fq::zero(); PCT_CIPHERTEXT_LEN],
            auth_key: Point::zero(),
            nonce: Fq::zero(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.to_elements().iter().all(Zero::is_zero)
    }

    pub fn to_elements(&self) -> [Fq; PCT_LEN] {
        let c = &self.ciphertext;
        [c[0], c[1], c[2], c[3], self.auth_key.x, self.auth_key.y, self.nonce]
    }

    pub fn from_elements(elements: &[Fq]) -> Result<Self> {
        if elements.len() != PCT_LEN {
            return Err(Error::UndecodableCiphertext(format!(
                "pct must have {} elements, got {}",
                PCT_LEN,
                elements.len()
            )));
        }
        let mut ciphertext = [Fq::zero(); PCT_CIPHERTEXT_LEN];
        ciphertext.copy_from_slice(&elements[..PCT_CIPHERTEXT_LEN]);
        Ok(Self {
            ciphertext,
            auth_key: Point::new(elements[4], elements[5]),
            nonce: elements[6],
        })
    }

    /// encrypt 1..=3 elements to `recipient`
    pub fn encrypt<R: RngCore + CryptoRng>(
        plaintext: &[Fq],
        recipient: &Point,
        rng: &mut R,
    ) -> Result<Self> {
        let r = curve::random_scalar(rng);
        let mut nonce = [0u8; 16];
        rng.fill_bytes(&mut nonce);
        Self::encrypt_with(plaintext, recipient, &PrivateKey::from_scalar(r)?, u128::from_le_bytes(nonce))
    }

    /// encrypt with caller-supplied ephemeral key and nonce
    pub fn encrypt_with(
        plaintext: &[Fq],
        recipient: &Point,
        ephemeral: &PrivateKey,
        nonce: u128,
    ) -> Result<Self> {
        if plaintext.is_empty() || plaintext.len() > PCT_MAX_PLAINTEXT {
            return Err(Error::InvalidPlaintext(format!(
                "a pct carries 1..={} elements, got {}",
                PCT_MAX_PLAINTEXT,
                plaintext.len()
            )));
        }
        let shared = recipient.mul_scalar(ephemeral.scalar());
        let ct = encrypt(plaintext, &shared, nonce);
        let mut ciphertext = [Fq::zero(); PCT_CIPHERTEXT_LEN];
        ciphertext.copy_from_slice(&ct);

        Ok(Self {
            ciphertext,
            auth_key: ephemeral.public_key(),
            nonce: Fq::from(nonce),
        })
    }

    /// recover a `length`-element plaintext with the recipient's key
    pub fn decrypt(&self, key: &PrivateKey, length: usize) -> Result<Vec<Fq>> {
        if length == 0 || length > PCT_MAX_PLAINTEXT {
            return Err(Error::UndecodableCiphertext(format!(
                "a pct carries 1..={} elements, asked for {}",
                PCT_MAX_PLAINTEXT, length
            )));
        }
        let nonce = field::to_u128(&self.nonce)
            .ok_or_else(|| Error::UndecodableCiphertext("nonce is not below 2^128".into()))?;
        let shared = self.auth_key.mul_scalar(key.scalar());
        decrypt(&self.ciphertext, &shared, nonce, length)
    }

    /// recover a single-amount plaintext
    pub fn decrypt_amount(&self, key: &PrivateKey) -> Result<u64> {
        let plaintext = self.decrypt(key, 1)?;
        field::to_u64(&plaintext[0])
            .ok_or_else(|| Error::UndecodableCiphertext("amount does not fit in 64 bits".into()))
    }
}

impl Default for Pct {
    fn default() -> Self {
        Self::zero()
    }
}

impl Serialize for Pct {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_elements().iter().map(field::to_decimal))
    }
}

impl<'de> Deserialize<'de> for Pct {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let raw = Vec::<field::IntegerRepr>::deserialize(deserializer)?;
        let elements = raw
            .into_iter()
            .map(|repr| repr.into_biguint().and_then(|v| field::from_biguint::<Fq>(&v)))
            .collect::<Result<Vec<_>>>()
            .map_err(serde::de::Error::custom)?;
        Pct::from_elements(&elements).map_err(serde::de::Error::custom)
    }
}
