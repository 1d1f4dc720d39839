//! # eerc-crypto
//!
//! confidential balance cryptography for encrypted erc tokens.
//!
//! a user's balance lives on the ledger in two encrypted forms: a
//! homomorphic elgamal ciphertext (EGCT) that the contract updates in place,
//! and poseidon ciphertexts (PCT) appended per deposit that the owner or an
//! auditor can open directly. everything runs over babyjubjub, embedded in
//! the bn254 scalar field.
//!
//! ## flow
//!
//! ```text
//!  wallet signature
//!        │ keccak256 + clamp + mod l
//!        ▼
//!  ┌─────────────┐        ┌────────────────────────┐
//!  │ private key │──·G──▶ │ public key (registered)│
//!  └──────┬──────┘        └────────────────────────┘
//!         │
//!         ▼
//!  ┌──────────────────────────────────────────┐
//!  │ ledger snapshot: egct, amount pcts, pct  │
//!  └──────┬───────────────────────────┬───────┘
//!         │ egct non-empty            │ egct empty
//!         ▼                           ▼
//!   c2 - sk·c1 = m·G            sum of decryptable pcts
//!   bounded dlog → m
//! ```
//!
//! ## usage
//!
//! ```rust,ignore
//! use eerc_crypto::{keys::KeyPair, balance::BalanceReconstructor};
//!
//! let keys = KeyPair::from_signature(&signature)?;
//! let snapshot: EncryptedBalance = serde_json::from_str(&ledger_json)?;
//! let units = BalanceReconstructor::default()
//!     .reconstruct_snapshot(&keys.private_key, &snapshot)?;
//! ```

pub mod audit;
pub mod balance;
pub mod curve;
pub mod elgamal;
pub mod error;
pub mod field;
pub mod keys;
pub mod keystore;
pub mod params;
pub mod poseidon;
pub mod session;

pub use balance::{AmountPct, BalanceReconstructor, EncryptedBalance};
pub use curve::Point;
pub use elgamal::{DiscreteLog, Egct};
pub use error::{Error, Result};
pub use keys::{KeyPair, PrivateKey};
pub use params::DecodeParams;
pub use poseidon::Pct;
