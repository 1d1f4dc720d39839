//! end-to-end: register, deposit, read the ledger, show the balance

use rand::rngs::OsRng;

use eerc_crypto::field::Fq;
use eerc_crypto::keys::{registration_message, KeyPair};
use eerc_crypto::keystore::UserKeys;
use eerc_crypto::{AmountPct, BalanceReconstructor, DecodeParams, Egct, EncryptedBalance, Pct};

const ADDRESS: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";

/// stand-in for a wallet: deterministic bytes derived from the message
fn sign(message: &str) -> String {
    let seed = message.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
    let bytes: Vec<u8> = (0..65u8).map(|i| i.wrapping_mul(31).wrapping_add(seed)).collect();
    format!("0x{}", hex::encode(bytes))
}

#[test]
fn deposits_before_first_egct_are_summed_from_pcts() {
    let signature = sign(&registration_message(ADDRESS));
    let keys = KeyPair::from_signature(&signature).unwrap();

    // two deposits the ledger only recorded as pcts
    let snapshot = EncryptedBalance {
        amount_pcts: vec![
            AmountPct {
                pct: Pct::encrypt(&[Fq::from(1_000u64)], &keys.public_key, &mut OsRng).unwrap(),
                index: 0,
            },
            AmountPct {
                pct: Pct::encrypt(&[Fq::from(250u64)], &keys.public_key, &mut OsRng).unwrap(),
                index: 1,
            },
        ],
        transaction_index: 2,
        ..Default::default()
    };

    // through the ledger's json form and back
    let json = serde_json::to_string(&snapshot).unwrap();
    let read: EncryptedBalance = serde_json::from_str(&json).unwrap();

    let balance = BalanceReconstructor::default()
        .reconstruct_snapshot(&keys.private_key, &read)
        .unwrap();
    assert_eq!(balance, 1_250);
}

#[test]
fn egct_balance_wins_once_present() {
    let keys = KeyPair::from_signature(&sign(&registration_message(ADDRESS))).unwrap();

    let (first, _) = Egct::encrypt(600, &keys.public_key, &mut OsRng);
    let (second, _) = Egct::encrypt(400, &keys.public_key, &mut OsRng);

    let snapshot = EncryptedBalance {
        egct: first + second,
        nonce: 1,
        amount_pcts: vec![AmountPct {
            pct: Pct::encrypt(&[Fq::from(9u64)], &keys.public_key, &mut OsRng).unwrap(),
            index: 0,
        }],
        balance_pct: Pct::encrypt(&[Fq::from(1_000u64)], &keys.public_key, &mut OsRng).unwrap(),
        transaction_index: 3,
    };

    let reconstructor = BalanceReconstructor::new(DecodeParams::V1);
    assert_eq!(reconstructor.reconstruct_snapshot(&keys.private_key, &snapshot).unwrap(), 1_000);
}

#[test]
fn stored_keys_read_the_same_balance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user-keys.json");

    let signature = sign(&registration_message(ADDRESS));
    UserKeys::derive(ADDRESS, &signature, 43113).unwrap().save(&path).unwrap();

    let keys = UserKeys::load(&path).unwrap().key_pair().unwrap();
    let (egct, _) = Egct::encrypt(77, &keys.public_key, &mut OsRng);
    let snapshot = EncryptedBalance {
        egct,
        ..Default::default()
    };

    let fresh = KeyPair::from_signature(&signature).unwrap();
    let reconstructor = BalanceReconstructor::default();
    assert_eq!(reconstructor.reconstruct_snapshot(&keys.private_key, &snapshot).unwrap(), 77);
    assert_eq!(reconstructor.reconstruct_snapshot(&fresh.private_key, &snapshot).unwrap(), 77);
}
