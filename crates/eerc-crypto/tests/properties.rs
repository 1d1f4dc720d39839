//! property tests for key derivation and the two ciphertext forms
//!
//! curve arithmetic is slow in debug builds, so case counts are kept low.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use eerc_crypto::field::Fq;
use eerc_crypto::{elgamal, DecodeParams, Egct, Error, KeyPair, Pct, PrivateKey};

// =============================================================================
// STRATEGIES
// =============================================================================

/// 65 random bytes as a 0x-prefixed signature
fn signature() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<u8>(), 65).prop_map(|b| format!("0x{}", hex::encode(b)))
}

fn config() -> ProptestConfig {
    ProptestConfig::with_cases(12)
}

// =============================================================================
// KEY DERIVATION
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// same signature, same key; and never zero
    #[test]
    fn derivation_is_deterministic_and_nonzero(sig in signature()) {
        let a = KeyPair::from_signature(&sig).unwrap();
        let b = KeyPair::from_signature(&sig).unwrap();

        prop_assert_eq!(&a.private_key, &b.private_key);
        prop_assert_eq!(a.public_key, b.public_key);
        prop_assert!(a.public_key.is_on_curve());
        prop_assert_eq!(a.public_key, a.private_key.public_key());
    }

    /// anything shorter than 65 bytes is rejected
    #[test]
    fn short_signatures_are_rejected(bytes in prop::collection::vec(any::<u8>(), 0..65)) {
        let sig = format!("0x{}", hex::encode(bytes));
        prop_assert!(matches!(
            PrivateKey::from_signature(&sig),
            Err(Error::InvalidSignatureFormat(_))
        ));
    }
}

// =============================================================================
// CIPHERTEXTS
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// egct decrypts to the encrypted amount anywhere up to a small ceiling
    #[test]
    fn egct_roundtrip(seed in any::<u64>(), amount in 0u64..=200) {
        let mut rng = StdRng::seed_from_u64(seed);
        let sk = PrivateKey::random(&mut rng);
        let (ct, _) = Egct::encrypt(amount, &sk.public_key(), &mut rng);

        let params = DecodeParams::V1.with_ceiling(200);
        prop_assert_eq!(elgamal::decrypt_balance(&sk, &ct, &params).unwrap(), amount);
    }

    /// egct addition matches plaintext addition
    #[test]
    fn egct_is_additive(seed in any::<u64>(), a in 0u64..100, b in 0u64..100) {
        let mut rng = StdRng::seed_from_u64(seed);
        let sk = PrivateKey::random(&mut rng);
        let pk = sk.public_key();
        let (ca, _) = Egct::encrypt(a, &pk, &mut rng);
        let (cb, _) = Egct::encrypt(b, &pk, &mut rng);

        let params = DecodeParams::V1.with_ceiling(200);
        prop_assert_eq!(elgamal::decrypt_balance(&sk, &(ca + cb), &params).unwrap(), a + b);
    }

    /// pct opens to exactly what was sealed, for every plaintext length
    #[test]
    fn pct_roundtrip(seed in any::<u64>(), values in prop::collection::vec(any::<u64>(), 1..=3)) {
        let mut rng = StdRng::seed_from_u64(seed);
        let sk = PrivateKey::random(&mut rng);
        let plaintext: Vec<Fq> = values.iter().copied().map(Fq::from).collect();

        let pct = Pct::encrypt(&plaintext, &sk.public_key(), &mut rng).unwrap();
        prop_assert_eq!(pct.decrypt(&sk, plaintext.len()).unwrap(), plaintext);
    }

    /// a pct never opens under someone else's key
    #[test]
    fn pct_wrong_key_fails(seed in any::<u64>(), amount in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let owner = PrivateKey::random(&mut rng);
        let other = PrivateKey::random(&mut rng);

        let pct = Pct::encrypt(&[Fq::from(amount)], &owner.public_key(), &mut rng).unwrap();
        prop_assert!(pct.decrypt_amount(&other).is_err());
        prop_assert_eq!(pct.decrypt_amount(&owner).unwrap(), amount);
    }
}
