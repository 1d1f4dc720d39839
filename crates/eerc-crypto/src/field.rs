//! field types and their text form at the external boundary
//!
//! ledger reads, key records and cli arguments carry field elements as
//! decimal strings (a `0x` prefix selects hex). values are range checked
//! against the modulus on the way in, never silently reduced.

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

use crate::{Error, Result};

/// babyjubjub base field (= bn254 scalar field); coordinates and poseidon elements
pub type Fq = ark_bn254::Fr;

/// babyjubjub prime-order subgroup scalar field
pub type Fr = ark_ed_on_bn254::Fr;

/// modulus of a prime field as a big integer
pub fn modulus<F: PrimeField>() -> BigUint {
    BigUint::from_bytes_le(&F::MODULUS.to_bytes_le())
}

/// canonical integer value of a field element
pub fn to_biguint<F: PrimeField>(value: &F) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

/// decimal text of a field element
pub fn to_decimal<F: PrimeField>(value: &F) -> String {
    to_biguint(value).to_str_radix(10)
}

/// element from an integer, rejecting values at or above the modulus
pub fn from_biguint<F: PrimeField>(value: &BigUint) -> Result<F> {
    if *value >= modulus::<F>() {
        return Err(Error::InvalidFieldElement(format!(
            "{} is not below the field modulus",
            value
        )));
    }
    Ok(F::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// parse decimal or `0x`-prefixed hex text into an integer
pub fn parse_biguint(text: &str) -> Result<BigUint> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => BigUint::parse_bytes(digits.as_bytes(), 16),
        None => BigUint::parse_bytes(text.as_bytes(), 10),
    };
    parsed.ok_or_else(|| Error::InvalidFieldElement(format!("not an integer: {:?}", text)))
}

/// parse text into a field element
pub fn parse<F: PrimeField>(text: &str) -> Result<F> {
    from_biguint(&parse_biguint(text)?)
}

/// value of an element if it fits in 64 bits
pub fn to_u64(value: &Fq) -> Option<u64> {
    let limbs = value.into_bigint().0;
    limbs[1..].iter().all(|l| *l == 0).then_some(limbs[0])
}

/// value of an element if it fits in 128 bits
pub fn to_u128(value: &Fq) -> Option<u128> {
    let limbs = value.into_bigint().0;
    limbs[2..]
        .iter()
        .all(|l| *l == 0)
        .then(|| ((limbs[1] as u128) << 64) | limbs[0] as u128)
}

/// ledgers emit both json numbers and strings for uint256 values
#[derive(serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum IntegerRepr {
    Text(String),
    Number(u64),
}

impl IntegerRepr {
    pub(crate) fn into_biguint(self) -> Result<BigUint> {
        match self {
            IntegerRepr::Text(text) => parse_biguint(&text),
            IntegerRepr::Number(n) => Ok(BigUint::from(n)),
        }
    }
}

/// serde adapter: field element as decimal string
pub mod decimal {
    use ark_ff::PrimeField;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::IntegerRepr;

    pub fn serialize<F: PrimeField, S: Serializer>(value: &F, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_decimal(value))
    }

    pub fn deserialize<'de, F: PrimeField, D: Deserializer<'de>>(deserializer: D) -> Result<F, D::Error> {
        let value = IntegerRepr::deserialize(deserializer)?
            .into_biguint()
            .map_err(serde::de::Error::custom)?;
        super::from_biguint(&value).map_err(serde::de::Error::custom)
    }
}

/// serde adapter: optional field element as decimal string
pub mod decimal_opt {
    use ark_ff::PrimeField;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::IntegerRepr;

    pub fn serialize<F: PrimeField, S: Serializer>(
        value: &Option<F>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&super::to_decimal(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, F: PrimeField, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<F>, D::Error> {
        match Option::<IntegerRepr>::deserialize(deserializer)? {
            Some(repr) => {
                let value = repr.into_biguint().map_err(serde::de::Error::custom)?;
                super::from_biguint(&value).map(Some).map_err(serde::de::Error::custom)
            }
            None => Ok(None),
        }
    }
}

/// serde adapter: unbounded integer as decimal string
pub mod biguint {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::IntegerRepr;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        IntegerRepr::deserialize(deserializer)?
            .into_biguint()
            .map_err(serde::de::Error::custom)
    }
}

/// serde adapter: u64 counters as decimal string, accepting json numbers
pub mod integer {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::IntegerRepr;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = IntegerRepr::deserialize(deserializer)?
            .into_biguint()
            .map_err(serde::de::Error::custom)?;
        let digits = value.to_u64_digits();
        match digits.as_slice() {
            [] => Ok(0),
            [n] => Ok(*n),
            _ => Err(serde::de::Error::custom(format!("{} does not fit in 64 bits", value))),
        }
    }
}
