//! babyjubjub curve operations
//!
//! twisted edwards curve `a·x² + y² = 1 + d·x²·y²` over the bn254 scalar
//! field with the circomlib constants a = 168700, d = 168696. points stay in
//! affine coordinates and are compared coordinate-wise, so values read from
//! a ledger can be matched directly without normalization.
//!
//! nothing here validates input: an off-curve point is multiplied like any
//! other. callers that accept points from outside use [`Point::is_on_curve`].

use core::ops::{Add, Neg, Sub};

use ark_ff::{BigInteger, Field, MontFp, One, PrimeField, Zero};
use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::field::{self, Fq, Fr};

/// curve coefficient a
pub const COEFF_A: Fq = MontFp!("168700");

/// curve coefficient d
pub const COEFF_D: Fq = MontFp!("168696");

/// x of Base8, the generator of the prime-order subgroup
pub const BASE8_X: Fq =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");

/// y of Base8
pub const BASE8_Y: Fq =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

/// affine curve point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    #[serde(with = "crate::field::decimal")]
    pub x: Fq,
    #[serde(with = "crate::field::decimal")]
    pub y: Fq,
}

impl Point {
    pub const fn new(x: Fq, y: Fq) -> Self {
        Self { x, y }
    }

    /// the neutral element (0, 1)
    pub fn identity() -> Self {
        Self::new(Fq::zero(), Fq::one())
    }

    /// Base8
    pub const fn generator() -> Self {
        Self::new(BASE8_X, BASE8_Y)
    }

    /// (0, 0) - not a curve point, used by the ledger for "unset"
    pub fn zero() -> Self {
        Self::new(Fq::zero(), Fq::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    pub fn is_on_curve(&self) -> bool {
        let x2 = self.x.square();
        let y2 = self.y.square();
        COEFF_A * x2 + y2 == Fq::one() + COEFF_D * x2 * y2
    }

    pub fn double(&self) -> Self {
        *self + *self
    }

    /// scalar multiplication by a subgroup scalar
    pub fn mul_scalar(&self, scalar: &Fr) -> Self {
        self.mul_bits_be(scalar.into_bigint().to_bits_be())
    }

    /// scalar multiplication by a small integer
    pub fn mul_u64(&self, k: u64) -> Self {
        self.mul_bits_be((0..u64::BITS).rev().map(|i| (k >> i) & 1 == 1))
    }

    /// double-and-add over bits, most significant first
    fn mul_bits_be<I: IntoIterator<Item = bool>>(&self, bits: I) -> Self {
        bits.into_iter().fold(Self::identity(), |acc, bit| {
            let doubled = acc.double();
            if bit {
                doubled + *self
            } else {
                doubled
            }
        })
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        let x1x2 = self.x * rhs.x;
        let y1y2 = self.y * rhs.y;
        let dxy = COEFF_D * x1x2 * y1y2;

        // denominators only vanish for off-curve input
        let x_inv = (Fq::one() + dxy).inverse().unwrap_or_else(Fq::zero);
        let y_inv = (Fq::one() - dxy).inverse().unwrap_or_else(Fq::zero);

        Point::new(
            (self.x * rhs.y + self.y * rhs.x) * x_inv,
            (y1y2 - COEFF_A * x1x2) * y_inv,
        )
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, self.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        self + (-rhs)
    }
}

/// prime order of the Base8 subgroup
pub fn subgroup_order() -> BigUint {
    field::modulus::<Fr>()
}

/// reduce an integer into the scalar field
pub fn reduce(value: &BigUint) -> Fr {
    Fr::from_le_bytes_mod_order(&value.to_bytes_le())
}

/// reduce little-endian bytes into the scalar field
pub fn reduce_le_bytes(bytes: &[u8]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}

/// uniformly random nonzero scalar
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Fr {
    loop {
        let mut wide = [0u8; 64];
        rng.fill_bytes(&mut wide);
        let scalar = reduce_le_bytes(&wide);
        if !scalar.is_zero() {
            return scalar;
        }
    }
}

/// lift a subgroup scalar into the base field (l < q, so this is exact)
pub fn scalar_to_base(scalar: &Fr) -> Fq {
    Fq::from_le_bytes_mod_order(&scalar.into_bigint().to_bytes_le())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::parse;
    use rand::rngs::OsRng;

    fn point(x: &str, y: &str) -> Point {
        Point::new(parse(x).unwrap(), parse(y).unwrap())
    }

    #[test]
    fn test_generator_on_curve() {
        assert!(Point::generator().is_on_curve());
        assert!(Point::identity().is_on_curve());
        assert!(!Point::zero().is_on_curve());
    }

    #[test]
    fn test_generator_has_subgroup_order() {
        let l = subgroup_order();
        let g = Point::generator();

        // l·G by the integer path, since l itself reduces to 0 in Fr
        let bits = (0..l.bits()).rev().map(|i| l.bit(i));
        assert_eq!(g.mul_bits_be(bits), Point::identity());
        assert_eq!(g.mul_scalar(&reduce(&l)), Point::identity());
    }

    #[test]
    fn test_known_multiples() {
        let g = Point::generator();
        let two_g = point(
            "10031262171927540148667355526369034398030886437092045105752248699557385197826",
            "633281375905621697187330766174974863687049529291089048651929454608812697683",
        );
        let ten_g = point(
            "153240920024090527149238595127650983736082984617707450012091413752625486998",
            "4020276081434545615309760015178511782232038136121596626881988383789905359767",
        );
        assert_eq!(g.double(), two_g);
        assert_eq!(g.mul_u64(2), two_g);
        assert_eq!(g.mul_u64(10), ten_g);
        assert_eq!(g.mul_scalar(&Fr::from(10u64)), ten_g);
    }

    #[test]
    fn test_group_laws() {
        let mut rng = OsRng;
        let g = Point::generator();
        let a = random_scalar(&mut rng);
        let b = random_scalar(&mut rng);
        let pa = g.mul_scalar(&a);
        let pb = g.mul_scalar(&b);

        assert_eq!(pa + pb, pb + pa);
        assert_eq!(pa + pb, g.mul_scalar(&(a + b)));
        assert_eq!(pa.mul_scalar(&b), pb.mul_scalar(&a));
        assert_eq!(pa - pa, Point::identity());
        assert_eq!(pa + Point::identity(), pa);
        assert!(pa.is_on_curve());
    }

    #[test]
    fn test_zero_scalar_and_zero_point() {
        let g = Point::generator();
        assert_eq!(g.mul_scalar(&Fr::zero()), Point::identity());
        assert_eq!(g.mul_u64(0), Point::identity());
        assert!(Point::zero().is_zero());
        assert!(!Point::identity().is_zero());
    }

    #[test]
    fn test_equality_is_coordinatewise() {
        let g = Point::generator();
        let neg = -g;
        assert_ne!(g, neg);
        assert_eq!(g.x, -neg.x);
        assert_eq!(g.y, neg.y);
    }

    #[test]
    fn test_reduce() {
        let l = subgroup_order();
        assert!(reduce(&l).is_zero());
        assert_eq!(reduce(&(l.clone() + 5u32)), Fr::from(5u64));
        assert_eq!(reduce_le_bytes(&[3, 0, 0]), Fr::from(3u64));
        assert_eq!(scalar_to_base(&Fr::from(9u64)), Fq::from(9u64));
    }
}
