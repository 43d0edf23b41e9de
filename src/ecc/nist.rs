//! Short-Weierstrass arithmetic for the NIST P-256/384/521 curves.
//!
//! Points are affine `(x, y)` pairs over `BigUint` with `None` standing
//! for the point at infinity; additions pay a Fermat inversion each,
//! which keeps the group law textbook-simple. All three curves share
//! `a = p - 3`.

use std::sync::LazyLock;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::types::KeyPairType;

/// The domain parameters of one curve.
pub(crate) struct CurveParams {
    pub(crate) p: BigUint,
    pub(crate) a: BigUint,
    pub(crate) b: BigUint,
    pub(crate) n: BigUint,
    pub(crate) gx: BigUint,
    pub(crate) gy: BigUint,
    /// Serialized length of one coordinate or scalar.
    pub(crate) byte_length: usize,
    pub(crate) key_pair_type: KeyPairType,
}

fn from_hex(digits: &str) -> BigUint {
    BigUint::parse_bytes(digits.as_bytes(), 16).expect("curve constant")
}

pub(crate) static P256: LazyLock<CurveParams> = LazyLock::new(|| {
    let p = from_hex("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff");
    let a = &p - BigUint::from(3u8);
    CurveParams {
        a,
        b: from_hex("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b"),
        n: from_hex("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551"),
        gx: from_hex("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"),
        gy: from_hex("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"),
        byte_length: 32,
        key_pair_type: KeyPairType::P256,
        p,
    }
});

pub(crate) static P384: LazyLock<CurveParams> = LazyLock::new(|| {
    let p = from_hex("fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffeffffffff0000000000000000ffffffff");
    let a = &p - BigUint::from(3u8);
    CurveParams {
        a,
        b: from_hex("b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875ac656398d8a2ed19d2a85c8edd3ec2aef"),
        n: from_hex("ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf581a0db248b0a77aecec196accc52973"),
        gx: from_hex("aa87ca22be8b05378eb1c71ef320ad746e1d3b628ba79b9859f741e082542a385502f25dbf55296c3a545e3872760ab7"),
        gy: from_hex("3617de4a96262c6f5d9e98bf9292dc29f8f41dbd289a147ce9da3113b5f0b8c00a60b1ce1d7e819d7a431d7c90ea0e5f"),
        byte_length: 48,
        key_pair_type: KeyPairType::P384,
        p,
    }
});

pub(crate) static P521: LazyLock<CurveParams> = LazyLock::new(|| {
    let p = (BigUint::one() << 521u32) - BigUint::one();
    let a = &p - BigUint::from(3u8);
    CurveParams {
        a,
        b: from_hex(
            "0051953eb9618e1c9a1f929a21a0b68540eea2da725b99b315f3b8b489918ef1\
             09e156193951ec7e937b1652c0bd3bb1bf073573df883d2c34f1ef451fd46b50\
             3f00",
        ),
        n: from_hex(
            "01ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff\
             fffa51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e9138\
             6409",
        ),
        gx: from_hex(
            "00c6858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d\
             3dbaa14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5\
             bd66",
        ),
        gy: from_hex(
            "011839296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e\
             662c97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd1\
             6650",
        ),
        byte_length: 66,
        key_pair_type: KeyPairType::P521,
        p,
    }
});

/// An affine point; `None` is the point at infinity.
pub(crate) type Point = Option<(BigUint, BigUint)>;

impl CurveParams {
    pub(crate) fn generator(&self) -> Point {
        Some((self.gx.clone(), self.gy.clone()))
    }

    /// Whether `(x, y)` satisfies `y^2 = x^3 + a x + b`.
    pub(crate) fn contains(&self, x: &BigUint, y: &BigUint) -> bool {
        if x >= &self.p || y >= &self.p {
            return false;
        }
        let left = y * y % &self.p;
        let right = (x * x % &self.p * x + &self.a * x + &self.b) % &self.p;
        left == right
    }

    fn inverse(&self, value: &BigUint) -> BigUint {
        let exponent = &self.p - BigUint::from(2u8);
        value.modpow(&exponent, &self.p)
    }

    fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        ((a + &self.p) - b) % &self.p
    }

    pub(crate) fn add(&self, lhs: &Point, rhs: &Point) -> Point {
        let (x1, y1) = match lhs {
            Some(point) => point,
            None => return rhs.clone(),
        };
        let (x2, y2) = match rhs {
            Some(point) => point,
            None => return lhs.clone(),
        };

        if x1 == x2 {
            // Either a doubling or inverse points summing to infinity.
            if y1 == y2 && !y1.is_zero() {
                return self.double(lhs);
            }
            return None;
        }

        // lambda = (y2 - y1) / (x2 - x1)
        let lambda = self.sub(y2, y1) * self.inverse(&self.sub(x2, x1)) % &self.p;
        let x3 = self.sub(&(&lambda * &lambda % &self.p), &((x1 + x2) % &self.p));
        let y3 = self.sub(&(&lambda * self.sub(x1, &x3) % &self.p), y1);
        Some((x3, y3))
    }

    pub(crate) fn double(&self, point: &Point) -> Point {
        let (x, y) = match point {
            Some(point) => point,
            None => return None,
        };
        if y.is_zero() {
            return None;
        }

        // lambda = (3 x^2 + a) / 2 y
        let numerator = (BigUint::from(3u8) * x % &self.p * x + &self.a) % &self.p;
        let lambda = numerator * self.inverse(&(BigUint::from(2u8) * y % &self.p)) % &self.p;
        let x3 = self.sub(&(&lambda * &lambda % &self.p), &((x + x) % &self.p));
        let y3 = self.sub(&(&lambda * self.sub(x, &x3) % &self.p), y);
        Some((x3, y3))
    }

    /// Double-and-add scalar multiplication, most significant bit first.
    pub(crate) fn scalar_mul(&self, scalar: &BigUint, point: &Point) -> Point {
        let mut result: Point = None;
        for bit in (0..scalar.bits()).rev() {
            result = self.double(&result);
            if scalar.bit(bit) {
                result = self.add(&result, point);
            }
        }
        result
    }

    /// Serializes a field element big-endian, left-padded to the curve
    /// byte length.
    pub(crate) fn encode_coordinate(&self, value: &BigUint) -> Vec<u8> {
        let bytes = value.to_bytes_be();
        let mut out = vec![0u8; self.byte_length - bytes.len()];
        out.extend_from_slice(&bytes);
        out
    }
}
