//! Curve25519 arithmetic: the Montgomery ladder for X25519 and the
//! twisted-Edwards group for Ed25519.
//!
//! Field elements live in `BigUint` reduced modulo `2^255 - 19`.
//! Inversions go through Fermat exponentiation, and the Edwards side uses
//! extended homogeneous coordinates so additions stay inversion-free
//! until a point is encoded.

use std::sync::LazyLock;

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// The field prime `2^255 - 19`.
pub(crate) static P: LazyLock<BigUint> = LazyLock::new(|| (BigUint::one() << 255u32) - BigUint::from(19u8));

/// The Ed25519 group order `l = 2^252 + 27742317777372353535851937790883648493`.
pub(crate) static L: LazyLock<BigUint> =
    LazyLock::new(|| (BigUint::one() << 252u32) + BigUint::parse_bytes(b"27742317777372353535851937790883648493", 10).expect("group order"));

/// The Edwards curve constant `d = -121665/121666 mod p`.
static D: LazyLock<BigUint> = LazyLock::new(|| {
    BigUint::parse_bytes(b"37095705934669439343138083508754565189542113879843219016388785533085940283555", 10).expect("curve constant")
});

/// `sqrt(-1) mod p`, as `2^((p-1)/4)`.
static SQRT_M1: LazyLock<BigUint> = LazyLock::new(|| {
    let exponent = (&*P - BigUint::one()) >> 2u32;
    BigUint::from(2u8).modpow(&exponent, &P)
});

/// The Ed25519 base point.
static BASE: LazyLock<EdPoint> = LazyLock::new(|| {
    let x = BigUint::parse_bytes(b"15112221349535400772501151409588531511454012693041857206046113283949847762202", 10).expect("base x");
    let y = BigUint::parse_bytes(b"46316835694926478169428394003475163141307993866256225615783033603165251855960", 10).expect("base y");
    let t = &x * &y % &*P;
    EdPoint { x, y, z: BigUint::one(), t }
});

fn fadd(a: &BigUint, b: &BigUint) -> BigUint {
    (a + b) % &*P
}

fn fsub(a: &BigUint, b: &BigUint) -> BigUint {
    (a + &*P - b) % &*P
}

fn fmul(a: &BigUint, b: &BigUint) -> BigUint {
    a * b % &*P
}

fn finv(a: &BigUint) -> BigUint {
    let exponent = &*P - BigUint::from(2u8);
    a.modpow(&exponent, &P)
}

/// Clamps an X25519/Ed25519 scalar: clear the three low bits, clear the
/// top bit, set bit 254.
pub(crate) fn clamp(scalar: &mut [u8; 32]) {
    scalar[0] &= 248;
    scalar[31] &= 127;
    scalar[31] |= 64;
}

/// The X25519 function: Montgomery-ladder scalar multiplication over the
/// u-coordinate (RFC 7748 section 5).
pub(crate) fn x25519(scalar_bytes: &[u8; 32], u_bytes: &[u8; 32]) -> [u8; 32] {
    let mut scalar = *scalar_bytes;
    clamp(&mut scalar);
    let k = BigUint::from_bytes_le(&scalar);

    let mut masked_u = *u_bytes;
    masked_u[31] &= 127;
    let x1 = BigUint::from_bytes_le(&masked_u) % &*P;

    let a24 = BigUint::from(121_665u32);
    let mut x2 = BigUint::one();
    let mut z2 = BigUint::zero();
    let mut x3 = x1.clone();
    let mut z3 = BigUint::one();
    let mut swap = false;

    for t in (0..255).rev() {
        let k_t = k.bit(t);
        if swap != k_t {
            std::mem::swap(&mut x2, &mut x3);
            std::mem::swap(&mut z2, &mut z3);
        }
        swap = k_t;

        let a = fadd(&x2, &z2);
        let aa = fmul(&a, &a);
        let b = fsub(&x2, &z2);
        let bb = fmul(&b, &b);
        let e = fsub(&aa, &bb);
        let c = fadd(&x3, &z3);
        let d = fsub(&x3, &z3);
        let da = fmul(&d, &a);
        let cb = fmul(&c, &b);

        let da_plus_cb = fadd(&da, &cb);
        x3 = fmul(&da_plus_cb, &da_plus_cb);
        let da_minus_cb = fsub(&da, &cb);
        z3 = fmul(&x1, &fmul(&da_minus_cb, &da_minus_cb));
        x2 = fmul(&aa, &bb);
        z2 = fmul(&e, &fadd(&aa, &fmul(&a24, &e)));
    }

    if swap {
        std::mem::swap(&mut x2, &mut x3);
        std::mem::swap(&mut z2, &mut z3);
    }

    let result = fmul(&x2, &finv(&z2));
    let mut out = [0u8; 32];
    let bytes = result.to_bytes_le();
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

/// A point on the twisted Edwards curve `-x^2 + y^2 = 1 + d x^2 y^2`,
/// in extended homogeneous coordinates with `t = x y / z`.
#[derive(Clone)]
pub(crate) struct EdPoint {
    x: BigUint,
    y: BigUint,
    z: BigUint,
    t: BigUint,
}

impl EdPoint {
    pub(crate) fn identity() -> Self {
        Self { x: BigUint::zero(), y: BigUint::one(), z: BigUint::one(), t: BigUint::zero() }
    }

    pub(crate) fn base() -> Self {
        BASE.clone()
    }

    /// Unified addition (add-2008-hwcd-3 for `a = -1`).
    pub(crate) fn add(&self, other: &Self) -> Self {
        let a = fmul(&fsub(&self.y, &self.x), &fsub(&other.y, &other.x));
        let b = fmul(&fadd(&self.y, &self.x), &fadd(&other.y, &other.x));
        let two_d = fadd(&D, &D);
        let c = fmul(&fmul(&self.t, &two_d), &other.t);
        let d = fmul(&fadd(&self.z, &self.z), &other.z);
        let e = fsub(&b, &a);
        let f = fsub(&d, &c);
        let g = fadd(&d, &c);
        let h = fadd(&b, &a);
        Self { x: fmul(&e, &f), y: fmul(&g, &h), z: fmul(&f, &g), t: fmul(&e, &h) }
    }

    /// Doubling (dbl-2008-hwcd for `a = -1`).
    pub(crate) fn double(&self) -> Self {
        let a = fmul(&self.x, &self.x);
        let b = fmul(&self.y, &self.y);
        let z_squared = fmul(&self.z, &self.z);
        let c = fadd(&z_squared, &z_squared);
        let d = fsub(&BigUint::zero(), &a);
        let x_plus_y = fadd(&self.x, &self.y);
        let e = fsub(&fsub(&fmul(&x_plus_y, &x_plus_y), &a), &b);
        let g = fadd(&d, &b);
        let f = fsub(&g, &c);
        let h = fsub(&d, &b);
        Self { x: fmul(&e, &f), y: fmul(&g, &h), z: fmul(&f, &g), t: fmul(&e, &h) }
    }

    /// Double-and-add scalar multiplication, most significant bit first.
    pub(crate) fn scalar_mul(&self, scalar: &BigUint) -> Self {
        let mut result = Self::identity();
        for bit in (0..scalar.bits()).rev() {
            result = result.double();
            if scalar.bit(bit) {
                result = result.add(self);
            }
        }
        result
    }

    /// Encodes the point: y little-endian with the sign of x in the top
    /// bit.
    pub(crate) fn encode(&self) -> [u8; 32] {
        let z_inv = finv(&self.z);
        let x = fmul(&self.x, &z_inv);
        let y = fmul(&self.y, &z_inv);

        let mut out = [0u8; 32];
        let bytes = y.to_bytes_le();
        out[..bytes.len()].copy_from_slice(&bytes);
        if x.bit(0) {
            out[31] |= 0x80;
        }
        out
    }

    /// Decodes a point, recovering x from y via the square-root trick.
    ///
    /// Returns `None` for encodings that name no curve point.
    pub(crate) fn decode(bytes: &[u8; 32]) -> Option<Self> {
        let sign = bytes[31] >> 7 == 1;
        let mut y_bytes = *bytes;
        y_bytes[31] &= 127;
        let y = BigUint::from_bytes_le(&y_bytes);
        if y >= *P {
            return None;
        }

        // x^2 = (y^2 - 1) / (d y^2 + 1)
        let y_squared = fmul(&y, &y);
        let u = fsub(&y_squared, &BigUint::one());
        let v = fadd(&fmul(&D, &y_squared), &BigUint::one());

        // Candidate root: (u/v)^((p+3)/8) = u v^3 (u v^7)^((p-5)/8)
        let v3 = fmul(&fmul(&v, &v), &v);
        let v7 = fmul(&fmul(&v3, &v3), &v);
        let exponent = (&*P - BigUint::from(5u8)) >> 3u32;
        let mut x = fmul(&fmul(&u, &v3), &fmul(&u, &v7).modpow(&exponent, &P));

        let vxx = fmul(&v, &fmul(&x, &x));
        if vxx != u {
            if vxx == fsub(&BigUint::zero(), &u) {
                x = fmul(&x, &SQRT_M1);
            } else {
                return None;
            }
        }

        if x.is_zero() && sign {
            return None;
        }
        if x.bit(0) != sign {
            x = fsub(&BigUint::zero(), &x);
        }

        let t = fmul(&x, &y);
        Some(Self { x, y, z: BigUint::one(), t })
    }

    /// Affine equality across projective representations.
    pub(crate) fn equals(&self, other: &Self) -> bool {
        // x1/z1 == x2/z2 and y1/z1 == y2/z2, cross-multiplied.
        fmul(&self.x, &other.z) == fmul(&other.x, &self.z) && fmul(&self.y, &other.z) == fmul(&other.y, &self.z)
    }
}

/// Reduces a 64-byte little-endian value modulo the group order.
pub(crate) fn reduce_mod_l(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_le(bytes) % &*L
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7748_ladder_vector() {
        // RFC 7748 section 5.2, vector 1
        let scalar: [u8; 32] = hex::decode("a546e36bf0527c9d3b16154b82465edd62144c0ac1fc5a18506a2244ba449ac4")
            .unwrap()
            .try_into()
            .unwrap();
        let u: [u8; 32] = hex::decode("e6db6867583030db3594c1a424b15f7c726624ec26b3353b10a903a6d0ab1c4c")
            .unwrap()
            .try_into()
            .unwrap();
        let out = x25519(&scalar, &u);
        assert_eq!(hex::encode(out), "c3da55379de9c6908e94ea4df28d084f32eccf03491c71f754b4075577a28552");
    }

    #[test]
    fn test_base_point_encoding() {
        // The canonical encoding of B is 0x58 followed by 0x66 bytes.
        let encoded = EdPoint::base().encode();
        assert_eq!(hex::encode(encoded), "5866666666666666666666666666666666666666666666666666666666666666");
    }

    #[test]
    fn test_decode_inverts_encode() {
        let point = EdPoint::base().scalar_mul(&BigUint::from(12_345u32));
        let decoded = EdPoint::decode(&point.encode()).unwrap();
        assert!(point.equals(&decoded));
    }

    #[test]
    fn test_group_law_consistency() {
        // 2B + B == 3B via mixed double/add paths
        let b = EdPoint::base();
        let via_double = b.double().add(&b);
        let via_scalar = b.scalar_mul(&BigUint::from(3u8));
        assert!(via_double.equals(&via_scalar));
    }

    #[test]
    fn test_identity_is_neutral() {
        let b = EdPoint::base();
        assert!(b.add(&EdPoint::identity()).equals(&b));
    }

    #[test]
    fn test_order_annihilates_base() {
        let point = EdPoint::base().scalar_mul(&L);
        assert!(point.equals(&EdPoint::identity()));
    }

    #[test]
    fn test_decode_rejects_junk() {
        // y >= p is not a valid encoding
        let mut bytes = [0xffu8; 32];
        bytes[31] = 0x7f;
        assert!(EdPoint::decode(&bytes).is_none());
    }
}
