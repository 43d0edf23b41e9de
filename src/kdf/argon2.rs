//! Argon2id v1.3 (RFC 9106).
//!
//! The memory is one contiguous arena of 1 KiB blocks indexed by
//! `(lane, column)`, filled in four synchronized slices per pass. The
//! first two slices of the first pass pick reference blocks
//! data-independently (Argon2i style, from a G²-generated address
//! stream); every later segment is data-dependent (Argon2d style, from
//! the previous block's first word). Multi-lane configurations fill the
//! lanes of a slice in parallel; each lane writes only its own segment
//! buffer and reads committed blocks, so the passes stay race-free.

use rayon::prelude::*;
use zeroize::Zeroize;

use crate::bytes::SensitiveBytes;
use crate::config::{ARGON2_SYNC_POINTS, ARGON2_VERSION};
use crate::error::{CryptoError, Result};
use crate::hash::Blake2bContext;
use crate::kdf::Kdf;
use crate::secret::SecretKey;
use crate::types::AlgorithmId;

/// One 1 KiB memory block as 128 little-endian words.
type Block = [u64; 128];

const ZERO_BLOCK: Block = [0u64; 128];

/// Addresses carried per address block in data-independent mode.
const ADDRESSES_PER_BLOCK: u64 = 128;

/// Argon2id with cost parameters fixed at construction.
pub struct Argon2id {
    parallelism: u32,
    memory_kib: u32,
    iterations: u32,
    hash_length: usize,
    secret: Option<SensitiveBytes>,
    associated_data: Vec<u8>,
}

impl Argon2id {
    /// Creates the deriver.
    ///
    /// # Errors
    /// [`CryptoError::InvalidParameter`] when `parallelism < 1`,
    /// `memory_kib < 8 * parallelism`, `iterations < 1` or
    /// `hash_length < 4`.
    pub fn new(parallelism: u32, memory_kib: u32, iterations: u32, hash_length: usize) -> Result<Self> {
        if parallelism < 1 {
            return Err(CryptoError::InvalidParameter("Argon2 parallelism must be at least 1"));
        }
        if memory_kib < 8 * parallelism {
            return Err(CryptoError::InvalidParameter("Argon2 memory must be at least 8 * parallelism KiB"));
        }
        if iterations < 1 {
            return Err(CryptoError::InvalidParameter("Argon2 iterations must be at least 1"));
        }
        if hash_length < 4 {
            return Err(CryptoError::InvalidParameter("Argon2 hash length must be at least 4 bytes"));
        }
        Ok(Self { parallelism, memory_kib, iterations, hash_length, secret: None, associated_data: Vec::new() })
    }

    /// Adds the optional pepper `K`, mixed into the preamble.
    #[must_use]
    pub fn with_secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(SensitiveBytes::from_slice(secret));
        self
    }

    /// Adds the optional associated data `X`, mixed into the preamble.
    #[must_use]
    pub fn with_associated_data(mut self, associated_data: &[u8]) -> Self {
        self.associated_data = associated_data.to_vec();
        self
    }

    /// Derives the tag for `password` and `salt`.
    ///
    /// # Errors
    /// Propagates parameter errors; the fill itself cannot fail.
    pub fn derive(&self, password: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
        let lanes = self.parallelism as usize;
        // m' rounds the request down to a multiple of 4p.
        let blocks_total = 4 * lanes * (self.memory_kib as usize / (4 * lanes));
        let lane_length = blocks_total / lanes;
        let segment_length = lane_length / ARGON2_SYNC_POINTS as usize;

        let h0 = self.preamble(password, salt);
        let mut arena = vec![ZERO_BLOCK; blocks_total];

        // B[i][0] and B[i][1] seed every lane from H0.
        for lane in 0..lanes {
            for column in 0..2 {
                let mut seed = Vec::with_capacity(h0.len() + 8);
                seed.extend_from_slice(&h0);
                seed.extend_from_slice(&(column as u32).to_le_bytes());
                seed.extend_from_slice(&(lane as u32).to_le_bytes());
                arena[lane * lane_length + column] = block_from_bytes(&blake2b_long(1024, &seed));
            }
        }

        let geometry = Geometry { lanes, lane_length, segment_length, blocks_total, iterations: self.iterations };

        for pass in 0..self.iterations as u64 {
            for slice in 0..ARGON2_SYNC_POINTS as u64 {
                tracing::trace!(pass, slice, "filling Argon2 slice");
                let segments: Vec<Vec<Block>> = if lanes > 1 {
                    (0..lanes).into_par_iter().map(|lane| fill_segment(&arena, &geometry, pass, slice, lane)).collect()
                } else {
                    (0..lanes).map(|lane| fill_segment(&arena, &geometry, pass, slice, lane)).collect()
                };

                for (lane, segment) in segments.into_iter().enumerate() {
                    let start_index = if pass == 0 && slice == 0 { 2 } else { 0 };
                    let base = lane * lane_length + slice as usize * segment_length + start_index;
                    for (offset, block) in segment.into_iter().enumerate() {
                        arena[base + offset] = block;
                    }
                }
            }
        }

        // C = XOR of every lane's final column.
        let mut final_block = arena[lane_length - 1];
        for lane in 1..lanes {
            let last = &arena[lane * lane_length + lane_length - 1];
            for (word, add) in final_block.iter_mut().zip(last) {
                *word ^= add;
            }
        }

        let tag = blake2b_long(self.hash_length, &block_to_bytes(&final_block));

        for block in &mut arena {
            block.fill(0);
        }
        final_block.fill(0);
        Ok(tag)
    }

    /// `H_0`: the BLAKE2b-512 preamble binding every parameter.
    fn preamble(&self, password: &[u8], salt: &[u8]) -> [u8; 64] {
        let mut context = Blake2bContext::new_unkeyed(64);
        for parameter in [self.parallelism, self.hash_length as u32, self.memory_kib, self.iterations, ARGON2_VERSION, 2] {
            context.update_bytes(&parameter.to_le_bytes());
        }
        for field in [password, salt, self.secret.as_deref().unwrap_or(&[]), self.associated_data.as_slice()] {
            context.update_bytes(&(field.len() as u32).to_le_bytes());
            context.update_bytes(field);
        }
        context.finalize_bytes().try_into().expect("64-byte digest")
    }
}

impl Kdf for Argon2id {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Argon2id
    }

    fn output_length(&self) -> usize {
        self.hash_length
    }

    fn derive_key(&self, secret: &[u8], salt: &[u8]) -> Result<SecretKey> {
        Ok(SecretKey::new(self.derive(secret, salt)?))
    }
}

struct Geometry {
    lanes: usize,
    lane_length: usize,
    segment_length: usize,
    blocks_total: usize,
    iterations: u32,
}

/// Computes one lane's segment for `(pass, slice)` against the committed
/// arena. Same-lane references into the segment under construction read
/// the local buffer; everything else reads the arena.
fn fill_segment(arena: &[Block], geometry: &Geometry, pass: u64, slice: u64, lane: usize) -> Vec<Block> {
    let segment_length = geometry.segment_length as u64;
    let lane_length = geometry.lane_length as u64;
    let data_independent = pass == 0 && slice < 2;
    let start_index = if pass == 0 && slice == 0 { 2u64 } else { 0 };
    let segment_start = slice * segment_length;

    let mut input_block = ZERO_BLOCK;
    let mut address_block = ZERO_BLOCK;
    if data_independent {
        input_block[0] = pass;
        input_block[1] = lane as u64;
        input_block[2] = slice;
        input_block[3] = geometry.blocks_total as u64;
        input_block[4] = u64::from(geometry.iterations);
        input_block[5] = 2; // Argon2id type tag
        if start_index == 2 {
            next_addresses(&mut input_block, &mut address_block);
        }
    }

    let mut local: Vec<Block> = Vec::with_capacity((segment_length - start_index) as usize);
    let lane_base = lane * geometry.lane_length;
    let local_start = segment_start + start_index;

    for index in start_index..segment_length {
        if data_independent && index % ADDRESSES_PER_BLOCK == 0 {
            next_addresses(&mut input_block, &mut address_block);
        }

        let current = segment_start + index;
        let previous = (current + lane_length - 1) % lane_length;

        let pseudo_random = if data_independent {
            address_block[(index % ADDRESSES_PER_BLOCK) as usize]
        } else {
            lane_block(arena, &local, lane_base, local_start, current, previous)[0]
        };

        let j1 = pseudo_random & 0xffff_ffff;
        let j2 = pseudo_random >> 32;

        let reference_lane = if pass == 0 && slice == 0 { lane } else { (j2 % geometry.lanes as u64) as usize };
        let same_lane = reference_lane == lane;
        let reference_index = index_alpha(pass, slice, index, same_lane, segment_length, lane_length, j1);

        let reference = if same_lane {
            lane_block(arena, &local, lane_base, local_start, current, reference_index)
        } else {
            &arena[reference_lane * geometry.lane_length + reference_index as usize]
        };
        let previous_block = lane_block(arena, &local, lane_base, local_start, current, previous);

        // Version 1.3: overwrite passes XOR the new value into the old.
        let old = if pass > 0 { Some(&arena[lane_base + current as usize]) } else { None };
        let new_block = compress(previous_block, reference, old);
        local.push(new_block);
    }

    local
}

/// Reads a column of the current lane: columns of the segment under
/// construction come from the local buffer, committed columns from the
/// arena.
fn lane_block<'a>(arena: &'a [Block], local: &'a [Block], lane_base: usize, local_start: u64, current: u64, column: u64) -> &'a Block {
    if column >= local_start && column < current {
        &local[(column - local_start) as usize]
    } else {
        &arena[lane_base + column as usize]
    }
}

/// Maps `(J1, area)` onto a reference column with the RFC 9106 quadratic
/// distribution, which biases references toward recent blocks.
fn index_alpha(pass: u64, slice: u64, index: u64, same_lane: bool, segment_length: u64, lane_length: u64, j1: u64) -> u64 {
    let reference_area_size = if pass == 0 {
        if same_lane {
            slice * segment_length + index - 1
        } else if index == 0 {
            slice * segment_length - 1
        } else {
            slice * segment_length
        }
    } else if same_lane {
        lane_length - segment_length + index - 1
    } else if index == 0 {
        lane_length - segment_length - 1
    } else {
        lane_length - segment_length
    };

    let x = (j1 * j1) >> 32;
    let y = (reference_area_size * x) >> 32;
    let relative = reference_area_size - 1 - y;

    let window_start = if pass == 0 { 0 } else { (slice + 1) * segment_length % lane_length };
    (window_start + relative) % lane_length
}

/// Generates the next 128 data-independent addresses:
/// `address = G(0, G(0, input))` with the input counter bumped first.
fn next_addresses(input_block: &mut Block, address_block: &mut Block) {
    input_block[6] += 1;
    let intermediate = compress(&ZERO_BLOCK, input_block, None);
    *address_block = compress(&ZERO_BLOCK, &intermediate, None);
}

/// The Argon2 compression function G.
fn compress(previous: &Block, reference: &Block, old: Option<&Block>) -> Block {
    let mut r = ZERO_BLOCK;
    for (word, (a, b)) in r.iter_mut().zip(previous.iter().zip(reference)) {
        *word = a ^ b;
    }

    let mut q = r;

    // P over the 8 rows of 16 words.
    for row in 0..8 {
        let mut v: [u64; 16] = q[16 * row..16 * row + 16].try_into().expect("row of 16 words");
        permutation(&mut v);
        q[16 * row..16 * row + 16].copy_from_slice(&v);
    }

    // P over the 8 columns of 2-word registers.
    for column in 0..8 {
        let mut v = [0u64; 16];
        for k in 0..8 {
            v[2 * k] = q[16 * k + 2 * column];
            v[2 * k + 1] = q[16 * k + 2 * column + 1];
        }
        permutation(&mut v);
        for k in 0..8 {
            q[16 * k + 2 * column] = v[2 * k];
            q[16 * k + 2 * column + 1] = v[2 * k + 1];
        }
    }

    let mut out = ZERO_BLOCK;
    for (word, (a, b)) in out.iter_mut().zip(q.iter().zip(&r)) {
        *word = a ^ b;
    }
    if let Some(old_block) = old {
        for (word, extra) in out.iter_mut().zip(old_block) {
            *word ^= extra;
        }
    }
    out
}

/// The BlaMka round: BLAKE2b's G with `a + b + 2 * lo(a) * lo(b)`.
fn permutation(v: &mut [u64; 16]) {
    blamka_quarter(v, 0, 4, 8, 12);
    blamka_quarter(v, 1, 5, 9, 13);
    blamka_quarter(v, 2, 6, 10, 14);
    blamka_quarter(v, 3, 7, 11, 15);

    blamka_quarter(v, 0, 5, 10, 15);
    blamka_quarter(v, 1, 6, 11, 12);
    blamka_quarter(v, 2, 7, 8, 13);
    blamka_quarter(v, 3, 4, 9, 14);
}

#[inline(always)]
fn blamka(a: u64, b: u64) -> u64 {
    let low_product = u64::from(a as u32).wrapping_mul(u64::from(b as u32));
    a.wrapping_add(b).wrapping_add(low_product.wrapping_mul(2))
}

#[inline(always)]
fn blamka_quarter(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize) {
    v[a] = blamka(v[a], v[b]);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = blamka(v[c], v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = blamka(v[a], v[b]);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = blamka(v[c], v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

/// The variable-length hash H': plain BLAKE2b up to 64 bytes, a chained
/// 32-byte ladder above that.
fn blake2b_long(output_length: usize, input: &[u8]) -> Vec<u8> {
    let length_prefix = (output_length as u32).to_le_bytes();

    if output_length <= 64 {
        let mut context = Blake2bContext::new_unkeyed(output_length);
        context.update_bytes(&length_prefix);
        context.update_bytes(input);
        return context.finalize_bytes();
    }

    let rungs = output_length.div_ceil(32) - 2;
    let mut out = Vec::with_capacity(output_length);

    let mut context = Blake2bContext::new_unkeyed(64);
    context.update_bytes(&length_prefix);
    context.update_bytes(input);
    let mut v = context.finalize_bytes();
    out.extend_from_slice(&v[..32]);

    for _ in 1..rungs {
        let mut context = Blake2bContext::new_unkeyed(64);
        context.update_bytes(&v);
        v = context.finalize_bytes();
        out.extend_from_slice(&v[..32]);
    }

    let mut context = Blake2bContext::new_unkeyed(output_length - 32 * rungs);
    context.update_bytes(&v);
    out.extend_from_slice(&context.finalize_bytes());
    v.zeroize();
    out
}

fn block_from_bytes(bytes: &[u8]) -> Block {
    debug_assert_eq!(bytes.len(), 1024);
    let mut block = ZERO_BLOCK;
    for (word, chunk) in block.iter_mut().zip(bytes.chunks_exact(8)) {
        *word = u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
    }
    block
}

fn block_to_bytes(block: &Block) -> Vec<u8> {
    let mut out = Vec::with_capacity(1024);
    for word in block {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc9106_reference_vector() {
        // RFC 9106 section 5.3: Argon2id, m = 32 KiB, t = 3, p = 4.
        let argon = Argon2id::new(4, 32, 3, 32).unwrap().with_secret(&[3u8; 8]).with_associated_data(&[4u8; 12]);
        let tag = argon.derive(&[1u8; 32], &[2u8; 16]).unwrap();
        assert_eq!(hex::encode(&tag), "0d640df58d78766c08c037a34a8b53c9d01ef0452d75b65eb52520e96b01e659");
    }

    #[test]
    fn test_single_lane_determinism() {
        let argon = Argon2id::new(1, 16, 2, 32).unwrap();
        let a = argon.derive(b"password", b"somesalt").unwrap();
        let b = argon.derive(b"password", b"somesalt").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_cost_parameters_change_output() {
        let base = Argon2id::new(1, 16, 2, 32).unwrap().derive(b"pw", b"saltsalt").unwrap();
        let more_memory = Argon2id::new(1, 24, 2, 32).unwrap().derive(b"pw", b"saltsalt").unwrap();
        let more_passes = Argon2id::new(1, 16, 3, 32).unwrap().derive(b"pw", b"saltsalt").unwrap();
        assert_ne!(base, more_memory);
        assert_ne!(base, more_passes);
    }

    #[test]
    fn test_lane_count_changes_output() {
        let one = Argon2id::new(1, 32, 1, 32).unwrap().derive(b"pw", b"saltsalt").unwrap();
        let two = Argon2id::new(2, 32, 1, 32).unwrap().derive(b"pw", b"saltsalt").unwrap();
        assert_ne!(one, two);
    }

    #[test]
    fn test_parameter_validation() {
        assert!(Argon2id::new(0, 32, 1, 32).is_err());
        assert!(Argon2id::new(4, 31, 1, 32).is_err());
        assert!(Argon2id::new(1, 8, 0, 32).is_err());
        assert!(Argon2id::new(1, 8, 1, 3).is_err());
    }

    #[test]
    fn test_blake2b_long_boundary() {
        // 64 bytes uses plain BLAKE2b, 65 enters the ladder.
        assert_eq!(blake2b_long(64, b"x").len(), 64);
        assert_eq!(blake2b_long(65, b"x").len(), 65);
        assert_eq!(blake2b_long(1024, b"x").len(), 1024);
        assert_ne!(blake2b_long(64, b"x")[..32], blake2b_long(65, b"x")[..32]);
    }
}
