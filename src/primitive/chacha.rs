//! ChaCha20 permutation and keystream (RFC 8439), plus HChaCha20.
//!
//! The state is sixteen little-endian u32 words: four constants, eight
//! key words, one block counter and three nonce words. Twenty rounds
//! alternate column and diagonal quarter-rounds; the worked state is then
//! added word-wise to the initial state and serialized as a 64-byte
//! keystream block. One 32-bit counter word yields 256 GiB of keystream
//! per nonce, which the mode engines treat as unreachable.

/// The four constant words, ASCII `"expand 32-byte k"` read little-endian.
const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// One quarter-round over state words `a`, `b`, `c`, `d`.
#[inline(always)]
fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

/// Applies the full 20-round permutation (10 column + 10 diagonal passes).
fn rounds(state: &mut [u32; 16]) {
    for _ in 0..10 {
        quarter_round(state, 0, 4, 8, 12);
        quarter_round(state, 1, 5, 9, 13);
        quarter_round(state, 2, 6, 10, 14);
        quarter_round(state, 3, 7, 11, 15);

        quarter_round(state, 0, 5, 10, 15);
        quarter_round(state, 1, 6, 11, 12);
        quarter_round(state, 2, 7, 8, 13);
        quarter_round(state, 3, 4, 9, 14);
    }
}

fn key_words(key: &[u8; 32]) -> [u32; 8] {
    let mut words = [0u32; 8];
    for (word, chunk) in words.iter_mut().zip(key.chunks_exact(4)) {
        *word = u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
    }
    words
}

/// Generates one 64-byte keystream block.
#[must_use]
pub fn block(key: &[u8; 32], counter: u32, nonce: &[u8; 12]) -> [u8; 64] {
    let mut state = [0u32; 16];
    state[0..4].copy_from_slice(&CONSTANTS);
    state[4..12].copy_from_slice(&key_words(key));
    state[12] = counter;
    for (word, chunk) in state[13..16].iter_mut().zip(nonce.chunks_exact(4)) {
        *word = u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
    }

    let initial = state;
    rounds(&mut state);
    for (word, start) in state.iter_mut().zip(&initial) {
        *word = word.wrapping_add(*start);
    }

    let mut out = [0u8; 64];
    for (chunk, word) in out.chunks_exact_mut(4).zip(&state) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    out
}

/// XORs the keystream into `data`, starting `key_stream_index` octets into
/// the keystream that begins at `initial_counter`.
///
/// Encryption and decryption are the same operation. The index gives the
/// stream cipher random access: byte `i` of the keystream lives in block
/// `initial_counter + i / 64` at offset `i % 64`.
pub fn xor_at(key: &[u8; 32], nonce: &[u8; 12], initial_counter: u32, key_stream_index: u64, data: &mut [u8]) {
    let mut counter = initial_counter.wrapping_add((key_stream_index / 64) as u32);
    let mut offset = (key_stream_index % 64) as usize;
    let mut processed = 0usize;

    while processed < data.len() {
        let keystream = block(key, counter, nonce);
        counter = counter.wrapping_add(1);

        let take = (64 - offset).min(data.len() - processed);
        for (byte, ks) in data[processed..processed + take].iter_mut().zip(&keystream[offset..]) {
            *byte ^= ks;
        }
        processed += take;
        offset = 0;
    }
}

/// The HChaCha20 subkey derivation.
///
/// Runs the permutation (without the final feed-forward add) over
/// `constants || key || nonce` and returns words 0..4 and 12..16 as a
/// 32-byte derived key. XChaCha20 uses this to fold the first 16 nonce
/// bytes into the key.
#[must_use]
pub fn hchacha20(key: &[u8; 32], nonce: &[u8; 16]) -> [u8; 32] {
    let mut state = [0u32; 16];
    state[0..4].copy_from_slice(&CONSTANTS);
    state[4..12].copy_from_slice(&key_words(key));
    for (word, chunk) in state[12..16].iter_mut().zip(nonce.chunks_exact(4)) {
        *word = u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
    }

    rounds(&mut state);

    let mut out = [0u8; 32];
    for (chunk, word) in out[0..16].chunks_exact_mut(4).zip(&state[0..4]) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    for (chunk, word) in out[16..32].chunks_exact_mut(4).zip(&state[12..16]) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_0_to_31() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn test_rfc8439_block_function() {
        // RFC 8439 section 2.3.2
        let nonce: [u8; 12] = hex::decode("000000090000004a00000000").unwrap().try_into().unwrap();
        let out = block(&key_0_to_31(), 1, &nonce);
        let expected = hex::decode(
            "10f1e7e4d13b5915500fdd1fa32071c4c7d1f4c733c068030422aa9ac3d46c4e\
             d2826446079faa0914c2d705d98b02a2b5129cd1de164eb9cbd083e8a2503c4e",
        )
        .unwrap();
        assert_eq!(out.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_rfc8439_keystream_encryption() {
        // RFC 8439 section 2.4.2
        let nonce: [u8; 12] = hex::decode("000000000000004a00000000").unwrap().try_into().unwrap();
        let mut data = b"Ladies and Gentlemen of the class of '99: If I could offer you \
only one tip for the future, sunscreen would be it."
            .to_vec();
        xor_at(&key_0_to_31(), &nonce, 1, 0, &mut data);
        let expected = hex::decode(
            "6e2e359a2568f98041ba0728dd0d6981e97e7aec1d4360c20a27afccfd9fae0b\
             f91b65c5524733ab8f593dabcd62b3571639d624e65152ab8f530c359f0861d8\
             07ca0dbf500d6a6156a38e088a22b65e52bc514d16ccf806818ce91ab7793736\
             5af90bbf74a35be6b40b8eedf2785e42874d",
        )
        .unwrap();
        assert_eq!(data, expected);
    }

    #[test]
    fn test_keystream_index_matches_full_stream() {
        let key = key_0_to_31();
        let nonce = [7u8; 12];
        let mut full = vec![0u8; 200];
        xor_at(&key, &nonce, 0, 0, &mut full);

        // Random access must line up with the contiguous stream.
        let mut tail = vec![0u8; 73];
        xor_at(&key, &nonce, 0, 127, &mut tail);
        assert_eq!(tail.as_slice(), &full[127..200]);
    }

    #[test]
    fn test_hchacha20_subkey() {
        // draft-irtf-cfrg-xchacha test vector
        let key: [u8; 32] = hex::decode("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f")
            .unwrap()
            .try_into()
            .unwrap();
        let nonce: [u8; 16] = hex::decode("000000090000004a0000000031415927").unwrap().try_into().unwrap();
        let subkey = hchacha20(&key, &nonce);
        assert_eq!(hex::encode(subkey), "82413b4227b27bfed30e42508a877d73a0f9e4d58185ba97c4fa68b7d2761ec7");
    }

    #[test]
    fn test_xor_roundtrip() {
        let key = key_0_to_31();
        let nonce = [3u8; 12];
        let mut data = b"attack at dawn".to_vec();
        xor_at(&key, &nonce, 1, 0, &mut data);
        assert_ne!(data.as_slice(), b"attack at dawn");
        xor_at(&key, &nonce, 1, 0, &mut data);
        assert_eq!(data.as_slice(), b"attack at dawn");
    }
}
