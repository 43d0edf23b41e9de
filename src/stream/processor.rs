//! The chunk processor tasks behind `encrypt_stream`/`decrypt_stream`.

use std::sync::Arc;

use flume::{Receiver, Sender};

use crate::cipher::{Cipher, CipherState};
use crate::config::STREAM_YIELD_INTERVAL;
use crate::error::Result;
use crate::secret::SecretKey;
use crate::types::Mac;

/// Output chunks emitted per 64 KiB of processed data.
const OUTPUT_CHUNK_SIZE: usize = 64 * 1024;

/// One record on a stream processor's output channel.
#[derive(Debug, PartialEq)]
pub enum StreamChunk {
    /// A ciphertext (encrypting) or cleartext (decrypting) chunk, in
    /// input order.
    Data(Vec<u8>),
    /// The final record: the MAC of the whole stream. For decryption
    /// this is the verified expected MAC.
    Mac(Mac),
}

/// Encrypts a stream of chunks.
///
/// Consumes `input` until its senders drop, then yields the ciphertext
/// as [`StreamChunk::Data`] records followed by one
/// [`StreamChunk::Mac`]. Must be called inside a tokio runtime. Dropping
/// the returned receiver cancels the task; its buffered state zeroizes
/// on drop, and output already delivered is not recalled.
///
/// # Errors
/// [`crate::CryptoError::InvalidNonceLength`] for a wrong-sized nonce.
pub fn encrypt_stream(cipher: Arc<dyn Cipher>, key: &SecretKey, nonce: Option<&[u8]>, aad: &[u8], input: Receiver<Vec<u8>>) -> Result<Receiver<Result<StreamChunk>>> {
    let mut state = CipherState::encrypt(cipher, key, nonce)?;
    state.set_aad(aad)?;

    let (sender, receiver) = flume::bounded(16);
    tokio::spawn(async move {
        tracing::debug!("encrypt stream started");
        consume(&mut state, &input).await;
        match state.close_encrypt() {
            Ok(secret_box) => {
                let mac = secret_box.mac().clone();
                if emit_data(&sender, secret_box.cipher_text()).await.is_err() {
                    return;
                }
                let _ = sender.send_async(Ok(StreamChunk::Mac(mac))).await;
            }
            Err(error) => {
                let _ = sender.send_async(Err(error)).await;
            }
        }
    });
    Ok(receiver)
}

/// Decrypts a stream of ciphertext chunks.
///
/// The expected MAC is verified before any cleartext record is emitted;
/// on mismatch the only record is an [`crate::CryptoError::AuthFailure`]
/// and the buffered data is zeroized.
///
/// # Errors
/// [`crate::CryptoError::InvalidNonceLength`] for a wrong-sized nonce.
pub fn decrypt_stream(
    cipher: Arc<dyn Cipher>,
    key: &SecretKey,
    nonce: &[u8],
    aad: &[u8],
    expected_mac: Mac,
    input: Receiver<Vec<u8>>,
) -> Result<Receiver<Result<StreamChunk>>> {
    let mut state = CipherState::decrypt(cipher, key, nonce)?;
    state.set_aad(aad)?;

    let (sender, receiver) = flume::bounded(16);
    tokio::spawn(async move {
        tracing::debug!("decrypt stream started");
        consume(&mut state, &input).await;
        match state.close_decrypt(&expected_mac) {
            Ok(clear_text) => {
                if emit_data(&sender, &clear_text).await.is_err() {
                    return;
                }
                let _ = sender.send_async(Ok(StreamChunk::Mac(expected_mac))).await;
            }
            Err(error) => {
                let _ = sender.send_async(Err(error)).await;
            }
        }
    });
    Ok(receiver)
}

/// Feeds input chunks into the state, yielding every 4 MiB.
async fn consume(state: &mut CipherState, input: &Receiver<Vec<u8>>) {
    let mut since_yield = 0usize;
    while let Ok(chunk) = input.recv_async().await {
        since_yield += chunk.len();
        state.add_slice(&chunk);
        if since_yield >= STREAM_YIELD_INTERVAL {
            since_yield = 0;
            tokio::task::yield_now().await;
        }
    }
}

/// Emits `data` as bounded chunks, yielding every 4 MiB.
async fn emit_data(sender: &Sender<Result<StreamChunk>>, data: &[u8]) -> std::result::Result<(), ()> {
    let mut since_yield = 0usize;
    for chunk in data.chunks(OUTPUT_CHUNK_SIZE) {
        sender.send_async(Ok(StreamChunk::Data(chunk.to_vec()))).await.map_err(|_| ())?;
        since_yield += chunk.len();
        if since_yield >= STREAM_YIELD_INTERVAL {
            since_yield = 0;
            tokio::task::yield_now().await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{AesGcm, ChaCha20Poly1305};
    use crate::error::CryptoError;

    async fn collect(receiver: Receiver<Result<StreamChunk>>) -> (Vec<u8>, Option<Mac>, Option<CryptoError>) {
        let mut data = Vec::new();
        let mut mac = None;
        let mut error = None;
        while let Ok(record) = receiver.recv_async().await {
            match record {
                Ok(StreamChunk::Data(chunk)) => data.extend_from_slice(&chunk),
                Ok(StreamChunk::Mac(received)) => mac = Some(received),
                Err(err) => error = Some(err),
            }
        }
        (data, mac, error)
    }

    #[tokio::test]
    async fn test_stream_matches_one_shot() {
        let cipher = Arc::new(ChaCha20Poly1305::new());
        let key = cipher.new_secret_key();
        let nonce = cipher.new_nonce();

        let (tx, rx) = flume::unbounded();
        let output = encrypt_stream(cipher.clone(), &key, Some(&nonce), b"header", rx).unwrap();
        for chunk in [b"first ".as_slice(), b"second ", b"third"] {
            tx.send_async(chunk.to_vec()).await.unwrap();
        }
        drop(tx);

        let (cipher_text, mac, error) = collect(output).await;
        assert!(error.is_none());

        let one_shot = cipher.encrypt(b"first second third", &key, Some(&nonce), b"header").unwrap();
        assert_eq!(cipher_text, one_shot.cipher_text());
        assert_eq!(mac.unwrap(), *one_shot.mac());
    }

    #[tokio::test]
    async fn test_stream_roundtrip() {
        let cipher = Arc::new(AesGcm::new(32).unwrap());
        let key = cipher.new_secret_key();
        let nonce = cipher.new_nonce();
        let clear_text = vec![0xa5u8; 200_000];

        let (tx, rx) = flume::unbounded();
        let output = encrypt_stream(cipher.clone(), &key, Some(&nonce), b"", rx).unwrap();
        for chunk in clear_text.chunks(7_000) {
            tx.send_async(chunk.to_vec()).await.unwrap();
        }
        drop(tx);
        let (cipher_text, mac, _) = collect(output).await;

        let (tx, rx) = flume::unbounded();
        let output = decrypt_stream(cipher, &key, &nonce, b"", mac.unwrap(), rx).unwrap();
        for chunk in cipher_text.chunks(9_000) {
            tx.send_async(chunk.to_vec()).await.unwrap();
        }
        drop(tx);
        let (recovered, verified_mac, error) = collect(output).await;

        assert!(error.is_none());
        assert!(verified_mac.is_some());
        assert_eq!(recovered, clear_text);
    }

    #[tokio::test]
    async fn test_stream_auth_failure_yields_no_plaintext() {
        let cipher = Arc::new(ChaCha20Poly1305::new());
        let key = cipher.new_secret_key();
        let sealed = cipher.encrypt(b"sensitive", &key, None, b"").unwrap();

        let mut bad_mac = sealed.mac().as_bytes().to_vec();
        bad_mac[0] ^= 1;

        let (tx, rx) = flume::unbounded();
        let output = decrypt_stream(cipher, &key, sealed.nonce(), b"", Mac::new(bad_mac), rx).unwrap();
        tx.send_async(sealed.cipher_text().to_vec()).await.unwrap();
        drop(tx);

        let (data, mac, error) = collect(output).await;
        assert!(data.is_empty());
        assert!(mac.is_none());
        assert_eq!(error, Some(CryptoError::AuthFailure));
    }

    #[tokio::test]
    async fn test_invalid_nonce_fails_eagerly() {
        let cipher: Arc<dyn Cipher> = Arc::new(ChaCha20Poly1305::new());
        let key = cipher.new_secret_key();
        let (_tx, rx) = flume::unbounded::<Vec<u8>>();
        assert!(encrypt_stream(cipher, &key, Some(&[0u8; 5]), b"", rx).is_err());
    }
}
