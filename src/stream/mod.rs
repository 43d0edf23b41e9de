//! Async chunk-wise encryption and decryption.
//!
//! The processor is a message-passing pipeline in the flume + tokio
//! style: the caller feeds input chunks into a channel, a spawned task
//! drives a [`crate::cipher::CipherState`], and the output channel
//! yields ciphertext or cleartext records in input order with a final
//! record carrying the MAC. Long inputs yield the scheduler
//! cooperatively every 4 MiB so one stream cannot starve a worker
//! thread.

mod processor;

pub use processor::{StreamChunk, decrypt_stream, encrypt_stream};
