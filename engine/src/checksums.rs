//! Checksum algorithms and the cancellable digest worker.
//!
//! This module provides:
//! - Multiple digest algorithms (MD5, SHA-256, BLAKE3, CRC32)
//! - `digest_file`: chunked file digesting with cooperative cancellation
//! - Lowercase-hex rendering of digest bytes

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, error};

use crate::config::CancellationToken;

/// Chunk size for file reads. Cancellation is checked between chunks, so
/// this also bounds how much work follows a cancellation request.
const READ_CHUNK: usize = 64 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// MD5 (weak, but cheap and sufficient for copy verification)
    Md5,
    /// SHA-256 (cryptographic, 256-bit)
    Sha256,
    /// BLAKE3 (modern, fast, 256-bit)
    Blake3,
    /// CRC32 (fast, 32-bit)
    Crc32,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
            Self::Crc32 => write!(f, "crc32"),
        }
    }
}

impl ChecksumAlgorithm {
    /// Resolve an algorithm identifier; `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha256" => Some(Self::Sha256),
            "blake3" => Some(Self::Blake3),
            "crc32" => Some(Self::Crc32),
            _ => None,
        }
    }
}

/// Incremental digest context.
///
/// `digest_file` creates a fresh context per call, so the source and
/// destination digests of one file pair never share mutable state and can
/// run concurrently.
pub trait ChecksumHasher {
    /// Fold more data into the digest
    fn update(&mut self, data: &[u8]);

    /// Finalize and return the digest bytes
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

struct Md5Hasher {
    context: md5::Context,
}

impl ChecksumHasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.context.compute().0.to_vec()
    }
}

struct Sha256Hasher {
    hasher: sha2::Sha256,
}

impl ChecksumHasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        use sha2::Digest;
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        use sha2::Digest;
        self.hasher.finalize().to_vec()
    }
}

struct Blake3Hasher {
    hasher: blake3::Hasher,
}

impl ChecksumHasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.hasher.finalize().as_bytes().to_vec()
    }
}

struct Crc32Hasher {
    crc: u32,
}

impl ChecksumHasher for Crc32Hasher {
    fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let mut crc = self.crc;
            crc ^= byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ 0xedb88320
                } else {
                    crc >> 1
                };
            }
            self.crc = crc;
        }
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        (self.crc ^ 0xffffffff).to_be_bytes().to_vec()
    }
}

/// Create a fresh digest context for the given algorithm
pub fn create_hasher(algorithm: ChecksumAlgorithm) -> Box<dyn ChecksumHasher> {
    match algorithm {
        ChecksumAlgorithm::Md5 => Box::new(Md5Hasher {
            context: md5::Context::new(),
        }),
        ChecksumAlgorithm::Sha256 => Box::new(Sha256Hasher {
            hasher: sha2::Sha256::default(),
        }),
        ChecksumAlgorithm::Blake3 => Box::new(Blake3Hasher {
            hasher: blake3::Hasher::new(),
        }),
        ChecksumAlgorithm::Crc32 => Box::new(Crc32Hasher { crc: 0 }),
    }
}

/// Digest a file in 64 KiB chunks, checking the cancellation token before
/// folding each chunk.
///
/// Returns `None` on cancellation mid-read or on any I/O error; the caller
/// cannot distinguish the two causes beyond "abort". The engine treats a
/// `None` digest as fatal.
pub fn digest_file(
    token: &CancellationToken,
    algorithm: ChecksumAlgorithm,
    path: &Path,
) -> Option<Vec<u8>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!("unable to open {} for digesting: {}", path.display(), e);
            return None;
        }
    };

    let mut hasher = create_hasher(algorithm);
    let mut buffer = [0u8; READ_CHUNK];

    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                if token.is_cancelled() {
                    debug!("digest cancelled for {}", path.display());
                    return None;
                }
                hasher.update(&buffer[..n]);
            }
            Err(e) => {
                error!("read error while digesting {}: {}", path.display(), e);
                return None;
            }
        }
    }

    Some(hasher.finalize())
}

/// Render digest bytes as lowercase hex
pub fn digest_to_hex(digest: &[u8]) -> String {
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}
