//! Content fingerprinting for change detection.
//!
//! A fingerprint is the SHA-256 digest of a file's bytes, hex-encoded.
//! Content-based rather than mtime-based so it survives `git checkout`,
//! `rsync` without `-t`, and anything else that rewrites timestamps without
//! touching bytes.
//!
//! Files are read in fixed-size blocks so a multi-gigabyte video never has
//! to fit in memory.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read granularity for hashing. Memory use per hash is bounded by this.
const BLOCK_SIZE: usize = 64 * 1024;

/// SHA-256 of a file's contents, streamed block-by-block, as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut block = vec![0u8; BLOCK_SIZE];
    loop {
        let n = file.read(&mut block)?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
