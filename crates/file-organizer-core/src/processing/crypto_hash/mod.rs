//! Content digests used as identity keys.
//!
//! Files are streamed through a Blake3 hasher in fixed-size blocks so memory
//! use stays flat regardless of file size.
use crate::error::{Error, Result};
use blake3::Hash as Blake3Hash;

use std::{fs::File, io::Read, path::Path};

/// Read block size for hashing
pub const HASH_BLOCK_SIZE: usize = 64 * 1024;

/// Compute the cryptographic hash of a file using the Blake3 algorithm
pub fn compute_cryptographic<P: AsRef<Path>>(path: P) -> Result<Blake3Hash> {
    let path = path.as_ref();
    let access = |source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(access)?;
    let mut hasher = blake3::Hasher::new();

    let mut buffer = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(access)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}
