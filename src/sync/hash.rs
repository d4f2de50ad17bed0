//! Content hashing for mirror comparison.
//!
//! Files are compared by BLAKE3 digest of their full byte stream, so the
//! replica is proven byte-identical rather than assumed from metadata.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::error::SyncError;

/// Compute the BLAKE3 digest of a file using streaming reads.
///
/// The file is fed through the hasher in fixed-size chunks, so files of any
/// size can be hashed in constant memory.
pub fn hash_file(path: &Path) -> Result<blake3::Hash, SyncError> {
    let mut file = File::open(path)
        .map_err(|e| SyncError::from_io(e, "opening", Some(path.to_path_buf())))?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536]; // 64KB buffer

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| SyncError::from_io(e, "reading", Some(path.to_path_buf())))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Check whether two files have identical content.
///
/// Fails if either file cannot be opened or read; callers must treat that
/// case as "needs copy", never as "equal". Lengths are compared first since
/// files of different length cannot hash equal.
pub fn files_equal(a: &Path, b: &Path) -> Result<bool, SyncError> {
    let len_a = std::fs::metadata(a)
        .map_err(|e| SyncError::from_io(e, "reading metadata of", Some(a.to_path_buf())))?
        .len();
    let len_b = std::fs::metadata(b)
        .map_err(|e| SyncError::from_io(e, "reading metadata of", Some(b.to_path_buf())))?
        .len();

    if len_a != len_b {
        return Ok(false);
    }

    Ok(hash_file(a)? == hash_file(b)?)
}
