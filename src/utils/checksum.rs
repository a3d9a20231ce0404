//! Streaming CRC32 over files.
//!
//! Files are read in bounded chunks so ROMs of any size can be checked
//! without loading them into memory. The checksum is the standard zlib
//! CRC-32 (seed 0) and does not depend on the chunk size.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::Crc32;

/// Default read size when streaming a file
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// CRC32 of the file at `path`
///
/// # Errors
///
/// Returns `ChecksumError::NotFound` if the file does not exist and
/// `ChecksumError::Io` if it cannot be read.
pub fn checksum_of(path: &Path) -> Result<Crc32, ChecksumError> {
    checksum_of_with_chunk_size(path, DEFAULT_CHUNK_SIZE)
}

/// CRC32 of the file at `path`, reading `chunk_size` bytes at a time
///
/// # Errors
///
/// See [`checksum_of`].
pub fn checksum_of_with_chunk_size(path: &Path, chunk_size: usize) -> Result<Crc32, ChecksumError> {
    let file = File::open(path).map_err(|e| open_error(path, e))?;
    checksum_reader(file, chunk_size).map_err(|source| ChecksumError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// CRC32 of everything `reader` yields
///
/// # Errors
///
/// Returns any I/O error from the reader other than `Interrupted`.
pub fn checksum_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<Crc32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(Crc32(hasher.finalize()))
}

/// Check the file at `path` against an expected checksum
///
/// # Errors
///
/// See [`checksum_of`].
pub fn verify(path: &Path, expected: Crc32) -> Result<bool, ChecksumError> {
    Ok(checksum_of(path)? == expected)
}

fn open_error(path: &Path, source: io::Error) -> ChecksumError {
    if source.kind() == io::ErrorKind::NotFound {
        ChecksumError::NotFound(path.to_path_buf())
    } else {
        ChecksumError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_known_value() {
        // Standard CRC-32 check value
        let file = temp_file_with(b"123456789");
        assert_eq!(checksum_of(file.path()).unwrap(), Crc32(0xCBF4_3926));
    }

    #[test]
    fn test_empty_file() {
        let file = temp_file_with(b"");
        assert_eq!(checksum_of(file.path()).unwrap(), Crc32(0));
    }

    #[test]
    fn test_chunk_size_independent() {
        let content: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();
        let file = temp_file_with(&content);

        let reference = checksum_of(file.path()).unwrap();
        for chunk_size in [1, 7, 512, 4096, 9_999, 10_000, 1 << 20] {
            assert_eq!(
                checksum_of_with_chunk_size(file.path(), chunk_size).unwrap(),
                reference,
                "chunk size {chunk_size}"
            );
        }
        assert_eq!(reference, Crc32(crc32fast::hash(&content)));
    }

    #[test]
    fn test_order_sensitive() {
        let a = temp_file_with(b"ab");
        let b = temp_file_with(b"ba");
        assert_ne!(
            checksum_of(a.path()).unwrap(),
            checksum_of(b.path()).unwrap()
        );
    }

    #[test]
    fn test_verify() {
        let file = temp_file_with(b"123456789");
        assert!(verify(file.path(), Crc32(0xCBF4_3926)).unwrap());
        assert!(!verify(file.path(), Crc32(0xCBF4_3927)).unwrap());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        assert!(matches!(
            checksum_of(&missing),
            Err(ChecksumError::NotFound(p)) if p == missing
        ));
    }
}
