//! BPS patch application.
//!
//! A BPS patch is `BPS1`, three varints (source size, target size, metadata
//! size), the metadata, a stream of actions and a 12-byte footer holding the
//! little-endian CRC32s of source, target and the patch itself (excluding
//! its own last four bytes). All three checksums are verified.

use crate::core::types::{Crc32, SupportedFormat};
use crate::patching::PatchError;

const MAGIC: &[u8] = b"BPS1";
const FOOTER_LEN: usize = 12;

const SOURCE_READ: u64 = 0;
const TARGET_READ: u64 = 1;
const SOURCE_COPY: u64 = 2;
const TARGET_COPY: u64 = 3;

/// Largest target a patch may declare (DOS protection)
pub const MAX_TARGET_SIZE: u64 = 1 << 30;

/// Apply a BPS patch to `source`
///
/// # Errors
///
/// Returns `PatchError::BadMagic` for non-BPS input, `PatchError::PatchChecksum`
/// if the patch is corrupt, `PatchError::SourceSize`/`SourceChecksum` if it was
/// made for a different source, and `PatchError::Malformed` for actions that
/// reach outside the source or target.
pub fn apply(patch: &[u8], source: &[u8]) -> Result<Vec<u8>, PatchError> {
    if !patch.starts_with(MAGIC) {
        return Err(PatchError::BadMagic {
            format: SupportedFormat::Bps,
        });
    }
    if patch.len() < MAGIC.len() + FOOTER_LEN {
        return Err(PatchError::Truncated {
            offset: patch.len(),
        });
    }

    let footer_start = patch.len() - FOOTER_LEN;
    let expected_source = read_crc(patch, footer_start);
    let expected_target = read_crc(patch, footer_start + 4);
    let expected_patch = read_crc(patch, footer_start + 8);

    let actual_patch = Crc32(crc32fast::hash(&patch[..patch.len() - 4]));
    if actual_patch != expected_patch {
        return Err(PatchError::PatchChecksum {
            expected: expected_patch,
            actual: actual_patch,
        });
    }

    let mut reader = Reader::new(&patch[..footer_start], MAGIC.len());
    let source_size = reader.read_varint()?;
    let target_size = reader.read_varint()?;
    let metadata_size = reader.read_varint()?;
    reader.skip(to_usize(metadata_size)?)?;

    if source.len() as u64 != source_size {
        return Err(PatchError::SourceSize {
            expected: source_size,
            actual: source.len() as u64,
        });
    }

    let actual_source = Crc32(crc32fast::hash(source));
    if actual_source != expected_source {
        return Err(PatchError::SourceChecksum {
            expected: expected_source,
            actual: actual_source,
        });
    }

    if target_size > MAX_TARGET_SIZE {
        return Err(PatchError::Malformed(format!(
            "target size {target_size} exceeds the {MAX_TARGET_SIZE} byte limit"
        )));
    }
    let target_size = to_usize(target_size)?;
    // The declared size is only a hint until the actions have produced it
    let mut target: Vec<u8> = Vec::with_capacity(target_size.min(source.len() + patch.len()));
    let mut source_relative: usize = 0;
    let mut target_relative: usize = 0;

    while reader.remaining() > 0 {
        let data = reader.read_varint()?;
        let length = to_usize((data >> 2) + 1)?;

        if target.len() + length > target_size {
            return Err(PatchError::Malformed(format!(
                "action writes past target size {target_size}"
            )));
        }

        match data & 3 {
            SOURCE_READ => {
                let start = target.len();
                let bytes = span(source, start, length).ok_or_else(|| {
                    PatchError::Malformed(format!("source read at {start} past end of source"))
                })?;
                target.extend_from_slice(bytes);
            }
            TARGET_READ => {
                let bytes = reader.read_bytes(length)?;
                target.extend_from_slice(bytes);
            }
            SOURCE_COPY => {
                source_relative = reader.read_relative(source_relative)?;
                let bytes = span(source, source_relative, length).ok_or_else(|| {
                    PatchError::Malformed(format!(
                        "source copy at {source_relative} past end of source"
                    ))
                })?;
                target.extend_from_slice(bytes);
                source_relative += length;
            }
            TARGET_COPY => {
                target_relative = reader.read_relative(target_relative)?;
                // Byte at a time: the copy may overlap the bytes it produces
                for _ in 0..length {
                    let byte = *target.get(target_relative).ok_or_else(|| {
                        PatchError::Malformed(format!(
                            "target copy at {target_relative} reads unwritten output"
                        ))
                    })?;
                    target.push(byte);
                    target_relative += 1;
                }
            }
            _ => unreachable!("action is two bits"),
        }
    }

    if target.len() != target_size {
        return Err(PatchError::Malformed(format!(
            "patch produced {} bytes, expected {target_size}",
            target.len()
        )));
    }

    let actual_target = Crc32(crc32fast::hash(&target));
    if actual_target != expected_target {
        return Err(PatchError::TargetChecksum {
            expected: expected_target,
            actual: actual_target,
        });
    }

    Ok(target)
}

fn span(data: &[u8], start: usize, len: usize) -> Option<&[u8]> {
    data.get(start..start.checked_add(len)?)
}

fn read_crc(patch: &[u8], offset: usize) -> Crc32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&patch[offset..offset + 4]);
    Crc32(u32::from_le_bytes(bytes))
}

fn to_usize(value: u64) -> Result<usize, PatchError> {
    usize::try_from(value)
        .map_err(|_| PatchError::Malformed(format!("size {value} does not fit in memory")))
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PatchError> {
        let bytes =
            span(self.data, self.pos, len).ok_or(PatchError::Truncated { offset: self.pos })?;
        self.pos += len;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize) -> Result<(), PatchError> {
        self.read_bytes(len).map(|_| ())
    }

    fn read_varint(&mut self) -> Result<u64, PatchError> {
        let overflow = || PatchError::Malformed("varint overflows 64 bits".to_string());
        let mut data: u64 = 0;
        let mut shift: u64 = 1;
        loop {
            let byte = self.read_bytes(1)?[0];
            data = u64::from(byte & 0x7f)
                .checked_mul(shift)
                .and_then(|v| data.checked_add(v))
                .ok_or_else(overflow)?;
            if byte & 0x80 != 0 {
                return Ok(data);
            }
            shift = shift.checked_shl(7).filter(|s| *s != 0).ok_or_else(overflow)?;
            data = data.checked_add(shift).ok_or_else(overflow)?;
        }
    }

    /// Read a signed relative offset and apply it to `base`
    fn read_relative(&mut self, base: usize) -> Result<usize, PatchError> {
        let encoded = self.read_varint()?;
        let magnitude = to_usize(encoded >> 1)?;
        let moved = if encoded & 1 == 1 {
            base.checked_sub(magnitude)
        } else {
            base.checked_add(magnitude)
        };
        moved.ok_or_else(|| PatchError::Malformed("relative offset out of range".to_string()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal BPS writer for building fixtures.

    pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
        loop {
            let x = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                out.push(0x80 | x);
                break;
            }
            out.push(x);
            value -= 1;
        }
    }

    pub fn finish(mut body: Vec<u8>, source: &[u8], target: &[u8]) -> Vec<u8> {
        body.extend_from_slice(&crc32fast::hash(source).to_le_bytes());
        body.extend_from_slice(&crc32fast::hash(target).to_le_bytes());
        let patch_crc = crc32fast::hash(&body);
        body.extend_from_slice(&patch_crc.to_le_bytes());
        body
    }

    /// A patch that rewrites `source` into `target` with a single TargetRead
    pub fn target_read_patch(source: &[u8], target: &[u8]) -> Vec<u8> {
        let mut body = b"BPS1".to_vec();
        encode_varint(source.len() as u64, &mut body);
        encode_varint(target.len() as u64, &mut body);
        encode_varint(0, &mut body);
        if !target.is_empty() {
            encode_varint((((target.len() - 1) as u64) << 2) | 1, &mut body);
            body.extend_from_slice(target);
        }
        finish(body, source, target)
    }
}
