//! IPS patch application.
//!
//! Layout: `PATCH`, then records of `offset:u24be size:u16be data[size]`.
//! A zero size marks an RLE record `count:u16be value:u8`. The record list
//! ends with `EOF`, optionally followed by a `u24be` length the output is
//! truncated to.

use crate::core::types::SupportedFormat;
use crate::patching::PatchError;

const MAGIC: &[u8] = b"PATCH";
const EOF_MARKER: usize = 0x45_4F46;

/// Apply an IPS patch to `source`
///
/// # Errors
///
/// Returns `PatchError::BadMagic` if the header is missing and
/// `PatchError::Truncated` if a record or the `EOF` marker is cut short.
pub fn apply(patch: &[u8], source: &[u8]) -> Result<Vec<u8>, PatchError> {
    if !patch.starts_with(MAGIC) {
        return Err(PatchError::BadMagic {
            format: SupportedFormat::Ips,
        });
    }

    let mut reader = Cursor::new(patch, MAGIC.len());
    let mut output = source.to_vec();

    loop {
        let offset = reader.read_u24()?;
        if offset == EOF_MARKER {
            break;
        }

        let size = reader.read_u16()?;
        if size == 0 {
            let count = reader.read_u16()?;
            let value = reader.read_u8()?;
            write_at(&mut output, offset, &vec![value; count]);
        } else {
            let data = reader.read_bytes(size)?;
            write_at(&mut output, offset, data);
        }
    }

    // Truncation extension
    if reader.remaining() >= 3 {
        let length = reader.read_u24()?;
        output.truncate(length);
    }

    Ok(output)
}

fn write_at(output: &mut Vec<u8>, offset: usize, data: &[u8]) {
    let end = offset + data.len();
    if output.len() < end {
        output.resize(end, 0);
    }
    output[offset..end].copy_from_slice(data);
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PatchError> {
        let end = self.pos + len;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(PatchError::Truncated { offset: self.pos })?;
        self.pos = end;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, PatchError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<usize, PatchError> {
        let b = self.read_bytes(2)?;
        Ok(usize::from(b[0]) << 8 | usize::from(b[1]))
    }

    fn read_u24(&mut self) -> Result<usize, PatchError> {
        let b = self.read_bytes(3)?;
        Ok(usize::from(b[0]) << 16 | usize::from(b[1]) << 8 | usize::from(b[2]))
    }
}
