//! Scanline run-length encoding.
//!
//! Encoded layout (little-endian):
//!
//! ```text
//! 0     500 × u32   file offset of each row's first run
//! 2000  runs        u16 repeat count, u8 value (3 bytes each)
//! ```
//!
//! Runs never cross a row boundary, so every row can be decoded on its own.

use arena2_common::BinaryReader;
use byteorder::{LittleEndian, WriteBytesExt};

use crate::raster::{PakRaster, PAK_HEIGHT, PAK_WIDTH};
use crate::{Error, Result};

/// Size of the row offset header; also the offset of the first run.
pub const HEADER_SIZE: usize = PAK_HEIGHT * 4;

/// Encoded size of one run.
pub const RUN_SIZE: usize = 3;

/// A run of identical pixels within one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PakRun {
    /// Number of pixels.
    pub count: u16,
    /// Palette index.
    pub value: u8,
}

/// Split one row into runs. The value resets at the start of the row and the
/// final run is always emitted.
pub fn row_runs(row: &[u8]) -> Vec<PakRun> {
    let mut runs = Vec::new();
    let Some((&first, rest)) = row.split_first() else {
        return runs;
    };

    let mut current = PakRun {
        count: 1,
        value: first,
    };
    for &pixel in rest {
        if pixel == current.value && current.count < u16::MAX {
            current.count += 1;
        } else {
            runs.push(current);
            current = PakRun {
                count: 1,
                value: pixel,
            };
        }
    }
    runs.push(current);
    runs
}

/// Run list of row `y` of a raster.
pub fn runs(raster: &PakRaster, y: usize) -> Vec<PakRun> {
    row_runs(raster.row(y))
}

/// Encode a raster.
pub fn encode(raster: &PakRaster) -> Vec<u8> {
    let mut offsets = Vec::with_capacity(PAK_HEIGHT);
    let mut body = Vec::new();
    let mut offset = HEADER_SIZE as u32;

    for y in 0..PAK_HEIGHT {
        offsets.push(offset);
        for run in runs(raster, y) {
            body.push_run(run);
            offset += RUN_SIZE as u32;
        }
    }

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    for offset in offsets {
        out.push_u32(offset);
    }
    out.extend_from_slice(&body);
    out
}

/// Decode a raster.
pub fn decode(data: &[u8]) -> Result<PakRaster> {
    let mut header = BinaryReader::new(data);
    let mut offsets = Vec::with_capacity(PAK_HEIGHT);
    for _ in 0..PAK_HEIGHT {
        offsets.push(header.read_u32()?);
    }

    let mut pixels = Vec::with_capacity(PakRaster::LEN);
    for (row, &offset) in offsets.iter().enumerate() {
        if offset as usize >= data.len() {
            return Err(Error::InvalidRowOffset {
                row,
                offset,
                len: data.len(),
            });
        }

        let mut reader = BinaryReader::new_at(data, offset as usize);
        let mut column = 0usize;
        while column < PAK_WIDTH {
            let count = reader.read_u16()?;
            let value = reader.read_u8()?;

            if count == 0 || column + count as usize > PAK_WIDTH {
                return Err(Error::InvalidRun { row, column, count });
            }

            pixels.resize(pixels.len() + count as usize, value);
            column += count as usize;
        }
    }

    PakRaster::new(pixels)
}

trait PushLe {
    fn push_u32(&mut self, value: u32);
    fn push_run(&mut self, run: PakRun);
}

impl PushLe for Vec<u8> {
    fn push_u32(&mut self, value: u32) {
        // Writing into a Vec cannot fail.
        let _ = self.write_u32::<LittleEndian>(value);
    }

    fn push_run(&mut self, run: PakRun) {
        let _ = self.write_u16::<LittleEndian>(run.count);
        self.push(run.value);
    }
}
