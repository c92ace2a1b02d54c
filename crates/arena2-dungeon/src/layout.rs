//! Dungeon block lists and the grids they describe.
//!
//! Section layout (little-endian):
//!
//! ```text
//! 0   u16     null
//! 2   u32     unknown
//! 6   u32     unknown
//! 10  u16     block count
//! 12  [u8; 5] unknown
//! 17  block count × (i8 x, i8 z, u16 descriptor)
//! ```

use arena2_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::block::DungeonBlockDescriptor;
use crate::{Error, Result};

/// Fixed header of a dungeon block section.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DungeonSectionHeader {
    pub null: u16,
    pub unknown1: u32,
    pub unknown2: u32,
    pub block_count: u16,
    pub unknown3: [u8; 5],
}

impl DungeonSectionHeader {
    pub const SIZE: usize = 17;
}

/// One entry of the block list.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DungeonBlockEntry {
    pub x: i8,
    pub z: i8,
    pub packed: u16,
}

impl DungeonBlockEntry {
    pub const SIZE: usize = 4;
}

/// Dungeon blocks placed on a dense grid.
///
/// Grid coordinates are block coordinates shifted so the minimum x and z land
/// at `(0, 0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DungeonGrid {
    width: usize,
    height: usize,
    origin: (i32, i32),
    cells: Vec<Option<DungeonBlockDescriptor>>,
    /// Descriptors that landed on an already occupied cell.
    pub skipped: Vec<DungeonBlockDescriptor>,
}

impl DungeonGrid {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Block coordinates of grid cell `(0, 0)`.
    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// Block at grid cell `(gx, gz)`.
    pub fn get(&self, gx: usize, gz: usize) -> Option<&DungeonBlockDescriptor> {
        if gx >= self.width || gz >= self.height {
            return None;
        }
        self.cells[gz * self.width + gx].as_ref()
    }

    /// Occupied cells as `(gx, gz, block)`, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &DungeonBlockDescriptor)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.as_ref().map(|block| (i % self.width, i / self.width, block))
        })
    }

    /// Number of placed blocks.
    pub fn block_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// The first placed block flagged as the starting block.
    pub fn starting_block(&self) -> Option<&DungeonBlockDescriptor> {
        self.cells.iter().flatten().find(|block| block.is_starting_block)
    }

    /// Occupancy bitmap, one row per grid z.
    pub fn occupancy(&self) -> Vec<Vec<bool>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(Option::is_some).collect())
            .collect()
    }
}

/// Read every descriptor of a section without placing them.
///
/// `start_override` marks the descriptor at that position as the starting
/// block.
pub fn decode_descriptors(
    section: &[u8],
    start_override: Option<usize>,
) -> Result<Vec<DungeonBlockDescriptor>> {
    let mut reader = BinaryReader::new(section);
    let header: DungeonSectionHeader = reader.read_struct()?;
    let count = header.block_count as usize;

    let expected = DungeonSectionHeader::SIZE + count * DungeonBlockEntry::SIZE;
    if section.len() < expected {
        return Err(Error::TruncatedSection {
            expected,
            actual: section.len(),
        });
    }
    if let Some(index) = start_override {
        if index >= count {
            return Err(Error::InvalidStartOverride { index, count });
        }
    }

    let mut blocks = Vec::with_capacity(count);
    for i in 0..count {
        let entry: DungeonBlockEntry = reader.read_struct()?;
        blocks.push(DungeonBlockDescriptor::decode(
            entry.x,
            entry.z,
            entry.packed,
            start_override == Some(i),
        ));
    }
    Ok(blocks)
}

/// Place decoded descriptors on a grid.
pub fn build_grid(blocks: &[DungeonBlockDescriptor]) -> DungeonGrid {
    let Some(first) = blocks.first() else {
        return DungeonGrid::default();
    };

    let (mut min_x, mut max_x) = (first.x as i32, first.x as i32);
    let (mut min_z, mut max_z) = (first.z as i32, first.z as i32);
    for block in blocks {
        min_x = min_x.min(block.x as i32);
        max_x = max_x.max(block.x as i32);
        min_z = min_z.min(block.z as i32);
        max_z = max_z.max(block.z as i32);
    }

    let width = (max_x - min_x + 1) as usize;
    let height = (max_z - min_z + 1) as usize;
    let mut grid = DungeonGrid {
        width,
        height,
        origin: (min_x, min_z),
        cells: vec![None; width * height],
        skipped: Vec::new(),
    };

    for block in blocks {
        let gx = (block.x as i32 - min_x) as usize;
        let gz = (block.z as i32 - min_z) as usize;
        let cell = &mut grid.cells[gz * width + gx];
        if cell.is_some() {
            tracing::warn!(
                x = block.x,
                z = block.z,
                number = block.block_number,
                "skipping block on occupied cell"
            );
            grid.skipped.push(*block);
        } else {
            *cell = Some(*block);
        }
    }
    grid
}

/// Decode a dungeon block section into a grid.
pub fn decode_dungeon_layout(
    section: &[u8],
    start_override: Option<usize>,
) -> Result<DungeonGrid> {
    let blocks = decode_descriptors(section, start_override)?;
    let grid = build_grid(&blocks);
    tracing::debug!(
        blocks = blocks.len(),
        width = grid.width(),
        height = grid.height(),
        skipped = grid.skipped.len(),
        "decoded dungeon layout"
    );
    Ok(grid)
}

/// Serialize a block list as a dungeon section.
pub fn encode_section(blocks: &[(i8, i8, u16)]) -> Vec<u8> {
    let header = DungeonSectionHeader {
        null: 0,
        unknown1: 0,
        unknown2: 0,
        block_count: blocks.len() as u16,
        unknown3: [0; 5],
    };
    let mut out = header.as_bytes().to_vec();
    for &(x, z, packed) in blocks {
        out.extend_from_slice(DungeonBlockEntry { x, z, packed }.as_bytes());
    }
    out
}
