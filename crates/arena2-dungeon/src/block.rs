//! Packed dungeon block descriptors.
//!
//! Each block of a dungeon is described by a signed grid position and a
//! 16-bit word:
//!
//! ```text
//! bits  0..=9   block number
//! bit   10      starting block flag
//! bits 11..=15  block index (file letter)
//! ```

/// Mask of the block number field.
pub const BLOCK_NUMBER_MASK: u16 = 0x03FF;

/// Mask of the starting block flag.
pub const STARTING_BLOCK_MASK: u16 = 0x0400;

/// Shift of the block index field.
pub const BLOCK_INDEX_SHIFT: u16 = 11;

/// Block file prefixes by block index.
pub const BLOCK_LETTERS: [char; 6] = ['N', 'W', 'L', 'S', 'B', 'M'];

/// A decoded dungeon block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DungeonBlockDescriptor {
    pub x: i8,
    pub z: i8,
    /// Raw descriptor word.
    pub packed: u16,
    pub block_number: u16,
    pub is_starting_block: bool,
    pub block_index: u8,
}

impl DungeonBlockDescriptor {
    /// Decode a descriptor word.
    ///
    /// `record_flag` marks the block as the starting block regardless of the
    /// packed bit.
    pub const fn decode(x: i8, z: i8, packed: u16, record_flag: bool) -> Self {
        Self {
            x,
            z,
            packed,
            block_number: packed & BLOCK_NUMBER_MASK,
            is_starting_block: (packed & STARTING_BLOCK_MASK) != 0 || record_flag,
            block_index: (packed >> BLOCK_INDEX_SHIFT) as u8,
        }
    }

    /// Pack descriptor fields into a word. Out-of-range values are masked.
    pub const fn encode_fields(block_number: u16, is_starting_block: bool, block_index: u8) -> u16 {
        let start = if is_starting_block { STARTING_BLOCK_MASK } else { 0 };
        (block_number & BLOCK_NUMBER_MASK) | start | ((block_index as u16) << BLOCK_INDEX_SHIFT)
    }

    /// File letter of this block, if the index has one.
    pub fn block_letter(&self) -> Option<char> {
        BLOCK_LETTERS.get(self.block_index as usize).copied()
    }

    /// Name of the block file, e.g. `N0000004.RDB`.
    pub fn block_name(&self) -> Option<String> {
        self.block_letter()
            .map(|letter| format!("{letter}{:07}.RDB", self.block_number))
    }
}
