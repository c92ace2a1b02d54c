//! Dungeon block layout decoding for ARENA2 location records.
//!
//! A dungeon is a set of blocks placed on a signed grid. Each block is a
//! 4-byte entry: grid x, grid z and a packed word holding the block number,
//! the starting block flag and the block file index. [`decode_dungeon_layout`]
//! turns a block section into a dense [`DungeonGrid`].
//!
//! # Example
//!
//! ```
//! use arena2_dungeon::{decode_dungeon_layout, encode_section, DungeonBlockDescriptor};
//!
//! let word = DungeonBlockDescriptor::encode_fields(4, true, 0);
//! let grid = decode_dungeon_layout(&encode_section(&[(0, 0, word)]), None)?;
//! let start = grid.starting_block().unwrap();
//! assert_eq!(start.block_name().as_deref(), Some("N0000004.RDB"));
//! # Ok::<(), arena2_dungeon::Error>(())
//! ```

mod block;
mod error;
mod layout;

pub use block::{
    DungeonBlockDescriptor, BLOCK_INDEX_SHIFT, BLOCK_LETTERS, BLOCK_NUMBER_MASK,
    STARTING_BLOCK_MASK,
};
pub use error::{Error, Result};
pub use layout::{
    build_grid, decode_descriptors, decode_dungeon_layout, encode_section, DungeonBlockEntry,
    DungeonGrid, DungeonSectionHeader,
};
