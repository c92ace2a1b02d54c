//! PAK raster codec for ARENA2 world maps.
//!
//! PAK files hold a single 1001×500 indexed-colour raster (climate and
//! political maps). Each row is run-length encoded independently and a header
//! of 500 row offsets allows random access to any row.
//!
//! # Example
//!
//! ```
//! use arena2_pak::{decode, encode, PakRaster};
//!
//! let mut raster = PakRaster::blank();
//! raster.set(10, 20, 5);
//!
//! let encoded = encode(&raster);
//! assert_eq!(decode(&encoded)?, raster);
//! # Ok::<(), arena2_pak::Error>(())
//! ```

mod codec;
mod error;
mod raster;

pub use codec::{decode, encode, row_runs, runs, PakRun, HEADER_SIZE, RUN_SIZE};
pub use error::{Error, Result};
pub use raster::{PakRaster, PAK_HEIGHT, PAK_WIDTH};
