//! Sound extraction for ARENA2 game files.
//!
//! `DAGGER.SND` is a number-indexed BSA archive of headerless 8-bit mono PCM
//! samples. [`SoundArchive`] fetches them by index and pairs each with a
//! synthesized WAV header.
//!
//! # Example
//!
//! ```no_run
//! use arena2_common::{SourceOptions, Usage};
//! use arena2_sound::SoundArchive;
//!
//! let mut sounds = SoundArchive::open("DAGGER.SND", SourceOptions::read_only(Usage::Disk))?;
//! let sound = sounds.get_sound(12);
//! if !sound.is_empty() {
//!     std::fs::write("12.wav", sound.to_wav_bytes())?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod archive;
mod error;
mod wav;

pub use archive::{DecodedSound, SoundArchive};
pub use error::{Error, Result};
pub use wav::{wav_header, WavHeader, SAMPLE_RATE, WAV_HEADER_SIZE};
