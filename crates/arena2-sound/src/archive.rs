//! Index-addressed sound access over `DAGGER.SND`.

use std::path::Path;
use std::sync::Arc;

use arena2_bsa::BsaArchive;
use arena2_common::SourceOptions;
use rustc_hash::FxHashMap;

use crate::wav::{wav_header, WAV_HEADER_SIZE};
use crate::{Error, Result};

/// A sound ready for playback or export.
///
/// The WAV header is not stored; [`header`](Self::header) builds it from the
/// payload length on each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSound {
    pub name: String,
    pub payload: Arc<[u8]>,
}

impl DecodedSound {
    /// The sound returned when a record cannot be read.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            payload: Arc::from(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The 44-byte WAV header for this payload.
    pub fn header(&self) -> [u8; WAV_HEADER_SIZE] {
        // Payload length was checked against u32 when the sound was loaded.
        wav_header(self.payload.len() as u32)
    }

    /// Header followed by the samples.
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WAV_HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&self.header());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Sound records of a number-indexed archive.
///
/// With auto-discard on (the default) only the most recently fetched sound
/// stays resident.
pub struct SoundArchive {
    archive: BsaArchive,
    auto_discard: bool,
    resident: FxHashMap<usize, DecodedSound>,
    last: Option<usize>,
    decode_count: usize,
}

impl SoundArchive {
    /// Open a sound archive from disk.
    pub fn open<P: AsRef<Path>>(path: P, options: SourceOptions) -> Result<Self> {
        Ok(Self::new(BsaArchive::load(path, options)?))
    }

    pub fn new(archive: BsaArchive) -> Self {
        Self {
            archive,
            auto_discard: true,
            resident: FxHashMap::default(),
            last: None,
            decode_count: 0,
        }
    }

    pub fn archive(&self) -> &BsaArchive {
        &self.archive
    }

    #[inline]
    pub fn auto_discard(&self) -> bool {
        self.auto_discard
    }

    pub fn set_auto_discard(&mut self, auto_discard: bool) {
        self.auto_discard = auto_discard;
    }

    /// Number of sound records.
    pub fn count(&self) -> usize {
        self.archive.count()
    }

    /// Record name of a sound.
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.archive.name_of(index).ok()
    }

    /// Number of records decoded so far. Cache hits do not count.
    pub fn decode_count(&self) -> usize {
        self.decode_count
    }

    pub fn is_resident(&self, index: usize) -> bool {
        self.resident.contains_key(&index)
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    /// Fetch a sound.
    ///
    /// Failures are logged and yield [`DecodedSound::empty`].
    pub fn get_sound(&mut self, index: usize) -> DecodedSound {
        if self.auto_discard {
            if let Some(previous) = self.last.filter(|&previous| previous != index) {
                self.discard(previous);
            }
        }
        self.last = Some(index);

        if let Some(sound) = self.resident.get(&index) {
            return sound.clone();
        }

        match self.load(index) {
            Ok(sound) => {
                self.resident.insert(index, sound.clone());
                sound
            }
            Err(err) => {
                self.discard(index);
                tracing::warn!(index, error = %err, "failed to read sound");
                DecodedSound::empty()
            }
        }
    }

    fn load(&mut self, index: usize) -> Result<DecodedSound> {
        let name = self.archive.name_of(index)?.to_string();
        let payload = self.archive.record_bytes(index)?;
        let len = payload.len();
        if u32::try_from(len).is_err() {
            return Err(Error::PayloadTooLarge(len));
        }

        self.decode_count += 1;
        tracing::debug!(index, bytes = len, "decoded sound");

        Ok(DecodedSound {
            name,
            payload: Arc::from(payload),
        })
    }

    /// Release a resident sound.
    pub fn discard(&mut self, index: usize) {
        if self.resident.remove(&index).is_some() {
            tracing::trace!(index, "discarded sound");
        }
        if self.last == Some(index) {
            self.last = None;
        }
    }

    /// Release every resident sound.
    pub fn discard_all(&mut self) {
        let indices: Vec<usize> = self.resident.keys().copied().collect();
        for index in indices {
            self.discard(index);
        }
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use arena2_bsa::{BsaBuilder, DirectoryType};
    use arena2_common::Usage;

    use super::*;

    fn sample_bytes() -> Vec<u8> {
        let mut builder = BsaBuilder::new(DirectoryType::Number);
        builder.add_numbered(0, vec![0x80; 100]).unwrap();
        builder.add_numbered(1, vec![0x7F; 50]).unwrap();
        builder.add_numbered(2, (0..=255).collect()).unwrap();
        builder.build()
    }

    fn sounds() -> SoundArchive {
        SoundArchive::new(BsaArchive::from_bytes(sample_bytes(), "DAGGER.SND").unwrap())
    }

    #[test]
    fn test_get_sound() {
        let mut sounds = sounds();
        assert_eq!(sounds.count(), 3);
        assert_eq!(sounds.name_of(1), Some("1"));

        let sound = sounds.get_sound(1);
        assert_eq!(sound.name, "1");
        assert_eq!(sound.payload.len(), 50);
        let header = sound.header();
        assert_eq!(u32::from_le_bytes(header[40..44].try_into().unwrap()), 50);
        assert_eq!(u32::from_le_bytes(header[4..8].try_into().unwrap()), 86);

        let wav = sound.to_wav_bytes();
        assert_eq!(wav.len(), 94);
        assert_eq!(&wav[44..], &[0x7F; 50][..]);
    }

    #[test]
    fn test_auto_discard_keeps_one() {
        let mut sounds = sounds();
        assert!(sounds.auto_discard());

        sounds.get_sound(0);
        sounds.get_sound(0);
        assert_eq!(sounds.decode_count(), 1);
        assert!(sounds.is_resident(0));

        sounds.get_sound(1);
        assert!(!sounds.is_resident(0));
        assert!(sounds.is_resident(1));
        assert_eq!(sounds.resident_count(), 1);

        sounds.get_sound(0);
        assert_eq!(sounds.decode_count(), 3);
    }

    #[test]
    fn test_without_auto_discard_all_stay() {
        let mut sounds = sounds();
        sounds.set_auto_discard(false);

        for index in [0, 1, 2, 0, 1, 2] {
            sounds.get_sound(index);
        }
        assert_eq!(sounds.decode_count(), 3);
        assert_eq!(sounds.resident_count(), 3);

        sounds.discard(1);
        assert!(!sounds.is_resident(1));
        sounds.get_sound(1);
        assert_eq!(sounds.decode_count(), 4);

        sounds.discard_all();
        assert_eq!(sounds.resident_count(), 0);
    }

    #[test]
    fn test_resident_sound_shares_payload() {
        let mut sounds = sounds();
        sounds.set_auto_discard(false);

        let first = sounds.get_sound(2);
        let second = sounds.get_sound(2);
        assert!(Arc::ptr_eq(&first.payload, &second.payload));
        assert_eq!(sounds.decode_count(), 1);

        sounds.discard(2);
        // The caller's handle outlives the discard.
        assert_eq!(first.payload.len(), 256);
        assert!(!sounds.is_resident(2));
    }

    #[test]
    fn test_empty_sound_header() {
        let header = DecodedSound::empty().header();
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(header[40..44].try_into().unwrap()), 0);
    }

    #[test]
    fn test_unknown_index_is_empty() {
        let mut sounds = sounds();
        sounds.get_sound(0);

        let sound = sounds.get_sound(99);
        assert!(sound.is_empty());
        assert_eq!(sound, DecodedSound::empty());
        assert!(!sounds.is_resident(99));
        // The previous sound was still evicted.
        assert!(!sounds.is_resident(0));
    }

    #[test]
    fn test_open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DAGGER.SND");
        std::fs::write(&path, sample_bytes()).unwrap();

        let options = SourceOptions::read_only(Usage::Disk);
        let mut sounds = SoundArchive::open(&path, options).unwrap();
        let sound = sounds.get_sound(2);
        assert_eq!(sound.payload.len(), 256);
        assert_eq!(sound.payload[255], 255);
    }
}
