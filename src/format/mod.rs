//! Container format detection.
//!
//! Classifies a file's format family by inspecting its leading bytes, without
//! opening it through a container provider. Callers treat [`FormatFamily::Unknown`]
//! as "try the next detector"; detection never raises an error.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// 4-byte magic at offset 0 of an HDF4 file.
pub const HDF4_MAGIC: [u8; 4] = [14, 3, 19, 1];

/// 8-byte superblock signature of an HDF5 file.
pub const HDF5_MAGIC: [u8; 8] = [137, 72, 68, 70, 13, 10, 26, 10];

/// Format family of a container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    /// HDF4 family.
    Hdf4,
    /// HDF5 family.
    Hdf5,
    /// Signature matched no supported family.
    Unknown,
}

impl FormatFamily {
    /// Whether objects in this family can be renamed in place.
    ///
    /// HDF4 container structure is read-only for renames.
    pub fn supports_rename(self) -> bool {
        !matches!(self, FormatFamily::Hdf4)
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            FormatFamily::Hdf4 => "hdf4",
            FormatFamily::Hdf5 => "hdf5",
            FormatFamily::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FormatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Magic-byte classifier for container files.
#[derive(Debug)]
pub struct SignatureDetector;

impl SignatureDetector {
    /// Classify the file at `path`.
    ///
    /// HDF4 is recognized by its 4-byte magic at offset 0. The HDF5 signature
    /// is searched at offset 0, offset 512, and at each doubling of the
    /// previous offset until end-of-file; the superblock may sit behind
    /// prepended user data. Any read failure yields `Unknown`.
    pub fn classify(path: &Path) -> FormatFamily {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!("classify: cannot open {}: {}", path.display(), e);
                return FormatFamily::Unknown;
            }
        };

        let len = match file.metadata() {
            Ok(m) => m.len(),
            Err(_) => return FormatFamily::Unknown,
        };

        let mut header = [0u8; 4];
        if read_at(&mut file, 0, &mut header) && header == HDF4_MAGIC {
            return FormatFamily::Hdf4;
        }

        let mut signature = [0u8; 8];
        let mut offset = 0u64;
        while offset < len {
            if read_at(&mut file, offset, &mut signature) && signature == HDF5_MAGIC {
                return FormatFamily::Hdf5;
            }
            offset = if offset == 0 { 512 } else { offset * 2 };
        }

        FormatFamily::Unknown
    }

    /// Classify an in-memory buffer with the same algorithm as [`classify`].
    ///
    /// [`classify`]: SignatureDetector::classify
    pub fn classify_bytes(buf: &[u8]) -> FormatFamily {
        if buf.len() >= 4 && buf[..4] == HDF4_MAGIC {
            return FormatFamily::Hdf4;
        }

        let len = buf.len() as u64;
        let mut offset = 0u64;
        while offset < len {
            let at = offset as usize;
            if buf.len() - at >= 8 && buf[at..at + 8] == HDF5_MAGIC {
                return FormatFamily::Hdf5;
            }
            offset = if offset == 0 { 512 } else { offset * 2 };
        }

        FormatFamily::Unknown
    }
}

fn read_at(file: &mut File, offset: u64, buf: &mut [u8]) -> bool {
    if file.seek(SeekFrom::Start(offset)).is_err() {
        return false;
    }
    file.read_exact(buf).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn hdf4_magic_at_offset_zero() {
        let mut buf = vec![14u8, 3, 19, 1];
        buf.extend_from_slice(&[0; 8]);
        assert_eq!(SignatureDetector::classify_bytes(&buf), FormatFamily::Hdf4);
    }

    #[test]
    fn hdf5_magic_at_offset_zero() {
        let mut buf = HDF5_MAGIC.to_vec();
        buf.extend_from_slice(&[0; 16]);
        assert_eq!(SignatureDetector::classify_bytes(&buf), FormatFamily::Hdf5);
    }

    #[test]
    fn hdf5_magic_behind_user_block() {
        // 512 bytes of user data, then the superblock signature.
        let mut buf = vec![0u8; 600];
        buf[512..520].copy_from_slice(&HDF5_MAGIC);
        assert_eq!(SignatureDetector::classify_bytes(&buf), FormatFamily::Hdf5);
    }

    #[test]
    fn hdf5_magic_at_doubled_offset() {
        let mut buf = vec![0u8; 2100];
        buf[2048..2056].copy_from_slice(&HDF5_MAGIC);
        assert_eq!(SignatureDetector::classify_bytes(&buf), FormatFamily::Hdf5);
    }

    #[test]
    fn hdf5_magic_off_grid_is_missed() {
        // The search only probes 0, 512, 1024, ...; a signature at any other
        // offset is not a valid superblock location.
        let mut buf = vec![0u8; 600];
        buf[300..308].copy_from_slice(&HDF5_MAGIC);
        assert_eq!(
            SignatureDetector::classify_bytes(&buf),
            FormatFamily::Unknown
        );
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(
            SignatureDetector::classify_bytes(&[1, 2, 3, 4, 5, 6, 7, 8, 9]),
            FormatFamily::Unknown
        );
        assert_eq!(SignatureDetector::classify_bytes(&[]), FormatFamily::Unknown);
    }

    #[test]
    fn classify_reads_files() {
        let dir = tempfile::tempdir().unwrap();

        let h4 = dir.path().join("a.hdf");
        std::fs::File::create(&h4)
            .unwrap()
            .write_all(&[14, 3, 19, 1, 0, 0, 0, 0, 0, 0, 0, 0])
            .unwrap();
        assert_eq!(SignatureDetector::classify(&h4), FormatFamily::Hdf4);

        let h5 = dir.path().join("b.h5");
        let mut padded = vec![0u8; 600];
        padded[512..520].copy_from_slice(&HDF5_MAGIC);
        std::fs::File::create(&h5).unwrap().write_all(&padded).unwrap();
        assert_eq!(SignatureDetector::classify(&h5), FormatFamily::Hdf5);
    }

    #[test]
    fn missing_file_is_unknown() {
        let p = Path::new("/definitely/not/here.h5");
        assert_eq!(SignatureDetector::classify(p), FormatFamily::Unknown);
    }

    #[test]
    fn rename_support_follows_family() {
        assert!(!FormatFamily::Hdf4.supports_rename());
        assert!(FormatFamily::Hdf5.supports_rename());
        assert!(FormatFamily::Unknown.supports_rename());
    }
}
