//! Versioned binary snapshot of a project's file table.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic      [u8; 4]  = b"SMDL"
//! version    u32
//! flags      u32      (reserved, written as 0)
//! file_count u32
//! per file:
//!   path         u32 length (bytes incl. NUL), bytes, NUL
//!   language     u32
//!   metric_count u32
//!   per metric:
//!     name       u32 length (bytes incl. NUL), bytes, NUL
//!     value      f64
//! ```
//!
//! The reader is defensive: adversarial counts, truncation, missing
//! terminators, unknown languages, and non-finite values are all distinct
//! [`SnapshotError`]s, never panics. Callers validate the rebuilt project
//! after a successful read.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::project::Project;
use crate::storage::error::{SnapshotError, SnapshotResult};
use crate::types::Language;

pub const MAGIC: [u8; 4] = *b"SMDL";
pub const VERSION: u32 = 1;

/// Upper bounds applied while reading, guarding against
/// adversarial-size denial.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SnapshotLimits {
    pub max_files: u32,
    pub max_metrics_per_file: u32,
    pub max_string_len: u32,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            max_files: 1_000_000,
            max_metrics_per_file: 1_024,
            max_string_len: 64 * 1024,
        }
    }
}

/// Write the file table of `project` in snapshot layout.
pub fn write_snapshot<W: Write>(project: &Project, writer: &mut W) -> SnapshotResult<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?; // flags, reserved

    let files: Vec<_> = project.files().collect();
    writer.write_all(&(files.len() as u32).to_le_bytes())?;

    for (_, file) in files {
        let path = project
            .pool()
            .get(file.path)
            .ok_or(SnapshotError::DanglingString {
                id: file.path.value(),
            })?;
        write_string(writer, path)?;
        writer.write_all(&(file.language as u32).to_le_bytes())?;
        writer.write_all(&(file.metrics.len() as u32).to_le_bytes())?;

        for metric in &file.metrics {
            let name = project
                .pool()
                .get(metric.name)
                .ok_or(SnapshotError::DanglingString {
                    id: metric.name.value(),
                })?;
            write_string(writer, name)?;
            writer.write_all(&metric.value.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Read a snapshot into a fresh Building-phase project. The caller is
/// expected to validate (or seal) the result before serving reads.
pub fn read_snapshot<R: Read>(reader: &mut R, limits: &SnapshotLimits) -> SnapshotResult<Project> {
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic, "magic")?;
    if magic != MAGIC {
        return Err(SnapshotError::BadMagic { found: magic });
    }

    let version = read_u32(reader, "version")?;
    if version != VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: version,
            supported: VERSION,
        });
    }

    let _flags = read_u32(reader, "flags")?;

    let file_count = read_u32(reader, "file count")?;
    if file_count > limits.max_files {
        return Err(SnapshotError::FileCountExceeded {
            count: file_count,
            max: limits.max_files,
        });
    }

    let mut project = Project::init("", file_count as usize);

    for index in 0..file_count {
        let path = read_string(reader, limits)?;
        let language_code = read_u32(reader, "language")?;
        let language =
            Language::from_u32(language_code).ok_or(SnapshotError::UnknownLanguage {
                file: index,
                value: language_code,
            })?;

        let file = project
            .add_file(&path, language)
            .expect("fresh project is in Building phase");

        let metric_count = read_u32(reader, "metric count")?;
        if metric_count > limits.max_metrics_per_file {
            return Err(SnapshotError::MetricCountExceeded {
                file: index,
                count: metric_count,
                max: limits.max_metrics_per_file,
            });
        }

        for _ in 0..metric_count {
            let name = read_string(reader, limits)?;
            let value = read_f64(reader, "metric value")?;
            if !value.is_finite() {
                return Err(SnapshotError::NonFiniteMetric { file: index, name });
            }
            project
                .add_file_metric(file, &name, value)
                .expect("value is finite and file exists");
        }
    }

    debug!(target: "storage", "snapshot read: {file_count} files");
    Ok(project)
}

fn write_string<W: Write>(writer: &mut W, text: &str) -> SnapshotResult<()> {
    // An interior NUL would truncate the string for any reader that
    // stops at the first NUL, so it never reaches the wire.
    if text.as_bytes().contains(&0) {
        return Err(SnapshotError::InteriorNul);
    }
    // Length counts the trailing NUL, matching the on-disk layout the
    // visualizer tooling consumes.
    let len = text.len() as u32 + 1;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(text.as_bytes())?;
    writer.write_all(&[0u8])?;
    Ok(())
}

fn read_string<R: Read>(reader: &mut R, limits: &SnapshotLimits) -> SnapshotResult<String> {
    let len = read_u32(reader, "string length")?;
    if len > limits.max_string_len {
        return Err(SnapshotError::StringTooLong {
            len,
            max: limits.max_string_len,
        });
    }
    if len == 0 {
        return Err(SnapshotError::MissingNulTerminator);
    }

    let mut bytes = vec![0u8; len as usize];
    read_exact(reader, &mut bytes, "string bytes")?;
    match bytes.pop() {
        Some(0) => {}
        _ => return Err(SnapshotError::MissingNulTerminator),
    }
    if bytes.contains(&0) {
        return Err(SnapshotError::InteriorNul);
    }
    String::from_utf8(bytes).map_err(|_| SnapshotError::InvalidUtf8)
}

fn read_u32<R: Read>(reader: &mut R, reading: &'static str) -> SnapshotResult<u32> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, reading)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R, reading: &'static str) -> SnapshotResult<f64> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, reading)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_exact<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    reading: &'static str,
) -> SnapshotResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            SnapshotError::Truncated { reading }
        } else {
            SnapshotError::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> Project {
        let mut project = Project::init("/repo", 4);
        let a = project.add_file("src/a.c", Language::C).unwrap();
        let b = project.add_file("src/b.cpp", Language::Cpp).unwrap();
        let c = project.add_file("src/c.rs", Language::Rust).unwrap();
        project.add_file_metric(a, "loc", 100.0).unwrap();
        project.add_file_metric(b, "loc", 200.0).unwrap();
        project.add_file_metric(b, "complexity", 7.5).unwrap();
        project.add_file_metric(c, "loc", 150.0).unwrap();
        project
    }

    fn snapshot_bytes(project: &Project) -> Vec<u8> {
        let mut buf = Vec::new();
        write_snapshot(project, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_round_trip_preserves_files_and_metrics() {
        let original = sample_project();
        let buf = snapshot_bytes(&original);

        let restored = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap();
        assert!(restored.validate().is_ok());
        assert_eq!(restored.totals().files, 3);

        for ((_, want), (_, got)) in original.files().zip(restored.files()) {
            assert_eq!(
                original.pool().get(want.path),
                restored.pool().get(got.path)
            );
            assert_eq!(want.language, got.language);
            assert_eq!(want.metrics.len(), got.metrics.len());
            for (wm, gm) in want.metrics.iter().zip(got.metrics.iter()) {
                assert_eq!(original.pool().get(wm.name), restored.pool().get(gm.name));
                assert_eq!(wm.value, gm.value);
            }
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut buf = snapshot_bytes(&sample_project());
        buf[0] = b'X';
        let err = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::BadMagic { .. }));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut buf = snapshot_bytes(&sample_project());
        buf[4..8].copy_from_slice(&99u32.to_le_bytes());
        let err = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion {
                found: 99,
                supported: VERSION
            }
        ));
    }

    #[test]
    fn test_truncation_rejected() {
        let buf = snapshot_bytes(&sample_project());
        for cut in [0, 3, 10, buf.len() / 2, buf.len() - 1] {
            let err =
                read_snapshot(&mut &buf[..cut], &SnapshotLimits::default()).unwrap_err();
            assert!(
                matches!(err, SnapshotError::Truncated { .. }),
                "cut at {cut} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_adversarial_file_count_rejected() {
        let mut buf = snapshot_bytes(&sample_project());
        buf[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::FileCountExceeded { .. }));
    }

    #[test]
    fn test_missing_nul_terminator_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes()); // one file
        buf.extend_from_slice(&4u32.to_le_bytes()); // path length 4
        buf.extend_from_slice(b"a.cX"); // no NUL at the end

        let err = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingNulTerminator));
    }

    #[test]
    fn test_nan_metric_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(b"a.c\0");
        buf.extend_from_slice(&1u32.to_le_bytes()); // language = C
        buf.extend_from_slice(&1u32.to_le_bytes()); // one metric
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(b"loc\0");
        buf.extend_from_slice(&f64::NAN.to_le_bytes());

        let err = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::NonFiniteMetric { .. }));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes()); // one file
        buf.extend_from_slice(&4u32.to_le_bytes()); // path length 4
        buf.extend_from_slice(b"a\xffc\0"); // NUL-terminated but not UTF-8

        let err = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidUtf8));
    }

    #[test]
    fn test_interior_nul_rejected_on_write() {
        let mut project = Project::init("/repo", 4);
        project.add_file("a\0.c", Language::C).unwrap();

        let mut buf = Vec::new();
        let err = write_snapshot(&project, &mut buf).unwrap_err();
        assert!(matches!(err, SnapshotError::InteriorNul));
    }

    #[test]
    fn test_interior_nul_rejected_on_read() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes()); // one file
        buf.extend_from_slice(&5u32.to_le_bytes()); // path length 5
        buf.extend_from_slice(b"a\0.c\0"); // NUL before the terminator

        let err = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::InteriorNul));
    }

    #[test]
    fn test_unknown_language_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(b"a.c\0");
        buf.extend_from_slice(&777u32.to_le_bytes());

        let err = read_snapshot(&mut buf.as_slice(), &SnapshotLimits::default()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnknownLanguage { value: 777, .. }
        ));
    }
}
