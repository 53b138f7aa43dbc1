//! Text codec for persisted point clouds.
//!
//! One record per line, `x y angle`, whitespace or comma separated. Blank
//! lines and lines starting with `#` are ignored on read.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::CloudIoError;
use crate::point::DataPoint;

/// Parses every record of `reader`. Fails on the first malformed record.
pub fn read_points<R: Read>(reader: R) -> Result<Vec<DataPoint>, CloudIoError> {
    let mut points = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let record = line.trim();
        if record.is_empty() || record.starts_with('#') {
            continue;
        }
        points.push(parse_record(record, idx + 1)?);
    }
    Ok(points)
}

fn parse_record(record: &str, line: usize) -> Result<DataPoint, CloudIoError> {
    let fields: Vec<&str> = record
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|f| !f.is_empty())
        .collect();
    if fields.len() != 3 {
        return Err(CloudIoError::Parse {
            line,
            reason: format!("expected 3 fields, found {}", fields.len()),
        });
    }

    let mut values = [0.0f32; 3];
    for (slot, field) in values.iter_mut().zip(&fields) {
        let v: f32 = field.parse().map_err(|e| CloudIoError::Parse {
            line,
            reason: format!("{field:?}: {e}"),
        })?;
        if !v.is_finite() {
            return Err(CloudIoError::Parse {
                line,
                reason: format!("{field:?} is not finite"),
            });
        }
        *slot = v;
    }
    Ok(values.into())
}

/// Writes one record per point.
pub fn write_points<W: Write>(writer: W, points: &[DataPoint]) -> Result<(), CloudIoError> {
    let mut out = BufWriter::new(writer);
    for p in points {
        writeln!(out, "{} {} {}", p.x(), p.y(), p.angle())?;
    }
    out.flush()?;
    Ok(())
}

/// Reads a point cloud file.
pub fn load(path: &Path) -> Result<Vec<DataPoint>, CloudIoError> {
    read_points(File::open(path)?)
}

/// Writes a point cloud file, truncating any existing content.
pub fn save(path: &Path, points: &[DataPoint]) -> Result<(), CloudIoError> {
    write_points(File::create(path)?, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_mixed_separators_and_comments() {
        let text = "# x y angle\n0 0 1.5\n\n1.5, -2, 0\n  3\t4\t0.25  \n";
        let points = read_points(text.as_bytes()).unwrap();
        assert_eq!(
            points,
            vec![
                DataPoint::new(0.0, 0.0, 1.5),
                DataPoint::new(1.5, -2.0, 0.0),
                DataPoint::new(3.0, 4.0, 0.25),
            ]
        );
    }

    #[test]
    fn wrong_arity_reports_line() {
        let err = read_points("0 0 0\n1 2\n".as_bytes()).unwrap_err();
        match err {
            CloudIoError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_and_nan_fields_are_rejected() {
        assert!(read_points("0 zero 0\n".as_bytes()).is_err());
        assert!(read_points("0 NaN 0\n".as_bytes()).is_err());
    }

    #[test]
    fn save_then_load_keeps_order_and_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cloud.pts");
        let points = vec![
            DataPoint::new(0.1, 0.2, 0.3),
            DataPoint::new(-7.25, 1e-3, 3.1),
            DataPoint::new(12345.678, -0.5, -1.0),
        ];

        save(&path, &points).unwrap();
        assert_eq!(load(&path).unwrap(), points);
    }

    #[test]
    fn empty_cloud_writes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.pts");
        save(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("absent.pts")).unwrap_err();
        assert!(matches!(err, CloudIoError::Io(_)));
    }
}
