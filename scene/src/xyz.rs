//! Plain ASCII XYZ point lists.
//!
//! One point per line: `x y z`, separated by spaces, tabs or commas. Extra
//! columns (normals, colors) are ignored. Blank lines and lines starting with
//! `#` are skipped.

use std::fs;
use std::path::Path;

use pbd::{Real, Vec3};

use crate::error::SceneError;

pub fn parse_str(text: &str) -> Result<Vec<Vec3>, SceneError> {
    let mut points = Vec::new();

    for (n, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty());

        let mut coords = [0.0 as Real; 3];
        for (axis, slot) in coords.iter_mut().enumerate() {
            let field = fields.next().ok_or_else(|| SceneError::Parse {
                line: n + 1,
                reason: format!("expected 3 coordinates, found {axis}"),
            })?;
            let value: Real = field.parse().map_err(|_| SceneError::Parse {
                line: n + 1,
                reason: format!("`{field}` is not a number"),
            })?;
            if !value.is_finite() {
                return Err(SceneError::Parse {
                    line: n + 1,
                    reason: format!("`{field}` is not finite"),
                });
            }
            *slot = value;
        }

        points.push(Vec3::from(coords));
    }

    Ok(points)
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Vec3>, SceneError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| SceneError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let points = parse_str(&text)?;
    log::debug!("read {} points from {}", points.len(), path.display());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points_and_skips_noise() {
        let text = "# bunny\n\n0 0 0\n1.5\t-2 3 0.1 0.2 0.3\n  4,5,6  \n";
        let points = parse_str(text).unwrap();
        assert_eq!(
            points,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.5, -2.0, 3.0),
                Vec3::new(4.0, 5.0, 6.0)
            ]
        );
    }

    #[test]
    fn short_line_reports_line_number() {
        let err = parse_str("0 0 0\n1 2\n").unwrap_err();
        assert!(matches!(err, SceneError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(parse_str("1 two 3"), Err(SceneError::Parse { line: 1, .. })));
        assert!(matches!(parse_str("1 inf 3"), Err(SceneError::Parse { line: 1, .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = parse_file("/definitely/not/here.xyz").unwrap_err();
        assert!(matches!(err, SceneError::Io { .. }));
    }

    #[test]
    fn reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("scene-xyz-{}.xyz", std::process::id()));
        fs::write(&path, "0 0 1\n0 1 0\n").unwrap();
        let points = parse_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(points.len(), 2);
    }
}
