//! Area files: either a JSON `AreaSnapshot` or a plain `.`/`#` picture.

use anyhow::{bail, Context, Result};
use radar_core::{GridCoord, WalkabilityGrid};
use radar_engine::AreaSnapshot;
use std::path::Path;

/// Load an area from `path`. Files ending in `.json` are parsed as a full
/// snapshot; anything else is read as an ASCII picture with no labels.
pub fn load_area(path: &Path) -> Result<AreaSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading area file {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        return serde_json::from_str(&text)
            .with_context(|| format!("parsing area file {}", path.display()));
    }

    let grid = WalkabilityGrid::from_ascii(&text)
        .with_context(|| format!("parsing area picture {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let rows = (0..grid.height() as i32)
        .map(|y| {
            (0..grid.width() as i32)
                .map(|x| grid.code(GridCoord::new(x, y)).unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(AreaSnapshot {
        name,
        grid: rows,
        ..AreaSnapshot::default()
    })
}

/// Parse `x,y` into a coordinate.
pub fn parse_coord(raw: &str) -> Result<GridCoord> {
    let Some((x, y)) = raw.split_once(',') else {
        bail!("expected x,y but got {raw:?}");
    };
    let x = x.trim().parse().with_context(|| format!("bad x in {raw:?}"))?;
    let y = y.trim().parse().with_context(|| format!("bad y in {raw:?}"))?;
    Ok(GridCoord::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("radar-cli-{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_coordinates() {
        assert_eq!(parse_coord("3,4").unwrap(), GridCoord::new(3, 4));
        assert_eq!(parse_coord(" 10 , -2 ").unwrap(), GridCoord::new(10, -2));
        assert!(parse_coord("3").is_err());
        assert!(parse_coord("a,1").is_err());
    }

    #[test]
    fn picture_files_become_unlabelled_snapshots() {
        let path = temp_file("cave.txt", "..#\n...\n");
        let area = load_area(&path).unwrap();
        assert_eq!(area.name.split('-').last(), Some("cave"));
        assert_eq!(area.grid, vec![vec![5, 5, 0], vec![5, 5, 5]]);
        assert!(area.labels.is_empty());
    }

    #[test]
    fn json_files_keep_labels() {
        let path = temp_file(
            "crypt.json",
            r#"{ "name": "Crypt", "grid": [[5, 5], [4, 0]], "labels": { "exit": [{ "x": 1, "y": 0 }] } }"#,
        );
        let area = load_area(&path).unwrap();
        assert_eq!(area.name, "Crypt");
        assert_eq!(area.labels.get("exit").unwrap(), &[GridCoord::new(1, 0)]);
    }
}
