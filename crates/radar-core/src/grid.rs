//! Per-area walkability classification.
//!
//! The host reports one small integer code per tile. Only two of those codes
//! describe passable terrain; everything else is treated as a wall.

use crate::models::{GridBounds, GridCoord};
use thiserror::Error;

/// Tile codes that describe passable terrain.
pub const WALKABLE_CODES: [u8; 2] = [4, 5];

/// Code used by [`WalkabilityGrid::from_ascii`] for open tiles.
const ASCII_OPEN_CODE: u8 = 5;
const ASCII_WALL_CODE: u8 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("grid of {width}x{height} needs {expected} codes, got {found}")]
    CodeCount {
        width: usize,
        height: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile character {0:?}")]
    UnknownTile(char),
}

pub fn is_walkable_code(code: u8) -> bool {
    WALKABLE_CODES.contains(&code)
}

/// Immutable dense grid of tile codes, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkabilityGrid {
    width: usize,
    height: usize,
    codes: Vec<u8>,
}

impl WalkabilityGrid {
    pub fn from_codes(width: usize, height: usize, codes: Vec<u8>) -> Result<Self, GridError> {
        let expected = width * height;
        if codes.len() != expected {
            return Err(GridError::CodeCount {
                width,
                height,
                expected,
                found: codes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            codes,
        })
    }

    /// Build from `rows[y][x]`, the layout the host hands over.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut codes = Vec::with_capacity(width * height);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(GridError::RaggedRow {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            codes.extend(row);
        }
        Self::from_codes(width, height, codes)
    }

    /// Parse a picture of the grid: `.` is open, `#` is a wall. Blank lines
    /// and surrounding whitespace are ignored.
    pub fn from_ascii(picture: &str) -> Result<Self, GridError> {
        let mut rows = Vec::new();
        for line in picture.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .chars()
                .map(|ch| match ch {
                    '.' => Ok(ASCII_OPEN_CODE),
                    '#' => Ok(ASCII_WALL_CODE),
                    other => Err(GridError::UnknownTile(other)),
                })
                .collect::<Result<Vec<u8>, GridError>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::of_size(self.width, self.height)
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.bounds().contains(coord)
    }

    pub fn code(&self, coord: GridCoord) -> Option<u8> {
        self.index(coord).map(|idx| self.codes[idx])
    }

    /// Out-of-bounds coordinates are never walkable; no clipping is applied.
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.code(coord).is_some_and(is_walkable_code)
    }

    pub fn walkable_count(&self) -> usize {
        self.codes.iter().filter(|code| is_walkable_code(**code)).count()
    }

    pub(crate) fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 {
            return None;
        }
        let (x, y) = (coord.x as usize, coord.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }
}
