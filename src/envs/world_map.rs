//! Text format for grid worlds.
//!
//! Each line that is neither empty nor starts with `#` is a row of space separated tokens:
//! `1` wall, `0` free, `S` start, `G` goal, `T` trap. All rows need the same number of tokens.

use super::grid_world::{Cell, Grid};
use crate::error::{Result, WorldMapError};
use itertools::Itertools;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Used by the CLI when no map file is given.
pub const DEFAULT_WORLD_MAP: &str = "\
# The trap sits next to the short way round.
1 1 1 1 1 1 1 1
1 0 0 0 0 0 G 1
1 0 1 1 0 1 0 1
1 0 1 0 0 T 0 1
1 S 0 0 1 0 0 1
1 1 1 1 1 1 1 1
";

impl FromStr for Grid {
    type Err = WorldMapError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut rows: Vec<Vec<Cell>> = vec![];

        for (i, line) in s.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let row = line
                .split_whitespace()
                .map(|t| {
                    Cell::from_token(t).ok_or_else(|| WorldMapError::UnknownToken {
                        line: i + 1,
                        token: t.to_string(),
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;

            if let Some(expected) = rows.first().map(|r| r.len()) {
                if row.len() != expected {
                    return Err(WorldMapError::RaggedRow {
                        line: i + 1,
                        expected,
                        found: row.len(),
                    });
                }
            }

            rows.push(row);
        }

        Grid::new(rows)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self
            .cells()
            .rows()
            .into_iter()
            .map(|r| r.iter().map(|c| c.token()).join(" "))
            .join("\n");

        write!(f, "{rows}")
    }
}

pub fn load_world_map(path: &Path) -> Result<Grid> {
    let content = std::fs::read_to_string(path)?;
    let grid = content.parse::<Grid>()?;
    debug!(
        "Read {}x{} world from {:?}",
        grid.width(),
        grid.height(),
        path
    );

    Ok(grid)
}
