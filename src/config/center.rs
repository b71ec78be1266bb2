use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Initial map center: a tile coordinate plus the pixel offset inside it.
///
/// Stored as `((tile_x, tile_y), (offset_x, offset_y))`. The same encoding is
/// produced by `Display` and accepted by `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapCenter {
    pub tile: (i32, i32),
    pub offset: (i32, i32),
}

impl MapCenter {
    pub const fn new(tile: (i32, i32), offset: (i32, i32)) -> Self {
        Self { tile, offset }
    }
}

impl Default for MapCenter {
    fn default() -> Self {
        Self::new((1, 0), (9, 200))
    }
}

impl fmt::Display for MapCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(({}, {}), ({}, {}))",
            self.tile.0, self.tile.1, self.offset.0, self.offset.1
        )
    }
}

impl FromStr for MapCenter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidCenter(s.to_string());

        let inner = strip_parens(s.trim()).ok_or_else(invalid)?;
        let (first, second) = split_pairs(inner).ok_or_else(invalid)?;

        let tile = parse_pair(first).ok_or_else(invalid)?;
        let offset = parse_pair(second).ok_or_else(invalid)?;
        Ok(Self { tile, offset })
    }
}

fn strip_parens(s: &str) -> Option<&str> {
    s.strip_prefix('(')?.strip_suffix(')').map(str::trim)
}

// Splits `(a, b), (c, d)` at the comma between the two groups, allowing a
// trailing comma after the second one.
fn split_pairs(s: &str) -> Option<(&str, &str)> {
    let close = s.find(')')?;
    let first = &s[..=close];
    let rest = s[close + 1..].trim_start().strip_prefix(',')?.trim();
    let rest = match rest.strip_suffix(',') {
        Some(stripped) => stripped.trim_end(),
        None => rest,
    };
    Some((first, rest))
}

fn parse_pair(s: &str) -> Option<(i32, i32)> {
    let inner = strip_parens(s.trim())?;
    let inner = inner.strip_suffix(',').map(str::trim_end).unwrap_or(inner);
    let (a, b) = inner.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}
