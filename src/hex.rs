//! Axial hex coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// The six axial directions, clockwise from east.
const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// A hex cell in axial coordinates (`s = -q - r` is implied).
///
/// The text form is `q,r`, e.g. `2,-1`. Ordering is by `q` then `r`, which
/// gives sets of hexes a canonical, sorted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Hex {
    /// Column.
    pub q: i32,
    /// Row.
    pub r: i32,
}

impl Hex {
    /// Create a new hex.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube coordinate.
    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance (number of steps) between two cells.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s() - other.s()).unsigned_abs();
        (dq + dr + ds) / 2
    }

    /// The six cells around this one, unbounded.
    #[must_use]
    pub fn neighbours(self) -> [Self; 6] {
        DIRECTIONS.map(|(dq, dr)| Self::new(self.q + dq, self.r + dr))
    }

    /// Every cell within `radius` steps of this one, including itself.
    #[must_use]
    pub fn spiral(self, radius: u32) -> Vec<Self> {
        #[allow(clippy::cast_possible_wrap)]
        let radius = radius as i32;
        let mut cells = Vec::new();
        for dq in -radius..=radius {
            let lo = (-radius).max(-dq - radius);
            let hi = radius.min(-dq + radius);
            for dr in lo..=hi {
                cells.push(Self::new(self.q + dq, self.r + dr));
            }
        }
        cells
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.q, self.r)
    }
}

impl FromStr for Hex {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (q, r) = s
            .split_once(',')
            .ok_or_else(|| ParseError::new(s, "expected 'q,r'"))?;
        let q = q
            .trim()
            .parse()
            .map_err(|_| ParseError::new(s, "invalid q coordinate"))?;
        let r = r
            .trim()
            .parse()
            .map_err(|_| ParseError::new(s, "invalid r coordinate"))?;
        Ok(Self::new(q, r))
    }
}

impl From<Hex> for String {
    fn from(hex: Hex) -> Self {
        hex.to_string()
    }
}

impl TryFrom<String> for Hex {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Join a sorted list of hexes into the `q,r;q,r` form used by federation moves.
#[must_use]
pub fn join_hexes<'a>(hexes: impl IntoIterator<Item = &'a Hex>) -> String {
    let mut sorted: Vec<Hex> = hexes.into_iter().copied().collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse the `q,r;q,r` form.
///
/// # Errors
///
/// Returns an error if any element is not a valid hex.
pub fn split_hexes(s: &str) -> Result<Vec<Hex>, ParseError> {
    s.split(';').map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let origin = Hex::new(0, 0);
        assert_eq!(origin.distance(origin), 0);
        assert_eq!(origin.distance(Hex::new(1, 0)), 1);
        assert_eq!(origin.distance(Hex::new(2, -1)), 2);
        assert_eq!(origin.distance(Hex::new(-3, 3)), 3);
        assert_eq!(Hex::new(1, -2).distance(Hex::new(-1, 1)), 3);
    }

    #[test]
    fn test_neighbours_are_adjacent() {
        let hex = Hex::new(2, -1);
        for n in hex.neighbours() {
            assert_eq!(hex.distance(n), 1);
        }
    }

    #[test]
    fn test_spiral_sizes() {
        assert_eq!(Hex::new(0, 0).spiral(0).len(), 1);
        assert_eq!(Hex::new(0, 0).spiral(1).len(), 7);
        assert_eq!(Hex::new(0, 0).spiral(2).len(), 19);
    }

    #[test]
    fn test_text_form() {
        let hex: Hex = "3,-2".parse().unwrap();
        assert_eq!(hex, Hex::new(3, -2));
        assert_eq!(hex.to_string(), "3,-2");
        assert!("3".parse::<Hex>().is_err());
        assert!("a,b".parse::<Hex>().is_err());
    }

    #[test]
    fn test_join_is_sorted() {
        let hexes = [Hex::new(1, 0), Hex::new(0, 1), Hex::new(0, 0)];
        let joined = join_hexes(&hexes);
        assert_eq!(joined, "0,0;0,1;1,0");
        assert_eq!(split_hexes(&joined).unwrap().len(), 3);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Hex::new(-1, 2)).unwrap();
        assert_eq!(json, "\"-1,2\"");
        let back: Hex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Hex::new(-1, 2));
    }
}
