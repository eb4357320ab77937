//! The space map.
//!
//! [`HexGrid`] is the adjacency collaborator the rules consume; [`SpaceMap`]
//! is the implementation the engine ships with. Maps are either generated
//! from the game seed or loaded from an explicit [`MapLayout`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::faction::{Building, Planet};
use crate::hex::Hex;
use crate::rng::Rng;

/// What sits on one hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaiaHex {
    /// Planet type, `Empty` for open space.
    pub planet: Planet,
    /// Building, if any.
    pub building: Option<Building>,
    /// Owner of the building (0-based).
    pub player: Option<u8>,
    /// Players with a federation covering this hex.
    pub federations: Vec<u8>,
}

impl GaiaHex {
    /// An unoccupied hex.
    #[must_use]
    pub const fn new(planet: Planet) -> Self {
        Self {
            planet,
            building: None,
            player: None,
            federations: Vec::new(),
        }
    }

    /// The building here if it belongs to `player`.
    #[must_use]
    pub fn building_of(&self, player: u8) -> Option<Building> {
        if self.player == Some(player) {
            self.building
        } else {
            None
        }
    }

    /// Whether anyone built here.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.building.is_some()
    }
}

/// Grid and adjacency service.
pub trait HexGrid {
    /// Hex contents, if the coordinate is on the map.
    fn get(&self, hex: Hex) -> Option<&GaiaHex>;

    /// Every coordinate on the map, in ascending order.
    fn coordinates(&self) -> Vec<Hex>;

    /// Step distance between two hexes.
    fn distance(&self, a: Hex, b: Hex) -> u32 {
        a.distance(b)
    }

    /// On-map neighbours of a hex.
    fn neighbours(&self, hex: Hex) -> Vec<Hex> {
        hex.neighbours()
            .into_iter()
            .filter(|&n| self.get(n).is_some())
            .collect()
    }
}

/// One hex of an explicit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutHex {
    /// Coordinate.
    pub hex: Hex,
    /// Planet there.
    pub planet: Planet,
}

/// An explicit map, used instead of seeded generation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapLayout {
    /// Every hex of the map. Unlisted coordinates are off the map.
    pub hexes: Vec<LayoutHex>,
}

impl MapLayout {
    /// Build a layout from rows of planet codes, as in
    /// `["e r e", "d g e"]`, where row `r` holds hexes `(q, r)` for
    /// `q = 0, 1, ...`. Unknown codes are skipped.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let mut hexes = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            let mut q = 0;
            for c in row.chars().filter(|c| !c.is_whitespace()) {
                if let Some(planet) = Planet::from_code(c) {
                    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
                    hexes.push(LayoutHex {
                        hex: Hex::new(q, r as i32),
                        planet,
                    });
                }
                q += 1;
            }
        }
        Self { hexes }
    }
}

/// Map radius for a player count.
#[must_use]
pub const fn radius_for(players: usize) -> u32 {
    if players <= 2 { 5 } else { 6 }
}

/// The game map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpaceMap {
    cells: BTreeMap<Hex, GaiaHex>,
}

impl SpaceMap {
    /// Generate a hexagonal map for `players` players from the game RNG.
    ///
    /// Each home planet type appears the same number of times; gaia and
    /// transdim planets are sprinkled in and the rest is open space.
    #[must_use]
    pub fn generate(players: usize, rng: &mut Rng) -> Self {
        let coords = Hex::new(0, 0).spiral(radius_for(players));
        let (per_type, gaia, transdim) = if players <= 2 { (3, 3, 4) } else { (4, 4, 5) };

        let mut planets = Vec::with_capacity(coords.len());
        for planet in [
            Planet::Terra,
            Planet::Desert,
            Planet::Swamp,
            Planet::Oxide,
            Planet::Titanium,
            Planet::Ice,
            Planet::Volcanic,
        ] {
            planets.extend(std::iter::repeat_n(planet, per_type));
        }
        planets.extend(std::iter::repeat_n(Planet::Gaia, gaia));
        planets.extend(std::iter::repeat_n(Planet::Transdim, transdim));
        planets.resize(coords.len().max(planets.len()), Planet::Empty);
        rng.shuffle(&mut planets);

        Self {
            cells: coords
                .into_iter()
                .zip(planets)
                .map(|(hex, planet)| (hex, GaiaHex::new(planet)))
                .collect(),
        }
    }

    /// Load an explicit layout.
    #[must_use]
    pub fn from_layout(layout: &MapLayout) -> Self {
        Self {
            cells: layout
                .hexes
                .iter()
                .map(|h| (h.hex, GaiaHex::new(h.planet)))
                .collect(),
        }
    }

    /// Mutable hex contents.
    pub fn get_mut(&mut self, hex: Hex) -> Option<&mut GaiaHex> {
        self.cells.get_mut(&hex)
    }

    /// Iterate over all hexes in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (Hex, &GaiaHex)> {
        self.cells.iter().map(|(&h, d)| (h, d))
    }

    /// Iterate mutably over all hexes.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Hex, &mut GaiaHex)> {
        self.cells.iter_mut().map(|(&h, d)| (h, d))
    }

    /// Number of hexes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the map has no hexes (before `init`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Hexes a player cannot use when forming a new federation: those in
    /// the player's existing federations and their neighbours.
    #[must_use]
    pub fn excluded_for_federation(&self, player: u8) -> BTreeSet<Hex> {
        let mut excluded = BTreeSet::new();
        for (hex, data) in self.iter() {
            if data.federations.contains(&player) {
                excluded.insert(hex);
                excluded.extend(self.neighbours(hex));
            }
        }
        excluded
    }

    /// Smallest distance from `hex` to any of `targets`.
    #[must_use]
    pub fn min_distance<'a>(&self, hex: Hex, targets: impl IntoIterator<Item = &'a Hex>) -> Option<u32> {
        targets.into_iter().map(|&t| self.distance(hex, t)).min()
    }
}

impl HexGrid for SpaceMap {
    fn get(&self, hex: Hex) -> Option<&GaiaHex> {
        self.cells.get(&hex)
    }

    fn coordinates(&self) -> Vec<Hex> {
        self.cells.keys().copied().collect()
    }
}
