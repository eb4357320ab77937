//! Federation search.
//!
//! A federation is a connected set of hexes whose buildings are worth at
//! least [`FEDERATION_COST`]. Empty space between buildings is bridged with
//! satellites, each paid with one power token.
//!
//! The search runs in three stages:
//!
//! 1. [`value_combinations`] lists the sets of buildings that reach the
//!    value threshold.
//! 2. A Steiner table over the building subsets gives the exact satellite
//!    cost of connecting each set. The cheapest set fixes the satellite
//!    count of every candidate; sets that cost more, or more than the token
//!    budget, are not searched.
//! 3. Each remaining set is connected by a breadth-first search over hex
//!    groups (keyed by their sorted member set), one satellite per level,
//!    cutting every group whose missing satellites already push it past
//!    that count.
//!
//! The union of all solutions is then reduced to its Pareto front: a
//! candidate is dropped when another one uses strictly fewer planets and
//! strictly fewer satellites, or when its hexes strictly contain another
//! candidate's.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::faction::Planet;
use crate::hex::{Hex, join_hexes};
use crate::map::HexGrid;

/// Building value a federation needs.
pub const FEDERATION_COST: u32 = 7;

const UNREACHABLE: u32 = u32::MAX;
/// Buildings a subset bitmask can hold.
const MAX_TERMINALS: usize = 64;

/// A formable federation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FederationCandidate {
    /// Every hex in the federation, sorted.
    pub hexes: Vec<Hex>,
    /// Hexes holding one of the player's buildings.
    pub planets: u32,
    /// Satellite hexes, each costing one power token.
    pub satellites: u32,
}

impl FederationCandidate {
    /// Move operand form, `q,r;q,r;...`.
    #[must_use]
    pub fn key(&self) -> String {
        join_hexes(&self.hexes)
    }

    fn is_strict_subset_of(&self, other: &Self) -> bool {
        self.hexes.len() < other.hexes.len() && self.hexes.iter().all(|h| other.hexes.contains(h))
    }
}

/// Every combination of buildings whose values reach `target`.
///
/// Zero-value buildings are skipped. A building that reaches the remaining
/// target on its own closes a combination; otherwise the search continues
/// with the buildings after it.
#[must_use]
pub fn value_combinations(nodes: &[(Hex, u32)], target: u32) -> Vec<Vec<Hex>> {
    let mut out = Vec::new();
    for (i, &(hex, value)) in nodes.iter().enumerate() {
        if value == 0 {
            continue;
        }
        if value >= target {
            out.push(vec![hex]);
            continue;
        }
        for mut rest in value_combinations(&nodes[i + 1..], target - value) {
            rest.insert(0, hex);
            out.push(rest);
        }
    }
    out
}

/// Hex group, as node indices into a [`CostGraph`].
type Group = BTreeSet<usize>;

/// The hexes a federation may use, densely indexed in ascending hex order.
/// Crossing an owned building is free; a satellite site costs one token.
#[derive(Debug)]
struct CostGraph {
    hexes: Vec<Hex>,
    index: BTreeMap<Hex, usize>,
    owned: Vec<bool>,
    neighbours: Vec<Vec<usize>>,
}

impl CostGraph {
    fn len(&self) -> usize {
        self.hexes.len()
    }

    fn weight(&self, node: usize) -> u32 {
        u32::from(!self.owned[node])
    }

    /// Pull every adjacent owned building into the group.
    fn close(&self, group: &mut Group) {
        let mut stack: Vec<usize> = group.iter().copied().collect();
        while let Some(node) = stack.pop() {
            for &n in &self.neighbours[node] {
                if self.owned[n] && group.insert(n) {
                    stack.push(n);
                }
            }
        }
    }

    /// Lower `cost` along every path from the nodes already priced.
    /// Nothing above `cap` is kept.
    fn relax(&self, cost: &mut [u32], cap: u32) {
        let mut heap: BinaryHeap<Reverse<(u32, usize)>> = cost
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c <= cap)
            .map(|(node, &c)| Reverse((c, node)))
            .collect();
        while let Some(Reverse((c, node))) = heap.pop() {
            if c > cost[node] {
                continue;
            }
            for &n in &self.neighbours[node] {
                let next = c + self.weight(n);
                if next <= cap && next < cost[n] {
                    cost[n] = next;
                    heap.push(Reverse((next, n)));
                }
            }
        }
    }

    fn candidate(&self, group: &Group) -> FederationCandidate {
        let planets = group.iter().filter(|&&n| self.owned[n]).count();
        let planets = u32::try_from(planets).unwrap_or(u32::MAX);
        let total = u32::try_from(group.len()).unwrap_or(u32::MAX);
        FederationCandidate {
            hexes: group.iter().map(|&n| self.hexes[n]).collect(),
            planets,
            satellites: total - planets,
        }
    }
}

/// A building a combination must contain.
#[derive(Debug, Clone, Copy)]
struct Target {
    node: usize,
    bit: u64,
}

/// Cheapest connections between subsets of the valued buildings.
///
/// For a subset `set` and a node `v`, `costs(set)[v]` is the fewest
/// satellites of a connected group holding `v` and every building of
/// `set`, counting `v` itself. A single building's row is its satellite
/// distance to every node.
#[derive(Debug)]
struct SteinerTable<'g> {
    graph: &'g CostGraph,
    terminals: Vec<usize>,
    cap: u32,
    memo: BTreeMap<u64, Vec<u32>>,
}

impl<'g> SteinerTable<'g> {
    fn new(graph: &'g CostGraph, terminals: Vec<usize>, cap: u32) -> Self {
        let mut table = Self {
            graph,
            terminals,
            cap,
            memo: BTreeMap::new(),
        };
        for i in 0..table.terminals.len() {
            table.fill(1 << i);
        }
        table
    }

    fn target(&self, hex: Hex) -> Option<Target> {
        let node = *self.graph.index.get(&hex)?;
        let pos = self.terminals.iter().position(|&t| t == node)?;
        Some(Target { node, bit: 1 << pos })
    }

    fn row(&self, set: u64) -> &[u32] {
        self.memo.get(&set).map_or(&[], Vec::as_slice)
    }

    /// Exact satellites needed to connect every target.
    fn connection_cost(&mut self, targets: &[Target]) -> Option<u32> {
        let first = targets.first()?;
        let set = targets.iter().fold(0, |acc, t| acc | t.bit);
        self.fill(set);
        self.row(set)
            .get(first.node)
            .copied()
            .filter(|&c| c != UNREACHABLE)
    }

    fn fill(&mut self, set: u64) {
        if set == 0 || self.memo.contains_key(&set) {
            return;
        }
        let mut cost = vec![UNREACHABLE; self.graph.len()];
        if set.count_ones() == 1 {
            let terminal = usize::try_from(set.trailing_zeros())
                .ok()
                .and_then(|i| self.terminals.get(i));
            if let Some(&node) = terminal {
                cost[node] = 0;
            }
        } else {
            // Each split once: the part holding the lowest member.
            let low = set & set.wrapping_neg();
            let mut part = (set - 1) & set;
            while part != 0 {
                if part & low != 0 {
                    let rest = set ^ part;
                    self.fill(part);
                    self.fill(rest);
                    let (left, right) = (self.row(part), self.row(rest));
                    for (node, slot) in cost.iter_mut().enumerate() {
                        let (Some(&l), Some(&r)) = (left.get(node), right.get(node)) else {
                            continue;
                        };
                        if l == UNREACHABLE || r == UNREACHABLE {
                            continue;
                        }
                        // Both halves paid for the shared node.
                        let joined = l + r - self.graph.weight(node);
                        if joined <= self.cap && joined < *slot {
                            *slot = joined;
                        }
                    }
                }
                part = (part - 1) & set;
            }
        }
        self.graph.relax(&mut cost, self.cap);
        self.memo.insert(set, cost);
    }

    /// Fewest satellites from `group` to the building `target`.
    fn reach(&self, group: &Group, target: Target) -> Option<u32> {
        let distance = self.row(target.bit);
        group
            .iter()
            .filter_map(|&n| {
                let d = *distance.get(n)?;
                (d != UNREACHABLE).then(|| d - self.graph.weight(n))
            })
            .min()
    }

    /// Lower bound on the satellites still needed to bring every target
    /// into `group`, or `None` when one of them cannot be reached.
    fn shortfall(&self, group: &Group, targets: &[Target]) -> Option<u32> {
        let mut missing = Vec::new();
        for &t in targets.iter().filter(|t| !group.contains(&t.node)) {
            missing.push((t, self.reach(group, t)?));
        }
        let mut bound = 0;
        for (i, &(near, near_gap)) in missing.iter().enumerate() {
            bound = bound.max(near_gap);
            // The three paths joining the group and two targets cross every
            // satellite at most twice, bar the branch point.
            for &(far, far_gap) in &missing[i + 1..] {
                let between = self.row(near.bit).get(far.node).copied().unwrap_or(UNREACHABLE);
                let between = between.min(near_gap + far_gap);
                bound = bound.max((near_gap + far_gap + between) / 2);
            }
        }
        Some(bound)
    }
}

/// Search context for one player.
#[derive(Debug)]
pub struct FederationSearch<'a, G: HexGrid> {
    grid: &'a G,
    owned: BTreeMap<Hex, u32>,
    excluded: &'a BTreeSet<Hex>,
    budget: u32,
}

impl<'a, G: HexGrid> FederationSearch<'a, G> {
    /// Prepare a search over a player's buildings (`(hex, value)`), with
    /// `budget` tokens for satellites. Hexes in `excluded` are neither used
    /// as buildings nor as satellites.
    #[must_use]
    pub fn new(
        grid: &'a G,
        buildings: &[(Hex, u32)],
        excluded: &'a BTreeSet<Hex>,
        budget: u32,
    ) -> Self {
        Self {
            grid,
            owned: buildings
                .iter()
                .filter(|(h, _)| !excluded.contains(h))
                .copied()
                .collect(),
            excluded,
            budget,
        }
    }

    /// Run every stage and filter the result.
    #[must_use]
    pub fn run(&self) -> Vec<FederationCandidate> {
        let nodes: Vec<(Hex, u32)> = self.owned.iter().map(|(&h, &v)| (h, v)).collect();
        let combinations = value_combinations(&nodes, FEDERATION_COST);
        if combinations.is_empty() {
            return Vec::new();
        }

        let graph = self.cost_graph();
        let terminals: Vec<usize> = nodes
            .iter()
            .filter(|&&(_, value)| value > 0)
            .filter_map(|(hex, _)| graph.index.get(hex).copied())
            .take(MAX_TERMINALS)
            .collect();
        let mut table = SteinerTable::new(&graph, terminals, self.budget.saturating_add(1));

        let mut plans = Vec::new();
        for combination in &combinations {
            let Some(targets) = combination
                .iter()
                .map(|&h| table.target(h))
                .collect::<Option<Vec<Target>>>()
            else {
                continue;
            };
            if let Some(cost) = table.connection_cost(&targets) {
                plans.push((targets, cost));
            }
        }
        let Some(best) = plans
            .iter()
            .map(|&(_, cost)| cost)
            .min()
            .filter(|&cost| cost <= self.budget)
        else {
            debug!(
                buildings = nodes.len(),
                combinations = combinations.len(),
                budget = self.budget,
                "no federation within budget"
            );
            return Vec::new();
        };

        let mut found = BTreeSet::new();
        for (targets, _) in plans.iter().filter(|&&(_, cost)| cost == best) {
            for group in Self::connect(&graph, &table, targets, best) {
                found.insert(graph.candidate(&group));
            }
        }
        let result = pareto_front(found.into_iter().collect());
        debug!(
            buildings = nodes.len(),
            combinations = combinations.len(),
            satellites = best,
            candidates = result.len(),
            budget = self.budget,
            "federation search"
        );
        result
    }

    fn is_satellite_site(&self, hex: Hex) -> bool {
        !self.excluded.contains(&hex)
            && !self.owned.contains_key(&hex)
            && self
                .grid
                .get(hex)
                .is_some_and(|d| d.planet == Planet::Empty && !d.is_occupied())
    }

    fn cost_graph(&self) -> CostGraph {
        let hexes: Vec<Hex> = self
            .grid
            .coordinates()
            .into_iter()
            .filter(|&h| self.owned.contains_key(&h) || self.is_satellite_site(h))
            .collect();
        let index: BTreeMap<Hex, usize> = hexes.iter().enumerate().map(|(i, &h)| (h, i)).collect();
        let owned = hexes.iter().map(|h| self.owned.contains_key(h)).collect();
        let neighbours = hexes
            .iter()
            .map(|&h| {
                self.grid
                    .neighbours(h)
                    .into_iter()
                    .filter_map(|n| index.get(&n).copied())
                    .collect()
            })
            .collect();
        CostGraph {
            hexes,
            index,
            owned,
            neighbours,
        }
    }

    /// Every group with exactly `satellites` satellites holding all
    /// `targets`.
    fn connect(
        graph: &CostGraph,
        table: &SteinerTable<'_>,
        targets: &[Target],
        satellites: u32,
    ) -> Vec<Group> {
        let Some(start) = targets.first() else {
            return Vec::new();
        };
        let mut first = Group::from([start.node]);
        graph.close(&mut first);

        let mut seen = BTreeSet::from([first.clone()]);
        let mut level = vec![first];
        for placed in 0..=satellites {
            let solutions: Vec<Group> = level
                .iter()
                .filter(|g| targets.iter().all(|t| g.contains(&t.node)))
                .cloned()
                .collect();
            if !solutions.is_empty() || placed == satellites {
                return solutions;
            }

            let mut next = Vec::new();
            for group in &level {
                match table.shortfall(group, targets) {
                    Some(missing) if placed + missing <= satellites => {}
                    _ => continue,
                }
                let frontier: BTreeSet<usize> = group
                    .iter()
                    .flat_map(|&n| graph.neighbours[n].iter().copied())
                    .filter(|&n| !graph.owned[n] && !group.contains(&n))
                    .collect();
                for node in frontier {
                    let mut grown = group.clone();
                    grown.insert(node);
                    graph.close(&mut grown);
                    if seen.insert(grown.clone()) {
                        next.push(grown);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            level = next;
        }
        Vec::new()
    }
}

/// Drop dominated candidates and strict supersets; sort the rest.
#[must_use]
pub fn pareto_front(candidates: Vec<FederationCandidate>) -> Vec<FederationCandidate> {
    let mut kept: Vec<FederationCandidate> = candidates
        .iter()
        .filter(|f| {
            !candidates.iter().any(|g| {
                (g.planets < f.planets && g.satellites < f.satellites) || g.is_strict_subset_of(f)
            })
        })
        .cloned()
        .collect();
    kept.sort();
    kept.dedup();
    kept
}

/// Convenience wrapper around [`FederationSearch`].
#[must_use]
pub fn find_federations<G: HexGrid>(
    grid: &G,
    buildings: &[(Hex, u32)],
    excluded: &BTreeSet<Hex>,
    budget: u32,
) -> Vec<FederationCandidate> {
    FederationSearch::new(grid, buildings, excluded, budget).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{MapLayout, SpaceMap};

    fn open_map(width: usize, height: usize) -> SpaceMap {
        let row = "e".repeat(width);
        let rows: Vec<&str> = (0..height).map(|_| row.as_str()).collect();
        SpaceMap::from_layout(&MapLayout::from_rows(&rows))
    }

    #[test]
    fn test_value_combinations() {
        let a = Hex::new(0, 0);
        let b = Hex::new(1, 0);
        let c = Hex::new(2, 0);
        let combos = value_combinations(&[(a, 3), (b, 0), (c, 4)], 7);
        assert_eq!(combos, vec![vec![a, c]]);

        let combos = value_combinations(&[(a, 7), (c, 4)], 7);
        assert_eq!(combos, vec![vec![a]]);

        assert!(value_combinations(&[(a, 3), (c, 3)], 7).is_empty());
    }

    #[test]
    fn test_not_enough_value() {
        let map = open_map(5, 1);
        let buildings = [(Hex::new(0, 0), 3), (Hex::new(2, 0), 3)];
        assert!(find_federations(&map, &buildings, &BTreeSet::new(), 10).is_empty());
    }

    #[test]
    fn test_single_hex_needs_no_satellite() {
        let map = open_map(3, 1);
        let hex = Hex::new(1, 0);
        let found = find_federations(&map, &[(hex, 7)], &BTreeSet::new(), 0);
        assert_eq!(
            found,
            vec![FederationCandidate {
                hexes: vec![hex],
                planets: 1,
                satellites: 0,
            }]
        );
    }

    #[test]
    fn test_adjacent_buildings_join_for_free() {
        let map = open_map(3, 1);
        let buildings = [(Hex::new(0, 0), 4), (Hex::new(1, 0), 3)];
        let found = find_federations(&map, &buildings, &BTreeSet::new(), 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].satellites, 0);
        assert_eq!(found[0].planets, 2);
    }

    #[test]
    fn test_gap_costs_satellites() {
        let map = open_map(6, 1);
        let buildings = [(Hex::new(0, 0), 4), (Hex::new(3, 0), 3)];

        assert!(find_federations(&map, &buildings, &BTreeSet::new(), 1).is_empty());

        let found = find_federations(&map, &buildings, &BTreeSet::new(), 2);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].satellites, 2);
        assert_eq!(found[0].key(), "0,0;1,0;2,0;3,0");
    }

    #[test]
    fn test_dominated_candidate_is_removed() {
        // Reaching the far building takes two satellites and drags the
        // middle one in as well, so the satellite-free pair dominates it.
        let map = open_map(5, 1);
        let buildings = [
            (Hex::new(0, 0), 4),
            (Hex::new(1, 0), 3),
            (Hex::new(4, 0), 4),
        ];
        let found = find_federations(&map, &buildings, &BTreeSet::new(), 5);
        assert!(!found.is_empty());
        for f in &found {
            assert!(
                !found
                    .iter()
                    .any(|g| g.planets < f.planets && g.satellites < f.satellites)
            );
        }
        assert!(found.iter().any(|f| f.key() == "0,0;1,0"));
    }

    #[test]
    fn test_pareto_front_filters() {
        let small = FederationCandidate {
            hexes: vec![Hex::new(0, 0), Hex::new(1, 0)],
            planets: 2,
            satellites: 0,
        };
        let superset = FederationCandidate {
            hexes: vec![Hex::new(0, 0), Hex::new(1, 0), Hex::new(2, 0)],
            planets: 2,
            satellites: 1,
        };
        let dominated = FederationCandidate {
            hexes: vec![Hex::new(5, 0), Hex::new(6, 0), Hex::new(7, 0), Hex::new(8, 0)],
            planets: 3,
            satellites: 1,
        };
        let front = pareto_front(vec![superset, dominated, small.clone()]);
        assert_eq!(front, vec![small]);
    }

    #[test]
    fn test_excluded_hexes_are_skipped() {
        let map = open_map(4, 1);
        let buildings = [(Hex::new(0, 0), 4), (Hex::new(2, 0), 3)];
        let excluded = BTreeSet::from([Hex::new(1, 0)]);
        assert!(find_federations(&map, &buildings, &excluded, 3).is_empty());
    }

    #[test]
    fn test_planets_block_satellites() {
        let map = SpaceMap::from_layout(&MapLayout::from_rows(&["rdr"]));
        let buildings = [(Hex::new(0, 0), 4), (Hex::new(2, 0), 3)];
        assert!(find_federations(&map, &buildings, &BTreeSet::new(), 3).is_empty());
    }

    /// Ten buildings of value one or two spread over an open map, where the
    /// cheapest federation needs eight satellites.
    fn scattered_buildings() -> Vec<(Hex, u32)> {
        [
            ((0, 5), 2),
            ((1, 2), 1),
            ((1, 10), 1),
            ((2, 0), 2),
            ((4, 8), 2),
            ((5, 2), 1),
            ((5, 5), 1),
            ((9, 5), 1),
            ((10, 3), 2),
            ((10, 10), 2),
        ]
        .into_iter()
        .map(|((q, r), value)| (Hex::new(q, r), value))
        .collect()
    }

    #[test]
    fn test_scattered_buildings_finish_quickly() {
        let map = open_map(13, 13);
        let buildings = scattered_buildings();
        let excluded = BTreeSet::new();

        let start = std::time::Instant::now();
        let found = find_federations(&map, &buildings, &excluded, 8);
        let elapsed = start.elapsed();

        assert!(!found.is_empty());
        for f in &found {
            assert_eq!(f.satellites, 8);
            let value: u32 = buildings
                .iter()
                .filter(|(h, _)| f.hexes.contains(h))
                .map(|&(_, v)| v)
                .sum();
            assert!(value >= FEDERATION_COST);
        }
        assert!(elapsed < std::time::Duration::from_secs(10), "search took {elapsed:?}");
    }

    #[test]
    fn test_budget_below_cheapest_finds_nothing() {
        let map = open_map(13, 13);
        let buildings = scattered_buildings();
        let excluded = BTreeSet::new();
        assert!(find_federations(&map, &buildings, &excluded, 7).is_empty());

        // A bigger budget changes nothing once the cheapest count fits.
        let at_eight = find_federations(&map, &buildings, &excluded, 8);
        let at_twelve = find_federations(&map, &buildings, &excluded, 12);
        assert_eq!(at_eight, at_twelve);
    }

    #[test]
    fn test_only_cheapest_satellite_count_is_offered() {
        // 0,0 + 1,0 join for free; 0,0 + 4,0 would need two satellites.
        let map = open_map(6, 1);
        let buildings = [
            (Hex::new(0, 0), 4),
            (Hex::new(1, 0), 3),
            (Hex::new(4, 0), 3),
        ];
        let found = find_federations(&map, &buildings, &BTreeSet::new(), 6);
        assert_eq!(
            found,
            vec![FederationCandidate {
                hexes: vec![Hex::new(0, 0), Hex::new(1, 0)],
                planets: 2,
                satellites: 0,
            }]
        );
    }

    #[test]
    fn test_ties_are_all_kept() {
        // Two buildings two apart on a two-row strip: either middle hex
        // bridges them.
        let map = open_map(3, 2);
        let buildings = [(Hex::new(0, 1), 4), (Hex::new(2, 0), 3)];
        let found = find_federations(&map, &buildings, &BTreeSet::new(), 3);
        let keys: Vec<String> = found.iter().map(FederationCandidate::key).collect();
        assert_eq!(keys, ["0,1;1,0;2,0", "0,1;1,1;2,0"]);
    }
}
