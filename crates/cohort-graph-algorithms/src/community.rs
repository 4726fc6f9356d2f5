//! Community detection algorithms
//!
//! Louvain modularity optimisation (local moving + aggregation) over a
//! weighted, undirected [`GraphView`].
//!
//! The traversal is fully deterministic: nodes are visited in ascending index
//! order at every level, candidate communities are scanned in ascending id
//! order, and a node only leaves its community for a strictly greater gain.

use super::common::GraphView;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::debug;

/// Louvain configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LouvainConfig {
    /// Resolution parameter (1.0 = classic modularity)
    pub resolution: f64,
    /// Stop a local-moving phase when a full pass improves modularity by less than this
    pub min_gain: f64,
    /// Upper bound on aggregation levels
    pub max_levels: usize,
    /// Upper bound on local-moving passes per level
    pub max_passes: usize,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            min_gain: 1e-7,
            max_levels: 32,
            max_passes: 100,
        }
    }
}

/// Result of the Louvain algorithm
#[derive(Debug, Clone)]
pub struct LouvainResult {
    /// Community id per dense node index
    pub assignment: Vec<usize>,
    /// Modularity of the final partition on the input graph
    pub modularity: f64,
    /// Number of aggregation levels performed
    pub levels: usize,
}

impl LouvainResult {
    /// Number of distinct communities
    pub fn community_count(&self) -> usize {
        self.assignment.iter().max().map_or(0, |m| m + 1)
    }
}

/// Internal multigraph used between aggregation levels.
struct LevelGraph {
    /// Positive, non-loop edges; symmetric
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Self-loop weight per node
    loops: Vec<f64>,
    /// Weighted degree (loops counted twice)
    degrees: Vec<f64>,
    /// Total edge weight `m`
    total_weight: f64,
}

impl LevelGraph {
    fn from_view(view: &GraphView) -> Self {
        let n = view.node_count;
        let mut adjacency = vec![Vec::new(); n];
        let mut loops = vec![0.0; n];

        for u in 0..n {
            for (v, w) in view.weighted_neighbors(u) {
                // Negative and NaN weights carry no modularity meaning
                if !(w > 0.0) || !w.is_finite() {
                    continue;
                }
                if u == v {
                    loops[u] += w;
                } else {
                    adjacency[u].push((v, w));
                }
            }
        }

        Self::with_loops(adjacency, loops)
    }

    fn with_loops(adjacency: Vec<Vec<(usize, f64)>>, loops: Vec<f64>) -> Self {
        let degrees: Vec<f64> = adjacency
            .iter()
            .zip(&loops)
            .map(|(row, l)| row.iter().map(|(_, w)| w).sum::<f64>() + 2.0 * l)
            .collect();
        let total_weight = degrees.iter().sum::<f64>() / 2.0;

        LevelGraph {
            adjacency,
            loops,
            degrees,
            total_weight,
        }
    }

    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Collapse every community into a single node carrying its internal weight as a self-loop.
    fn aggregate(&self, community: &[usize], community_count: usize) -> Self {
        let mut loops = vec![0.0; community_count];
        let mut merged: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); community_count];

        for (u, row) in self.adjacency.iter().enumerate() {
            let cu = community[u];
            loops[cu] += self.loops[u];
            for &(v, w) in row {
                let cv = community[v];
                if cu == cv {
                    // seen once from each endpoint
                    loops[cu] += w / 2.0;
                } else {
                    *merged[cu].entry(cv).or_insert(0.0) += w;
                }
            }
        }

        let adjacency = merged
            .into_iter()
            .map(|row| row.into_iter().collect())
            .collect();
        Self::with_loops(adjacency, loops)
    }

    fn modularity(&self, community: &[usize], resolution: f64) -> f64 {
        let m = self.total_weight;
        if m <= 0.0 {
            return 0.0;
        }

        let n = self.node_count();
        let mut internal = vec![0.0; n];
        let mut totals = vec![0.0; n];

        for u in 0..n {
            let cu = community[u];
            totals[cu] += self.degrees[u];
            internal[cu] += self.loops[u];
            for &(v, w) in &self.adjacency[u] {
                if community[v] == cu {
                    internal[cu] += w / 2.0;
                }
            }
        }

        internal
            .iter()
            .zip(&totals)
            .map(|(&l_c, &d_c)| l_c / m - resolution * (d_c / (2.0 * m)).powi(2))
            .sum()
    }
}

#[inline]
fn move_gain(k_in: f64, community_total: f64, k_i: f64, m2: f64, resolution: f64) -> f64 {
    k_in - resolution * community_total * k_i / m2
}

/// Greedy local-moving phase. Returns the community of every node and whether any node moved.
fn local_moving(graph: &LevelGraph, config: &LouvainConfig) -> (Vec<usize>, bool) {
    let n = graph.node_count();
    let mut community: Vec<usize> = (0..n).collect();
    let m2 = 2.0 * graph.total_weight;

    if m2 <= 0.0 {
        return (community, false);
    }

    let mut totals = graph.degrees.clone();
    let mut moved_any = false;
    let mut current = graph.modularity(&community, config.resolution);

    for pass in 0..config.max_passes {
        let mut moved = false;

        for node in 0..n {
            let own = community[node];
            let k_i = graph.degrees[node];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for &(v, w) in &graph.adjacency[node] {
                *links.entry(community[v]).or_insert(0.0) += w;
            }

            totals[own] -= k_i;

            let own_links = links.get(&own).copied().unwrap_or(0.0);
            let mut best = own;
            let mut best_gain = move_gain(own_links, totals[own], k_i, m2, config.resolution);

            for (&candidate, &k_in) in &links {
                if candidate == own {
                    continue;
                }
                let gain = move_gain(k_in, totals[candidate], k_i, m2, config.resolution);
                if gain > best_gain {
                    best = candidate;
                    best_gain = gain;
                }
            }

            totals[best] += k_i;
            if best != own {
                community[node] = best;
                moved = true;
                moved_any = true;
            }
        }

        if !moved {
            break;
        }

        let next = graph.modularity(&community, config.resolution);
        debug!(pass, modularity = next, "Louvain local-moving pass");
        if next - current < config.min_gain {
            break;
        }
        current = next;
    }

    (community, moved_any)
}

/// Relabel communities densely (0..k) in order of first appearance.
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: FxHashMap<usize, usize> = FxHashMap::default();
    let relabelled = community
        .iter()
        .map(|c| {
            let next = mapping.len();
            *mapping.entry(*c).or_insert(next)
        })
        .collect();
    (relabelled, mapping.len())
}

/// Louvain community detection
///
/// Partitions the graph so as to (locally) maximise modularity. Only positive,
/// finite edge weights participate.
pub fn louvain(view: &GraphView, config: &LouvainConfig) -> LouvainResult {
    let base = LevelGraph::from_view(view);
    let mut graph = LevelGraph::from_view(view);
    let mut assignment: Vec<usize> = (0..view.node_count).collect();
    let mut levels = 0;

    while levels < config.max_levels {
        let (community, moved) = local_moving(&graph, config);
        if !moved {
            break;
        }

        let (community, count) = renumber(&community);
        for slot in assignment.iter_mut() {
            *slot = community[*slot];
        }
        graph = graph.aggregate(&community, count);
        levels += 1;

        debug!(level = levels, communities = count, "Louvain aggregation complete");
    }

    let (assignment, _) = renumber(&assignment);
    let modularity = base.modularity(&assignment, config.resolution);

    LouvainResult {
        assignment,
        modularity,
        levels,
    }
}

/// Modularity of an arbitrary assignment (community id per dense index) on `view`.
pub fn modularity(view: &GraphView, assignment: &[usize], resolution: f64) -> f64 {
    let (assignment, _) = renumber(assignment);
    LevelGraph::from_view(view).modularity(&assignment, resolution)
}
