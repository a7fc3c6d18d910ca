use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use crate::package_system::descriptor::PackageDescriptor;
use crate::package_system::error::PackageSystemError;
use crate::package_system::stability::check_sync_stability;

/// A cycle was found; names the set of nodes that could not be ordered.
#[derive(Debug)]
pub struct CycleError<T> {
    pub set: Vec<T>,
}

/// Generic precedence-constraint graph with a deterministic topological sort.
///
/// Nodes keep their input order; the sorter repeatedly selects the earliest
/// input node with no unsatisfied predecessor, so a caller that pre-sorts its
/// nodes alphabetically gets an alphabetical tie-break. Edges whose endpoints
/// are not both graphed are ignored rather than rejected.
pub struct TopoSort<T: Clone + Eq + Hash> {
    items: Vec<T>,
    index: HashMap<T, usize>,
    predecessors: Vec<BTreeSet<usize>>,
    successors: Vec<BTreeSet<usize>>,
}

impl<T: Clone + Eq + Hash> TopoSort<T> {
    /// Build the graph. `after(n)` yields nodes that must precede `n`;
    /// `before(n)` yields nodes that `n` must precede.
    pub fn new<FA, FB, IA, IB>(items: Vec<T>, after: FA, before: FB) -> Self
    where
        FA: Fn(&T) -> IA,
        FB: Fn(&T) -> IB,
        IA: IntoIterator<Item = T>,
        IB: IntoIterator<Item = T>,
    {
        let index: HashMap<T, usize> = items
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, item)| (item, i))
            .collect();
        let mut graph = Self {
            predecessors: vec![BTreeSet::new(); items.len()],
            successors: vec![BTreeSet::new(); items.len()],
            items,
            index,
        };
        for i in 0..graph.items.len() {
            for pred in after(&graph.items[i]) {
                if let Some(&p) = graph.index.get(&pred) {
                    graph.link(p, i);
                }
            }
            for succ in before(&graph.items[i]) {
                if let Some(&s) = graph.index.get(&succ) {
                    graph.link(i, s);
                }
            }
        }
        graph
    }

    fn link(&mut self, first: usize, second: usize) {
        if first != second {
            self.predecessors[second].insert(first);
            self.successors[first].insert(second);
        }
    }

    /// Inject an extra precedence edge between two already-graphed nodes:
    /// `first` precedes `second`. Unknown endpoints are ignored.
    pub fn add_edge(&mut self, first: &T, second: &T) {
        if let (Some(&f), Some(&s)) = (self.index.get(first), self.index.get(second)) {
            self.link(f, s);
        }
    }

    /// The graphed nodes, in input order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Direct predecessors of `item`, in input order.
    pub fn dependencies(&self, item: &T) -> Vec<T> {
        match self.index.get(item) {
            Some(&i) => self.predecessors[i]
                .iter()
                .map(|&p| self.items[p].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Transitive predecessors of `item` (iterative walk).
    pub fn all_dependencies(&self, item: &T) -> HashSet<T> {
        let mut reached = HashSet::new();
        let mut pending: Vec<usize> = match self.index.get(item) {
            Some(&i) => self.predecessors[i].iter().copied().collect(),
            None => return reached,
        };
        let mut seen: HashSet<usize> = pending.iter().copied().collect();
        while let Some(i) = pending.pop() {
            reached.insert(self.items[i].clone());
            for &p in &self.predecessors[i] {
                if seen.insert(p) {
                    pending.push(p);
                }
            }
        }
        reached
    }

    /// Stable topological sort (Kahn's algorithm). Fails with the set of
    /// unordered nodes when no eligible node remains.
    pub fn sort(&self) -> Result<Vec<T>, CycleError<T>> {
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(BTreeSet::len).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(i, _)| i)
            .collect();

        let mut sorted = Vec::with_capacity(self.items.len());
        let mut emitted = vec![false; self.items.len()];
        while let Some(i) = ready.pop_first() {
            emitted[i] = true;
            sorted.push(self.items[i].clone());
            for &s in &self.successors[i] {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    ready.insert(s);
                }
            }
        }

        if sorted.len() == self.items.len() {
            Ok(sorted)
        } else {
            // Name the stuck set; no attempt at a precise cycle path.
            let set = self
                .items
                .iter()
                .enumerate()
                .filter(|(i, _)| !emitted[*i])
                .map(|(_, item)| item.clone())
                .collect();
            Err(CycleError { set })
        }
    }
}

/// Build the ordering graph over pre-sorted candidates. Edges come from
/// strong dependencies (dependency precedes dependent) and explicit hints,
/// restricted to in-set endpoints; weak references contribute edges only in
/// include-weak mode.
pub fn build_sort(
    candidates: &[Arc<PackageDescriptor>],
    include_weak: bool,
) -> TopoSort<Arc<PackageDescriptor>> {
    let by_name: HashMap<String, Arc<PackageDescriptor>> = candidates
        .iter()
        .map(|pkg| (pkg.name.to_ascii_lowercase(), pkg.clone()))
        .collect();
    TopoSort::new(
        candidates.to_vec(),
        |pkg| {
            pkg.ordered_after(include_weak)
                .filter_map(|name| by_name.get(&name.to_ascii_lowercase()).cloned())
                .collect::<Vec<_>>()
        },
        |pkg| {
            pkg.ordered_before()
                .filter_map(|name| by_name.get(&name.to_ascii_lowercase()).cloned())
                .collect::<Vec<_>>()
        },
    )
}

fn cycle_error(e: CycleError<Arc<PackageDescriptor>>) -> PackageSystemError {
    PackageSystemError::CyclicOrdering(e.set.iter().map(|pkg| pkg.name.clone()).collect())
}

/// Compute the deterministic load order for a candidate set.
///
/// Candidates are pre-sorted alphabetically to fix the tie-break, the synced
/// (Both-side) subgraph is ordered first and checked for synchronization
/// stability against the full graph, and the synced order is then spliced
/// into the full graph as injected precedence edges before the final sort.
pub fn resolve_load_order(
    candidates: &[Arc<PackageDescriptor>],
    include_weak: bool,
) -> Result<Vec<Arc<PackageDescriptor>>, PackageSystemError> {
    let mut pre_sorted = candidates.to_vec();
    pre_sorted.sort();

    let synced_items: Vec<_> = pre_sorted
        .iter()
        .filter(|pkg| pkg.side.is_synced())
        .cloned()
        .collect();
    let synced = build_sort(&synced_items, include_weak);
    let mut full = build_sort(&pre_sorted, include_weak);

    check_sync_stability(&synced, &full)?;

    let synced_order = synced.sort().map_err(cycle_error)?;
    for pair in synced_order.windows(2) {
        full.add_edge(&pair[0], &pair[1]);
    }
    full.sort().map_err(cycle_error)
}
