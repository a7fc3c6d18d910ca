use std::collections::HashSet;
use std::sync::Arc;

use crate::package_system::descriptor::PackageDescriptor;
use crate::package_system::error::PackageSystemError;
use crate::package_system::sort::TopoSort;

struct Frame {
    node: Arc<PackageDescriptor>,
    deps: Vec<Arc<PackageDescriptor>>,
    next: usize,
}

/// Collect every predecessor chain from `start` to another Both-side package
/// that runs through at least one single-side intermediary. The walk is an
/// iterative depth-first traversal with an explicit frame stack; chains never
/// continue past a Both-side node, and nodes already on the current path are
/// skipped (cyclic graphs are reported by the sorter afterwards).
fn find_chains(
    start: &Arc<PackageDescriptor>,
    full: &TopoSort<Arc<PackageDescriptor>>,
) -> Vec<Vec<Arc<PackageDescriptor>>> {
    let mut chains = Vec::new();
    let mut stack = vec![Frame {
        node: start.clone(),
        deps: full.dependencies(start),
        next: 0,
    }];
    let mut on_path: HashSet<Arc<PackageDescriptor>> = HashSet::new();
    on_path.insert(start.clone());

    while let Some(top) = stack.last_mut() {
        if top.next >= top.deps.len() {
            on_path.remove(&top.node);
            stack.pop();
            continue;
        }
        let child = top.deps[top.next].clone();
        top.next += 1;

        if on_path.contains(&child) {
            continue;
        }
        if child.side.is_synced() {
            // Direct Both -> Both references are fine; only chains with a
            // single-side intermediary are unstable.
            if stack.len() >= 2 {
                let mut chain: Vec<_> = stack.iter().map(|frame| frame.node.clone()).collect();
                chain.push(child);
                chains.push(chain);
            }
        } else {
            on_path.insert(child.clone());
            let deps = full.dependencies(&child);
            stack.push(Frame {
                node: child,
                deps,
                next: 0,
            });
        }
    }
    chains
}

/// Prove that the synced (Both-side) subset is safely orderable independent
/// of side-specific packages.
///
/// For each Both-side package M, every Both-side package N reachable in the
/// full graph through a chain of single-side intermediaries must also be a
/// transitive predecessor of M within the synced-only graph; otherwise the
/// two peers of a paired session could compute different relative orders for
/// M and N. All violations are aggregated into a single error.
pub fn check_sync_stability(
    synced: &TopoSort<Arc<PackageDescriptor>>,
    full: &TopoSort<Arc<PackageDescriptor>>,
) -> Result<(), PackageSystemError> {
    let mut issues = Vec::new();
    let mut disabled = Vec::new();

    for pkg in synced.items() {
        let chains = find_chains(pkg, full);
        if chains.is_empty() {
            continue;
        }

        let synced_predecessors = synced.all_dependencies(pkg);
        for chain in chains {
            let Some(target) = chain.last() else {
                continue;
            };
            if !synced_predecessors.contains(target) {
                if !disabled.contains(&pkg.name) {
                    disabled.push(pkg.name.clone());
                }
                issues.push(PackageSystemError::SyncStabilityViolation {
                    package: pkg.name.clone(),
                    target: target.name.clone(),
                    chain: chain.iter().map(|node| node.name.clone()).collect(),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(PackageSystemError::ValidationFailure { issues, disabled })
    }
}
