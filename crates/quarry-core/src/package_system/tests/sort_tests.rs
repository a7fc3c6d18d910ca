// crates/quarry-core/src/package_system/tests/sort_tests.rs
#![cfg(test)]

use std::sync::Arc;

use semver::Version;

use crate::package_system::dependency::DependencyRef;
use crate::package_system::descriptor::{DescriptorBuilder, PackageDescriptor, Side};
use crate::package_system::error::PackageSystemError;
use crate::package_system::sort::{build_sort, resolve_load_order, TopoSort};

fn pkg(name: &str) -> Arc<PackageDescriptor> {
    Arc::new(DescriptorBuilder::new(name, Version::new(1, 0, 0), Side::Both).build())
}

fn pkg_sided(name: &str, side: Side) -> Arc<PackageDescriptor> {
    Arc::new(DescriptorBuilder::new(name, Version::new(1, 0, 0), side).build())
}

fn names(order: &[Arc<PackageDescriptor>]) -> Vec<&str> {
    order.iter().map(|p| p.name.as_str()).collect()
}

// --- Generic TopoSort ---

#[test]
fn test_toposort_no_edges_preserves_input_order() {
    let sort = TopoSort::new(vec!["a", "b", "c"], |_| Vec::new(), |_| Vec::new());
    assert_eq!(sort.sort().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_toposort_respects_after_edges() {
    // "a" must come after "c"
    let sort = TopoSort::new(
        vec!["a", "b", "c"],
        |item| if *item == "a" { vec!["c"] } else { Vec::new() },
        |_| Vec::new(),
    );
    assert_eq!(sort.sort().unwrap(), vec!["b", "c", "a"]);
}

#[test]
fn test_toposort_respects_before_edges() {
    // "c" must come before "a"
    let sort = TopoSort::new(
        vec!["a", "b", "c"],
        |_| Vec::new(),
        |item| if *item == "c" { vec!["a"] } else { Vec::new() },
    );
    assert_eq!(sort.sort().unwrap(), vec!["b", "c", "a"]);
}

#[test]
fn test_toposort_ignores_dangling_edges() {
    let sort = TopoSort::new(
        vec!["a", "b"],
        |item| if *item == "a" { vec!["ghost"] } else { Vec::new() },
        |_| Vec::new(),
    );
    assert_eq!(sort.sort().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_toposort_cycle_names_stuck_set() {
    let sort = TopoSort::new(
        vec!["a", "b", "c"],
        |item| match *item {
            "a" => vec!["b"],
            "b" => vec!["a"],
            _ => Vec::new(),
        },
        |_| Vec::new(),
    );
    let err = sort.sort().unwrap_err();
    assert_eq!(err.set, vec!["a", "b"]);
}

#[test]
fn test_toposort_add_edge() {
    let mut sort = TopoSort::new(vec!["a", "b", "c"], |_| Vec::new(), |_| Vec::new());
    sort.add_edge(&"c", &"a");
    assert_eq!(sort.sort().unwrap(), vec!["b", "c", "a"]);
}

#[test]
fn test_toposort_dependencies_and_all_dependencies() {
    let sort = TopoSort::new(
        vec!["a", "b", "c"],
        |item| match *item {
            "a" => vec!["b"],
            "b" => vec!["c"],
            _ => Vec::new(),
        },
        |_| Vec::new(),
    );
    assert_eq!(sort.dependencies(&"a"), vec!["b"]);

    let transitive = sort.all_dependencies(&"a");
    assert!(transitive.contains("b"));
    assert!(transitive.contains("c"));
    assert_eq!(transitive.len(), 2);
}

// --- Descriptor-level resolution ---

#[test]
fn test_resolve_orders_dependency_before_dependent() {
    let core = pkg("CoreLib");
    let addon = Arc::new(
        DescriptorBuilder::new("Addon", Version::new(1, 0, 0), Side::Both)
            .dependency(DependencyRef::required_any("CoreLib"))
            .build(),
    );
    // Alphabetically Addon would come first; the strong dependency wins.
    let order = resolve_load_order(&[addon, core], false).unwrap();
    assert_eq!(names(&order), vec!["CoreLib", "Addon"]);
}

#[test]
fn test_resolve_alphabetical_tie_break() {
    let order = resolve_load_order(&[pkg("Cherry"), pkg("Apple"), pkg("Banana")], false).unwrap();
    assert_eq!(names(&order), vec!["Apple", "Banana", "Cherry"]);
}

#[test]
fn test_resolve_is_deterministic_across_input_orders() {
    let build = |names: &[&str]| -> Vec<Arc<PackageDescriptor>> {
        names
            .iter()
            .map(|n| {
                if *n == "Mid" {
                    Arc::new(
                        DescriptorBuilder::new("Mid", Version::new(1, 0, 0), Side::Both)
                            .load_after("Zed")
                            .build(),
                    )
                } else {
                    pkg(n)
                }
            })
            .collect()
    };
    let first = resolve_load_order(&build(&["Mid", "Ant", "Zed"]), false).unwrap();
    let second = resolve_load_order(&build(&["Zed", "Mid", "Ant"]), false).unwrap();
    assert_eq!(names(&first), names(&second));
}

#[test]
fn test_resolve_topological_soundness() {
    let a = Arc::new(
        DescriptorBuilder::new("A", Version::new(1, 0, 0), Side::Both)
            .dependency(DependencyRef::required_any("D"))
            .build(),
    );
    let b = Arc::new(
        DescriptorBuilder::new("B", Version::new(1, 0, 0), Side::Both)
            .load_after("A")
            .build(),
    );
    let c = Arc::new(
        DescriptorBuilder::new("C", Version::new(1, 0, 0), Side::Both)
            .load_before("A")
            .build(),
    );
    let d = pkg("D");

    let candidates = vec![a, b, c, d];
    let order = resolve_load_order(&candidates, false).unwrap();
    let position =
        |name: &str| order.iter().position(|p| p.name == name).expect("present");

    assert!(position("D") < position("A"));
    assert!(position("A") < position("B"));
    assert!(position("C") < position("A"));
}

#[test]
fn test_resolve_cycle_fails_with_both_names() {
    let a = Arc::new(
        DescriptorBuilder::new("A", Version::new(1, 0, 0), Side::Both)
            .load_before("B")
            .build(),
    );
    let b = Arc::new(
        DescriptorBuilder::new("B", Version::new(1, 0, 0), Side::Both)
            .load_before("A")
            .build(),
    );
    let err = resolve_load_order(&[a, b], false).unwrap_err();
    match err {
        PackageSystemError::CyclicOrdering(set) => {
            assert_eq!(set, vec!["A".to_string(), "B".to_string()]);
        }
        other => panic!("expected CyclicOrdering, got {:?}", other),
    }
}

#[test]
fn test_resolve_dangling_hint_is_ignored() {
    let a = Arc::new(
        DescriptorBuilder::new("A", Version::new(1, 0, 0), Side::Both)
            .load_after("NotInstalled")
            .build(),
    );
    let order = resolve_load_order(&[a, pkg("B")], false).unwrap();
    assert_eq!(names(&order), vec!["A", "B"]);
}

#[test]
fn test_weak_reference_orders_only_in_include_weak_mode() {
    let a = Arc::new(
        DescriptorBuilder::new("Apple", Version::new(1, 0, 0), Side::Both)
            .dependency(DependencyRef::weak("Zed"))
            .build(),
    );
    let z = pkg("Zed");

    let default_order = resolve_load_order(&[a.clone(), z.clone()], false).unwrap();
    assert_eq!(names(&default_order), vec!["Apple", "Zed"]);

    let weak_order = resolve_load_order(&[a, z], true).unwrap();
    assert_eq!(names(&weak_order), vec!["Zed", "Apple"]);
}

#[test]
fn test_resolve_splices_synced_order_into_full_graph() {
    // The synced pair keeps its relative order even though a client-only
    // package pushes one of them later alphabetically.
    let first = pkg_sided("Delta", Side::Both);
    let second = Arc::new(
        DescriptorBuilder::new("Echo", Version::new(1, 0, 0), Side::Both)
            .dependency(DependencyRef::required_any("Delta"))
            .build(),
    );
    let client = pkg_sided("Alpha", Side::Client);

    let order = resolve_load_order(&[second.clone(), client, first.clone()], false).unwrap();
    let position =
        |name: &str| order.iter().position(|p| p.name == name).expect("present");
    assert!(position("Delta") < position("Echo"));
    assert_eq!(order.len(), 3);
}

#[test]
fn test_build_sort_edges_are_case_insensitive() {
    let a = Arc::new(
        DescriptorBuilder::new("Addon", Version::new(1, 0, 0), Side::Both)
            .dependency(DependencyRef::required_any("corelib"))
            .build(),
    );
    let core = pkg("CoreLib");
    let sorted = vec![a.clone(), core.clone()];
    let sort = build_sort(&sorted, false);
    assert_eq!(sort.dependencies(&a), vec![core]);
}
