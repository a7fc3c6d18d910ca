// crates/quarry-core/src/package_system/tests/stability_tests.rs
#![cfg(test)]

use std::sync::Arc;

use semver::Version;

use crate::package_system::dependency::DependencyRef;
use crate::package_system::descriptor::{DescriptorBuilder, PackageDescriptor, Side};
use crate::package_system::error::PackageSystemError;
use crate::package_system::sort::{build_sort, resolve_load_order};
use crate::package_system::stability::check_sync_stability;

fn pkg(name: &str, side: Side, deps: &[&str]) -> Arc<PackageDescriptor> {
    let mut builder = DescriptorBuilder::new(name, Version::new(1, 0, 0), side);
    for dep in deps {
        builder = builder.dependency(DependencyRef::required_any(dep));
    }
    Arc::new(builder.build())
}

fn check(candidates: Vec<Arc<PackageDescriptor>>) -> Result<(), PackageSystemError> {
    let mut sorted = candidates;
    sorted.sort();
    let synced_items: Vec<_> = sorted
        .iter()
        .filter(|p| p.side.is_synced())
        .cloned()
        .collect();
    let synced = build_sort(&synced_items, false);
    let full = build_sort(&sorted, false);
    check_sync_stability(&synced, &full)
}

#[test]
fn test_indirect_chain_through_single_side_package_is_unstable() {
    // A (Both) -> B (ClientOnly) -> C (Both), with no direct A -> C edge:
    // the server peer has no B, so the two peers could order A and C
    // differently.
    let a = pkg("A", Side::Both, &["B"]);
    let b = pkg("B", Side::Client, &["C"]);
    let c = pkg("C", Side::Both, &[]);

    let err = check(vec![a, b, c]).unwrap_err();
    match err {
        PackageSystemError::ValidationFailure { issues, disabled } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(disabled, vec!["A".to_string()]);
            match &issues[0] {
                PackageSystemError::SyncStabilityViolation {
                    package,
                    target,
                    chain,
                } => {
                    assert_eq!(package, "A");
                    assert_eq!(target, "C");
                    assert_eq!(chain, &["A".to_string(), "B".to_string(), "C".to_string()]);
                }
                other => panic!("expected SyncStabilityViolation, got {:?}", other),
            }
        }
        other => panic!("expected ValidationFailure, got {:?}", other),
    }
}

#[test]
fn test_direct_synced_dependency_stabilizes_the_chain() {
    let a = pkg("A", Side::Both, &["B", "C"]);
    let b = pkg("B", Side::Client, &["C"]);
    let c = pkg("C", Side::Both, &[]);

    assert!(check(vec![a, b, c]).is_ok());
}

#[test]
fn test_direct_both_to_both_reference_is_fine() {
    let a = pkg("A", Side::Both, &["C"]);
    let c = pkg("C", Side::Both, &[]);

    assert!(check(vec![a, c]).is_ok());
}

#[test]
fn test_chain_through_two_single_side_packages() {
    let a = pkg("A", Side::Both, &["B"]);
    let b = pkg("B", Side::Server, &["D"]);
    let d = pkg("D", Side::Server, &["E"]);
    let e = pkg("E", Side::Both, &[]);

    let err = check(vec![a, b, d, e]).unwrap_err();
    match err {
        PackageSystemError::ValidationFailure { issues, .. } => match &issues[0] {
            PackageSystemError::SyncStabilityViolation { chain, .. } => {
                assert_eq!(
                    chain,
                    &["A".to_string(), "B".to_string(), "D".to_string(), "E".to_string()]
                );
            }
            other => panic!("expected SyncStabilityViolation, got {:?}", other),
        },
        other => panic!("expected ValidationFailure, got {:?}", other),
    }
}

#[test]
fn test_single_side_only_chains_are_ignored() {
    // Chains that never reach another Both package cannot destabilize.
    let a = pkg("A", Side::Both, &["B"]);
    let b = pkg("B", Side::Client, &["D"]);
    let d = pkg("D", Side::Client, &[]);

    assert!(check(vec![a, b, d]).is_ok());
}

#[test]
fn test_multiple_violations_are_aggregated() {
    let a = pkg("A", Side::Both, &["Ca"]);
    let ca = pkg("Ca", Side::Client, &["Z"]);
    let b = pkg("B", Side::Both, &["Cb"]);
    let cb = pkg("Cb", Side::Client, &["Z"]);
    let z = pkg("Z", Side::Both, &[]);

    let err = check(vec![a, ca, b, cb, z]).unwrap_err();
    match err {
        PackageSystemError::ValidationFailure { issues, disabled } => {
            assert_eq!(issues.len(), 2);
            assert_eq!(disabled.len(), 2);
            assert!(disabled.contains(&"A".to_string()));
            assert!(disabled.contains(&"B".to_string()));
        }
        other => panic!("expected ValidationFailure, got {:?}", other),
    }
}

#[test]
fn test_resolve_load_order_surfaces_stability_violations() {
    let a = pkg("A", Side::Both, &["B"]);
    let b = pkg("B", Side::Client, &["C"]);
    let c = pkg("C", Side::Both, &[]);

    let err = resolve_load_order(&[a, b, c], false).unwrap_err();
    assert!(matches!(
        err,
        PackageSystemError::ValidationFailure { .. }
    ));
}

#[test]
fn test_cyclic_single_side_chain_terminates() {
    // B and D reference each other; the checker must terminate and leave
    // cycle reporting to the sorter.
    let a = pkg("A", Side::Both, &["B"]);
    let b = pkg("B", Side::Client, &["D"]);
    let d = pkg("D", Side::Client, &["B", "E"]);
    let e = pkg("E", Side::Both, &[]);

    let err = check(vec![a, b, d, e]).unwrap_err();
    assert!(matches!(
        err,
        PackageSystemError::ValidationFailure { .. }
    ));
}
