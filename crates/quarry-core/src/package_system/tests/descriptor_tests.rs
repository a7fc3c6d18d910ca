// crates/quarry-core/src/package_system/tests/descriptor_tests.rs
#![cfg(test)]

use std::collections::HashSet;
use std::path::Path;
use std::time::SystemTime;

use semver::Version;

use crate::package_system::descriptor::{
    DescriptorBuilder, HostSide, PackageDescriptor, Side,
};

fn parse(json: &str) -> Result<PackageDescriptor, crate::package_system::error::PackageSystemError> {
    PackageDescriptor::parse_header(
        Path::new("/packs/test.pack.json"),
        json.as_bytes(),
        SystemTime::UNIX_EPOCH,
    )
}

#[test]
fn test_parse_full_header() {
    let descriptor = parse(
        r#"{
            "name": "OreExpansion",
            "version": "1.4.2+nightly",
            "hostVersion": "0.4.0",
            "side": "both",
            "dependencies": [
                {"name": "CoreLib", "minVersion": "2.0"},
                {"name": "UtilKit"}
            ],
            "weakDependencies": ["MapTweaks"],
            "loadAfter": ["BiomeKit"],
            "loadBefore": ["LateOverhaul"],
            "hash": "0000000000000000000000000000000000000000000000000000000000000000",
            "signature": "deadbeef"
        }"#,
    )
    .unwrap();

    assert_eq!(descriptor.name, "OreExpansion");
    assert_eq!(
        (descriptor.version.major, descriptor.version.minor, descriptor.version.patch),
        (1, 4, 2)
    );
    assert_eq!(descriptor.side, Side::Both);
    assert_eq!(descriptor.host_version, Some(Version::new(0, 4, 0)));
    assert_eq!(descriptor.dependencies.len(), 3);
    assert_eq!(descriptor.load_after, vec!["BiomeKit"]);
    assert_eq!(descriptor.load_before, vec!["LateOverhaul"]);
    assert_eq!(descriptor.signature.as_deref(), Some(&[0xde, 0xad, 0xbe, 0xef][..]));

    let strong: Vec<&str> = descriptor.strong_refs().map(|d| d.name.as_str()).collect();
    assert_eq!(strong, vec!["CoreLib", "UtilKit"]);
    assert_eq!(
        descriptor.strong_refs().next().unwrap().min_version,
        Some(Version::new(2, 0, 0))
    );
}

#[test]
fn test_parse_defaults() {
    let descriptor = parse(r#"{"name": "Tiny", "version": "1.0"}"#).unwrap();
    assert_eq!(descriptor.side, Side::Both);
    assert!(descriptor.dependencies.is_empty());
    assert_eq!(descriptor.hash, [0u8; 32]);
    assert!(descriptor.signature.is_none());
    assert!(descriptor.host_version.is_none());
    assert_eq!(descriptor.declared_host_version(), "<unspecified>");
}

#[test]
fn test_parse_rejects_malformed_json() {
    assert!(parse("not json").is_err());
}

#[test]
fn test_parse_rejects_bad_version() {
    assert!(parse(r#"{"name": "Bad", "version": "one"}"#).is_err());
}

#[test]
fn test_parse_rejects_short_hash() {
    assert!(parse(r#"{"name": "Bad", "version": "1.0", "hash": "abcd"}"#).is_err());
}

#[test]
fn test_weak_dependencies_are_not_required() {
    let descriptor = parse(
        r#"{"name": "A", "version": "1.0", "weakDependencies": ["B"]}"#,
    )
    .unwrap();
    let weak = &descriptor.dependencies[0];
    assert!(!weak.required);
    assert!(weak.min_version.is_none());
}

#[test]
fn test_refs_respects_include_weak() {
    let descriptor = parse(
        r#"{
            "name": "A",
            "version": "1.0",
            "dependencies": [{"name": "Strong"}],
            "weakDependencies": ["Weak"]
        }"#,
    )
    .unwrap();

    let default_refs: Vec<&str> = descriptor.refs(false).map(|d| d.name.as_str()).collect();
    assert_eq!(default_refs, vec!["Strong"]);

    let weak_refs: Vec<&str> = descriptor.refs(true).map(|d| d.name.as_str()).collect();
    assert_eq!(weak_refs, vec!["Strong", "Weak"]);
}

#[test]
fn test_ordered_after_combines_hints_and_refs() {
    let descriptor = parse(
        r#"{
            "name": "A",
            "version": "1.0",
            "dependencies": [{"name": "Strong"}],
            "weakDependencies": ["Weak"],
            "loadAfter": ["Hint"]
        }"#,
    )
    .unwrap();

    let after: Vec<&str> = descriptor.ordered_after(false).collect();
    assert_eq!(after, vec!["Hint", "Strong"]);

    let after_weak: Vec<&str> = descriptor.ordered_after(true).collect();
    assert_eq!(after_weak, vec!["Hint", "Strong", "Weak"]);
}

#[test]
fn test_identity_is_case_insensitive() {
    let a = DescriptorBuilder::new("OreExpansion", Version::new(1, 0, 0), Side::Both).build();
    let b = DescriptorBuilder::new("oreexpansion", Version::new(2, 0, 0), Side::Client).build();
    assert_eq!(a, b);

    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn test_ordering_is_case_insensitive() {
    let mut names = vec![
        DescriptorBuilder::new("beta", Version::new(1, 0, 0), Side::Both).build(),
        DescriptorBuilder::new("Alpha", Version::new(1, 0, 0), Side::Both).build(),
        DescriptorBuilder::new("GAMMA", Version::new(1, 0, 0), Side::Both).build(),
    ];
    names.sort();
    let sorted: Vec<&str> = names.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(sorted, vec!["Alpha", "beta", "GAMMA"]);
}

#[test]
fn test_side_loads_on() {
    assert!(Side::Both.loads_on(HostSide::Client));
    assert!(Side::Both.loads_on(HostSide::Server));
    assert!(Side::Client.loads_on(HostSide::Client));
    assert!(!Side::Client.loads_on(HostSide::Server));
    assert!(Side::Server.loads_on(HostSide::Server));
    assert!(!Side::Server.loads_on(HostSide::Client));
}

#[test]
fn test_side_is_synced() {
    assert!(Side::Both.is_synced());
    assert!(!Side::Client.is_synced());
    assert!(!Side::Server.is_synced());
}
