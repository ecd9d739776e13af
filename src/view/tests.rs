use super::*;

fn set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_classify_internal_tags() {
    assert_eq!(ViewClass::of(&set(&["int"])), ViewClass::Internal);
    assert_eq!(ViewClass::of(&set(&["internal"])), ViewClass::Internal);
    assert_eq!(ViewClass::of(&set(&["priv"])), ViewClass::Internal);
    assert_eq!(ViewClass::of(&set(&["PRIVATE"])), ViewClass::Internal);
}

#[test]
fn test_classify_external_tags() {
    assert_eq!(ViewClass::of(&set(&["ext"])), ViewClass::External);
    assert_eq!(ViewClass::of(&set(&["external"])), ViewClass::External);
    assert_eq!(ViewClass::of(&set(&["pub"])), ViewClass::External);
    assert_eq!(ViewClass::of(&set(&["Public"])), ViewClass::External);
}

#[test]
fn test_classify_both_and_default() {
    assert_eq!(ViewClass::of(&set(&["int", "ext"])), ViewClass::Both);
    assert_eq!(ViewClass::of(&set(&["default"])), ViewClass::Default);
    assert_eq!(ViewClass::of(&set(&[])), ViewClass::Default);
    // A single tag can carry both markers
    assert_eq!(ViewClass::of(&set(&["int-ext"])), ViewClass::Both);
}

#[test]
fn test_externally_visible() {
    assert!(is_externally_visible(&set(&["ext"])));
    assert!(is_externally_visible(&set(&["int", "ext"])));
    assert!(!is_externally_visible(&set(&["int"])));
    assert!(!is_externally_visible(&set(&["default"])));
}

#[test]
fn test_views_intersect() {
    assert!(views_intersect(&set(&["int", "ext"]), &set(&["ext"])));
    assert!(!views_intersect(&set(&["int"]), &set(&["ext"])));
    // Intersection is on raw tags, not on classification
    assert!(!views_intersect(&set(&["internal"]), &set(&["int"])));
}

#[test]
fn test_normalize_mapped_ipv4() {
    assert_eq!(normalize_mapped_ipv4("::ffff:192.168.1.1"), "192.168.1.1");
    assert_eq!(normalize_mapped_ipv4("::FFFF:10.0.0.5"), "10.0.0.5");
    assert_eq!(normalize_mapped_ipv4("::203.0.113.7"), "203.0.113.7");
    // Untouched forms
    assert_eq!(normalize_mapped_ipv4("192.168.1.1"), "192.168.1.1");
    assert_eq!(normalize_mapped_ipv4("2001:db8::1"), "2001:db8::1");
    assert_eq!(normalize_mapped_ipv4("::1"), "::1");
}

#[test]
fn test_private_ipv4_ranges() {
    assert!(is_private_ip("10.0.0.5"));
    assert!(is_private_ip("172.16.0.1"));
    assert!(is_private_ip("172.31.255.255"));
    assert!(is_private_ip("192.168.0.10"));
    assert!(is_private_ip("127.0.0.1"));
    assert!(is_private_ip("169.254.1.1"));

    assert!(!is_private_ip("172.32.0.1"));
    assert!(!is_private_ip("203.0.113.5"));
    assert!(!is_private_ip("8.8.8.8"));
}

#[test]
fn test_private_ipv6_ranges() {
    assert!(is_private_ip("fc00::1"));
    assert!(is_private_ip("fd12:3456::1"));
    assert!(is_private_ip("fe80::1"));
    assert!(is_private_ip("::1"));

    assert!(!is_private_ip("2001:db8::1"));
    assert!(!is_private_ip("2606:4700::1111"));
}

#[test]
fn test_private_ipv4_mapped_forms() {
    assert!(is_private_ip("::ffff:192.168.1.1"));
    assert!(is_private_ip("::ffff:10.1.2.3"));
    assert!(!is_private_ip("::ffff:203.0.113.5"));
}

#[test]
fn test_unparsable_ip_is_public() {
    assert!(!is_private_ip("not-an-ip"));
    assert!(!is_private_ip(""));
}

use proptest::prelude::*;

proptest! {
    #[test]
    fn test_normalize_idempotent(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
        let mapped = format!("::ffff:{a}.{b}.{c}.{d}");
        let once = normalize_mapped_ipv4(&mapped);
        prop_assert_eq!(normalize_mapped_ipv4(&once), once.clone());
        prop_assert_eq!(once, format!("{a}.{b}.{c}.{d}"));
    }

    #[test]
    fn test_mapped_form_classifies_like_plain(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
        let plain = format!("{a}.{b}.{c}.{d}");
        let mapped = format!("::ffff:{plain}");
        prop_assert_eq!(is_private_ip(&plain), is_private_ip(&mapped));
    }
}
