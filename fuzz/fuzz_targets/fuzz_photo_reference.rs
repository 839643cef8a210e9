//! Fuzz target: `reference::resolve`
//!
//! Drives arbitrary capture results (bare URLs, broken JSON documents,
//! non-UTF-8 garbage) through the resolver and asserts that it never
//! panics and only ever yields locators that pass its own usability rule.
//!
//! cargo fuzz run fuzz_photo_reference

#![no_main]

use homewatch::relay::reference::{self, host_of, is_private_host};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let _ = is_private_host(host_of(&input));

    let resolved = reference::resolve(Some(&input));
    if let Some(loc) = resolved.locator() {
        assert!(loc.is_usable(), "locator() returned an unusable locator");
        assert!(!host_of(&loc.url).is_empty(), "usable locator without a host");
        assert_eq!(loc.private, is_private_host(host_of(&loc.url)));
    }
});
