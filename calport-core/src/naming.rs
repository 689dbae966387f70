//! Collision-free calendar URIs.

use std::collections::HashSet;

/// Return `desired` if it is not taken, otherwise the first free
/// `desired-1`, `desired-2`, ...
///
/// Comparison is exact and case-sensitive. Only reads the snapshot in
/// `existing`, the store still enforces uniqueness when the calendar is
/// created.
pub fn resolve(desired: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(desired) {
        return desired.to_string();
    }

    let mut n: u64 = 1;
    loop {
        let candidate = format!("{}-{}", desired, n);
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
