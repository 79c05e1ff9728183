//! Wall-clock helpers.

use std::time::Duration;

/// Round a duration up to whole seconds.
///
/// A cooldown with 1ms left still reports one remaining second; zero stays zero.
pub fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
