//! Runtime invariant checks with a configurable strict mode
//!
//! Internal invariants are validated with [`check_invariant!`]. In
//! strict mode a violation panics with file, line, and condition
//! context; otherwise it is logged as an error and execution continues.
//! The mode is process-wide state intended to be set once at startup
//! (strict in tests and debugging sessions, permissive in long-running
//! simulations where a damaged neuron is better dropped than fatal).

use std::sync::atomic::{AtomicBool, Ordering};

static STRICT_CHECKS: AtomicBool = AtomicBool::new(false);

/// Enable or disable strict invariant checking process-wide
///
/// Intended to be called once at startup, before worker threads exist.
pub fn set_strict_checks(strict: bool) {
    STRICT_CHECKS.store(strict, Ordering::Release);
    log::info!("Strict invariant checking {}", if strict { "enabled" } else { "disabled" });
}

/// Whether invariant violations currently panic
pub fn strict_checks() -> bool {
    STRICT_CHECKS.load(Ordering::Acquire)
}

/// Validate an internal invariant
///
/// ```
/// use synfire_storage::check_invariant;
///
/// let len = 3;
/// let cap = 8;
/// check_invariant!(len <= cap, "cache size {} exceeds capacity {}", len, cap);
/// ```
///
/// Evaluates to `true` when the invariant held. On violation, panics in
/// strict mode (with file/line/condition context) or logs an error and
/// evaluates to `false`.
#[macro_export]
macro_rules! check_invariant {
    ($condition:expr, $($message:tt)+) => {{
        let held = $condition;
        if !held {
            if $crate::checks::strict_checks() {
                panic!(
                    "Invariant violated: {} [{}] at {}:{}",
                    format_args!($($message)+),
                    stringify!($condition),
                    file!(),
                    line!()
                );
            }
            log::error!(
                "Invariant violated: {} [{}] at {}:{}",
                format_args!($($message)+),
                stringify!($condition),
                file!(),
                line!()
            );
        }
        held
    }};
}
