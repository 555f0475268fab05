//! Process-wide logging setup for the storefront binaries and tests.

/// Initialize JSON logging, filtered by `RUST_LOG`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filter, JSON layer).
pub mod tracing;
