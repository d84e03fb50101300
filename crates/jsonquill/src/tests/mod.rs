
/// Iteration count for quickcheck properties.
fn quickcheck_tests() -> u64 {
    if cfg!(miri) || cfg!(feature = "test-fast") {
        return 10;
    }
    if is_ci::cached() { 10_000 } else { 1_000 }
}
