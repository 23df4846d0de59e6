// Log output setup

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber filtered by `filter` (RUST_LOG syntax).
///
/// An invalid filter falls back to `info`. Returns false when a global
/// subscriber was already installed.
pub fn init_tracing(filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // Whichever call wins, a subscriber is installed after this one
        let _ = init_tracing("accommodation_search=debug");
        assert!(!init_tracing("info"));
        assert!(!init_tracing("[not a filter"));
    }
}
