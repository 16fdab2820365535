//! Server-side filter configuration.

/// Store holding the filter specification applied to server logs
/// (for example `"*:INFO, db:DEBUG"`).
pub trait FilterStore: Send + Sync {
    /// Current filter specification.
    fn get_config(&self) -> String;

    /// Replace the filter specification.
    fn set_config(&self, filter: &str);
}
