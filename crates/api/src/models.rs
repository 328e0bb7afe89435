use shared::api::Feature;

/// A feature together with its physical row position in the backing table.
///
/// Rows are append-only and 1-based; the position is what the single-cell
/// vote write targets, so it travels with the feature through the ledger.
#[derive(Debug, Clone)]
pub struct StoredFeature {
    pub row: u64,
    pub feature: Feature,
}
