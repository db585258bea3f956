// ── Cache layer ──
//
// Snapshot-derived structures shared by both cache strategies, plus the
// event-maintained tables of the reconciled strategy.

mod attributes;
mod index;
mod reconciled;
mod ttl;

pub use attributes::AttributeSnapshot;
pub use index::CapabilityIndex;
pub use reconciled::ReconciledCache;
pub use ttl::TtlCell;
