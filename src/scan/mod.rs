//! The QR-scan attendance pipeline: debounced scan intake, payload
//! validation, authenticated-vs-pending dispatch, and post-login replay.

pub mod gate;
pub mod parser;
pub mod pipeline;
pub mod reconcile;

pub use gate::ScanGate;
pub use pipeline::{ScanOutcome, ScanPipeline};
pub use reconcile::{ReconcileOutcome, Reconciler};
