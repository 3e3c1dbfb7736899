pub mod aggregator;
pub mod slicer;
pub mod exporter;

pub use aggregator::*;
pub use slicer::*;
pub use exporter::*;
