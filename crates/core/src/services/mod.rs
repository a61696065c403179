//! Services that drive the core pipeline end to end.

pub mod analysis;

pub use analysis::{scan_binary, AnalysisError, PackageAnalysis, PackageAnalyzer};
