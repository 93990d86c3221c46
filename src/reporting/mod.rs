//! Output generation: processed table, chart data, and run summary.

mod generator;

pub use generator::ReportGenerator;
