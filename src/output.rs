pub mod json;
pub mod terminal;

use error_stack::Report;

use crate::analysis::AnalysisReport;
use crate::error::OutputError;

/// Destination for a finished analysis report.
pub trait ReportSink {
    fn emit(&self, report: &AnalysisReport) -> Result<(), Report<OutputError>>;
}
