use std::io::Write;

use error_stack::{Report, ResultExt};

use crate::analysis::AnalysisReport;
use crate::error::OutputError;
use crate::output::ReportSink;

/// Writes the full report as pretty-printed JSON to stdout.
pub struct JsonSink;

impl JsonSink {
    fn render(report: &AnalysisReport) -> Result<String, Report<OutputError>> {
        serde_json::to_string_pretty(report).change_context(OutputError::Serialize)
    }
}

impl ReportSink for JsonSink {
    fn emit(&self, report: &AnalysisReport) -> Result<(), Report<OutputError>> {
        let rendered = Self::render(report)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{rendered}")
            .change_context(OutputError::Write)
            .attach_with(|| format!("run_id: {}", report.run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::model::tests::series_from_closes;
    use crate::settings::AnalysisSettings;

    #[test]
    fn report_serializes_with_run_metadata() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + f64::from(i)).collect();
        let series = series_from_closes(&closes);
        let report = analysis::run(&series, &AnalysisSettings::default(), &[]).unwrap();

        let rendered = JsonSink::render(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["run_id"], report.run_id.to_string());
        assert_eq!(value["observations"], 30);
        assert_eq!(value["interval"], "1mo");
        assert!(value["signals"]["overall"].is_string());
    }
}
