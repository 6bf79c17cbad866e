//! Report generation port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TraderError;
use crate::domain::strategy::StrategyConfig;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn render(&self, result: &BacktestResult, config: &StrategyConfig) -> String;

    /// Default implementation: renders and writes the report to `output_path`.
    fn write(
        &self,
        result: &BacktestResult,
        config: &StrategyConfig,
        output_path: &str,
    ) -> Result<(), TraderError> {
        std::fs::write(output_path, self.render(result, config))?;
        Ok(())
    }
}
