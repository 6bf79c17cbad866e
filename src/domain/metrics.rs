//! Performance metrics over a trade ledger and an equity curve.

use crate::domain::position::ClosedTrade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Fewest period returns needed before a Sharpe ratio is reported.
const MIN_RETURNS_FOR_SHARPE: usize = 11;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: f64,
    pub avg_reward_risk: f64,
    /// `f64::INFINITY` when there are winners and no losers.
    pub profit_factor: f64,
    pub net_pnl: f64,
    pub gross_pnl: f64,
    pub total_commission: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub final_balance: f64,
    pub return_pct: f64,
    pub avg_trade_pnl: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_bars_held: f64,
}

impl PerformanceMetrics {
    /// `trades` must be non-empty for the per-trade averages to be
    /// meaningful; with no trades they are all zero.
    pub fn compute(
        trades: &[ClosedTrade],
        equity: &[f64],
        starting_balance: f64,
        risk_free_rate: f64,
        periods_per_year: f64,
    ) -> Self {
        let pnls: Vec<f64> = trades.iter().map(|t| t.net_pnl).collect();
        let final_balance = equity.last().copied().unwrap_or(starting_balance);
        let (max_drawdown, max_drawdown_pct) = max_drawdown(equity);
        let returns = period_returns(equity);

        let n = trades.len();
        let mean = |total: f64| if n > 0 { total / n as f64 } else { 0.0 };

        PerformanceMetrics {
            total_trades: n,
            winning_trades: pnls.iter().filter(|&&p| p > 0.0).count(),
            losing_trades: pnls.iter().filter(|&&p| p < 0.0).count(),
            breakeven_trades: pnls.iter().filter(|&&p| p == 0.0).count(),
            win_rate: win_rate(&pnls),
            avg_reward_risk: average_reward_risk(&pnls),
            profit_factor: profit_factor(&pnls),
            net_pnl: final_balance - starting_balance,
            gross_pnl: trades.iter().map(|t| t.gross_pnl).sum(),
            total_commission: trades.iter().map(|t| t.commission).sum(),
            max_drawdown,
            max_drawdown_pct,
            sharpe_ratio: sharpe_ratio(&returns, risk_free_rate, periods_per_year),
            final_balance,
            return_pct: if starting_balance > 0.0 {
                (final_balance - starting_balance) / starting_balance
            } else {
                0.0
            },
            avg_trade_pnl: mean(pnls.iter().sum()),
            best_trade: pnls.iter().copied().reduce(f64::max).unwrap_or(0.0),
            worst_trade: pnls.iter().copied().reduce(f64::min).unwrap_or(0.0),
            avg_bars_held: mean(trades.iter().map(|t| t.bars_held as f64).sum()),
        }
    }
}

/// Fraction of trades with positive P&L; 0 for an empty ledger.
pub fn win_rate(pnls: &[f64]) -> f64 {
    if pnls.is_empty() {
        return 0.0;
    }
    pnls.iter().filter(|&&p| p > 0.0).count() as f64 / pnls.len() as f64
}

/// Mean winning P&L divided by mean absolute losing P&L; 0 without losers.
pub fn average_reward_risk(pnls: &[f64]) -> f64 {
    let (wins, losses): (Vec<f64>, Vec<f64>) = pnls
        .iter()
        .filter(|&&p| p != 0.0)
        .partition(|&&p| p > 0.0);
    if losses.is_empty() {
        return 0.0;
    }
    let avg_win = if wins.is_empty() {
        0.0
    } else {
        wins.iter().sum::<f64>() / wins.len() as f64
    };
    let avg_loss = losses.iter().map(|l| l.abs()).sum::<f64>() / losses.len() as f64;
    if avg_loss > 0.0 { avg_win / avg_loss } else { 0.0 }
}

pub fn profit_factor(pnls: &[f64]) -> f64 {
    let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = pnls.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();
    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Largest peak-to-trough decline as `(amount, fraction of the peak)`.
pub fn max_drawdown(equity: &[f64]) -> (f64, f64) {
    let Some(&first) = equity.first() else {
        return (0.0, 0.0);
    };

    let mut peak = first;
    let mut max_amount = 0.0_f64;
    let mut max_pct = 0.0_f64;

    for &value in equity {
        if value > peak {
            peak = value;
            continue;
        }
        let amount = peak - value;
        max_amount = max_amount.max(amount);
        if peak > 0.0 {
            max_pct = max_pct.max(amount / peak);
        }
    }

    (max_amount, max_pct)
}

/// Period-over-period fractional changes, skipping non-positive bases.
pub fn period_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Annualised Sharpe ratio with sample standard deviation. 0 with too few
/// returns or no variance.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if returns.len() < MIN_RETURNS_FOR_SHARPE || periods_per_year <= 0.0 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();
    // identical returns leave rounding noise in the variance
    if !(stddev > ZERO_VARIANCE_TOLERANCE * mean.abs().max(ZERO_VARIANCE_TOLERANCE)) {
        return 0.0;
    }

    let excess = mean - risk_free_rate / periods_per_year;
    periods_per_year.sqrt() * excess / stddev
}
