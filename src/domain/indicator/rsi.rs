//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss:
//! - while fewer than n changes exist: simple mean of the changes seen so far
//! - afterwards: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)).
//! avg_loss == 0 gives 100, or the neutral 50 when there were no gains either.
//! The first bar has no change and reads 50.

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let mut values = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return values;
    }
    values.push(50.0);

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let seen = i;

        if seen <= period {
            gain_sum += gain;
            loss_sum += loss;
            avg_gain = gain_sum / seen as f64;
            avg_loss = loss_sum / seen as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }

        values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_first_bar_is_neutral() {
        let series = calculate_rsi(&[100.0], 14);
        assert_eq!(series, vec![50.0]);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert_relative_eq!(series[19], 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert_relative_eq!(series[19], 0.0);
    }

    #[test]
    fn rsi_flat_prices_are_neutral() {
        let series = calculate_rsi(&[100.0; 10], 5);
        assert!(series.iter().all(|&v| (v - 50.0).abs() < f64::EPSILON));
    }

    #[test]
    fn rsi_stays_in_range() {
        let closes: Vec<f64> = (1..=60)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        for rsi in calculate_rsi(&closes, 14) {
            assert!((0.0..=100.0).contains(&rsi), "RSI {rsi} out of range");
        }
    }

    #[test]
    fn rsi_switches_to_wilder_smoothing() {
        // changes: +2, -1, +3 with period 2
        let series = calculate_rsi(&[10.0, 12.0, 11.0, 14.0], 2);
        // after two changes: gain 1.0, loss 0.5
        assert_relative_eq!(series[2], 100.0 - 100.0 / (1.0 + 1.0 / 0.5));
        // wilder: gain (1.0 + 3.0) / 2 = 2.0, loss (0.5 + 0) / 2 = 0.25
        assert_relative_eq!(series[3], 100.0 - 100.0 / (1.0 + 2.0 / 0.25));
    }
}
