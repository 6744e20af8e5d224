//! Results Aggregator — derives summary statistics, an exit-reason
//! histogram, and a monthly breakdown from a finished portfolio's trade
//! and equity history (SPEC_FULL.md §4.7).

use crate::domain::trade::ExitReason;
use crate::domain::{Portfolio, TradeRecord};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthStats {
    pub pnl_usd: f64,
    pub fees_usd: f64,
    pub wins: usize,
    pub losses: usize,
    pub max_win_usd: f64,
    pub max_loss_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResults {
    pub net_pnl_usd: f64,
    pub net_return_pct: f64,
    pub win_rate_pct: f64,
    /// Gross profit / gross loss. `f64::INFINITY` when there were no
    /// losing trades at all.
    pub profit_factor: f64,
    pub avg_win_usd: f64,
    pub avg_win_pct: f64,
    pub avg_loss_usd: f64,
    pub avg_loss_pct: f64,
    pub max_drawdown_pct: f64,
    pub total_fees_usd: f64,
    pub total_trades: usize,
    pub exit_reason_counts: HashMap<String, usize>,
    pub equity_curve: Vec<(DateTime<Utc>, f64)>,
    /// Keyed by `"%Y-%m"`.
    pub monthly: HashMap<String, MonthStats>,
}

fn exit_reason_label(reason: ExitReason) -> &'static str {
    match reason.base() {
        ExitReason::StopLoss => "stop_loss",
        ExitReason::TakeProfit => "take_profit",
        ExitReason::Breakeven => "breakeven",
        ExitReason::TrailingStop => "trailing_stop",
        ExitReason::PartialTp => "partial_tp",
        ExitReason::Signal => "signal",
        // `.base()` folds every `_GAP` variant into a non-gap one above.
        _ => unreachable!("base() never returns a gap variant"),
    }
}

/// Build results from a finished portfolio's trade and equity history.
pub fn summarize(portfolio: &Portfolio) -> BacktestResults {
    let trades = &portfolio.trades;
    let wins: Vec<&TradeRecord> = trades.iter().filter(|t| t.is_winner()).collect();
    let losses: Vec<&TradeRecord> = trades.iter().filter(|t| !t.is_winner()).collect();

    let gross_profit: f64 = wins.iter().map(|t| t.pnl_usd).sum();
    let gross_loss: f64 = losses.iter().map(|t| t.pnl_usd.abs()).sum();
    let net_pnl_usd: f64 = trades.iter().map(|t| t.pnl_usd).sum();

    let win_rate_pct = if trades.is_empty() {
        0.0
    } else {
        100.0 * wins.len() as f64 / trades.len() as f64
    };
    let profit_factor = if gross_loss == 0.0 {
        f64::INFINITY
    } else {
        gross_profit / gross_loss
    };
    let avg = |xs: &[&TradeRecord], f: fn(&TradeRecord) -> f64| -> f64 {
        if xs.is_empty() {
            0.0
        } else {
            xs.iter().map(|t| f(t)).sum::<f64>() / xs.len() as f64
        }
    };

    let mut exit_reason_counts: HashMap<String, usize> = HashMap::new();
    for t in trades {
        *exit_reason_counts.entry(exit_reason_label(t.reason).to_string()).or_insert(0) += 1;
    }

    BacktestResults {
        net_pnl_usd,
        net_return_pct: if portfolio.initial_capital == 0.0 {
            0.0
        } else {
            100.0 * net_pnl_usd / portfolio.initial_capital
        },
        win_rate_pct,
        profit_factor,
        avg_win_usd: avg(&wins, |t| t.pnl_usd),
        avg_win_pct: avg(&wins, |t| t.pnl_pct),
        avg_loss_usd: avg(&losses, |t| t.pnl_usd),
        avg_loss_pct: avg(&losses, |t| t.pnl_pct),
        max_drawdown_pct: 100.0 * portfolio.max_drawdown_pct,
        total_fees_usd: portfolio.total_fees,
        total_trades: trades.len(),
        exit_reason_counts,
        equity_curve: portfolio.equity_curve.clone(),
        monthly: monthly_breakdown(trades),
    }
}

/// Group trades by the `"%Y-%m"` of their exit time.
pub fn monthly_breakdown(trades: &[TradeRecord]) -> HashMap<String, MonthStats> {
    let mut months: HashMap<String, MonthStats> = HashMap::new();
    for t in trades {
        let key = format!("{:04}-{:02}", t.exit_time.year(), t.exit_time.month());
        let stats = months.entry(key).or_default();
        stats.pnl_usd += t.pnl_usd;
        stats.fees_usd += t.fees;
        if t.is_winner() {
            stats.wins += 1;
            stats.max_win_usd = stats.max_win_usd.max(t.pnl_usd);
        } else {
            stats.losses += 1;
            stats.max_loss_usd = stats.max_loss_usd.min(t.pnl_usd);
        }
    }
    months
}

impl BacktestResults {
    pub fn format_summary(&self) -> String {
        format!(
            "Net PnL: ${:.2} ({:+.2}%)\nWin rate: {:.1}% ({} trades)\nProfit factor: {}\n\
             Avg win: ${:.2} ({:+.2}%)  Avg loss: ${:.2} ({:+.2}%)\nMax drawdown: {:.2}%\nFees: ${:.2}",
            self.net_pnl_usd,
            self.net_return_pct,
            self.win_rate_pct,
            self.total_trades,
            if self.profit_factor.is_infinite() {
                "inf".to_string()
            } else {
                format!("{:.2}", self.profit_factor)
            },
            self.avg_win_usd,
            self.avg_win_pct * 100.0,
            self.avg_loss_usd,
            self.avg_loss_pct * 100.0,
            self.max_drawdown_pct,
            self.total_fees_usd,
        )
    }

    pub fn format_monthly_table(&self) -> String {
        let mut keys: Vec<&String> = self.monthly.keys().collect();
        keys.sort();
        let mut out = String::from("month      pnl        fees     wins  losses\n");
        for key in keys {
            let m = &self.monthly[key];
            out.push_str(&format!(
                "{key}  {:>9.2}  {:>7.2}  {:>4}  {:>6}\n",
                m.pnl_usd, m.fees_usd, m.wins, m.losses
            ));
        }
        out
    }
}

/// Combined equity curve across every symbol in a multi-asset run: at each
/// event timestamp, the sum of every symbol's most-recently-known equity.
pub fn combine_equity_curves(curves: &HashMap<String, Vec<(DateTime<Utc>, f64)>>) -> Vec<(DateTime<Utc>, f64)> {
    let mut events: Vec<(DateTime<Utc>, &str, f64)> = Vec::new();
    for (symbol, curve) in curves {
        for &(ts, eq) in curve {
            events.push((ts, symbol.as_str(), eq));
        }
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let mut latest: HashMap<&str, f64> = HashMap::new();
    let mut combined = Vec::with_capacity(events.len());
    for (ts, symbol, eq) in events {
        latest.insert(symbol, eq);
        combined.push((ts, latest.values().sum()));
    }
    combined
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiAssetResults {
    pub per_symbol: HashMap<String, BacktestResults>,
    pub combined_equity_curve: Vec<(DateTime<Utc>, f64)>,
}

pub fn summarize_multi(portfolios: &HashMap<String, Portfolio>) -> MultiAssetResults {
    let per_symbol: HashMap<String, BacktestResults> =
        portfolios.iter().map(|(symbol, pf)| (symbol.clone(), summarize(pf))).collect();
    let curves: HashMap<String, Vec<(DateTime<Utc>, f64)>> =
        portfolios.iter().map(|(symbol, pf)| (symbol.clone(), pf.equity_curve.clone())).collect();
    MultiAssetResults { combined_equity_curve: combine_equity_curves(&curves), per_symbol }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Side;
    use crate::domain::ids::TradeId;
    use chrono::TimeZone;

    fn trade(pnl_usd: f64, pnl_pct: f64, reason: ExitReason, exit_month: u32) -> TradeRecord {
        TradeRecord {
            id: TradeId(0),
            symbol: "SPY".into(),
            side: Side::Long,
            entry_time: Utc.with_ymd_and_hms(2024, exit_month, 1, 9, 30, 0).unwrap(),
            entry_price: 100.0,
            exit_time: Utc.with_ymd_and_hms(2024, exit_month, 5, 9, 30, 0).unwrap(),
            exit_price: 100.0 + pnl_pct * 100.0,
            size_usd: 10_000.0,
            pnl_usd,
            pnl_pct,
            fees: 5.0,
            reason,
            is_partial: false,
            group: None,
        }
    }

    fn portfolio_with(trades: Vec<TradeRecord>) -> Portfolio {
        let mut pf = Portfolio::new(10_000.0, 5, false);
        pf.trades = trades;
        pf.total_fees = pf.trades.iter().map(|t| t.fees).sum();
        pf
    }

    #[test]
    fn profit_factor_is_infinite_with_no_losses() {
        let pf = portfolio_with(vec![trade(100.0, 0.01, ExitReason::TakeProfit, 1)]);
        let results = summarize(&pf);
        assert!(results.profit_factor.is_infinite());
        assert_eq!(results.win_rate_pct, 100.0);
    }

    #[test]
    fn profit_factor_is_gross_profit_over_gross_loss() {
        let pf = portfolio_with(vec![
            trade(200.0, 0.02, ExitReason::TakeProfit, 1),
            trade(-100.0, -0.01, ExitReason::StopLoss, 1),
        ]);
        let results = summarize(&pf);
        assert!((results.profit_factor - 2.0).abs() < 1e-9);
        assert_eq!(results.win_rate_pct, 50.0);
    }

    #[test]
    fn gap_exit_reasons_fold_into_base_histogram_bucket() {
        let pf = portfolio_with(vec![
            trade(-50.0, -0.005, ExitReason::StopLossGap, 1),
            trade(-50.0, -0.005, ExitReason::StopLoss, 1),
        ]);
        let results = summarize(&pf);
        assert_eq!(results.exit_reason_counts["stop_loss"], 2);
        assert!(!results.exit_reason_counts.contains_key("stop_loss_gap"));
    }

    #[test]
    fn monthly_breakdown_groups_by_exit_month() {
        let trades = vec![
            trade(100.0, 0.01, ExitReason::TakeProfit, 1),
            trade(-40.0, -0.004, ExitReason::StopLoss, 1),
            trade(60.0, 0.006, ExitReason::TakeProfit, 2),
        ];
        let months = monthly_breakdown(&trades);
        assert_eq!(months["2024-01"].wins, 1);
        assert_eq!(months["2024-01"].losses, 1);
        assert_eq!(months["2024-01"].pnl_usd, 60.0);
        assert_eq!(months["2024-02"].wins, 1);
        assert_eq!(months["2024-02"].max_win_usd, 60.0);
    }

    #[test]
    fn combine_equity_curves_sums_latest_known_equity_per_symbol() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        let mut curves = HashMap::new();
        curves.insert("A".to_string(), vec![(t0, 10_000.0), (t0 + chrono::Duration::minutes(2), 10_100.0)]);
        curves.insert("B".to_string(), vec![(t0 + chrono::Duration::minutes(1), 5_000.0)]);

        let combined = combine_equity_curves(&curves);
        assert_eq!(combined.len(), 3);
        assert_eq!(combined[0].1, 10_000.0);
        assert_eq!(combined[1].1, 15_000.0);
        assert_eq!(combined[2].1, 15_100.0);
    }
}
