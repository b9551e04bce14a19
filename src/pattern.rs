//! Heuristic chart-pattern scans over raw prices.
//!
//! The scans are independent; a single point may match several patterns.

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicator::turning_points;
use crate::signal::SignalKind;

/// Relative tolerance for two shoulders or two peaks to count as level.
const LEVEL_TOLERANCE: f64 = 0.02;
/// Minimum depth of the trough between double tops/bottoms.
const DOUBLE_DEPTH: f64 = 0.05;
const TRIANGLE_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatternKind {
    HeadAndShoulders,
    InverseHeadAndShoulders,
    DoubleTop,
    DoubleBottom,
    AscendingTriangle,
    DescendingTriangle,
}

impl PatternKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::HeadAndShoulders => "Head and Shoulders",
            Self::InverseHeadAndShoulders => "Inverse Head and Shoulders",
            Self::DoubleTop => "Double Top",
            Self::DoubleBottom => "Double Bottom",
            Self::AscendingTriangle => "Ascending Triangle",
            Self::DescendingTriangle => "Descending Triangle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub date: NaiveDate,
    pub price: f64,
    pub signal: SignalKind,
    pub confidence: Confidence,
}

/// Run every scan. `dates` and `prices` must be the same length.
pub fn detect(dates: &[NaiveDate], prices: &[f64]) -> Vec<Pattern> {
    let n = prices.len().min(dates.len());
    if n < 5 {
        return Vec::new();
    }
    let (dates, prices) = (&dates[..n], &prices[..n]);

    let mut patterns = Vec::new();
    scan_head_and_shoulders(dates, prices, &mut patterns);
    scan_double_top_bottom(dates, prices, &mut patterns);
    scan_triangle(dates, prices, &mut patterns);
    tracing::debug!(found = patterns.len(), "pattern scan complete");
    patterns
}

/// Seven-point window anchored at `i` (reported at `i`), with the head at
/// `i - 1` and shoulders at `i - 2` and `i`.
fn scan_head_and_shoulders(dates: &[NaiveDate], prices: &[f64], out: &mut Vec<Pattern>) {
    for i in 3..prices.len().saturating_sub(3) {
        let left = prices[i - 3];
        let shoulder1 = prices[i - 2];
        let head = prices[i - 1];
        let shoulder2 = prices[i];
        let right = prices[i + 1];
        let level = (shoulder1 - shoulder2).abs() / shoulder1 < LEVEL_TOLERANCE;

        if head > shoulder1 && head > shoulder2 && level && left > shoulder1 && right > shoulder2 {
            out.push(found(
                PatternKind::HeadAndShoulders,
                dates[i],
                prices[i],
                SignalKind::Sell,
                Confidence::Medium,
            ));
        }
        if head < shoulder1 && head < shoulder2 && level && left < shoulder1 && right < shoulder2 {
            out.push(found(
                PatternKind::InverseHeadAndShoulders,
                dates[i],
                prices[i],
                SignalKind::Buy,
                Confidence::Medium,
            ));
        }
    }
}

fn scan_double_top_bottom(dates: &[NaiveDate], prices: &[f64], out: &mut Vec<Pattern>) {
    for i in 2..prices.len() - 2 {
        let peak1 = prices[i - 1];
        let trough = prices[i];
        let peak2 = prices[i + 1];

        if (peak1 - peak2).abs() / peak1 < LEVEL_TOLERANCE && trough < peak1 * (1.0 - DOUBLE_DEPTH)
        {
            out.push(found(
                PatternKind::DoubleTop,
                dates[i],
                trough,
                SignalKind::Sell,
                Confidence::Medium,
            ));
        }
        if (trough - prices[i - 2]).abs() / trough < LEVEL_TOLERANCE
            && peak1 > trough * (1.0 + DOUBLE_DEPTH)
            && peak2 > trough * (1.0 + DOUBLE_DEPTH)
        {
            out.push(found(
                PatternKind::DoubleBottom,
                dates[i],
                trough,
                SignalKind::Buy,
                Confidence::Medium,
            ));
        }
    }
}

/// Crude slopes between the first and last local high (and low) of the
/// trailing window, reported at the last point.
fn scan_triangle(dates: &[NaiveDate], prices: &[f64], out: &mut Vec<Pattern>) {
    if prices.len() < TRIANGLE_WINDOW {
        return;
    }
    let (highs, lows) = turning_points(&prices[prices.len() - TRIANGLE_WINDOW..]);
    if highs.len() < 2 || lows.len() < 2 {
        return;
    }
    let slope = |points: &[(usize, f64)]| {
        let first = points[0].1;
        let last = points[points.len() - 1].1;
        (last - first) / (points.len() - 1) as f64
    };
    let high_slope = slope(&highs);
    let low_slope = slope(&lows);

    let last = prices.len() - 1;
    if high_slope < 0.0 && low_slope > 0.0 {
        out.push(found(
            PatternKind::AscendingTriangle,
            dates[last],
            prices[last],
            SignalKind::Buy,
            Confidence::High,
        ));
    } else if high_slope < 0.0 && low_slope < 0.0 {
        out.push(found(
            PatternKind::DescendingTriangle,
            dates[last],
            prices[last],
            SignalKind::Sell,
            Confidence::High,
        ));
    }
}

fn found(
    kind: PatternKind,
    date: NaiveDate,
    price: f64,
    signal: SignalKind,
    confidence: Confidence,
) -> Pattern {
    Pattern {
        kind,
        date,
        price,
        signal,
        confidence,
    }
}
