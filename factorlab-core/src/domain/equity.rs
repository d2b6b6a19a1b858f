//! EquityCurve: derived portfolio value per trading day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Output row: equity plus derived daily return and drawdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityRow {
    pub date: NaiveDate,
    pub equity: f64,
    pub daily_return: f64,
    pub drawdown: f64,
}

/// Equity series with strictly increasing dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point. Points dated at or before the current last point are
    /// dropped, so a day shared by two segments keeps its first valuation.
    pub fn push(&mut self, point: EquityPoint) -> bool {
        if self.points.last().is_some_and(|last| point.date <= last.date) {
            return false;
        }
        self.points.push(point);
        true
    }

    pub fn extend_segment(&mut self, segment: impl IntoIterator<Item = EquityPoint>) {
        for point in segment {
            self.push(point);
        }
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&EquityPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    /// Simple returns, first entry 0. A non-positive prior value yields 0.
    pub fn returns(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.points.len());
        for (i, point) in self.points.iter().enumerate() {
            let r = match i.checked_sub(1).map(|j| self.points[j].equity) {
                Some(prev) if prev > 0.0 => point.equity / prev - 1.0,
                _ => 0.0,
            };
            out.push(r);
        }
        out
    }

    /// `equity / running_max - 1` per point.
    pub fn drawdowns(&self) -> Vec<f64> {
        let mut peak = f64::NEG_INFINITY;
        self.points
            .iter()
            .map(|p| {
                peak = peak.max(p.equity);
                if peak > 0.0 {
                    p.equity / peak - 1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn rows(&self) -> Vec<EquityRow> {
        let returns = self.returns();
        let drawdowns = self.drawdowns();
        self.points
            .iter()
            .zip(returns.into_iter().zip(drawdowns))
            .map(|(p, (daily_return, drawdown))| EquityRow {
                date: p.date,
                equity: p.equity,
                daily_return,
                drawdown,
            })
            .collect()
    }

    /// Equity as of `date`: the last point dated on or before it.
    pub fn value_as_of(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| self.points[i].equity)
    }
}

impl FromIterator<EquityPoint> for EquityCurve {
    fn from_iter<I: IntoIterator<Item = EquityPoint>>(iter: I) -> Self {
        let mut curve = EquityCurve::new();
        curve.extend_segment(iter);
        curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(day: u32, equity: f64) -> EquityPoint {
        EquityPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            equity,
        }
    }

    #[test]
    fn duplicate_dates_keep_first_value() {
        let mut curve = EquityCurve::new();
        curve.extend_segment(vec![pt(2, 100.0), pt(3, 101.0)]);
        curve.extend_segment(vec![pt(3, 99.0), pt(4, 102.0)]);
        assert_eq!(curve.values(), vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn rows_derive_returns_and_drawdown() {
        let curve: EquityCurve = vec![pt(2, 100.0), pt(3, 110.0), pt(4, 99.0)]
            .into_iter()
            .collect();
        let rows = curve.rows();
        assert_eq!(rows[0].daily_return, 0.0);
        assert!((rows[1].daily_return - 0.1).abs() < 1e-12);
        assert!((rows[2].drawdown - (99.0 / 110.0 - 1.0)).abs() < 1e-12);
        assert_eq!(rows[1].drawdown, 0.0);
    }

    #[test]
    fn value_as_of_uses_prior_point() {
        let curve: EquityCurve = vec![pt(2, 100.0), pt(5, 120.0)].into_iter().collect();
        assert_eq!(curve.value_as_of(pt(1, 0.0).date), None);
        assert_eq!(curve.value_as_of(pt(3, 0.0).date), Some(100.0));
        assert_eq!(curve.value_as_of(pt(5, 0.0).date), Some(120.0));
    }
}
