use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{OrderRecord, RfmRecord};

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
pub const DENSITY_POINTS: usize = 200;

// ---------------------------------------------------------------------------
// RFM table
// ---------------------------------------------------------------------------

struct CustomerAcc<'a> {
    last_purchase: chrono::NaiveDateTime,
    orders: HashSet<&'a str>,
    monetary: f64,
}

/// One RFM record per customer, anchored at the latest purchase across all rows.
/// Customers appear in order of their first row.
pub fn rfm_analysis(orders: &[OrderRecord]) -> Vec<RfmRecord> {
    let Some(latest) = orders.iter().map(|o| o.purchased_at).max() else {
        return Vec::new();
    };

    let mut first_seen: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, CustomerAcc> = HashMap::new();
    for o in orders {
        let acc = groups.entry(o.customer_id.as_str()).or_insert_with(|| {
            first_seen.push(o.customer_id.as_str());
            CustomerAcc {
                last_purchase: o.purchased_at,
                orders: HashSet::new(),
                monetary: 0.0,
            }
        });
        acc.last_purchase = acc.last_purchase.max(o.purchased_at);
        acc.orders.insert(o.order_id.as_str());
        acc.monetary += o.price;
    }

    first_seen
        .into_iter()
        .filter_map(|id| {
            groups.get(id).map(|acc| RfmRecord {
                customer_id: id.to_string(),
                recency: (latest - acc.last_purchase).num_days(),
                frequency: acc.orders.len(),
                monetary: acc.monetary,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Histogram + density
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub bin_width: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Equal-width bins over the data range; the last bin is closed on the right.
    /// Returns `None` for empty input or zero bins.
    pub fn compute(values: &[f64], bins: usize) -> Option<Self> {
        if values.is_empty() || bins == 0 {
            return None;
        }
        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            min -= 0.5;
            max += 0.5;
        }
        let bin_width = (max - min) / bins as f64;
        let mut counts = vec![0u64; bins];
        for v in values {
            let idx = (((v - min) / bin_width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Some(Self {
            min,
            max,
            bin_width,
            counts,
        })
    }

    pub fn bin_center(&self, idx: usize) -> f64 {
        self.min + self.bin_width * (idx as f64 + 0.5)
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Gaussian KDE with Scott's bandwidth, sampled at `points` evenly spaced
/// positions over `[min, max]` and scaled to histogram counts.
pub fn density_curve(values: &[f64], hist: &Histogram, points: usize) -> Vec<(f64, f64)> {
    let n = values.len();
    if n < 2 || points < 2 {
        return Vec::new();
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let std = var.sqrt();
    if std == 0.0 || !std.is_finite() {
        return Vec::new();
    }
    let bw = std * nf.powf(-0.2);
    let norm = 1.0 / (nf * bw * (2.0 * std::f64::consts::PI).sqrt());
    let scale = nf * hist.bin_width;
    let step = (hist.max - hist.min) / (points - 1) as f64;

    (0..points)
        .map(|i| {
            let x = hist.min + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bw).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, density * scale)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub name: &'static str,
    pub histogram: Option<Histogram>,
    pub density: Vec<(f64, f64)>,
}

impl MetricDistribution {
    fn compute(name: &'static str, values: &[f64], bins: usize) -> Self {
        let histogram = Histogram::compute(values, bins);
        let density = histogram
            .as_ref()
            .map(|h| density_curve(values, h, DENSITY_POINTS))
            .unwrap_or_default();
        Self {
            name,
            histogram,
            density,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RfmSummary {
    pub customers: usize,
    pub recency: MetricDistribution,
    pub frequency: MetricDistribution,
    pub monetary: MetricDistribution,
}

impl RfmSummary {
    pub fn from_records(records: &[RfmRecord], bins: usize) -> Self {
        let recency: Vec<f64> = records.iter().map(|r| r.recency as f64).collect();
        let frequency: Vec<f64> = records.iter().map(|r| r.frequency as f64).collect();
        let monetary: Vec<f64> = records.iter().map(|r| r.monetary).collect();
        Self {
            customers: records.len(),
            recency: MetricDistribution::compute("Recency", &recency, bins),
            frequency: MetricDistribution::compute("Frequency", &frequency, bins),
            monetary: MetricDistribution::compute("Monetary", &monetary, bins),
        }
    }

    pub fn metrics(&self) -> [&MetricDistribution; 3] {
        [&self.recency, &self.frequency, &self.monetary]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_timestamp;

    fn order(cust: &str, order_id: &str, ts: &str, price: f64) -> OrderRecord {
        OrderRecord::new(order_id, cust, parse_timestamp(ts).unwrap(), None, None, price)
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            order("A", "1", "2021-01-05", 10.0),
            order("A", "1", "2021-01-05", 5.0),
            order("B", "2", "2021-02-10", 20.0),
        ]
    }

    #[test]
    fn test_rfm_worked_example() {
        let rfm = rfm_analysis(&sample());
        assert_eq!(rfm.len(), 2);
        let a = rfm.iter().find(|r| r.customer_id == "A").unwrap();
        assert_eq!(a.frequency, 1);
        assert_eq!(a.monetary, 15.0);
        assert_eq!(a.recency, 36);
        let b = rfm.iter().find(|r| r.customer_id == "B").unwrap();
        assert_eq!(b.frequency, 1);
        assert_eq!(b.monetary, 20.0);
        assert_eq!(b.recency, 0);
    }

    #[test]
    fn test_rfm_frequency_sums_to_distinct_orders() {
        let orders = vec![
            order("A", "1", "2021-01-05 10:00:00", 1.0),
            order("A", "2", "2021-03-01 10:00:00", 1.0),
            order("A", "2", "2021-03-01 10:00:00", 1.0),
            order("B", "3", "2021-02-10 09:00:00", 1.0),
            order("C", "4", "2020-12-31 23:59:59", 1.0),
            order("C", "5", "2021-01-01 00:00:00", 1.0),
        ];
        let rfm = rfm_analysis(&orders);
        let total: usize = rfm.iter().map(|r| r.frequency).sum();
        let distinct: HashSet<&str> = orders.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(total, distinct.len());
        assert!(rfm.iter().all(|r| r.recency >= 0));
    }

    #[test]
    fn test_rfm_recency_truncates_partial_days() {
        let orders = vec![
            order("A", "1", "2021-01-01 12:00:00", 1.0),
            order("B", "2", "2021-01-02 11:00:00", 1.0),
        ];
        let rfm = rfm_analysis(&orders);
        assert_eq!(rfm[0].recency, 0);
    }

    #[test]
    fn test_rfm_preserves_first_seen_order() {
        let orders = vec![
            order("Z", "1", "2021-01-01", 1.0),
            order("A", "2", "2021-01-02", 1.0),
            order("Z", "3", "2021-01-03", 1.0),
        ];
        let ids: Vec<_> = rfm_analysis(&orders).into_iter().map(|r| r.customer_id).collect();
        assert_eq!(ids, vec!["Z", "A"]);
    }

    #[test]
    fn test_rfm_empty() {
        assert!(rfm_analysis(&[]).is_empty());
    }

    #[test]
    fn test_histogram_bins_include_max() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0];
        let h = Histogram::compute(&values, 4).unwrap();
        assert_eq!(h.bin_width, 1.0);
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
        assert_eq!(h.total(), 5);
        assert_eq!(h.bin_center(0), 0.5);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let h = Histogram::compute(&[3.0, 3.0, 3.0], 20).unwrap();
        assert_eq!(h.min, 2.5);
        assert_eq!(h.max, 3.5);
        assert_eq!(h.total(), 3);
        assert_eq!(h.max_count(), 3);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(Histogram::compute(&[], 20).is_none());
        assert!(Histogram::compute(&[1.0], 0).is_none());
    }

    #[test]
    fn test_density_curve_shape() {
        let values: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        let h = Histogram::compute(&values, 10).unwrap();
        let curve = density_curve(&values, &h, DENSITY_POINTS);
        assert_eq!(curve.len(), DENSITY_POINTS);
        assert_eq!(curve[0].0, h.min);
        assert!((curve[DENSITY_POINTS - 1].0 - h.max).abs() < 1e-9);
        assert!(curve.iter().all(|(_, y)| *y > 0.0));
        // Scaled to counts: peak should be on the order of the tallest bar.
        let peak = curve.iter().map(|(_, y)| *y).fold(0.0, f64::max);
        assert!(peak > 1.0 && peak < 2.0 * h.max_count() as f64);
    }

    #[test]
    fn test_density_curve_skips_constant_values() {
        let values = [5.0, 5.0, 5.0];
        let h = Histogram::compute(&values, 20).unwrap();
        assert!(density_curve(&values, &h, DENSITY_POINTS).is_empty());
    }

    #[test]
    fn test_summary_from_records() {
        let rfm = rfm_analysis(&sample());
        let summary = RfmSummary::from_records(&rfm, DEFAULT_HISTOGRAM_BINS);
        assert_eq!(summary.customers, 2);
        for metric in summary.metrics() {
            let h = metric.histogram.as_ref().unwrap();
            assert_eq!(h.counts.len(), DEFAULT_HISTOGRAM_BINS);
            assert_eq!(h.total(), 2);
        }
        // Both customers have frequency 1: no spread, no curve.
        assert!(summary.frequency.density.is_empty());
        assert!(!summary.monetary.density.is_empty());
    }
}
