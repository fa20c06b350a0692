use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::models::{MonthBucket, OrderRecord, RfmRecord, YearFilter};
use crate::rfm::{rfm_analysis, RfmSummary};

pub const TOP_CATEGORY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub total_orders: usize,
    pub total_customers: usize,
}

pub fn headline(orders: &[OrderRecord]) -> Headline {
    let customers: HashSet<&str> = orders.iter().map(|o| o.customer_id.as_str()).collect();
    Headline {
        total_orders: orders.len(),
        total_customers: customers.len(),
    }
}

/// Distinct purchase years, ascending.
pub fn available_years(orders: &[OrderRecord]) -> Vec<i32> {
    let years: BTreeSet<i32> = orders.iter().map(|o| o.year).collect();
    years.into_iter().collect()
}

/// Year selector options: "All years" first, then each year present.
pub fn year_options(orders: &[OrderRecord]) -> Vec<YearFilter> {
    std::iter::once(YearFilter::All)
        .chain(available_years(orders).into_iter().map(YearFilter::Year))
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly order trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCount {
    pub month: MonthBucket,
    pub orders: u64,
}

/// Rows per calendar month, chronological, with empty months filled as zero.
pub fn monthly_order_trend(orders: &[OrderRecord]) -> Vec<MonthCount> {
    let mut buckets: BTreeMap<MonthBucket, u64> = BTreeMap::new();
    for o in orders {
        *buckets.entry(MonthBucket::of(&o.purchased_at)).or_insert(0) += 1;
    }
    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut trend = Vec::new();
    let mut month = first;
    while month <= last {
        trend.push(MonthCount {
            month,
            orders: buckets.get(&month).copied().unwrap_or(0),
        });
        month = month.next();
    }
    trend
}

// ---------------------------------------------------------------------------
// Label counts (categories, payment methods)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

/// Count non-missing labels, descending by count. Equal counts keep the
/// order in which their labels first appear.
fn count_labels<'a>(labels: impl Iterator<Item = Option<&'a str>>) -> Vec<LabelCount> {
    let mut first_seen: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for label in labels.flatten() {
        let c = counts.entry(label).or_insert_with(|| {
            first_seen.push(label);
            0
        });
        *c += 1;
    }
    let mut out: Vec<LabelCount> = first_seen
        .into_iter()
        .map(|label| LabelCount {
            label: label.to_string(),
            count: counts.get(label).copied().unwrap_or(0),
        })
        .collect();
    // sort_by is stable
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

pub fn top_categories(orders: &[OrderRecord], limit: usize) -> Vec<LabelCount> {
    let mut counts = count_labels(orders.iter().map(|o| o.category.as_deref()));
    counts.truncate(limit);
    counts
}

pub fn payment_distribution(orders: &[OrderRecord]) -> Vec<LabelCount> {
    count_labels(orders.iter().map(|o| o.payment_type.as_deref()))
}

// ---------------------------------------------------------------------------
// Dashboard assembly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub filter: YearFilter,
    pub years: Vec<i32>,
    pub headline: Headline,
    pub order_trend: Vec<MonthCount>,
    pub top_categories: Vec<LabelCount>,
    pub payment_methods: Vec<LabelCount>,
    pub rfm: RfmSummary,
    #[serde(skip)]
    pub rfm_records: Vec<RfmRecord>,
}

/// Everything a renderer needs for one pass. RFM is derived from the full
/// table before the year filter is applied and is not affected by it.
pub fn build_dashboard(orders: &[OrderRecord], filter: YearFilter, bins: usize) -> DashboardReport {
    let rfm_records = rfm_analysis(orders);
    let rfm = RfmSummary::from_records(&rfm_records, bins);
    let years = available_years(orders);

    let filtered = filter.apply(orders);
    debug!(%filter, rows = filtered.len(), "applied year filter");

    let report = DashboardReport {
        filter,
        years,
        headline: headline(&filtered),
        order_trend: monthly_order_trend(&filtered),
        top_categories: top_categories(&filtered, TOP_CATEGORY_LIMIT),
        payment_methods: payment_distribution(&filtered),
        rfm,
        rfm_records,
    };
    info!(
        %filter,
        orders = report.headline.total_orders,
        customers = report.headline.total_customers,
        "built dashboard report"
    );
    report
}
