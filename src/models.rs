use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::error::DashError;

/// One order line from the source dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    pub purchased_at: NaiveDateTime,
    pub category: Option<String>,
    pub payment_type: Option<String>,
    pub price: f64,
    /// Derived from `purchased_at` at load time.
    pub year: i32,
}

impl OrderRecord {
    pub fn new(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        purchased_at: NaiveDateTime,
        category: Option<String>,
        payment_type: Option<String>,
        price: f64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            year: purchased_at.year(),
            purchased_at,
            category,
            payment_type,
            price,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderTable {
    pub source: PathBuf,
    pub orders: Vec<OrderRecord>,
}

/// Year restriction applied to the working table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    pub fn apply(&self, orders: &[OrderRecord]) -> Vec<OrderRecord> {
        match self {
            Self::All => orders.to_vec(),
            Self::Year(y) => orders.iter().filter(|o| o.year == *y).cloned().collect(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::All => "All years".to_string(),
            Self::Year(y) => y.to_string(),
        }
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for YearFilter {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if s.len() == 4 {
            if let Ok(y) = s.parse::<i32>() {
                return Ok(Self::Year(y));
            }
        }
        Err(DashError::InvalidYear(s.to_string()))
    }
}

impl Serialize for YearFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Year(y) => serializer.serialize_i32(*y),
        }
    }
}

/// First day of a calendar month; serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket(pub NaiveDate);

impl MonthBucket {
    pub fn of(ts: &NaiveDateTime) -> Self {
        // Day 1 always exists.
        Self(NaiveDate::from_ymd_opt(ts.year(), ts.month(), 1).unwrap_or(ts.date()))
    }

    pub fn next(&self) -> Self {
        let (y, m) = if self.0.month() == 12 {
            (self.0.year() + 1, 1)
        } else {
            (self.0.year(), self.0.month() + 1)
        };
        Self(NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(self.0))
    }

    pub fn short_label(&self) -> String {
        self.0.format("%b %y").to_string()
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl Serialize for MonthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-customer Recency / Frequency / Monetary attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfmRecord {
    pub customer_id: String,
    /// Whole days between the dataset's latest purchase and this customer's latest.
    pub recency: i64,
    /// Distinct order ids.
    pub frequency: usize,
    pub monetary: f64,
}
