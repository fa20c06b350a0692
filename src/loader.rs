use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, info};

use crate::error::{DashError, Result};
use crate::models::{OrderRecord, OrderTable};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_ORDER_ID: &str = "order_id";
pub const COL_CUSTOMER_ID: &str = "customer_unique_id";
pub const COL_PURCHASED_AT: &str = "order_purchase_timestamp";
pub const COL_CATEGORY: &str = "product_category_name_english";
pub const COL_PAYMENT_TYPE: &str = "payment_type";
pub const COL_PRICE: &str = "price";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn optional_label(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

struct ColumnIndex {
    order_id: usize,
    customer_id: usize,
    purchased_at: usize,
    category: usize,
    payment_type: usize,
    price: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
                .ok_or_else(|| DashError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            order_id: find(COL_ORDER_ID)?,
            customer_id: find(COL_CUSTOMER_ID)?,
            purchased_at: find(COL_PURCHASED_AT)?,
            category: find(COL_CATEGORY)?,
            payment_type: find(COL_PAYMENT_TYPE)?,
            price: find(COL_PRICE)?,
        })
    }
}

fn parse_record(cols: &ColumnIndex, record: &StringRecord) -> Result<OrderRecord> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let malformed = |reason: String| DashError::MalformedRow { line, reason };
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let order_id = field(cols.order_id).trim();
    if order_id.is_empty() {
        return Err(malformed(format!("empty {COL_ORDER_ID}")));
    }
    let customer_id = field(cols.customer_id).trim();
    if customer_id.is_empty() {
        return Err(malformed(format!("empty {COL_CUSTOMER_ID}")));
    }
    let raw_ts = field(cols.purchased_at);
    let purchased_at = parse_timestamp(raw_ts)
        .ok_or_else(|| malformed(format!("unparseable timestamp {raw_ts:?}")))?;
    let raw_price = field(cols.price).trim();
    // NaN and infinities parse as f64 but are not prices.
    let price = raw_price
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| malformed(format!("non-numeric price {raw_price:?}")))?;

    Ok(OrderRecord::new(
        order_id,
        customer_id,
        purchased_at,
        optional_label(field(cols.category)),
        optional_label(field(cols.payment_type)),
        price,
    ))
}

// ---------------------------------------------------------------------------
// load_orders
// ---------------------------------------------------------------------------

/// Read an order CSV into memory. Any missing column or malformed row aborts the load.
pub fn load_orders(path: &Path) -> Result<OrderTable> {
    let file = std::fs::File::open(path)?;
    let orders = read_orders(std::io::BufReader::new(file))?;
    info!(path = %path.display(), rows = orders.len(), "loaded order dataset");
    Ok(OrderTable {
        source: path.to_path_buf(),
        orders,
    })
}

pub fn read_orders<R: std::io::Read>(reader: R) -> Result<Vec<OrderRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let cols = ColumnIndex::from_headers(rdr.headers()?)?;

    let mut orders = Vec::new();
    for result in rdr.records() {
        let record = result?;
        orders.push(parse_record(&cols, &record)?);
    }
    debug!(rows = orders.len(), "parsed order records");
    Ok(orders)
}
