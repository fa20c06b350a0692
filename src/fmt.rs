/// Insert thousands separators into the integer digits of `digits`.
fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a count with thousands separators: 1,234,567
pub fn number(val: usize) -> String {
    group_thousands(&val.to_string())
}

/// Format a float as a currency amount with thousands separators: 1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let with_commas = group_thousands(int_part);
    if negative {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

/// Compact axis label: 950, 1.2k, 3M
pub fn compact(val: f64) -> String {
    let abs = val.abs();
    let (scaled, suffix) = if abs >= 1_000_000.0 {
        (val / 1_000_000.0, "M")
    } else if abs >= 1000.0 {
        (val / 1000.0, "k")
    } else {
        (val, "")
    };
    if scaled == scaled.trunc() {
        format!("{}{suffix}", scaled as i64)
    } else {
        format!("{scaled:.1}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(0), "0");
        assert_eq!(number(999), "999");
        assert_eq!(number(1000), "1,000");
        assert_eq!(number(112650), "112,650");
        assert_eq!(number(1234567), "1,234,567");
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "1,234.56");
        assert_eq!(money(-500.00), "-500.00");
        assert_eq!(money(0.0), "0.00");
        assert_eq!(money(1000000.99), "1,000,000.99");
        assert_eq!(money(42.10), "42.10");
    }

    #[test]
    fn test_compact_formatting() {
        assert_eq!(compact(950.0), "950");
        assert_eq!(compact(1200.0), "1.2k");
        assert_eq!(compact(5000.0), "5k");
        assert_eq!(compact(3_000_000.0), "3M");
        assert_eq!(compact(12.5), "12.5");
    }
}
