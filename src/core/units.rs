use super::RawAmount;

/// Base units per major unit (wei per ether).
pub const WEI_PER_ETH: i128 = 1_000_000_000_000_000_000;

const WEI_PER_ETH_F64: f64 = 1e18;

/// Convert a raw base-unit amount to major units.
///
/// Never fails: absent, empty, non-numeric, non-finite or negative input
/// converts to `0.0` so one bad amount cannot sink a batch.
pub fn convert(raw: Option<&RawAmount>) -> f64 {
    match raw {
        None => 0.0,
        Some(RawAmount::Text(s)) => convert_str(s),
        Some(RawAmount::Number(n)) => {
            if let Some(v) = n.as_u64() {
                from_base_units(v as i128)
            } else if let Some(v) = n.as_i64() {
                from_base_units(v as i128)
            } else {
                n.as_f64().map(from_base_float).unwrap_or(0.0)
            }
        }
    }
}

/// Convert a textual base-unit amount. Integer parse first, float second.
pub fn convert_str(raw: &str) -> f64 {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i128>() {
        return from_base_units(v);
    }
    match raw.parse::<f64>() {
        Ok(v) => from_base_float(v),
        Err(_) => 0.0,
    }
}

fn from_base_units(v: i128) -> f64 {
    if v <= 0 {
        return 0.0;
    }
    // Whole and fractional parts separately so large magnitudes keep precision.
    let whole = (v / WEI_PER_ETH) as f64;
    let frac = (v % WEI_PER_ETH) as f64 / WEI_PER_ETH_F64;
    whole + frac
}

fn from_base_float(v: f64) -> f64 {
    if !v.is_finite() || v <= 0.0 {
        return 0.0;
    }
    v / WEI_PER_ETH_F64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_ether() {
        assert_eq!(convert_str("1000000000000000000"), 1.0);
    }

    #[test]
    fn fractions() {
        assert_eq!(convert_str("500000000000000000"), 0.5);
        assert_eq!(convert_str("300000000000000000"), 0.3);
    }

    #[test]
    fn null_and_garbage_are_zero() {
        assert_eq!(convert(None), 0.0);
        assert_eq!(convert_str("abc"), 0.0);
        assert_eq!(convert_str(""), 0.0);
        assert_eq!(convert_str("   "), 0.0);
    }

    #[test]
    fn non_finite_and_negative_are_zero() {
        assert_eq!(convert_str("NaN"), 0.0);
        assert_eq!(convert_str("inf"), 0.0);
        assert_eq!(convert_str("-1000000000000000000"), 0.0);
    }

    #[test]
    fn float_fallback() {
        assert_eq!(convert_str("1e18"), 1.0);
        assert_eq!(convert_str("2.5e18"), 2.5);
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(convert_str(" 1000000000000000000\n"), 1.0);
    }

    #[test]
    fn larger_than_i128_uses_float_path() {
        let huge = "9".repeat(45);
        let v = convert_str(&huge);
        assert!(v > 9.9e26 && v.is_finite());
    }

    #[test]
    fn big_integer_keeps_precision() {
        let v = convert_str("123456789000000000000000000");
        assert_eq!(v, 123_456_789.0);
    }

    #[test]
    fn json_numbers() {
        let n: RawAmount = serde_json::from_str("1000000000000000000").unwrap();
        assert_eq!(convert(Some(&n)), 1.0);
        let f: RawAmount = serde_json::from_str("5e17").unwrap();
        assert_eq!(convert(Some(&f)), 0.5);
    }

    #[test]
    fn text_variant() {
        assert_eq!(convert(Some(&RawAmount::from("2000000000000000000"))), 2.0);
    }
}
