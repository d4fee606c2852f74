/// Coerce an amount coming from user input: NaN, infinities and negatives become 0.
pub fn amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Coerce a percentage into [0, 100]. Malformed values become 0.
pub fn percentage(value: f64) -> f64 {
    amount(value).min(100.0)
}

/// Parse a raw form field as an amount. Anything unparsable is 0.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .map(amount)
        .unwrap_or(0.0)
}

pub fn parse_percentage(raw: &str) -> f64 {
    parse_amount(raw).min(100.0)
}

/// Round to cents, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_coercion() {
        assert_eq!(amount(12.5), 12.5);
        assert_eq!(amount(-3.0), 0.0);
        assert_eq!(amount(f64::NAN), 0.0);
        assert_eq!(amount(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_percentage_is_clamped() {
        assert_eq!(percentage(150.0), 100.0);
        assert_eq!(percentage(-1.0), 0.0);
        assert_eq!(percentage(21.0), 21.0);
    }

    #[test]
    fn test_parse_malformed_input_defaults_to_zero() {
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("-20"), 0.0);
        assert_eq!(parse_amount(" 42.5 "), 42.5);
        assert_eq!(parse_amount("7,25"), 7.25);
        assert_eq!(parse_percentage("250"), 100.0);
        assert_eq!(parse_amount("NaN"), 0.0);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(10.004), 10.0);
        assert_eq!(round_cents(10.006), 10.01);
        assert_eq!(round_cents(99.999), 100.0);
    }
}
