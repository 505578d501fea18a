// Numeric coercion for value cells.
//
// Never fails: anything that is not a finite number becomes 0 and the caller
// records a fallback. Empty cells are 0 without a fallback.

use crate::model::CellInput;

/// Outcome of coercing one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Value(f64),
    Empty,
    Fallback,
}

impl Coerced {
    pub fn value(self) -> f64 {
        match self {
            Coerced::Value(v) => v,
            Coerced::Empty | Coerced::Fallback => 0.0,
        }
    }
}

pub fn coerce_cell(cell: &CellInput) -> Coerced {
    match cell {
        CellInput::Number(n) if n.is_finite() => Coerced::Value(*n),
        CellInput::Number(_) => Coerced::Fallback,
        CellInput::Empty => Coerced::Empty,
        CellInput::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Coerced::Empty;
            }
            match parse_number(trimmed) {
                Some(v) => Coerced::Value(v),
                None => Coerced::Fallback,
            }
        }
    }
}

/// Parse a trimmed numeric literal.
///
/// Accepts plain decimals / exponents, thousands-grouped decimals
/// (`1,234,567.89`) and accounting negatives (`(1,234)`).
pub fn parse_number(s: &str) -> Option<f64> {
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        return parse_unsigned_or_plain(inner.trim()).filter(|v| *v >= 0.0).map(|v| -v);
    }
    parse_unsigned_or_plain(s)
}

fn parse_unsigned_or_plain(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    if !s.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b',' | b'-' | b'+' | b'e' | b'E')) {
        // Rejects "inf", "NaN" and any other text Rust would accept.
        return None;
    }
    if s.contains(',') {
        return parse_grouped(s);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `-1,234,567.89` style: groups of exactly three digits after the first.
fn parse_grouped(s: &str) -> Option<f64> {
    let (sign, body) = match s.as_bytes().first() {
        Some(b'-') => ("-", &s[1..]),
        Some(b'+') => ("", &s[1..]),
        _ => ("", s),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };

    let mut groups = int_part.split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !first.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut digits = String::from(sign);
    digits.push_str(first);
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.push('.');
        digits.push_str(frac);
    }
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_number("1234"), Some(1234.0));
        assert_eq!(parse_number("-12.5"), Some(-12.5));
        assert_eq!(parse_number("1e6"), Some(1_000_000.0));
        assert_eq!(parse_number("+7"), Some(7.0));
    }

    #[test]
    fn test_grouped_numbers() {
        assert_eq!(parse_number("1,234,567.89"), Some(1_234_567.89));
        assert_eq!(parse_number("-1,000"), Some(-1000.0));
        assert_eq!(parse_number("12,34"), None);
        assert_eq!(parse_number("1,2345"), None);
        assert_eq!(parse_number(",123"), None);
    }

    #[test]
    fn test_accounting_negative() {
        assert_eq!(parse_number("(1,234)"), Some(-1234.0));
        assert_eq!(parse_number("(15.5)"), Some(-15.5));
        assert_eq!(parse_number("(-3)"), None);
    }

    #[test]
    fn test_rejects_text_and_non_finite() {
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("1e999"), None);
        assert_eq!(parse_number("12 000"), None);
    }

    #[test]
    fn test_coerce_cell_kinds() {
        assert_eq!(coerce_cell(&CellInput::Number(5.0)), Coerced::Value(5.0));
        assert_eq!(coerce_cell(&CellInput::Number(f64::NAN)), Coerced::Fallback);
        assert_eq!(coerce_cell(&CellInput::Empty), Coerced::Empty);
        assert_eq!(coerce_cell(&CellInput::Text("  ".into())), Coerced::Empty);
        assert_eq!(coerce_cell(&CellInput::Text(" 42 ".into())), Coerced::Value(42.0));
        assert_eq!(coerce_cell(&CellInput::Text("n/a".into())), Coerced::Fallback);
        assert_eq!(Coerced::Fallback.value(), 0.0);
    }
}
