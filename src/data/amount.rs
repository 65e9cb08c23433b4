//! Numeric normalization for PPP cells: currency markers, thousands separators and
//! exponent notation all collapse to a plain `f64`. Parsing never fails; junk becomes 0.

/// Characters allowed in a "clean" numeric cell before the fast path strips `$`, `,` and spaces.
fn is_plain_numeric_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, ',' | '.' | '-' | '+' | 'e' | 'E' | '$') || ch.is_whitespace()
}

/// Parse an amount such as `27,700,000,000,000`, `$33,598,000,000,000` or `27.7e12`.
pub fn parse_amount(text: &str) -> f64 {
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.chars().all(is_plain_numeric_char) {
        let cleaned: String = trimmed
            .chars()
            .filter(|ch| !matches!(ch, ',' | '$') && !ch.is_whitespace())
            .collect();
        if let Ok(value) = cleaned.parse::<f64>() {
            return value;
        }
    }

    let salvaged: String = trimmed
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'))
        .collect();
    salvaged.parse::<f64>().unwrap_or(0.0)
}

/// Parse a rank cell as a float and truncate toward zero. Anything unparseable is 0 (unranked).
pub fn parse_rank(text: &str) -> i64 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

/// Integer part of an amount, as written to CSV and shown to the user.
pub fn whole_units(amount: f64) -> i64 {
    amount.trunc() as i64
}

/// Render an integer with `,` thousands grouping, e.g. `27700000000000` -> `27,700,000,000,000`.
pub fn format_grouped(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
