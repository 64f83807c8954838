//! Text formatting for the summary metrics.

/// Thousands-grouped integer, e.g. `1,234,567`
pub fn format_units(units: i128) -> String {
    let digits = units.unsigned_abs().to_string();
    let grouped = group_thousands(&digits);
    if units < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Dollar amount with two decimals and thousands separators
///
/// The sign follows the dollar symbol (`$-1,234.50`). NaN renders as
/// `$nan`, never as a zero amount.
///
/// # Examples
/// ```
/// use dashboard::format::format_currency;
///
/// assert_eq!(format_currency(1234.5), "$1,234.50");
/// assert_eq!(format_currency(f64::NAN), "$nan");
/// ```
pub fn format_currency(amount: f64) -> String {
    if amount.is_nan() {
        return "$nan".to_string();
    }
    if amount.is_infinite() {
        return if amount > 0.0 { "$inf" } else { "$-inf" }.to_string();
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${}{}.{}", sign, group_thousands(whole), cents)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
