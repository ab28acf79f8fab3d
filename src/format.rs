//! Display helpers for market figures shared by templates and post text.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a USD price. Prices at or above one dollar get two decimals and
/// thousands separators, sub-dollar prices keep four significant digits.
pub fn usd_price(value: f64) -> String {
    let Some(decimal) = Decimal::from_f64(value) else {
        return "$—".to_string();
    };

    if decimal.abs() >= Decimal::ONE {
        let rounded = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("${}", group_thousands(&format!("{:.2}", rounded)))
    } else if decimal.is_zero() {
        "$0.00".to_string()
    } else {
        let magnitude = value.abs().log10().floor() as i32;
        let dp = (3 - magnitude).clamp(2, 12) as u32;
        format!(
            "${}",
            decimal
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
                .normalize()
        )
    }
}

/// Format a USD amount compactly (`$1.20B`, `$350.5M`, `$12.3K`).
pub fn usd_compact(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1e12 {
        format!("{sign}${:.2}T", abs / 1e12)
    } else if abs >= 1e9 {
        format!("{sign}${:.2}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{sign}${:.2}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{sign}${:.1}K", abs / 1e3)
    } else {
        format!("{sign}${:.2}", abs)
    }
}

/// Format a percentage change with an explicit sign (`+2.35%`, `-1.50%`).
pub fn percent_change(value: f64) -> String {
    let rounded = Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value);
    if rounded >= 0.0 {
        format!("+{:.2}%", rounded)
    } else {
        format!("{:.2}%", rounded)
    }
}

/// Arrow glyph for the direction of a change.
pub fn trend_arrow(value: f64) -> &'static str {
    if value > 0.0 {
        "📈"
    } else if value < 0.0 {
        "📉"
    } else {
        "➡️"
    }
}

fn group_thousands(number: &str) -> String {
    let (sign, rest) = number
        .strip_prefix('-')
        .map_or(("", number), |rest| ("-", rest));
    let (int_part, frac_part) = rest.split_once('.').unwrap_or((rest, ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_price() {
        assert_eq!(usd_price(2500.123456), "$2,500.12");
        assert_eq!(usd_price(1.5), "$1.50");
        assert_eq!(usd_price(0.0), "$0.00");
        assert_eq!(usd_price(0.000123456), "$0.0001235");
    }

    #[test]
    fn test_usd_compact() {
        assert_eq!(usd_compact(1.2e9), "$1.20B");
        assert_eq!(usd_compact(350_500_000.0), "$350.50M");
        assert_eq!(usd_compact(12_345.0), "$12.3K");
        assert_eq!(usd_compact(-2.5e12), "-$2.50T");
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(-1.5), "-1.50%");
        assert_eq!(percent_change(2.346), "+2.35%");
        assert_eq!(percent_change(0.0), "+0.00%");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1234567.89"), "1,234,567.89");
        assert_eq!(group_thousands("-1000"), "-1,000");
        assert_eq!(group_thousands("999"), "999");
    }
}
