//! Display formatting for KPI values

use crate::metrics::{Direction, Trend};

const MONTH_ABBRS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Compact dollar amount: `$2M`, `$1.5M`, `$300K`, `$45`
pub fn fmt_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        let m = value / 1_000_000.0;
        if m.fract() != 0.0 {
            format!("${:.1}M", m)
        } else {
            format!("${:.0}M", m)
        }
    } else if abs >= 1_000.0 {
        format!("${:.0}K", value / 1_000.0)
    } else {
        format!("${:.0}", value)
    }
}

/// Trend badge text, e.g. `↑ 12.50%`; `—` when undefined
pub fn fmt_trend(trend: Option<&Trend>) -> String {
    match trend {
        Some(t) => {
            let arrow = match t.direction {
                Direction::Up => "↑",
                Direction::Down => "↓",
                Direction::Flat => "→",
            };
            format!("{} {:.2}%", arrow, t.pct.abs())
        }
        None => "—".to_string(),
    }
}

/// Optional value with a fallback dash
pub fn fmt_opt(value: Option<f64>, f: impl Fn(f64) -> String) -> String {
    value.map(f).unwrap_or_else(|| "—".to_string())
}

/// Five-star rating rounded to the nearest star
pub fn stars(score: Option<f64>) -> String {
    let filled = score.map(|s| s.round().clamp(0.0, 5.0) as usize).unwrap_or(0);
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn month_abbr(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBRS.get(i as usize))
        .copied()
        .unwrap_or("???")
}

/// Parse `Jan`..`Dec` (any case) or `1`..`12`
pub fn parse_month(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    MONTH_ABBRS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(s))
        .map(|i| i as u32 + 1)
}
