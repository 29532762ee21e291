//! Text rendering of sample values and spans for the summary table.

use crate::series::SeriesTransform;

/// Render `value` rounded to `decimals` places with `,` between thousands.
///
/// A value that rounds to zero is printed without a sign.
///
/// # Examples
///
/// ```
/// use perfplot_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (digits, fraction) = match fixed.split_once('.') {
        Some((digits, fraction)) => (digits, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + digits.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Render one sample of a series at the precision its transform warrants.
///
/// Memory series are already in megabytes, so three places keep kilobyte
/// resolution; everything else gets two.
pub fn format_sample(value: f64, transform: SeriesTransform) -> String {
    match transform {
        SeriesTransform::Default => format_number(value, 2),
        SeriesTransform::Memory => format_number(value, 3),
    }
}

/// Format an elapsed span given in minutes.
///
/// * `< 60` minutes → `"45m"`
/// * `≥ 60` minutes, no remainder → `"3h"`
/// * `≥ 60` minutes, with remainder → `"3h 45m"`
///
/// # Examples
///
/// ```
/// use perfplot_core::formatting::format_elapsed;
///
/// assert_eq!(format_elapsed(45.0),  "45m");
/// assert_eq!(format_elapsed(180.0), "3h");
/// assert_eq!(format_elapsed(507.9), "8h 28m");
/// ```
pub fn format_elapsed(minutes: f64) -> String {
    let total_mins = minutes.round() as i64;
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}
