//! Display formatting for report cells. Money is rounded to cents and grouped
//! by thousands; ratios are shown as percentages.

const NA: &str = "n/a";

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

/// `1234.565` → `"$1,234.57"`, `-0.5` → `"-$0.50"`.
pub fn money(v: f64) -> String {
    if !v.is_finite() {
        return NA.to_string();
    }
    let cents = (v.abs() * 100.0).round() as u128;
    let sign = if v < 0.0 && cents > 0 { "-" } else { "" };
    let units = group_thousands(&(cents / 100).to_string());
    format!("{sign}${units}.{:02}", cents % 100)
}

/// Rounding that never yields a `-0` rendering.
fn scaled(ratio: f64, decimals: usize) -> f64 {
    let v = ratio * 100.0;
    let half_ulp = 0.5 * 10f64.powi(-(decimals as i32));
    if v.abs() < half_ulp { 0.0 } else { v }
}

/// `0.1234` → `"12.34%"` (with `decimals = 2`).
pub fn pct(ratio: f64, decimals: usize) -> String {
    if !ratio.is_finite() {
        return NA.to_string();
    }
    format!("{:.*}%", decimals, scaled(ratio, decimals))
}

/// Like [`pct`] but always signed: `"+3.20%"`, `"-10.00%"`, `"0.00%"`.
pub fn signed_pct(ratio: f64, decimals: usize) -> String {
    if !ratio.is_finite() {
        return NA.to_string();
    }
    let v = scaled(ratio, decimals);
    if v > 0.0 {
        format!("+{:.*}%", decimals, v)
    } else {
        format!("{:.*}%", decimals, v)
    }
}
