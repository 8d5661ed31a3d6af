//! Display Formatting Helpers
//!
//! Formatting of filament lengths, weights and spool costs for the sidebar
//! and the CLI. Frontend-agnostic; callers pass the currency symbol.

use crate::constants::filament::MM_PER_M;
use crate::data::Spool;

/// Format the filament needed by one tool
///
/// `"2.50m"` for the length alone, `"2.50m / 7.52g"` once a weight is known.
/// A missing or zero length renders as `"-"`.
pub fn format_filament_with_weight(length_mm: f64, weight_g: Option<f64>) -> String {
    if length_mm == 0.0 || !length_mm.is_finite() {
        return "-".to_string();
    }

    let mut result = format_length_m(length_mm);
    if let Some(weight) = weight_g.filter(|w| *w != 0.0) {
        result.push_str(" / ");
        result.push_str(&format_weight(weight));
    }
    result
}

/// Format a length given in mm as metres with two decimals
pub fn format_length_m(length_mm: f64) -> String {
    format!("{:.2}m", length_mm / MM_PER_M)
}

/// Format a mass in grams
pub fn format_weight(weight_g: f64) -> String {
    format!("{:.2}g", weight_g)
}

/// Format a cost with an explicit currency symbol
pub fn format_cost_with_symbol(cost: f64, symbol: &str) -> String {
    format!("{:.2} {}", cost, symbol)
}

/// Remaining weight of a spool out of its nominal weight, e.g. `"750.00g / 1000.00g"`
pub fn format_remaining(spool: &Spool) -> String {
    format!(
        "{} / {}",
        format_weight(spool.remaining()),
        format_weight(spool.total_weight)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_filament_with_weight() {
        assert_eq!(format_filament_with_weight(0.0, Some(3.0)), "-");
        assert_eq!(format_filament_with_weight(2500.0, None), "2.50m");
        assert_eq!(format_filament_with_weight(2500.0, Some(0.0)), "2.50m");
        assert_eq!(format_filament_with_weight(1000.0, Some(3.00658)), "1.00m / 3.01g");
    }

    #[test]
    fn test_format_cost_with_symbol() {
        assert_eq!(format_cost_with_symbol(20.0, "€"), "20.00 €");
        assert_eq!(format_cost_with_symbol(19.999, "$"), "20.00 $");
    }

    #[test]
    fn test_format_remaining() {
        let spool = Spool {
            used: 250.0,
            ..Spool::default()
        };
        assert_eq!(format_remaining(&spool), "750.00g / 1000.00g");
    }
}
