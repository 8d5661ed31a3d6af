//! Filament mass/length conversion
//!
//! A filament strand is treated as a cylinder:
//!
//! ```text
//! volume_cm3 = length_mm * π * (diameter_mm / 2)² / 1000
//! mass_g     = volume_cm3 * density_g_per_cm3
//! ```

use std::f64::consts::PI;

use crate::constants::filament::MM3_PER_CM3;
use crate::data::Profile;

/// Mass in grams of `length` mm of filament
///
/// Pure; inputs are not validated, negative values follow the algebra.
pub fn filament_weight(length: f64, diameter: f64, density: f64) -> f64 {
    let radius = diameter / 2.0;
    let volume = length * PI * radius * radius / MM3_PER_CM3;
    volume * density
}

/// Length in mm that weighs `weight` grams, `None` if diameter or density is zero
pub fn filament_length(weight: f64, diameter: f64, density: f64) -> Option<f64> {
    let radius = diameter / 2.0;
    let cross_section = PI * radius * radius;
    if density == 0.0 || cross_section == 0.0 {
        return None;
    }
    let volume = weight / density;
    Some(volume * MM3_PER_CM3 / cross_section)
}

/// [`filament_weight`] using the diameter and density of a profile
pub fn profile_weight(length: f64, profile: &Profile) -> f64 {
    filament_weight(length, profile.diameter, profile.density)
}
