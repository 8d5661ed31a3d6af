/*
 * Test utilities for Filament Manager
 *
 * Builders for profiles, spools and scenarios shared by the unit tests.
 */

#[cfg(test)]
pub mod test_utils {
    use fm_core::{FilamentTelemetry, PluginSettings, Profile, Spool};

    use crate::app::App;
    use crate::backend::MemoryBackend;

    /// PLA-like profile, 1.75 mm at 1.25 g/cm³
    pub fn create_test_profile(id: u64) -> Profile {
        Profile {
            id: Some(id),
            vendor: "Generic".to_string(),
            material: "PLA".to_string(),
            density: 1.25,
            diameter: 1.75,
        }
    }

    /// 1000 g spool of [`create_test_profile`] with `used` grams consumed
    pub fn create_test_spool(id: u64, profile_id: u64, used: f64) -> Spool {
        Spool {
            id: Some(id),
            name: format!("Spool {}", id),
            profile: create_test_profile(profile_id),
            cost: 20.0,
            total_weight: 1000.0,
            used,
            temp_offset: 0.0,
        }
    }

    pub fn create_test_telemetry(lengths: &[f64]) -> Vec<FilamentTelemetry> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, l)| FilamentTelemetry::new(format!("tool{}", i), *l))
            .collect()
    }

    /// App backed by one profile and the given spools
    pub fn create_test_app(spools: Vec<Spool>) -> App {
        App::new(
            PluginSettings::default(),
            MemoryBackend::new(vec![create_test_profile(1)], spools),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use fm_core::validate_spool;

    #[test]
    fn test_builders_produce_valid_data() {
        assert!(validate_spool(&create_test_spool(1, 1, 0.0)).is_ok());
        assert_eq!(create_test_telemetry(&[1.0, 2.0])[1].tool_name, "tool1");
        assert!(create_test_app(vec![]).shown_notices().is_empty());
    }
}
