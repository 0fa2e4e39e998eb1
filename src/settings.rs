/// evolution settings for polyevolve
/// loaded from JSON, overridden from the command line, validated before a run starts
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::{ConfigError, EvolveError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionSettings {
    // genome shape
    /// genes (polygons) per genome
    pub genome_size: usize,
    /// fewest vertices a polygon can be created with
    pub min_polygon_size: usize,
    /// most vertices a polygon can be created with
    pub max_polygon_size: usize,

    // population
    /// organisms kept after every generation
    pub population_size: usize,
    /// offspring produced per generation (population_size must exceed twice this)
    pub num_reproductions: usize,

    // scheduling (read by runners, not by the engine itself)
    /// stop issuing steps after this many generations (None = run until stopped)
    pub max_iterations: Option<u64>,
    /// delay between generations in milliseconds
    pub evolution_period_ms: u64,
    /// generations between progress reports
    pub update_interval: u64,

    // reproducibility / throughput
    /// seed for the random initial population
    pub seed: u64,
    /// score each generation's offspring on the rayon pool
    pub parallel_evaluation: bool,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        Self {
            genome_size: 50,
            min_polygon_size: 3,
            max_polygon_size: 6,
            population_size: 300,
            num_reproductions: 50,
            max_iterations: None,
            evolution_period_ms: 0,
            update_interval: 10,
            seed: 0xDEADBEEF,
            parallel_evaluation: false,
        }
    }
}

impl EvolutionSettings {
    /// check every cross-field constraint the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size <= 2 * self.num_reproductions {
            return Err(ConfigError::PopulationTooSmall {
                population_size: self.population_size,
                num_reproductions: self.num_reproductions,
            });
        }
        if self.min_polygon_size == 0 || self.min_polygon_size > self.max_polygon_size {
            return Err(ConfigError::PolygonSizeRange {
                min: self.min_polygon_size,
                max: self.max_polygon_size,
            });
        }
        if self.update_interval == 0 {
            return Err(ConfigError::ZeroUpdateInterval);
        }
        Ok(())
    }

    /// vertex-count range for new polygons
    pub fn vertex_counts(&self) -> RangeInclusive<usize> {
        self.min_polygon_size..=self.max_polygon_size
    }

    /// load settings from a JSON file. missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, EvolveError> {
        let json = std::fs::read_to_string(path).map_err(|source| EvolveError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&json)?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), EvolveError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| EvolveError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String, EvolveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(EvolutionSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_population_must_exceed_twice_reproductions() {
        let settings = EvolutionSettings {
            population_size: 100,
            num_reproductions: 50,
            ..EvolutionSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::PopulationTooSmall { population_size: 100, num_reproductions: 50 })
        );

        let ok = EvolutionSettings { population_size: 101, ..settings };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_polygon_bounds_rejected() {
        let inverted = EvolutionSettings {
            min_polygon_size: 6,
            max_polygon_size: 3,
            ..EvolutionSettings::default()
        };
        assert!(matches!(inverted.validate(), Err(ConfigError::PolygonSizeRange { .. })));

        let zero = EvolutionSettings { min_polygon_size: 0, ..EvolutionSettings::default() };
        assert!(matches!(zero.validate(), Err(ConfigError::PolygonSizeRange { .. })));
    }

    #[test]
    fn test_zero_update_interval_rejected() {
        let settings = EvolutionSettings { update_interval: 0, ..EvolutionSettings::default() };
        assert_eq!(settings.validate(), Err(ConfigError::ZeroUpdateInterval));
    }

    #[test]
    fn test_zero_genome_size_allowed() {
        let settings = EvolutionSettings { genome_size: 0, ..EvolutionSettings::default() };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: EvolutionSettings =
            serde_json::from_str(r#"{ "genome_size": 4, "max_iterations": 20 }"#).unwrap();
        assert_eq!(settings.genome_size, 4);
        assert_eq!(settings.max_iterations, Some(20));
        assert_eq!(settings.population_size, EvolutionSettings::default().population_size);
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("polyevolve-settings-{}.json", std::process::id()));
        let settings = EvolutionSettings { seed: 42, parallel_evaluation: true, ..EvolutionSettings::default() };
        settings.save(&path).unwrap();
        let loaded = EvolutionSettings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EvolutionSettings::load(Path::new("/nonexistent/polyevolve.json")).unwrap_err();
        assert!(matches!(err, EvolveError::SettingsIo { .. }));
    }
}
