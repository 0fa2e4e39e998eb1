//! polyevolve: approximate a target image with a population of evolving
//! polygon genomes.
//!
//! The optimizer core is [`engine::Engine`]; it owns a [`population::Population`]
//! of [`organism::Organism`]s, scores them with a [`fitness::FitnessEvaluator`]
//! and renders phenotypes through the [`render::Renderer`] capability.
//! Runners (the viewer and the headless loop in the binary) call
//! [`engine::Engine::step`] and display the progress it reports.

pub mod dna;
pub mod engine;
pub mod engine_thread;
pub mod error;
pub mod fitness;
pub mod geom;
pub mod organism;
pub mod population;
pub mod render;
pub mod settings;
pub mod target;

pub use engine::{Engine, Progress};
pub use error::{ConfigError, EvolveError};
pub use settings::EvolutionSettings;
