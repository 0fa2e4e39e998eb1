use rand::Rng;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::dna::Genome;
use crate::error::ConfigError;
use crate::settings::EvolutionSettings;

/// canvas dimensions shared read-only by every organism in a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Environment {
    pub width: u32,
    pub height: u32,
}

impl Environment {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyCanvas { width, height });
        }
        Ok(Self { width, height })
    }
}

/// one candidate solution: a genome, the canvas it paints on, and its score.
/// fitness is `None` only between construction and evaluation.
#[derive(Clone, Debug)]
pub struct Organism {
    genome: Genome,
    environment: Arc<Environment>,
    fitness: Option<f64>,
}

impl Organism {
    pub fn new(genome: Genome, environment: Arc<Environment>) -> Self {
        Self { genome, environment, fitness: None }
    }

    /// a fully random genome sized by `settings`. fitness stays unset.
    pub fn create_random<R: Rng>(
        environment: Arc<Environment>,
        settings: &EvolutionSettings,
        rng: &mut R,
    ) -> Self {
        let genome = Genome::random(
            rng,
            environment.width,
            environment.height,
            settings.genome_size,
            settings.vertex_counts(),
        );
        Self::new(genome, environment)
    }

    /// crossover with `other`; see [`Genome::crossover`] for which genes come from where.
    /// the child shares `self`'s environment and is unscored.
    pub fn mate(&self, other: &Organism) -> Organism {
        profiling::scope!("Organism::mate");
        Organism {
            genome: self.genome.crossover(&other.genome),
            environment: Arc::clone(&self.environment),
            fitness: None,
        }
    }

    /// attach a score. organisms are treated as immutable after this.
    pub fn evaluated(self, fitness: f64) -> Organism {
        Organism { fitness: Some(fitness), ..self }
    }

    #[inline]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    #[inline]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    #[inline]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// fitness used for ranking; an unscored organism ranks after every scored one
    #[inline]
    pub fn rank_key(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }

    /// ascending by fitness (lower is better)
    #[inline]
    pub fn cmp_fitness(&self, other: &Organism) -> Ordering {
        self.rank_key().total_cmp(&other.rank_key())
    }
}
