// Evolution driver: owns the population and advances it one generation per
// step(). It never loops on its own; runners decide when to call step().

use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::sync::Arc;

use crate::error::EvolveError;
use crate::fitness::{FitnessEvaluator, MetricsSnapshot};
use crate::organism::Organism;
use crate::population::Population;
use crate::render::{CpuRenderer, PixelBuffer, Renderer};
use crate::settings::EvolutionSettings;

/// Counts generations and fires every `interval` of them
struct ReportThrottle {
    counter: u64,
    interval: u64,
}

impl ReportThrottle {
    fn new(interval: u64) -> Self {
        Self {
            counter: 0,
            interval: interval.max(1),
        }
    }

    /// Check if this generation should be reported, incrementing the counter
    #[inline]
    fn should_report(&mut self) -> bool {
        self.counter += 1;
        self.counter % self.interval == 0
    }
}

/// snapshot handed to whatever is displaying the run
#[derive(Clone, Debug)]
pub struct Progress {
    pub generation: u64,
    pub best_fitness: f64,
    pub worst_fitness: f64,
    pub mean_fitness: f64,
    pub metrics: MetricsSnapshot,
    pub best_phenotype: PixelBuffer,
}

pub struct Engine {
    population: Population,
    evaluator: Arc<FitnessEvaluator>,
    generation: u64,
    max_iterations: Option<u64>,
    throttle: ReportThrottle,
}

impl Engine {
    /// validate settings and build a random, scored population for `target`
    pub fn new(target: PixelBuffer, settings: &EvolutionSettings) -> Result<Self, EvolveError> {
        Self::with_renderer(target, Arc::new(CpuRenderer), settings)
    }

    pub fn with_renderer(
        target: PixelBuffer,
        renderer: Arc<dyn Renderer>,
        settings: &EvolutionSettings,
    ) -> Result<Self, EvolveError> {
        profiling::scope!("Engine::new");
        settings.validate()?;

        let evaluator = Arc::new(FitnessEvaluator::new(target, renderer));
        let environment = Arc::new(evaluator.environment()?);
        let mut rng = Pcg32::seed_from_u64(settings.seed);

        log::debug!(
            "engine for {}x{} target, seed {:#x}",
            environment.width,
            environment.height,
            settings.seed
        );

        let population = Population::initialize(
            settings.population_size,
            environment,
            Arc::clone(&evaluator),
            settings,
            &mut rng,
        )?;

        Ok(Self {
            population,
            evaluator,
            generation: 0,
            max_iterations: settings.max_iterations,
            throttle: ReportThrottle::new(settings.update_interval),
        })
    }

    /// advance exactly one generation. returns a progress snapshot every
    /// `update_interval` generations, `None` otherwise.
    pub fn step(&mut self) -> Option<Progress> {
        profiling::scope!("Engine::step");
        self.population.evolve();
        self.generation += 1;

        if self.throttle.should_report() {
            let progress = self.progress();
            log::debug!(
                "gen {}: best {:.1}, worst {:.1}, psnr {:.2} dB",
                progress.generation,
                progress.best_fitness,
                progress.worst_fitness,
                progress.metrics.psnr
            );
            Some(progress)
        } else {
            None
        }
    }

    /// current state, including a fresh render of the best organism
    pub fn progress(&self) -> Progress {
        let (_, best_fitness) = self.current_best();
        Progress {
            generation: self.generation,
            best_fitness,
            worst_fitness: self.current_worst_fitness(),
            mean_fitness: self.population.mean_fitness(),
            metrics: self.evaluator.metrics(best_fitness),
            best_phenotype: self.render_best(),
        }
    }

    pub fn generation_count(&self) -> u64 {
        self.generation
    }

    pub fn current_best(&self) -> (&Organism, f64) {
        let best = self.population.best();
        (best, best.rank_key())
    }

    pub fn current_worst_fitness(&self) -> f64 {
        self.population.worst().rank_key()
    }

    pub fn render_best(&self) -> PixelBuffer {
        self.evaluator.renderer().render_organism(self.population.best())
    }

    /// advisory: true once `max_iterations` generations have run
    pub fn is_finished(&self) -> bool {
        self.max_iterations.is_some_and(|max| self.generation >= max)
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn target(&self) -> &PixelBuffer {
        self.evaluator.target()
    }
}
