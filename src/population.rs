//! Sorted population with truncation selection.
//!
//! Organisms are kept in a `Vec` ordered by ascending fitness. Offspring are
//! placed with a binary search (after any organisms of equal fitness, so ties
//! keep arrival order) and the worst organisms are popped off the end.

use rand::Rng;
use rayon::prelude::*;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::fitness::FitnessEvaluator;
use crate::organism::{Environment, Organism};
use crate::settings::EvolutionSettings;

pub struct Population {
    organisms: Vec<Organism>,
    max_size: usize,
    num_reproductions: usize,
    parallel_evaluation: bool,
    evaluator: Arc<FitnessEvaluator>,
}

impl Population {
    /// `size` random organisms, scored and sorted. `size` becomes the capacity
    /// and must exceed twice `settings.num_reproductions`.
    pub fn initialize<R: Rng>(
        size: usize,
        environment: Arc<Environment>,
        evaluator: Arc<FitnessEvaluator>,
        settings: &EvolutionSettings,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        profiling::scope!("Population::initialize");
        if size <= 2 * settings.num_reproductions {
            log::warn!(
                "rejecting population of {} with {} reproductions per generation",
                size,
                settings.num_reproductions
            );
            return Err(ConfigError::PopulationTooSmall {
                population_size: size,
                num_reproductions: settings.num_reproductions,
            });
        }

        let organisms: Vec<Organism> = (0..size)
            .map(|_| Organism::create_random(Arc::clone(&environment), settings, rng))
            .collect();
        let organisms = score_all(&evaluator, organisms, settings.parallel_evaluation);

        let mut population = Self {
            organisms: Vec::with_capacity(size + settings.num_reproductions),
            max_size: size,
            num_reproductions: settings.num_reproductions,
            parallel_evaluation: settings.parallel_evaluation,
            evaluator,
        };
        population.merge(organisms);

        log::info!(
            "initialized population of {} ({} genes each, best fitness {:.1})",
            size,
            settings.genome_size,
            population.best().rank_key()
        );
        Ok(population)
    }

    /// one generation: procreate, merge offspring, truncate to capacity
    pub fn evolve(&mut self) {
        profiling::scope!("Population::evolve");
        let offspring = self.procreate();
        self.merge(offspring);
        self.decimate();
    }

    /// mate the i-th fittest with the (i + n)-th fittest for each i < n and
    /// score the children. the population itself is not changed.
    pub fn procreate(&self) -> Vec<Organism> {
        profiling::scope!("Population::procreate");
        let children: Vec<Organism> = self
            .parent_pairs()
            .map(|(left, right)| self.organisms[left].mate(&self.organisms[right]))
            .collect();
        score_all(&self.evaluator, children, self.parallel_evaluation)
    }

    /// index pairs `(i, i + n)` used by `procreate`, fittest tier first
    pub fn parent_pairs(&self) -> impl Iterator<Item = (usize, usize)> {
        let n = self.num_reproductions;
        (0..n).map(move |i| (i, i + n))
    }

    /// insert scored organisms keeping ascending fitness order
    pub fn merge(&mut self, organisms: Vec<Organism>) {
        profiling::scope!("Population::merge");
        for organism in organisms {
            self.insert(organism);
        }
    }

    /// binary-search insertion after any organisms with equal fitness
    pub fn insert(&mut self, organism: Organism) {
        debug_assert!(organism.fitness().is_some(), "inserting an unscored organism");
        let key = organism.rank_key();
        let at = self.organisms.partition_point(|o| o.rank_key().total_cmp(&key).is_le());
        self.organisms.insert(at, organism);
    }

    /// drop the worst organisms until the population is back at capacity
    pub fn decimate(&mut self) {
        profiling::scope!("Population::decimate");
        while self.organisms.len() > self.max_size {
            self.organisms.pop();
        }
    }

    pub fn best(&self) -> &Organism {
        &self.organisms[0]
    }

    pub fn worst(&self) -> &Organism {
        &self.organisms[self.organisms.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&Organism> {
        self.organisms.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Organism> {
        self.organisms.iter()
    }

    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    pub fn mean_fitness(&self) -> f64 {
        let sum: f64 = self.organisms.iter().map(Organism::rank_key).sum();
        sum / self.organisms.len() as f64
    }
}

/// score a batch, optionally on the rayon pool. order of the result matches the input.
fn score_all(evaluator: &FitnessEvaluator, organisms: Vec<Organism>, parallel: bool) -> Vec<Organism> {
    if parallel {
        organisms.into_par_iter().map(|o| evaluator.score(o)).collect()
    } else {
        organisms.into_iter().map(|o| evaluator.score(o)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::{Color, Gene, Genome, Polygon};
    use crate::geom::Point;
    use crate::render::{CpuRenderer, PixelBuffer};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup(w: u32, h: u32, target: Color) -> (Arc<Environment>, Arc<FitnessEvaluator>) {
        let env = Arc::new(Environment::new(w, h).unwrap());
        let eval = Arc::new(FitnessEvaluator::new(PixelBuffer::filled(w, h, target), Arc::new(CpuRenderer)));
        (env, eval)
    }

    fn small_settings() -> EvolutionSettings {
        EvolutionSettings {
            genome_size: 6,
            population_size: 30,
            num_reproductions: 10,
            ..EvolutionSettings::default()
        }
    }

    fn assert_sorted(pop: &Population) {
        let fits: Vec<f64> = pop.iter().map(|o| o.fitness().unwrap()).collect();
        assert!(fits.windows(2).all(|w| w[0] <= w[1]), "not sorted: {fits:?}");
    }

    #[test]
    fn test_initialize_sorted_and_scored() {
        let (env, eval) = setup(8, 8, Color::rgba(50, 60, 70, 255));
        let settings = small_settings();
        let mut rng = Pcg32::seed_from_u64(1);
        let pop = Population::initialize(30, env, eval, &settings, &mut rng).unwrap();
        assert_eq!(pop.len(), 30);
        assert_eq!(pop.max_size(), 30);
        assert!(pop.iter().all(|o| o.fitness().is_some_and(|f| f >= 0.0)));
        assert_sorted(&pop);
        assert!(pop.best().fitness() <= pop.worst().fitness());
    }

    #[test]
    fn test_initialize_rejects_small_population() {
        let (env, eval) = setup(4, 4, Color::rgba(0, 0, 0, 255));
        let settings = small_settings();
        let mut rng = Pcg32::seed_from_u64(1);
        let err = Population::initialize(20, env, eval, &settings, &mut rng).err();
        assert_eq!(
            err,
            Some(ConfigError::PopulationTooSmall { population_size: 20, num_reproductions: 10 })
        );
    }

    #[test]
    fn test_evolve_keeps_size_and_order() {
        let (env, eval) = setup(10, 6, Color::rgba(200, 10, 90, 255));
        let settings = small_settings();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut pop = Population::initialize(30, env, eval, &settings, &mut rng).unwrap();
        for _ in 0..15 {
            let best_before = pop.best().fitness().unwrap();
            pop.evolve();
            assert_eq!(pop.len(), pop.max_size());
            assert_sorted(&pop);
            assert!(pop.best().fitness().unwrap() <= best_before);
        }
    }

    #[test]
    fn test_parent_pairs_scenario() {
        let (env, eval) = setup(4, 4, Color::rgba(0, 0, 0, 255));
        let settings = EvolutionSettings {
            genome_size: 2,
            population_size: 300,
            num_reproductions: 50,
            ..EvolutionSettings::default()
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let pop = Population::initialize(300, env, eval, &settings, &mut rng).unwrap();
        let pairs: Vec<(usize, usize)> = pop.parent_pairs().collect();
        assert_eq!(pairs.len(), 50);
        assert_eq!(pairs[0], (0, 50));
        assert_eq!(pairs[49], (49, 99));
    }

    #[test]
    fn test_procreate_mates_ranked_pairs() {
        let (env, eval) = setup(6, 6, Color::rgba(120, 120, 120, 255));
        let settings = EvolutionSettings {
            genome_size: 4,
            population_size: 9,
            num_reproductions: 4,
            ..EvolutionSettings::default()
        };
        let mut rng = Pcg32::seed_from_u64(4);
        let pop = Population::initialize(9, env, eval, &settings, &mut rng).unwrap();
        let children = pop.procreate();
        assert_eq!(children.len(), 4);
        for (child, (l, r)) in children.iter().zip(pop.parent_pairs()) {
            let expected = pop.get(l).unwrap().mate(pop.get(r).unwrap());
            assert_eq!(child.genome(), expected.genome());
            assert_eq!(child.fitness(), Some(pop.evaluator().evaluate(&expected)));
        }
        // procreate leaves the population alone
        assert_eq!(pop.len(), 9);
    }

    #[test]
    fn test_insert_is_stable_for_ties() {
        let (env, eval) = setup(2, 2, Color::rgba(0, 0, 0, 0));
        let settings = EvolutionSettings {
            genome_size: 0,
            population_size: 3,
            num_reproductions: 1,
            ..EvolutionSettings::default()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let mut pop = Population::initialize(3, Arc::clone(&env), eval, &settings, &mut rng).unwrap();
        // empty genomes on a transparent target all score zero
        assert!(pop.iter().all(|o| o.fitness() == Some(0.0)));

        let marker = Genome::new(vec![Gene::new(Polygon::new(vec![Point::new(1, 1)]), Color::rgba(9, 9, 9, 9))]);
        pop.insert(Organism::new(marker.clone(), env).evaluated(0.0));
        assert_eq!(pop.len(), 4);
        assert_eq!(pop.worst().genome(), &marker);
        pop.decimate();
        assert_eq!(pop.len(), 3);
        assert!(pop.iter().all(|o| o.genome().is_empty()));
    }

    /// one single-pixel gene per column of a `colors.len() x 1` canvas
    fn pixel_row(env: &Arc<Environment>, colors: &[Color]) -> Organism {
        let genes = colors
            .iter()
            .enumerate()
            .map(|(x, &c)| Gene::new(Polygon::new(vec![Point::new(x as u32, 0)]), c))
            .collect();
        Organism::new(Genome::new(genes), Arc::clone(env))
    }

    #[test]
    fn test_crossover_can_beat_the_best() {
        let t = Color::rgba(200, 40, 120, 255);
        let (env, eval) = setup(4, 1, t);
        let settings = EvolutionSettings {
            genome_size: 4,
            min_polygon_size: 3,
            max_polygon_size: 6,
            population_size: 5,
            num_reproductions: 2,
            ..EvolutionSettings::default()
        };
        let mut rng = Pcg32::seed_from_u64(11);
        let mut pop = Population::initialize(5, Arc::clone(&env), Arc::clone(&eval), &settings, &mut rng).unwrap();

        // best has one bad gene in the crossover window; rank 2 has that gene right
        let a = pixel_row(&env, &[t, t, Color::rgba(202, 40, 120, 255), t]);
        let f1 = pixel_row(&env, &[Color::rgba(203, 40, 120, 255), t, t, t]);
        let b = pixel_row(&env, &[Color::rgba(200, 44, 120, 255), t, t, t]);
        let f2 = pixel_row(&env, &[Color::rgba(205, 40, 120, 255), t, t, t]);
        pop.merge([a, f1, b, f2].into_iter().map(|o| eval.score(o)).collect());
        pop.decimate();

        let top: Vec<Option<f64>> = pop.iter().take(4).map(Organism::fitness).collect();
        assert_eq!(top, vec![Some(4.0), Some(9.0), Some(16.0), Some(25.0)]);

        pop.evolve();
        assert_eq!(pop.best().fitness(), Some(0.0));
        assert_eq!(pop.best().genome(), pixel_row(&env, &[t, t, t, t]).genome());
        assert_sorted(&pop);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (env, eval) = setup(12, 12, Color::rgba(30, 200, 30, 255));
        let serial = small_settings();
        let parallel = EvolutionSettings { parallel_evaluation: true, ..small_settings() };

        let mut a = Population::initialize(30, Arc::clone(&env), Arc::clone(&eval), &serial, &mut Pcg32::seed_from_u64(8)).unwrap();
        let mut b = Population::initialize(30, env, eval, &parallel, &mut Pcg32::seed_from_u64(8)).unwrap();
        for _ in 0..5 {
            a.evolve();
            b.evolve();
        }
        let fa: Vec<Option<f64>> = a.iter().map(Organism::fitness).collect();
        let fb: Vec<Option<f64>> = b.iter().map(Organism::fitness).collect();
        assert_eq!(fa, fb);
    }

    #[test]
    fn test_mean_fitness_between_best_and_worst() {
        let (env, eval) = setup(5, 5, Color::rgba(255, 255, 255, 255));
        let mut rng = Pcg32::seed_from_u64(6);
        let pop = Population::initialize(30, env, eval, &small_settings(), &mut rng).unwrap();
        let mean = pop.mean_fitness();
        assert!(mean >= pop.best().rank_key());
        assert!(mean <= pop.worst().rank_key());
    }
}
