mod app;
mod app_types;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use polyevolve::engine_thread::spawn_engine;
use polyevolve::target::{load_target, save_png};
use polyevolve::{Engine, EvolutionSettings};

#[derive(Parser)]
#[command(name = "polyevolve")]
#[command(about = "Approximate an image with evolving colored polygons")]
struct Cli {
    /// Target image to approximate
    #[arg(required_unless_present = "dump_settings")]
    image: Option<PathBuf>,

    /// Settings file (JSON); missing fields use defaults
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Run without a window, logging progress
    #[arg(long)]
    headless: bool,

    /// Write the final best phenotype as PNG (headless only)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stop after this many generations
    #[arg(long)]
    generations: Option<u64>,

    /// Polygons per genome
    #[arg(long)]
    genome_size: Option<usize>,

    /// Organisms kept per generation
    #[arg(long)]
    population_size: Option<usize>,

    /// Offspring per generation
    #[arg(long)]
    num_reproductions: Option<usize>,

    /// Generations between progress reports
    #[arg(long)]
    update_interval: Option<u64>,

    /// Delay between generations in milliseconds
    #[arg(long)]
    period_ms: Option<u64>,

    /// Seed for the initial population
    #[arg(long)]
    seed: Option<u64>,

    /// Score offspring in parallel
    #[arg(long)]
    parallel: bool,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    dump_settings: bool,
}

impl Cli {
    fn resolve_settings(&self) -> Result<EvolutionSettings> {
        let mut settings = match &self.settings {
            Some(path) => EvolutionSettings::load(path)?,
            None => EvolutionSettings::default(),
        };
        if let Some(v) = self.generations {
            settings.max_iterations = Some(v);
        }
        if let Some(v) = self.genome_size {
            settings.genome_size = v;
        }
        if let Some(v) = self.population_size {
            settings.population_size = v;
        }
        if let Some(v) = self.num_reproductions {
            settings.num_reproductions = v;
        }
        if let Some(v) = self.update_interval {
            settings.update_interval = v;
        }
        if let Some(v) = self.period_ms {
            settings.evolution_period_ms = v;
        }
        if let Some(v) = self.seed {
            settings.seed = v;
        }
        if self.parallel {
            settings.parallel_evaluation = true;
        }
        settings.validate().context("Settings validation error")?;
        if self.headless && !self.dump_settings && settings.max_iterations.is_none() {
            anyhow::bail!("--headless needs a stopping point: pass --generations or set max_iterations in the settings file");
        }
        Ok(settings)
    }
}

fn run_headless(mut engine: Engine, settings: &EvolutionSettings, output: Option<&PathBuf>) -> Result<()> {
    let period = Duration::from_millis(settings.evolution_period_ms);
    while !engine.is_finished() {
        if let Some(progress) = engine.step() {
            log::info!(
                "gen {:>6} | best {:>14.1} | worst {:>14.1} | mse {:>9.2} | psnr {:>6.2} dB",
                progress.generation,
                progress.best_fitness,
                progress.worst_fitness,
                progress.metrics.mse,
                progress.metrics.psnr
            );
        }
        if !period.is_zero() {
            std::thread::sleep(period);
        }
    }

    let (_, best) = engine.current_best();
    log::info!("finished after {} generations, best fitness {:.1}", engine.generation_count(), best);

    if let Some(path) = output {
        save_png(&engine.render_best(), path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn run_viewer(engine: Engine, settings: &EvolutionSettings) -> Result<()> {
    let target = engine.target().clone();
    let period = Duration::from_millis(settings.evolution_period_ms);
    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "polyevolve",
        native_options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let handle = spawn_engine(engine, period, true, move || ctx.request_repaint())?;
            let app = app::PolyApp::new(cc, &target, true).attach(handle);
            Ok::<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>>(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let settings = cli.resolve_settings()?;

    if cli.dump_settings {
        println!("{}", settings.to_json()?);
        return Ok(());
    }

    if settings.parallel_evaluation {
        // name worker threads so they are easy to spot in a profiler
        let _ = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("rayon-{i}"))
            .build_global();
    }

    let image = cli.image.as_ref().context("No target image given")?;
    let target = load_target(image)?;
    let engine = Engine::new(target, &settings).context("Failed to initialize evolution")?;

    if cli.headless {
        run_headless(engine, &settings, cli.output.as_ref())
    } else {
        if cli.output.is_some() {
            log::warn!("--output is only used with --headless");
        }
        run_viewer(engine, &settings)
    }
}
