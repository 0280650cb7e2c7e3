// src/main.rs
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use colorful::Colorful;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use faciesprob::cli::{format_json, format_summary, Args};
use faciesprob::{
    CancelFlag, ElasticSource, ElasticVolume, ProbabilitySink, ProbabilitySlab, RawElasticSource,
    RawFileSink, Study,
};

/// Advances a progress bar as layers reach the wrapped sink
struct ProgressSink<K> {
    inner: K,
    bar: ProgressBar,
}

impl<K: ProbabilitySink> ProbabilitySink for ProgressSink<K> {
    fn write_layer(&mut self, k: usize, slab: &ProbabilitySlab) -> faciesprob::Result<()> {
        self.inner.write_layer(k, slab)?;
        self.bar.inc(1);
        Ok(())
    }

    fn finish(&mut self) -> faciesprob::Result<()> {
        self.inner.finish()?;
        self.bar.finish_and_clear();
        Ok(())
    }
}

/// Raw directories stream layer by layer; JSON volumes load whole.
fn open_grid(path: &Path) -> faciesprob::Result<Box<dyn ElasticSource>> {
    if path.is_dir() {
        info!("Streaming raw elastic cubes from {}", path.display());
        Ok(Box::new(RawElasticSource::open(path)?))
    } else {
        Ok(Box::new(ElasticVolume::from_path(path)?))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let study = Study::from_path(&args.input)
        .with_context(|| format!("Failed to load study {}", args.input.display()))?;
    let config = args.apply(study.settings.clone());
    let estimator = study
        .estimator_with(config)
        .context("Invalid estimation settings")?;

    let mut estimation = estimator
        .estimate(&study.wells)
        .context("Facies density estimation failed")?;

    if let Some(grid_path) = &args.grid {
        let mut grid = open_grid(grid_path)
            .with_context(|| format!("Failed to load grid {}", grid_path.display()))?;

        let raw = RawFileSink::create(&args.raw_dir, &estimator.config().facies_names)
            .with_context(|| format!("Failed to create {}", args.raw_dir.display()))?;
        let bar = ProgressBar::new(grid.dims().nz as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} layers {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let mut sink = ProgressSink { inner: raw, bar };

        let stats = estimator
            .classify(&estimation, grid.as_mut(), &mut sink, &CancelFlag::new())
            .context("Classification failed")?;
        info!("Probability cubes written to {}", args.raw_dir.display());
        estimation.summary.classification = Some(stats);
    }

    let json = format_json(&estimation.summary).context("Failed to serialise report")?;
    std::fs::write(&args.output, &json)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if args.json {
        println!("{}", json);
    } else {
        print!("{}", format_summary(&estimation.summary, args.verbose));
        let report = args.output.display().to_string();
        println!("\n{} {}", "Report written to".green(), report.as_str().cyan());
    }

    Ok(())
}
