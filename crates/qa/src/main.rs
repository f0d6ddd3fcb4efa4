use aerogp::{AEROGP_LOG, FixedSlices, GpFileFormat, GprModel};
use aerogp_gp::metrics::PredictScore;
use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use env_logger::{Builder, Env};
use log::info;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Binary,
}

impl From<Format> for GpFileFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => GpFileFormat::Json,
            Format::Binary => GpFileFormat::Binary,
        }
    }
}

/// Report hyperparameters, cross-validation Q² and grid optimum of a saved surrogate
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Saved model file
    model: String,
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Number of cross-validation folds, 0 for leave-one-out
    #[arg(short, long, default_value_t = 5)]
    kfold: usize,
    /// Number of grid levels per variable of the optimum search
    #[arg(short, long, default_value_t = 50)]
    resolution: usize,
}

fn main() -> Result<()> {
    let env = Env::new().filter_or(AEROGP_LOG, "info");
    Builder::from_env(env)
        .target(env_logger::Target::Stdout)
        .try_init()
        .ok();

    let args = Args::parse();
    let model = GprModel::load(&args.model, args.format.into())?;
    let Ok(gp) = model.fitted() else {
        bail!("{} holds no fitted surrogate", args.model);
    };

    println!("output = {}", model.output_key());
    println!("variables = {:?}", model.variables());
    println!("limits = {:?}", model.limits());
    println!("training data = {} points", gp.training_data().0.nrows());
    let (lo, up) = model.output_range()?;
    println!("output range = [{lo}, {up}]");
    println!("{gp}");

    info!("Cross-validate surrogate of '{}'", model.output_key());
    let q2 = if args.kfold == 0 {
        gp.looq2_score()?
    } else {
        gp.q2_score(args.kfold)?
    };
    println!("q2 = {q2}");

    let optimum =
        model.find_global_max_min_values(model.output_key(), &FixedSlices::new(), args.resolution)?;
    println!("{optimum}");
    Ok(())
}
