//! Trains the expense-forecasting LSTM and writes the artifact bundle.

use std::path::PathBuf;

use spendcast::config;
use spendcast::logging;
use spendcast::pipeline::{ForecastPipeline, PipelineConfig};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init() {
        eprintln!("Logging unavailable: {err}");
    }
    config::check_deployment_env();

    let pipeline = ForecastPipeline::new(config);
    let summary = pipeline.run().map_err(|err| err.to_string())?;

    println!(
        "trained on {} samples, evaluated on {}",
        summary.train_samples, summary.test_samples
    );
    println!("test MAE:  {:.2}", summary.metrics.mae);
    println!("test RMSE: {:.2}", summary.metrics.rmse);
    println!("test MAPE: {:.4}", summary.metrics.mape);
    if summary.history.stopped_early {
        println!(
            "stopped early after {} epochs (best epoch {})",
            summary.history.train_loss.len(),
            summary.history.best_epoch + 1
        );
    }
    println!("model bundle written to {}", summary.bundle_dir.display());
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<PipelineConfig, String> {
    let mut config = PipelineConfig::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--data" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--data requires a value".to_string())?;
                config.data_path = PathBuf::from(value);
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                config.output_dir = PathBuf::from(value);
            }
            "--window" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--window requires a value".to_string())?;
                config.window_size = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --window value: {value}"))?;
            }
            "--epochs" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--epochs requires a value".to_string())?;
                config.train.epochs = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --epochs value: {value}"))?;
            }
            "--batch" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--batch requires a value".to_string())?;
                config.train.batch_size = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --batch value: {value}"))?;
            }
            "--learning-rate" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--learning-rate requires a value".to_string())?;
                config.train.learning_rate = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid --learning-rate value: {value}"))?;
            }
            "--split" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--split requires a value".to_string())?;
                let ratio = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid --split value: {value}"))?;
                if !(0.0..=1.0).contains(&ratio) {
                    return Err(format!("--split must be within [0, 1], got {value}"));
                }
                config.split_ratio = ratio;
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                config.train.seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--synthetic-len" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--synthetic-len requires a value".to_string())?;
                config.synthetic_len = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --synthetic-len value: {value}"))?;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(config)
}

fn help_text() -> String {
    [
        "spendcast-train",
        "",
        "Trains the expense-forecasting LSTM and writes the model bundle.",
        "",
        "Usage:",
        "  spendcast-train [--data expenses_income_summary.csv] [--out models]",
        "",
        "Options:",
        "  --data <file>         Ledger CSV; a missing file falls back to synthetic data.",
        "  --out <dir>           Bundle output directory (default models)",
        "  --window <n>          Observations per training window (default 30)",
        "  --epochs <n>          Maximum training epochs (default 200)",
        "  --batch <n>           Batch size (default 32)",
        "  --learning-rate <f>   Initial Adam learning rate (default 0.001)",
        "  --split <f>           Chronological train/test ratio (default 0.8)",
        "  --seed <n>            RNG seed (default 42)",
        "  --synthetic-len <n>   Synthetic ledger length on fallback (default 100)",
    ]
    .join("\n")
}
