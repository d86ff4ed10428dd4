// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application).
//
//   1. `prepare`  — raw log → record files
//   2. `train`    — record files → checkpoints + metrics.csv
//   3. `evaluate` — checkpoint + record file → loss / acc / auc
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PrepareArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "kt-train",
    version,
    about = "Prepare learner interaction logs and train knowledge tracing models."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args)  => run_prepare(args),
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    tracing::info!("Preparing '{}' from {}", args.dataset, args.input);

    let report = PrepareUseCase::new(args.into()).execute()?;
    println!(
        "Prepared {} interactions: {} skills, {} learners ({} train / {} val) in {}",
        report.interactions,
        report.skills,
        report.learners,
        report.train_written,
        report.val_written,
        report.out_dir.display()
    );
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting {} training on dataset '{}'", args.model, args.dataset);

    let summary = TrainUseCase::new(args.into()).execute()?;
    println!(
        "Training complete after {} epochs. Best val auc - {:.3} at epoch {}",
        summary.last.epoch, summary.best.val_auc, summary.best.epoch
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let stats = EvaluateUseCase::new(args.checkpoint_dir, args.records, args.device).execute()?;
    println!(
        "loss - {:.4} acc - {:.3} auc - {:.3}",
        stats.mean_loss, stats.accuracy, stats.auc
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::{model::ModelKind, trainer::ComputeDevice};

    #[test]
    fn test_train_args_defaults() {
        let cli = Cli::try_parse_from(["kt-train", "train", "--dataset", "assistments2009"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };

        let cfg: TrainConfig = args.into();
        assert_eq!(cfg, TrainConfig { dataset: "assistments2009".to_string(), ..TrainConfig::default() });
    }

    #[test]
    fn test_train_args_parse_model_and_device() {
        let cli = Cli::try_parse_from([
            "kt-train", "train", "--dataset", "riid", "--model", "SAKT", "--device", "wgpu", "--max-seq", "50",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.model,   ModelKind::Sakt);
        assert_eq!(args.device,  ComputeDevice::Wgpu);
        assert_eq!(args.max_seq, 50);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let res = Cli::try_parse_from(["kt-train", "train", "--dataset", "riid", "--model", "bkt"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_prepare_requires_input() {
        assert!(Cli::try_parse_from(["kt-train", "prepare", "--dataset", "riid"]).is_err());

        let cli = Cli::try_parse_from([
            "kt-train", "prepare", "--dataset", "riid", "--input", "train.csv", "--seed", "9",
        ])
        .unwrap();
        let Commands::Prepare(args) = cli.command else {
            panic!("expected prepare");
        };
        assert_eq!(args.val_fraction, 0.3);
        assert_eq!(args.seed, Some(9));
    }
}
