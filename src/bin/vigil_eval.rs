// vigil-eval — run labeled fusion/validation cases through the
// decision core, report precision/recall/F1.
//
// Usage:
//   cargo run --bin vigil-eval -- --dataset schema/eval/
//   cargo run --bin vigil-eval -- --dataset schema/eval/cases.yaml --json
//   cargo run --bin vigil-eval -- --config vigil.yaml --dataset schema/eval/ --kind fusion

use std::path::PathBuf;

use clap::Parser;
use vigil::config::{self, Config, FileSource};
use vigil::eval;

#[derive(Parser)]
#[command(name = "vigil-eval", about = "Vigil eval harness")]
struct Cli {
    /// Path to the vigil config YAML. Defaults apply when omitted.
    #[arg(long, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the eval dataset file or directory
    #[arg(long)]
    dataset: PathBuf,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Filter to a case kind (fusion, validation)
    #[arg(long)]
    kind: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let source = FileSource { path: path.clone() };
            match config::load_config(&source) {
                Ok(c) => {
                    tracing::info!(
                        version = %c.version,
                        environment = %c.environment,
                        contract_hash = %c.contract_hash,
                        "config loaded"
                    );
                    c
                }
                Err(e) => {
                    eprintln!("failed to load config {}: {e}", path.display());
                    std::process::exit(1);
                }
            }
        }
        None => Config::default(),
    };

    let mut dataset = match eval::load_dataset(&cli.dataset) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to load dataset: {e}");
            std::process::exit(1);
        }
    };

    if let Some(ref kind) = cli.kind {
        match kind.as_str() {
            "fusion" => dataset.validation_cases.clear(),
            "validation" => dataset.fusion_cases.clear(),
            other => {
                eprintln!("unknown case kind \"{other}\", expected \"fusion\" or \"validation\"");
                std::process::exit(1);
            }
        }
    }

    if dataset.is_empty() {
        eprintln!("no eval cases found");
        std::process::exit(1);
    }

    eprintln!(
        "running {} eval cases...",
        dataset.fusion_cases.len() + dataset.validation_cases.len()
    );

    let (engine, validator) = eval::build_eval_components(&config);
    let results = eval::run_eval(&dataset, &engine, &validator);
    let mut report = eval::compute_metrics(&results);

    if cli.json {
        report.results = results;
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else {
        println!();
        println!("Vigil Eval Report");
        println!("=================");
        println!();

        for m in &report.metrics {
            println!("Kind: {}", m.kind);
            println!(
                "  TP={} FP={} FN={} TN={} (total={})",
                m.tp, m.fp, m.fn_count, m.tn, m.total
            );
            println!(
                "  Precision={:.1}%  Recall={:.1}%  F1={:.1}%",
                m.precision * 100.0,
                m.recall * 100.0,
                m.f1 * 100.0
            );
            println!();
        }

        let failures: Vec<&eval::EvalResult> = results.iter().filter(|r| !r.correct).collect();
        if failures.is_empty() {
            println!("All {} cases passed.", report.total_cases);
        } else {
            println!(
                "{}/{} cases passed, {} failures:",
                report.total_correct,
                report.total_cases,
                failures.len()
            );
            println!();
            for f in &failures {
                println!(
                    "  FAIL {}: [{}] expected={}, actual={} ({})",
                    f.case_id, f.kind, f.expected, f.actual, f.detail
                );
            }
        }
        println!();
        println!(
            "Accuracy: {:.1}% ({}/{})",
            report.accuracy * 100.0,
            report.total_correct,
            report.total_cases
        );
    }

    if report.total_correct < report.total_cases {
        std::process::exit(1);
    }
}
