use anyhow::{bail, Context, Result};
use seriesplot::batch::{parse_cli, run_batch, BatchConfig};

fn main() -> Result<()> {
    let (batch_file, fail_fast, charts, verbose) = parse_cli();
    seriesplot::init_logging(verbose);

    let mut config = BatchConfig::load(&batch_file)
        .with_context(|| format!("failed to load {}", batch_file.display()))?;
    if fail_fast {
        config.fail_fast = true;
    }
    if !charts.is_empty() {
        config.retain(&charts)?;
    }
    println!(
        "rendering {} chart(s) from {}",
        config.charts.len(),
        batch_file.display()
    );

    let report = run_batch(&config);
    for outcome in report.outcomes.iter() {
        match &outcome.result {
            Ok(summary) => {
                println!("{}: {}", outcome.id, summary.output.display());
                if let Some(d) = &summary.difference {
                    println!("{}: {}", outcome.id, d);
                }
            }
            Err(e) => println!("{}: FAILED ({}) {}", outcome.id, e.kind(), e),
        }
    }
    let failed = report.failures().count();
    if failed > 0 {
        bail!("{} of {} chart(s) failed", failed, config.charts.len());
    }
    Ok(())
}
