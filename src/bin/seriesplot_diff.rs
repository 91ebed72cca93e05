use anyhow::{Context, Result};
use seriesplot::diff::parse_cli;
use seriesplot::plot::counting_axis;
use seriesplot::{ChartSpec, DifferenceStat, NamedSeries};

fn main() -> Result<()> {
    let args = parse_cli()?;
    seriesplot::init_logging(args.verbose);
    println!(
        "compare {} with {}",
        args.left.display(),
        args.right.display()
    );

    let left = NamedSeries::from_file_with(&args.left, args.left_label.as_str(), &args.load)
        .with_context(|| format!("failed to load {}", args.left.display()))?;
    let right = NamedSeries::from_file_with(&args.right, args.right_label.as_str(), &args.load)
        .with_context(|| format!("failed to load {}", args.right.display()))?;
    let stat = DifferenceStat::between(&left, &right)?;
    println!("max absolute difference: {}", stat.max);
    println!("mean absolute difference: {}", stat.mean);

    if let Some(output) = &args.output {
        let x_axis = counting_axis(args.start, stat.difference.len())?;
        let left_legend = left.label().to_string();
        let right_legend = right.label().to_string();
        let diff_legend = stat.difference.label().to_string();
        let spec = ChartSpec::new(args.title.as_str(), output.as_path(), x_axis)
            .with_show(args.show)
            .with_series(left, left_legend)
            .with_series(right, right_legend)
            .with_series(stat.difference, diff_legend);
        spec.render()
            .with_context(|| format!("failed to plot {}", output.display()))?;
        println!("plot written to {}", output.display());
    }
    Ok(())
}
