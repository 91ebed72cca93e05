use anyhow::{anyhow, Context, Result};
use seriesplot::plot::{counting_axis, parse_cli};
use seriesplot::{ChartSpec, NamedSeries};

fn main() -> Result<()> {
    let args = parse_cli()?;
    seriesplot::init_logging(args.verbose);
    println!(
        "read data from {} file(s) and plot to {}",
        args.files.len(),
        args.output.display()
    );

    let mut loaded: Vec<NamedSeries> = Vec::with_capacity(args.files.len());
    for f in args.files.iter() {
        let label = seriesplot::plot::file_stem(f);
        let series = NamedSeries::from_file_with(f, label, &args.load)
            .with_context(|| format!("failed to load {}", f.display()))?;
        loaded.push(series);
    }
    let len = loaded
        .first()
        .map(|s| s.len())
        .ok_or_else(|| anyhow!("no input files"))?;

    let x_axis = counting_axis(args.start, len)?;
    let mut spec = ChartSpec::new(args.title.as_str(), args.output.as_path(), x_axis)
        .with_legend(args.legend, args.legend_position)
        .with_show(args.show);
    if let Some(ticks) = args.ticks.clone() {
        spec = spec.with_ticks(ticks);
    }
    for (series, legend) in loaded.into_iter().zip(args.legends.iter()) {
        spec = spec.with_series(series, legend.as_str());
    }
    spec.render()
        .with_context(|| format!("failed to plot {}", args.output.display()))?;
    Ok(())
}
