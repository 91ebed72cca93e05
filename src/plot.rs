use super::VERSION;
use crate::chart::{LegendPosition, Ticks, XAxis};
use crate::{Delimiter, LoadOptions};
use anyhow::{anyhow, Result};
use clap::{App, Arg, ArgMatches};
use std::path::{Path, PathBuf};

/// Settings for overlaying one or more series files on a single chart.
#[derive(Debug, Clone)]
pub struct PlotArgs {
    pub files: Vec<PathBuf>,
    pub legends: Vec<String>,
    pub output: PathBuf,
    pub title: String,
    /// first x coordinate, one step per record from there
    pub start: i64,
    pub ticks: Option<Ticks>,
    pub legend: bool,
    pub legend_position: LegendPosition,
    pub load: LoadOptions,
    pub show: bool,
    pub verbose: bool,
}

/// Loader arguments shared by the plot and diff apps.
pub(crate) fn load_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    let arg_column = Arg::with_name("column")
        .help("0-based field of each record holding the value")
        .long("column")
        .takes_value(true)
        .default_value("0");
    let arg_delimiter = Arg::with_name("delimiter")
        .help("field delimiter, whitespace when not given")
        .short("d")
        .long("delimiter")
        .takes_value(true);
    let arg_skip = Arg::with_name("skip_header")
        .help("number of leading lines to skip")
        .long("skip-header")
        .takes_value(true)
        .default_value("0");
    let arg_verbose = Arg::with_name("verbose")
        .help("print debug information")
        .short("v")
        .long("verbose")
        .takes_value(false);
    vec![arg_column, arg_delimiter, arg_skip, arg_verbose]
}

pub(crate) fn load_options(cli_args: &ArgMatches) -> Result<LoadOptions> {
    let column = parse_value::<usize>(cli_args, "column")?;
    let skip_header = parse_value::<usize>(cli_args, "skip_header")?;
    let delimiter = match cli_args.value_of("delimiter") {
        None => Delimiter::Whitespace,
        Some(d) => {
            let mut chars = d.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Delimiter::Char(c),
                _ => return Err(anyhow!("delimiter must be a single character, got {:?}", d)),
            }
        }
    };
    Ok(LoadOptions {
        column,
        delimiter,
        skip_header,
        ..LoadOptions::default()
    })
}

pub(crate) fn parse_value<T: std::str::FromStr>(cli_args: &ArgMatches, name: &str) -> Result<T> {
    let raw = cli_args.value_of(name).unwrap_or_default();
    raw.parse::<T>()
        .map_err(|_| anyhow!("invalid value {:?} for {}", raw, name))
}

/// Takes the CLI arguments that control the plotting of the series.
pub fn parse_cli() -> Result<PlotArgs> {
    parse_plot_args(&plot_app().get_matches())
}

fn plot_app<'a, 'b>() -> App<'a, 'b> {
    let arg_files = Arg::with_name("input_files")
        .help("series files, drawn in the given order")
        .short("f")
        .long("file")
        .takes_value(true)
        .multiple(true)
        .number_of_values(1)
        .required(true);
    let arg_legends = Arg::with_name("legends")
        .help("legend label for each file, defaults to the file stem")
        .short("l")
        .long("label")
        .takes_value(true)
        .multiple(true)
        .number_of_values(1);
    let arg_output = Arg::with_name("output_file")
        .help("name of the output image, png or svg")
        .short("o")
        .long("output")
        .takes_value(true);
    let arg_title = Arg::with_name("title")
        .help("chart title")
        .short("t")
        .long("title")
        .takes_value(true)
        .default_value("");
    let arg_start = Arg::with_name("start")
        .help("first x coordinate, the axis then counts up by one per record")
        .short("s")
        .long("start")
        .takes_value(true)
        .allow_hyphen_values(true)
        .default_value("0");
    let arg_ticks = Arg::with_name("ticks")
        .help("explicit x ticks as position=label, e.g. 0=a")
        .long("tick")
        .takes_value(true)
        .multiple(true)
        .number_of_values(1);
    let arg_position = Arg::with_name("legend_position")
        .help("legend placement, e.g. 'best' or 'lower right'")
        .long("legend-position")
        .takes_value(true)
        .default_value("best");
    let arg_no_legend = Arg::with_name("no_legend")
        .help("do not draw the legend")
        .long("no-legend")
        .takes_value(false);
    let arg_show = Arg::with_name("show")
        .help("open the chart in the image viewer once written")
        .long("show")
        .takes_value(false);
    App::new("seriesplot_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot one or more series on the same chart")
        .arg(arg_files)
        .arg(arg_legends)
        .arg(arg_output)
        .arg(arg_title)
        .arg(arg_start)
        .arg(arg_ticks)
        .arg(arg_position)
        .arg(arg_no_legend)
        .arg(arg_show)
        .args(&load_args())
}

fn parse_plot_args(cli_args: &ArgMatches) -> Result<PlotArgs> {
    let files: Vec<PathBuf> = cli_args
        .values_of("input_files")
        .map(|v| v.map(PathBuf::from).collect())
        .unwrap_or_default();
    let mut legends: Vec<String> = cli_args
        .values_of("legends")
        .map(|v| v.map(String::from).collect())
        .unwrap_or_default();
    if legends.len() > files.len() {
        return Err(anyhow!("{} labels for {} files", legends.len(), files.len()));
    }
    for f in files.iter().skip(legends.len()) {
        legends.push(file_stem(f));
    }
    let output = match cli_args.value_of("output_file") {
        Some(p) => PathBuf::from(p),
        None => {
            let mut out = files.first().cloned().unwrap_or_else(|| PathBuf::from("series"));
            out.set_extension("png");
            out
        }
    };
    let ticks = match cli_args.values_of("ticks") {
        Some(raw) => Some(parse_ticks(raw)?),
        None => None,
    };
    let legend_position = cli_args
        .value_of("legend_position")
        .unwrap_or_default()
        .parse::<LegendPosition>()?;
    Ok(PlotArgs {
        files,
        legends,
        output,
        title: cli_args.value_of("title").unwrap_or_default().to_string(),
        start: parse_value::<i64>(cli_args, "start")?,
        ticks,
        legend: !cli_args.is_present("no_legend"),
        legend_position,
        load: load_options(cli_args)?,
        show: cli_args.is_present("show"),
        verbose: cli_args.is_present("verbose"),
    })
}

fn parse_ticks<'a, I: Iterator<Item = &'a str>>(raw: I) -> Result<Ticks> {
    let mut positions = Vec::new();
    let mut labels = Vec::new();
    for t in raw {
        let mut parts = t.splitn(2, '=');
        let pos = parts.next().unwrap_or_default();
        let label = parts
            .next()
            .ok_or_else(|| anyhow!("tick {:?} is not position=label", t))?;
        positions.push(
            pos.trim()
                .parse::<f64>()
                .map_err(|_| anyhow!("invalid tick position {:?}", pos))?,
        );
        labels.push(label.to_string());
    }
    Ok(Ticks::new(positions, labels)?)
}

/// Axis start, start + 1, ... with one coordinate per record.
pub fn counting_axis(start: i64, len: usize) -> Result<XAxis> {
    let end = Some(len as u64)
        .filter(|n| *n <= i64::MAX as u64)
        .and_then(|n| start.checked_add(n as i64))
        .ok_or_else(|| anyhow!("{} records starting at {} run past the end of the x axis", len, start))?;
    Ok(XAxis::Range { start, end })
}

pub fn file_stem(f: &Path) -> String {
    f.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| f.display().to_string())
}
