use super::VERSION;
use crate::plot::{file_stem, load_args, load_options, parse_value};
use crate::LoadOptions;
use anyhow::Result;
use clap::{App, Arg, ArgMatches};
use std::path::PathBuf;

/// Settings for comparing two series.
#[derive(Debug, Clone)]
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    pub left_label: String,
    pub right_label: String,
    /// when given, the two series and their difference are drawn here
    pub output: Option<PathBuf>,
    pub title: String,
    pub start: i64,
    pub load: LoadOptions,
    pub show: bool,
    pub verbose: bool,
}

/// Takes the CLI arguments to compare two series.
pub fn parse_cli() -> Result<DiffArgs> {
    parse_diff_args(&diff_app().get_matches())
}

fn diff_app<'a, 'b>() -> App<'a, 'b> {
    let arg_left = Arg::with_name("left")
        .help("first series file")
        .short("a")
        .long("left")
        .takes_value(true)
        .required(true);
    let arg_right = Arg::with_name("right")
        .help("second series file")
        .short("b")
        .long("right")
        .takes_value(true)
        .required(true);
    let arg_left_label = Arg::with_name("left_label")
        .help("label of the first series, defaults to the file stem")
        .long("left-label")
        .takes_value(true);
    let arg_right_label = Arg::with_name("right_label")
        .help("label of the second series, defaults to the file stem")
        .long("right-label")
        .takes_value(true);
    let arg_output = Arg::with_name("output_file")
        .help("also plot both series and their difference to this image")
        .short("o")
        .long("output")
        .takes_value(true);
    let arg_title = Arg::with_name("title")
        .help("chart title")
        .short("t")
        .long("title")
        .takes_value(true)
        .default_value("Absolute difference");
    let arg_start = Arg::with_name("start")
        .help("first x coordinate of the chart")
        .short("s")
        .long("start")
        .takes_value(true)
        .allow_hyphen_values(true)
        .default_value("0");
    let arg_show = Arg::with_name("show")
        .help("open the chart in the image viewer once written")
        .long("show")
        .takes_value(false);
    App::new("seriesplot_diff")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to compute the absolute difference of two series")
        .arg(arg_left)
        .arg(arg_right)
        .arg(arg_left_label)
        .arg(arg_right_label)
        .arg(arg_output)
        .arg(arg_title)
        .arg(arg_start)
        .arg(arg_show)
        .args(&load_args())
}

fn parse_diff_args(cli_args: &ArgMatches) -> Result<DiffArgs> {
    let left = PathBuf::from(cli_args.value_of("left").unwrap_or_default());
    let right = PathBuf::from(cli_args.value_of("right").unwrap_or_default());
    let left_label = match cli_args.value_of("left_label") {
        Some(l) => l.to_string(),
        None => file_stem(&left),
    };
    let right_label = match cli_args.value_of("right_label") {
        Some(l) => l.to_string(),
        None => file_stem(&right),
    };
    Ok(DiffArgs {
        left,
        right,
        left_label,
        right_label,
        output: cli_args.value_of("output_file").map(PathBuf::from),
        title: cli_args.value_of("title").unwrap_or_default().to_string(),
        start: parse_value::<i64>(cli_args, "start")?,
        load: load_options(cli_args)?,
        show: cli_args.is_present("show"),
        verbose: cli_args.is_present("verbose"),
    })
}
