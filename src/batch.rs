//! Batch rendering: every chart of a TOML file, each one independent of the others.
//!
//! ```toml
//! output_dir = "plots"
//!
//! [[chart]]
//! id = "time"
//! title = "Evaluation of distances over time"
//! output = "time.png"
//! x_range = [0, 50]
//!
//! [[chart.series]]
//! path = "testIntervalWarn.csv"
//! field = "wrn_max"
//! label = "warning"
//!
//! [[chart.series]]
//! path = "testIntervalSt.csv"
//! field = "stress_max"
//! label = "stress"
//!
//! [chart.difference]
//! left = "wrn_max"
//! right = "stress_max"
//! ```

use super::VERSION;
use crate::chart::{ChartSpec, LegendPosition, Ticks, XAxis};
use crate::error::SeriesError;
use crate::stats::DifferenceStat;
use crate::{Delimiter, LoadOptions, NamedSeries};
use clap::{App, Arg, ArgMatches};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Problems with the batch file itself, found before any chart is drawn.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read batch file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse batch file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("chart id {0:?} is used more than once")]
    DuplicateId(String),
    #[error("charts {first:?} and {second:?} both write to {}", .path.display())]
    DuplicateOutput {
        first: String,
        second: String,
        path: PathBuf,
    },
    #[error("no chart with id {0:?}")]
    UnknownChart(String),
    #[error("chart {chart:?}: {reason}")]
    InvalidChart { chart: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// where relative outputs go, itself relative to the batch file
    #[serde(default)]
    pub output_dir: PathBuf,
    /// stop at the first chart that fails
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default, rename = "chart")]
    pub charts: Vec<ChartConfig>,
    /// directory of the batch file, relative inputs are read from here
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub output: PathBuf,
    /// half-open integer range, as [start, end]
    pub x_range: Option<[i64; 2]>,
    pub x_points: Option<Vec<f64>>,
    #[serde(default = "default_true")]
    pub legend: bool,
    pub legend_position: Option<String>,
    #[serde(default)]
    pub show: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub x_desc: Option<String>,
    pub y_desc: Option<String>,
    pub ticks: Option<TicksConfig>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    pub difference: Option<DifferenceConfig>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicksConfig {
    pub positions: Vec<f64>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesConfig {
    pub path: PathBuf,
    /// in-memory name of the series, also the default legend label
    pub field: String,
    pub label: Option<String>,
    #[serde(default)]
    pub column: usize,
    pub delimiter: Option<char>,
    #[serde(default)]
    pub skip_header: usize,
}

/// Adds |left - right| to the chart; with `only` it replaces the inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DifferenceConfig {
    pub left: String,
    pub right: String,
    pub label: Option<String>,
    #[serde(default)]
    pub only: bool,
}

impl SeriesConfig {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            column: self.column,
            delimiter: self.delimiter.map(Delimiter::Char).unwrap_or_default(),
            skip_header: self.skip_header,
            ..LoadOptions::default()
        }
    }
}

impl ChartConfig {
    fn invalid<S: Into<String>>(&self, reason: S) -> ConfigError {
        ConfigError::InvalidChart {
            chart: self.id.clone(),
            reason: reason.into(),
        }
    }

    fn x_axis(&self) -> Result<XAxis, ConfigError> {
        match (&self.x_range, &self.x_points) {
            (Some([start, end]), None) => {
                if start > end {
                    return Err(self.invalid(format!("x_range start {} is after end {}", start, end)));
                }
                if end.checked_sub(*start).is_none() {
                    return Err(self.invalid(format!("x_range [{}, {}] is too long", start, end)));
                }
                Ok(XAxis::Range {
                    start: *start,
                    end: *end,
                })
            }
            (None, Some(points)) => Ok(XAxis::Points(points.clone())),
            (Some(_), Some(_)) => Err(self.invalid("give either x_range or x_points, not both")),
            (None, None) => Err(self.invalid("one of x_range or x_points is required")),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.x_axis()?;
        if self.series.is_empty() {
            return Err(self.invalid("no series to plot"));
        }
        match (self.width, self.height) {
            (Some(0), _) | (_, Some(0)) => return Err(self.invalid("width and height must be positive")),
            (Some(_), None) | (None, Some(_)) => {
                return Err(self.invalid("width and height must be given together"))
            }
            _ => {}
        }
        if let Some(p) = &self.legend_position {
            p.parse::<LegendPosition>()
                .map_err(|e| self.invalid(e.to_string()))?;
        }
        if let Some(t) = &self.ticks {
            Ticks::new(t.positions.clone(), t.labels.clone())
                .map_err(|e| self.invalid(e.to_string()))?;
        }
        if let Some(d) = &self.difference {
            for field in [&d.left, &d.right].iter() {
                if !self.series.iter().any(|s| &&s.field == field) {
                    return Err(self.invalid(format!("difference refers to unknown field {:?}", field)));
                }
            }
        }
        Ok(())
    }
}

impl BatchConfig {
    /// Load and validate a batch file; relative paths resolve against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<BatchConfig, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        BatchConfig::from_toml_str(&content, base_dir)
    }

    pub fn from_toml_str<P: Into<PathBuf>>(content: &str, base_dir: P) -> Result<BatchConfig, ConfigError> {
        let mut config: BatchConfig = toml::from_str(content)?;
        config.base_dir = base_dir.into();
        config.validate()?;
        Ok(config)
    }

    /// Rejects duplicate ids, colliding outputs, and malformed charts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids: HashSet<&str> = HashSet::new();
        let mut outputs: HashMap<PathBuf, &str> = HashMap::new();
        for chart in self.charts.iter() {
            if !ids.insert(chart.id.as_str()) {
                return Err(ConfigError::DuplicateId(chart.id.clone()));
            }
            let out = self.output_path(chart);
            if let Some(first) = outputs.insert(out.clone(), chart.id.as_str()) {
                return Err(ConfigError::DuplicateOutput {
                    first: first.to_string(),
                    second: chart.id.clone(),
                    path: out,
                });
            }
            chart.validate()?;
        }
        Ok(())
    }

    /// Keeps only the charts with the given ids, in file order.
    pub fn retain(&mut self, ids: &[String]) -> Result<(), ConfigError> {
        for id in ids {
            if !self.charts.iter().any(|c| &c.id == id) {
                return Err(ConfigError::UnknownChart(id.clone()));
            }
        }
        self.charts.retain(|c| ids.contains(&c.id));
        Ok(())
    }

    pub fn output_path(&self, chart: &ChartConfig) -> PathBuf {
        self.base_dir.join(&self.output_dir).join(&chart.output)
    }

    fn input_path(&self, series: &SeriesConfig) -> PathBuf {
        self.base_dir.join(&series.path)
    }

    /// Loads the chart's series and turns it into a ChartSpec ready to render.
    pub fn chart_spec(
        &self,
        chart: &ChartConfig,
    ) -> Result<(ChartSpec, Option<DifferenceStat>), SeriesError> {
        let invalid = |e: ConfigError| match e {
            ConfigError::InvalidChart { chart, reason } => SeriesError::InvalidChart { chart, reason },
            other => SeriesError::InvalidChart {
                chart: chart.id.clone(),
                reason: other.to_string(),
            },
        };
        chart.validate().map_err(&invalid)?;
        let x_axis = chart.x_axis().map_err(&invalid)?;
        let mut loaded: Vec<(NamedSeries, String)> = Vec::with_capacity(chart.series.len());
        for s in chart.series.iter() {
            let series = NamedSeries::from_file_with(self.input_path(s), s.field.as_str(), &s.load_options())?;
            let legend = s.label.clone().unwrap_or_else(|| s.field.clone());
            loaded.push((series, legend));
        }

        let difference = match &chart.difference {
            Some(d) => {
                let find = |field: &str| -> Result<&NamedSeries, SeriesError> {
                    loaded
                        .iter()
                        .map(|(s, _)| s)
                        .find(|s| s.label() == field)
                        .ok_or_else(|| SeriesError::InvalidChart {
                            chart: chart.id.clone(),
                            reason: format!("difference refers to unknown field {:?}", field),
                        })
                };
                let (a, b) = (find(&d.left)?, find(&d.right)?);
                let stat = match &d.label {
                    Some(label) => DifferenceStat::between_labeled(a, b, label.as_str())?,
                    None => DifferenceStat::between(a, b)?,
                };
                Some((stat, d.only))
            }
            None => None,
        };

        let mut spec = ChartSpec::new(chart.title.as_str(), self.output_path(chart), x_axis)
            .with_axis_desc(chart.x_desc.clone(), chart.y_desc.clone())
            .with_show(chart.show);
        let position = match &chart.legend_position {
            Some(p) => p.parse::<LegendPosition>()?,
            None => LegendPosition::Best,
        };
        spec = spec.with_legend(chart.legend, position);
        if let Some(t) = &chart.ticks {
            spec = spec.with_ticks(Ticks::new(t.positions.clone(), t.labels.clone())?);
        }
        if let (Some(w), Some(h)) = (chart.width, chart.height) {
            spec = spec.with_size(w, h);
        }
        let only_difference = difference.as_ref().map(|(_, only)| *only).unwrap_or(false);
        if !only_difference {
            for (series, legend) in loaded {
                spec = spec.with_series(series, legend);
            }
        }
        let stat = difference.map(|(stat, _)| stat);
        if let Some(stat) = &stat {
            let legend = stat.difference.label().to_string();
            spec = spec.with_series(stat.difference.clone(), legend);
        }
        Ok((spec, stat))
    }

    /// Builds and renders a single chart.
    pub fn render_chart(&self, chart: &ChartConfig) -> Result<ChartSummary, SeriesError> {
        let (spec, difference) = self.chart_spec(chart)?;
        spec.render()?;
        Ok(ChartSummary {
            output: spec.output,
            points: spec.x_axis.len(),
            difference,
        })
    }
}

/// What a successfully rendered chart produced
#[derive(Debug, Clone)]
pub struct ChartSummary {
    pub output: PathBuf,
    pub points: usize,
    pub difference: Option<DifferenceStat>,
}

#[derive(Debug)]
pub struct ChartOutcome {
    pub id: String,
    pub result: Result<ChartSummary, SeriesError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ChartOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &SeriesError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.id.as_str(), e)))
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Renders the charts one after the other. A failing chart is reported
/// and the next one is still attempted, unless `fail_fast` is set.
pub fn run_batch(config: &BatchConfig) -> BatchReport {
    let mut report = BatchReport::default();
    for chart in config.charts.iter() {
        let result = config.render_chart(chart);
        match &result {
            Ok(summary) => {
                log::info!("chart {}: wrote {}", chart.id, summary.output.display());
                if let Some(d) = &summary.difference {
                    log::info!("chart {}: {}", chart.id, d);
                }
            }
            Err(e) => log::error!("chart {} failed ({}): {}", chart.id, e.kind(), e),
        }
        let failed = result.is_err();
        report.outcomes.push(ChartOutcome {
            id: chart.id.clone(),
            result,
        });
        if failed && config.fail_fast {
            log::warn!("stopping at chart {}, fail-fast is set", chart.id);
            break;
        }
    }
    report
}

/// Takes the CLI arguments of the batch app: (batch file, fail fast, selected charts, verbose).
pub fn parse_cli() -> (PathBuf, bool, Vec<String>, bool) {
    parse_batch_args(&batch_app().get_matches())
}

fn batch_app<'a, 'b>() -> App<'a, 'b> {
    let arg_config = Arg::with_name("batch_file")
        .help("toml file describing the charts")
        .short("c")
        .long("config")
        .takes_value(true)
        .default_value("charts.toml");
    let arg_fail_fast = Arg::with_name("fail_fast")
        .help("stop at the first chart that fails")
        .long("fail-fast")
        .takes_value(false);
    let arg_charts = Arg::with_name("charts")
        .help("render only the charts with these ids")
        .long("chart")
        .takes_value(true)
        .multiple(true)
        .number_of_values(1);
    let arg_verbose = Arg::with_name("verbose")
        .help("print debug information")
        .short("v")
        .long("verbose")
        .takes_value(false);
    App::new("seriesplot_batch")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to render every chart of a batch file")
        .arg(arg_config)
        .arg(arg_fail_fast)
        .arg(arg_charts)
        .arg(arg_verbose)
}

fn parse_batch_args(cli_args: &ArgMatches) -> (PathBuf, bool, Vec<String>, bool) {
    let batch_file = PathBuf::from(cli_args.value_of("batch_file").unwrap_or_default());
    let charts: Vec<String> = cli_args
        .values_of("charts")
        .map(|v| v.map(String::from).collect())
        .unwrap_or_default();
    (
        batch_file,
        cli_args.is_present("fail_fast"),
        charts,
        cli_args.is_present("verbose"),
    )
}
