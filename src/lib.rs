use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
pub mod batch;
pub mod chart;
pub mod diff;
pub mod error;
pub mod plot;
pub mod stats;

pub use chart::{ChartSpec, LegendPosition, Ticks, XAxis};
pub use error::SeriesError;
pub use stats::DifferenceStat;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs at info level, debug when verbose; RUST_LOG overrides both.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// How records are split into fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delimiter {
    /// any run of spaces and tabs
    Whitespace,
    Char(char),
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Whitespace
    }
}

/// Controls how a series file is read.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// positional field holding the value, 0-based
    pub column: usize,
    pub delimiter: Delimiter,
    /// lines starting with this character are skipped, trailing comments are stripped
    pub comment: Option<char>,
    pub skip_header: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            column: 0,
            delimiter: Delimiter::Whitespace,
            comment: Some('#'),
            skip_header: 0,
        }
    }
}

/// The main struct: a labeled, ordered sequence of values
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    label: String,
    values: Vec<f64>,
}

impl NamedSeries {
    pub fn new<S: Into<String>>(label: S, values: Vec<f64>) -> NamedSeries {
        NamedSeries {
            label: label.into(),
            values,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Init a NamedSeries from a whitespace-delimited file, first column.
    pub fn from_file<P: AsRef<Path>, S: Into<String>>(
        fin: P,
        label: S,
    ) -> Result<NamedSeries, SeriesError> {
        NamedSeries::from_file_with(fin, label, &LoadOptions::default())
    }

    /// Init a NamedSeries from a delimited text file, one value per record.
    /// Blank and comment lines are skipped and do not count as records,
    /// but line numbers in parse errors refer to the physical line in the file.
    /// An empty file gives an empty series.
    pub fn from_file_with<P: AsRef<Path>, S: Into<String>>(
        fin: P,
        label: S,
        opts: &LoadOptions,
    ) -> Result<NamedSeries, SeriesError> {
        let path = fin.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SeriesError::NotFound {
                path: path.to_path_buf(),
            },
            _ => SeriesError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let buf = BufReader::new(file);
        let mut values: Vec<f64> = Vec::new();
        for (i, l) in buf.lines().enumerate().skip(opts.skip_header) {
            let l = l.map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => SeriesError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    field: "<invalid utf-8>".to_string(),
                },
                _ => SeriesError::Io {
                    path: path.to_path_buf(),
                    source: e,
                },
            })?;
            let record = match opts.comment {
                Some(c) => l.split(c).next().unwrap_or_default(),
                None => &l[..],
            };
            if record.trim().is_empty() {
                continue;
            }
            let field = match opts.delimiter {
                Delimiter::Whitespace => record.split_whitespace().nth(opts.column),
                Delimiter::Char(d) => record.split(d).nth(opts.column),
            };
            let field = field.map(str::trim).unwrap_or_default();
            match field.parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) => {
                    return Err(SeriesError::Parse {
                        path: path.to_path_buf(),
                        line: i + 1,
                        field: field.to_string(),
                    })
                }
            }
        }
        let series = NamedSeries::new(label, values);
        log::debug!(
            "loaded {} values for {:?} from {}",
            series.len(),
            series.label,
            path.display()
        );
        Ok(series)
    }
}

impl std::fmt::Display for NamedSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.label)?;
        for v in self.values.iter() {
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

/// min and max of the finite values of the slice, None if there are none
pub fn min_and_max(s: &[f64]) -> Option<(f64, f64)> {
    let mut finite = s.iter().filter(|v| v.is_finite());
    let (mut min, mut max) = match finite.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in finite {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}
