use plotters::drawing::DrawingAreaErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while loading, aggregating, or rendering series.
#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("input source {} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: cannot parse {field:?} as a number", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        field: String,
    },

    #[error("series {label:?} is empty")]
    EmptyInput { label: String },

    #[error("series {left:?} has {left_len} values but {right:?} has {right_len}")]
    LengthMismatch {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },

    #[error("series {label:?} has {len} values but the x axis has {axis_len} coordinates")]
    AxisMismatch {
        label: String,
        len: usize,
        axis_len: usize,
    },

    #[error("{positions} tick positions but {labels} tick labels")]
    TickMismatch { positions: usize, labels: usize },

    #[error("chart {title:?} has nothing to draw")]
    EmptyChart { title: String },

    #[error("unknown legend position {0:?}")]
    UnknownPlacement(String),

    #[error("chart {chart:?} is not valid: {reason}")]
    InvalidChart { chart: String, reason: String },

    #[error("drawing failed: {0}")]
    Render(String),
}

impl SeriesError {
    /// Short stable name of the error, used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SeriesError::NotFound { .. } => "not-found",
            SeriesError::Io { .. } => "io",
            SeriesError::Parse { .. } => "parse",
            SeriesError::EmptyInput { .. } => "empty-input",
            SeriesError::LengthMismatch { .. } => "length-mismatch",
            SeriesError::AxisMismatch { .. } => "axis-mismatch",
            SeriesError::TickMismatch { .. } => "tick-mismatch",
            SeriesError::EmptyChart { .. } => "empty-chart",
            SeriesError::UnknownPlacement(_) => "unknown-placement",
            SeriesError::InvalidChart { .. } => "invalid-chart",
            SeriesError::Render(_) => "render",
        }
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for SeriesError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        SeriesError::Render(e.to_string())
    }
}
