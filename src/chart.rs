use crate::error::SeriesError;
use crate::{min_and_max, NamedSeries};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_SIZE: (u32, u32) = (960, 720);

/// tab10, so the n-th series always gets the same colour
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// x coordinates shared by every series of a chart
#[derive(Debug, Clone, PartialEq)]
pub enum XAxis {
    /// integers start, start + 1, ..., end - 1
    Range { start: i64, end: i64 },
    Points(Vec<f64>),
}

impl XAxis {
    pub fn len(&self) -> usize {
        match self {
            XAxis::Range { start, end } => {
                let n = (*end as i128 - *start as i128).max(0);
                n.min(usize::MAX as i128) as usize
            }
            XAxis::Points(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn coordinates(&self) -> Vec<f64> {
        match self {
            XAxis::Range { start, end } => (*start..*end).map(|x| x as f64).collect(),
            XAxis::Points(p) => p.clone(),
        }
    }
}

/// Explicit x tick positions, each with its display label.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticks {
    positions: Vec<f64>,
    labels: Vec<String>,
}

impl Ticks {
    pub fn new(positions: Vec<f64>, labels: Vec<String>) -> Result<Ticks, SeriesError> {
        if positions.len() != labels.len() {
            return Err(SeriesError::TickMismatch {
                positions: positions.len(),
                labels: labels.len(),
            });
        }
        Ok(Ticks { positions, labels })
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Where the legend goes; `Best` avoids the most crowded part of the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegendPosition {
    Best,
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
    CenterRight,
    CenterLeft,
    LowerCenter,
    UpperCenter,
    Center,
}

impl Default for LegendPosition {
    fn default() -> Self {
        LegendPosition::Best
    }
}

impl FromStr for LegendPosition {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(|c: char| c == '-' || c == '_', " ");
        let pos = match normalized.as_str() {
            "best" => LegendPosition::Best,
            "upper right" => LegendPosition::UpperRight,
            "upper left" => LegendPosition::UpperLeft,
            "lower left" => LegendPosition::LowerLeft,
            "lower right" => LegendPosition::LowerRight,
            "right" | "center right" => LegendPosition::CenterRight,
            "center left" => LegendPosition::CenterLeft,
            "lower center" => LegendPosition::LowerCenter,
            "upper center" => LegendPosition::UpperCenter,
            "center" => LegendPosition::Center,
            _ => return Err(SeriesError::UnknownPlacement(s.to_string())),
        };
        Ok(pos)
    }
}

/// preference order when several cells are equally empty
const BEST_ORDER: [LegendPosition; 9] = [
    LegendPosition::UpperRight,
    LegendPosition::UpperLeft,
    LegendPosition::LowerLeft,
    LegendPosition::LowerRight,
    LegendPosition::CenterRight,
    LegendPosition::CenterLeft,
    LegendPosition::LowerCenter,
    LegendPosition::UpperCenter,
    LegendPosition::Center,
];

impl LegendPosition {
    /// (column, row) of the 3x3 grid cell, row 0 at the top
    fn cell(self) -> (usize, usize) {
        match self {
            LegendPosition::UpperLeft => (0, 0),
            LegendPosition::UpperCenter => (1, 0),
            LegendPosition::UpperRight | LegendPosition::Best => (2, 0),
            LegendPosition::CenterLeft => (0, 1),
            LegendPosition::Center => (1, 1),
            LegendPosition::CenterRight => (2, 1),
            LegendPosition::LowerLeft => (0, 2),
            LegendPosition::LowerCenter => (1, 2),
            LegendPosition::LowerRight => (2, 2),
        }
    }

    fn series_label_position(self) -> SeriesLabelPosition {
        match self {
            LegendPosition::Best | LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
            LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
            LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
            LegendPosition::CenterRight => SeriesLabelPosition::MiddleRight,
            LegendPosition::CenterLeft => SeriesLabelPosition::MiddleLeft,
            LegendPosition::LowerCenter => SeriesLabelPosition::LowerMiddle,
            LegendPosition::UpperCenter => SeriesLabelPosition::UpperMiddle,
            LegendPosition::Center => SeriesLabelPosition::MiddleMiddle,
        }
    }

    /// Resolves `Best` to the grid cell covering the fewest data points.
    pub fn resolve(
        self,
        x: &[f64],
        series: &[&[f64]],
        xrange: (f64, f64),
        yrange: (f64, f64),
    ) -> LegendPosition {
        if self != LegendPosition::Best {
            return self;
        }
        let mut counts = [[0usize; 3]; 3];
        let cell_of = |v: f64, (lo, hi): (f64, f64)| -> usize {
            let t = (v - lo) / (hi - lo);
            ((t * 3.).floor().max(0.) as usize).min(2)
        };
        for values in series {
            for (&xv, &yv) in x.iter().zip(values.iter()) {
                if !yv.is_finite() {
                    continue;
                }
                let col = cell_of(xv, xrange);
                let row = 2 - cell_of(yv, yrange);
                counts[col][row] += 1;
            }
        }
        let mut best = BEST_ORDER[0];
        let mut fewest = usize::MAX;
        for pos in BEST_ORDER.iter() {
            let (col, row) = pos.cell();
            if counts[col][row] < fewest {
                fewest = counts[col][row];
                best = *pos;
            }
        }
        best
    }
}

/// A series to draw together with its legend entry
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    pub series: NamedSeries,
    pub legend: String,
}

/// Everything needed to draw one chart, consumed by `render`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub output: PathBuf,
    pub x_axis: XAxis,
    pub series: Vec<LabeledSeries>,
    pub legend: bool,
    pub legend_position: LegendPosition,
    pub ticks: Option<Ticks>,
    pub x_desc: Option<String>,
    pub y_desc: Option<String>,
    pub size: (u32, u32),
    pub show: bool,
}

impl ChartSpec {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(title: S, output: P, x_axis: XAxis) -> ChartSpec {
        ChartSpec {
            title: title.into(),
            output: output.into(),
            x_axis,
            series: Vec::new(),
            legend: true,
            legend_position: LegendPosition::Best,
            ticks: None,
            x_desc: None,
            y_desc: None,
            size: DEFAULT_SIZE,
            show: false,
        }
    }

    /// adds a series on top of the ones already in the chart
    pub fn with_series<S: Into<String>>(mut self, series: NamedSeries, legend: S) -> ChartSpec {
        self.series.push(LabeledSeries {
            series,
            legend: legend.into(),
        });
        self
    }

    pub fn with_legend(mut self, legend: bool, position: LegendPosition) -> ChartSpec {
        self.legend = legend;
        self.legend_position = position;
        self
    }

    pub fn with_ticks(mut self, ticks: Ticks) -> ChartSpec {
        self.ticks = Some(ticks);
        self
    }

    pub fn with_axis_desc(mut self, x_desc: Option<String>, y_desc: Option<String>) -> ChartSpec {
        self.x_desc = x_desc;
        self.y_desc = y_desc;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> ChartSpec {
        self.size = (width, height);
        self
    }

    pub fn with_show(mut self, show: bool) -> ChartSpec {
        self.show = show;
        self
    }

    fn draws_legend(&self) -> bool {
        self.legend && self.series.len() > 1
    }

    /// Checks the chart can be drawn: every series matches the axis.
    /// Tick lists are paired up when the `Ticks` are built.
    pub fn validate(&self) -> Result<(), SeriesError> {
        if self.x_axis.is_empty() || self.series.is_empty() {
            return Err(SeriesError::EmptyChart {
                title: self.title.clone(),
            });
        }
        let axis_len = self.x_axis.len();
        for s in self.series.iter() {
            if s.series.len() != axis_len {
                return Err(SeriesError::AxisMismatch {
                    label: s.series.label().to_string(),
                    len: s.series.len(),
                    axis_len,
                });
            }
        }
        Ok(())
    }

    /// Draws the chart to `output`: svg for a .svg extension, png otherwise.
    /// Nothing is written at `output` when validation or drawing fails.
    pub fn render(&self) -> Result<(), SeriesError> {
        self.validate()?;
        ensure_parent(&self.output)?;
        let is_svg = self
            .output
            .extension()
            .map(|e| e.eq_ignore_ascii_case("svg"))
            .unwrap_or(false);
        write_atomically(&self.output, |path| {
            // the backend is dropped inside, a failed draw only ever touches `path`
            if is_svg {
                let root = SVGBackend::new(path, self.size).into_drawing_area();
                self.draw(&root)?;
                root.present()?;
            } else {
                let root = BitMapBackend::new(path, self.size).into_drawing_area();
                self.draw(&root)?;
                root.present()?;
            }
            Ok(())
        })?;
        log::info!("rendered {:?} to {}", self.title, self.output.display());
        if self.show {
            display(&self.output);
        }
        Ok(())
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), SeriesError>
    where
        DB::ErrorType: 'static,
    {
        let x = self.x_axis.coordinates();
        let (xmin, xmax) = padded(min_and_max(&x).unwrap_or((0., 1.)), 0.);
        let all_values: Vec<f64> = self
            .series
            .iter()
            .flat_map(|s| s.series.values().iter().copied())
            .collect();
        let (ymin, ymax) = padded(min_and_max(&all_values).unwrap_or((0., 1.)), 0.05);

        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(xmin..xmax, ymin..ymax)?;

        let int_fmt = |v: &f64| {
            if v.fract() == 0. {
                format!("{:.0}", v)
            } else {
                format!("{}", v)
            }
        };
        let blank_fmt = |_: &f64| String::new();
        let mut mesh = chart.configure_mesh();
        mesh.light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(220, 220, 220).stroke_width(1))
            .label_style(("sans-serif", 18))
            .axis_desc_style(("sans-serif", 20));
        if self.ticks.is_some() {
            mesh.disable_x_mesh()
                .x_label_formatter(&blank_fmt)
                .set_tick_mark_size(LabelAreaPosition::Bottom, 0);
        } else {
            mesh.x_label_formatter(&int_fmt);
        }
        if let Some(d) = &self.x_desc {
            mesh.x_desc(d.as_str());
        }
        if let Some(d) = &self.y_desc {
            mesh.y_desc(d.as_str());
        }
        mesh.draw()?;

        // list order is draw order, the last series ends up on top
        for (i, s) in self.series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let anchor = chart.draw_series(LineSeries::new(
                std::iter::empty::<(f64, f64)>(),
                color.stroke_width(2),
            ))?;
            if self.draws_legend() {
                anchor.label(s.legend.as_str()).legend(move |(lx, ly)| {
                    PathElement::new(vec![(lx, ly), (lx + 20, ly)], color.stroke_width(2))
                });
            }
            // NAN breaks the line, each run of values is its own segment
            let mut start = 0;
            for run in s.series.values().split(|v| v.is_nan()) {
                if !run.is_empty() {
                    let points = x[start..start + run.len()].iter().copied().zip(run.iter().copied());
                    chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?;
                }
                start += run.len() + 1;
            }
        }

        if let Some(ticks) = &self.ticks {
            let style = TextStyle::from(("sans-serif", 18).into_font())
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top));
            for (pos, label) in ticks.positions.iter().zip(ticks.labels.iter()) {
                let (px, py) = chart.backend_coord(&(*pos, ymin));
                root.draw(&PathElement::new(vec![(px, py), (px, py + 6)], BLACK.stroke_width(1)))?;
                root.draw(&Text::new(label.as_str(), (px, py + 10), style.clone()))?;
            }
        }

        if self.draws_legend() {
            let series: Vec<&[f64]> = self.series.iter().map(|s| s.series.values()).collect();
            let position = self
                .legend_position
                .resolve(&x, &series, (xmin, xmax), (ymin, ymax));
            chart
                .configure_series_labels()
                .position(position.series_label_position())
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font(("sans-serif", 18))
                .draw()?;
        }
        Ok(())
    }
}

/// widens the range by `frac` of its span on both sides, or by 0.5 when flat
fn padded((lo, hi): (f64, f64), frac: f64) -> (f64, f64) {
    let span = hi - lo;
    if span.abs() < 1e-12 {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo - span * frac, hi + span * frac)
    }
}

/// hidden sibling of `output` with the same extension, so the backend picks the same format
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chart".to_string());
    output.with_file_name(format!(".{}", name))
}

/// Lets `draw_to` write a partial file and moves it to `output` only on success.
fn write_atomically<F>(output: &Path, draw_to: F) -> Result<(), SeriesError>
where
    F: FnOnce(&Path) -> Result<(), SeriesError>,
{
    let partial = partial_path(output);
    match draw_to(&partial) {
        Ok(()) => std::fs::rename(&partial, output).map_err(|e| SeriesError::Io {
            path: output.to_path_buf(),
            source: e,
        }),
        Err(e) => {
            if partial.exists() {
                if let Err(rm) = std::fs::remove_file(&partial) {
                    log::warn!("could not remove {}: {}", partial.display(), rm);
                }
            }
            Err(e)
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), SeriesError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| SeriesError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    Ok(())
}

fn headless() -> bool {
    cfg!(all(unix, not(target_os = "macos")))
        && std::env::var_os("DISPLAY").is_none()
        && std::env::var_os("WAYLAND_DISPLAY").is_none()
}

/// Opens the image with the platform viewer, without waiting for it.
pub fn display(path: &Path) {
    if headless() {
        log::debug!("no display available, not showing {}", path.display());
        return;
    }
    let viewer = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    };
    match std::process::Command::new(viewer).arg(path).spawn() {
        Ok(_) => log::debug!("opened {} with {}", path.display(), viewer),
        Err(e) => log::warn!("could not open {} with {}: {}", path.display(), viewer, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(len: usize, axis: XAxis, output: PathBuf) -> ChartSpec {
        let values: Vec<f64> = (0..len).map(|i| i as f64).collect();
        ChartSpec::new("Evaluation of distances over time", output, axis)
            .with_series(NamedSeries::new("wrn_max", values.clone()), "warning")
            .with_series(NamedSeries::new("stress_max", values), "stress")
    }

    #[test]
    fn range_axis_is_half_open() {
        let axis = XAxis::Range { start: 90, end: 300 };
        assert_eq!(axis.len(), 210);
        let c = axis.coordinates();
        assert_eq!(c.first(), Some(&90.));
        assert_eq!(c.last(), Some(&299.));
        assert!(XAxis::Range { start: 5, end: 5 }.is_empty());
    }

    #[test]
    fn axis_mismatch_names_series_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("time.png");
        let spec = spec_with(50, XAxis::Range { start: 0, end: 10 }, out.clone());
        match spec.render().unwrap_err() {
            SeriesError::AxisMismatch {
                label,
                len,
                axis_len,
            } => {
                assert_eq!(label, "wrn_max");
                assert_eq!((len, axis_len), (50, 10));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!out.exists());
    }

    #[test]
    fn extreme_range_does_not_overflow() {
        let axis = XAxis::Range {
            start: i64::MIN,
            end: i64::MAX,
        };
        assert!(!axis.is_empty());
        assert!(XAxis::Range { start: i64::MAX, end: i64::MIN }.is_empty());
        let spec = ChartSpec::new("huge", "unused.png", axis)
            .with_series(NamedSeries::new("short", vec![1., 2., 3.]), "short");
        assert_eq!(spec.validate().unwrap_err().kind(), "axis-mismatch");
    }

    #[test]
    fn failed_draw_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("time.png");
        let err = write_atomically(&out, |partial| {
            std::fs::write(partial, b"half a chart").unwrap();
            Err(SeriesError::Render("font lookup failed".to_string()))
        })
        .unwrap_err();
        assert_eq!(err.kind(), "render");
        assert!(!out.exists());
        assert!(!partial_path(&out).exists());

        write_atomically(&out, |partial| {
            std::fs::write(partial, b"whole chart").unwrap();
            Ok(())
        })
        .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"whole chart");
        assert!(!partial_path(&out).exists());
    }

    #[test]
    fn partial_file_keeps_the_extension() {
        let p = partial_path(Path::new("plots/time.svg"));
        assert_eq!(p, PathBuf::from("plots/.time.svg"));
        assert_eq!(p.extension().unwrap(), "svg");
    }

    #[test]
    fn legend_needs_two_series_and_the_flag() {
        let axis = XAxis::Range { start: 0, end: 3 };
        let one = ChartSpec::new("one", "unused.png", axis.clone())
            .with_series(NamedSeries::new("a", vec![1., 2., 3.]), "a");
        assert!(!one.draws_legend());
        let two = one.clone().with_series(NamedSeries::new("b", vec![3., 2., 1.]), "b");
        assert!(two.draws_legend());
        assert!(!two.with_legend(false, LegendPosition::Best).draws_legend());
    }

    #[test]
    fn mismatched_ticks_fail_fast() {
        let err = Ticks::new(vec![0., 1., 2.], vec!["a".to_string(), "b".to_string()]).unwrap_err();
        assert_eq!(err.kind(), "tick-mismatch");
    }

    #[test]
    fn empty_chart_is_rejected() {
        let spec = ChartSpec::new("nothing", "unused.png", XAxis::Range { start: 0, end: 0 });
        assert_eq!(spec.validate().unwrap_err().kind(), "empty-chart");
    }

    #[test]
    fn legend_position_parses_matplotlib_names() {
        assert_eq!("lower right".parse::<LegendPosition>().unwrap(), LegendPosition::LowerRight);
        assert_eq!("Upper-Left".parse::<LegendPosition>().unwrap(), LegendPosition::UpperLeft);
        assert_eq!("best".parse::<LegendPosition>().unwrap(), LegendPosition::Best);
        assert_eq!("right".parse::<LegendPosition>().unwrap(), LegendPosition::CenterRight);
        assert_eq!(
            "sideways".parse::<LegendPosition>().unwrap_err().kind(),
            "unknown-placement"
        );
    }

    #[test]
    fn best_avoids_the_data() {
        // rising line: fills lower left and upper right
        let x: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let y = x.clone();
        let pos = LegendPosition::Best.resolve(&x, &[&y[..]], (0., 29.), (0., 29.));
        assert_eq!(pos, LegendPosition::UpperLeft);

        let explicit = LegendPosition::LowerRight.resolve(&x, &[&y[..]], (0., 29.), (0., 29.));
        assert_eq!(explicit, LegendPosition::LowerRight);
    }

    #[test]
    fn flat_range_is_padded() {
        assert_eq!(padded((2., 2.), 0.05), (1.5, 2.5));
        assert_eq!(padded((0., 10.), 0.1), (-1., 11.));
    }
}
