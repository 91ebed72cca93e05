use crate::error::SeriesError;
use crate::NamedSeries;

/// Elementwise |a - b|, labeled "|a - b|" after the two input labels.
pub fn absolute_difference(a: &NamedSeries, b: &NamedSeries) -> Result<NamedSeries, SeriesError> {
    if a.len() != b.len() {
        return Err(SeriesError::LengthMismatch {
            left: a.label().to_string(),
            left_len: a.len(),
            right: b.label().to_string(),
            right_len: b.len(),
        });
    }
    let values: Vec<f64> = a
        .values()
        .iter()
        .zip(b.values().iter())
        .map(|(x, y)| (x - y).abs())
        .collect();
    Ok(NamedSeries::new(
        format!("|{} - {}|", a.label(), b.label()),
        values,
    ))
}

fn first_value(series: &NamedSeries) -> Result<f64, SeriesError> {
    series
        .values()
        .first()
        .copied()
        .ok_or_else(|| SeriesError::EmptyInput {
            label: series.label().to_string(),
        })
}

/// Largest value; a NAN anywhere makes the result NAN.
pub fn maximum(series: &NamedSeries) -> Result<f64, SeriesError> {
    let first = first_value(series)?;
    Ok(series.values()[1..].iter().fold(first, |m, &v| {
        if m.is_nan() || v.is_nan() {
            f64::NAN
        } else if v > m {
            v
        } else {
            m
        }
    }))
}

/// Smallest value; a NAN anywhere makes the result NAN.
pub fn minimum(series: &NamedSeries) -> Result<f64, SeriesError> {
    let first = first_value(series)?;
    Ok(series.values()[1..].iter().fold(first, |m, &v| {
        if m.is_nan() || v.is_nan() {
            f64::NAN
        } else if v < m {
            v
        } else {
            m
        }
    }))
}

/// Arithmetic mean as a running average, so finite input never overflows.
/// The result of a finite series is kept within its min and max.
pub fn mean(series: &NamedSeries) -> Result<f64, SeriesError> {
    first_value(series)?;
    let m = series
        .values()
        .iter()
        .enumerate()
        .fold(0., |m, (i, &v)| {
            let n = (i + 1) as f64;
            m + v / n - m / n
        });
    let (lo, hi) = (minimum(series)?, maximum(series)?);
    if lo.is_finite() && hi.is_finite() {
        Ok(m.max(lo).min(hi))
    } else {
        Ok(m)
    }
}

/// The absolute difference of two series together with its max and mean
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceStat {
    pub difference: NamedSeries,
    pub max: f64,
    pub mean: f64,
}

impl DifferenceStat {
    pub fn between(a: &NamedSeries, b: &NamedSeries) -> Result<DifferenceStat, SeriesError> {
        let difference = absolute_difference(a, b)?;
        let max = maximum(&difference)?;
        let mean = mean(&difference)?;
        Ok(DifferenceStat {
            difference,
            max,
            mean,
        })
    }

    /// same as `between`, with a custom label for the difference series
    pub fn between_labeled<S: Into<String>>(
        a: &NamedSeries,
        b: &NamedSeries,
        label: S,
    ) -> Result<DifferenceStat, SeriesError> {
        let stat = DifferenceStat::between(a, b)?;
        Ok(DifferenceStat {
            difference: NamedSeries::new(label, stat.difference.values().to_vec()),
            ..stat
        })
    }
}

impl std::fmt::Display for DifferenceStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: max {}, mean {}",
            self.difference.label(),
            self.max,
            self.mean
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(label: &str, v: &[f64]) -> NamedSeries {
        NamedSeries::new(label, v.to_vec())
    }

    #[test]
    fn left_right_example() {
        let left = series("left", &[1., 2., 3.]);
        let right = series("right", &[1.5, 1.5, 1.5]);
        let stat = DifferenceStat::between(&left, &right).unwrap();
        assert_eq!(stat.difference.values(), &[0.5, 0.5, 1.5]);
        assert_eq!(stat.difference.label(), "|left - right|");
        assert_eq!(stat.max, 1.5);
        assert!((stat.mean - 2.5 / 3.).abs() < 1e-12);
        assert!((stat.mean - 0.8333).abs() < 1e-4);
    }

    #[test]
    fn difference_is_elementwise_and_symmetric() {
        let a = series("a", &[0., -3.25, 7.5, 1e6, -2.]);
        let b = series("b", &[4., 1.75, 7.5, -1e6, -0.5]);
        let ab = absolute_difference(&a, &b).unwrap();
        let ba = absolute_difference(&b, &a).unwrap();
        for i in 0..a.len() {
            assert_eq!(ab.values()[i], (a.values()[i] - b.values()[i]).abs());
        }
        assert_eq!(ab.values(), ba.values());
    }

    #[test]
    fn difference_rejects_unequal_lengths() {
        let a = series("a", &[1., 2., 3.]);
        let b = series("b", &[1., 2.]);
        match absolute_difference(&a, &b).unwrap_err() {
            SeriesError::LengthMismatch {
                left_len,
                right_len,
                ..
            } => assert_eq!((left_len, right_len), (3, 2)),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn empty_series_has_no_statistics() {
        let empty = series("empty", &[]);
        assert_eq!(maximum(&empty).unwrap_err().kind(), "empty-input");
        assert_eq!(minimum(&empty).unwrap_err().kind(), "empty-input");
        assert_eq!(mean(&empty).unwrap_err().kind(), "empty-input");
    }

    #[test]
    fn mean_between_min_and_max() {
        let cases: Vec<Vec<f64>> = vec![
            vec![42.],
            vec![1., 2., 3., 4.],
            vec![-5.5, 0.1, 1e3, -1e3, 7.25],
            vec![2.5; 4],
            vec![0.1; 3],
            vec![1e308, 1e308],
            vec![-1e308, 1e308, 1e308],
        ];
        for v in cases {
            let s = series("s", &v);
            let (lo, hi, m) = (minimum(&s).unwrap(), maximum(&s).unwrap(), mean(&s).unwrap());
            assert!(m.is_finite());
            assert!(lo <= m && m <= hi, "{} <= {} <= {}", lo, m, hi);
        }
    }

    #[test]
    fn nan_propagates() {
        let s = series("s", &[1., f64::NAN, 3.]);
        assert!(maximum(&s).unwrap().is_nan());
        assert!(mean(&s).unwrap().is_nan());
        let s = series("s", &[f64::NAN, 3.]);
        assert!(maximum(&s).unwrap().is_nan());
    }
}
