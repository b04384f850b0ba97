use std::path::Path;
use std::str::FromStr;

use lazy_static::lazy_static;

use super::error::ColorError;

/// One row of a standard observer dataset: color matching function
/// weights at a single wavelength.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ObserverSample {
    pub wavelength: f64, // nm
    pub x_bar: f64,
    pub y_bar: f64,
    pub z_bar: f64,
}

/// Tabulated standard observer, ordered by strictly increasing wavelength.
///
/// Loaded once and never mutated. Use [`ObserverTable::cie_1931`] for the
/// bundled CIE 1931 2-degree table, or [`ObserverTable::load`] to read
/// another dataset from disk.
#[derive(Debug, Clone)]
pub struct ObserverTable {
    samples: Vec<ObserverSample>,
}

lazy_static! {
    static ref CIE_1931_2DEG: ObserverTable =
        ObserverTable::parse(include_str!("../../data/cie_1931_2deg_5nm.txt"))
            .expect("bundled CIE 1931 observer data is valid");
}

impl ObserverTable {
    /// The bundled CIE 1931 2-degree observer, 380-780 nm at 5 nm steps.
    /// Parsed on first use, shared read-only for the process lifetime.
    pub fn cie_1931() -> &'static ObserverTable {
        &CIE_1931_2DEG
    }

    /// Parse a row-oriented dataset: one sample per line, fields
    /// `wavelength xbar ybar zbar`, whitespace- or comma-separated.
    /// Lines starting with `#` and blank lines are skipped.
    pub fn parse(src: &str) -> Result<ObserverTable, ColorError> {
        let mut samples: Vec<ObserverSample> = Vec::new();
        for (n, raw) in src.lines().enumerate() {
            let line = n + 1;
            let row = raw.trim();
            if row.is_empty() || row.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = row
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() != 4 {
                return Err(ColorError::DataFormat {
                    line,
                    reason: format!("expected 4 fields, got {}", fields.len()),
                });
            }
            let mut values = [0.0f64; 4];
            for (v, field) in values.iter_mut().zip(fields.iter().copied()) {
                *v = f64::from_str(field).map_err(|_| ColorError::DataFormat {
                    line,
                    reason: format!("not a number: {:?}", field),
                })?;
                if !v.is_finite() {
                    return Err(ColorError::DataFormat {
                        line,
                        reason: format!("not finite: {:?}", field),
                    });
                }
            }
            let sample = ObserverSample {
                wavelength: values[0],
                x_bar: values[1],
                y_bar: values[2],
                z_bar: values[3],
            };
            if sample.wavelength <= 0.0 {
                return Err(ColorError::DataFormat {
                    line,
                    reason: "wavelength must be positive".to_string(),
                });
            }
            if sample.x_bar < 0.0 || sample.y_bar < 0.0 || sample.z_bar < 0.0 {
                return Err(ColorError::DataFormat {
                    line,
                    reason: "negative observer weight".to_string(),
                });
            }
            if let Some(prev) = samples.last() {
                if sample.wavelength <= prev.wavelength {
                    return Err(ColorError::DataFormat {
                        line,
                        reason: format!(
                            "wavelength {} not increasing (previous {})",
                            sample.wavelength, prev.wavelength
                        ),
                    });
                }
            }
            samples.push(sample);
        }
        if samples.len() < 2 {
            return Err(ColorError::DataFormat {
                line: src.lines().count(),
                reason: format!("need at least 2 samples, got {}", samples.len()),
            });
        }
        Ok(ObserverTable { samples })
    }

    /// Read and parse an observer dataset from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ObserverTable, ColorError> {
        let src = std::fs::read_to_string(path).map_err(ColorError::DataUnavailable)?;
        Self::parse(&src)
    }

    pub fn samples(&self) -> &[ObserverSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_whitespace_and_commas() {
        let table = ObserverTable::parse(
            "# comment\n\
             380 0.0014 0.0000 0.0065\n\
             \n\
             385, 0.0022, 0.0001, 0.0105\n\
             390,0.0042 0.0001,0.0201\n",
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.samples()[1].wavelength, 385.0);
        assert_eq!(table.samples()[2].z_bar, 0.0201);
    }

    #[test]
    fn reject_short_row() {
        let err = ObserverTable::parse("380 0.1 0.2\n385 0.1 0.2 0.3\n").unwrap_err();
        match err {
            ColorError::DataFormat { line: 1, .. } => {}
            e => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn reject_non_numeric() {
        let err = ObserverTable::parse("380 0.1 x 0.3\n").unwrap_err();
        assert!(matches!(err, ColorError::DataFormat { line: 1, .. }));
    }

    #[test]
    fn reject_non_monotonic() {
        let err =
            ObserverTable::parse("380 0.1 0.2 0.3\n390 0.1 0.2 0.3\n390 0.1 0.2 0.3\n").unwrap_err();
        assert!(matches!(err, ColorError::DataFormat { line: 3, .. }));
    }

    #[test]
    fn reject_negative_weight() {
        let err = ObserverTable::parse("380 0.1 -0.2 0.3\n385 0.1 0.2 0.3\n").unwrap_err();
        assert!(matches!(err, ColorError::DataFormat { line: 1, .. }));
    }

    #[test]
    fn reject_single_sample() {
        let err = ObserverTable::parse("380 0.1 0.2 0.3\n").unwrap_err();
        assert!(matches!(err, ColorError::DataFormat { .. }));
    }

    #[test]
    fn missing_file() {
        let err = ObserverTable::load("/nonexistent/observer.txt").unwrap_err();
        assert!(matches!(err, ColorError::DataUnavailable(_)));
    }

    #[test]
    fn bundled_table_covers_visible_range() {
        let table = ObserverTable::cie_1931();
        assert_eq!(table.len(), 81);
        assert_eq!(table.samples()[0].wavelength, 380.0);
        assert_eq!(table.samples()[80].wavelength, 780.0);
        // ybar peaks at 555 nm
        let peak = table
            .samples()
            .iter()
            .max_by(|a, b| a.y_bar.partial_cmp(&b.y_bar).unwrap())
            .unwrap();
        assert_eq!(peak.wavelength, 555.0);
    }
}
