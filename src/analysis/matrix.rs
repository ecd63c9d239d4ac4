//! Probability x impact risk matrix
//!
//! Rows run from probability 5 (top) down to 1, columns from impact 1 to 5.
//! Records without usable coordinates are not placed; they are returned in
//! [`RiskMatrix::skipped`] with the reason.

use serde::{Deserialize, Serialize};

/// Number of probability (and impact) levels
pub const GRID_SIZE: u8 = 5;

/// Upper bounds of the severity bands; anything above `alto` is critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub baixo: u8,
    pub medio: u8,
    pub alto: u8,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            baixo: 5,
            medio: 12,
            alto: 20,
        }
    }
}

impl SeverityThresholds {
    /// Bands only rise with the level when `baixo <= medio <= alto`
    pub fn is_ascending(&self) -> bool {
        self.baixo <= self.medio && self.medio <= self.alto
    }

    /// Band for a risk level
    pub fn band(&self, level: u8) -> SeverityBand {
        if level <= self.baixo {
            SeverityBand::Baixo
        } else if level <= self.medio {
            SeverityBand::Medio
        } else if level <= self.alto {
            SeverityBand::Alto
        } else {
            SeverityBand::Critico
        }
    }
}

/// Severity band of a risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Baixo,
    Medio,
    Alto,
    Critico,
}

impl SeverityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Baixo => "baixo",
            SeverityBand::Medio => "medio",
            SeverityBand::Alto => "alto",
            SeverityBand::Critico => "critico",
        }
    }
}

impl std::fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which assessment values place a risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatrixMode {
    Inerente,
    #[default]
    Residual,
}

impl std::fmt::Display for MatrixMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixMode::Inerente => write!(f, "inerente"),
            MatrixMode::Residual => write!(f, "residual"),
        }
    }
}

/// Probability, impact and level of one assessment view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub probability: Option<u8>,
    pub impact: Option<u8>,
    pub level: Option<u8>,
}

/// A risk as fed into the matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixPoint {
    pub id: String,
    pub name: String,
    pub inherent: Coordinates,
    pub residual: Coordinates,
}

impl MatrixPoint {
    pub fn coordinates(&self, mode: MatrixMode) -> Coordinates {
        match mode {
            MatrixMode::Inerente => self.inherent,
            MatrixMode::Residual => self.residual,
        }
    }
}

/// Grid position of a probability/impact pair, as (row, column)
pub fn position(probability: u8, impact: u8) -> Option<(usize, usize)> {
    let in_range = |v: u8| (1..=GRID_SIZE).contains(&v);
    if !in_range(probability) || !in_range(impact) {
        return None;
    }
    Some(((GRID_SIZE - probability) as usize, (impact - 1) as usize))
}

/// A risk placed in a cell
#[derive(Debug, Clone, Serialize)]
pub struct MatrixEntry {
    pub id: String,
    pub name: String,
    pub level: u8,
    pub band: SeverityBand,
}

/// One grid cell; `band` comes from the cell's own probability x impact
#[derive(Debug, Clone, Serialize)]
pub struct MatrixCell {
    pub probability: u8,
    pub impact: u8,
    pub band: SeverityBand,
    pub entries: Vec<MatrixEntry>,
}

/// Why a record was left out of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    MissingCoordinates,
    OutOfRange { probability: u8, impact: u8 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingCoordinates => write!(f, "no probability/impact for this view"),
            SkipReason::OutOfRange {
                probability,
                impact,
            } => write!(
                f,
                "probability {} / impact {} outside 1-{}",
                probability, impact, GRID_SIZE
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedPoint {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// The bucketized 5x5 grid
#[derive(Debug, Clone, Serialize)]
pub struct RiskMatrix {
    pub mode: MatrixMode,
    pub thresholds: SeverityThresholds,
    /// `rows[0]` is probability 5
    pub rows: Vec<Vec<MatrixCell>>,
    pub skipped: Vec<SkippedPoint>,
}

impl RiskMatrix {
    /// Place every point into the grid for the given view
    pub fn build(points: &[MatrixPoint], mode: MatrixMode, thresholds: SeverityThresholds) -> Self {
        let mut rows: Vec<Vec<MatrixCell>> = (0..GRID_SIZE)
            .map(|row| {
                let probability = GRID_SIZE - row;
                (1..=GRID_SIZE)
                    .map(|impact| MatrixCell {
                        probability,
                        impact,
                        band: thresholds.band(probability * impact),
                        entries: Vec::new(),
                    })
                    .collect()
            })
            .collect();
        let mut skipped = Vec::new();

        for point in points {
            let coords = point.coordinates(mode);
            let (Some(p), Some(i)) = (coords.probability, coords.impact) else {
                skipped.push(SkippedPoint {
                    id: point.id.clone(),
                    name: point.name.clone(),
                    reason: SkipReason::MissingCoordinates,
                });
                continue;
            };

            match position(p, i) {
                Some((row, col)) => {
                    let level = coords.level.unwrap_or(p * i);
                    rows[row][col].entries.push(MatrixEntry {
                        id: point.id.clone(),
                        name: point.name.clone(),
                        level,
                        band: thresholds.band(level),
                    });
                }
                None => skipped.push(SkippedPoint {
                    id: point.id.clone(),
                    name: point.name.clone(),
                    reason: SkipReason::OutOfRange {
                        probability: p,
                        impact: i,
                    },
                }),
            }
        }

        if !skipped.is_empty() {
            tracing::debug!(count = skipped.len(), %mode, "risks left out of matrix");
        }

        Self {
            mode,
            thresholds,
            rows,
            skipped,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&MatrixCell> {
        self.rows.get(row)?.get(col)
    }

    /// Number of risks placed in the grid
    pub fn placed(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .map(|cell| cell.entries.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, p: Option<u8>, i: Option<u8>, level: Option<u8>) -> MatrixPoint {
        let coords = Coordinates {
            probability: p,
            impact: i,
            level,
        };
        MatrixPoint {
            id: id.to_string(),
            name: format!("Risco {}", id),
            inherent: coords,
            residual: coords,
        }
    }

    #[test]
    fn test_corner_positions() {
        assert_eq!(position(5, 1), Some((0, 0)));
        assert_eq!(position(1, 5), Some((4, 4)));
        assert_eq!(position(3, 3), Some((2, 2)));
        assert_eq!(position(0, 3), None);
        assert_eq!(position(3, 6), None);
    }

    #[test]
    fn test_default_bands() {
        let t = SeverityThresholds::default();
        assert_eq!(t.band(1), SeverityBand::Baixo);
        assert_eq!(t.band(5), SeverityBand::Baixo);
        assert_eq!(t.band(6), SeverityBand::Medio);
        assert_eq!(t.band(12), SeverityBand::Medio);
        assert_eq!(t.band(16), SeverityBand::Alto);
        assert_eq!(t.band(20), SeverityBand::Alto);
        assert_eq!(t.band(25), SeverityBand::Critico);
    }

    #[test]
    fn test_band_is_monotonic_over_grid() {
        let t = SeverityThresholds::default();
        let mut levels: Vec<u8> = (1..=5u8)
            .flat_map(|p| (1..=5u8).map(move |i| p * i))
            .collect();
        levels.sort_unstable();
        assert!(levels.iter().all(|l| (1..=25).contains(l)));
        assert!(levels.windows(2).all(|w| t.band(w[0]) <= t.band(w[1])));
    }

    #[test]
    fn test_build_places_and_reports_skipped() {
        let points = vec![
            point("a", Some(5), Some(1), Some(5)),
            point("b", Some(1), Some(5), None),
            point("c", None, Some(2), None),
            point("d", Some(6), Some(2), None),
        ];
        let matrix = RiskMatrix::build(&points, MatrixMode::Inerente, SeverityThresholds::default());

        assert_eq!(matrix.cell(0, 0).unwrap().entries[0].id, "a");
        let corner = &matrix.cell(4, 4).unwrap().entries[0];
        assert_eq!(corner.id, "b");
        // level falls back to p x i
        assert_eq!(corner.level, 5);

        assert_eq!(matrix.placed(), 2);
        assert_eq!(matrix.skipped.len(), 2);
        assert_eq!(matrix.placed() + matrix.skipped.len(), points.len());
        assert_eq!(matrix.skipped[0].reason, SkipReason::MissingCoordinates);
        assert!(matches!(
            matrix.skipped[1].reason,
            SkipReason::OutOfRange { probability: 6, .. }
        ));
    }

    #[test]
    fn test_mode_selects_view() {
        let point = MatrixPoint {
            id: "r".to_string(),
            name: "r".to_string(),
            inherent: Coordinates {
                probability: Some(5),
                impact: Some(5),
                level: Some(25),
            },
            residual: Coordinates::default(),
        };
        let inherent = RiskMatrix::build(
            std::slice::from_ref(&point),
            MatrixMode::Inerente,
            SeverityThresholds::default(),
        );
        assert_eq!(inherent.cell(0, 4).unwrap().entries[0].band, SeverityBand::Critico);

        let residual = RiskMatrix::build(&[point], MatrixMode::Residual, SeverityThresholds::default());
        assert_eq!(residual.placed(), 0);
        assert_eq!(residual.skipped.len(), 1);
    }

    #[test]
    fn test_cell_band_uses_cell_product() {
        let matrix = RiskMatrix::build(&[], MatrixMode::Residual, SeverityThresholds::default());
        assert_eq!(matrix.cell(0, 4).unwrap().band, SeverityBand::Critico);
        assert_eq!(matrix.cell(4, 0).unwrap().band, SeverityBand::Baixo);
        assert_eq!(matrix.cell(2, 3).unwrap().band, SeverityBand::Medio);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = SeverityThresholds {
            baixo: 3,
            medio: 8,
            alto: 15,
        };
        assert_eq!(t.band(4), SeverityBand::Medio);
        assert_eq!(t.band(16), SeverityBand::Critico);
    }

    #[test]
    fn test_threshold_order() {
        assert!(SeverityThresholds::default().is_ascending());
        let equal = SeverityThresholds {
            baixo: 10,
            medio: 10,
            alto: 10,
        };
        assert!(equal.is_ascending());
        let inverted = SeverityThresholds {
            baixo: 15,
            medio: 5,
            alto: 20,
        };
        assert!(!inverted.is_ascending());
    }
}
