pub mod gerber;

use serde::Serialize;

use crate::error::ParseError;
use crate::layers::RoleTag;
use crate::types::{BBox, FileAnalysis};

use self::gerber::coord::Units;
use self::gerber::excellon;

/// Which grammar a file's content was read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Gerber,
    Excellon,
}

/// Everything one forward scan of a file collects, lengths already in mm.
#[derive(Debug, Default)]
pub struct ContentScan {
    pub units: Units,
    pub bbox: BBox,
    pub trace_widths: Vec<f64>,
    pub hole_sizes: Vec<f64>,
    pub drill_hits: usize,
    /// Role stated by the file itself (Gerber X2 `%TF.FileFunction`).
    pub content_role: Option<RoleTag>,
    /// Tokens or lines that parsed successfully.
    pub recognized: usize,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<String>,
}

/// Parse one file's content into a per-file analysis.
///
/// Role, name and the outline flag are left for the caller to fill in. This
/// never fails; problems end up in `errors`/`warnings`.
pub fn parse(content: &str) -> FileAnalysis {
    if content.trim().is_empty() {
        return FileAnalysis {
            warnings: vec!["file is empty".to_string()],
            ..Default::default()
        };
    }

    if excellon::looks_like_excellon(content) {
        excellon::scan(content).into_analysis(ContentFormat::Excellon)
    } else {
        gerber::scan(content).into_analysis(ContentFormat::Gerber)
    }
}

impl ContentScan {
    pub fn into_analysis(self, format: ContentFormat) -> FileAnalysis {
        let mut analysis = FileAnalysis {
            units: self.units,
            dimensions: self.bbox.dimensions(),
            min_trace_width: min_of(&self.trace_widths),
            min_hole_size: min_of(&self.hole_sizes),
            drill_hits: self.drill_hits,
            content_role: self.content_role,
            warnings: self.warnings,
            ..Default::default()
        };

        if self.recognized == 0 {
            // Nothing understood at all: one error for the file rather than
            // one per token of noise
            analysis.errors.push(format!(
                "no parseable Gerber or Excellon content ({} malformed tokens)",
                self.errors.len()
            ));
            return analysis;
        }

        analysis.format = Some(format);
        analysis.errors = self.errors.iter().map(ToString::to_string).collect();
        if analysis.dimensions.is_none() {
            analysis.warnings.push("no measurable geometry".to_string());
        }
        analysis
    }
}

fn min_of(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_dispatches_on_content() {
        let drill = parse("M48\nMETRIC\nT1C0.4\n%\nT1\nX1.0Y1.0\nX2.0Y3.0\nM30\n");
        assert_eq!(drill.format, Some(ContentFormat::Excellon));
        assert_eq!(drill.min_hole_size, Some(0.4));
        assert_eq!(drill.min_trace_width, None);
        assert_eq!(drill.drill_hits, 2);

        let gerber = parse("%MOMM*%\n%ADD10C,0.2*%\nD10*\nX0Y0D02*\nX10000Y10000D01*\n");
        assert_eq!(gerber.format, Some(ContentFormat::Gerber));
        assert_eq!(gerber.min_trace_width, Some(0.2));
        assert_eq!(gerber.min_hole_size, None);
    }

    #[test]
    fn test_unit_normalization_matches_mm() {
        // 1000 x 2000 mils drawn in inches vs the same board in mm
        let inches = parse("%FSLAX24Y24*%\n%MOIN*%\nX0Y0D02*\nX10000Y20000D01*\n");
        let mm = parse("%FSLAX24Y24*%\n%MOMM*%\nX0Y0D02*\nX254000Y508000D01*\n");
        let (a, b) = (inches.dimensions.unwrap(), mm.dimensions.unwrap());
        assert_abs_diff_eq!(a.width, b.width, epsilon = 1e-9);
        assert_abs_diff_eq!(a.height, b.height, epsilon = 1e-9);
        assert_abs_diff_eq!(a.width, 25.4, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_box_leaves_dimensions_unset() {
        // A single vertical line has no width
        let analysis = parse("%MOMM*%\nX0Y0D02*\nX0Y10000D01*\n");
        assert!(analysis.dimensions.is_none());
        assert_eq!(analysis.warnings, vec!["no measurable geometry".to_string()]);
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn test_garbage_yields_single_error() {
        let analysis = parse("PK\u{3}\u{4} garbage garbage\n*more*noise*\n%%%");
        assert_eq!(analysis.errors.len(), 1);
        assert!(analysis.dimensions.is_none());
        assert!(analysis.format.is_none());
    }

    #[test]
    fn test_partial_file_keeps_what_parsed() {
        let analysis = parse(
            "%MOMM*%\n%ADD10C,0.25*%\nX0Y0D02*\nQQQ*\nX50000Y40000D01*\n%ADD11R,junk*%\n",
        );
        assert_eq!(analysis.errors.len(), 2);
        assert_eq!(analysis.min_trace_width, Some(0.25));
        let dims = analysis.dimensions.unwrap();
        assert_abs_diff_eq!(dims.width, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dims.height, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_content_is_a_warning() {
        let analysis = parse("  \n");
        assert!(analysis.errors.is_empty());
        assert_eq!(analysis.warnings.len(), 1);
    }

    #[test]
    fn test_min_of() {
        assert_eq!(min_of(&[0.3, 0.2, 0.5]), Some(0.2));
        assert_eq!(min_of(&[]), None);
    }
}
