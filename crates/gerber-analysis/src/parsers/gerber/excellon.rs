use std::collections::HashMap;

use log::debug;

use crate::error::ParseError;
use crate::parsers::ContentScan;

use super::coord::Units;

/// Zero suppression mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZeroSuppression {
    Trailing,
    Leading,
}

/// Coordinate format: how many integer and decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CoordFormat {
    integer: u8,
    decimal: u8,
}

const METRIC_FORMAT: CoordFormat = CoordFormat {
    integer: 3,
    decimal: 3,
};
const INCH_FORMAT: CoordFormat = CoordFormat {
    integer: 2,
    decimal: 4,
};

#[derive(Debug)]
struct DrillState {
    units: Units,
    zero_sup: ZeroSuppression,
    format: CoordFormat,
    /// Set once the header states digits explicitly; unit changes then keep them.
    explicit_format: bool,
    /// Tool number -> diameter in mm
    tools: HashMap<u32, f64>,
    current_tool: Option<u32>,
    last: (f64, f64),
    /// Hits with no usable tool are reported once per file.
    warned_no_tool: bool,
}

impl Default for DrillState {
    fn default() -> Self {
        Self {
            units: Units::Millimeters,
            zero_sup: ZeroSuppression::Trailing,
            format: METRIC_FORMAT,
            explicit_format: false,
            tools: HashMap::new(),
            current_tool: None,
            last: (0.0, 0.0),
            warned_no_tool: false,
        }
    }
}

impl DrillState {
    fn set_units(&mut self, units: Units) {
        self.units = units;
        if !self.explicit_format {
            self.format = match units {
                Units::Millimeters => METRIC_FORMAT,
                Units::Inches => INCH_FORMAT,
            };
        }
    }
}

/// Excellon files carry an `M48` header line near the top.
pub fn looks_like_excellon(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(';'))
        .take(8)
        .any(|l| l.eq_ignore_ascii_case("M48"))
}

/// Scan an Excellon drill file.
///
/// Tool diameters feed the hole-size multiset; every hit extends the bounding
/// box and counts toward `drill_hits`.
pub fn scan(content: &str) -> ContentScan {
    let mut out = ContentScan {
        units: Units::Millimeters,
        ..Default::default()
    };
    let mut state = DrillState::default();
    let mut in_header = false;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let upper = line.to_uppercase();

        let result = match upper.as_str() {
            "M48" => {
                in_header = true;
                Ok(())
            }
            "%" | "M95" => {
                in_header = false;
                Ok(())
            }
            "M30" | "M00" => {
                out.recognized += 1;
                break;
            }
            _ if in_header => parse_header_line(&upper, line_no, &mut state, &mut out),
            _ => parse_body_line(&upper, line_no, &mut state, &mut out),
        };

        match result {
            Ok(()) => out.recognized += 1,
            Err(e) => {
                debug!("Excellon: skipping line: {e}");
                out.errors.push(e);
            }
        }
    }

    out.units = state.units;
    out
}

fn parse_header_line(
    line: &str,
    line_no: usize,
    state: &mut DrillState,
    out: &mut ContentScan,
) -> Result<(), ParseError> {
    // Units and format: "METRIC,TZ,000.000" or "INCH,LZ" or "M71" / "M72"
    if line.starts_with("METRIC") || line == "M71" {
        parse_format_options(line, state);
        state.set_units(Units::Millimeters);
        return Ok(());
    }
    if line.starts_with("INCH") || line == "M72" {
        parse_format_options(line, state);
        state.set_units(Units::Inches);
        return Ok(());
    }
    if line.starts_with('T') {
        return parse_tool_line(line, line_no, state, out);
    }
    // FMAT, ICI, VER, ATC and friends do not affect the analysis
    Ok(())
}

fn parse_format_options(line: &str, state: &mut DrillState) {
    for part in line.split(',').map(str::trim) {
        match part {
            "TZ" => state.zero_sup = ZeroSuppression::Trailing,
            "LZ" => state.zero_sup = ZeroSuppression::Leading,
            // Digit format like "000.000" or "00.0000"
            _ if part.contains('.') && part.chars().all(|c| c == '0' || c == '.') => {
                if let Some((int, dec)) = part.split_once('.') {
                    if !int.is_empty() && !dec.is_empty() {
                        state.format = CoordFormat {
                            integer: int.len() as u8,
                            decimal: dec.len() as u8,
                        };
                        state.explicit_format = true;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Tool definition (`T01C0.300`, `T1F00S00C0.0300`) or selection (`T01`).
fn parse_tool_line(
    line: &str,
    line_no: usize,
    state: &mut DrillState,
    out: &mut ContentScan,
) -> Result<(), ParseError> {
    let bad = || ParseError::BadTool {
        line: line_no,
        content: line.to_string(),
    };

    let rest = &line[1..];
    let num_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let tool: u32 = rest[..num_end].parse().map_err(|_| bad())?;

    let Some(c_pos) = rest.find('C') else {
        // Selection; T0 unloads
        state.current_tool = (tool != 0).then_some(tool);
        return Ok(());
    };

    let after = &rest[c_pos + 1..];
    let end = after
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(after.len());
    let diameter: f64 = after[..end].parse().map_err(|_| bad())?;
    let diameter_mm = state.units.to_mm(diameter);
    state.tools.insert(tool, diameter_mm);
    if diameter_mm > 0.0 {
        out.hole_sizes.push(diameter_mm);
    }
    Ok(())
}

fn parse_body_line(
    line: &str,
    line_no: usize,
    state: &mut DrillState,
    out: &mut ContentScan,
) -> Result<(), ParseError> {
    if line.starts_with('T') {
        return parse_tool_line(line, line_no, state, out);
    }
    match line {
        "M71" => {
            state.set_units(Units::Millimeters);
            return Ok(());
        }
        "M72" => {
            state.set_units(Units::Inches);
            return Ok(());
        }
        _ => {}
    }
    if line.starts_with('X') || line.starts_with('Y') {
        let (x, y) = parse_coordinate_line(line, state).ok_or_else(|| {
            ParseError::BadCoordinate {
                line: line_no,
                word: line.to_string(),
            }
        })?;
        let x = x.unwrap_or(state.last.0);
        let y = y.unwrap_or(state.last.1);
        state.last = (x, y);

        let tool_defined = state
            .current_tool
            .is_some_and(|t| state.tools.contains_key(&t));
        if !tool_defined && !state.warned_no_tool {
            state.warned_no_tool = true;
            out.warnings
                .push(format!("line {line_no}: drill hits without a defined tool"));
        }
        out.drill_hits += 1;
        out.bbox.expand_point(x, y);
        return Ok(());
    }
    // G90, G05, M47, routing and other modal codes
    if line.starts_with('G') || line.starts_with('M') {
        return Ok(());
    }
    Err(ParseError::Unrecognized {
        line: line_no,
        word: line.to_string(),
    })
}

/// Parse the leading X/Y pair of a hit line; stops at the first other letter
/// (e.g. the `G85` of a slot).
fn parse_coordinate_line(line: &str, state: &DrillState) -> Option<(Option<f64>, Option<f64>)> {
    let mut x = None;
    let mut y = None;
    let mut rest = line;

    while let Some(key) = rest.chars().next() {
        if key != 'X' && key != 'Y' {
            break;
        }
        let body = &rest[1..];
        let end = body
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(body.len());
        let value = parse_coord_value(&body[..end], state)?;
        if key == 'X' {
            x = Some(value);
        } else {
            y = Some(value);
        }
        rest = &body[end..];
    }

    Some((x, y))
}

/// Decode one coordinate to mm.
fn parse_coord_value(s: &str, state: &DrillState) -> Option<f64> {
    if s.is_empty() {
        return None;
    }

    let value = if s.contains('.') {
        s.parse::<f64>().ok()?
    } else {
        let negative = s.starts_with('-');
        let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let total_digits = (state.format.integer + state.format.decimal) as usize;
        let padded = match state.zero_sup {
            // Eagle and most other tools declare TZ yet drop leading zeros, so
            // the digits are right-aligned
            ZeroSuppression::Trailing => format!("{digits:0>total_digits$}"),
            // LZ keeps leading zeros and drops trailing ones
            ZeroSuppression::Leading => format!("{digits:0<total_digits$}"),
        };
        let raw: i64 = padded.parse().ok()?;
        let val = raw as f64 / 10f64.powi(state.format.decimal as i32);
        if negative {
            -val
        } else {
            val
        }
    };

    Some(state.units.to_mm(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const BASIC: &str = "\
M48
METRIC,TZ,000.000
T11C0.300
T12C0.800
%
T11
X14.478Y10.541
X14.478Y12.191
T12
X15.000Y10.000
M30
";

    #[test]
    fn test_basic_excellon() {
        let scan = scan(BASIC);
        assert!(scan.errors.is_empty());
        assert_eq!(scan.drill_hits, 3);
        assert_eq!(scan.hole_sizes, vec![0.3, 0.8]);
        let dims = scan.bbox.dimensions().unwrap();
        assert_abs_diff_eq!(dims.width, 0.522, epsilon = 1e-9);
        assert_abs_diff_eq!(dims.height, 2.191, epsilon = 1e-9);
    }

    #[test]
    fn test_detects_header() {
        assert!(looks_like_excellon(BASIC));
        assert!(looks_like_excellon("; generated\n\nm48\n"));
        assert!(!looks_like_excellon("%MOMM*%\nG04 M48 in a comment*\n"));
    }

    #[test]
    fn test_inch_units() {
        let content = "\
M48
INCH,TZ
T01C0.010
%
T01
X1.000Y1.000
X2.000Y1.500
M30
";
        let scan = scan(content);
        assert_eq!(scan.units, Units::Inches);
        assert_abs_diff_eq!(scan.hole_sizes[0], 0.254, epsilon = 1e-9);
        let dims = scan.bbox.dimensions().unwrap();
        assert_abs_diff_eq!(dims.width, 25.4, epsilon = 1e-9);
        assert_abs_diff_eq!(dims.height, 12.7, epsilon = 1e-9);
    }

    #[test]
    fn test_inch_default_digits() {
        // INCH without explicit digits uses 2.4: "10000" is 1.0000"
        let content = "M48\nINCH,TZ\nT1C0.02\n%\nT1\nX0Y0\nX10000Y5000\nM30\n";
        let dims = scan(content).bbox.dimensions().unwrap();
        assert_abs_diff_eq!(dims.width, 25.4, epsilon = 1e-9);
        assert_abs_diff_eq!(dims.height, 12.7, epsilon = 1e-9);
    }

    #[test]
    fn test_leading_zeros_kept_pads_right() {
        // LZ 3.3: "010" is 010.000, "05" is 050.000
        let content = "M48\nMETRIC,LZ,000.000\nT1C0.3\n%\nT1\nX010Y010\nX100Y05\nM30\n";
        let dims = scan(content).bbox.dimensions().unwrap();
        assert_abs_diff_eq!(dims.width, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dims.height, 40.0, epsilon = 1e-9);

        // INCH,LZ with the default 2.4 digits: "10000" is 10.0000", "005" is 00.5000"
        let content = "M48\nINCH,LZ\nT1C0.02\n%\nT1\nX00Y00\nX10000Y005\nM30\n";
        let dims = scan(content).bbox.dimensions().unwrap();
        assert_abs_diff_eq!(dims.width, 254.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dims.height, 12.7, epsilon = 1e-9);
    }

    #[test]
    fn test_eagle_tz_leading_zeros_dropped() {
        let content = "\
M48
;GenerationSoftware,Autodesk,EAGLE,9.7.0*%
FMAT,2
ICI,OFF
METRIC,TZ,000.000
T1C4.300
%
G90
M71
T1
X4572Y4572
X135128Y58928
M30
";
        let scan = scan(content);
        assert!(scan.errors.is_empty());
        assert_eq!(scan.drill_hits, 2);
        let dims = scan.bbox.dimensions().unwrap();
        assert_abs_diff_eq!(dims.width, 135.128 - 4.572, epsilon = 1e-6);
        assert_abs_diff_eq!(dims.height, 58.928 - 4.572, epsilon = 1e-6);
    }

    #[test]
    fn test_altium_tool_definition() {
        let content = "M48\nINCH\nT1F00S00C0.0300\nT2F00S00C0.0120\n%\nT01\nX0Y0\nM30\n";
        let scan = scan(content);
        assert_eq!(scan.hole_sizes.len(), 2);
        assert_abs_diff_eq!(scan.hole_sizes[1], 0.3048, epsilon = 1e-9);
    }

    #[test]
    fn test_modal_hits() {
        let content = "M48\nMETRIC\nT1C0.5\n%\nT1\nX1.0Y1.0\nX3.0\nY4.0\nM30\n";
        let scan = scan(content);
        assert_eq!(scan.drill_hits, 3);
        let dims = scan.bbox.dimensions().unwrap();
        assert_abs_diff_eq!(dims.width, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dims.height, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bad_lines_are_collected() {
        let content = "\
M48
METRIC
T1Cfoo
T2C0.6
%
T2
X1.0Y1.0
Xabc
WHAT
X2.0Y3.0
M30
";
        let scan = scan(content);
        assert_eq!(scan.errors.len(), 3);
        assert_eq!(scan.hole_sizes, vec![0.6]);
        assert_eq!(scan.drill_hits, 2);
        assert!(matches!(scan.errors[0], ParseError::BadTool { line: 3, .. }));
    }

    #[test]
    fn test_hits_without_tool_warn_once() {
        let scan = scan("M48\nMETRIC\n%\nX1.0Y1.0\nX2.0Y2.0\nM30\n");
        assert_eq!(scan.drill_hits, 2);
        assert_eq!(scan.warnings.len(), 1);
    }

    #[test]
    fn test_empty_drill_file() {
        let scan = scan("M48\nMETRIC,TZ,000.000\n%\nM30\n");
        assert_eq!(scan.drill_hits, 0);
        assert!(scan.bbox.dimensions().is_none());
        assert!(scan.recognized > 0);
    }
}
