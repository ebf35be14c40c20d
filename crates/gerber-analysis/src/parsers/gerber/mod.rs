pub mod apertures;
pub mod commands;
pub mod coord;
pub mod excellon;
pub mod lexer;

use log::debug;

use crate::layers;

use self::commands::GerberCommand;
use self::coord::{Axis, CoordinateConverter, RawCoord};
use super::ContentScan;

/// Scan a Gerber RS-274X file in a single forward pass.
///
/// Coordinates and aperture sizes are converted to millimetres as they are
/// read, using whatever unit is in force at that point. A token that fails to
/// parse is recorded and skipped.
pub fn scan(content: &str) -> ContentScan {
    let mut out = ContentScan::default();
    let lexed = lexer::tokenize(content);
    out.errors.extend(lexed.errors);

    let mut conv = CoordinateConverter::default();
    // Current point in mm; Gerber coordinates are modal per axis
    let mut pos = (0.0, 0.0);
    let mut has_point = false;

    'tokens: for token in &lexed.tokens {
        let cmds = match commands::parse_token(token) {
            Ok(cmds) => cmds,
            Err(e) => {
                debug!("Gerber: skipping token: {e}");
                out.errors.push(e);
                continue;
            }
        };
        out.recognized += 1;

        for cmd in cmds {
            match cmd {
                GerberCommand::FormatSpec(format) => conv.format = format,
                GerberCommand::Units(units) => {
                    conv.units = units;
                    out.units = units;
                }
                GerberCommand::ApertureDefine(template) => {
                    if let Some(width) = template.trace_width().filter(|w| *w > 0.0) {
                        out.trace_widths.push(conv.units.to_mm(width));
                    }
                }
                GerberCommand::Interpolate { x, y } => {
                    if has_point {
                        out.bbox.expand_point(pos.0, pos.1);
                    }
                    pos = advance(&conv, pos, x, y);
                    has_point = true;
                    out.bbox.expand_point(pos.0, pos.1);
                }
                GerberCommand::Move { x, y } => {
                    pos = advance(&conv, pos, x, y);
                    has_point = true;
                }
                GerberCommand::Flash { x, y } => {
                    pos = advance(&conv, pos, x, y);
                    has_point = true;
                    out.bbox.expand_point(pos.0, pos.1);
                }
                GerberCommand::FileFunction(func) => {
                    if let Some(role) = layers::role_from_file_function(&func) {
                        out.content_role = Some(role);
                    }
                }
                GerberCommand::EndOfFile => break 'tokens,
                GerberCommand::SelectAperture
                | GerberCommand::GCode(_)
                | GerberCommand::Ignored => {}
            }
        }
    }

    out
}

/// Move the current point; an omitted axis keeps its previous value.
fn advance(
    conv: &CoordinateConverter,
    pos: (f64, f64),
    x: Option<RawCoord>,
    y: Option<RawCoord>,
) -> (f64, f64) {
    (
        x.map_or(pos.0, |x| conv.to_mm(x, Axis::X)),
        y.map_or(pos.1, |y| conv.to_mm(y, Axis::Y)),
    )
}
