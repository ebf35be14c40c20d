use crate::error::ParseError;
use crate::layers::Side;

use super::apertures::{self, ApertureTemplate};
use super::coord::{CoordinateFormat, RawCoord, Units};
use super::lexer::{Token, TokenKind};

/// Parsed Gerber X2 FileFunction attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FileFunction {
    Copper { side: Side },
    Legend { side: Side },
    SolderMask { side: Side },
    KeepOut,
    Profile,
    Drill,
    Other,
}

/// The subset of Gerber commands that carries units, geometry or tools.
#[derive(Debug, Clone, PartialEq)]
pub enum GerberCommand {
    /// %FS - Format specification
    FormatSpec(CoordinateFormat),
    /// %MO, or the legacy G70/G71 words
    Units(Units),
    /// %AD - Aperture definition
    ApertureDefine(ApertureTemplate),
    /// Dnn (n >= 10) - Select aperture
    SelectAperture,
    /// D01 - Interpolate (draw) to the given point
    Interpolate {
        x: Option<RawCoord>,
        y: Option<RawCoord>,
    },
    /// D02 - Move
    Move {
        x: Option<RawCoord>,
        y: Option<RawCoord>,
    },
    /// D03 - Flash
    Flash {
        x: Option<RawCoord>,
        y: Option<RawCoord>,
    },
    /// %TF.FileFunction
    FileFunction(FileFunction),
    /// Any other G-code (interpolation mode, regions, quadrant mode...)
    GCode(u32),
    /// M02 / M00 - End of file
    EndOfFile,
    /// Well-formed command that does not affect the analysis (%LP, %AM, %TA...)
    Ignored,
}

/// Parse one token into the commands it holds.
///
/// A word may carry a leading G-code in front of a coordinate operation
/// (e.g. `G01X100Y200D01`, `G54D10`), so the result is a list.
pub fn parse_token(token: &Token) -> Result<Vec<GerberCommand>, ParseError> {
    match &token.kind {
        TokenKind::Extended(content) => parse_extended(content, token.line).map(|c| vec![c]),
        TokenKind::Word(word) => parse_word(word, token.line),
    }
}

fn parse_extended(content: &str, line: usize) -> Result<GerberCommand, ParseError> {
    if content.starts_with("FS") {
        return parse_format_spec(content, line);
    }
    if content == "MOMM" {
        return Ok(GerberCommand::Units(Units::Millimeters));
    }
    if content == "MOIN" {
        return Ok(GerberCommand::Units(Units::Inches));
    }
    if content.starts_with("AD") {
        return parse_aperture_define(content, line);
    }
    if let Some(rest) = content.strip_prefix("TF.FileFunction,") {
        return Ok(GerberCommand::FileFunction(parse_file_function(rest)));
    }
    Ok(GerberCommand::Ignored)
}

/// Parse %FS command. Example: `FSLAX24Y24`
fn parse_format_spec(content: &str, line: usize) -> Result<GerberCommand, ParseError> {
    let bad = |reason: String| ParseError::BadFormat {
        line,
        content: content.to_string(),
        reason,
    };

    // L/T (zero omission) and A/I (absolute/incremental) come before X
    let modes = &content[2..];
    let s = modes.trim_start_matches(['L', 'T', 'D', 'A', 'I']);
    let trailing_zeros_omitted = modes[..modes.len() - s.len()].contains('T');

    let x_pos = s.find('X').ok_or_else(|| bad("missing X".into()))?;
    let y_pos = s.find('Y').ok_or_else(|| bad("missing Y".into()))?;
    if y_pos < x_pos {
        return Err(bad("Y before X".into()));
    }

    let digits = |part: &str| -> Result<(u8, u8), ParseError> {
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad(format!("invalid digits `{part}`")));
        }
        let b = part.as_bytes();
        Ok((b[0] - b'0', b[1] - b'0'))
    };

    let (x_integer, x_decimal) = digits(&s[x_pos + 1..y_pos])?;
    let (y_integer, y_decimal) = digits(&s[y_pos + 1..])?;

    Ok(GerberCommand::FormatSpec(CoordinateFormat {
        x_integer,
        x_decimal,
        y_integer,
        y_decimal,
        trailing_zeros_omitted,
    }))
}

/// Parse %AD command. Example: `ADD10C,0.020` or `ADD11R,0.040X0.020`
fn parse_aperture_define(content: &str, line: usize) -> Result<GerberCommand, ParseError> {
    let bad = |reason: String| ParseError::BadAperture {
        line,
        content: content.to_string(),
        reason,
    };

    let s = content[2..]
        .strip_prefix('D')
        .ok_or_else(|| bad("expected D code".into()))?;
    let type_pos = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| bad("no template type".into()))?;
    if type_pos == 0 {
        return Err(bad("bad aperture code".into()));
    }
    let template = apertures::parse_template(&s[type_pos..]).map_err(bad)?;

    Ok(GerberCommand::ApertureDefine(template))
}

/// Parse the fields after `TF.FileFunction,`. Example: `Copper,L1,Top`
fn parse_file_function(rest: &str) -> FileFunction {
    let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
    let side = |s: Option<&&str>| match s.copied() {
        Some("Bot") | Some("Bottom") => Side::Bottom,
        _ => Side::Top,
    };

    match parts.first().copied() {
        Some("Copper") => {
            let layer_num = parts
                .get(1)
                .and_then(|s| s.strip_prefix('L'))
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(1);
            let side = match parts.get(2).copied() {
                Some("Top") => Side::Top,
                Some("Bot") | Some("Bottom") => Side::Bottom,
                Some("Inr") | Some("Inner") => Side::Inner,
                _ if layer_num == 1 => Side::Top,
                _ => Side::Inner,
            };
            FileFunction::Copper { side }
        }
        Some("Legend") => FileFunction::Legend {
            side: side(parts.get(1)),
        },
        Some("Soldermask") => FileFunction::SolderMask {
            side: side(parts.get(1)),
        },
        Some("Keepout") => FileFunction::KeepOut,
        Some("Profile") => FileFunction::Profile,
        Some("Plated") | Some("NonPlated") => FileFunction::Drill,
        _ => FileFunction::Other,
    }
}

/// Parse a word command (e.g., "D10", "X100Y200D01", "G01", "M02").
fn parse_word(word: &str, line: usize) -> Result<Vec<GerberCommand>, ParseError> {
    let mut commands = Vec::new();
    let mut remaining = word;

    // Leading G-code
    if let Some(rest) = remaining.strip_prefix(['G', 'g']) {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let code: u32 = rest[..end].parse().map_err(|_| ParseError::Unrecognized {
            line,
            word: word.to_string(),
        })?;
        commands.push(match code {
            70 => GerberCommand::Units(Units::Inches),
            71 => GerberCommand::Units(Units::Millimeters),
            _ => GerberCommand::GCode(code),
        });
        remaining = &rest[end..];
        if remaining.is_empty() {
            return Ok(commands);
        }
    }

    if let Some(rest) = remaining.strip_prefix(['M', 'm']) {
        return match rest.parse::<u32>() {
            Ok(0) | Ok(2) => {
                commands.push(GerberCommand::EndOfFile);
                Ok(commands)
            }
            Ok(_) => {
                commands.push(GerberCommand::Ignored);
                Ok(commands)
            }
            Err(_) => Err(ParseError::Unrecognized {
                line,
                word: word.to_string(),
            }),
        };
    }

    let mut x: Option<RawCoord> = None;
    let mut y: Option<RawCoord> = None;
    let mut d_code: Option<u32> = None;

    let bytes = remaining.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let key = bytes[pos].to_ascii_uppercase();
        pos += 1;
        match key {
            b'X' | b'Y' | b'I' | b'J' => {
                let start = pos;
                if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
                    pos += 1;
                }
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                let val = RawCoord::parse(&remaining[start..pos]).ok_or_else(|| {
                    ParseError::BadCoordinate {
                        line,
                        word: word.to_string(),
                    }
                })?;
                match key {
                    b'X' => x = Some(val),
                    b'Y' => y = Some(val),
                    // Arc centre offsets do not move the current point
                    _ => {}
                }
            }
            b'D' => {
                let start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                d_code = Some(remaining[start..pos].parse().map_err(|_| {
                    ParseError::BadDCode {
                        line,
                        word: word.to_string(),
                    }
                })?);
            }
            b' ' | b'\t' => {}
            _ => {
                return Err(ParseError::Unrecognized {
                    line,
                    word: word.to_string(),
                })
            }
        }
    }

    match d_code {
        Some(1) => commands.push(GerberCommand::Interpolate { x, y }),
        Some(2) => commands.push(GerberCommand::Move { x, y }),
        Some(3) => commands.push(GerberCommand::Flash { x, y }),
        Some(code) if code >= 10 => commands.push(GerberCommand::SelectAperture),
        Some(_) => {
            return Err(ParseError::BadDCode {
                line,
                word: word.to_string(),
            })
        }
        // Bare coordinates reuse the modal D01
        None if x.is_some() || y.is_some() => commands.push(GerberCommand::Interpolate { x, y }),
        None if commands.is_empty() => {
            return Err(ParseError::Unrecognized {
                line,
                word: word.to_string(),
            })
        }
        None => {}
    }

    Ok(commands)
}
