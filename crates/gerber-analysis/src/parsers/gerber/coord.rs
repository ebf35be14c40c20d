use serde::Serialize;

pub const MM_PER_INCH: f64 = 25.4;

/// Coordinate format from the %FS (Format Specification) command.
///
/// Example: `%FSLAX24Y24*%` means leading-zero omission, absolute mode,
/// 2 integer digits + 4 decimal digits for both X and Y. `%FSTA...` omits
/// trailing zeros instead, so short values are aligned on the left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateFormat {
    pub x_integer: u8,
    pub x_decimal: u8,
    pub y_integer: u8,
    pub y_decimal: u8,
    pub trailing_zeros_omitted: bool,
}

impl Default for CoordinateFormat {
    fn default() -> Self {
        Self {
            x_integer: 2,
            x_decimal: 4,
            y_integer: 2,
            y_decimal: 4,
            trailing_zeros_omitted: false,
        }
    }
}

/// A coordinate as written in the file: its integer value and how many
/// digits it was written with (sign excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCoord {
    pub value: i64,
    pub digits: usize,
}

impl RawCoord {
    /// Parse an optionally signed run of digits, e.g. `-02500`.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            value: text.parse().ok()?,
            digits: digits.len(),
        })
    }
}

/// Measurement unit declared by a file. Millimetres unless stated otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
}

impl Units {
    /// Convert a length expressed in these units to millimetres.
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Units::Millimeters => value,
            Units::Inches => value * MM_PER_INCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Converts raw Gerber integer coordinates to millimetres.
#[derive(Debug, Clone, Default)]
pub struct CoordinateConverter {
    pub format: CoordinateFormat,
    pub units: Units,
}

impl CoordinateConverter {
    /// The last N digits of `raw` are the decimal part, N taken from the
    /// format for that axis. With X24, 1234567 means 123.4567 file units.
    /// When trailing zeros are omitted the missing digits are restored first.
    pub fn to_mm(&self, raw: RawCoord, axis: Axis) -> f64 {
        let (integer_digits, decimal_digits) = match axis {
            Axis::X => (self.format.x_integer, self.format.x_decimal),
            Axis::Y => (self.format.y_integer, self.format.y_decimal),
        };
        let mut value = raw.value as f64;
        if self.format.trailing_zeros_omitted {
            let total = i32::from(integer_digits) + i32::from(decimal_digits);
            value *= 10f64.powi(total - raw.digits as i32);
        }
        self.units.to_mm(value / 10f64.powi(decimal_digits as i32))
    }
}
