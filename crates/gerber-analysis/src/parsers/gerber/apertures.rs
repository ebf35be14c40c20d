/// Aperture shape template from an %AD command, sizes in file units.
#[derive(Debug, Clone, PartialEq)]
pub enum ApertureTemplate {
    Circle {
        diameter: f64,
    },
    Rectangle {
        x_size: f64,
        y_size: f64,
    },
    Obround {
        x_size: f64,
        y_size: f64,
    },
    Polygon,
    /// Reference to a user-defined aperture macro.
    Macro,
}

impl ApertureTemplate {
    /// Width this aperture lays down as a trace or pad, in file units.
    ///
    /// Circles use the diameter, rectangles and obrounds the smaller side.
    /// Polygons and macros have no meaningful single width.
    pub fn trace_width(&self) -> Option<f64> {
        match self {
            ApertureTemplate::Circle { diameter } => Some(*diameter),
            ApertureTemplate::Rectangle { x_size, y_size }
            | ApertureTemplate::Obround { x_size, y_size } => Some(x_size.min(*y_size)),
            ApertureTemplate::Polygon | ApertureTemplate::Macro => None,
        }
    }
}

/// Parse the template part of an %AD command. Example: `C,0.020` or `R,0.040X0.020`
pub fn parse_template(s: &str) -> Result<ApertureTemplate, String> {
    let (type_str, params_str) = s.split_once(',').unwrap_or((s, ""));

    let params: Vec<f64> = if params_str.is_empty() {
        Vec::new()
    } else {
        params_str
            .split(['X', 'x'])
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("bad parameter `{p}`"))
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    let pair = |shape: &str| -> Result<(f64, f64), String> {
        match params.as_slice() {
            [x, y, ..] => Ok((*x, *y)),
            _ => Err(format!("{shape} needs x and y size")),
        }
    };

    match type_str {
        "C" => {
            let diameter = params
                .first()
                .copied()
                .ok_or_else(|| "circle needs a diameter".to_string())?;
            Ok(ApertureTemplate::Circle { diameter })
        }
        "R" => {
            let (x_size, y_size) = pair("rectangle")?;
            Ok(ApertureTemplate::Rectangle { x_size, y_size })
        }
        "O" => {
            let (x_size, y_size) = pair("obround")?;
            Ok(ApertureTemplate::Obround { x_size, y_size })
        }
        "P" if params.len() >= 2 => Ok(ApertureTemplate::Polygon),
        "P" => Err("polygon needs diameter and vertex count".to_string()),
        "" => Err("missing template type".to_string()),
        _ => Ok(ApertureTemplate::Macro),
    }
}
