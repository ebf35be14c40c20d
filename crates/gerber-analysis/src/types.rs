use serde::ser::Serializer;
use serde::Serialize;

use crate::layers::RoleTag;
use crate::parsers::gerber::coord::Units;
use crate::parsers::ContentFormat;

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

/// Wrapper that rounds f64 to 6 decimal places on serialization.
fn serialize_f64_rounded<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_f64(*v, 6))
}

fn serialize_opt_f64_rounded<S: Serializer>(v: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(val) => s.serialize_some(&round_f64(*val, 6)),
        None => s.serialize_none(),
    }
}

// ─── Input ───────────────────────────────────────────────────────────

/// One file pulled out of the uploaded blob.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFile {
    pub name: String,
    pub content: String,
    /// Set when the entry could not be decoded; `content` is then empty.
    pub warning: Option<String>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            warning: None,
        }
    }

    pub fn placeholder(name: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            warning: Some(warning.into()),
        }
    }
}

// ─── Geometry ────────────────────────────────────────────────────────

/// Width and height in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub width: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub height: f64,
}

/// Running extrema of plotted coordinates, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BBox {
    pub fn empty() -> Self {
        Self {
            minx: f64::INFINITY,
            miny: f64::INFINITY,
            maxx: f64::NEG_INFINITY,
            maxy: f64::NEG_INFINITY,
        }
    }

    pub fn expand_point(&mut self, x: f64, y: f64) {
        self.minx = self.minx.min(x);
        self.miny = self.miny.min(y);
        self.maxx = self.maxx.max(x);
        self.maxy = self.maxy.max(y);
    }

    /// `None` unless both axes are finite and strictly non-degenerate.
    pub fn dimensions(&self) -> Option<Dimensions> {
        let width = self.maxx - self.minx;
        let height = self.maxy - self.miny;
        (width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
            .then_some(Dimensions { width, height })
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── Per-file result ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    pub name: String,
    pub role: Option<RoleTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ContentFormat>,
    pub units: Units,
    pub dimensions: Option<Dimensions>,
    #[serde(serialize_with = "serialize_opt_f64_rounded")]
    pub min_trace_width: Option<f64>,
    #[serde(serialize_with = "serialize_opt_f64_rounded")]
    pub min_hole_size: Option<f64>,
    pub drill_hits: usize,
    pub has_gold_fingers: bool,
    pub is_board_outline: bool,
    /// Role the content declares about itself, consulted by the orchestrator.
    #[serde(skip)]
    pub content_role: Option<RoleTag>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

// ─── Board-level result ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardAnalysisResult {
    pub dimensions: Option<Dimensions>,
    /// One entry per copper-bearing file, duplicates kept.
    pub layer_roles: Vec<RoleTag>,
    pub has_gold_fingers: bool,
    pub has_vias: bool,
    #[serde(serialize_with = "serialize_opt_f64_rounded")]
    pub min_trace_width: Option<f64>,
    #[serde(serialize_with = "serialize_opt_f64_rounded")]
    pub min_hole_size: Option<f64>,
    pub drill_count: Option<usize>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Fewest copper layers a quote is ever made for.
pub const MIN_LAYER_COUNT: usize = 2;

impl BoardAnalysisResult {
    /// Copper layer count for the order form, floored at two.
    pub fn estimated_layer_count(&self) -> usize {
        self.layer_roles.len().max(MIN_LAYER_COUNT)
    }

    /// Whether the analysis produced enough to pre-fill an order.
    ///
    /// Keyed on dimensions rather than on `errors`: a package with a few bad
    /// tokens is still usable, one with no geometry is not.
    pub fn is_usable(&self) -> bool {
        self.dimensions.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bbox_has_no_dimensions() {
        assert_eq!(BBox::empty().dimensions(), None);
    }

    #[test]
    fn test_degenerate_bbox_has_no_dimensions() {
        let mut bbox = BBox::empty();
        bbox.expand_point(1.0, 1.0);
        assert_eq!(bbox.dimensions(), None);
        bbox.expand_point(5.0, 1.0);
        assert_eq!(bbox.dimensions(), None);
        bbox.expand_point(5.0, 3.0);
        assert_eq!(
            bbox.dimensions(),
            Some(Dimensions {
                width: 4.0,
                height: 2.0
            })
        );
    }

    #[test]
    fn test_layer_count_floor() {
        let mut result = BoardAnalysisResult::default();
        assert_eq!(result.estimated_layer_count(), 2);
        result.layer_roles = vec![RoleTag::TopCopper; 4];
        assert_eq!(result.estimated_layer_count(), 4);
    }

    #[test]
    fn test_usable_follows_dimensions() {
        let mut result = BoardAnalysisResult {
            errors: vec!["x.gbr: line 3: bad coordinate".into()],
            ..Default::default()
        };
        assert!(!result.is_usable());
        result.dimensions = Some(Dimensions {
            width: 10.0,
            height: 10.0,
        });
        assert!(result.is_usable());
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = BoardAnalysisResult {
            dimensions: Some(Dimensions {
                width: 50.0000000001,
                height: 30.0,
            }),
            layer_roles: vec![RoleTag::TopCopper, RoleTag::BottomCopper],
            min_trace_width: Some(0.1524),
            drill_count: Some(12),
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["dimensions"]["width"], 50.0);
        assert_eq!(json["layerRoles"][1], "Bottom Copper");
        assert_eq!(json["minTraceWidth"], 0.1524);
        assert_eq!(json["minHoleSize"], serde_json::Value::Null);
        assert_eq!(json["drillCount"], 12);
        assert_eq!(json["hasGoldFingers"], false);
    }
}
