use crate::layers::RoleTag;
use crate::types::{BoardAnalysisResult, Dimensions, FileAnalysis};

/// Reduce per-file analyses, in processing order, to one board-level result.
///
/// Board outline dimensions are authoritative (first outline with dimensions
/// wins). Without one, width and height are each the maximum over all files.
pub fn merge(results: &[FileAnalysis]) -> BoardAnalysisResult {
    let layer_roles: Vec<RoleTag> = results
        .iter()
        .filter_map(|r| r.role)
        .filter(|role| role.is_copper())
        .collect();

    let (drill_count, has_vias) = drill_summary(results);

    BoardAnalysisResult {
        dimensions: merge_dimensions(results),
        layer_roles,
        has_gold_fingers: results.iter().any(|r| r.has_gold_fingers),
        has_vias,
        min_trace_width: min_present(results.iter().map(|r| r.min_trace_width)),
        min_hole_size: min_present(results.iter().map(|r| r.min_hole_size)),
        drill_count,
        errors: results.iter().flat_map(|r| r.errors.iter().cloned()).collect(),
        warnings: results
            .iter()
            .flat_map(|r| r.warnings.iter().cloned())
            .collect(),
    }
}

fn merge_dimensions(results: &[FileAnalysis]) -> Option<Dimensions> {
    if let Some(outline) = results
        .iter()
        .filter(|r| r.is_board_outline)
        .find_map(|r| r.dimensions)
    {
        return Some(outline);
    }

    results
        .iter()
        .filter_map(|r| r.dimensions)
        .reduce(|acc, d| Dimensions {
            width: acc.width.max(d.width),
            height: acc.height.max(d.height),
        })
}

fn min_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values.flatten().reduce(f64::min)
}

/// Drill count is the number of drill files plus every hit they contain;
/// any drilling at all means the board has vias.
fn drill_summary(results: &[FileAnalysis]) -> (Option<usize>, bool) {
    let drill_files = results
        .iter()
        .filter(|r| r.role == Some(RoleTag::Drill))
        .count();
    let hits: usize = results.iter().map(|r| r.drill_hits).sum();
    let total = drill_files + hits;
    if total == 0 {
        (None, false)
    } else {
        (Some(total), true)
    }
}
