use std::fmt;

use serde::{Serialize, Serializer};

use crate::parsers::gerber::commands::FileFunction;

/// Manufacturing role a file plays in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleTag {
    TopCopper,
    BottomCopper,
    InnerCopper,
    TopSolderMask,
    BottomSolderMask,
    TopSilkscreen,
    BottomSilkscreen,
    KeepOut,
    Drill,
    Outline,
    GenericGerber,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Copper,
    SolderMask,
    Silkscreen,
    KeepOut,
    Drill,
    Outline,
    Gerber,
}

impl RoleTag {
    /// Human-readable label, `"{Side} {Type}"` for sided roles.
    pub fn label(self) -> &'static str {
        match self {
            RoleTag::TopCopper => "Top Copper",
            RoleTag::BottomCopper => "Bottom Copper",
            RoleTag::InnerCopper => "Inner Copper",
            RoleTag::TopSolderMask => "Top Solder Mask",
            RoleTag::BottomSolderMask => "Bottom Solder Mask",
            RoleTag::TopSilkscreen => "Top Silkscreen",
            RoleTag::BottomSilkscreen => "Bottom Silkscreen",
            RoleTag::KeepOut => "Keep Out",
            RoleTag::Drill => "Drill",
            RoleTag::Outline => "Outline",
            RoleTag::GenericGerber => "Gerber",
            RoleTag::Unknown => "Unknown",
        }
    }

    /// Copper-bearing roles are the ones whose label mentions copper.
    pub fn is_copper(self) -> bool {
        self.label().to_ascii_lowercase().contains("copper")
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for RoleTag {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

/// Combine a reported side and type into a role.
///
/// Drill, outline, keep-out and generic Gerber types ignore the side. A sided
/// type reported without a usable side cannot be placed in the stackup and
/// falls back to `GenericGerber`.
pub fn compose(side: Option<Side>, kind: LayerKind) -> RoleTag {
    match (kind, side) {
        (LayerKind::Drill, _) => RoleTag::Drill,
        (LayerKind::Outline, _) => RoleTag::Outline,
        (LayerKind::KeepOut, _) => RoleTag::KeepOut,
        (LayerKind::Gerber, _) => RoleTag::GenericGerber,
        (LayerKind::Copper, Some(Side::Top)) => RoleTag::TopCopper,
        (LayerKind::Copper, Some(Side::Bottom)) => RoleTag::BottomCopper,
        (LayerKind::Copper, Some(Side::Inner)) => RoleTag::InnerCopper,
        (LayerKind::SolderMask, Some(Side::Top)) => RoleTag::TopSolderMask,
        (LayerKind::SolderMask, Some(Side::Bottom)) => RoleTag::BottomSolderMask,
        (LayerKind::Silkscreen, Some(Side::Top)) => RoleTag::TopSilkscreen,
        (LayerKind::Silkscreen, Some(Side::Bottom)) => RoleTag::BottomSilkscreen,
        _ => RoleTag::GenericGerber,
    }
}

/// Suffixes that pin down a role on their own.
static SUFFIX_TABLE: &[(&str, Option<Side>, LayerKind)] = &[
    // Altium/Protel
    ("gtl", Some(Side::Top), LayerKind::Copper),
    ("gbl", Some(Side::Bottom), LayerKind::Copper),
    ("gts", Some(Side::Top), LayerKind::SolderMask),
    ("gbs", Some(Side::Bottom), LayerKind::SolderMask),
    ("gto", Some(Side::Top), LayerKind::Silkscreen),
    ("gbo", Some(Side::Bottom), LayerKind::Silkscreen),
    ("gko", None, LayerKind::Outline),
    ("gm1", None, LayerKind::Outline),
    ("gml", None, LayerKind::Outline),
    // Drill
    ("drl", None, LayerKind::Drill),
    ("xln", None, LayerKind::Drill),
    ("drd", None, LayerKind::Drill),
    ("txt", None, LayerKind::Drill),
    // Eagle
    ("cmp", Some(Side::Top), LayerKind::Copper),
    ("sol", Some(Side::Bottom), LayerKind::Copper),
    ("plc", Some(Side::Top), LayerKind::Silkscreen),
    ("pls", Some(Side::Bottom), LayerKind::Silkscreen),
    ("stc", Some(Side::Top), LayerKind::SolderMask),
    ("sts", Some(Side::Bottom), LayerKind::SolderMask),
    ("dim", None, LayerKind::Outline),
];

/// Suffixes that only say "this is a Gerber file".
static GENERIC_SUFFIXES: &[&str] = &["gbr", "ger", "pho", "art"];

/// Classify a file by name.
///
/// Never fails: unrecognized names come back as `RoleTag::Unknown` and are
/// still parsed for geometry.
pub fn classify(filename: &str) -> RoleTag {
    let lower = base_name(filename).to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext);

    if let Some(ext) = ext {
        if let Some((_, side, kind)) = SUFFIX_TABLE.iter().find(|(s, _, _)| *s == ext) {
            return compose(*side, *kind);
        }
        // Protel inner layers: .g1 .. .g8
        if ext
            .strip_prefix('g')
            .and_then(|n| n.parse::<u8>().ok())
            .is_some_and(|n| (1..=8).contains(&n))
        {
            return RoleTag::InnerCopper;
        }
    }

    if let Some((side, kind)) = classify_by_pattern(&lower) {
        return compose(side, kind);
    }

    match ext {
        Some(ext) if GENERIC_SUFFIXES.contains(&ext) => RoleTag::GenericGerber,
        _ => RoleTag::Unknown,
    }
}

/// Gold-finger artwork is only recognizable by naming convention.
pub fn has_gold_fingers(filename: &str) -> bool {
    let squashed: String = filename
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '.'))
        .collect();
    squashed.contains("goldfinger")
}

/// Map a Gerber X2 `%TF.FileFunction` attribute onto a role. Functions that
/// name no layer we track (paste, assembly drawings...) give `None` so the
/// file name keeps deciding.
pub fn role_from_file_function(func: &FileFunction) -> Option<RoleTag> {
    let role = match func {
        FileFunction::Copper { side } => compose(Some(*side), LayerKind::Copper),
        FileFunction::Legend { side } => compose(Some(*side), LayerKind::Silkscreen),
        FileFunction::SolderMask { side } => compose(Some(*side), LayerKind::SolderMask),
        FileFunction::KeepOut => RoleTag::KeepOut,
        FileFunction::Profile => RoleTag::Outline,
        FileFunction::Drill => RoleTag::Drill,
        FileFunction::Other => return None,
    };
    Some(role)
}

fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// KiCad, EasyEDA and generic CAM naming conventions.
fn classify_by_pattern(lower: &str) -> Option<(Option<Side>, LayerKind)> {
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    // KiCad
    if has(&["f_cu", "f.cu", "front_cu"]) {
        return Some((Some(Side::Top), LayerKind::Copper));
    }
    if has(&["b_cu", "b.cu", "back_cu"]) {
        return Some((Some(Side::Bottom), LayerKind::Copper));
    }
    if is_kicad_inner(lower) {
        return Some((Some(Side::Inner), LayerKind::Copper));
    }
    if has(&["f_silks", "f.silks", "front_silk"]) {
        return Some((Some(Side::Top), LayerKind::Silkscreen));
    }
    if has(&["b_silks", "b.silks", "back_silk"]) {
        return Some((Some(Side::Bottom), LayerKind::Silkscreen));
    }
    if has(&["f_mask", "f.mask", "front_mask"]) {
        return Some((Some(Side::Top), LayerKind::SolderMask));
    }
    if has(&["b_mask", "b.mask", "back_mask"]) {
        return Some((Some(Side::Bottom), LayerKind::SolderMask));
    }
    if has(&["edge_cuts", "edge.cuts", "boardoutline"]) {
        return Some((None, LayerKind::Outline));
    }

    // EasyEDA; the soldermask/silk checks must come before the bare layer names
    if lower.contains("topsoldermask") {
        return Some((Some(Side::Top), LayerKind::SolderMask));
    }
    if lower.contains("bottomsoldermask") {
        return Some((Some(Side::Bottom), LayerKind::SolderMask));
    }
    if lower.contains("topsilk") {
        return Some((Some(Side::Top), LayerKind::Silkscreen));
    }
    if lower.contains("bottomsilk") {
        return Some((Some(Side::Bottom), LayerKind::Silkscreen));
    }
    if lower.contains("toplayer") {
        return Some((Some(Side::Top), LayerKind::Copper));
    }
    if lower.contains("bottomlayer") {
        return Some((Some(Side::Bottom), LayerKind::Copper));
    }

    // Generic
    if has(&["keepout", "keep_out", "keep-out"]) {
        return Some((None, LayerKind::KeepOut));
    }
    let side = if has(&["top", "front"]) {
        Some(Side::Top)
    } else if has(&["bottom", "back"]) {
        Some(Side::Bottom)
    } else {
        None
    };
    if lower.contains("copper") && side.is_some() {
        return Some((side, LayerKind::Copper));
    }
    if has(&["silkscreen", "silk"]) && side.is_some() {
        return Some((side, LayerKind::Silkscreen));
    }
    if (lower.contains("soldermask") || (lower.contains("solder") && lower.contains("mask")))
        && side.is_some()
    {
        return Some((side, LayerKind::SolderMask));
    }
    if has(&["outline", "profile"]) {
        return Some((None, LayerKind::Outline));
    }
    if lower.contains("drill") {
        return Some((None, LayerKind::Drill));
    }
    None
}

/// KiCad inner copper: `In1_Cu`, `In2.Cu`, ...
fn is_kicad_inner(lower: &str) -> bool {
    ["_cu", ".cu"].iter().any(|sep| {
        lower.find(sep).is_some_and(|pos| {
            let before = &lower[..pos];
            before
                .rfind("in")
                .is_some_and(|in_pos| before[in_pos + 2..].parse::<u32>().is_ok())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RoleTag; 12] = [
        RoleTag::TopCopper,
        RoleTag::BottomCopper,
        RoleTag::InnerCopper,
        RoleTag::TopSolderMask,
        RoleTag::BottomSolderMask,
        RoleTag::TopSilkscreen,
        RoleTag::BottomSilkscreen,
        RoleTag::KeepOut,
        RoleTag::Drill,
        RoleTag::Outline,
        RoleTag::GenericGerber,
        RoleTag::Unknown,
    ];

    #[test]
    fn test_suffix_table() {
        assert_eq!(classify("board.gtl"), RoleTag::TopCopper);
        assert_eq!(classify("board.gbl"), RoleTag::BottomCopper);
        assert_eq!(classify("board.gts"), RoleTag::TopSolderMask);
        assert_eq!(classify("board.gbs"), RoleTag::BottomSolderMask);
        assert_eq!(classify("board.gto"), RoleTag::TopSilkscreen);
        assert_eq!(classify("board.gbo"), RoleTag::BottomSilkscreen);
        assert_eq!(classify("board.gko"), RoleTag::Outline);
        assert_eq!(classify("board.drl"), RoleTag::Drill);
        assert_eq!(classify("board.txt"), RoleTag::Drill);
        assert_eq!(classify("board.gbr"), RoleTag::GenericGerber);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("BOARD.GTL"), RoleTag::TopCopper);
        assert_eq!(classify("Board.Gbs"), RoleTag::BottomSolderMask);
        assert_eq!(classify("NC.DRL"), RoleTag::Drill);
    }

    #[test]
    fn test_unknown_is_not_an_error() {
        assert_eq!(classify("notes.pdf"), RoleTag::Unknown);
        assert_eq!(classify("README"), RoleTag::Unknown);
    }

    #[test]
    fn test_strips_directory_path() {
        assert_eq!(classify("gerbers/board.GTL"), RoleTag::TopCopper);
        assert_eq!(classify("out\\cam\\board.GBO"), RoleTag::BottomSilkscreen);
        // A dot in a directory name must not be mistaken for a suffix
        assert_eq!(classify("v1.gtl/readme"), RoleTag::Unknown);
    }

    #[test]
    fn test_kicad_names_beat_generic_suffix() {
        assert_eq!(classify("board-F_Cu.gbr"), RoleTag::TopCopper);
        assert_eq!(classify("board-B_Mask.gbr"), RoleTag::BottomSolderMask);
        assert_eq!(classify("board-Edge_Cuts.gbr"), RoleTag::Outline);
        assert_eq!(classify("board-In2_Cu.gbr"), RoleTag::InnerCopper);
        assert_eq!(classify("board-F_SilkS.gbr"), RoleTag::TopSilkscreen);
    }

    #[test]
    fn test_easyeda_and_generic_names() {
        assert_eq!(classify("Gerber_TopLayer.ger"), RoleTag::TopCopper);
        assert_eq!(classify("Gerber_BottomSolderMaskLayer.ger"), RoleTag::BottomSolderMask);
        assert_eq!(classify("copper_bottom.gbr"), RoleTag::BottomCopper);
        assert_eq!(classify("keepout.gbr"), RoleTag::KeepOut);
        assert_eq!(classify("profile.gbr"), RoleTag::Outline);
        assert_eq!(classify("through-drill.nc"), RoleTag::Drill);
    }

    #[test]
    fn test_eagle_and_inner_suffixes() {
        assert_eq!(classify("board.cmp"), RoleTag::TopCopper);
        assert_eq!(classify("board.sol"), RoleTag::BottomCopper);
        assert_eq!(classify("board.G2"), RoleTag::InnerCopper);
        assert_eq!(classify("board.GM1"), RoleTag::Outline);
    }

    #[test]
    fn test_compose_rule() {
        assert_eq!(compose(Some(Side::Top), LayerKind::Copper), RoleTag::TopCopper);
        assert_eq!(compose(Some(Side::Bottom), LayerKind::Drill), RoleTag::Drill);
        assert_eq!(compose(Some(Side::Top), LayerKind::Outline), RoleTag::Outline);
        assert_eq!(compose(None, LayerKind::Silkscreen), RoleTag::GenericGerber);
        assert_eq!(compose(Some(Side::Inner), LayerKind::SolderMask), RoleTag::GenericGerber);
    }

    #[test]
    fn test_label_is_side_then_type() {
        let sided = [
            (Side::Top, LayerKind::Copper, "Top Copper"),
            (Side::Bottom, LayerKind::Copper, "Bottom Copper"),
            (Side::Inner, LayerKind::Copper, "Inner Copper"),
            (Side::Top, LayerKind::SolderMask, "Top Solder Mask"),
            (Side::Bottom, LayerKind::SolderMask, "Bottom Solder Mask"),
            (Side::Top, LayerKind::Silkscreen, "Top Silkscreen"),
            (Side::Bottom, LayerKind::Silkscreen, "Bottom Silkscreen"),
        ];
        for (side, kind, label) in sided {
            assert_eq!(compose(Some(side), kind).label(), label);
        }
        assert_eq!(compose(None, LayerKind::KeepOut).label(), "Keep Out");
        assert_eq!(compose(None, LayerKind::Gerber).label(), "Gerber");
        assert_eq!(RoleTag::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_inner_suffix_range() {
        assert_eq!(classify("board.g1"), RoleTag::InnerCopper);
        assert_eq!(classify("board.G8"), RoleTag::InnerCopper);
        assert_eq!(classify("board.g9"), RoleTag::Unknown);
        assert_eq!(classify("board.g0"), RoleTag::Unknown);
    }

    #[test]
    fn test_is_copper() {
        let copper: Vec<_> = ALL.into_iter().filter(|r| r.is_copper()).collect();
        assert_eq!(
            copper,
            vec![RoleTag::TopCopper, RoleTag::BottomCopper, RoleTag::InnerCopper]
        );
    }

    #[test]
    fn test_gold_fingers() {
        assert!(has_gold_fingers("board-GoldFinger.gbr"));
        assert!(has_gold_fingers("pcb_gold_finger_top.gtl"));
        assert!(has_gold_fingers("GOLDFINGERS.GBS"));
        assert!(!has_gold_fingers("board.gtl"));
        assert!(!has_gold_fingers("gold.gbr"));
    }

    #[test]
    fn test_x2_file_function() {
        use crate::parsers::gerber::commands::FileFunction;
        assert_eq!(
            role_from_file_function(&FileFunction::Copper { side: Side::Bottom }),
            Some(RoleTag::BottomCopper)
        );
        assert_eq!(
            role_from_file_function(&FileFunction::Profile),
            Some(RoleTag::Outline)
        );
        assert_eq!(
            role_from_file_function(&FileFunction::Legend { side: Side::Top }),
            Some(RoleTag::TopSilkscreen)
        );
        assert_eq!(role_from_file_function(&FileFunction::Other), None);
    }

    #[test]
    fn test_role_serializes_as_label() {
        let json = serde_json::to_string(&vec![RoleTag::TopCopper, RoleTag::Drill]).unwrap();
        assert_eq!(json, r#"["Top Copper","Drill"]"#);
    }
}
