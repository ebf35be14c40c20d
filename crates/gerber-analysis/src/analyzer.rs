use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::PackageError;
use crate::layers::{self, RoleTag};
use crate::parsers::{self, ContentFormat};
use crate::types::{BoardAnalysisResult, FileAnalysis, RawFile};
use crate::{archive, merge, AnalyzeOptions};

/// Merged board result plus the per-file records it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub board: BoardAnalysisResult,
    pub files: Vec<FileAnalysis>,
}

/// Analyze an uploaded package and return the merged board result.
pub fn analyze(
    data: &[u8],
    filename: &str,
    opts: &AnalyzeOptions,
) -> Result<BoardAnalysisResult, PackageError> {
    analyze_package(data, filename, opts).map(|report| report.board)
}

/// Analyze an uploaded package, keeping the per-file records.
pub fn analyze_package(
    data: &[u8],
    filename: &str,
    opts: &AnalyzeOptions,
) -> Result<PackageReport, PackageError> {
    let raw = archive::extract(data, filename, opts)?;
    let files = analyze_files(&raw, opts);
    let board = merge::merge(&files);
    info!(
        "{filename}: {} file(s), {} copper layer(s), {} error(s), {} warning(s)",
        files.len(),
        board.layer_roles.len(),
        board.errors.len(),
        board.warnings.len()
    );
    Ok(PackageReport { board, files })
}

/// Parse every file independently. Output order matches input order whether
/// or not the work runs in parallel.
pub fn analyze_files(raw: &[RawFile], opts: &AnalyzeOptions) -> Vec<FileAnalysis> {
    if opts.parallel {
        raw.par_iter().map(analyze_file).collect()
    } else {
        raw.iter().map(analyze_file).collect()
    }
}

/// Classify and parse a single file.
pub fn analyze_file(file: &RawFile) -> FileAnalysis {
    let name_role = layers::classify(&file.name);
    let mut analysis = parsers::parse(&file.content);

    let role = refine_role(name_role, &analysis);
    if role != name_role {
        debug!("{}: role {name_role} refined to {role} from content", file.name);
    }
    if name_role == RoleTag::Drill && role != RoleTag::Drill {
        analysis
            .warnings
            .push("named like a drill file but has no drill data".to_string());
    }
    if role == RoleTag::Unknown && analysis.format.is_some() {
        analysis
            .warnings
            .push("unrecognized file name, role unknown".to_string());
    }

    analysis.role = Some(role);
    analysis.is_board_outline = role == RoleTag::Outline;
    analysis.has_gold_fingers = layers::has_gold_fingers(&file.name);

    if let Some(warning) = &file.warning {
        // Decoding warnings already name the file
        analysis.warnings.clear();
        analysis.warnings.push(warning.clone());
    } else {
        prefix_messages(&file.name, &mut analysis);
    }
    analysis.name = file.name.clone();
    analysis
}

/// The content's own declaration beats the file name. Excellon content turns
/// an unplaced file into a drill file, and a drill-named file without it
/// (a `README.txt`, a Gerber drill map) stops counting as one.
fn refine_role(name_role: RoleTag, analysis: &FileAnalysis) -> RoleTag {
    if let Some(role) = analysis.content_role {
        return role;
    }
    match (name_role, analysis.format) {
        (RoleTag::Unknown | RoleTag::GenericGerber, Some(ContentFormat::Excellon)) => {
            RoleTag::Drill
        }
        (RoleTag::Drill, Some(ContentFormat::Gerber)) => RoleTag::GenericGerber,
        (RoleTag::Drill, None) => RoleTag::Unknown,
        _ => name_role,
    }
}

fn prefix_messages(name: &str, analysis: &mut FileAnalysis) {
    for msg in analysis.errors.iter_mut().chain(analysis.warnings.iter_mut()) {
        *msg = format!("{name}: {msg}");
    }
}

/// Runs analyses where only the most recent request matters.
///
/// Starting a new analysis invalidates any still in flight; those return
/// `PackageError::Superseded` instead of a result.
#[derive(Debug, Default)]
pub struct Analyzer {
    opts: AnalyzeOptions,
    generation: AtomicU64,
}

impl Analyzer {
    pub fn new(opts: AnalyzeOptions) -> Self {
        Self {
            opts,
            generation: AtomicU64::new(0),
        }
    }

    pub fn analyze(
        &self,
        data: &[u8],
        filename: &str,
    ) -> Result<BoardAnalysisResult, PackageError> {
        let ticket = self.begin();
        let raw = archive::extract(data, filename, &self.opts)?;
        self.check(ticket)?;
        let files = analyze_files(&raw, &self.opts);
        self.check(ticket)?;
        Ok(merge::merge(&files))
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn check(&self, ticket: u64) -> Result<(), PackageError> {
        if self.generation.load(Ordering::SeqCst) == ticket {
            Ok(())
        } else {
            debug!("analysis #{ticket} superseded");
            Err(PackageError::Superseded)
        }
    }
}
