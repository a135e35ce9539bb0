//! Turns a parsed [`IniDocument`] into a typed [`PipelineConfig`].
//!
//! Blank values are treated as absent. Optional values fall back to the
//! defaults below; malformed numbers are rejected with a
//! [`GarnetError::Configuration`] naming the offending section and key.

use std::fmt;
use std::path::{Path, PathBuf};

use garnet_types::{GarnetError, Result};

use crate::ast::IniDocument;

pub const CHROMATIN_SECTION: &str = "chromatinData";
pub const MOTIF_SECTION: &str = "motifData";
pub const EXPRESSION_SECTION: &str = "expressionData";

pub const DEFAULT_WINDOW_SIZE: u32 = 2000;
pub const DEFAULT_THREAD_COUNT: u32 = 1;
pub const DEFAULT_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub chromatin: ChromatinConfig,
    pub motif: MotifConfig,
    pub expression: ExpressionConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChromatinConfig {
    pub bed_path: Option<PathBuf>,
    pub fasta_path: Option<PathBuf>,
    pub gene_annotation_path: Option<PathBuf>,
    pub xref_path: Option<PathBuf>,
    pub window_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotifConfig {
    pub motif_library_path: Option<PathBuf>,
    pub genome_id: Option<String>,
    pub thread_count: u32,
    pub build_network: bool,
    pub tf_delimiter: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionConfig {
    pub expression_path: Option<PathBuf>,
    pub p_value_threshold: Option<f64>,
    pub q_value_threshold: Option<f64>,
}

/// The inputs the gene-region mapping stage cannot run without.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingInputs<'a> {
    pub gene_annotation: &'a Path,
    pub xref: &'a Path,
    pub regions: &'a Path,
    pub window_size: u32,
}

impl ChromatinConfig {
    /// Check the hard precondition of the whole pipeline: annotation,
    /// cross-reference and region files must all be configured.
    pub fn mapping_inputs(&self) -> Result<MappingInputs<'_>> {
        let missing: Vec<&str> = [
            ("genefile", self.gene_annotation_path.is_none()),
            ("xreffile", self.xref_path.is_none()),
            ("bedfile", self.bed_path.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();

        match (&self.gene_annotation_path, &self.xref_path, &self.bed_path) {
            (Some(gene_annotation), Some(xref), Some(regions)) => Ok(MappingInputs {
                gene_annotation,
                xref,
                regions,
                window_size: self.window_size,
            }),
            _ => Err(GarnetError::Configuration(format!(
                "missing {} in [{}], cannot map genes to regions",
                missing.join(", "),
                CHROMATIN_SECTION
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Threshold policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    PValue,
    QValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub value: f64,
    pub kind: ThresholdKind,
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl ExpressionConfig {
    /// p-value wins when present, then q-value, then the 0.05 p-value default.
    pub fn threshold(&self) -> Threshold {
        match (self.p_value_threshold, self.q_value_threshold) {
            (Some(value), _) => Threshold {
                value,
                kind: ThresholdKind::PValue,
            },
            (None, Some(value)) => Threshold {
                value,
                kind: ThresholdKind::QValue,
            },
            (None, None) => Threshold {
                value: DEFAULT_THRESHOLD,
                kind: ThresholdKind::PValue,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigResolver
// ---------------------------------------------------------------------------

pub struct ConfigResolver;

impl ConfigResolver {
    pub fn resolve(doc: &IniDocument) -> Result<PipelineConfig> {
        let path = |section: &str, key: &str| doc.get_non_blank(section, key).map(PathBuf::from);

        let chromatin = ChromatinConfig {
            bed_path: path(CHROMATIN_SECTION, "bedfile"),
            fasta_path: path(CHROMATIN_SECTION, "fastafile"),
            gene_annotation_path: path(CHROMATIN_SECTION, "genefile"),
            xref_path: path(CHROMATIN_SECTION, "xreffile"),
            window_size: positive_int(doc, CHROMATIN_SECTION, "windowsize")?
                .unwrap_or(DEFAULT_WINDOW_SIZE),
        };

        let motif = MotifConfig {
            motif_library_path: path(MOTIF_SECTION, "tamo_file"),
            genome_id: doc
                .get_non_blank(MOTIF_SECTION, "genome")
                .map(String::from),
            thread_count: positive_int(doc, MOTIF_SECTION, "numthreads")?
                .unwrap_or(DEFAULT_THREAD_COUNT),
            build_network: is_truthy(doc.get(MOTIF_SECTION, "doNetwork")),
            tf_delimiter: doc
                .get(MOTIF_SECTION, "tfDelimiter")
                .unwrap_or_default()
                .to_string(),
        };

        let expression = ExpressionConfig {
            expression_path: path(EXPRESSION_SECTION, "expressionFile"),
            p_value_threshold: probability(doc, EXPRESSION_SECTION, "pvalThresh")?,
            q_value_threshold: probability(doc, EXPRESSION_SECTION, "qvalThresh")?,
        };

        tracing::debug!(
            window_size = chromatin.window_size,
            thread_count = motif.thread_count,
            build_network = motif.build_network,
            "Resolved configuration"
        );

        Ok(PipelineConfig {
            chromatin,
            motif,
            expression,
        })
    }
}

impl PipelineConfig {
    /// Parse and resolve configuration text.
    pub fn parse(source: &str) -> Result<Self> {
        let doc = crate::ini::parse(source)?;
        ConfigResolver::resolve(&doc)
    }

    /// Read, parse and resolve a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            GarnetError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&source)
    }
}

/// The network flag is on for any non-empty value other than `False`.
fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "False")
}

fn positive_int(doc: &IniDocument, section: &str, key: &str) -> Result<Option<u32>> {
    let Some(raw) = doc.get_non_blank(section, key) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(v) if v > 0 => Ok(Some(v)),
        _ => Err(GarnetError::Configuration(format!(
            "[{section}] {key} must be a positive integer, got '{raw}'"
        ))),
    }
}

fn probability(doc: &IniDocument, section: &str, key: &str) -> Result<Option<f64>> {
    let Some(raw) = doc.get_non_blank(section, key) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(v) if v > 0.0 && v <= 1.0 => Ok(Some(v)),
        _ => Err(GarnetError::Configuration(format!(
            "[{section}] {key} must be a number in (0, 1], got '{raw}'"
        ))),
    }
}
