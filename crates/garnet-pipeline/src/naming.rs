//! Deterministic artifact naming.
//!
//! Every intermediate file a stage writes is named from its inputs alone, so a
//! rerun computes the same paths and can find the artifacts of an earlier run.
//! Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

pub const GENE_MAPPING_FILE: &str = "events_to_genes.xls";
const WINDOW_DIR_INFIX: &str = "eventsWithin";

/// A single path rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTransform<'a> {
    /// Replace a trailing `from` with `to`; append `to` when the path does not
    /// end with `from`.
    ReplaceExtension { from: &'a str, to: &'a str },
    /// Append a suffix to the full path.
    AppendSuffix(&'a str),
}

impl NameTransform<'_> {
    pub fn apply(&self, path: &Path) -> PathBuf {
        let name = path.to_string_lossy();
        match *self {
            NameTransform::ReplaceExtension { from, to } => match name.strip_suffix(from) {
                Some(stem) => PathBuf::from(format!("{stem}{to}")),
                None => PathBuf::from(format!("{name}{to}")),
            },
            NameTransform::AppendSuffix(suffix) => PathBuf::from(format!("{name}{suffix}")),
        }
    }
}

/// Apply `transforms` left to right.
pub fn derive(path: &Path, transforms: &[NameTransform<'_>]) -> PathBuf {
    transforms
        .iter()
        .fold(path.to_path_buf(), |acc, t| t.apply(&acc))
}

const MAPPING_TO_SEQUENCES: NameTransform<'static> = NameTransform::ReplaceExtension {
    from: ".xls",
    to: ".fsa",
};
const MAPPING_TO_MOTIFS: NameTransform<'static> = NameTransform::ReplaceExtension {
    from: ".xls",
    to: "_with_motifs.txt",
};
const FASTA_TO_MOTIFS: NameTransform<'static> = NameTransform::ReplaceExtension {
    from: ".fasta",
    to: "_with_motifs.txt",
};
const MOTIFS_TO_TABLE: NameTransform<'static> = NameTransform::ReplaceExtension {
    from: ".txt",
    to: ".tgm",
};
const TABLE_TO_MATRIX: NameTransform<'static> = NameTransform::ReplaceExtension {
    from: ".tgm",
    to: ".pkl",
};
const MATRIX_TO_REGRESSION: NameTransform<'static> = NameTransform::ReplaceExtension {
    from: ".pkl",
    to: "regression_results.xls",
};
const LIBRARY_TO_TF_IDS: NameTransform<'static> = NameTransform::ReplaceExtension {
    from: ".tamo",
    to: "_tfids.txt",
};
const LIBRARY_TO_SOURCE_NAMES: NameTransform<'static> = NameTransform::ReplaceExtension {
    from: ".tamo",
    to: "_source_names.txt",
};

/// Output directory used when none is given: the region file's stem plus the
/// window size, e.g. `peaks.bed` at 2000 bp → `peakseventsWithin2000`.
pub fn default_output_dir(regions: &Path, window_size: u32) -> PathBuf {
    let stem = regions.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{stem}{WINDOW_DIR_INFIX}{window_size}"))
}

pub fn gene_mapping_output(output_dir: &Path) -> PathBuf {
    output_dir.join(GENE_MAPPING_FILE)
}

/// Sequences of the mapped regions, written by the mapper beside its table.
pub fn region_sequences(gene_mapping: &Path) -> PathBuf {
    MAPPING_TO_SEQUENCES.apply(gene_mapping)
}

/// Motif scores are named after the gene mapping when there is one, otherwise
/// after the FASTA input.
pub fn motif_scan_output(gene_mapping: Option<&Path>, sequences: &Path) -> PathBuf {
    match gene_mapping {
        Some(mapping) => MAPPING_TO_MOTIFS.apply(mapping),
        None => FASTA_TO_MOTIFS.apply(sequences),
    }
}

pub fn binding_table(motif_scores: &Path) -> PathBuf {
    MOTIFS_TO_TABLE.apply(motif_scores)
}

/// Serialized binding matrix; its presence marks the matrix stage as done.
pub fn binding_matrix(motif_scores: &Path) -> PathBuf {
    derive(motif_scores, &[MOTIFS_TO_TABLE, TABLE_TO_MATRIX])
}

pub fn tf_id_list(motif_library: &Path) -> PathBuf {
    LIBRARY_TO_TF_IDS.apply(motif_library)
}

/// Optional list of source motif names kept next to the library.
pub fn source_names_list(motif_library: &Path) -> PathBuf {
    let file_name = motif_library
        .file_name()
        .map(|n| LIBRARY_TO_SOURCE_NAMES.apply(Path::new(n)))
        .unwrap_or_default();
    match motif_library.parent() {
        Some(dir) => dir.join(file_name),
        None => file_name,
    }
}

pub fn regression_output(binding_matrix: &Path) -> PathBuf {
    MATRIX_TO_REGRESSION.apply(binding_matrix)
}
