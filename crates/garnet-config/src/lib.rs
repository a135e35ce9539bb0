//! Configuration parsing and resolution for GARNET runs.
//!
//! Parses the INI-style run configuration (`[chromatinData]`, `[motifData]`,
//! `[expressionData]`) into an [`IniDocument`], then resolves it into a typed
//! [`PipelineConfig`] with defaults applied.
//!
//! # Example
//! ```
//! let cfg = garnet_config::PipelineConfig::parse(
//!     "[chromatinData]\nbedfile=peaks.bed\n[motifData]\ndoNetwork=False\n",
//! )
//! .unwrap();
//! assert_eq!(cfg.chromatin.window_size, 2000);
//! assert!(!cfg.motif.build_network);
//! ```

pub mod ast;
mod ini;
pub mod resolver;

pub use ast::*;
pub use ini::parse;
pub use resolver::{
    ChromatinConfig, ConfigResolver, ExpressionConfig, MappingInputs, MotifConfig, PipelineConfig,
    Threshold, ThresholdKind, DEFAULT_THRESHOLD, DEFAULT_THREAD_COUNT, DEFAULT_WINDOW_SIZE,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sections_and_entries() {
        let input = "[chromatinData]\nbedfile=peaks.bed\n\n[motifData]\ngenome = hg19\n";
        let doc = parse(input).unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.get("chromatinData", "bedfile"), Some("peaks.bed"));
        assert_eq!(doc.get("motifData", "genome"), Some("hg19"));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let doc = parse("[motifData]\ndoNetwork=True\n").unwrap();
        assert_eq!(doc.get("motifData", "donetwork"), Some("True"));
        assert_eq!(doc.get("motifData", "DONETWORK"), Some("True"));
    }

    #[test]
    fn section_names_are_case_sensitive() {
        let doc = parse("[motifData]\ngenome=hg19\n").unwrap();
        assert_eq!(doc.get("motifdata", "genome"), None);
    }

    #[test]
    fn colon_separator_and_comments() {
        let input = "# run config\n; another comment\n[expressionData]\npvalThresh: 0.01\n";
        let doc = parse(input).unwrap();
        assert_eq!(doc.get("expressionData", "pvalThresh"), Some("0.01"));
    }

    #[test]
    fn blank_value_is_kept_but_not_non_blank() {
        let doc = parse("[expressionData]\nqvalThresh=\n").unwrap();
        assert_eq!(doc.get("expressionData", "qvalThresh"), Some(""));
        assert_eq!(doc.get_non_blank("expressionData", "qvalThresh"), None);
    }

    #[test]
    fn repeated_section_merges_and_last_key_wins() {
        let doc = parse("[a]\nx=1\n[b]\ny=2\n[a]\nx=3\nz=4\n").unwrap();
        assert_eq!(doc.get("a", "x"), Some("3"));
        assert_eq!(doc.get("a", "z"), Some("4"));
        assert_eq!(doc.get("b", "y"), Some("2"));
    }

    #[test]
    fn entry_before_section_is_an_error() {
        let err = parse("bedfile=peaks.bed\n[chromatinData]\n").unwrap_err();
        match err {
            garnet_types::GarnetError::ParseError { line, .. } => assert_eq!(line, 1),
            other => panic!("Expected ParseError, got: {other:?}"),
        }
    }

    #[test]
    fn line_without_separator_reports_location() {
        let err = parse("[chromatinData]\nbedfile=a.bed\nwindowsize\n").unwrap_err();
        match err {
            garnet_types::GarnetError::ParseError {
                line,
                source_snippet,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(source_snippet.as_deref(), Some("windowsize"));
            }
            other => panic!("Expected ParseError, got: {other:?}"),
        }
    }

    #[test]
    fn last_line_without_newline() {
        let doc = parse("[a]\nk=v").unwrap();
        assert_eq!(doc.get("a", "k"), Some("v"));
    }
}
