use winnow::ascii::line_ending;
use winnow::combinator::{alt, cut_err, eof, peek};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::token::{one_of, take_till, take_while};
use winnow::{ModalResult, Parser};

use garnet_types::{GarnetError, Result};

use crate::ast::{IniDocument, IniSection};

fn make_cut_error(desc: &'static str) -> ErrMode<ContextError<StrContext>> {
    let mut e = ContextError::new();
    e.push(StrContext::Expected(StrContextValue::Description(desc)));
    ErrMode::Cut(e)
}

/// One logical line of the file.
#[derive(Debug, Clone, PartialEq)]
enum Line<'i> {
    Blank,
    Section(&'i str),
    Entry(&'i str, &'i str),
}

/// Spaces and tabs, never newlines.
fn inline_ws<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(0.., |c: char| c == ' ' || c == '\t').parse_next(input)
}

fn rest_of_line<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_till(0.., |c: char| c == '\n' || c == '\r').parse_next(input)
}

/// Full-line comment starting with `#` or `;`.
fn comment<'i>(input: &mut &'i str) -> ModalResult<Line<'i>> {
    (one_of(|c: char| c == '#' || c == ';'), rest_of_line)
        .value(Line::Blank)
        .parse_next(input)
}

/// Parse '[' name ']'.
fn section_header<'i>(input: &mut &'i str) -> ModalResult<Line<'i>> {
    let _ = '['.parse_next(input)?;
    let name = cut_err(take_till(1.., |c: char| matches!(c, ']' | '\n' | '\r')))
        .context(StrContext::Expected(StrContextValue::Description(
            "section name",
        )))
        .parse_next(input)?;
    let _ = cut_err(']')
        .context(StrContext::Expected(StrContextValue::CharLiteral(']')))
        .parse_next(input)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(make_cut_error("non-empty section name"));
    }
    Ok(Line::Section(name))
}

/// Parse key ( '=' | ':' ) value. The value runs to the end of the line and may
/// itself contain '=' or ':'.
fn entry<'i>(input: &mut &'i str) -> ModalResult<Line<'i>> {
    let key = take_till(1.., |c: char| matches!(c, '=' | ':' | '\n' | '\r')).parse_next(input)?;
    let _ = cut_err(one_of(|c: char| c == '=' || c == ':'))
        .context(StrContext::Expected(StrContextValue::Description(
            "'=' or ':' after key",
        )))
        .parse_next(input)?;
    let value = rest_of_line.parse_next(input)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(make_cut_error("non-empty key"));
    }
    Ok(Line::Entry(key, value.trim()))
}

/// Parse a single line including its terminator.
fn line<'i>(input: &mut &'i str) -> ModalResult<Line<'i>> {
    let _ = inline_ws.parse_next(input)?;
    let parsed = alt((
        comment,
        section_header,
        peek(alt((line_ending, eof))).value(Line::Blank),
        entry,
    ))
    .parse_next(input)?;
    let _ = inline_ws.parse_next(input)?;
    let _ = alt((line_ending, eof))
        .context(StrContext::Expected(StrContextValue::Description(
            "end of line",
        )))
        .parse_next(input)?;
    Ok(parsed)
}

/// Public entry point.
pub fn parse(input: &str) -> Result<IniDocument> {
    let mut remaining = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut doc = IniDocument::default();
    let mut current: Option<String> = None;
    let mut line_no = 0usize;

    while !remaining.is_empty() {
        line_no += 1;
        let before = remaining;
        let snippet = || -> Option<String> {
            let text: String = before.lines().next().unwrap_or("").chars().take(40).collect();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        };

        match line.parse_next(&mut remaining) {
            Ok(Line::Blank) => {}
            Ok(Line::Section(name)) => {
                doc.sections
                    .entry(name.to_string())
                    .or_insert_with(|| IniSection {
                        name: name.to_string(),
                        ..Default::default()
                    });
                current = Some(name.to_string());
            }
            Ok(Line::Entry(key, value)) => {
                let section = current
                    .as_ref()
                    .and_then(|name| doc.sections.get_mut(name))
                    .ok_or_else(|| GarnetError::ParseError {
                        line: line_no,
                        col: 1,
                        message: format!("entry '{key}' appears before any [section] header"),
                        source_snippet: snippet(),
                    })?;
                section
                    .entries
                    .insert(key.to_ascii_lowercase(), value.to_string());
            }
            Err(e) => {
                let col = before.len().saturating_sub(remaining.len()) + 1;
                return Err(GarnetError::ParseError {
                    line: line_no,
                    col,
                    message: format!("{}", e),
                    source_snippet: snippet(),
                });
            }
        }
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_recognised() {
        let mut input = "\nrest";
        assert_eq!(line.parse_next(&mut input).unwrap(), Line::Blank);
        assert_eq!(input, "rest");
    }

    #[test]
    fn entry_value_may_contain_separators() {
        let mut input = "genefile = C:/data/genes.txt\n";
        assert_eq!(
            line.parse_next(&mut input).unwrap(),
            Line::Entry("genefile", "C:/data/genes.txt")
        );
    }

    #[test]
    fn section_header_missing_bracket_is_cut() {
        let mut input = "[chromatinData\n";
        assert!(matches!(line.parse_next(&mut input), Err(ErrMode::Cut(_))));
    }

    #[test]
    fn crlf_line_endings() {
        let doc = parse("[a]\r\nkey=value\r\n").unwrap();
        assert_eq!(doc.get("a", "key"), Some("value"));
    }

    #[test]
    fn leading_bom_is_ignored() {
        let doc = parse("\u{feff}[a]\nk=v").unwrap();
        assert_eq!(doc.get("a", "k"), Some("v"));
    }
}
