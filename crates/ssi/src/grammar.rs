/*
 * grammar.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive grammar: recognition and classification.
//!
//! All directives ride inside HTML comments of the form `<!--# ... -->`.
//! Attribute values are quoted with `'` or `"`; since backreferences are not
//! available, quote pairing is expressed as a per-attribute alternation, with
//! one capture group per quote style. Paths, names, and values must not span
//! line breaks.
//!
//! Matching is positionless: every scan takes the text and an offset and
//! returns an absolute byte span, so concurrent scans never interfere.

use regex::Regex;
use std::sync::LazyLock;

/// Matches any directive-shaped comment: `<!--#` then anything up to the
/// nearest `-->` on the same line.
///
/// This is the outer scan; the specific patterns below classify the span it
/// finds. A span that matches none of them is opaque and gets consumed
/// without output.
static SYNTAX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Pattern breakdown:
    // <!--#       - Directive opener
    // ([^\r\n]+?) - Directive body, non-greedy, no line breaks
    // -->         - Comment close
    Regex::new(r"<!--#([^\r\n]+?)-->").expect("Invalid regex pattern for directive syntax")
});

/// Matches an include directive: `<!--#include file="..."-->` or
/// `<!--#include virtual="..."-->`.
///
/// The path may not contain whitespace. Extra attributes between the path
/// and the closing `-->` (e.g. `wait="yes"`) are tolerated and ignored.
static INCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Pattern breakdown:
    // <!--#\s*include\s+ - Opener and keyword
    // (file|virtual)=    - Inclusion mode (capture 1)
    // "([^\s"]+?)"       - Double-quoted path (capture 2)
    //  |'([^\s']+?)'     -   or single-quoted path (capture 3)
    // \s*[^\r\n]*?-->    - Ignored trailing attributes, comment close
    Regex::new(r#"<!--#\s*include\s+(file|virtual)=(?:"([^\s"]+?)"|'([^\s']+?)')\s*[^\r\n]*?-->"#)
        .expect("Invalid regex pattern for include directive")
});

/// Matches a set directive: `<!--#set var="k" value="v"-->`.
///
/// The value may be empty; the name may not.
static SET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Captures: name (1|2), value (3|4)
    Regex::new(
        r#"<!--#\s*set\s+var=(?:"([^\r\n"]+?)"|'([^\r\n']+?)')\s+value=(?:"([^\r\n"]*?)"|'([^\r\n']*?)')\s*-->"#,
    )
    .expect("Invalid regex pattern for set directive")
});

/// Matches an echo directive: `<!--#echo var="k"-->`, optionally with a
/// non-empty fallback: `<!--#echo var="k" default="d"-->`.
///
/// An empty `default=""` fails this pattern, so such a directive is opaque
/// and renders as nothing at all.
static ECHO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Captures: name (1|2), default (3|4)
    Regex::new(
        r#"<!--#\s*echo\s+var=(?:"([^\r\n"]+?)"|'([^\r\n']+?)')(?:\s+default=(?:"([^\r\n"]+?)"|'([^\r\n']+?)'))?\s*-->"#,
    )
    .expect("Invalid regex pattern for echo directive")
});

/// Matches an if directive: `<!--#if expr="..."-->`.
static IF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!--#\s*if\s+expr=(?:"([^\r\n"]+?)"|'([^\r\n']+?)')\s*-->"#)
        .expect("Invalid regex pattern for if directive")
});

/// Matches an elif directive: `<!--#elif expr="..."-->`.
static ELIF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!--#\s*elif\s+expr=(?:"([^\r\n"]+?)"|'([^\r\n']+?)')\s*-->"#)
        .expect("Invalid regex pattern for elif directive")
});

/// Matches an else directive: `<!--#else-->`.
static ELSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--#\s*else\s*-->").expect("Invalid regex pattern for else directive")
});

/// Matches an endif directive: `<!--#endif-->`.
static ENDIF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--#\s*endif\s*-->").expect("Invalid regex pattern for endif directive")
});

/// How an include path is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeMode {
    /// `file=`: resolved against the configured base directory.
    File,
    /// `virtual=`: relative paths resolve against the including document's
    /// directory when one is known; absolute paths against the base.
    Virtual,
}

/// An include directive found in a document, with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeMatch {
    /// Byte offset of `<!--#`.
    pub start: usize,
    /// Byte offset just past `-->`.
    pub end: usize,
    /// Inclusion mode.
    pub mode: IncludeMode,
    /// The quoted path, verbatim.
    pub path: String,
}

/// A classified directive found in a document, with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveMatch {
    /// Byte offset of `<!--#`.
    pub start: usize,
    /// Byte offset just past `-->`.
    pub end: usize,
    /// The classified directive.
    pub directive: Directive,
}

/// A directive as the compiler sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// `set var="k" value="v"`
    SetVar { name: String, value: String },

    /// `echo var="k" [default="d"]`
    Echo { name: String, default: Option<String> },

    /// `if expr="..."`
    If { expr: String },

    /// `elif expr="..."`
    Elif { expr: String },

    /// `else`
    Else,

    /// `endif`
    EndIf,

    /// A directive-shaped span matching no specific form. Includes unknown
    /// keywords, sub-grammar mismatches, and any include directive that
    /// survived resolution. Consumed without output.
    Opaque,
}

/// Find the first include directive in `text`.
///
/// The resolver always rescans from the start after splicing, so no offset
/// parameter is needed here.
pub fn find_include(text: &str) -> Option<IncludeMatch> {
    let caps = INCLUDE_PATTERN.captures(text)?;
    let whole = caps.get(0)?;
    let mode = if &caps[1] == "virtual" {
        IncludeMode::Virtual
    } else {
        IncludeMode::File
    };

    Some(IncludeMatch {
        start: whole.start(),
        end: whole.end(),
        mode,
        path: quoted_capture(&caps, 2, 3),
    })
}

/// Find and classify the next directive at or after byte offset `from`.
pub fn find_directive(text: &str, from: usize) -> Option<DirectiveMatch> {
    let m = SYNTAX_PATTERN.find_at(text, from)?;

    Some(DirectiveMatch {
        start: m.start(),
        end: m.end(),
        directive: classify(m.as_str()),
    })
}

/// Classify a directive-shaped span, trying each specific form in priority
/// order. Names and expressions are trimmed; values and defaults are kept
/// verbatim.
fn classify(segment: &str) -> Directive {
    if let Some(caps) = SET_PATTERN.captures(segment) {
        return Directive::SetVar {
            name: quoted_capture(&caps, 1, 2).trim().to_string(),
            value: quoted_capture(&caps, 3, 4),
        };
    }

    if let Some(caps) = ECHO_PATTERN.captures(segment) {
        let default = caps
            .get(3)
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string());
        return Directive::Echo {
            name: quoted_capture(&caps, 1, 2).trim().to_string(),
            default,
        };
    }

    if let Some(caps) = IF_PATTERN.captures(segment) {
        return Directive::If {
            expr: quoted_capture(&caps, 1, 2).trim().to_string(),
        };
    }

    if let Some(caps) = ELIF_PATTERN.captures(segment) {
        return Directive::Elif {
            expr: quoted_capture(&caps, 1, 2).trim().to_string(),
        };
    }

    if ELSE_PATTERN.is_match(segment) {
        return Directive::Else;
    }

    if ENDIF_PATTERN.is_match(segment) {
        return Directive::EndIf;
    }

    Directive::Opaque
}

/// Extract whichever of the two quote-alternation groups participated.
fn quoted_capture(caps: &regex::Captures<'_>, double: usize, single: usize) -> String {
    match caps.get(double).or_else(|| caps.get(single)) {
        Some(m) => m.as_str().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === find_include tests ===

    #[test]
    fn test_include_file_mode() {
        let text = r#"before <!--#include file="header.html"--> after"#;
        let m = find_include(text).unwrap();
        assert_eq!(m.mode, IncludeMode::File);
        assert_eq!(m.path, "header.html");
        assert_eq!(&text[m.start..m.end], r#"<!--#include file="header.html"-->"#);
    }

    #[test]
    fn test_include_virtual_mode() {
        let m = find_include(r#"<!--#include virtual='/nav/menu.html'-->"#).unwrap();
        assert_eq!(m.mode, IncludeMode::Virtual);
        assert_eq!(m.path, "/nav/menu.html");
    }

    #[test]
    fn test_include_extra_attributes_ignored() {
        let m = find_include(r#"<!--#include virtual="head.html" wait="yes"-->"#).unwrap();
        assert_eq!(m.mode, IncludeMode::Virtual);
        assert_eq!(m.path, "head.html");
    }

    #[test]
    fn test_include_whitespace_variants() {
        let m = find_include("<!--# include   file='a.html' -->").unwrap();
        assert_eq!(m.path, "a.html");
    }

    #[test]
    fn test_include_path_may_not_contain_spaces() {
        assert_eq!(find_include(r#"<!--#include file="a b.html"-->"#), None);
    }

    #[test]
    fn test_include_first_match_wins() {
        let text = r#"<!--#include file="a.html"--> <!--#include file="b.html"-->"#;
        let m = find_include(text).unwrap();
        assert_eq!(m.path, "a.html");
        assert_eq!(m.start, 0);
    }

    #[test]
    fn test_include_quote_mismatch_rejected() {
        assert_eq!(find_include(r#"<!--#include file="a.html'-->"#), None);
    }

    // === find_directive classification tests ===

    fn classify_one(text: &str) -> Directive {
        find_directive(text, 0).unwrap().directive
    }

    #[test]
    fn test_classify_set() {
        assert_eq!(
            classify_one(r#"<!--#set var="k" value="v"-->"#),
            Directive::SetVar {
                name: "k".to_string(),
                value: "v".to_string()
            }
        );
    }

    #[test]
    fn test_classify_set_empty_value() {
        assert_eq!(
            classify_one(r#"<!--#set var="k" value=""-->"#),
            Directive::SetVar {
                name: "k".to_string(),
                value: String::new()
            }
        );
    }

    #[test]
    fn test_classify_set_mixed_quotes() {
        assert_eq!(
            classify_one(r#"<!--#set var='k' value="has 'quotes'"-->"#),
            Directive::SetVar {
                name: "k".to_string(),
                value: "has 'quotes'".to_string()
            }
        );
    }

    #[test]
    fn test_classify_echo() {
        assert_eq!(
            classify_one(r#"<!--#echo var="title"-->"#),
            Directive::Echo {
                name: "title".to_string(),
                default: None
            }
        );
    }

    #[test]
    fn test_classify_echo_with_default() {
        assert_eq!(
            classify_one(r#"<!--#echo var="title" default="untitled"-->"#),
            Directive::Echo {
                name: "title".to_string(),
                default: Some("untitled".to_string())
            }
        );
    }

    #[test]
    fn test_classify_echo_empty_default_is_opaque() {
        // The legacy grammar requires a non-empty default; the whole
        // directive fails classification and is consumed silently.
        assert_eq!(
            classify_one(r#"<!--#echo var="title" default=""-->"#),
            Directive::Opaque
        );
    }

    #[test]
    fn test_classify_if_elif_else_endif() {
        assert_eq!(
            classify_one(r#"<!--#if expr="x == y"-->"#),
            Directive::If {
                expr: "x == y".to_string()
            }
        );
        assert_eq!(
            classify_one(r#"<!--#elif expr=" other "-->"#),
            Directive::Elif {
                expr: "other".to_string()
            }
        );
        assert_eq!(classify_one("<!--#else-->"), Directive::Else);
        assert_eq!(classify_one("<!--# endif -->"), Directive::EndIf);
    }

    #[test]
    fn test_classify_unknown_keyword_is_opaque() {
        assert_eq!(classify_one("<!--#flush timing='yes'-->"), Directive::Opaque);
    }

    #[test]
    fn test_classify_include_is_opaque() {
        // Includes are the resolver's business; by compile time they are
        // just opaque spans.
        assert_eq!(
            classify_one(r#"<!--#include file="a.html"-->"#),
            Directive::Opaque
        );
    }

    #[test]
    fn test_directive_must_not_span_lines() {
        assert_eq!(find_directive("<!--#set var=\"k\"\nvalue=\"v\"-->", 0), None);
    }

    #[test]
    fn test_find_directive_from_offset() {
        let text = r#"<!--#else--> tail <!--#endif-->"#;
        let first = find_directive(text, 0).unwrap();
        assert_eq!(first.directive, Directive::Else);

        let second = find_directive(text, first.end).unwrap();
        assert_eq!(second.directive, Directive::EndIf);
        assert_eq!(&text[second.start..second.end], "<!--#endif-->");
    }

    #[test]
    fn test_plain_comment_is_not_a_directive() {
        assert_eq!(find_directive("<!-- not a directive -->", 0), None);
    }
}
