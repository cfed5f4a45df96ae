//! Rendering for checkpub check reports.
//!
//! This crate converts one resolved test result into either a structured
//! annotation or an escaped markdown block, and builds the summary title
//! line. The choice between annotation and text block follows commit
//! membership and the format policy: an annotation anchored to a file
//! outside the commit renders as a broken link in the review UI, so those
//! results are written into the report body instead.

use checkpub_domain::{FileInfo, Format};
use checkpub_types::{Annotation, CheckLevel, RepoCoords, Severity, TestFileResult};

/// Separator inserted between markdown blocks after the first.
pub const TEXT_BLOCK_SEPARATOR: &str = "\n---\n\n";

// ============================================================================
// Escaping
// ============================================================================

/// Escape `<`, `>`, and `&` for the markdown body.
///
/// Nothing else is transformed. Structured annotation fields are
/// transported as JSON and never escaped.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    append_escaped(&mut escaped, text);
    escaped
}

fn append_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
}

// ============================================================================
// Emoji and Labels
// ============================================================================

/// Emoji shortcode for a severity, or `None` when suppressed.
pub fn level_emoji(level: Severity, format: &Format) -> Option<&'static str> {
    if format.no_emoji {
        return None;
    }
    match level {
        Severity::Failure => Some(":x:"),
        Severity::Error => Some(":warning:"),
        Severity::Notice => Some(":heavy_check_mark:"),
    }
}

/// Human-readable severity label for the text body.
pub fn level_label(level: Severity) -> &'static str {
    match level {
        Severity::Notice => "Notice",
        Severity::Failure => "Failure",
        Severity::Error => "Error",
    }
}

/// Permalink to a line of a file at the commit snapshot.
pub fn permalink(coords: &RepoCoords, path: &str, line: u32) -> String {
    format!(
        "https://github.com/{}/{}/blob/{}/{}#L{}",
        coords.owner, coords.repo, coords.commit_sha, path, line
    )
}

// ============================================================================
// Per-Result Rendering
// ============================================================================

/// Outcome of rendering one resolved test result.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Nothing is emitted for this result.
    Skip,
    /// An inline annotation; exclusive, no text block is produced.
    Annotation(Annotation),
    /// A markdown block for the report body.
    TextBlock(String),
}

/// Render one test result against its resolved file.
///
/// Decision order:
/// 1. notice suppressed by `nopass`: skip
/// 2. annotation allowed and (in commit or `alwaysannotate`): annotation
/// 3. text suppressed by `nodetails`, or notice without `passdetails`: skip
/// 4. otherwise: markdown block
pub fn render_result(
    result: &TestFileResult,
    file: &FileInfo,
    format: &Format,
    coords: &RepoCoords,
) -> Rendered {
    if result.level == Severity::Notice && format.no_pass {
        return Rendered::Skip;
    }

    if !format.no_annotate && (file.in_commit || format.always_annotate) {
        return Rendered::Annotation(Annotation {
            path: file.path.clone(),
            start_line: result.start_line,
            end_line: result.end_line,
            level: CheckLevel::from_severity(result.level),
            title: result.test_name.clone(),
            message: result.message.clone(),
            details: result.details.clone(),
        });
    }

    if format.no_details || (result.level == Severity::Notice && !format.pass_details) {
        return Rendered::Skip;
    }

    Rendered::TextBlock(text_block(result, file, format, coords))
}

fn text_block(
    result: &TestFileResult,
    file: &FileInfo,
    format: &Format,
    coords: &RepoCoords,
) -> String {
    let mut block = String::new();

    if let Some(emoji) = level_emoji(result.level, format) {
        block.push_str(emoji);
        block.push_str("&nbsp;&nbsp;");
    }
    block.push_str(level_label(result.level));
    block.push_str(": ");
    append_escaped(&mut block, &result.test_name);
    block.push_str(": ");
    append_escaped(&mut block, &result.message);
    block.push(' ');
    block.push_str(&permalink(coords, &file.path, result.start_line));
    block.push('\n');

    if result.has_details() {
        let details = result.details.as_deref().unwrap_or_default();
        block.push_str("<details><summary>Raw output</summary>\n");
        block.push('\n');
        block.push_str("```\n");
        append_escaped(&mut block, details);
        if !details.ends_with('\n') {
            block.push('\n');
        }
        block.push_str("```\n");
        block.push_str("</details>\n");
    }

    block
}

// ============================================================================
// Title
// ============================================================================

/// Build the summary count line.
///
/// Tests and failures are always shown; errors and skipped only when
/// nonzero. Example: `478 tests, 11 failures, 1 error, 34 skipped`.
pub fn build_title(tests: u32, failures: u32, errors: u32, skipped: u32) -> String {
    let mut title = String::new();
    append_number(&mut title, None, tests, "test", Some('s'), true);
    append_number(&mut title, Some(", "), failures, "failure", Some('s'), true);
    append_number(&mut title, Some(", "), errors, "error", Some('s'), false);
    append_number(&mut title, Some(", "), skipped, "skipped", None, false);
    title
}

fn append_number(
    out: &mut String,
    prefix: Option<&str>,
    num: u32,
    label: &str,
    plural_suffix: Option<char>,
    show_always: bool,
) {
    if !show_always && num == 0 {
        return;
    }
    if let Some(prefix) = prefix {
        out.push_str(prefix);
    }
    out.push_str(&num.to_string());
    out.push(' ');
    out.push_str(label);
    if num != 1 {
        if let Some(suffix) = plural_suffix {
            out.push(suffix);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
