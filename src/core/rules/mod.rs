//! Math delimiter rules: detection gate, inline wrapping, and block widening.
//!
//! Everything here is pure string work over markup. The rules are heuristics,
//! not a LaTeX parser: parenthesized spans are matched without nesting, so
//! inputs like `(a + (b - c) = d)` are left alone or only partly wrapped.

#[cfg(test)]
mod tests;

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::dom::{Document, NodeId, ParseError, is_raw_text, is_void};

/// Tags whose text is never rewritten (output of the upstream highlighter).
pub const DEFAULT_SKIP_TAGS: &[&str] = &["code", "pre", "script", "style", "kbd", "samp"];

/// Cheap pre-check: a bracketed span with an operator, or an align environment.
static DETECTION_GATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[(\[][^)\]]*[=+\-*/\\][^)\]]*[)\]]|\\begin\{align\*?\}")
        .expect("detection gate regex is valid")
});

/// Rule A candidate: a parenthesized span whose only inner parentheses are
/// function-call argument lists, e.g. `(F(n) = F(n-1) + F(n-2))`.
static RULE_FUNCTION_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(((?:[^()]|[A-Za-z]\([^()]*\))*)\)").expect("function call regex is valid")
});

static FUNCTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]\([^()]*\)").expect("call regex is valid"));

/// Rule B: a flat parenthesized span containing `=`.
static RULE_EQUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*=[^()]*)\)").expect("equation regex is valid"));

/// Rule C: a flat parenthesized span containing a LaTeX command such as `\geq`,
/// `\leq` or `\approx`.
static RULE_SYMBOLIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([^()]*\\[A-Za-z]+[^()]*)\)").expect("symbolic regex is valid")
});

/// `[ ... \begin{cases} ... \end{cases} ... ]`, tags and whitespace allowed around the environment.
/// No `]` may appear before the closing bracket, so a block never reaches into the next one.
static CASES_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[((?:\s|<[^<>\[\]]*>)*\\begin\{cases\}[^\]]*?\\end\{cases\}(?:\s|<[^<>\[\]]*>)*)\]",
    )
    .expect("cases regex is valid")
});

/// `[ \begin{align} ... \end{align} ]`, also `align*`.
static ALIGN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[((?:\s|<[^<>\[\]]*>)*\\begin\{align\*?\}[^\]]*?\\end\{align\*?\})\s*\]")
        .expect("align regex is valid")
});

/// A start or end tag in serialized markup; comments are matched so their contents are ignored.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--[\s\S]*?-->|<(/?)([A-Za-z][A-Za-z0-9-]*)[^>]*>").expect("tag regex is valid")
});

/// Options for [`rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Elements whose descendant text is left untouched.
    pub skip_tags: Vec<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            skip_tags: DEFAULT_SKIP_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// True if `markup` plausibly contains math worth rewriting.
pub fn looks_like_math(markup: &str) -> bool {
    DETECTION_GATE.is_match(markup)
}

/// Rewrite the pseudo-math in a single text node.
///
/// Rules are tried in priority order (function-call equation, equation,
/// symbolic expression); the first one that changes the text wins. Spans only a
/// later rule would match are left as they are, so `(x = 1) and (a \geq b)`
/// comes back as `\(x = 1\) and (a \geq b)`. Returns `None` when no rule applies.
pub fn rewrite_text(text: &str) -> Option<String> {
    wrap_inline(&RULE_FUNCTION_CALL, text, |inner| {
        inner.contains('=') && FUNCTION_CALL.is_match(inner)
    })
    .or_else(|| wrap_inline(&RULE_EQUATION, text, |_| true))
    .or_else(|| wrap_inline(&RULE_SYMBOLIC, text, |_| true))
}

/// Wrap each accepted match of `re` (group 1 is the interior) in `\(`/`\)`.
fn wrap_inline(re: &Regex, text: &str, accept: impl Fn(&str) -> bool) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    let mut changed = false;
    for caps in re.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // `\(` is already a delimiter
        if text[..whole.start()].ends_with('\\') || !accept(inner.as_str()) {
            continue;
        }
        out.push_str(&text[last..whole.start()]);
        out.push_str("\\(");
        out.push_str(inner.as_str());
        out.push_str("\\)");
        last = whole.end();
        changed = true;
    }
    if !changed {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// Widen bracketed `cases` and `align` environments to block delimiters.
///
/// `[ \begin{cases} .. \end{cases} ]` becomes `\[ .. \]`; `[ \begin{align} .. \end{align} ]`
/// becomes `$$[ .. ]$$`. Interiors are kept verbatim. Blocks that touch an element
/// named in `skip_tags` are left alone.
pub fn widen_environments(markup: &str, skip_tags: &[String]) -> String {
    let cases = widen(&CASES_BLOCK, markup, skip_tags, "\\", "\\[", "\\]");
    widen(&ALIGN_BLOCK, &cases, skip_tags, "$$", "$$[", "]$$")
}

fn widen(
    re: &Regex,
    markup: &str,
    skip_tags: &[String],
    done_marker: &str,
    open: &str,
    close: &str,
) -> String {
    let skipped = skipped_ranges(markup, skip_tags);
    let mut out = String::with_capacity(markup.len() + 8);
    let mut last = 0;
    for caps in re.captures_iter(markup) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if markup[..whole.start()].ends_with(done_marker)
            || skipped
                .iter()
                .any(|r| r.start < whole.end() && whole.start() < r.end)
        {
            continue;
        }
        out.push_str(&markup[last..whole.start()]);
        out.push_str(open);
        out.push_str(inner.as_str());
        out.push_str(close);
        last = whole.end();
    }
    out.push_str(&markup[last..]);
    out
}

/// Byte ranges of `markup` covered by outermost elements named in `skip_tags`,
/// from the start tag through the matching end tag (or the end of input).
fn skipped_ranges(markup: &str, skip_tags: &[String]) -> Vec<Range<usize>> {
    let is_skipped = |name: &str| skip_tags.iter().any(|t| t.eq_ignore_ascii_case(name));
    let mut ranges = Vec::new();
    // (tag, start, depth) of the open skipped element
    let mut open: Option<(String, usize, usize)> = None;
    let mut pos = 0;
    while let Some(caps) = TAG.captures_at(markup, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        pos = whole.end();
        let Some(name) = caps.get(2) else {
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.is_empty());

        if let Some((tag, start, depth)) = open.as_mut() {
            if *tag == name {
                if !closing {
                    *depth += 1;
                } else if *depth == 1 {
                    ranges.push(*start..whole.end());
                    open = None;
                } else {
                    *depth -= 1;
                }
            }
            continue;
        }
        if closing {
            continue;
        }
        if is_raw_text(&name) {
            // raw text runs to its own end tag; anything tag-like inside is text
            let end_tag = format!("</{}", name);
            let end = markup[pos..]
                .to_ascii_lowercase()
                .find(&end_tag)
                .map(|i| pos + i)
                .unwrap_or(markup.len());
            let end = markup[end..].find('>').map_or(markup.len(), |i| end + i + 1);
            if is_skipped(&name) {
                ranges.push(whole.start()..end);
            }
            pos = end;
            continue;
        }
        if is_skipped(&name) && !is_void(&name) {
            open = Some((name, whole.start(), 1));
        }
    }
    if let Some((_, start, _)) = open {
        ranges.push(start..markup.len());
    }
    ranges
}

fn inside_skipped(doc: &Document, node: NodeId, skip_tags: &[String]) -> bool {
    let mut cur = doc.parent(node);
    while let Some(id) = cur {
        if let Some(tag) = doc.tag(id)
            && skip_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
        {
            return true;
        }
        cur = doc.parent(id);
    }
    false
}

/// Rewrite pseudo-math in `markup` and return the new markup.
///
/// Works on a detached parse: text nodes are rewritten first (replacements are
/// collected during the walk and applied after it), then block environments
/// are widened over the serialized result, outside skipped elements. Tags and
/// attributes are preserved.
pub fn rewrite(markup: &str, options: &RewriteOptions) -> Result<String, ParseError> {
    let mut scratch = Document::new();
    let fragment = scratch.parse_detached(markup)?;

    let mut replacements: Vec<(NodeId, String)> = Vec::new();
    for node in scratch.text_nodes(fragment) {
        if inside_skipped(&scratch, node, &options.skip_tags) {
            continue;
        }
        if let Some(text) = scratch.text(node)
            && let Some(new_text) = rewrite_text(text)
        {
            replacements.push((node, new_text));
        }
    }
    let rewritten = replacements.len();
    for (node, text) in replacements {
        scratch.set_text(node, text);
    }
    if rewritten > 0 {
        log::trace!("rewrote {} text node(s)", rewritten);
    }

    Ok(widen_environments(
        &scratch.inner_html(fragment),
        &options.skip_tags,
    ))
}
