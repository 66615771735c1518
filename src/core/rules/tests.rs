//! Rule tests: gate, inline rules, block widening, and the full markup rewrite.

use super::{RewriteOptions, looks_like_math, rewrite, rewrite_text, widen_environments};

fn rw(markup: &str) -> String {
    rewrite(markup, &RewriteOptions::default()).unwrap()
}

#[test]
fn gate_accepts_bracketed_operators() {
    assert!(looks_like_math("so (x = y+1) holds"));
    assert!(looks_like_math("<p>[a * b]</p>"));
    assert!(looks_like_math(r"(a \geq b)"));
    assert!(looks_like_math("(n - 1)"));
}

#[test]
fn gate_accepts_align_environment() {
    assert!(looks_like_math(r"\begin{align} a&=b \end{align}"));
    assert!(looks_like_math(r"\begin{align*} a \end{align*}"));
}

#[test]
fn gate_rejects_plain_prose() {
    assert!(!looks_like_math("<p>Hello (world), how are you? [citation needed]</p>"));
    assert!(!looks_like_math("x = y outside any brackets"));
    assert!(!looks_like_math(""));
}

#[test]
fn function_call_equation_wins_over_simple_equation() {
    assert_eq!(
        rewrite_text("(F(n) = F(n-1) + F(n-2))").as_deref(),
        Some(r"\(F(n) = F(n-1) + F(n-2)\)")
    );
}

#[test]
fn simple_equation() {
    assert_eq!(
        rewrite_text("(x = y + 1)").as_deref(),
        Some(r"\(x = y + 1\)")
    );
}

#[test]
fn symbolic_expression() {
    assert_eq!(rewrite_text(r"(a \geq b)").as_deref(), Some(r"\(a \geq b\)"));
    assert_eq!(
        rewrite_text(r"so (x \approx 3.14) roughly").as_deref(),
        Some(r"so \(x \approx 3.14\) roughly")
    );
}

#[test]
fn no_rule_applies() {
    assert_eq!(rewrite_text("(just words)"), None);
    assert_eq!(rewrite_text("f(x) + g(y)"), None);
    assert_eq!(rewrite_text("x = y"), None);
}

#[test]
fn every_match_of_the_winning_rule_is_wrapped() {
    assert_eq!(
        rewrite_text("first (a = 1), then (b = 2).").as_deref(),
        Some(r"first \(a = 1\), then \(b = 2\).")
    );
}

#[test]
fn first_rule_claims_the_node() {
    // Rule A fires, so the plain equation in the same node stays as is.
    assert_eq!(
        rewrite_text("(f(x) = 2) and (y = 3)").as_deref(),
        Some(r"\(f(x) = 2\) and (y = 3)")
    );
    assert_eq!(
        rewrite_text(r"(x = 1) and (a \geq b)").as_deref(),
        Some(r"\(x = 1\) and (a \geq b)")
    );
}

#[test]
fn existing_delimiters_are_not_rewrapped() {
    assert_eq!(rewrite_text(r"\(x = y\)"), None);
    assert_eq!(rewrite_text(r"\(F(n) = 1\)"), None);
    assert_eq!(rewrite_text(r"\(a \leq b\)"), None);
}

#[test]
fn nested_parentheses_stay_fragile() {
    // Only the flat inner group is a candidate, and it has no operator rule match.
    assert_eq!(rewrite_text("(a + (b - c) = d)"), None);
}

#[test]
fn cases_environment_becomes_display_math() {
    let out = widen_environments(r"[ \begin{cases} x & x>0 \\ -x & x<=0 \end{cases} ]", &[]);
    assert_eq!(out, r"\[ \begin{cases} x & x>0 \\ -x & x<=0 \end{cases} \]");
}

#[test]
fn align_environment_becomes_double_dollar() {
    let out = widen_environments(r"[ \begin{align} a&=b \end{align} ]", &[]);
    assert_eq!(out, r"$$[ \begin{align} a&=b \end{align}]$$");
    let out = widen_environments(r"[\begin{align*} x \end{align*}]", &[]);
    assert_eq!(out, r"$$[\begin{align*} x \end{align*}]$$");
}

#[test]
fn widening_is_idempotent() {
    for input in [
        r"[ \begin{cases} 1 \end{cases} ]",
        r"[ \begin{align} a&=b \end{align} ]",
    ] {
        let once = widen_environments(input, &[]);
        assert_eq!(widen_environments(&once, &[]), once);
    }
}

#[test]
fn environments_without_brackets_are_untouched() {
    let s = r"\begin{cases} 1 \end{cases} and \begin{align} a \end{align}";
    assert_eq!(widen_environments(s, &[]), s);
}

#[test]
fn rewrite_keeps_tags_and_attributes() {
    let out = rw(r#"<p class="x=(1+2)">Since <em>(x = y + 1)</em>, we get (a \geq b).</p>"#);
    assert_eq!(
        out,
        r#"<p class="x=(1+2)">Since <em>\(x = y + 1\)</em>, we get \(a \geq b\).</p>"#
    );
}

#[test]
fn rewrite_cases_markup_escapes_interior() {
    let out = rw(r"<p>[ \begin{cases} x & x>0 \\ -x & x<=0 \end{cases} ]</p>");
    assert_eq!(
        out,
        r"<p>\[ \begin{cases} x &amp; x&gt;0 \\ -x &amp; x&lt;=0 \end{cases} \]</p>"
    );
}

#[test]
fn rewrite_cases_across_line_breaks() {
    let out = rw(r"<p>[<br>\begin{cases} 1 \\ 0 \end{cases}<br>]</p>");
    assert_eq!(out, r"<p>\[<br>\begin{cases} 1 \\ 0 \end{cases}<br>\]</p>");
}

#[test]
fn rewrite_align_markup() {
    let out = rw(r"<p>[ \begin{align} a&=b \end{align} ]</p>");
    assert_eq!(out, r"<p>$$[ \begin{align} a&amp;=b \end{align}]$$</p>");
}

#[test]
fn rewrite_skips_code() {
    let html = "<p>(x = 1)</p><pre><code>let y = (x = 1);</code></pre>";
    assert_eq!(
        rw(html),
        r"<p>\(x = 1\)</p><pre><code>let y = (x = 1);</code></pre>"
    );
    let no_skip = RewriteOptions { skip_tags: vec![] };
    assert_eq!(
        rewrite(html, &no_skip).unwrap(),
        r"<p>\(x = 1\)</p><pre><code>let y = \(x = 1\);</code></pre>"
    );
}

#[test]
fn rewrite_skips_environments_in_code() {
    let html = r"<p>(x = 1)</p><pre><code>[ \begin{cases} 1 \end{cases} ]</code></pre>";
    assert_eq!(
        rw(html),
        r"<p>\(x = 1\)</p><pre><code>[ \begin{cases} 1 \end{cases} ]</code></pre>"
    );
    let html = r"<pre>[ \begin{align} b \end{align} ]</pre><p>[ \begin{align} c \end{align} ]</p>";
    assert_eq!(
        rw(html),
        r"<pre>[ \begin{align} b \end{align} ]</pre><p>$$[ \begin{align} c \end{align}]$$</p>"
    );
    let no_skip = RewriteOptions { skip_tags: vec![] };
    assert_eq!(
        rewrite(r"<code>[ \begin{cases} 1 \end{cases} ]</code>", &no_skip).unwrap(),
        r"<code>\[ \begin{cases} 1 \end{cases} \]</code>"
    );
}

#[test]
fn skipped_element_ends_at_its_own_end_tag() {
    let skip = vec!["pre".to_string()];
    let out = widen_environments(
        r"<pre><pre>x</pre>[ \begin{cases} 1 \end{cases} ]</pre>[ \begin{cases} 2 \end{cases} ]",
        &skip,
    );
    assert_eq!(
        out,
        r"<pre><pre>x</pre>[ \begin{cases} 1 \end{cases} ]</pre>\[ \begin{cases} 2 \end{cases} \]"
    );
}

#[test]
fn sibling_blocks_are_widened_separately() {
    let html = r"<p>[ \begin{cases} a \end{cases} see ]</p><p>and [ \begin{cases} b \end{cases} ]</p>";
    assert_eq!(
        rw(html),
        r"<p>[ \begin{cases} a \end{cases} see ]</p><p>and \[ \begin{cases} b \end{cases} \]</p>"
    );
    let html = r"<p>[ \begin{cases} a \end{cases} ]</p><p>[ \begin{cases} b \end{cases} ]</p>";
    assert_eq!(
        rw(html),
        r"<p>\[ \begin{cases} a \end{cases} \]</p><p>\[ \begin{cases} b \end{cases} \]</p>"
    );
    let html = r"<p>[ \begin{align} a \end{align} x ]</p><p>[ \begin{align} b \end{align} ]</p>";
    assert_eq!(
        rw(html),
        r"<p>[ \begin{align} a \end{align} x ]</p><p>$$[ \begin{align} b \end{align}]$$</p>"
    );
}

#[test]
fn rewrite_is_idempotent() {
    let inputs = [
        "<p>(F(n) = F(n-1) + F(n-2))</p>",
        "<p>(x = y + 1) and <b>(a \\geq b)</b></p>",
        r"<div>[ \begin{cases} 1 \end{cases} ]</div>",
        r"<div>[ \begin{align} a&=b \end{align} ]</div>",
        "<p>nothing here</p>",
    ];
    for input in inputs {
        let once = rw(input);
        assert_eq!(rw(&once), once, "input: {}", input);
    }
}

#[test]
fn rewrite_reports_malformed_markup() {
    assert!(rewrite("<p>[(x = 1]</span>)</p>", &RewriteOptions::default()).is_err());
}
