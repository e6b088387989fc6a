//! Fitting a rendered body into the embed description limit.
//!
//! Long forum posts are mostly long because of what they quote. When a body
//! is over budget, quoted blocks are shortened first: their trailing
//! paragraphs are replaced by an [`ELLIPSIS`] marker, block by block in
//! document order, until enough characters are gone. Only if that is not
//! enough is the body cut at the limit.
//!
//! Lengths are counted in characters, which is what Discord counts.

use tracing::debug;

use super::markdown::quote_lines;

/// Discord's limit for an embed description.
pub const DESCRIPTION_LIMIT: usize = 2048;

/// Marker left where quoted paragraphs were removed.
pub const ELLIPSIS: &str = "[...]";

/// Appended to a body cut by the hard truncation.
const TRUNCATION_MARK: &str = "...";

/// Shorten `markdown` to at most `ceiling` characters.
///
/// Bodies already within budget are returned unchanged. Otherwise quoted
/// blocks are ellipsised; if the body is still too long it is cut to
/// `ceiling - 4` characters followed by `...`.
pub fn fit(markdown: &str, ceiling: usize) -> String {
    let length = char_len(markdown);
    if length <= ceiling {
        return markdown.to_string();
    }

    let ellipsised = ellipsise_quotes(markdown, length - ceiling);
    if char_len(&ellipsised) <= ceiling {
        return ellipsised;
    }

    truncate(&ellipsised, ceiling)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn truncate(text: &str, limit: usize) -> String {
    if limit <= TRUNCATION_MARK.len() {
        return text.chars().take(limit).collect();
    }
    // One character short of `limit`: `limit - 4` kept plus the mark.
    let keep = limit.saturating_sub(TRUNCATION_MARK.len() + 1);
    let end = text.char_indices().nth(keep).map_or(text.len(), |(i, _)| i);
    format!("{}{TRUNCATION_MARK}", &text[..end])
}

/// A top-level run of `>` lines, split into paragraphs with one quote level
/// removed.
struct QuoteBlock<'a> {
    original: Vec<&'a str>,
    paragraphs: Vec<Vec<String>>,
    touched: bool,
}

impl<'a> QuoteBlock<'a> {
    fn new(lines: Vec<&'a str>) -> Self {
        let mut paragraphs: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for &line in &lines {
            let inner = line
                .strip_prefix("> ")
                .or_else(|| line.strip_prefix('>'))
                .unwrap_or(line);
            if inner.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
            } else {
                current.push(inner.to_string());
            }
        }
        if !current.is_empty() {
            paragraphs.push(current);
        }

        Self {
            original: lines,
            paragraphs,
            touched: false,
        }
    }

    fn render(&self) -> String {
        if !self.touched {
            return self.original.join("\n");
        }
        let body = self
            .paragraphs
            .iter()
            .map(|p| p.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        quote_lines(&body)
    }

    fn ends_with_ellipsis(&self) -> bool {
        self.paragraphs
            .last()
            .is_some_and(|p| p.len() == 1 && p[0] == ELLIPSIS)
    }

    /// Drop a trailing marker left by a previous step, then turn the last
    /// paragraph into the marker.
    fn ellipsise_last(&mut self) {
        if self.ends_with_ellipsis() {
            self.paragraphs.pop();
        }
        if let Some(last) = self.paragraphs.last_mut() {
            *last = vec![ELLIPSIS.to_string()];
        } else {
            self.paragraphs.push(vec![ELLIPSIS.to_string()]);
        }
        self.touched = true;
    }
}

enum Segment<'a> {
    Plain(Vec<&'a str>),
    Quote(QuoteBlock<'a>),
}

impl Segment<'_> {
    fn render(&self) -> String {
        match self {
            Segment::Plain(lines) => lines.join("\n"),
            Segment::Quote(block) => block.render(),
        }
    }
}

fn segments(markdown: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut quoting = false;

    for line in markdown.split('\n') {
        let is_quote = line.starts_with('>');
        if is_quote != quoting && !lines.is_empty() {
            let run = std::mem::take(&mut lines);
            out.push(if quoting {
                Segment::Quote(QuoteBlock::new(run))
            } else {
                Segment::Plain(run)
            });
        }
        quoting = is_quote;
        lines.push(line);
    }
    if !lines.is_empty() {
        out.push(if quoting {
            Segment::Quote(QuoteBlock::new(lines))
        } else {
            Segment::Plain(lines)
        });
    }
    out
}

/// Replace trailing quoted paragraphs with [`ELLIPSIS`] until at least
/// `overflow` characters are gone or no block has more than two paragraphs.
fn ellipsise_quotes(markdown: &str, overflow: usize) -> String {
    let overflow = overflow as isize;
    let mut segments = segments(markdown);
    let mut stripped: isize = 0;

    for segment in &mut segments {
        if stripped >= overflow {
            break;
        }
        let Segment::Quote(block) = segment else {
            continue;
        };
        while stripped < overflow && block.paragraphs.len() > 2 {
            let before = char_len(&block.render()) as isize;
            block.ellipsise_last();
            stripped += before - char_len(&block.render()) as isize;
        }
    }

    if stripped > 0 {
        debug!("{stripped} characters stripped from blockquotes");
    }

    segments
        .iter()
        .map(Segment::render)
        .collect::<Vec<_>>()
        .join("\n")
}
