//! HTML to Markdown conversion.
//!
//! Covers the markup forum posts actually use: paragraphs, breaks, emphasis,
//! links, images, lists, quotes, headings and code. Unknown tags render
//! their children. List items always use `-` as the bullet.
//!
//! The raw conversion leaves long runs of blank lines wherever the source
//! nested empty paragraphs or breaks; [`collapse_blank_lines`] squeezes them.

use super::html::{Element, Fragment, Node};

pub const BULLET: &str = "-";

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    /// Inside `<code>`: nothing escaped.
    code: bool,
    /// Inside `<li>`: nested lists attach without a blank line.
    list_item: bool,
}

/// Render a fragment to Markdown with blank-line runs collapsed.
pub fn render(fragment: &Fragment) -> String {
    let raw = render_nodes(&fragment.nodes, Context::default());
    let trimmed: Vec<&str> = raw.trim().lines().map(str::trim_end).collect();
    collapse_blank_lines(&trimmed.join("\n"))
}

/// Squeeze blank-line runs until nothing changes.
///
/// * two or more blank lines become one empty line;
/// * three or more consecutive quote lines holding only `>` markers keep
///   the first and last of the run.
///
/// Runs below those thresholds are left byte for byte.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = collapse_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn collapse_once(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let blank = is_blank(lines[i]);
        let quote_blank = !blank && is_quote_blank(lines[i]);
        if !blank && !quote_blank {
            out.push(lines[i]);
            i += 1;
            continue;
        }

        let run_end = (i..lines.len())
            .find(|&j| {
                if blank {
                    !is_blank(lines[j])
                } else {
                    !is_quote_blank(lines[j])
                }
            })
            .unwrap_or(lines.len());
        let run = &lines[i..run_end];

        if blank && run.len() >= 2 {
            out.push("");
        } else if quote_blank && run.len() >= 3 {
            out.push(run[0]);
            out.push(run[run.len() - 1]);
        } else {
            out.extend_from_slice(run);
        }
        i = run_end;
    }

    out.join("\n")
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_quote_blank(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('>') && line.chars().all(|c| c == '>' || c.is_whitespace())
}

/// Prefix every line with one quote level. Empty lines get a bare `>`.
pub fn quote_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_nodes(nodes: &[Node], ctx: Context) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => {
                let mut text = collapse_whitespace(text);
                if out.ends_with('\n') {
                    text = text.trim_start().to_string();
                }
                if ctx.code {
                    out.push_str(&text);
                } else {
                    out.push_str(&escape(&text));
                }
            }
            Node::Element(el) => out.push_str(&render_element(el, ctx)),
        }
    }
    out
}

fn render_element(el: &Element, ctx: Context) -> String {
    let inner = || render_nodes(&el.children, ctx);

    match el.name.as_str() {
        "script" | "style" | "head" | "title" => String::new(),
        "br" => "\n".to_string(),
        "p" => block(&inner()),
        "blockquote" => {
            let content = inner();
            let content = content.trim();
            if content.is_empty() {
                String::new()
            } else {
                format!("\n\n{}\n\n", quote_lines(&collapse_blank_lines(content)))
            }
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level: usize = el.name[1..].parse().unwrap_or(1);
            let text = inner().split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                String::new()
            } else {
                format!("\n\n{} {}\n\n", "#".repeat(level), text)
            }
        }
        "strong" | "b" => wrap(&inner(), "**"),
        "em" | "i" => wrap(&inner(), "*"),
        "del" | "s" | "strike" => wrap(&inner(), "~~"),
        "u" => wrap(&inner(), "__"),
        "code" => wrap(
            &render_nodes(&el.children, Context { code: true, ..ctx }),
            "`",
        ),
        "a" => link(el, &inner()),
        "img" => match el.attr("src") {
            Some(src) if !src.is_empty() => {
                format!("![{}]({})", el.attr("alt").unwrap_or_default(), src)
            }
            _ => String::new(),
        },
        "ul" | "ol" => list(el, ctx),
        "li" => format!("\n{BULLET} {}\n", inner().trim()),
        "pre" => {
            let code = el.text();
            format!("\n\n```\n{}\n```\n\n", code.trim_matches('\n'))
        }
        "hr" => "\n\n---\n\n".to_string(),
        "tr" => format!("{}\n", inner().trim_end()),
        "td" | "th" => format!("{} ", inner().trim()),
        _ => inner(),
    }
}

fn block(content: &str) -> String {
    let content = content.trim();
    if content.is_empty() {
        String::new()
    } else {
        format!("\n\n{content}\n\n")
    }
}

/// Emphasis markers hug the text; surrounding spaces move outside them.
fn wrap(content: &str, marker: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return content.to_string();
    }
    let lead = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{marker}{trimmed}{marker}{trail}")
}

fn link(el: &Element, content: &str) -> String {
    let text = content.trim();
    match el.attr("href") {
        Some(href) if !href.is_empty() && !text.is_empty() => {
            if collapse_whitespace(&el.text()).trim() == href {
                href.to_string()
            } else {
                format!("[{text}]({href})")
            }
        }
        _ => content.to_string(),
    }
}

fn list(el: &Element, ctx: Context) -> String {
    let ordered = el.name == "ol";
    let start: usize = el
        .attr("start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let item_ctx = Context {
        list_item: true,
        ..ctx
    };

    let items: Vec<String> = el
        .children
        .iter()
        .filter_map(|node| match node {
            Node::Element(li) if li.name == "li" => Some(li),
            _ => None,
        })
        .enumerate()
        .map(|(i, li)| {
            let bullet = if ordered {
                format!("{}.", start + i)
            } else {
                BULLET.to_string()
            };
            let content = render_nodes(&li.children, item_ctx);
            let indent = " ".repeat(bullet.len() + 1);
            let mut lines = content.trim().split('\n');
            let first = lines.next().unwrap_or_default();
            let mut item = format!("{bullet} {first}");
            for line in lines {
                item.push('\n');
                if !line.trim().is_empty() {
                    item.push_str(&indent);
                    item.push_str(line);
                }
            }
            item
        })
        .collect();

    if items.is_empty() {
        return String::new();
    }
    let joined = items.join("\n");
    if ctx.list_item {
        format!("\n{joined}\n")
    } else {
        format!("\n\n{joined}\n\n")
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('*', "\\*")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(html: &str) -> String {
        render(&Fragment::parse(html))
    }

    #[test]
    fn paragraphs_are_separated_by_one_blank_line() {
        assert_eq!(md("<p>one</p><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn empty_paragraphs_do_not_stack_blank_lines() {
        assert_eq!(md("<p>one</p><p></p><p> </p><br><br><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn line_breaks_and_inline_markup() {
        assert_eq!(
            md("<p>Hello <b>bold</b> and <em>it </em>text<br>next line</p>"),
            "Hello **bold** and *it* text\nnext line"
        );
    }

    #[test]
    fn unordered_lists_use_dash_bullets() {
        assert_eq!(
            md("<ul><li>one</li><li>two<ul><li>nested</li></ul></li></ul>"),
            "- one\n- two\n  - nested"
        );
    }

    #[test]
    fn ordered_lists_are_numbered() {
        assert_eq!(md("<ol><li>a</li><li>b</li></ol>"), "1. a\n2. b");
    }

    #[test]
    fn blockquote_lines_are_prefixed() {
        assert_eq!(
            md("<p>reply</p><blockquote><p>first</p><p>second</p></blockquote>"),
            "reply\n\n> first\n>\n> second"
        );
    }

    #[test]
    fn nested_blockquotes_stack_markers() {
        assert_eq!(
            md("<blockquote><blockquote><p>inner</p></blockquote><p>outer</p></blockquote>"),
            "> > inner\n>\n> outer"
        );
    }

    #[test]
    fn headings_use_hashes() {
        assert_eq!(md("<h2>Patch  Notes</h2><p>body</p>"), "## Patch Notes\n\nbody");
    }

    #[test]
    fn links_and_images() {
        assert_eq!(
            md(r#"<p><a href="https://rsi.com/a">the thread</a> <a href="https://rsi.com/b">https://rsi.com/b</a></p>"#),
            "[the thread](https://rsi.com/a) https://rsi.com/b"
        );
        assert_eq!(
            md(r#"<img src="https://i/x.png" alt="ship">"#),
            "![ship](https://i/x.png)"
        );
    }

    #[test]
    fn markdown_characters_in_text_are_escaped() {
        assert_eq!(md("<p>snake_case *star*</p>"), "snake\\_case \\*star\\*");
    }

    #[test]
    fn code_is_not_escaped() {
        assert_eq!(md("<p><code>a_b</code></p>"), "`a_b`");
        assert_eq!(md("<pre>let a_b = 1;\n  x</pre>"), "```\nlet a_b = 1;\n  x\n```");
    }

    #[test]
    fn collapse_squeezes_blank_runs() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n  \n\t\nb"), "a\n\nb");
    }

    #[test]
    fn collapse_squeezes_quote_blank_runs_to_two() {
        assert_eq!(collapse_blank_lines("> a\n>\n> \n>\n>\n> b"), "> a\n>\n>\n> b");
    }

    #[test]
    fn collapse_keeps_nesting_edges_of_quote_runs() {
        assert_eq!(
            collapse_blank_lines("> a\n>\n> >\n> >\n> > b"),
            "> a\n>\n> >\n> > b"
        );
    }

    #[test]
    fn collapse_is_noop_on_normal_text() {
        let text = "para one\n\npara two\n> quoted\n>\n> more\n\n- item\n  ";
        assert_eq!(collapse_blank_lines(text), text);
    }

    #[test]
    fn collapse_is_idempotent() {
        let inputs = [
            "a\n\n\n\n\nb\n>\n>\n>\n>\nc",
            "\n\n\n",
            "> x\n> >\n>\n> >\n>\n\n\n> y",
            "",
        ];
        for input in inputs {
            let once = collapse_blank_lines(input);
            assert_eq!(collapse_blank_lines(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn quote_lines_marks_empty_lines_bare() {
        assert_eq!(quote_lines("a\n\nb"), "> a\n>\n> b");
    }
}
