//! Post body rendering.
//!
//! ```text
//! summary HTML ─► emoji::emojize ─► html::Fragment::parse ─► quote::repair
//!              ─► markdown::render ─► budget::fit ─► embed description
//! ```

pub mod budget;
pub mod emoji;
pub mod html;
pub mod markdown;
pub mod quote;

use html::Fragment;

/// A post body ready for the embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody {
    /// Markdown, at most `ceiling` characters.
    pub markdown: String,
    /// First inline image of the post, if any.
    pub image_url: Option<String>,
}

/// Run the whole body pipeline on a post's summary HTML.
pub fn render_body(summary_html: &str, ceiling: usize) -> RenderedBody {
    let html = emoji::emojize(summary_html);
    let fragment = quote::repair(Fragment::parse(&html));
    let markdown = markdown::render(&fragment);

    RenderedBody {
        markdown: budget::fit(&markdown, ceiling),
        image_url: fragment.first_image_src().map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget::{DESCRIPTION_LIMIT, ELLIPSIS};

    #[test]
    fn spectrum_quote_is_attributed() {
        let body = render_body(
            r#"<blockquote><div class="quoteauthor">Wakapedia</div><p>Is it in 3.18?</p></blockquote><p>Yes :smile:</p>"#,
            DESCRIPTION_LIMIT,
        );

        assert_eq!(
            body.markdown,
            "> Wakapedia:\n>\n> Is it in 3.18?\n\nYes \u{1F604}"
        );
        assert!(body.image_url.is_none());
    }

    #[test]
    fn first_image_is_reported() {
        let body = render_body(
            r#"<p>Look</p><p><img src="https://media.robertsspaceindustries.com/a.jpg"></p>"#,
            DESCRIPTION_LIMIT,
        );

        assert_eq!(
            body.image_url.as_deref(),
            Some("https://media.robertsspaceindustries.com/a.jpg")
        );
    }

    #[test]
    fn empty_image_source_is_not_reported() {
        let body = render_body(
            r#"<p>x</p><img src=""><img src="https://a/b.png">"#,
            DESCRIPTION_LIMIT,
        );

        assert_eq!(body.image_url.as_deref(), Some("https://a/b.png"));
        assert_eq!(body.markdown, "x\n\n![](https://a/b.png)");
    }

    #[test]
    fn long_quoted_reply_fits_the_description() {
        let quoted: String = (0..4)
            .map(|i| format!("<p>{}</p>", "quoted words ".repeat(55) + &i.to_string()))
            .collect();
        let html = format!(
            r#"<blockquote><div class="bb_quoteauthor">someone</div>{quoted}</blockquote><p>{}</p>"#,
            "reply ".repeat(30)
        );

        let body = render_body(&html, DESCRIPTION_LIMIT);

        assert!(body.markdown.chars().count() <= DESCRIPTION_LIMIT);
        assert!(body.markdown.contains(&format!("> {ELLIPSIS}")));
        assert!(body.markdown.trim_end().ends_with("reply"));
    }
}
