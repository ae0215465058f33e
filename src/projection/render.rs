use html_escape::{encode_double_quoted_attribute, encode_text};
use html2md::rewrite_html as html_to_text;

use crate::domain::{FeedItem, FeedSource};

#[cfg(windows)]
pub const LINE_BREAK: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_BREAK: &str = "\n";

/// File extension and body of one projected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub extension: &'static str,
    pub content: String,
}

/// Renders feed items into file contents.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    /// CSS placed at the top of every HTML item.
    style: Option<String>,
}

impl Renderer {
    pub fn new(style: Option<String>) -> Self {
        Self {
            style: style.filter(|s| !s.trim().is_empty()),
        }
    }

    /// Extension of every file rendered for `source`.
    pub fn extension(source: &FeedSource) -> &'static str {
        if source.render_as_plain_text {
            "txt"
        } else {
            "html"
        }
    }

    pub fn render(&self, item: &FeedItem, source: &FeedSource) -> Rendered {
        let content = if source.render_as_plain_text {
            Self::render_text(item, source.show_original_link)
        } else {
            self.render_html(item, source.show_original_link)
        };

        Rendered {
            extension: Self::extension(source),
            content,
        }
    }

    fn render_text(item: &FeedItem, show_link: bool) -> String {
        let link = match item.link() {
            Some(link) if show_link => format!("{}{}", LINE_BREAK, link),
            _ => String::new(),
        };
        let body = html_to_text(item.body(), true);

        format!(
            "{}{}{}{}{}",
            item.display_title(),
            link,
            LINE_BREAK,
            LINE_BREAK,
            body
        )
    }

    fn render_html(&self, item: &FeedItem, show_link: bool) -> String {
        let title = encode_text(item.display_title());
        let heading = match item.link() {
            Some(link) if show_link => format!(
                "<h1><a href=\"{}\">{}</a></h1>",
                encode_double_quoted_attribute(link),
                title
            ),
            _ => format!("<h1>{}</h1>", title),
        };

        let mut out = String::new();
        if let Some(style) = &self.style {
            out.push_str("<style>");
            out.push_str(style);
            out.push_str("</style>");
            out.push_str(LINE_BREAK);
        }
        out.push_str(&heading);
        out.push_str(LINE_BREAK);
        out.push_str(item.body());
        out
    }
}
