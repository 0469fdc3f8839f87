//! Markdown → HTML conversion and the HTML document envelope.

use pulldown_cmark::{Options, Parser, html};

use crate::assets::BackgroundImage;

/// Parser options shared by the HTML and PDF renderers.
pub(crate) fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Convert markdown-like text to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut body = String::new();
    html::push_html(&mut body, parser);
    body
}

/// Wrap an HTML fragment in a minimal standalone document.
pub fn wrap_html(body: &str, title: &str, background: Option<&BackgroundImage>) -> String {
    let background_css = background
        .map(|image| {
            format!(
                "body {{ background-image: url(\"{}\"); background-size: cover; \
                 background-position: center; background-repeat: no-repeat; }}\n\
                 .plan {{ background-color: rgba(255, 255, 255, 0.7); border-radius: 18px; }}\n",
                image.data_uri()
            )
        })
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{title}</title>\n<style>\n{BASE_CSS}{background_css}</style>\n</head>\n\
         <body>\n<article class=\"plan\">\n{body}</article>\n</body>\n</html>\n",
        title = html_escape(title),
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const BASE_CSS: &str = "body { font-family: 'Segoe UI', sans-serif; color: #333333; margin: 0; padding: 2rem; }
.plan { padding: 2rem 3rem; }
table { width: 100%; border-collapse: collapse; margin: 1em 0; }
th, td { padding: 0.5rem; text-align: left; border: 1px solid #e5e7eb; vertical-align: top; }
th { background-color: #f3f4f6; }
";
