//! Markdown to HTML for the browser UI
//!
//! Model output is untrusted: raw HTML blocks and inline tags are emitted as
//! escaped text instead of markup.

use pulldown_cmark::{html, Event, Options, Parser};

/// Render Markdown to an HTML fragment with raw HTML escaped
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}
