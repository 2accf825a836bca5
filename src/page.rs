use pulldown_cmark::{Options, Parser};
use serde::Serialize;

pub const EMPTY_PREVIEW: &str = "*No content yet*";

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct Html(pub String);

/// Renders the draft body as it will look once published.
pub fn preview(markdown: &str) -> Html {
    let source = if markdown.trim().is_empty() {
        EMPTY_PREVIEW
    } else {
        markdown
    };

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut content = String::new();
    pulldown_cmark::html::push_html(&mut content, Parser::new_ext(source, options));
    Html(content)
}
