use pulldown_cmark::{Options, Parser, html};

/// Renders a markdown body into the HTML markup the backend sends as-is.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_emphasis_and_lists() {
        let html = markdown_to_html("hello **world**\n\n- one\n- two\n");
        assert!(html.contains("<strong>world</strong>"));
        assert!(html.contains("<li>one</li>"));
    }
}
