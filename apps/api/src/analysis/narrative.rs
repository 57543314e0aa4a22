use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Renders the model's Markdown narrative to HTML for the report view.
/// Raw HTML in the narrative is escaped, never passed through, and link or
/// image targets outside http(s) and mailto are replaced with `#`.
pub fn render_narrative_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::Start(Tag::Link(kind, dest, title)) => {
            Event::Start(Tag::Link(kind, safe_destination(dest), title))
        }
        Event::Start(Tag::Image(kind, dest, title)) => {
            Event::Start(Tag::Image(kind, safe_destination(dest), title))
        }
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Relative targets pass; absolute ones only with an allowed scheme.
fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    let scheme_end = dest.find(':');
    let path_start = dest.find(['/', '?', '#']);
    let scheme = match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => return dest,
        (Some(colon), _) => dest[..colon].to_ascii_lowercase(),
        (None, _) => return dest,
    };
    if SAFE_SCHEMES.contains(&scheme.as_str()) {
        dest
    } else {
        CowStr::Borrowed("#")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_headings_and_lists() {
        let html = render_narrative_html("## Strengths\n- Go\n- **Docker**\n");
        assert!(html.contains("<h2>Strengths</h2>"));
        assert!(html.contains("<li>Go</li>"));
        assert!(html.contains("<strong>Docker</strong>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_narrative_html("<script>alert(1)</script>\n");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_script_links_are_neutralised() {
        let html = render_narrative_html("See [portfolio](javascript:alert(document.cookie))");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("href=\"#\""));

        let html = render_narrative_html("![chart](JavaScript:alert(1)) <data:text/html,x>");
        assert!(!html.to_lowercase().contains("javascript:"));
        assert!(html.contains("src=\"#\""));
        assert!(!html.contains("href=\"data:"));
    }

    #[test]
    fn test_web_and_relative_links_are_kept() {
        let html = render_narrative_html(
            "[site](https://example.com/a?b=c) [mail](mailto:hr@example.com) [notes](docs/notes.md)",
        );
        assert!(html.contains("href=\"https://example.com/a?b=c\""));
        assert!(html.contains("href=\"mailto:hr@example.com\""));
        assert!(html.contains("href=\"docs/notes.md\""));
    }
}
