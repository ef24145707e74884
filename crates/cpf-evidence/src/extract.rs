//! Visible-text extraction from reference pages.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose subtrees never contribute text.
const STRIPPED_TAGS: [&str; 4] = ["script", "style", "nav", "footer"];

/// Content regions, most specific first.
const CONTENT_SELECTORS: [&str; 3] = ["main", "article", "div.content, div.main-content"];

/// Extract the readable text of an HTML page.
///
/// Script, style, navigation and footer subtrees are ignored. Text is taken
/// from the first `main` region, else the first `article`, else the first
/// `content`/`main-content` container, else the whole document. Each text
/// fragment is trimmed and the non-empty fragments are joined with a single
/// space.
pub fn extract_main_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let root = content_root(&doc).unwrap_or_else(|| doc.root_element());
    visible_text(root)
}

fn content_root(doc: &Html) -> Option<ElementRef<'_>> {
    CONTENT_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        doc.select(&selector).find(|el| !is_stripped(*el))
    })
}

/// True when the element, or one of its ancestors, is a stripped tag.
fn is_stripped(element: ElementRef<'_>) -> bool {
    STRIPPED_TAGS.contains(&element.value().name())
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| STRIPPED_TAGS.contains(&el.value().name()))
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut fragments: Vec<&str> = Vec::new();

    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let inside_stripped = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| STRIPPED_TAGS.contains(&el.value().name()));
        if inside_stripped {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            fragments.push(trimmed);
        }
    }

    fragments.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_region_wins_over_rest_of_page() {
        let html = r#"
            <html><head><title>CPF</title></head>
            <body>
              <nav><a href="/">Home</a></nav>
              <div class="content">Sidebar content</div>
              <main>
                <h1>Using CPF to buy a home</h1>
                <p>You can use your   Ordinary Account savings.</p>
              </main>
              <footer>Copyright</footer>
            </body></html>"#;

        assert_eq!(
            extract_main_text(html),
            "Using CPF to buy a home You can use your   Ordinary Account savings."
        );
    }

    #[test]
    fn test_article_used_when_no_main() {
        let html = r#"<body><p>Intro</p><article><p>HDB loan</p><p>Bank loan</p></article></body>"#;
        assert_eq!(extract_main_text(html), "HDB loan Bank loan");
    }

    #[test]
    fn test_content_container_used_when_no_main_or_article() {
        let html = r#"<body><div class="header">Top</div><div class="main-content"><p>Home Protection Scheme</p></div></body>"#;
        assert_eq!(extract_main_text(html), "Home Protection Scheme");
    }

    #[test]
    fn test_whole_document_fallback_strips_scripts_and_chrome() {
        let html = r#"
            <html><head>
              <title>Budget for my home</title>
              <style>body { color: red; }</style>
              <script>var tracking = 1;</script>
            </head>
            <body>
              <nav>Menu</nav>
              <p>Plan your housing journey.</p>
              <script>alert("x")</script>
              <footer>Footer links</footer>
            </body></html>"#;

        let text = extract_main_text(html);
        assert_eq!(text, "Budget for my home Plan your housing journey.");
    }

    #[test]
    fn test_main_inside_nav_is_ignored() {
        let html = r#"<body><nav><main>Menu main</main></nav><article>Real article</article></body>"#;
        assert_eq!(extract_main_text(html), "Real article");
    }

    #[test]
    fn test_scripts_inside_main_are_dropped() {
        let html = r#"<main><p>Grant details</p><script>ignored()</script></main>"#;
        assert_eq!(extract_main_text(html), "Grant details");
    }

    #[test]
    fn test_empty_page_yields_empty_text() {
        assert_eq!(extract_main_text(""), "");
        assert_eq!(extract_main_text("<html><body>  </body></html>"), "");
    }
}
