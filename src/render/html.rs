//! Standalone HTML output.

use pulldown_cmark::{html, Options, Parser};

const STYLE: &str = r#"body { font-family: "Malgun Gothic", "Apple SD Gothic Neo", "Noto Sans KR", "Nanum Gothic", sans-serif; line-height: 1.6; max-width: 860px; margin: 2em auto; padding: 0 1em; color: #222; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #999; padding: 4px 8px; }
th { background: #f2f2f2; }"#;

/// Converts Markdown into a complete HTML page.
pub fn markdown_to_html_page(markdown: &str, title: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_title(title),
        STYLE,
        body
    )
}

fn escape_title(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_shell() {
        let page = markdown_to_html_page("본문", "A <&> B");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<html lang=\"ko\">"));
        assert!(page.contains("<meta charset=\"utf-8\">"));
        assert!(page.contains("<title>A &lt;&amp;&gt; B</title>"));
        assert!(page.contains("Malgun Gothic"));
        assert!(page.contains("<p>본문</p>"));
    }

    #[test]
    fn test_tables_enabled() {
        let page = markdown_to_html_page("| a | b |\n| --- | --- |\n| 1 | 2 |\n", "t");
        assert!(page.contains("<table>"));
        assert!(page.contains("<th>a</th>"));
        assert!(page.contains("<td>2</td>"));
    }
}
