/* 📖 # Why render HTML by hand?

The server produces exactly two dynamic pages: the search result list and an
error page. Both are small and fixed, so they are written straight into a String
instead of pulling in a template engine. Every piece of request- or
corpus-derived text goes through `pulldown-cmark-escape`; descriptions are raw
page text and may contain markup or entities of their own.
*/

use std::fmt;

use pulldown_cmark_escape::{escape_href, escape_html};

use crate::search::SearchResult;

fn push_text(out: &mut String, text: &str) -> fmt::Result {
    escape_html(&mut *out, text)
}

fn push_href(out: &mut String, href: &str) -> fmt::Result {
    escape_href(&mut *out, href)
}

fn push_head(out: &mut String, page_title: &str, site_title: &str) -> fmt::Result {
    out.push_str("<!DOCTYPE html>\n<html lang=\"zh-CN\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>");
    push_text(out, page_title)?;
    out.push_str(" - ");
    push_text(out, site_title)?;
    out.push_str("</title>\n</head>\n<body>\n");
    Ok(())
}

fn push_search_form(out: &mut String, query: &str) -> fmt::Result {
    out.push_str("<form class=\"search-form\" action=\"/search\" method=\"get\">");
    out.push_str("<input type=\"search\" name=\"q\" value=\"");
    push_text(out, query)?;
    out.push_str("\"><button type=\"submit\">Search</button></form>\n");
    Ok(())
}

/// The search result page.
pub fn render_search_page(
    site_title: &str,
    query: &str,
    results: &[SearchResult],
) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(1024 + results.len() * 256);
    push_head(&mut out, &format!("Search: {}", query), site_title)?;
    out.push_str("<header><a href=\"/\">");
    push_text(&mut out, site_title)?;
    out.push_str("</a></header>\n");
    push_search_form(&mut out, query)?;

    out.push_str("<p class=\"summary\">");
    out.push_str(&results.len().to_string());
    out.push_str(if results.len() == 1 { " article" } else { " articles" });
    out.push_str(" containing &ldquo;");
    push_text(&mut out, query)?;
    out.push_str("&rdquo;</p>\n");

    if !results.is_empty() {
        out.push_str("<ul class=\"results\">\n");
        for result in results {
            out.push_str("<li><a href=\"");
            push_href(&mut out, &result.link)?;
            out.push_str("\">");
            if result.description.is_empty() {
                push_text(&mut out, &result.link)?;
            } else {
                push_text(&mut out, &result.description)?;
            }
            out.push_str("</a>");
            if let (Some(rfc3339), Some(day)) =
                (result.date.to_rfc3339(), result.date.display_date())
            {
                out.push_str(" <time datetime=\"");
                push_text(&mut out, &rfc3339)?;
                out.push_str("\">");
                out.push_str(&day);
                out.push_str("</time>");
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ul>\n");
    }

    out.push_str("</body>\n</html>\n");
    Ok(out)
}

/// A minimal error page carrying `message`.
pub fn render_error_page(
    site_title: &str,
    heading: &str,
    message: &str,
) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(512);
    push_head(&mut out, heading, site_title)?;
    out.push_str("<h1>");
    push_text(&mut out, heading)?;
    out.push_str("</h1>\n<p class=\"error\">");
    push_text(&mut out, message)?;
    out.push_str("</p>\n<p><a href=\"/\">");
    push_text(&mut out, site_title)?;
    out.push_str("</a></p>\n</body>\n</html>\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::extractor::PublishDate;

    #[test]
    fn test_render_search_page() {
        let results = vec![
            SearchResult {
                link: "/articles/22001.html".to_string(),
                description: "A kernel <panic> story".to_string(),
                date: PublishDate::parse_rfc3339("2022-06-15T09:30:00+08:00").unwrap(),
            },
            SearchResult {
                link: "/articles/untitled page.html".to_string(),
                description: String::new(),
                date: PublishDate::UNKNOWN,
            },
        ];

        expect![[r#"
            <!DOCTYPE html>
            <html lang="zh-CN">
            <head>
            <meta charset="utf-8">
            <meta name="viewport" content="width=device-width, initial-scale=1">
            <title>Search: &quot;kernel&quot; - CoolShell</title>
            </head>
            <body>
            <header><a href="/">CoolShell</a></header>
            <form class="search-form" action="/search" method="get"><input type="search" name="q" value="&quot;kernel&quot;"><button type="submit">Search</button></form>
            <p class="summary">2 articles containing &ldquo;&quot;kernel&quot;&rdquo;</p>
            <ul class="results">
            <li><a href="/articles/22001.html">A kernel &lt;panic&gt; story</a> <time datetime="2022-06-15T09:30:00+08:00">2022-06-15</time></li>
            <li><a href="/articles/untitled%20page.html">/articles/untitled page.html</a></li>
            </ul>
            </body>
            </html>
        "#]]
        .assert_eq(&render_search_page("CoolShell", "\"kernel\"", &results).unwrap());
    }

    #[test]
    fn test_render_empty_search_page() {
        let page = render_search_page("CoolShell", "xyz", &[]).unwrap();
        assert!(page.contains("<p class=\"summary\">0 articles containing &ldquo;xyz&rdquo;</p>"));
        assert!(!page.contains("<ul"));
    }

    #[test]
    fn test_render_error_page() {
        expect![[r#"
            <!DOCTYPE html>
            <html lang="zh-CN">
            <head>
            <meta charset="utf-8">
            <meta name="viewport" content="width=device-width, initial-scale=1">
            <title>400 Bad Request - CoolShell</title>
            </head>
            <body>
            <h1>400 Bad Request</h1>
            <p class="error">Query parameter &#39;q&#39; is required</p>
            <p><a href="/">CoolShell</a></p>
            </body>
            </html>
        "#]]
        .assert_eq(&render_error_page(
            "CoolShell",
            "400 Bad Request",
            "Query parameter 'q' is required",
        )
        .unwrap());
    }
}
