/* 📖 # How does article search work?

Search is a linear scan of the whole corpus with a literal, case-sensitive
substring test. There is no index, no tokenizer and no relevance score: an article
either contains the query or it does not. For a corpus of a few thousand archived
pages this is fast enough to run on every request, and it means results are
exactly reproducible.

Results are ordered newest first by the publication date found in the page.
Pages without a usable date come last. The sort is stable, so articles with
equal dates keep the order the store walked them in.

If any document cannot be read, the whole search fails. An incomplete result
list would be indistinguishable from a complete one, so the failure is reported
instead.
*/

use coolshell_base::tracing::{debug, info, instrument};
use coolshell_base::{CoolshellResult, ResultExt};
use serde::Serialize;

use crate::extractor::{PublishDate, extract_date, extract_snippet};
use crate::store::ContentStore;

/// One matching article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Site-relative URL of the article.
    pub link: String,
    /// Title text extracted from the page; empty if none was found.
    pub description: String,
    /// Publication date; serialized as RFC 3339 or `null`.
    pub date: PublishDate,
}

/// Substring search over a content store.
#[derive(Debug, Clone)]
pub struct ArticleSearch {
    link_strip_segment: String,
}

impl ArticleSearch {
    /// `link_strip_segment` is removed once from each document path to form the
    /// public link, e.g. `content` turns `content/articles/1.html` into
    /// `/articles/1.html`.
    pub fn new(link_strip_segment: impl Into<String>) -> Self {
        Self {
            link_strip_segment: link_strip_segment.into(),
        }
    }

    /// Find every document containing `query`, newest first.
    ///
    /// `query` is expected to be non-empty; the HTTP layer rejects empty queries
    /// before calling this. No match is an empty vector, not an error.
    #[instrument(skip(self, store), level = "debug")]
    pub fn search(
        &self,
        store: &dyn ContentStore,
        query: &str,
    ) -> CoolshellResult<Vec<SearchResult>> {
        let mut results = Vec::new();
        let mut scanned = 0usize;

        for document in store.list_documents().context("Failed to list articles")? {
            let document = document.context("Failed to read article")?;
            scanned += 1;
            if !document.contains(query) {
                continue;
            }
            debug!(path = %document.path(), "match");
            results.push(SearchResult {
                link: derive_link(document.path().as_str(), &self.link_strip_segment),
                description: extract_snippet(document.content()),
                date: extract_date(document.content()),
            });
        }

        results.sort_by(|a, b| b.date.cmp(&a.date));
        info!(query, scanned, matches = results.len(), "search finished");
        Ok(results)
    }
}

impl Default for ArticleSearch {
    fn default() -> Self {
        Self::new("content")
    }
}

/// Remove the first occurrence of `segment` from `path`.
///
/// Paths from a snapshot are relative, so the result gains a leading `/` if the
/// removal did not already leave one.
pub fn derive_link(path: &str, segment: &str) -> String {
    let stripped = if segment.is_empty() {
        path.to_string()
    } else {
        path.replacen(segment, "", 1)
    };
    if stripped.starts_with('/') {
        stripped
    } else {
        format!("/{}", stripped)
    }
}

#[cfg(test)]
mod tests {
    use coolshell_base::{FilePath, MockPal, PalHandle};

    use super::*;
    use crate::document::Document;
    use crate::snapshot::{DirectorySnapshot, SnapshotHandle};
    use crate::store::{InMemoryStore, SnapshotStore};

    fn article(name: &str, title: &str, datetime: Option<&str>, body: &str) -> Document {
        let time = datetime
            .map(|dt| format!(r#"<time class="entry-date" datetime="{}">{}</time>"#, dt, dt))
            .unwrap_or_default();
        Document::new(
            format!("content/articles/{}.html", name),
            format!(
                r#"<article><h2><span class="screen-reader-text">{}</span></h2>{}<div>{}</div></article>"#,
                title, time, body
            ),
        )
    }

    fn scenario_store() -> InMemoryStore {
        [
            article(
                "d1",
                "Linux kernel internals",
                Some("2020-01-01T00:00:00Z"),
                "scheduling in the kernel",
            ),
            article(
                "d2",
                "A kernel panic story",
                Some("2022-06-15T00:00:00Z"),
                "oops",
            ),
            article(
                "d3",
                "Go concurrency",
                Some("2021-03-01T00:00:00Z"),
                "channels and goroutines",
            ),
        ]
        .into_iter()
        .collect()
    }

    fn links(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.link.as_str()).collect()
    }

    #[test]
    fn test_matches_sorted_newest_first() {
        let results = ArticleSearch::default()
            .search(&scenario_store(), "kernel")
            .unwrap();

        assert_eq!(links(&results), vec!["/articles/d2.html", "/articles/d1.html"]);
        assert_eq!(results[0].description, "A kernel panic story");
        assert_eq!(results[1].description, "Linux kernel internals");
        assert_eq!(
            results[0].date.to_rfc3339().as_deref(),
            Some("2022-06-15T00:00:00Z")
        );
    }

    #[test]
    fn test_undated_match_has_sentinel_date() {
        let store: InMemoryStore = [article("d4", "Network tuning", None, "network stack")]
            .into_iter()
            .collect();
        let results = ArticleSearch::default().search(&store, "network").unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].description, "Network tuning");
        assert!(results[0].date.is_unknown());
    }

    #[test]
    fn test_no_match_is_empty() {
        let results = ArticleSearch::default()
            .search(&scenario_store(), "nonexistent-term-xyz")
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let results = ArticleSearch::default()
            .search(&scenario_store(), "KERNEL")
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_snippet_keeps_the_match() {
        let store: InMemoryStore = [Document::new(
            "content/articles/bare.html",
            r#"<time datetime="2019-05-05T10:00:00+08:00"></time><p>kernel</p>"#,
        )]
        .into_iter()
        .collect();
        let results = ArticleSearch::default().search(&store, "kernel").unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].description, "");
        assert_eq!(results[0].link, "/articles/bare.html");
    }

    #[test]
    fn test_undated_sort_last_and_ties_keep_traversal_order() {
        let store: InMemoryStore = [
            article("u1", "undated one", None, "vim"),
            article("t1", "tie one", Some("2015-01-01T00:00:00Z"), "vim"),
            article("new", "newest", Some("2016-01-01T00:00:00Z"), "vim"),
            article("u2", "undated two", None, "vim"),
            // same instant written in another offset
            article("t2", "tie two", Some("2015-01-01T08:00:00+08:00"), "vim"),
        ]
        .into_iter()
        .collect();

        let results = ArticleSearch::default().search(&store, "vim").unwrap();
        assert_eq!(
            links(&results),
            vec![
                "/articles/new.html",
                "/articles/t1.html",
                "/articles/t2.html",
                "/articles/u1.html",
                "/articles/u2.html",
            ]
        );
    }

    #[test]
    fn test_every_result_contains_the_query() {
        let store = scenario_store();
        let results = ArticleSearch::default().search(&store, "the").unwrap();
        let documents: Vec<Document> = store
            .list_documents()
            .unwrap()
            .collect::<CoolshellResult<_>>()
            .unwrap();

        assert!(!results.is_empty());
        for result in &results {
            let document = documents
                .iter()
                .find(|d| derive_link(d.path().as_str(), "content") == result.link)
                .unwrap();
            assert!(document.contains("the"));
        }
    }

    #[test]
    fn test_search_is_idempotent() {
        let store = scenario_store();
        let search = ArticleSearch::default();
        let first = search.search(&store, "kernel").unwrap();
        let second = search.search(&store, "kernel").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_failure_fails_the_whole_search() {
        let mock = MockPal::new();
        mock.add_file(
            FilePath::from("content/articles/a.html"),
            article("a", "kernel a", None, "kernel").content().as_bytes().to_vec(),
        );
        mock.add_unreadable_file(FilePath::from("content/articles/b.html"), "input/output error");
        mock.add_file(
            FilePath::from("content/articles/c.html"),
            article("c", "kernel c", None, "kernel").content().as_bytes().to_vec(),
        );
        let snapshot = SnapshotHandle::new(DirectorySnapshot::new(PalHandle::new(mock)));
        let store = SnapshotStore::new(snapshot, "content/articles");

        let err = ArticleSearch::default().search(&store, "kernel").unwrap_err();
        assert_eq!(
            err.get_context(),
            ["Failed to read content/articles/b.html", "Failed to read article"]
        );
        assert!(err.to_string().contains("input/output error"));
    }

    #[test]
    fn test_serialized_result() {
        let results = ArticleSearch::default()
            .search(&scenario_store(), "panic")
            .unwrap();
        assert_eq!(
            serde_json::to_string(&results).unwrap(),
            r#"[{"link":"/articles/d2.html","description":"A kernel panic story","date":"2022-06-15T00:00:00Z"}]"#
        );
    }

    #[test]
    fn test_derive_link() {
        assert_eq!(derive_link("content/articles/1.html", "content"), "/articles/1.html");
        assert_eq!(
            derive_link("content/articles/content.html", "content"),
            "/articles/content.html"
        );
        assert_eq!(derive_link("articles/1.html", "content"), "/articles/1.html");
        assert_eq!(derive_link("articles/1.html", ""), "/articles/1.html");
    }
}
