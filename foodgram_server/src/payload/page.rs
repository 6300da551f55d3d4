//! Page-number pagination: `?page=N&limit=M`.

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "super::lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient_int")]
    pub limit: Option<i64>,
}

/// Resolved page number and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn new(page: Option<i64>, limit: i64) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    fn has_next(&self, count: i64) -> bool {
        self.page.saturating_mul(self.limit) < count
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, window: PageWindow, uri: &Uri) -> Self {
        let next = window
            .has_next(count)
            .then(|| page_link(uri, window.page + 1));
        let previous = (window.page > 1).then(|| page_link(uri, window.page - 1));
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Rebuild `uri` with its `page` parameter replaced.
///
/// Page 1 drops the parameter entirely. Other parameters keep their order.
pub fn page_link(uri: &Uri, page: i64) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(query) = uri.query() {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key != "page" {
                serializer.append_pair(&key, &value);
            }
        }
    }
    if page > 1 {
        serializer.append_pair("page", &page.to_string());
    }
    let query = serializer.finish();

    if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;

    #[test]
    fn malformed_page_params_are_ignored() {
        let uri: Uri = "/api/users/?page=abc&limit=2".parse().unwrap();
        let Query(query) = Query::<PageQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.page, None);
        assert_eq!(query.limit, Some(2));
    }

    #[test]
    fn window_defaults_to_first_page() {
        let window = PageWindow::new(None, 6);
        assert_eq!(window.page, 1);
        assert_eq!(window.offset(), 0);

        let window = PageWindow::new(Some(-2), 6);
        assert_eq!(window.page, 1);

        let window = PageWindow::new(Some(3), 6);
        assert_eq!(window.offset(), 12);
    }

    #[test]
    fn links_replace_page_and_keep_filters() {
        let uri: Uri = "/api/recipes/?tags=lunch&page=2&tags=dinner&limit=6"
            .parse()
            .unwrap();
        assert_eq!(
            page_link(&uri, 3),
            "/api/recipes/?tags=lunch&tags=dinner&limit=6&page=3"
        );
        assert_eq!(
            page_link(&uri, 1),
            "/api/recipes/?tags=lunch&tags=dinner&limit=6"
        );
    }

    #[test]
    fn first_page_link_without_other_params_is_bare_path() {
        let uri: Uri = "/api/users/?page=2".parse().unwrap();
        assert_eq!(page_link(&uri, 1), "/api/users/");
    }

    #[test]
    fn page_sets_next_and_previous() {
        let uri: Uri = "/api/users/?page=2&limit=2".parse().unwrap();
        let page = Page::new(vec![3, 4], 5, PageWindow::new(Some(2), 2), &uri);
        assert_eq!(page.next.as_deref(), Some("/api/users/?limit=2&page=3"));
        assert_eq!(page.previous.as_deref(), Some("/api/users/?limit=2"));

        let last = Page::new(vec![5], 5, PageWindow::new(Some(3), 2), &uri);
        assert!(last.next.is_none());

        let empty: Page<i32> = Page::new(vec![], 0, PageWindow::new(None, 6), &uri);
        assert!(empty.next.is_none());
        assert!(empty.previous.is_none());
    }
}
