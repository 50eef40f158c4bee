//! URL completion for script and source map references.

use url::Url;

/// Resolve `href` the way a browser resolves a link on a page at `base`.
///
/// An absolute `href` stands on its own. A relative one needs a base that
/// parses as an absolute URL; without one there is nothing to resolve
/// against and `None` is returned.
pub fn complete_url(base: Option<&str>, href: &str) -> Option<Url> {
    if let Ok(absolute) = Url::parse(href) {
        return Some(absolute);
    }
    let base = Url::parse(base.filter(|b| !b.is_empty())?).ok()?;
    base.join(href).ok()
}

/// Resolve a script's source map URL.
///
/// The script URL is completed against the document URL first, then the
/// source map URL against the completed script URL.
pub fn resolve_source_map_url(
    document_url: Option<&str>,
    script_url: &str,
    source_map_url: &str,
) -> Option<Url> {
    let script = complete_url(document_url, script_url)?;
    complete_url(Some(script.as_str()), source_map_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_against_base() {
        let url = complete_url(Some("https://x/index.html"), "/app.js").unwrap();
        assert_eq!(url.as_str(), "https://x/app.js");

        let url = complete_url(Some("https://x/a/b/page.html"), "../lib.js").unwrap();
        assert_eq!(url.as_str(), "https://x/a/lib.js");
    }

    #[test]
    fn test_absolute_href_ignores_base() {
        let url = complete_url(None, "https://cdn/lib.js").unwrap();
        assert_eq!(url.as_str(), "https://cdn/lib.js");

        let url = complete_url(Some("https://x/"), "file:///tmp/a.js").unwrap();
        assert_eq!(url.as_str(), "file:///tmp/a.js");
    }

    #[test]
    fn test_missing_or_bad_base() {
        assert!(complete_url(None, "app.js").is_none());
        assert!(complete_url(Some(""), "app.js").is_none());
        assert!(complete_url(Some("not a url"), "app.js").is_none());
    }

    #[test]
    fn test_resolve_source_map_two_steps() {
        let url = resolve_source_map_url(Some("https://x/index.html"), "/app.js", "app.js.map");
        assert_eq!(url.unwrap().as_str(), "https://x/app.js.map");

        let url = resolve_source_map_url(
            Some("https://x/index.html"),
            "/static/js/main.js",
            "main.js.map",
        );
        assert_eq!(url.unwrap().as_str(), "https://x/static/js/main.js.map");
    }

    #[test]
    fn test_resolve_source_map_without_document() {
        assert!(resolve_source_map_url(None, "/app.js", "app.js.map").is_none());
        // An absolute script URL needs no document.
        let url = resolve_source_map_url(None, "https://cdn/app.js", "app.js.map").unwrap();
        assert_eq!(url.as_str(), "https://cdn/app.js.map");
    }

    #[test]
    fn test_data_url_source_map() {
        let inline = "data:application/json;base64,e30=";
        let url = resolve_source_map_url(Some("https://x/"), "/app.js", inline).unwrap();
        assert_eq!(url.scheme(), "data");
    }
}
