use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{Error, Result};

const DOCS_ORIGIN: &str = "https://docs.google.com";
const NO_LINK_MESSAGE: &str = "cannot retrieve the public link of the file: you may need to \
    change the sharing permission to 'Anyone with the link', or the file has been accessed too \
    many times recently";

static EXPORT_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(/uc\?export=download[^"]+)"#).expect("static regex"));
static DOWNLOAD_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""downloadUrl":"([^"]+)"#).expect("static regex"));
static ERROR_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<p class="uc-error-subcaption">(.*)</p>"#).expect("static regex")
});
static DOWNLOAD_FORM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#download-form").expect("static selector"));
static HIDDEN_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[type="hidden"]"#).expect("static selector"));

/// Finds the real download link on a "can't scan this file for viruses" page.
///
/// Lines are inspected in order and the first one matching any strategy decides. Within a
/// line the strategies run as: export anchor, download form, inline `downloadUrl`, and last
/// the error caption, which turns into [`Error::AccessDenied`] with the caption text.
pub(crate) fn resolve_download_url(html: &str) -> Result<String> {
    for line in html.lines() {
        if let Some(url) = export_link(line) {
            return Ok(url);
        }

        if let Some(url) = download_form(line)? {
            return Ok(url);
        }

        if let Some(url) = inline_download_url(line) {
            return Ok(url);
        }

        if let Some(captures) = ERROR_CAPTION.captures(line) {
            return Err(Error::AccessDenied(captures[1].to_string()));
        }
    }

    Err(Error::AccessDenied(NO_LINK_MESSAGE.to_string()))
}

fn export_link(line: &str) -> Option<String> {
    let path = EXPORT_HREF.captures(line)?.get(1)?.as_str();
    Some(format!("{DOCS_ORIGIN}{path}").replace("&amp;", "&"))
}

/// `action` of the download form with every hidden input merged into its query.
fn download_form(line: &str) -> Result<Option<String>> {
    if !line.contains("download-form") {
        return Ok(None);
    }

    let fragment = Html::parse_fragment(line);
    let Some(form) = fragment.select(&DOWNLOAD_FORM).next() else {
        return Ok(None);
    };

    let action = form
        .value()
        .attr("action")
        .ok_or_else(|| Error::MalformedPage("download form has no action".to_string()))?
        .replace("&amp;", "&");

    let hidden: Vec<(String, String)> = form
        .select(&HIDDEN_INPUT)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    if hidden.is_empty() {
        return Ok(Some(action));
    }

    let mut url = Url::parse(&action)?;
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (name, value) in hidden {
        match pairs.iter_mut().find(|(key, _)| *key == name) {
            Some(pair) => pair.1 = value,
            None => pairs.push((name, value)),
        }
    }
    url.query_pairs_mut().clear().extend_pairs(&pairs);

    Ok(Some(url.into()))
}

fn inline_download_url(line: &str) -> Option<String> {
    let raw = DOWNLOAD_URL.captures(line)?.get(1)?.as_str();
    Some(raw.replace("\\u003d", "=").replace("\\u0026", "&"))
}
