use std::collections::{BTreeMap, HashSet};

use ::scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::{AssetKind, ScrapedAsset, ScrapedImage};

/// Which anchors [`HtmlExtractor::links`] keeps.
///
/// The two flags are independent. Setting `include_same_domain` together
/// with `restrict_third_party_domains` keeps same-domain links only;
/// leaving `include_same_domain` unset while restricting third parties
/// yields nothing at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub include_same_domain: bool,
    pub restrict_third_party_domains: bool,
}

/// Pure reads over a parsed HTML document.
///
/// Nothing here fails: a missing element yields an empty result and a URL
/// that cannot be resolved is dropped on its own.
pub struct HtmlExtractor {
    document: Html,
    base: Option<Url>,
    base_url: String,
}

impl HtmlExtractor {
    pub fn new(html: &str, base_url: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            base: Url::parse(base_url).ok(),
            base_url: base_url.to_string(),
        }
    }

    pub fn title(&self) -> String {
        self.select("head > title")
            .first()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    pub fn description(&self) -> Option<String> {
        self.select(r#"meta[name="description"]"#)
            .first()
            .and_then(|el| el.value().attr("content"))
            .map(|content| content.trim().to_string())
    }

    /// Flat map of `name`/`property` meta tags. Later tags overwrite earlier
    /// ones with the same key.
    pub fn meta_data(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();
        for el in self.select("meta") {
            let attrs = el.value();
            let content = match attrs.attr("content") {
                Some(c) if !c.is_empty() => c,
                _ => continue,
            };
            if let Some(key) = attrs.attr("name").or_else(|| attrs.attr("property")) {
                meta.insert(key.to_string(), content.to_string());
            }
        }
        meta
    }

    /// Absolute http(s) anchor targets, deduplicated in document order.
    pub fn links(&self, options: LinkOptions) -> Vec<String> {
        let base_host = self.base.as_ref().and_then(|b| b.host_str());
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for el in self.select("a[href]") {
            let href = el.value().attr("href").unwrap_or_default().trim();
            let url = match Url::parse(href) {
                Ok(u) if matches!(u.scheme(), "http" | "https") => u,
                _ => continue,
            };

            let same_domain = base_host.is_some() && url.host_str() == base_host;
            if same_domain && !options.include_same_domain {
                continue;
            }
            if !same_domain && options.restrict_third_party_domains {
                continue;
            }

            let link = url.to_string();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }

        links
    }

    /// Stylesheets, scripts, preloaded fonts and linked office documents.
    pub fn assets(&self) -> Vec<ScrapedAsset> {
        let mut seen = HashSet::new();
        let mut assets = Vec::new();
        let mut push = |kind: AssetKind, url: String| {
            if seen.insert(url.clone()) {
                assets.push(ScrapedAsset {
                    kind,
                    url,
                    parent_url: self.base_url.clone(),
                });
            }
        };

        for el in self.select(r#"link[rel~="stylesheet"][href]"#) {
            if let Some(url) = self.resolve_attr(&el, "href") {
                push(AssetKind::Stylesheet, url);
            }
        }
        for el in self.select("script[src]") {
            if let Some(url) = self.resolve_attr(&el, "src") {
                push(AssetKind::Script, url);
            }
        }
        for el in self.select(r#"link[rel~="preload"][as="font"][href]"#) {
            if let Some(url) = self.resolve_attr(&el, "href") {
                push(AssetKind::Font, url);
            }
        }
        for el in self.select("a[href]") {
            let Some(url) = self.resolve_attr(&el, "href") else {
                continue;
            };
            let kind = Url::parse(&url)
                .ok()
                .and_then(|u| AssetKind::from_path(u.path()));
            if let Some(kind) = kind {
                push(kind, url);
            }
        }

        assets
    }

    /// `img` sources, the first `picture > source` candidate and social
    /// preview images.
    pub fn images(&self) -> Vec<ScrapedImage> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for el in self.select("img[src]") {
            let Some(src) = self.resolve_attr(&el, "src") else {
                continue;
            };
            if seen.insert(src.clone()) {
                let attrs = el.value();
                images.push(ScrapedImage {
                    src,
                    alt: attrs.attr("alt").unwrap_or_default().trim().to_string(),
                    width: attrs.attr("width").and_then(parse_dimension),
                    height: attrs.attr("height").and_then(parse_dimension),
                });
            }
        }

        for el in self.select("picture > source[srcset]") {
            let first = el
                .value()
                .attr("srcset")
                .and_then(first_srcset_candidate)
                .and_then(|candidate| self.resolve(candidate));
            if let Some(src) = first {
                if seen.insert(src.clone()) {
                    images.push(ScrapedImage {
                        src,
                        alt: String::new(),
                        width: None,
                        height: None,
                    });
                }
            }
        }

        for el in self.select(r#"meta[property="og:image"], meta[name="twitter:image"]"#) {
            let Some(src) = self.resolve_attr(&el, "content") else {
                continue;
            };
            if seen.insert(src.clone()) {
                images.push(ScrapedImage {
                    src,
                    alt: String::new(),
                    width: None,
                    height: None,
                });
            }
        }

        images
    }

    /// Visible body text with whitespace collapsed; script and style
    /// contents are skipped.
    pub fn text(&self) -> String {
        let Some(body) = self.select("body").into_iter().next() else {
            return String::new();
        };

        let mut words: Vec<&str> = Vec::new();
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let parent = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()));
            if matches!(parent, Some("script" | "style" | "noscript" | "template")) {
                continue;
            }
            let text: &str = text;
            words.extend(text.split_whitespace());
        }
        words.join(" ")
    }

    fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(e) => {
                tracing::error!("Invalid selector {}: {:?}", css, e);
                Vec::new()
            }
        }
    }

    fn resolve_attr(&self, el: &ElementRef<'_>, attr: &str) -> Option<String> {
        el.value().attr(attr).and_then(|raw| self.resolve(raw))
    }

    /// Resolves `raw` against the base URL; `None` for empty, malformed or
    /// non-http(s) targets.
    fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let url = match &self.base {
            Some(base) => base.join(raw).ok()?,
            None => Url::parse(raw).ok()?,
        };
        matches!(url.scheme(), "http" | "https").then(|| url.to_string())
    }
}

fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
}

fn parse_dimension(raw: &str) -> Option<u32> {
    raw.trim().trim_end_matches("px").trim().parse().ok()
}
