use crate::rss_utils::time;
use crate::traits::{Fetch, SourceAdapter};
use crate::types::{FeedDescriptor, Item, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, warn};

/// Tag added to every item produced from a news sitemap.
pub const BRAND_TAG: &str = "Reuters";
/// How many of the most recently modified child sitemaps are read per run.
pub const MAX_CHILD_SITEMAPS: usize = 6;

/// One `<sitemap>` entry of a sitemap index.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapRef {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
}

/// One `<url>` entry of a news sitemap, fields as found in the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsUrl {
    pub loc: Option<String>,
    pub title: Option<String>,
    pub publication_date: Option<String>,
}

/// Source that walks a Google News sitemap index instead of a syndication
/// feed. Publishers such as Reuters only expose titles and dates this way.
#[derive(Debug, Clone)]
pub struct NewsSitemapSource {
    max_children: usize,
    brand_tag: String,
}

impl Default for NewsSitemapSource {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsSitemapSource {
    pub fn new() -> Self {
        Self {
            max_children: MAX_CHILD_SITEMAPS,
            brand_tag: BRAND_TAG.to_string(),
        }
    }

    pub fn with_max_children(mut self, max_children: usize) -> Self {
        self.max_children = max_children;
        self
    }

    /// Converts one sitemap entry; entries missing a link or a title are dropped.
    pub fn entry_to_item(&self, feed: &FeedDescriptor, entry: NewsUrl) -> Option<Item> {
        let (loc, title) = match (entry.loc, entry.title) {
            (Some(loc), Some(title)) => (loc, title),
            (loc, _) => {
                debug!("Skipping sitemap entry without link or title: {:?}", loc);
                return None;
            }
        };

        let published = entry
            .publication_date
            .as_deref()
            .and_then(time::parse_date_text);

        Some(Item::from_unescaped(feed, &loc, &title, "", published).with_extra_tag(&self.brand_tag))
    }
}

#[async_trait]
impl SourceAdapter for NewsSitemapSource {
    fn adapter_name(&self) -> &'static str {
        "news_sitemap"
    }

    async fn collect(
        &self,
        feed: &FeedDescriptor,
        fetcher: &dyn Fetch,
        max_items: usize,
    ) -> Result<Vec<Item>> {
        info!("Pulling sitemap index {}: {}", feed.id, feed.url);

        let index_xml = fetcher.fetch_text(&feed.url, fetcher.feed_timeout()).await?;
        let children = select_recent_children(parse_sitemap_index(&index_xml)?, self.max_children);

        let mut items = Vec::new();
        for child in children {
            if items.len() >= max_items {
                break;
            }

            let child_xml = match fetcher.fetch_text(&child.loc, fetcher.child_timeout()).await {
                Ok(xml) => xml,
                Err(e) => {
                    warn!("Skipping child sitemap {} of {}: {}", child.loc, feed.id, e);
                    continue;
                }
            };
            let entries = match parse_news_sitemap(&child_xml) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping unreadable child sitemap {} of {}: {}", child.loc, feed.id, e);
                    continue;
                }
            };

            for entry in entries {
                if let Some(item) = self.entry_to_item(feed, entry) {
                    items.push(item);
                    if items.len() >= max_items {
                        break;
                    }
                }
            }
        }

        info!("Sitemap {}: collected {} items", feed.id, items.len());
        Ok(items)
    }
}

/// Newest first by `lastmod`; children without one sort last. Ties keep
/// document order.
pub fn select_recent_children(mut children: Vec<SitemapRef>, limit: usize) -> Vec<SitemapRef> {
    children.sort_by(|a, b| {
        let a_time = a.lastmod.unwrap_or_else(time::epoch);
        let b_time = b.lastmod.unwrap_or_else(time::epoch);
        b_time.cmp(&a_time)
    });
    children.truncate(limit);
    children
}

pub fn parse_sitemap_index(xml: &str) -> Result<Vec<SitemapRef>> {
    let mut refs = Vec::new();
    let mut loc: Option<String> = None;
    let mut lastmod: Option<DateTime<Utc>> = None;

    walk_elements(xml, |parent, name, text| match (parent, name) {
        ("sitemap", "loc") => loc = non_empty(text),
        ("sitemap", "lastmod") => lastmod = time::parse_date_text(text),
        (_, "sitemap") => {
            if let Some(loc) = loc.take() {
                refs.push(SitemapRef {
                    loc,
                    lastmod: lastmod.take(),
                });
            }
            lastmod = None;
        }
        _ => {}
    })?;

    Ok(refs)
}

pub fn parse_news_sitemap(xml: &str) -> Result<Vec<NewsUrl>> {
    let mut urls = Vec::new();
    let mut current = NewsUrl::default();

    walk_elements(xml, |parent, name, text| match (parent, name) {
        ("url", "loc") => current.loc = non_empty(text),
        ("news", "title") => current.title = non_empty(text),
        ("news", "publication_date") => current.publication_date = non_empty(text),
        (_, "url") => urls.push(std::mem::take(&mut current)),
        _ => {}
    })?;

    Ok(urls)
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Streams `xml` and calls `on_close(parent, name, text)` for every closing
/// element, with local (prefix-free) names and the element's own text.
fn walk_elements<F>(xml: &str, mut on_close: F) -> Result<()>
where
    F: FnMut(&str, &str, &str),
{
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                text.clear();
            }
            Event::Text(t) => match t.unescape() {
                Ok(value) => text.push_str(&value),
                Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
            },
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::End(_) => {
                if let Some(name) = stack.pop() {
                    let parent = stack.last().map(String::as_str).unwrap_or("");
                    on_close(parent, &name, &text);
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://news.example/sitemap-1.xml</loc><lastmod>2024-05-01T10:00:00Z</lastmod></sitemap>
  <sitemap><loc>https://news.example/sitemap-undated.xml</loc></sitemap>
  <sitemap><lastmod>2024-05-03T10:00:00Z</lastmod></sitemap>
  <sitemap><loc>https://news.example/sitemap-2.xml</loc><lastmod>2024-05-02T10:00:00Z</lastmod></sitemap>
</sitemapindex>"#;

    const CHILD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:news="http://www.google.com/schemas/sitemap-news/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url>
    <loc>https://news.example/world/story-one</loc>
    <image:image><image:loc>https://img.example/1.jpg</image:loc></image:image>
    <news:news>
      <news:publication><news:name>Example</news:name></news:publication>
      <news:publication_date>2024-05-02T09:30:00+00:00</news:publication_date>
      <news:title>Markets &amp; rates</news:title>
    </news:news>
  </url>
  <url>
    <loc>https://news.example/world/untitled</loc>
  </url>
</urlset>"#;

    #[test]
    fn index_skips_children_without_loc() {
        let refs = parse_sitemap_index(INDEX).unwrap();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[1].loc, "https://news.example/sitemap-undated.xml");
        assert_eq!(refs[1].lastmod, None);
    }

    #[test]
    fn children_sorted_newest_first_undated_last() {
        let refs = select_recent_children(parse_sitemap_index(INDEX).unwrap(), 6);
        let locs: Vec<&str> = refs.iter().map(|r| r.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec![
                "https://news.example/sitemap-2.xml",
                "https://news.example/sitemap-1.xml",
                "https://news.example/sitemap-undated.xml",
            ]
        );
        assert_eq!(select_recent_children(refs, 1).len(), 1);
    }

    #[test]
    fn news_sitemap_extracts_namespaced_fields() {
        let urls = parse_news_sitemap(CHILD).unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].loc.as_deref(), Some("https://news.example/world/story-one"));
        assert_eq!(urls[0].title.as_deref(), Some("Markets & rates"));
        assert_eq!(
            urls[0].publication_date.as_deref(),
            Some("2024-05-02T09:30:00+00:00")
        );
        assert_eq!(urls[1].title, None);
    }

    #[test]
    fn entries_without_title_are_dropped_and_brand_tag_added() {
        let feed = FeedDescriptor::new(
            "reuters",
            "Reuters",
            "https://news.example/index.xml",
            crate::types::FeedKind::NewsSitemapIndex,
        )
        .with_tags(&["World", "Reuters"]);
        let source = NewsSitemapSource::new();

        let items: Vec<Item> = parse_news_sitemap(CHILD)
            .unwrap()
            .into_iter()
            .filter_map(|entry| source.entry_to_item(&feed, entry))
            .collect();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tags, vec!["World".to_string(), "Reuters".to_string()]);
        assert_eq!(items[0].summary, "");
        assert_eq!(
            items[0].published,
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn sitemap_titles_are_decoded_once() {
        let xml = r#"<urlset xmlns:news="http://www.google.com/schemas/sitemap-news/0.9">
  <url><loc>https://news.example/att</loc><news:news><news:title>AT&amp;amp;T &amp; partners</news:title></news:news></url>
</urlset>"#;
        let feed = FeedDescriptor::new(
            "reuters",
            "Reuters",
            "https://news.example/index.xml",
            crate::types::FeedKind::NewsSitemapIndex,
        );

        let entry = parse_news_sitemap(xml).unwrap().remove(0);
        let item = NewsSitemapSource::new().entry_to_item(&feed, entry).unwrap();
        assert_eq!(item.title, "AT&amp;T & partners");
    }

    #[test]
    fn broken_xml_is_an_error() {
        assert!(parse_sitemap_index("<sitemapindex><sitemap></sitemapindex>").is_err());
    }
}
