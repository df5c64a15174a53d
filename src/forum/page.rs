//! Discussion page scraping (single thread URL → thread record).
//!
//! Extraction is anchored on the forum software's fixed page structure. A
//! page missing the primary anchors is a layout mismatch and yields no
//! record; that is tolerated, not fatal.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::parse_site_timestamp;
use crate::db::NewThread;

/// Parse a fetched discussion page into a thread record.
///
/// Returns `None` when the page does not carry the expected discussion
/// structure. Missing secondary fields degrade to empty strings; an
/// unparseable timestamp degrades to `now`.
#[must_use]
pub fn parse_thread_page(html: &str, url: &str, now: DateTime<Utc>) -> Option<NewThread> {
    let document = Html::parse_document(html);

    let header_selector =
        Selector::parse("div.Item-Header.DiscussionHeader").expect("valid selector");
    let title_selector = Selector::parse("#Item_0.PageTitle").expect("valid selector");

    let Some(header) = document.select(&header_selector).next() else {
        debug!(url, "page structure mismatch: no discussion header");
        return None;
    };
    let Some(page_title) = document.select(&title_selector).next() else {
        debug!(url, "page structure mismatch: no page title");
        return None;
    };

    let h1_selector = Selector::parse("h1").expect("valid selector");
    let title = page_title
        .select(&h1_selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let creator_selector = Selector::parse(".Author .Username").expect("valid selector");
    let creator = header
        .select(&creator_selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let time_selector = Selector::parse("time").expect("valid selector");
    let pub_date = header
        .select(&time_selector)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .and_then(parse_site_timestamp)
        .unwrap_or(now);

    let category_selector = Selector::parse(".Category a").expect("valid selector");
    let category = header
        .select(&category_selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let body_selector = Selector::parse(".Message.userContent").expect("valid selector");
    let description = document
        .select(&body_selector)
        .next()
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let domain = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_default();

    Some(NewThread {
        domain,
        category,
        title,
        link: url.to_string(),
        description,
        creator,
        pub_date,
        created_at: now,
    })
}

fn element_text(element: &scraper::ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DISCUSSION_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <div id="Item_0" class="PageTitle">
    <h1>Big Storage Deal</h1>
  </div>
  <div class="Item-Header DiscussionHeader">
    <div class="AuthorWrap">
      <span class="Author"><a class="Username" href="/profile/seller">seller</a></span>
    </div>
    <div class="Meta">
      <span class="MItem Category">in <a href="/categories/offers">Offers</a></span>
      <time datetime="2024-03-01T08:15:30+00:00">Mar 1</time>
    </div>
  </div>
  <div class="Message userContent">
    <p>First line of the offer.</p>
    <p>Second line.</p>
  </div>
</body></html>"#;

    #[test]
    fn test_parse_thread_page() {
        let now = Utc::now();
        let thread =
            parse_thread_page(DISCUSSION_PAGE, "https://lowendtalk.com/discussion/1", now)
                .expect("page should parse");

        assert_eq!(thread.domain, "lowendtalk.com");
        assert_eq!(thread.title, "Big Storage Deal");
        assert_eq!(thread.creator, "seller");
        assert_eq!(thread.category, "Offers");
        assert_eq!(thread.description, "First line of the offer.\nSecond line.");
        assert_eq!(thread.link, "https://lowendtalk.com/discussion/1");
        assert_eq!(
            thread.pub_date,
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 30).unwrap()
        );
        assert_eq!(thread.created_at, now);
    }

    #[test]
    fn test_parse_thread_page_structure_mismatch() {
        let html = "<html><body><h1>Some other site</h1></body></html>";
        assert!(parse_thread_page(html, "https://example.com/x", Utc::now()).is_none());
    }

    #[test]
    fn test_parse_thread_page_missing_title_anchor() {
        // Header present but no #Item_0 PageTitle: still a mismatch.
        let html = r#"<html><body>
          <div class="Item-Header DiscussionHeader"></div>
        </body></html>"#;
        assert!(parse_thread_page(html, "https://example.com/x", Utc::now()).is_none());
    }

    #[test]
    fn test_parse_thread_page_bad_timestamp_falls_back() {
        let html = DISCUSSION_PAGE.replace("2024-03-01T08:15:30+00:00", "yesterday-ish");
        let now = Utc::now();
        let thread = parse_thread_page(&html, "https://lowendtalk.com/discussion/1", now)
            .expect("page should parse");
        assert_eq!(thread.pub_date, now);
    }
}
