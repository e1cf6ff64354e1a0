use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use super::{Locator, NavError, Navigator};
use crate::parser::fields::rendered_text;

/// Where page markup comes from.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Load the start page (`None`) or the target of a followed link.
    async fn load(&mut self, href: Option<&str>) -> Result<String, NavError>;
}

/// Live pages over HTTP. Link targets resolve against the last loaded URL.
pub struct HttpSource {
    client: reqwest::Client,
    current: Url,
}

impl HttpSource {
    pub fn new(start_url: &str) -> Result<Self, NavError> {
        let current = Url::parse(start_url).map_err(|e| NavError::Fetch(e.to_string()))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("race_results/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NavError::Fetch(e.to_string()))?;
        Ok(Self { client, current })
    }
}

impl PageSource for HttpSource {
    async fn load(&mut self, href: Option<&str>) -> Result<String, NavError> {
        let target = match href {
            Some(h) => self
                .current
                .join(h)
                .map_err(|e| NavError::Fetch(e.to_string()))?,
            None => self.current.clone(),
        };
        debug!("GET {}", target);
        let body = self
            .client
            .get(target.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| NavError::Fetch(e.to_string()))?
            .text()
            .await
            .map_err(|e| NavError::Fetch(e.to_string()))?;
        self.current = target;
        Ok(body)
    }
}

/// Captured result pages replayed in order; every followed link advances one page.
pub struct SnapshotSource {
    pages: VecDeque<String>,
}

impl SnapshotSource {
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self {
            pages: pages.into(),
        }
    }

    /// Load every `.html`/`.htm` file in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, NavError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("html") | Some("htm")
                )
            })
            .collect();
        paths.sort();
        let pages = paths
            .iter()
            .map(std::fs::read_to_string)
            .collect::<Result<Vec<_>, _>>()?;
        info!("Loaded {} captured pages from {:?}", pages.len(), dir);
        Ok(Self::from_pages(pages))
    }
}

impl PageSource for SnapshotSource {
    async fn load(&mut self, _href: Option<&str>) -> Result<String, NavError> {
        self.pages
            .pop_front()
            .ok_or_else(|| NavError::NotFound("captured page".to_string()))
    }
}

/// Handle to an element on a specific page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement {
    generation: u64,
    selector: String,
    index: usize,
}

/// Navigator over fully loaded documents.
///
/// A loaded document never changes, so presence checks answer immediately.
/// Clicking a link only records its target; the load happens inside
/// `wait_until_stale`, bounded by that wait's timeout, and bumps the page
/// generation so every older handle goes stale.
pub struct DomNavigator<S> {
    source: S,
    page: String,
    generation: u64,
    pending: Option<String>,
}

fn parse_selector(selector: &str) -> Result<Selector, NavError> {
    Selector::parse(selector).map_err(|_| NavError::Selector(selector.to_string()))
}

impl<S: PageSource> DomNavigator<S> {
    pub async fn open(mut source: S, timeout: Duration) -> Result<Self, NavError> {
        let page = tokio::time::timeout(timeout, source.load(None))
            .await
            .map_err(|_| NavError::Timeout(timeout, "start page".to_string()))??;
        Ok(Self {
            source,
            page,
            generation: 0,
            pending: None,
        })
    }

    fn count(&self, selector: &str) -> Result<usize, NavError> {
        let sel = parse_selector(selector)?;
        let doc = Html::parse_document(&self.page);
        let n = doc.select(&sel).count();
        Ok(n)
    }

    fn with_element<T>(
        &self,
        element: &DomElement,
        f: impl FnOnce(ElementRef<'_>) -> Result<T, NavError>,
    ) -> Result<T, NavError> {
        if element.generation != self.generation {
            return Err(NavError::StaleHandle);
        }
        let sel = parse_selector(&element.selector)?;
        let doc = Html::parse_document(&self.page);
        let found = doc
            .select(&sel)
            .nth(element.index)
            .ok_or_else(|| NavError::NotFound(element.selector.clone()))?;
        f(found)
    }

    fn handle(&self, selector: &str, index: usize) -> DomElement {
        DomElement {
            generation: self.generation,
            selector: selector.to_string(),
            index,
        }
    }
}

fn nth_column(row: ElementRef<'_>, n: usize) -> Option<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "td")
        .nth(n.checked_sub(1)?)
}

impl<S: PageSource> Navigator for DomNavigator<S> {
    type Element = DomElement;

    async fn wait_for_rows(&mut self, selector: &str, timeout: Duration) -> Result<(), NavError> {
        if self.count(selector)? > 0 {
            Ok(())
        } else {
            Err(NavError::Timeout(timeout, selector.to_string()))
        }
    }

    async fn find_rows(&mut self, selector: &str) -> Result<Vec<DomElement>, NavError> {
        let n = self.count(selector)?;
        Ok((0..n).map(|i| self.handle(selector, i)).collect())
    }

    async fn inner_html(&mut self, element: &DomElement) -> Result<String, NavError> {
        self.with_element(element, |e| Ok(e.inner_html()))
    }

    async fn descendant_text(
        &mut self,
        row: &DomElement,
        locator: &Locator,
    ) -> Result<String, NavError> {
        self.with_element(row, |e| {
            let found = match locator {
                Locator::Css(css) => e.select(&parse_selector(css)?).next(),
                Locator::Column(n) => nth_column(e, *n),
            };
            found
                .map(|d| rendered_text(d.text()))
                .ok_or_else(|| NavError::NotFound(locator.to_string()))
        })
    }

    async fn find_link_by_text(
        &mut self,
        text: &str,
        _timeout: Duration,
    ) -> Result<DomElement, NavError> {
        let sel = parse_selector("a")?;
        let index = {
            let doc = Html::parse_document(&self.page);
            let position = doc
                .select(&sel)
                .position(|a| rendered_text(a.text()) == text);
            position
        };
        index
            .map(|i| self.handle("a", i))
            .ok_or_else(|| NavError::NotFound(format!("link {:?}", text)))
    }

    async fn click(&mut self, element: &DomElement) -> Result<(), NavError> {
        let href = self.with_element(element, |e| {
            e.value()
                .attr("href")
                .map(str::to_string)
                .ok_or_else(|| NavError::NotFound("href".to_string()))
        })?;
        self.pending = Some(href);
        Ok(())
    }

    async fn wait_until_stale(
        &mut self,
        element: &DomElement,
        timeout: Duration,
    ) -> Result<(), NavError> {
        if element.generation != self.generation {
            return Ok(());
        }
        let Some(href) = self.pending.take() else {
            return Err(NavError::Timeout(timeout, "page change".to_string()));
        };
        let page = tokio::time::timeout(timeout, self.source.load(Some(&href)))
            .await
            .map_err(|_| NavError::Timeout(timeout, format!("page at {}", href)))??;
        self.page = page;
        self.generation += 1;
        Ok(())
    }

    async fn quit(self) -> Result<(), NavError> {
        debug!("Closing navigation session after {} page loads", self.generation + 1);
        Ok(())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: &str = "tr.cbResultSetDataRow";

    fn page(rows: &[(&str, &str)], next: bool) -> String {
        let body: String = rows
            .iter()
            .map(|(name, place)| {
                format!(
                    "<tr class=\"cbResultSetDataRow\"><td><div style=\"font-weight:bold\">{}</div></td><td> {} </td></tr>",
                    name, place
                )
            })
            .collect();
        let link = if next {
            "<a href=\"?page=2\">[Next &gt;&gt;]</a>"
        } else {
            ""
        };
        format!("<html><body><table>{}</table>{}</body></html>", body, link)
    }

    async fn open(pages: Vec<String>) -> DomNavigator<SnapshotSource> {
        DomNavigator::open(SnapshotSource::from_pages(pages), Duration::from_secs(10))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn finds_rows_and_cells() {
        let mut nav = open(vec![page(&[("Ann", "1"), ("Bea", "2")], true)]).await;
        nav.wait_for_rows(ROWS, Duration::from_secs(10)).await.unwrap();
        let rows = nav.find_rows(ROWS).await.unwrap();
        assert_eq!(rows.len(), 2);

        let name = nav
            .descendant_text(&rows[1], &Locator::Css("div[style*='font-weight:bold']".into()))
            .await
            .unwrap();
        assert_eq!(name, "Bea");
        let place = nav.descendant_text(&rows[1], &Locator::Column(2)).await.unwrap();
        assert_eq!(place, "2");
        assert!(matches!(
            nav.descendant_text(&rows[1], &Locator::Column(6)).await,
            Err(NavError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn no_rows_is_a_timeout() {
        let mut nav = open(vec![page(&[], false)]).await;
        assert!(matches!(
            nav.wait_for_rows(ROWS, Duration::from_secs(10)).await,
            Err(NavError::Timeout(..))
        ));
    }

    #[tokio::test]
    async fn click_then_old_rows_go_stale() {
        let mut nav = open(vec![
            page(&[("Ann", "1")], true),
            page(&[("Cal", "3")], false),
        ])
        .await;
        let rows = nav.find_rows(ROWS).await.unwrap();
        let next = nav
            .find_link_by_text("[Next >>]", Duration::from_secs(10))
            .await
            .unwrap();
        nav.click(&next).await.unwrap();
        nav.wait_until_stale(&rows[0], Duration::from_secs(10))
            .await
            .unwrap();

        assert!(matches!(
            nav.inner_html(&rows[0]).await,
            Err(NavError::StaleHandle)
        ));
        let rows = nav.find_rows(ROWS).await.unwrap();
        let name = nav.descendant_text(&rows[0], &Locator::Column(1)).await.unwrap();
        assert_eq!(name, "Cal");
        assert!(nav
            .find_link_by_text("[Next >>]", Duration::from_secs(10))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn staleness_without_click_times_out() {
        let mut nav = open(vec![page(&[("Ann", "1")], true)]).await;
        let rows = nav.find_rows(ROWS).await.unwrap();
        assert!(matches!(
            nav.wait_until_stale(&rows[0], Duration::from_secs(10)).await,
            Err(NavError::Timeout(..))
        ));
    }

    struct SlowSource;

    impl PageSource for SlowSource {
        async fn load(&mut self, href: Option<&str>) -> Result<String, NavError> {
            if href.is_some() {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(page(&[("Ann", "1")], true))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_page_load_hits_the_staleness_bound() {
        let mut nav = DomNavigator::open(SlowSource, Duration::from_secs(10))
            .await
            .unwrap();
        let rows = nav.find_rows(ROWS).await.unwrap();
        let next = nav
            .find_link_by_text("[Next >>]", Duration::from_secs(10))
            .await
            .unwrap();
        nav.click(&next).await.unwrap();
        let err = nav
            .wait_until_stale(&rows[0], Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, NavError::Timeout(..)));
    }

    #[test]
    fn snapshot_dir_is_read_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p002.html"), "two").unwrap();
        std::fs::write(dir.path().join("p001.html"), "one").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        let source = SnapshotSource::from_dir(dir.path()).unwrap();
        assert_eq!(source.pages, vec!["one".to_string(), "two".to_string()]);
    }
}
