pub mod row;

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::browser::{NavError, Navigator};
use crate::config::Settings;
use crate::records::RawRow;
use row::{harvest_page, PageHarvest, RowLayout};

/// Durable home for scraped rows.
pub trait RawStore {
    fn save_checkpoint(&mut self, page: u32, rows: &[RawRow]) -> Result<()>;
    fn save_final(&mut self, rows: &[RawRow]) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub max_pages: u32,
    pub checkpoint_every: u32,
    pub wait_timeout: Duration,
    pub row_selector: String,
    pub next_link_text: String,
    pub layout: RowLayout,
}

impl ScrapeOptions {
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            max_pages: s.max_pages,
            checkpoint_every: s.checkpoint_every,
            wait_timeout: s.wait_timeout(),
            row_selector: s.selectors.row.clone(),
            next_link_text: s.selectors.next_link_text.clone(),
            layout: RowLayout::from_selectors(&s.selectors),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No next-page link: the normal end of results.
    LastPage,
    /// A later page never showed any rows.
    NoRows,
    /// The next-page click did not replace the page in time.
    PageDidNotChange,
    PageLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub pages: u32,
    pub rows: usize,
    pub failed_rows: usize,
    pub excluded_rows: usize,
    pub stop: StopReason,
}

/// Rows gathered over the whole run.
#[derive(Debug, Default)]
struct Accumulator {
    rows: Vec<RawRow>,
    failed: usize,
    excluded: usize,
}

impl Accumulator {
    fn absorb(&mut self, page: PageHarvest) {
        self.failed += page.failures.len();
        self.excluded += page.excluded;
        self.rows.extend(page.rows);
    }
}

enum PageState<E> {
    AwaitingRows,
    ExtractingPage(Vec<E>),
    AwaitingNextPage(Vec<E>),
    Terminated(StopReason),
}

fn progress_bar(max_pages: u32) -> ProgressBar {
    let pb = ProgressBar::new(max_pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} pages ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

async fn drive<N: Navigator, S: RawStore>(
    nav: &mut N,
    store: &mut S,
    options: &ScrapeOptions,
    acc: &mut Accumulator,
) -> Result<(u32, StopReason), NavError> {
    let pb = progress_bar(options.max_pages);
    let mut page: u32 = 1;
    let mut state = PageState::AwaitingRows;

    let stop = loop {
        state = match state {
            PageState::AwaitingRows => {
                info!("Scraping page {}...", page);
                let found = match nav.wait_for_rows(&options.row_selector, options.wait_timeout).await {
                    Ok(()) => nav.find_rows(&options.row_selector).await,
                    Err(e) => Err(e),
                };
                match found {
                    Ok(rows) => PageState::ExtractingPage(rows),
                    Err(e) if page == 1 => {
                        pb.finish_and_clear();
                        error!("No results on the first page: {}", e);
                        return Err(e);
                    }
                    Err(e) => {
                        info!("No rows on page {}: {}", page, e);
                        PageState::Terminated(StopReason::NoRows)
                    }
                }
            }
            PageState::ExtractingPage(rows) => {
                let harvest = harvest_page(nav, &rows, &options.layout, page).await;
                acc.absorb(harvest);
                pb.inc(1);
                pb.set_message(format!("{} rows", acc.rows.len()));

                if options.checkpoint_every > 0 && page % options.checkpoint_every == 0 {
                    if let Err(e) = store.save_checkpoint(page, &acc.rows) {
                        warn!("Checkpoint at page {} failed: {:#}", page, e);
                    }
                }
                PageState::AwaitingNextPage(rows)
            }
            PageState::AwaitingNextPage(rows) => next_page(nav, options, &rows, &mut page).await,
            PageState::Terminated(reason) => break reason,
        };
    };

    pb.finish_and_clear();
    Ok((page, stop))
}

async fn next_page<N: Navigator>(
    nav: &mut N,
    options: &ScrapeOptions,
    rows: &[N::Element],
    page: &mut u32,
) -> PageState<N::Element> {
    if *page >= options.max_pages {
        info!("Reached the page limit ({})", options.max_pages);
        return PageState::Terminated(StopReason::PageLimit);
    }

    let link = match nav
        .find_link_by_text(&options.next_link_text, options.wait_timeout)
        .await
    {
        Ok(link) => link,
        Err(e) => {
            info!("Stopped scraping on page {}: {}", page, e);
            return PageState::Terminated(StopReason::LastPage);
        }
    };
    let Some(first_row) = rows.first() else {
        return PageState::Terminated(StopReason::NoRows);
    };

    if let Err(e) = nav.click(&link).await {
        warn!("Could not click {} on page {}: {}", options.next_link_text, page, e);
        return PageState::Terminated(StopReason::PageDidNotChange);
    }
    match nav.wait_until_stale(first_row, options.wait_timeout).await {
        Ok(()) => {
            info!("Page changed after clicking {} on page {}", options.next_link_text, page);
            *page += 1;
            PageState::AwaitingRows
        }
        Err(e) => {
            warn!("Page did not change after clicking {} on page {}: {}", options.next_link_text, page, e);
            PageState::Terminated(StopReason::PageDidNotChange)
        }
    }
}

/// Walk every results page, then close the session and save what was collected.
///
/// The navigator is closed whether or not the walk succeeds. A first page
/// with no rows is fatal and nothing is saved.
pub async fn scrape<N: Navigator, S: RawStore>(
    mut nav: N,
    store: &mut S,
    options: &ScrapeOptions,
) -> Result<ScrapeSummary> {
    let mut acc = Accumulator::default();
    let walked = drive(&mut nav, store, options, &mut acc).await;

    if let Err(e) = nav.quit().await {
        warn!("Failed to close navigation session: {}", e);
    }
    let (pages, stop) = walked?;

    store.save_final(&acc.rows)?;
    info!("Total records scraped: {}", acc.rows.len());

    Ok(ScrapeSummary {
        pages,
        rows: acc.rows.len(),
        failed_rows: acc.failed,
        excluded_rows: acc.excluded,
        stop,
    })
}

// ── Tests ──
