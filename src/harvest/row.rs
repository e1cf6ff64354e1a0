use thiserror::Error;
use tracing::{info, warn};

use crate::browser::{Locator, NavError, Navigator};
use crate::config::Selectors;
use crate::parser::fields::{checked_text, split_gender_age, split_info, split_location, FieldError};
use crate::records::RawRow;

/// Rows carrying either marker are excluded from results.
pub const EXCLUSION_MARKERS: [&str; 2] = ["Disqualified", "Ineligible for Scoring"];

#[derive(Debug, Error)]
pub enum RowError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("field access failed: {0}")]
    Nav(#[from] NavError),
}

/// Where each field lives inside a result row.
#[derive(Debug, Clone)]
pub struct RowLayout {
    pub name: Locator,
    pub info: Locator,
    pub overall_place: Locator,
    pub gender_place: Locator,
    pub age_group_place: Locator,
    pub finish_time: Locator,
    pub pace: Locator,
}

impl RowLayout {
    pub fn from_selectors(s: &Selectors) -> Self {
        Self {
            name: Locator::Css(s.name.clone()),
            info: Locator::Css(s.info.clone()),
            overall_place: Locator::Column(s.overall_place_column),
            gender_place: Locator::Column(s.gender_place_column),
            age_group_place: Locator::Column(s.age_group_place_column),
            finish_time: Locator::Column(s.finish_time_column),
            pace: Locator::Column(s.pace_column),
        }
    }
}

/// Text pulled out of one rendered row, before any splitting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCells {
    pub name: String,
    pub info: String,
    pub overall_place: String,
    pub gender_place: String,
    pub age_group_place: String,
    pub finish_time: String,
    pub pace: String,
}

#[derive(Debug)]
pub enum RowScan {
    Excluded,
    Cells(RowCells),
}

pub fn is_excluded(markup: &str) -> bool {
    EXCLUSION_MARKERS.iter().any(|m| markup.contains(m))
}

pub async fn scan_row<N: Navigator>(
    nav: &mut N,
    row: &N::Element,
    layout: &RowLayout,
) -> Result<RowScan, NavError> {
    let markup = nav.inner_html(row).await?;
    if is_excluded(&markup) {
        return Ok(RowScan::Excluded);
    }
    Ok(RowScan::Cells(RowCells {
        name: nav.descendant_text(row, &layout.name).await?,
        info: nav.descendant_text(row, &layout.info).await?,
        overall_place: nav.descendant_text(row, &layout.overall_place).await?,
        gender_place: nav.descendant_text(row, &layout.gender_place).await?,
        age_group_place: nav.descendant_text(row, &layout.age_group_place).await?,
        finish_time: nav.descendant_text(row, &layout.finish_time).await?,
        pace: nav.descendant_text(row, &layout.pace).await?,
    }))
}

/// Split the compound cells into a `RawRow`. A missing segment fails the row.
pub fn build_row(cells: &RowCells) -> Result<RawRow, FieldError> {
    let info = split_info(&cells.info)?;
    let (gender, age) = split_gender_age(&info.gender_age)?;
    let location = split_location(&info.location)?;

    Ok(RawRow {
        name: checked_text(&cells.name),
        gender: checked_text(&gender),
        age: checked_text(&age),
        race: checked_text(&info.race),
        state: checked_text(&location.state),
        country: checked_text(&location.country),
        overall_place: checked_text(cells.overall_place.trim()),
        gender_place: checked_text(cells.gender_place.trim()),
        age_group_place: checked_text(cells.age_group_place.trim()),
        finish_time: checked_text(cells.finish_time.trim()),
        pace: checked_text(cells.pace.trim()),
    })
}

#[derive(Debug)]
pub struct RowFailure {
    pub page: u32,
    pub index: usize,
    pub error: RowError,
}

/// Everything one page produced: rows in encounter order plus what was left out.
#[derive(Debug, Default)]
pub struct PageHarvest {
    pub rows: Vec<RawRow>,
    pub failures: Vec<RowFailure>,
    pub excluded: usize,
}

impl PageHarvest {
    fn absorb(mut self, page: u32, index: usize, scan: Result<RowScan, NavError>) -> Self {
        let built = scan
            .map_err(RowError::from)
            .and_then(|scan| match scan {
                RowScan::Excluded => Ok(None),
                RowScan::Cells(cells) => build_row(&cells).map(Some).map_err(RowError::from),
            });
        match built {
            Ok(Some(row)) => self.rows.push(row),
            Ok(None) => {
                info!("Skipping row {}: Disqualified or Ineligible for Scoring", index);
                self.excluded += 1;
            }
            Err(error) => {
                warn!("Skipping row {} on page {} due to error: {}", index, page, error);
                self.failures.push(RowFailure { page, index, error });
            }
        }
        self
    }
}

/// Extract every row on the current page. A row that fails is logged and
/// dropped; the rest of the page still comes through.
pub async fn harvest_page<N: Navigator>(
    nav: &mut N,
    rows: &[N::Element],
    layout: &RowLayout,
    page: u32,
) -> PageHarvest {
    let mut scans = Vec::with_capacity(rows.len());
    for row in rows {
        scans.push(scan_row(nav, row, layout).await);
    }
    scans
        .into_iter()
        .enumerate()
        .fold(PageHarvest::default(), |acc, (index, scan)| {
            acc.absorb(page, index, scan)
        })
}

// ── Tests ──
