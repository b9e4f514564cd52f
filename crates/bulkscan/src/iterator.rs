//! Buffered keyset iteration over a table
//!
//! [`BufferedRowIterator`] pulls fixed-size pages through a
//! [`PaginationContext`] and hands rows out one at a time. Each page query
//! resumes strictly after the key of the last row handed to the caller, so
//! rows are visited once, in ascending key order, without server-side cursors.
//!
//! The protocol mirrors a classic external iterator:
//!
//! ```rust,ignore
//! let mut rows = BufferedRowIterator::new(&conn, &mut ctx, 1000)?;
//! rows.rewind().await?;
//! while rows.has_more() {
//!     let row = rows.current()?;
//!     // ...
//!     rows.advance().await?;
//! }
//! ```

use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::connection::Connection;
use crate::context::PaginationContext;
use crate::error::{Error, Result};
use crate::types::Row;

/// Smallest accepted page size
pub const MIN_PAGE_SIZE: u32 = 1;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 1_000_000;

/// Lifecycle of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No page has been fetched yet, or the last fetch failed
    Unstarted,
    /// A non-empty page is buffered
    Active,
    /// A page fetch returned no rows
    Exhausted,
}

/// Fetch statistics for one iterator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStats {
    /// Page queries executed
    pub pages_fetched: u64,
    /// Rows returned by all page queries
    pub rows_fetched: u64,
    /// Page queries that returned no rows
    pub empty_pages: u64,
    /// Total time spent in page queries (milliseconds)
    pub total_fetch_time_ms: u64,
}

impl ScanStats {
    fn record_page(&mut self, rows: u64, duration: Duration) {
        self.pages_fetched += 1;
        self.rows_fetched += rows;
        self.total_fetch_time_ms += duration.as_millis() as u64;
        if rows == 0 {
            self.empty_pages += 1;
        }
    }

    /// Average rows per page query
    pub fn avg_rows_per_page(&self) -> f64 {
        if self.pages_fetched > 0 {
            self.rows_fetched as f64 / self.pages_fetched as f64
        } else {
            0.0
        }
    }
}

/// Validate a page size against `[MIN_PAGE_SIZE, MAX_PAGE_SIZE]`
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(Error::invalid_input(format!(
            "invalid page size provided, received {} (expected {}..={})",
            page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

/// Row iterator refilling an in-memory page through a pagination context
///
/// The context is mutably borrowed for the iterator's lifetime, so a context
/// can drive only one scan at a time.
pub struct BufferedRowIterator<'a> {
    source: &'a dyn Connection,
    context: &'a mut dyn PaginationContext,
    page_size: u32,
    position: u64,
    page: Vec<Row>,
    page_offset: usize,
    state: ScanState,
    stats: ScanStats,
}

impl<'a> BufferedRowIterator<'a> {
    /// Bind a row source and context with the given page size
    pub fn new(
        source: &'a dyn Connection,
        context: &'a mut dyn PaginationContext,
        page_size: u32,
    ) -> Result<Self> {
        validate_page_size(page_size)?;

        Ok(Self {
            source,
            context,
            page_size,
            position: 0,
            page: Vec::new(),
            page_offset: 0,
            state: ScanState::Unstarted,
            stats: ScanStats::default(),
        })
    }

    /// Restart the scan from the context's initial key and fetch the first page
    pub async fn rewind(&mut self) -> Result<()> {
        self.context.reset();
        self.position = 0;
        self.page_offset = 0;
        self.page.clear();
        self.state = ScanState::Unstarted;
        self.fetch_page().await
    }

    /// The row at the current position
    pub fn current(&self) -> Result<&Row> {
        match self.state {
            ScanState::Exhausted => Err(Error::illegal_state(
                "call to current after the end of data",
            )),
            ScanState::Unstarted => Err(Error::illegal_state("call to current before rewind")),
            ScanState::Active => self
                .page
                .get(self.page_offset)
                .ok_or_else(|| Error::illegal_state("page offset outside buffered page")),
        }
    }

    /// Move to the next row, refilling the page when the buffered one is used up
    pub async fn advance(&mut self) -> Result<()> {
        match self.state {
            ScanState::Exhausted => return Err(Error::out_of_range("read after end of data")),
            ScanState::Unstarted => {
                return Err(Error::illegal_state("call to advance before rewind"))
            }
            ScanState::Active => {}
        }

        self.position += 1;
        self.page_offset += 1;

        if self.page_offset >= self.page.len() {
            return self.fetch_page().await;
        }

        if let Err(e) = self.context.record_last_seen(&self.page[self.page_offset]) {
            self.state = ScanState::Unstarted;
            return Err(e);
        }
        Ok(())
    }

    /// 0-based ordinal of the current row within the scan
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the scan has not hit an empty page yet
    #[inline]
    pub fn has_more(&self) -> bool {
        self.state != ScanState::Exhausted
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Rows requested per page query
    #[inline]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch statistics since construction
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Consume the iterator as a stream of rows.
    ///
    /// The stream rewinds on first poll and ends after the first empty page.
    /// An error ends the stream.
    pub fn into_stream(self) -> BoxStream<'a, Result<Row>> {
        stream::try_unfold((self, false), |(mut rows, started)| async move {
            if started {
                rows.advance().await?;
            } else {
                rows.rewind().await?;
            }

            if !rows.has_more() {
                return Ok(None);
            }

            let row = rows.current()?.clone();
            Ok::<_, Error>(Some((row, (rows, true))))
        })
        .boxed()
    }

    async fn fetch_page(&mut self) -> Result<()> {
        // a failed fetch leaves the scan unusable until the next rewind
        self.state = ScanState::Unstarted;

        let sql = self.context.page_query(self.page_size)?;
        let start = Instant::now();
        let rows = self.source.query(&sql, &[]).await?;
        let elapsed = start.elapsed();

        self.stats.record_page(rows.len() as u64, elapsed);
        debug!(
            sql = %sql,
            rows = rows.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Fetched page"
        );

        self.page = rows;
        self.page_offset = 0;

        match self.page.first() {
            None => {
                trace!(position = self.position, "Scan exhausted");
                self.state = ScanState::Exhausted;
            }
            Some(first) => {
                self.context.record_last_seen(first)?;
                self.state = ScanState::Active;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for BufferedRowIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedRowIterator")
            .field("page_size", &self.page_size)
            .field("position", &self.position)
            .field("state", &self.state)
            .field("buffered", &self.page.len())
            .field("page_offset", &self.page_offset)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
