//! # Page Break Decisions
//!
//! Rows of cards are unbreakable: a row either fits below the cursor or the
//! whole row moves to the next page. The decision is made once per row,
//! before any card of the row is placed.

/// What to do with the next row of cards.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the row on the current page.
    Place,
    /// Open a new page and place the row at its top.
    MoveToNextPage,
}

/// Decide whether a row of `row_height` fits at `cursor_y`.
///
/// A row needs its own height plus the gap that follows it above
/// `page_bottom`. A row that does not fit is still placed when moving it
/// cannot help: the page has no rows yet and the cursor is already at
/// `page_top`, or the row would not fit on an empty page either.
pub fn decide_row_break(
    cursor_y: f64,
    row_height: f64,
    gap: f64,
    page_top: f64,
    page_bottom: f64,
    rows_on_page: usize,
) -> BreakDecision {
    if cursor_y + row_height + gap <= page_bottom {
        return BreakDecision::Place;
    }

    if rows_on_page == 0 {
        let at_top = cursor_y <= page_top;
        let fits_empty_page = page_top + row_height + gap <= page_bottom;
        if at_top || !fits_empty_page {
            return BreakDecision::Place;
        }
    }

    BreakDecision::MoveToNextPage
}
