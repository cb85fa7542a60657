//! Initial page size from visible capacity.

/// Geometry used to estimate how many items fill the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConfig {
    /// Container widths at or above this get the multi-column grid (px).
    pub breakpoint: f64,
    /// Columns at or above the breakpoint.
    pub wide_columns: u32,
    /// Approximate card height including gap (px).
    pub card_height: f64,
    /// Rows requested beyond what is visible.
    pub buffer_rows: u32,
    /// Smallest page ever requested.
    pub min_page_size: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            breakpoint: 768.0,
            wide_columns: 3,
            card_height: 120.0,
            buffer_rows: 2,
            min_page_size: 24,
        }
    }
}

/// Container width and viewport height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeEstimate {
    pub columns: u32,
    pub rows: u32,
    /// Items needed to cover the viewport plus the buffer rows.
    pub needed: u32,
    /// Items to request for the first page.
    pub page_size: u32,
}

impl PageSizeEstimate {
    /// Whether a resident list of `len` items still leaves the viewport short.
    pub fn needs_more(&self, len: usize) -> bool {
        len < self.needed as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageSizeEstimator {
    config: ViewConfig,
}

impl PageSizeEstimator {
    pub fn new(config: ViewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn estimate(&self, viewport: Viewport) -> PageSizeEstimate {
        let cfg = &self.config;
        let width = sanitize(viewport.width);
        let height = sanitize(viewport.height);

        let columns = if width >= cfg.breakpoint {
            cfg.wide_columns.max(1)
        } else {
            1
        };

        let visible_rows = if cfg.card_height > 0.0 {
            (height / cfg.card_height).ceil().min(u32::MAX as f64) as u32
        } else {
            0
        };
        let rows = visible_rows.saturating_add(cfg.buffer_rows);
        let needed = columns.saturating_mul(rows);

        PageSizeEstimate {
            columns,
            rows,
            needed,
            page_size: needed.max(cfg.min_page_size).max(1),
        }
    }
}

/// Negative, NaN and infinite measurements count as zero.
fn sanitize(px: f64) -> f64 {
    if px.is_finite() && px > 0.0 { px } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(width: f64, height: f64) -> PageSizeEstimate {
        PageSizeEstimator::default().estimate(Viewport::new(width, height))
    }

    #[test]
    fn wide_container_uses_three_columns() {
        let e = estimate(1280.0, 1000.0);
        assert_eq!(e.columns, 3);
        // ceil(1000 / 120) = 9, plus 2 buffer rows.
        assert_eq!(e.rows, 11);
        assert_eq!(e.needed, 33);
        assert_eq!(e.page_size, 33);
    }

    #[test]
    fn breakpoint_is_inclusive() {
        assert_eq!(estimate(768.0, 600.0).columns, 3);
        assert_eq!(estimate(767.9, 600.0).columns, 1);
    }

    #[test]
    fn small_screens_still_request_the_minimum() {
        let e = estimate(375.0, 667.0);
        assert_eq!(e.columns, 1);
        assert_eq!(e.rows, 8);
        assert_eq!(e.needed, 8);
        assert_eq!(e.page_size, 24);
    }

    #[test]
    fn nonsense_geometry_falls_back_to_the_minimum() {
        for (w, h) in [(-1.0, -1.0), (f64::INFINITY, f64::INFINITY), (f64::NAN, f64::NAN)] {
            let e = estimate(w, h);
            assert_eq!(e.columns, 1);
            assert_eq!(e.rows, 2);
            assert_eq!(e.page_size, 24);
        }
    }

    #[test]
    fn nonsense_width_keeps_a_valid_height() {
        let e = estimate(f64::NAN, 800.0);
        assert_eq!(e.columns, 1);
        // ceil(800 / 120) = 7, plus 2 buffer rows.
        assert_eq!(e.rows, 9);
        assert_eq!(e.needed, 9);
        assert_eq!(e.page_size, 24);
    }

    #[test]
    fn needs_more_compares_against_visible_capacity() {
        let e = estimate(1280.0, 1000.0);
        assert!(e.needs_more(24));
        assert!(!e.needs_more(33));
        assert!(!e.needs_more(40));
    }
}
