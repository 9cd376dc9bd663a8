//! Incremental reveal of the category grid

use crate::models::{Category, Movie};

/// Items shown before any expansion (3 columns x 6 rows)
pub const INITIAL_LOAD: usize = 18;
/// Items added per expansion
pub const LOAD_MORE: usize = 12;
/// The sentinel counts as visible this far before it is on screen
pub const SENTINEL_MARGIN: f32 = 400.0;

/// Visibility observer bound to the sentinel below the grid.
///
/// Reports once per crossing into view, and again whenever it is re-bound
/// because the rendered count changed while the sentinel stays in view.
#[derive(Debug, Clone)]
pub struct SentinelObserver {
    margin: f32,
    was_visible: bool,
    bound_to: Option<usize>,
}

impl Default for SentinelObserver {
    fn default() -> Self {
        Self::new(SENTINEL_MARGIN)
    }
}

impl SentinelObserver {
    pub fn new(margin: f32) -> Self {
        Self {
            margin,
            was_visible: false,
            bound_to: None,
        }
    }

    /// Feed the latest layout. `sentinel_top` and `viewport_bottom` share one
    /// coordinate space. Returns true when a become-visible event fires.
    pub fn observe(&mut self, sentinel_top: f32, viewport_bottom: f32, rendered: usize) -> bool {
        let visible = sentinel_top <= viewport_bottom + self.margin;
        let rebound = self.bound_to != Some(rendered);
        let fire = visible && (!self.was_visible || rebound);

        self.was_visible = visible;
        self.bound_to = Some(rendered);
        fire
    }

    pub fn reset(&mut self) {
        self.was_visible = false;
        self.bound_to = None;
    }
}

/// One rendered slice of the category grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridPage {
    pub items: Vec<Movie>,
    /// Size of the full filtered list
    pub total: usize,
    /// Trailing "loading more" indicator
    pub show_loading_more: bool,
}

impl GridPage {
    pub fn slice(filtered: &[Movie], limit: usize) -> Self {
        let items: Vec<Movie> = filtered.iter().take(limit).cloned().collect();
        let shown = items.len();
        Self {
            items,
            total: filtered.len(),
            show_loading_more: shown > 0 && shown < filtered.len(),
        }
    }
}

/// Display-limit counter for the grid
#[derive(Debug, Clone)]
pub struct Pagination {
    limit: usize,
    category: Category,
    observer: SentinelObserver,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: INITIAL_LOAD,
            category: Category::All,
            observer: SentinelObserver::default(),
        }
    }
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Select a category; the limit starts over only when it actually changes
    pub fn set_category(&mut self, category: Category) -> bool {
        if self.category == category {
            return false;
        }
        log::debug!("Category {} -> {}, limit reset", self.category, category);
        self.category = category;
        self.limit = INITIAL_LOAD;
        self.observer.reset();
        true
    }

    /// Become-visible event from the sentinel. Grows while there is more to show.
    pub fn on_sentinel_visible(&mut self, rendered: usize, total: usize) -> bool {
        if rendered == 0 || rendered >= total {
            return false;
        }
        self.limit += LOAD_MORE;
        log::debug!("Grid limit -> {} ({} of {} rendered)", self.limit, rendered, total);
        true
    }

    /// Layout update: runs the observer and expands on a become-visible event
    pub fn on_layout(&mut self, sentinel_top: f32, viewport_bottom: f32, rendered: usize, total: usize) -> bool {
        if self.observer.observe(sentinel_top, viewport_bottom, rendered) {
            return self.on_sentinel_visible(rendered, total);
        }
        false
    }

    pub fn page(&self, filtered: &[Movie]) -> GridPage {
        GridPage::slice(filtered, self.limit)
    }
}
