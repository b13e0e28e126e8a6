//! Client side windowing over a record list.
//!
//! [PagedFilteredList] keeps the full backing sequence, an optional case-insensitive
//! substring filter and the current page. It never talks to the catalog: the session feeds
//! it with whatever was fetched and reads [PageWindow]s back for rendering and selection.

/// A page sized slice of the filtered sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PageWindow<'a, T> {
    items: Vec<&'a T>,
    page: usize,
    total_pages: usize,
    filtered_len: usize,
}

impl<'a, T> PageWindow<'a, T> {
    #[inline]
    pub fn items(&self) -> &[&'a T] {
        &self.items
    }

    /// 1-based page number.
    #[inline]
    pub fn page(&self) -> usize {
        self.page
    }

    #[inline]
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Length of the filtered sequence the window was cut from.
    #[inline]
    pub fn filtered_len(&self) -> usize {
        self.filtered_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Item at 1-based position `k` inside this window.
    pub fn get(&self, k: usize) -> Option<&'a T> {
        k.checked_sub(1).and_then(|i| self.items.get(i).copied())
    }

    /// Replaces the page position, used when the pages live on the remote side.
    pub fn with_position(mut self, page: usize, total_pages: usize) -> Self {
        self.total_pages = total_pages.max(1);
        self.page = page.clamp(1, self.total_pages);
        self
    }
}

/// Backing sequence + filter + page cursor.
///
/// Invariant: `1 <= page <= total_pages`, with `total_pages = max(1, ceil(filtered / page_size))`.
pub struct PagedFilteredList<T> {
    items: Vec<T>,
    haystacks: Vec<String>,
    shown: Vec<usize>,
    filter: Option<String>,
    page: usize,
    page_size: usize,
    key: fn(&T) -> String,
}

impl<T> PagedFilteredList<T> {
    /// `key` produces the text the filter is matched against.
    pub fn new(page_size: usize, key: fn(&T) -> String) -> Self {
        Self {
            items: Vec::new(),
            haystacks: Vec::new(),
            shown: Vec::new(),
            filter: None,
            page: 1,
            page_size: page_size.max(1),
            key,
        }
    }

    pub fn with_items(page_size: usize, key: fn(&T) -> String, items: Vec<T>) -> Self {
        let mut list = Self::new(page_size, key);
        list.set_backing(items);
        list
    }

    // Getters / accessors

    #[inline]
    pub fn backing(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    #[inline]
    pub fn current_page(&self) -> usize {
        self.page
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn filtered_len(&self) -> usize {
        self.shown.len()
    }

    pub fn total_pages(&self) -> usize {
        self.shown.len().div_ceil(self.page_size).max(1)
    }

    /// Iterates the filtered sequence in backing order.
    pub fn filtered(&self) -> impl Iterator<Item = &T> {
        self.shown.iter().map(|&i| &self.items[i])
    }

    // Mutation

    /// Replaces the active filter and goes back to page 1.
    ///
    /// An empty or whitespace-only term clears the filter.
    pub fn set_filter(&mut self, term: Option<String>) {
        self.filter = term
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        self.refilter();
        self.page = 1;
    }

    /// Replaces the backing sequence, keeping the filter and clamping the page.
    pub fn set_backing(&mut self, items: Vec<T>) {
        self.haystacks = items.iter().map(|i| (self.key)(i).to_lowercase()).collect();
        self.items = items;
        self.refilter();
        self.clamp_page();
    }

    /// Clears the filter and returns to page 1.
    pub fn reset(&mut self) {
        self.set_filter(None);
    }

    /// Advances one page. Returns false at the last page.
    pub fn next(&mut self) -> bool {
        if self.page < self.total_pages() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Goes back one page. Returns false at page 1.
    pub fn prev(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    // Windows

    /// The current window.
    pub fn page(&self) -> PageWindow<'_, T> {
        let start = (self.page - 1) * self.page_size;
        let items = self
            .shown
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&i| &self.items[i])
            .collect();

        PageWindow {
            items,
            page: self.page,
            total_pages: self.total_pages(),
            filtered_len: self.shown.len(),
        }
    }

    /// Item at 1-based position `k` of the current window.
    pub fn select(&self, k: usize) -> Option<&T> {
        if k == 0 || k > self.page_size {
            return None;
        }
        let idx = (self.page - 1) * self.page_size + k - 1;
        self.shown.get(idx).map(|&i| &self.items[i])
    }

    fn refilter(&mut self) {
        self.shown = match &self.filter {
            None => (0..self.items.len()).collect(),
            Some(needle) => self
                .haystacks
                .iter()
                .enumerate()
                .filter(|(_, hay)| hay.contains(needle.as_str()))
                .map(|(i, _)| i)
                .collect(),
        };
    }

    fn clamp_page(&mut self) {
        self.page = self.page.clamp(1, self.total_pages());
    }
}
