use crate::repository::query::Query;

/// Window into an entity's history, counted in records from the most recent
///
/// # Example
/// ```
/// use history_core_db::repository::pagination::PageRequest;
///
/// let latest = PageRequest::new(20, 0); // the 20 most recent changes
/// let older = PageRequest::for_page(20, 2); // changes 21 to 40
/// assert_eq!(older.offset, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of records to return
    pub limit: usize,
    /// Number of more recent records to skip
    pub offset: usize,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Arguments
    /// * `limit` - Maximum number of records to return
    /// * `offset` - Number of records to skip
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Create a page request for a 1-based page number
    ///
    /// # Arguments
    /// * `page_size` - Number of records per page
    /// * `page_number` - Page number; 0 is read as 1
    pub fn for_page(page_size: usize, page_number: usize) -> Self {
        let page_number = page_number.max(1);
        Self {
            limit: page_size,
            offset: (page_number - 1) * page_size,
        }
    }

    /// Restrict a query to this window
    ///
    /// # Example
    /// ```
    /// use history_core_db::repository::pagination::PageRequest;
    /// use history_core_db::repository::query::Query;
    ///
    /// let query = PageRequest::new(10, 30).apply(Query::new().order_by_desc("id"));
    /// assert_eq!((query.offset, query.limit), (30, Some(10)));
    /// ```
    pub fn apply(&self, query: Query) -> Query {
        query.skip(self.offset).take(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// One page of history records plus the entity's total record count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    /// Page holding `items`, fetched with `request` out of `total` records
    pub fn new(items: Vec<T>, total: usize, request: PageRequest) -> Self {
        Self {
            items,
            total,
            limit: request.limit,
            offset: request.offset,
        }
    }

    /// Whether older records remain past this page
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }

    /// 1-based page number
    pub fn page_number(&self) -> usize {
        match self.limit {
            0 => 1,
            limit => self.offset / limit + 1,
        }
    }

    pub fn total_pages(&self) -> usize {
        match self.limit {
            0 => 1,
            limit => self.total.div_ceil(limit),
        }
    }

    /// Convert every item, keeping the paging metadata; stops at the first error
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?,
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        })
    }
}
