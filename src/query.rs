//! Filter/query building.
//!
//! A bounded parameter set translates into a predicate, an ordering, and a
//! page spec consumed by the repository abstraction. Absent filters are
//! no-ops, never errors. Ordering is by creation timestamp with an id
//! tie-break so pagination stays stable across pages.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::record::{Record, RecordStatus};
use crate::records::transaction::{Transaction, TransactionStatus};

/// Requested sort direction over the creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 25;

    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
        }
        .normalized()
    }

    /// A page size of zero normalizes to the default rather than erroring.
    pub fn normalized(self) -> Self {
        Self {
            page_number: self.page_number,
            page_size: if self.page_size == 0 {
                Self::DEFAULT_PAGE_SIZE
            } else {
                self.page_size
            },
        }
    }

    fn offset(&self) -> usize {
        self.page_number as usize * self.page_size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 0,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn empty(page: PageRequest) -> Self {
        let page = page.normalized();
        Self {
            items: Vec::new(),
            total_elements: 0,
            page_number: page.page_number,
            page_size: page.page_size,
        }
    }

    /// Map the items, keeping the paging envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}

/// Slice a sorted result set into the requested page.
pub fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let page = page.normalized();
    let total_elements = items.len() as u64;
    let items: Vec<T> = items
        .into_iter()
        .skip(page.offset())
        .take(page.page_size as usize)
        .collect();
    Page {
        items,
        total_elements,
        page_number: page.page_number,
        page_size: page.page_size,
    }
}

fn compare_by_created_at(
    a_created: DateTime<Utc>,
    a_id: Uuid,
    b_created: DateTime<Utc>,
    b_id: Uuid,
    sort: SortOrder,
) -> Ordering {
    let ordering = match sort {
        SortOrder::Ascending => a_created.cmp(&b_created),
        SortOrder::Descending => b_created.cmp(&a_created),
    };
    // Tie-break by id so pagination is stable across pages.
    ordering.then_with(|| a_id.cmp(&b_id))
}

/// Bounded filter set for record queries.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub status: Option<RecordStatus>,
    pub record_definition_key: Option<String>,
    pub external_id: Option<String>,
    pub transaction_id: Option<Uuid>,
    pub sort: SortOrder,
    pub page: PageRequest,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_record_definition_key(mut self, key: impl Into<String>) -> Self {
        self.record_definition_key = Some(key.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_transaction_id(mut self, transaction_id: Uuid) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn paged(mut self, page_number: u32, page_size: u32) -> Self {
        self.page = PageRequest::new(page_number, page_size);
        self
    }

    /// The predicate: does a record match every present filter?
    ///
    /// Status matches against the effective status at `now`, so filtering
    /// for expired records finds derived expirations.
    pub fn matches(&self, record: &Record, now: DateTime<Utc>) -> bool {
        if let Some(status) = self.status {
            if record.effective_status(now) != status {
                return false;
            }
        }
        if let Some(key) = &self.record_definition_key {
            if &record.record_definition_key != key {
                return false;
            }
        }
        if let Some(external_id) = &self.external_id {
            if record.external_id.as_deref() != Some(external_id.as_str()) {
                return false;
            }
        }
        if let Some(transaction_id) = self.transaction_id {
            if record.created_from != Some(transaction_id) {
                return false;
            }
        }
        true
    }

    /// The ordering for this query.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        compare_by_created_at(a.created_at, a.id, b.created_at, b.id, self.sort)
    }
}

/// Bounded filter set for transaction queries.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub status: Option<TransactionStatus>,
    pub transaction_definition_key: Option<String>,
    pub process_instance_id: Option<String>,
    pub sort: SortOrder,
    pub page: PageRequest,
}

impl TransactionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_transaction_definition_key(mut self, key: impl Into<String>) -> Self {
        self.transaction_definition_key = Some(key.into());
        self
    }

    pub fn with_process_instance_id(mut self, id: impl Into<String>) -> Self {
        self.process_instance_id = Some(id.into());
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn paged(mut self, page_number: u32, page_size: u32) -> Self {
        self.page = PageRequest::new(page_number, page_size);
        self
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(status) = self.status {
            if transaction.status != status {
                return false;
            }
        }
        if let Some(key) = &self.transaction_definition_key {
            if &transaction.transaction_definition_key != key {
                return false;
            }
        }
        if let Some(process_instance_id) = &self.process_instance_id {
            if transaction.process_instance_id.as_deref() != Some(process_instance_id.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        compare_by_created_at(a.created_at, a.id, b.created_at, b.id, self.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_and_normalization() {
        let page = PageRequest::default();
        assert_eq!(page.page_number, 0);
        assert_eq!(page.page_size, PageRequest::DEFAULT_PAGE_SIZE);

        let page = PageRequest::new(3, 0);
        assert_eq!(page.page_size, PageRequest::DEFAULT_PAGE_SIZE);
        assert_eq!(page.page_number, 3);
    }

    #[test]
    fn paginate_empty_collection() {
        let page = paginate(Vec::<u32>::new(), PageRequest::new(0, 2));
        assert!(page.items.is_empty());
        assert_eq!(page.total_elements, 0);
        assert_eq!(page.page_number, 0);
        assert_eq!(page.page_size, 2);
    }

    #[test]
    fn paginate_slices_and_counts() {
        let page = paginate((0..7).collect::<Vec<u32>>(), PageRequest::new(1, 3));
        assert_eq!(page.items, vec![3, 4, 5]);
        assert_eq!(page.total_elements, 7);

        let past_end = paginate((0..7).collect::<Vec<u32>>(), PageRequest::new(5, 3));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_elements, 7);
    }

    #[test]
    fn page_map_keeps_envelope() {
        let page = paginate(vec![1, 2, 3], PageRequest::new(0, 2)).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total_elements, 3);
    }
}
