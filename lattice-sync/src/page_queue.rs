//! Page-pool staging queue for burst-fill / burst-drain workloads.
//!
//! Rather than moving items one at a time through a shared ring, producers
//! and consumers each take exclusive ownership of a whole *page* (a vector
//! of items) and work on it linearly, with no cache-line traffic from
//! other threads. A page is in one of three states:
//!
//! ```text
//!            producer acquire                consumer acquire
//!   Empty ───────────────────► InUse   Available ───────────► InUse
//!     ▲                          │                              │
//!     │   released empty         │     released with data       │
//!     └──────────────────────────┴──────────────◄───────────────┘
//! ```
//!
//! State transitions are single CAS operations; the reader/writer lock
//! guards only the page-list topology (appending a page when none was
//! acquirable).

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_utils::CachePadded;
use parking_lot::RwLock;

/// Page is free and holds no data; producers take these first.
const EMPTY: u8 = 0;
/// Page holds data for a consumer.
const AVAILABLE: u8 = 1;
/// Page is owned by exactly one producer or consumer handle.
const IN_USE: u8 = 2;

struct Page<T> {
    data: UnsafeCell<Vec<T>>,
    /// Padded: acquisition scans poll every page's state while the owner
    /// mutates the vector header next to it.
    state: CachePadded<AtomicU8>,
}

// Safety: access to `data` is serialized by the page state machine — only
// the single handle that CASed the page to InUse touches it.
unsafe impl<T: Send> Sync for Page<T> {}

impl<T> Page<T> {
    fn new(state: u8, capacity: usize) -> Box<Self> {
        Box::new(Self {
            data: UnsafeCell::new(Vec::with_capacity(capacity)),
            state: CachePadded::new(AtomicU8::new(state)),
        })
    }
}

/// A multi-producer multi-consumer staging queue built on a pool of pages.
///
/// Any number of producer and consumer handles may be live concurrently;
/// each owns its page exclusively. Elements keep their order within a
/// page; there is no ordering across pages.
///
/// # Example
///
/// ```
/// use lattice_sync::PageQueue;
///
/// let queue: PageQueue<u32> = PageQueue::new();
///
/// let mut producer = queue.acquire_producer();
/// producer.data_mut().extend([1, 2, 3]);
/// drop(producer); // page becomes Available
///
/// let consumer = queue.acquire_consumer().unwrap();
/// assert_eq!(consumer.data(), &[1, 2, 3]);
/// ```
pub struct PageQueue<T> {
    pages: RwLock<Vec<Box<Page<T>>>>,
}

impl<T> PageQueue<T> {
    /// Creates a queue with no pages; the first producer allocates one.
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(Vec::new()),
        }
    }

    /// Creates a queue pre-populated with `page_count` empty pages, each
    /// with room for `page_size` elements.
    pub fn with_pages(page_count: usize, page_size: usize) -> Self {
        let pages = (0..page_count)
            .map(|_| Page::new(EMPTY, page_size))
            .collect();
        Self {
            pages: RwLock::new(pages),
        }
    }

    /// Acquires a page for producing. Never fails: when no `Empty` or
    /// `Available` page can be claimed, a fresh page is appended under the
    /// writer lock.
    pub fn acquire_producer(&self) -> PageProducer<'_, T> {
        {
            let pages = self.pages.read();
            // Empty pages are taken in priority so available data keeps
            // flowing to consumers.
            for state in [EMPTY, AVAILABLE] {
                for page in pages.iter() {
                    if page
                        .state
                        .compare_exchange(state, IN_USE, Ordering::Acquire, Ordering::Relaxed)
                        .is_ok()
                    {
                        return PageProducer {
                            page: Some(NonNull::from(&**page)),
                            _queue: PhantomData,
                        };
                    }
                }
            }
        }

        let mut pages = self.pages.write();
        pages.push(Page::new(IN_USE, 0));
        let page = NonNull::from(&**pages.last().unwrap());
        PageProducer {
            page: Some(page),
            _queue: PhantomData,
        }
    }

    /// Tries to acquire a page holding data. Returns `None` when no
    /// `Available` page exists at this instant.
    pub fn acquire_consumer(&self) -> Option<PageConsumer<'_, T>> {
        let pages = self.pages.read();
        for page in pages.iter() {
            if page
                .state
                .compare_exchange(AVAILABLE, IN_USE, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return Some(PageConsumer {
                    page: Some(NonNull::from(&**page)),
                    _queue: PhantomData,
                });
            }
        }
        None
    }

    /// Number of pages currently pooled.
    pub fn page_count(&self) -> usize {
        self.pages.read().len()
    }

    /// Destroys every page. Exclusive access is enforced by `&mut`.
    pub fn clear(&mut self) {
        self.pages.get_mut().clear();
    }

    /// Destroys every page and returns the pool allocation.
    pub fn release_all_memory(&mut self) {
        let pages = self.pages.get_mut();
        pages.clear();
        pages.shrink_to_fit();
    }
}

impl<T> Default for PageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PageQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageQueue")
            .field("pages", &self.page_count())
            .finish_non_exhaustive()
    }
}

/// Exclusive producer access to one page.
///
/// On drop the page is released as `Empty` if nothing was written, else
/// `Available` for a consumer to claim.
pub struct PageProducer<'a, T> {
    page: Option<NonNull<Page<T>>>,
    _queue: PhantomData<&'a PageQueue<T>>,
}

// Safety: the handle owns its page exclusively until release.
unsafe impl<T: Send> Send for PageProducer<'_, T> {}

impl<T> PageProducer<'_, T> {
    /// The page's element container.
    pub fn data(&self) -> &Vec<T> {
        // Safety: this handle holds the page InUse, so access is exclusive.
        unsafe { &*self.page().data.get() }
    }

    /// The page's element container, for direct mutation.
    pub fn data_mut(&mut self) -> &mut Vec<T> {
        // Safety: this handle holds the page InUse, so access is exclusive.
        unsafe { &mut *self.page().data.get() }
    }

    /// Appends one element to the page.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.data_mut().push(value);
    }

    /// Releases the page explicitly (the destructor does the same).
    pub fn release(mut self) {
        self.release_page();
    }

    fn page(&self) -> &Page<T> {
        // Safety: the pointer targets a boxed page kept alive by the
        // queue borrow in `_queue`.
        unsafe { self.page.expect("handle already released").as_ref() }
    }

    fn release_page(&mut self) {
        if let Some(page) = self.page.take() {
            let page = unsafe { page.as_ref() };
            let state = if unsafe { &*page.data.get() }.is_empty() {
                EMPTY
            } else {
                AVAILABLE
            };
            page.state.store(state, Ordering::Release);
        }
    }
}

impl<T> Drop for PageProducer<'_, T> {
    fn drop(&mut self) {
        self.release_page();
    }
}

impl<T> fmt::Debug for PageProducer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageProducer")
            .field("len", &self.data().len())
            .finish_non_exhaustive()
    }
}

/// Exclusive consumer access to one page holding data.
///
/// On drop the page is cleared and released as `Empty`;
/// [`release_keep`](PageConsumer::release_keep) releases without clearing.
pub struct PageConsumer<'a, T> {
    page: Option<NonNull<Page<T>>>,
    _queue: PhantomData<&'a PageQueue<T>>,
}

// Safety: the handle owns its page exclusively until release.
unsafe impl<T: Send> Send for PageConsumer<'_, T> {}

impl<T> PageConsumer<'_, T> {
    /// The page's element container.
    pub fn data(&self) -> &Vec<T> {
        // Safety: this handle holds the page InUse, so access is exclusive.
        unsafe { &*self.page().data.get() }
    }

    /// The page's element container, for draining in place.
    pub fn data_mut(&mut self) -> &mut Vec<T> {
        // Safety: this handle holds the page InUse, so access is exclusive.
        unsafe { &mut *self.page().data.get() }
    }

    /// Releases the page explicitly, clearing it (the destructor does the
    /// same).
    pub fn release(mut self) {
        self.release_page();
    }

    /// Releases the page without clearing it: whatever was left behind
    /// stays queued for the next consumer.
    pub fn release_keep(mut self) {
        if let Some(page) = self.page.take() {
            let page = unsafe { page.as_ref() };
            let state = if unsafe { &*page.data.get() }.is_empty() {
                EMPTY
            } else {
                AVAILABLE
            };
            page.state.store(state, Ordering::Release);
        }
    }

    fn page(&self) -> &Page<T> {
        // Safety: the pointer targets a boxed page kept alive by the
        // queue borrow in `_queue`.
        unsafe { self.page.expect("handle already released").as_ref() }
    }

    fn release_page(&mut self) {
        if let Some(page) = self.page.take() {
            let page = unsafe { page.as_ref() };
            unsafe { &mut *page.data.get() }.clear();
            page.state.store(EMPTY, Ordering::Release);
        }
    }
}

impl<T> Drop for PageConsumer<'_, T> {
    fn drop(&mut self) {
        self.release_page();
    }
}

impl<T> fmt::Debug for PageConsumer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageConsumer")
            .field("len", &self.data().len())
            .finish_non_exhaustive()
    }
}
