// Lock-free drain stack (Treiber stack with a bulk "take everything")
//
// Producers push with a CAS loop on a single head pointer. The consumer never
// pops single nodes; it swaps the whole list out in one atomic operation and
// then owns every detached node exclusively. Because nodes are only freed
// after they have been detached, there is no ABA hazard and no need for
// hazard pointers or epochs.
//
// Single consumer: chronological order across snapshots only holds if one
// consumer at a time takes and writes. `DrainScheduler` enforces that with
// its consumer lock; the stack itself stays memory safe with any number of
// takers.

use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

/// Cache-aligned wrapper to prevent false sharing
#[repr(align(64))]
struct CacheAligned<T>(T);

struct Node<T> {
    value: T,
    /// Toward older nodes; written before the node is published
    next: *mut Node<T>,
    /// Toward newer nodes; only written by the owner of a detached chain
    prev: *mut Node<T>,
}

/// Lock-free multiple-producer stack with an atomic take-all
///
/// `push` never blocks and never fails (apart from allocation). `take_all`
/// detaches everything pushed so far; pushes racing with it either land in
/// the returned chain or in the fresh empty stack, never in both.
pub struct DrainStack<T> {
    head: CacheAligned<AtomicPtr<Node<T>>>,
    cas_retries: AtomicU64,
    _marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: values are moved in by producers and moved out by the consumer;
// no `&T` is ever shared between threads, so `T: Send` is sufficient.
unsafe impl<T: Send> Send for DrainStack<T> {}
unsafe impl<T: Send> Sync for DrainStack<T> {}

impl<T> DrainStack<T> {
    pub fn new() -> Self {
        Self {
            head: CacheAligned(AtomicPtr::new(ptr::null_mut())),
            cas_retries: AtomicU64::new(0),
            _marker: PhantomData,
        }
    }

    /// Push a value as the new head (lock-free, multiple producers)
    pub fn push(&self, value: T) {
        let node = Box::into_raw(Box::new(Node {
            value,
            next: ptr::null_mut(),
            prev: ptr::null_mut(),
        }));

        let mut head = self.head.0.load(Ordering::Relaxed);
        loop {
            // SAFETY: `node` is not published yet, this thread is its only owner.
            unsafe { (*node).next = head };

            match self.head.0.compare_exchange_weak(
                head,
                node,
                Ordering::Release, // Success: publish node contents
                Ordering::Relaxed, // Failure: retry with the observed head
            ) {
                Ok(_) => return,
                Err(current) => {
                    head = current;
                    self.cas_retries.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Detach every queued node, newest first
    pub fn take_all(&self) -> Chain<T> {
        let head = self.head.0.swap(ptr::null_mut(), Ordering::Acquire);
        Chain {
            head,
            _marker: PhantomData,
        }
    }

    /// True when nothing is queued at this instant
    pub fn is_empty(&self) -> bool {
        self.head.0.load(Ordering::Relaxed).is_null()
    }

    /// Number of failed CAS attempts (contention metric)
    pub fn cas_retries(&self) -> u64 {
        self.cas_retries.load(Ordering::Relaxed)
    }
}

impl<T> Default for DrainStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for DrainStack<T> {
    fn drop(&mut self) {
        drop(self.take_all());
    }
}

impl<T> std::fmt::Debug for DrainStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainStack")
            .field("empty", &self.is_empty())
            .field("cas_retries", &self.cas_retries())
            .finish()
    }
}

/// A detached snapshot of the stack, newest node first
///
/// The chain exclusively owns its nodes. Dropping it frees them unread;
/// [`Chain::into_chronological`] hands them out oldest first.
pub struct Chain<T> {
    head: *mut Node<T>,
    _marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: the chain owns its nodes exclusively once detached.
unsafe impl<T: Send> Send for Chain<T> {}

impl<T> Chain<T> {
    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    /// Recover push order
    ///
    /// One forward pass links every node back to its newer neighbour and finds
    /// the tail (the oldest node); the returned iterator then walks those back
    /// links, freeing each node as it yields its value. No extra buffer is
    /// allocated.
    pub fn into_chronological(mut self) -> Chronological<T> {
        let head = std::mem::replace(&mut self.head, ptr::null_mut());
        if head.is_null() {
            return Chronological {
                cursor: ptr::null_mut(),
                _marker: PhantomData,
            };
        }

        // SAFETY: every node reachable from `head` was detached by `take_all`
        // and is owned by this chain; no other thread can reach it.
        let tail = unsafe {
            (*head).prev = ptr::null_mut();
            let mut p = head;
            while !(*p).next.is_null() {
                let next = (*p).next;
                (*next).prev = p;
                p = next;
            }
            p
        };

        Chronological {
            cursor: tail,
            _marker: PhantomData,
        }
    }
}

impl<T> IntoIterator for Chain<T> {
    type Item = T;
    type IntoIter = Chronological<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_chronological()
    }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        let mut p = self.head;
        while !p.is_null() {
            // SAFETY: owned, detached node; each is freed exactly once.
            let node = unsafe { Box::from_raw(p) };
            p = node.next;
        }
    }
}

/// Oldest-first iterator over a detached chain
pub struct Chronological<T> {
    cursor: *mut Node<T>,
    _marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: same ownership argument as `Chain`.
unsafe impl<T: Send> Send for Chronological<T> {}

impl<T> Iterator for Chronological<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.cursor.is_null() {
            return None;
        }
        // SAFETY: `cursor` points at the oldest node not yet yielded. Nodes are
        // freed in yield order and only `prev` links (toward unfreed nodes) are
        // followed afterwards.
        let node = unsafe { Box::from_raw(self.cursor) };
        self.cursor = node.prev;
        Some(node.value)
    }
}

impl<T> Drop for Chronological<T> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}
    }
}
