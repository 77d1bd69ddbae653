//! A [`GlobalAlloc`] adapter over [`crate::heap::Heap`], for crates that
//! want this allocator as their process-wide `#[global_allocator]`.
//!
//! Not part of the core allocator's contract — the core speaks in raw
//! sizes, not `Layout`s — but every example repo in this family ships one,
//! and it's the natural way to actually exercise the allocator end to end.

use crate::arena::{ArenaProvider, SbrkArena};
use crate::heap::Heap;
use crate::word::ALIGNMENT;
use std::alloc::{GlobalAlloc, Layout};
use std::sync::Mutex;

/// Wraps a [`Heap`] behind a [`Mutex`] so it can serve as a
/// `#[global_allocator]`.
///
/// `Layout`s requesting alignment greater than [`ALIGNMENT`] (8 bytes) are
/// not supported — the underlying heap hands out blocks aligned to exactly
/// 8 bytes, never more — and are rejected with a null pointer rather than
/// silently under-aligned memory.
pub struct GlobalHeap<A: ArenaProvider = SbrkArena> {
  inner: Mutex<Heap<A>>,
}

impl GlobalHeap<SbrkArena> {
  /// A `GlobalHeap` growing the real process break via `sbrk`.
  pub fn new_sbrk() -> Self {
    Self::new(Heap::new(SbrkArena::new()))
  }
}

impl<A: ArenaProvider> GlobalHeap<A> {
  /// Wraps an already-constructed heap.
  pub fn new(heap: Heap<A>) -> Self {
    Self { inner: Mutex::new(heap) }
  }
}

unsafe impl<A: ArenaProvider> GlobalAlloc for GlobalHeap<A> {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return std::ptr::null_mut();
    }
    let mut heap = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    unsafe { heap.allocate(layout.size()) }
  }

  unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
    let mut heap = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    unsafe { heap.free(ptr) }
  }

  unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return std::ptr::null_mut();
    }
    let mut heap = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    unsafe { heap.reallocate(ptr, new_size) }
  }

  unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return std::ptr::null_mut();
    }
    let mut heap = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    unsafe { heap.zeroed_allocate(1, layout.size()) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arena::FixedArena;

  #[test]
  fn global_alloc_rejects_overaligned_layouts() {
    let global = GlobalHeap::new(Heap::new(FixedArena::new(4096)));
    let layout = Layout::from_size_align(16, 16).unwrap();
    unsafe {
      assert!(global.alloc(layout).is_null());
    }
  }

  #[test]
  fn global_alloc_roundtrips_through_the_trait() {
    let global = GlobalHeap::new(Heap::new(FixedArena::new(4096)));
    let layout = Layout::from_size_align(64, 8).unwrap();
    unsafe {
      let p = global.alloc(layout);
      assert!(!p.is_null());
      *p = 7;
      global.dealloc(p, layout);
    }
  }
}
