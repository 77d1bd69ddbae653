//! The public allocator API: `allocate`, `free`, `reallocate`,
//! `zeroed_allocate`, and `checkheap`, plus the lazy `init` every other
//! operation falls back to.
//!
//! `Heap` owns its [`ArenaProvider`] and the two roots (`heap_start`,
//! `free_listp`) as instance fields rather than process-wide globals — file-
//! scope globals are a non-essential concession of a C-linkage API, not
//! something worth reproducing here. `Heap` is not `Sync`; a caller wanting
//! shared access across threads wraps one in a `Mutex` (see
//! [`crate::global_alloc`]).

use crate::arena::ArenaProvider;
use crate::checkheap::{self, CheckError};
use crate::coalesce::coalesce;
use crate::placement::{adjust_size, extend_heap, find_fit, place};
use crate::word::{self, CHUNKSIZE, DSIZE, MINIMUM, WSIZE};
use std::ptr;

/// An explicit-free-list heap allocator over a single arena.
pub struct Heap<A: ArenaProvider> {
  arena: A,
  /// Payload address of the permanently-allocated prologue block, or null
  /// before [`Heap::init`] has run.
  heap_start: *mut u8,
  /// Head of the doubly-linked free list, or null when empty.
  free_listp: *mut u8,
}

impl<A: ArenaProvider> Heap<A> {
  /// Builds a `Heap` over `arena`. The heap is not usable until
  /// [`Heap::init`] succeeds — every public operation performs that
  /// lazily on first use.
  pub fn new(arena: A) -> Self {
    Self { arena, heap_start: ptr::null_mut(), free_listp: ptr::null_mut() }
  }

  fn initialized(&self) -> bool {
    !self.heap_start.is_null()
  }

  /// Idempotent initializer: lays down the alignment pad, the prologue
  /// block, and the epilogue header, then extends the arena by one chunk.
  /// Returns `0` on success, `-1` on failure (arena growth failed).
  pub fn init(&mut self) -> i32 {
    if self.initialized() {
      return 0;
    }

    let raw = match self.arena.grow(2 * WSIZE + MINIMUM) {
      Some(addr) => addr,
      None => return -1,
    };

    unsafe {
      word::put(raw, 0); // alignment padding
      let prologue = raw.add(2 * WSIZE);
      word::put(word::header_of(prologue), word::pack(MINIMUM, true));
      word::put(word::footer_of(prologue, MINIMUM), word::pack(MINIMUM, true));

      let epilogue = prologue.add(MINIMUM);
      word::put(word::header_of(epilogue), word::pack(0, true));

      self.heap_start = prologue;
    }

    if unsafe { extend_heap(&mut self.arena, &mut self.free_listp, CHUNKSIZE) }.is_none() {
      self.heap_start = ptr::null_mut();
      return -1;
    }

    0
  }

  /// Allocates at least `size` bytes, returning a payload pointer aligned
  /// to [`crate::word::ALIGNMENT`], or null on out-of-memory.
  ///
  /// `allocate(0)` always returns null.
  ///
  /// # Safety
  ///
  /// The returned pointer, once non-null, is valid for reads/writes of
  /// `size` bytes until the matching [`Heap::free`] or
  /// [`Heap::reallocate`] call.
  pub unsafe fn allocate(&mut self, size: usize) -> *mut u8 {
    unsafe {
      if !self.initialized() && self.init() != 0 {
        return ptr::null_mut();
      }
      if size == 0 {
        return ptr::null_mut();
      }

      let asize = adjust_size(size);

      let fit = find_fit(self.free_listp, asize);
      if !fit.is_null() {
        place(&mut self.free_listp, fit, asize);
        trace_alloc(size, fit);
        return fit;
      }

      let extend_size = asize.max(CHUNKSIZE);
      let grown = match extend_heap(&mut self.arena, &mut self.free_listp, extend_size) {
        Some(p) => p,
        None => return ptr::null_mut(),
      };
      place(&mut self.free_listp, grown, asize);
      trace_alloc(size, grown);
      grown
    }
  }

  /// Frees a block previously returned by [`Heap::allocate`] or
  /// [`Heap::reallocate`]. A no-op on a null pointer.
  ///
  /// # Safety
  ///
  /// `p` must either be null or have been returned by this heap's
  /// `allocate`/`reallocate` and not already freed. Using `p` after this
  /// call, or freeing it twice, is undefined behaviour — this allocator
  /// makes no attempt to detect caller misuse.
  pub unsafe fn free(&mut self, p: *mut u8) {
    unsafe {
      if p.is_null() {
        return;
      }
      if !self.initialized() && self.init() != 0 {
        return;
      }

      let size = word::size(word::get(word::header_of(p)));
      word::put(word::header_of(p), word::pack(size, false));
      word::put(word::footer_of(p, size), word::pack(size, false));
      coalesce(&mut self.free_listp, p);
      trace_free(p);
    }
  }

  /// Resizes the block at `p` to hold at least `size` bytes.
  ///
  /// - `reallocate(p, 0)` frees `p` and returns null.
  /// - `reallocate(null, size)` behaves as `allocate(size)`.
  /// - If the rounded block size is unchanged, `p` is returned as-is.
  /// - Otherwise a new block is allocated, the first
  ///   `min(size, old payload size)` bytes of `p` are copied into it, `p`
  ///   is freed, and the new pointer is returned. On out-of-memory here,
  ///   `p` is left valid and untouched and null is returned.
  ///
  /// # Safety
  ///
  /// Same contract as [`Heap::allocate`]/[`Heap::free`] on the respective
  /// pointers involved.
  pub unsafe fn reallocate(&mut self, p: *mut u8, size: usize) -> *mut u8 {
    unsafe {
      if size == 0 {
        self.free(p);
        return ptr::null_mut();
      }
      if p.is_null() {
        return self.allocate(size);
      }

      let asize = adjust_size(size);
      let old_block_size = word::size(word::get(word::header_of(p)));

      if asize == old_block_size {
        return p;
      }

      let new_p = self.allocate(size);
      if new_p.is_null() {
        return ptr::null_mut();
      }

      let old_payload_size = old_block_size - DSIZE;
      let copy_len = size.min(old_payload_size);
      ptr::copy_nonoverlapping(p, new_p, copy_len);

      self.free(p);
      new_p
    }
  }

  /// Allocates space for `count` elements of `size` bytes each, zeroed.
  /// Returns null on overflow or out-of-memory.
  ///
  /// # Safety
  ///
  /// Same contract as [`Heap::allocate`].
  pub unsafe fn zeroed_allocate(&mut self, count: usize, size: usize) -> *mut u8 {
    unsafe {
      let Some(bytes) = count.checked_mul(size) else {
        return ptr::null_mut();
      };

      let p = self.allocate(bytes);
      if !p.is_null() {
        ptr::write_bytes(p, 0, bytes);
      }
      p
    }
  }

  /// Runs the full invariant checker (see [`crate::checkheap`]).
  /// `lineno` is used only in the panic message.
  ///
  /// In debug builds, panics with a diagnostic on the first invariant
  /// violation found. Silent — does nothing — in release builds.
  pub fn checkheap(&self, lineno: i32) {
    if cfg!(debug_assertions) {
      if let Err(e) = self.check() {
        panic!("checkheap failed at line {lineno}: {e}");
      }
    }
  }

  /// The `Result`-returning form of [`Heap::checkheap`], usable from tests
  /// regardless of build profile.
  pub fn check(&self) -> Result<(), CheckError> {
    unsafe { checkheap::check(&self.arena, self.heap_start, self.free_listp) }
  }

  /// Borrows the underlying arena provider (for inspecting `lo()`/`hi()` in
  /// tests and diagnostics).
  pub fn arena(&self) -> &A {
    &self.arena
  }
}

/// Debug-only allocation trace — plain `println!`, no logging-facade
/// dependency, gated behind an environment variable so it stays silent
/// unless asked for.
fn trace_alloc(requested: usize, p: *mut u8) {
  if cfg!(debug_assertions) && std::env::var_os("RALLOCATOR_TRACE").is_some() {
    println!("allocate({requested}) -> {p:?}");
  }
}

/// Debug-only free trace. See [`trace_alloc`].
fn trace_free(p: *mut u8) {
  if cfg!(debug_assertions) && std::env::var_os("RALLOCATOR_TRACE").is_some() {
    println!("free({p:?})");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arena::FixedArena;

  fn fresh_heap(capacity: usize) -> Heap<FixedArena> {
    Heap::new(FixedArena::new(capacity))
  }

  #[test]
  fn s1_allocate_one_byte_then_free_then_reuse() {
    let mut heap = fresh_heap(4096);
    unsafe {
      let a = heap.allocate(1);
      assert!(!a.is_null());
      assert_eq!((a as usize) % 8, 0);
      assert_eq!(word::size(word::get(word::header_of(a))), MINIMUM);

      heap.free(a);
      heap.checkheap(line!() as i32);

      let a2 = heap.allocate(1);
      assert_eq!(a2, a);
    }
  }

  #[test]
  fn s2_freed_block_is_reused_first_fit() {
    let mut heap = fresh_heap(4096);
    unsafe {
      let a = heap.allocate(100);
      let _b = heap.allocate(100);
      heap.free(a);
      let c = heap.allocate(100);
      assert_eq!(c, a);
    }
  }

  #[test]
  fn s3_three_way_coalesce_on_middle_free() {
    let mut heap = fresh_heap(4096);
    unsafe {
      let a = heap.allocate(16);
      let b = heap.allocate(16);
      let c = heap.allocate(16);
      heap.free(a);
      heap.free(c);
      heap.free(b);
      heap.checkheap(line!() as i32);

      // Exactly one free block should remain reachable from the head.
      assert!(!heap.free_listp.is_null());
      assert!(freelist_next_free_is_null(&heap));
    }
  }

  fn freelist_next_free_is_null(heap: &Heap<FixedArena>) -> bool {
    unsafe { crate::freelist::next_free(heap.free_listp).is_null() }
  }

  #[test]
  fn s4_minimum_size_alloc_free_realloc_reuses_same_address() {
    let mut heap = fresh_heap(4096);
    unsafe {
      let a = heap.allocate(24);
      heap.free(a);
      let b = heap.allocate(24);
      assert_eq!(a, b);
    }
  }

  #[test]
  fn s5_reallocate_preserves_prefix_bytes_through_grow_and_shrink() {
    let mut heap = fresh_heap(8192);
    unsafe {
      let a = heap.allocate(100);
      for i in 0..100u8 {
        *a.add(i as usize) = i;
      }

      let p = heap.reallocate(a, 50);
      assert!(!p.is_null());
      for i in 0..50u8 {
        assert_eq!(*p.add(i as usize), i);
      }

      let q = heap.reallocate(p, 1000);
      assert!(!q.is_null());
      for i in 0..50u8 {
        assert_eq!(*q.add(i as usize), i);
      }
      heap.checkheap(line!() as i32);
    }
  }

  #[test]
  fn p6_edge_cases() {
    let mut heap = fresh_heap(4096);
    unsafe {
      heap.free(ptr::null_mut()); // no-op, must not panic
      assert!(heap.allocate(0).is_null());

      let a = heap.allocate(64);
      assert!(!a.is_null());

      let from_null = heap.reallocate(ptr::null_mut(), 64);
      assert!(!from_null.is_null());
      heap.free(from_null);

      let freed = heap.reallocate(a, 0);
      assert!(freed.is_null());
    }
  }

  #[test]
  fn s6_allocate_until_exhaustion_then_checkheap_still_passes() {
    let mut heap = fresh_heap(8192);
    let mut allocated = Vec::new();
    unsafe {
      for i in 1..512usize {
        match heap.allocate(i) {
          p if p.is_null() => break,
          p => allocated.push(p),
        }
        heap.checkheap(line!() as i32);
      }
    }
    assert!(!allocated.is_empty());
  }

  #[test]
  fn p7_arena_capacity_covers_sum_of_allocated_payloads() {
    let mut heap = fresh_heap(4096);
    unsafe {
      let _a = heap.allocate(64);
      let b = heap.allocate(128);
      let _c = heap.allocate(32);
      heap.free(b);

      let arena_bytes = heap.arena().hi() as usize - heap.arena().lo() as usize;
      // a and c are still allocated; b was freed back to the arena.
      let still_allocated_payloads = 64 + 32;
      assert!(arena_bytes >= still_allocated_payloads);
    }
  }

  #[test]
  fn allocate_zero_is_always_null() {
    let mut heap = fresh_heap(4096);
    unsafe {
      assert!(heap.allocate(0).is_null());
    }
  }

  #[test]
  fn zeroed_allocate_zeroes_and_rejects_overflow() {
    let mut heap = fresh_heap(4096);
    unsafe {
      let p = heap.zeroed_allocate(8, 8);
      assert!(!p.is_null());
      for i in 0..64 {
        assert_eq!(*p.add(i), 0);
      }

      assert!(heap.zeroed_allocate(usize::MAX, 2).is_null());
    }
  }

  #[test]
  fn allocated_payload_survives_unrelated_allocations() {
    let mut heap = fresh_heap(8192);
    unsafe {
      let a = heap.allocate(40);
      for i in 0..40u8 {
        *a.add(i as usize) = i ^ 0xA5;
      }

      let _b = heap.allocate(200);
      let c = heap.allocate(40);
      heap.free(c);
      let _d = heap.allocate(1000);

      for i in 0..40u8 {
        assert_eq!(*a.add(i as usize), i ^ 0xA5);
      }
    }
  }
}
