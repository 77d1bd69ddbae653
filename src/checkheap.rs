//! The internal consistency checker. Read-only: it never mutates the heap
//! it inspects. Intended for use from tests and from debug-build assertions
//! in [`crate::heap::Heap::checkheap`], not on any allocation fast path.

use crate::arena::ArenaProvider;
use crate::block::next_block;
use crate::freelist::{next_free, prev_free};
use crate::word::{self, ALIGNMENT, MINIMUM};
use std::fmt;

/// A detected violation of one of the heap's structural invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckError {
  /// The prologue isn't exactly [`MINIMUM`] bytes and allocated.
  PrologueShape { addr: usize },
  /// A block's address isn't a multiple of [`ALIGNMENT`].
  Misaligned { addr: usize },
  /// A block's address (or a free-list link) falls outside `[lo, hi)`.
  OutOfBounds { addr: usize },
  /// A block's header and footer disagree.
  HeaderFooterMismatch { addr: usize },
  /// An allocated block is smaller than [`MINIMUM`].
  BelowMinimumSize { addr: usize, size: usize },
  /// A block's size isn't a multiple of [`ALIGNMENT`].
  SizeMisaligned { addr: usize, size: usize },
  /// Two physically adjacent blocks are both free.
  AdjacentFreeBlocks { addr: usize },
  /// `next(prev(x)) != x` or `prev(next(x)) != x` for some free-list node.
  FreeListAsymmetry { addr: usize },
  /// Heap traversal and free-list traversal disagree on the free-block
  /// count.
  FreeCountMismatch { heap_walk: usize, free_list_walk: usize },
}

impl fmt::Display for CheckError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      Self::PrologueShape { addr } => write!(f, "prologue shape error at {addr:#x}"),
      Self::Misaligned { addr } => write!(f, "block alignment error at {addr:#x}"),
      Self::OutOfBounds { addr } => write!(f, "out-of-heap-bounds address {addr:#x}"),
      Self::HeaderFooterMismatch { addr } => write!(f, "header/footer mismatch at {addr:#x}"),
      Self::BelowMinimumSize { addr, size } => {
        write!(f, "allocated block at {addr:#x} has size {size} < {MINIMUM}")
      }
      Self::SizeMisaligned { addr, size } => {
        write!(f, "block at {addr:#x} has size {size} not a multiple of {ALIGNMENT}")
      }
      Self::AdjacentFreeBlocks { addr } => write!(f, "coalescing error: two free blocks meet at {addr:#x}"),
      Self::FreeListAsymmetry { addr } => write!(f, "free-list link asymmetry at {addr:#x}"),
      Self::FreeCountMismatch { heap_walk, free_list_walk } => {
        write!(f, "free block count mismatch: heap walk found {heap_walk}, free list walk found {free_list_walk}")
      }
    }
  }
}

impl std::error::Error for CheckError {}

fn in_heap<A: ArenaProvider>(arena: &A, addr: *const u8) -> bool {
  addr >= arena.lo() && addr < arena.hi()
}

fn aligned(addr: *const u8) -> bool {
  (addr as usize) % ALIGNMENT == 0
}

/// Checks a single block's shape: alignment, bounds, header/footer
/// agreement, size alignment, and (for allocated blocks) minimum size.
fn check_block<A: ArenaProvider>(arena: &A, p: *mut u8) -> Result<(), CheckError> {
  unsafe {
    if !aligned(p) {
      return Err(CheckError::Misaligned { addr: p as usize });
    }
    if !in_heap(arena, p) {
      return Err(CheckError::OutOfBounds { addr: p as usize });
    }

    let header = word::get(word::header_of(p));
    let size = word::size(header);
    let alloc = word::alloc(header);
    let footer = word::get(word::footer_of(p, size));

    if size % ALIGNMENT != 0 {
      return Err(CheckError::SizeMisaligned { addr: p as usize, size });
    }
    if size != word::size(footer) || alloc != word::alloc(footer) {
      return Err(CheckError::HeaderFooterMismatch { addr: p as usize });
    }
    if alloc && size < MINIMUM {
      return Err(CheckError::BelowMinimumSize { addr: p as usize, size });
    }

    Ok(())
  }
}

/// Walks the heap from the prologue to the epilogue, checking each block and
/// the no-adjacent-free-blocks invariant, and returns the number of free
/// blocks observed.
///
/// # Safety
///
/// `heap_start` must be the prologue's payload address, and the heap must be
/// a well-formed chain of boundary-tagged blocks ending in an epilogue.
pub unsafe fn walk_heap<A: ArenaProvider>(arena: &A, heap_start: *mut u8) -> Result<usize, CheckError> {
  unsafe {
    let prologue_header = word::get(word::header_of(heap_start));
    if word::size(prologue_header) != MINIMUM || !word::alloc(prologue_header) {
      return Err(CheckError::PrologueShape { addr: heap_start as usize });
    }

    let mut free_count = 0usize;
    let mut p = next_block(heap_start);

    loop {
      let header = word::get(word::header_of(p));
      if word::size(header) == 0 && word::alloc(header) {
        // Epilogue reached.
        return Ok(free_count);
      }

      check_block(arena, p)?;

      let this_alloc = word::alloc(header);
      let next = next_block(p);
      let next_alloc = word::alloc(word::get(word::header_of(next)));
      if !this_alloc && !next_alloc {
        return Err(CheckError::AdjacentFreeBlocks { addr: p as usize });
      }

      if !this_alloc {
        free_count += 1;
      }

      p = next;
    }
  }
}

/// Walks the free list rooted at `free_listp`, checking link symmetry and
/// in-arena bounds, and returns the number of free blocks observed.
///
/// # Safety
///
/// Every block reachable from `free_listp` must carry valid free-list links.
pub unsafe fn walk_free_list<A: ArenaProvider>(arena: &A, free_listp: *mut u8) -> Result<usize, CheckError> {
  unsafe {
    let mut count = 0usize;
    let mut p = free_listp;

    while !p.is_null() {
      if !in_heap(arena, p) {
        return Err(CheckError::OutOfBounds { addr: p as usize });
      }

      let prev = prev_free(p);
      let next = next_free(p);

      if !prev.is_null() && next_free(prev) != p {
        return Err(CheckError::FreeListAsymmetry { addr: p as usize });
      }
      if !next.is_null() && prev_free(next) != p {
        return Err(CheckError::FreeListAsymmetry { addr: p as usize });
      }
      if !prev.is_null() && !in_heap(arena, prev) {
        return Err(CheckError::OutOfBounds { addr: prev as usize });
      }
      if !next.is_null() && !in_heap(arena, next) {
        return Err(CheckError::OutOfBounds { addr: next as usize });
      }

      count += 1;
      p = next;
    }

    Ok(count)
  }
}

/// Full consistency check: prologue shape, block-by-block walk to the
/// epilogue, free-list symmetry walk, and a cross-check that both walks
/// agree on the number of free blocks.
///
/// # Safety
///
/// `heap_start` must be the prologue's payload address (or null if the heap
/// has never been initialized, in which case this trivially passes).
pub unsafe fn check<A: ArenaProvider>(arena: &A, heap_start: *mut u8, free_listp: *mut u8) -> Result<(), CheckError> {
  if heap_start.is_null() {
    return Ok(());
  }

  unsafe {
    let heap_walk = walk_heap(arena, heap_start)?;
    let free_list_walk = walk_free_list(arena, free_listp)?;

    if heap_walk != free_list_walk {
      return Err(CheckError::FreeCountMismatch { heap_walk, free_list_walk });
    }
  }

  Ok(())
}
