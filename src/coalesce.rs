//! Boundary-tag coalescing: merges a newly-freed block with whichever of its
//! physical neighbours are also free, and re-grounds the free list for the
//! survivor.
//!
//! The caller must have already written free header/footer words for `p`
//! before calling [`coalesce`].

use crate::block::{next_block, prev_block};
use crate::freelist;
use crate::word;

/// Coalesces the just-freed block at payload `p` with any free physical
/// neighbours, re-inserts exactly one block into the free list rooted at
/// `*head`, and returns that block's payload address.
///
/// Four cases by the allocated state of the previous and next physical
/// blocks:
///
/// | prev | next | action |
/// |---|---|---|
/// | alloc | alloc | no merge |
/// | alloc | free | absorb next |
/// | free | alloc | absorb prev |
/// | free | free | absorb both |
///
/// When `p` is the first real block, `prev_block(p)` aliases the prologue,
/// whose header is permanently allocated — so the "prev is allocated" arm is
/// taken naturally, with no special branch needed here.
///
/// # Safety
///
/// `p`'s header/footer must already be written as free, and `p` must not
/// already be linked into the free list. The immediate physical neighbours'
/// boundary tags must be valid.
pub unsafe fn coalesce(head: &mut *mut u8, p: *mut u8) -> *mut u8 {
  unsafe {
    let prev = prev_block(p);
    let prev_alloc = prev == p || word::alloc(word::get(word::header_of(prev)));
    let next = next_block(p);
    let next_alloc = word::alloc(word::get(word::header_of(next)));
    let mut size = word::size(word::get(word::header_of(p)));

    let merged = match (prev_alloc, next_alloc) {
      (true, true) => p,
      (true, false) => {
        size += word::size(word::get(word::header_of(next)));
        freelist::remove(head, next);
        word::put(word::header_of(p), word::pack(size, false));
        word::put(word::footer_of(p, size), word::pack(size, false));
        p
      }
      (false, true) => {
        size += word::size(word::get(word::header_of(prev)));
        freelist::remove(head, prev);
        word::put(word::footer_of(p, word::size(word::get(word::header_of(p)))), word::pack(size, false));
        word::put(word::header_of(prev), word::pack(size, false));
        prev
      }
      (false, false) => {
        size += word::size(word::get(word::header_of(prev))) + word::size(word::get(word::header_of(next)));
        freelist::remove(head, next);
        freelist::remove(head, prev);
        word::put(word::header_of(prev), word::pack(size, false));
        word::put(word::footer_of(next, word::size(word::get(word::header_of(next)))), word::pack(size, false));
        prev
      }
    };

    freelist::insert(head, merged);
    merged
  }
}
