//! Doubly-linked free list, threaded through the payload area of free
//! blocks: `prev` occupies the first 8 bytes, `next` the second 8 bytes.
//!
//! Allocated blocks reuse that same space for user data; the links are only
//! meaningful while a block is free, and are never read while it's
//! allocated.

use std::ptr;

/// Reads the `prev`-free link stored in `p`'s payload.
///
/// # Safety
///
/// `p` must currently be a free block (its link words must be initialized).
pub unsafe fn prev_free(p: *mut u8) -> *mut u8 {
  unsafe { (p as *mut *mut u8).read() }
}

/// Reads the `next`-free link stored in `p`'s payload.
///
/// # Safety
///
/// Same as [`prev_free`].
pub unsafe fn next_free(p: *mut u8) -> *mut u8 {
  unsafe { (p.add(8) as *mut *mut u8).read() }
}

/// Writes the `prev`-free link.
///
/// # Safety
///
/// `p` must currently be a free block with a writable payload of at least
/// 16 bytes.
pub unsafe fn set_prev_free(p: *mut u8, value: *mut u8) {
  unsafe { (p as *mut *mut u8).write(value) };
}

/// Writes the `next`-free link. See [`set_prev_free`] for the safety
/// contract.
pub unsafe fn set_next_free(p: *mut u8, value: *mut u8) {
  unsafe { (p.add(8) as *mut *mut u8).write(value) };
}

/// Prepends `p` to the free list rooted at `*head`, updating `*head` in
/// place. O(1).
///
/// # Safety
///
/// `p` must be a free block not already in the list. `*head`, if non-null,
/// must be a valid free-list head.
pub unsafe fn insert(head: &mut *mut u8, p: *mut u8) {
  unsafe {
    if head.is_null() {
      set_prev_free(p, ptr::null_mut());
      set_next_free(p, ptr::null_mut());
      *head = p;
      return;
    }

    set_prev_free(p, ptr::null_mut());
    set_next_free(p, *head);
    set_prev_free(*head, p);
    *head = p;
  }
}

/// Removes `p` from the free list rooted at `*head`, updating `*head` and
/// neighbouring links as needed. O(1).
///
/// Both of `p`'s own links are nulled out before returning regardless of
/// which case applies — `p` is about to either be allocated (its link
/// memory is about to be overwritten with user data anyway) or merged into
/// a neighbour, and leaving stale links around is a defensibility hazard.
///
/// # Safety
///
/// `p` must currently be linked into the list rooted at `*head`.
pub unsafe fn remove(head: &mut *mut u8, p: *mut u8) {
  unsafe {
    if head.is_null() {
      return;
    }

    let prev = prev_free(p);
    let next = next_free(p);

    match (prev.is_null(), next.is_null()) {
      // Case 1: sole element.
      (true, true) => {
        *head = ptr::null_mut();
      }
      // Case 2: head of list.
      (true, false) => {
        *head = next;
        set_prev_free(next, ptr::null_mut());
      }
      // Case 3: tail of list.
      (false, true) => {
        set_next_free(prev, ptr::null_mut());
      }
      // Case 4: interior node.
      (false, false) => {
        set_next_free(prev, next);
        set_prev_free(next, prev);
      }
    }

    set_prev_free(p, ptr::null_mut());
    set_next_free(p, ptr::null_mut());
  }
}
