//! Block navigator: given a payload address, find the next and previous
//! payload addresses via boundary-tag arithmetic alone.
//!
//! These are pure address functions — they read no field beyond the one or
//! two boundary-tag words they need, and they never allocate or mutate.

use crate::word;

/// Payload address of the block physically following `p`.
///
/// # Safety
///
/// `p`'s header word must be valid (readable, holding this block's true
/// size).
pub unsafe fn next_block(p: *mut u8) -> *mut u8 {
  unsafe {
    let header = word::header_of(p);
    let sz = word::size(word::get(header));
    p.add(sz)
  }
}

/// Payload address of the block physically preceding `p`.
///
/// Well-defined for every real block because the prologue is permanently
/// allocated and carries a valid footer at `p - DSIZE` — there is no special
/// case for the first real block here; see [`crate::coalesce`] for how the
/// prologue-aliasing edge case is handled at the one call site that cares.
///
/// # Safety
///
/// The footer word at `p - DSIZE` must be valid.
pub unsafe fn prev_block(p: *mut u8) -> *mut u8 {
  unsafe {
    let prev_footer = word::prev_footer_of(p);
    let prev_size = word::size(word::get(prev_footer));
    p.sub(prev_size)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::word::{self, WSIZE};

  /// Lays out `prologue(24) | block(32) | epilogue(0)` in a buffer and
  /// checks that `next_block`/`prev_block` land on the right boundaries.
  #[test]
  fn next_and_prev_agree_on_a_three_block_layout() {
    let mut buf = [0u8; 128];
    let base = buf.as_mut_ptr();

    unsafe {
      // Prologue: header/footer at base, payload at base+WSIZE.
      let prologue_payload = base.add(WSIZE);
      word::put(word::header_of(prologue_payload), word::pack(24, true));
      word::put(word::footer_of(prologue_payload, 24), word::pack(24, true));

      // Real block of size 32 right after the prologue.
      let block_payload = prologue_payload.add(24);
      word::put(word::header_of(block_payload), word::pack(32, false));
      word::put(word::footer_of(block_payload, 32), word::pack(32, false));

      // Epilogue: zero-size allocated header right after the block.
      let epilogue_payload = block_payload.add(32);
      word::put(word::header_of(epilogue_payload), word::pack(0, true));

      assert_eq!(next_block(prologue_payload), block_payload);
      assert_eq!(next_block(block_payload), epilogue_payload);
      assert_eq!(prev_block(block_payload), prologue_payload);
      assert_eq!(prev_block(epilogue_payload), block_payload);
    }
  }
}
