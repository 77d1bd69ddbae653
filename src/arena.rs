//! The arena provider: the host collaborator that owns the raw byte region
//! the allocator manages. The core allocator logic only ever calls through
//! this interface; a complete, testable crate needs at least one concrete
//! implementation, so this module supplies two.

use std::ptr;

/// Appends bytes to an arena and reports its current bounds.
///
/// Implementors own the backing memory; the allocator core never inspects
/// or mutates it except through `grow`'s return value.
pub trait ArenaProvider {
  /// Appends `bytes` to the arena and returns the address of the newly
  /// appended region, or `None` if the arena could not grow (out of
  /// memory, or a fixed-capacity arena has been exhausted).
  fn grow(&mut self, bytes: usize) -> Option<*mut u8>;

  /// The current low address of the arena (its first byte).
  fn lo(&self) -> *const u8;

  /// The current high address of the arena (one past its last byte).
  fn hi(&self) -> *const u8;
}

/// Grows the real process heap via `sbrk`, the same system call
/// `rallocator`'s `BumpAllocator` uses.
///
/// Single-threaded, like the rest of this crate: concurrent `sbrk` callers
/// (including other threads' allocations through the system `malloc`) are
/// not synchronized against here.
pub struct SbrkArena {
  lo: *const u8,
  hi: *const u8,
}

impl SbrkArena {
  /// Creates a provider with no arena yet claimed; the first [`Self::grow`]
  /// call establishes `lo`.
  pub fn new() -> Self {
    Self { lo: ptr::null(), hi: ptr::null() }
  }
}

impl Default for SbrkArena {
  fn default() -> Self {
    Self::new()
  }
}

impl ArenaProvider for SbrkArena {
  fn grow(&mut self, bytes: usize) -> Option<*mut u8> {
    let raw = unsafe { libc::sbrk(bytes as libc::intptr_t) };
    if raw == usize::MAX as *mut libc::c_void {
      return None;
    }

    let addr = raw as *mut u8;
    if self.lo.is_null() {
      self.lo = addr;
    }
    self.hi = unsafe { addr.add(bytes) };
    Some(addr)
  }

  fn lo(&self) -> *const u8 {
    self.lo
  }

  fn hi(&self) -> *const u8 {
    self.hi
  }
}

/// A bounded arena backed by a single pre-reserved, never-moved allocation.
///
/// `grow` fails once the reservation is exhausted rather than ever
/// reallocating the backing buffer — the allocator core depends on every
/// address it has ever handed out staying valid for the lifetime of the
/// arena, which a `Vec`-style grow-by-reallocate strategy would violate.
///
/// Intended for tests: deterministic, doesn't perturb the real process
/// break, and lets the boundary scenario "allocate until arena growth
/// fails" be exercised directly.
pub struct FixedArena {
  // Backed by u64 words rather than u8 so the arena's base address is
  // guaranteed 8-byte aligned, matching a real sbrk-grown heap.
  storage: Box<[u64]>,
  used: usize,
}

impl FixedArena {
  /// Reserves at least `capacity` bytes up front (rounded up to a whole
  /// number of 8-byte words); no bytes are handed out until
  /// [`ArenaProvider::grow`] is called.
  pub fn new(capacity: usize) -> Self {
    let words = capacity.div_ceil(8);
    Self { storage: vec![0u64; words].into_boxed_slice(), used: 0 }
  }
}

impl ArenaProvider for FixedArena {
  fn grow(&mut self, bytes: usize) -> Option<*mut u8> {
    if self.used + bytes > self.storage.len() * 8 {
      return None;
    }

    let addr = unsafe { (self.storage.as_mut_ptr() as *mut u8).add(self.used) };
    self.used += bytes;
    Some(addr)
  }

  fn lo(&self) -> *const u8 {
    self.storage.as_ptr() as *const u8
  }

  fn hi(&self) -> *const u8 {
    unsafe { (self.storage.as_ptr() as *const u8).add(self.used) }
  }
}
