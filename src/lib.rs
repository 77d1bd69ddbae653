//! # rallocator - An explicit-free-list memory allocator
//!
//! This crate grew out of a bump allocator; it now implements a general
//! purpose dynamic storage allocator over a single contiguous arena, in the
//! style of a textbook explicit-free-list `malloc`: boundary-tag blocks,
//! first-fit placement, and immediate coalescing.
//!
//! ## Overview
//!
//! Memory is managed as one contiguous region — the *arena* — which grows
//! on demand (by default via `sbrk`, see [`arena::SbrkArena`]). The arena is
//! partitioned into a chain of *blocks*, each framed by a header word and a
//! footer word encoding the block's size and whether it is allocated:
//!
//! ```text
//!   Block layout:
//!
//!   ┌────────┬──────────────────────────────────────┬────────┐
//!   │ header │              payload                 │ footer │
//!   │ 4 bytes│         size - 8 bytes                │4 bytes │
//!   └────────┴──────────────────────────────────────-┴────────┘
//!            ▲
//!            └── pointer returned to / passed in by the caller
//!
//!   Free block payload doubles as free-list storage:
//!
//!   ┌────────┬────────────┬────────────┬─────────────┬────────┐
//!   │ header │ prev (8B)  │ next (8B)  │  unused...  │ footer │
//!   └────────┴────────────┴────────────┴─────────────┴────────┘
//! ```
//!
//! Two permanently-allocated sentinel blocks bound the chain: a *prologue*
//! of exactly [`word::MINIMUM`] bytes at the low end, and a zero-size
//! *epilogue* header at the high end. Every traversal primitive ([`block`])
//! can therefore treat every real block identically, with no special
//! casing at either boundary.
//!
//! ## Crate structure
//!
//! ```text
//!   rallocator
//!   ├── align        - Alignment macros (align!, align_to!)
//!   ├── word          - Header/footer word codec
//!   ├── block         - next/prev block navigation
//!   ├── freelist      - Explicit doubly-linked free list
//!   ├── coalesce      - Boundary-tag coalescing
//!   ├── placement     - Size rounding, first-fit search, splitting, growth
//!   ├── arena         - ArenaProvider trait + SbrkArena / FixedArena
//!   ├── checkheap     - Internal consistency checker
//!   ├── heap          - Heap: the public allocate/free/reallocate API
//!   └── global_alloc  - GlobalAlloc adapter
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rallocator::arena::SbrkArena;
//! use rallocator::heap::Heap;
//!
//! let mut heap = Heap::new(SbrkArena::new());
//!
//! unsafe {
//!     let p = heap.allocate(64) as *mut u64;
//!     assert!(!p.is_null());
//!     *p = 42;
//!     println!("Value: {}", *p);
//!     heap.free(p as *mut u8);
//! }
//! ```
//!
//! ## Safety
//!
//! This crate is inherently unsafe, as it deals with raw memory management.
//! Nearly every operation requires an `unsafe` block, and callers are
//! trusted not to double-free, use-after-free, or pass pointers the heap
//! didn't hand out.

pub mod align;
pub mod arena;
mod block;
pub mod checkheap;
mod coalesce;
mod freelist;
pub mod global_alloc;
pub mod heap;
mod placement;
pub mod word;

pub use global_alloc::GlobalHeap;
pub use heap::Heap;
