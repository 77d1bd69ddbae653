use std::{alloc::Layout, io::Read, ptr};

use libc::sbrk;
use rallocator::arena::SbrkArena;
use rallocator::heap::Heap;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how allocations change the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  // Our free-list allocator. It holds:
  // - an ArenaProvider growing the process break via sbrk
  // - heap_start, the prologue's payload address
  // - free_listp, the head of the explicit free list
  let mut heap = Heap::new(SbrkArena::new());

  unsafe {
    print_program_break("start");
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 1) Allocate space for a u32.
    // ------------------------------------------------------------------
    let layout_u32 = Layout::new::<u32>();
    let first_block = heap.allocate(layout_u32.size());
    println!("\n[1] Allocate u32 -> {first_block:?}");

    let first_ptr = first_block as *mut u32;
    first_ptr.write(0xDEADBEEF);
    println!("[1] Value written to first_block = 0x{:X}", first_ptr.read());

    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 2) Allocate 12 bytes, observe block-size rounding.
    // ------------------------------------------------------------------
    let second_block = heap.allocate(12);
    println!("\n[2] Allocate [u8; 12] -> {second_block:?}");
    ptr::write_bytes(second_block, 0xAB, 12);
    println!("[2] Initialized second block with 0xAB");

    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 3) Allocate a u64, observe 8-byte alignment.
    // ------------------------------------------------------------------
    let layout_u64 = Layout::new::<u64>();
    let third_block = heap.allocate(layout_u64.size());
    println!("\n[3] Allocate u64 -> {third_block:?}");

    let third_ptr = third_block as *mut u64;
    third_ptr.write(0x1122334455667788);
    let addr_third = third_block as usize;
    println!("[3] Value written = 0x{:X}, addr % 8 = {}", third_ptr.read(), addr_third % 8);

    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 4) Allocate an array of u16.
    // ------------------------------------------------------------------
    let fourth_block = heap.allocate(32);
    println!("\n[4] Allocate [u16; 16] -> {fourth_block:?}");
    let fourth_ptr = fourth_block as *mut u16;
    for i in 0..16 {
      fourth_ptr.add(i).write(i as u16);
    }
    println!("[4] Wrote 0..15 into the u16 array");
    heap.checkheap(line!() as i32);

    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 5) Free the first block. Unlike a pure bump allocator, this one
    //    threads it onto the explicit free list instead of leaking it.
    // ------------------------------------------------------------------
    heap.free(first_block);
    println!("\n[5] Freed first_block at {first_block:?}");
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 6) Allocate a small block and check whether the freed block is
    //    reused (it should be: first-fit over the free list).
    // ------------------------------------------------------------------
    let fifth_block = heap.allocate(2);
    println!("\n[6] Allocate [u8; 2] -> {fifth_block:?}");
    println!(
      "[6] fifth_block == first_block? {}",
      if fifth_block == first_block { "yes, reused the freed block" } else { "no, allocated elsewhere" }
    );
    heap.checkheap(line!() as i32);

    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 7) Allocate a large block to observe heap growth via sbrk.
    // ------------------------------------------------------------------
    print_program_break("before large alloc");
    let big_block = heap.allocate(64 * 1024);
    println!("\n[7] Allocate large 64 KiB block -> {big_block:?}");
    print_program_break("after large alloc");
    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 8) Shrink it back with reallocate, then free everything.
    // ------------------------------------------------------------------
    let shrunk = heap.reallocate(big_block, 128);
    println!("\n[8] Shrunk large block to 128 bytes -> {shrunk:?}");
    heap.free(shrunk);
    heap.free(second_block);
    heap.free(third_block);
    heap.free(fourth_block);
    heap.free(fifth_block);
    heap.checkheap(line!() as i32);

    println!("\n[9] End of walkthrough. All blocks freed and coalesced.");
  }
}
