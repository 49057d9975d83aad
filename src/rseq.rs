//! Linux restartable sequences (rseq) availability probing, backing
//! MPSC-PC's `Available()` requirement.
//!
//! **Simplification, recorded in DESIGN.md.** A true rseq-backed push
//! critical section needs per-architecture inline assembly whose commit
//! instruction the kernel is contractually obliged to abort if the thread
//! migrated or was preempted since the section's start. Authoring and
//! verifying that assembly without a compiler is out of reach here. This
//! module still performs the real
//! `rseq(2)` registration syscall so [`available`] reports genuine kernel
//! support, but the push critical section itself (in
//! [`crate::mpsc_pc::queue`]) is a software approximation: it samples the
//! current CPU before and after splicing the payload and only commits if
//! the CPU didn't change, restarting otherwise. This is weaker than a true
//! rseq commit (a migration landing exactly between the second CPU read and
//! the commit store is not caught), which is the documented gap an
//! `unsafe-perf`-style, assembly-backed implementation would close.

use std::cell::RefCell;
use std::mem::size_of;

const RSEQ_SIG: u32 = 0x5305_3053;

#[repr(C, align(32))]
struct KernelRseq {
    cpu_id_start: u32,
    cpu_id: u32,
    rseq_cs: u64,
    flags: u32,
    node_id: u32,
    mm_cid: u32,
}

const CPU_ID_UNINITIALIZED: u32 = u32::MAX;

struct Registration {
    // Kept alive for the registered lifetime of the thread; the kernel
    // holds a pointer to this allocation.
    _area: Box<KernelRseq>,
}

thread_local! {
    static REGISTRATION: RefCell<Option<Registration>> = const { RefCell::new(None) };
}

#[cfg(target_os = "linux")]
fn register_current_thread() -> bool {
    REGISTRATION.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_some() {
            return true;
        }

        let mut area = Box::new(KernelRseq {
            cpu_id_start: 0,
            cpu_id: CPU_ID_UNINITIALIZED,
            rseq_cs: 0,
            flags: 0,
            node_id: 0,
            mm_cid: 0,
        });
        let ptr = area.as_mut() as *mut KernelRseq;

        // Safety: `ptr` is a valid, stable, 32-byte-aligned allocation that
        // outlives this registration (kept in `Registration::_area`).
        let ret = unsafe {
            libc::syscall(libc::SYS_rseq, ptr, size_of::<KernelRseq>(), 0u32, RSEQ_SIG)
        };

        if ret == 0 {
            *slot = Some(Registration { _area: area });
            true
        } else {
            false
        }
    })
}

#[cfg(not(target_os = "linux"))]
fn register_current_thread() -> bool {
    false
}

/// Probe whether the running kernel supports `rseq`, registering the
/// calling thread's rseq area as a side effect if so. Mirrors
/// `MPSCPCQueueAny::Available()`. Callers must gate MPSC-PC construction on
/// this.
pub fn available() -> bool {
    register_current_thread()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_does_not_panic() {
        let _ = available();
    }
}
