//! CPU affinity helpers used by tests/benches and by MPSC-PC's shard
//! addressing.

use crate::error::{ReservoirError, Result};

#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu_id: usize) -> Result<()> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpu_set = CpuSet::new();
    cpu_set
        .set(cpu_id)
        .map_err(|e| ReservoirError::unsupported(format!("invalid cpu id {cpu_id}: {e}")))?;

    sched_setaffinity(Pid::from_raw(0), &cpu_set)
        .map_err(|e| ReservoirError::unsupported(format!("failed to set CPU affinity: {e}")))
}

#[cfg(target_os = "macos")]
pub fn pin_to_cpu(cpu_id: usize) -> Result<()> {
    use libc::{mach_port_t, pthread_self, thread_affinity_policy_data_t, thread_policy_set};
    use libc::THREAD_AFFINITY_POLICY;

    unsafe {
        let mut policy = thread_affinity_policy_data_t { affinity_tag: cpu_id as i32 };

        let result = thread_policy_set(
            pthread_self() as mach_port_t,
            THREAD_AFFINITY_POLICY as u32,
            &mut policy as *mut _ as *mut i32,
            1,
        );

        if result != 0 {
            return Err(ReservoirError::unsupported("failed to set CPU affinity"));
        }
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn pin_to_cpu(_cpu_id: usize) -> Result<()> {
    Ok(())
}

/// The CPU core the calling thread is currently running on. Used by
/// MPSC-PC to address its per-CPU shards; may return a stale value the
/// instant after it's read if the thread is migrated, which is exactly
/// the race the restartable push section guards against.
#[cfg(target_os = "linux")]
pub fn current_cpu() -> usize {
    let ret = unsafe { libc::sched_getcpu() };
    if ret < 0 {
        0
    } else {
        ret as usize
    }
}

#[cfg(not(target_os = "linux"))]
pub fn current_cpu() -> usize {
    0
}
