//! Core-pinned thread spawning for the ESP32 dual core.
//!
//! ESP-IDF implements `std::thread` on pthreads, which are thin FreeRTOS
//! task wrappers. `esp_pthread_set_cfg()` applies to the *next*
//! `pthread_create()` from the calling thread, so the config and the spawn
//! must not be interleaved with other thread creation on that thread.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): WiFi and lwIP.
    Pro = 0,
    /// Core 1 (APP_CPU): control loop.
    App = 1,
}

/// A named task with its placement.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// Null-terminated (e.g. `"http\0"`); the C side keeps the pointer.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

/// HTTP server task: next to the network stack.
pub const HTTP_TASK: TaskSpec = TaskSpec {
    name: "http\0",
    core: Core::Pro,
    priority: 5,
    stack_kb: 8,
};

/// Spawn a thread pinned to `task.core` with the given priority and stack.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    task: TaskSpec,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    use esp_idf_svc::sys;

    // SAFETY: `cfg` is fully initialised by the default constructor and
    // `thread_name` points to a 'static null-terminated string.
    let ret = unsafe {
        let mut cfg = sys::esp_create_default_pthread_config();
        cfg.pin_to_core = task.core as _;
        cfg.prio = task.priority as _;
        cfg.stack_size = (task.stack_kb * 1024) as _;
        cfg.thread_name = task.name.as_ptr().cast();
        sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = task.name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        task.core,
        task.priority,
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(task.stack_kb * 1024)
        .spawn(f)
}

/// Host fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    task: TaskSpec,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = task.name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(task.stack_kb * 1024)
        .spawn(f)
}
