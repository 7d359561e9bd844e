//! Low-level ESP-IDF helpers: interrupt wiring and task placement.

pub mod isr;
pub mod task_pin;
