//! Periodic driver for the [`FlowEstimator`].
//!
//! Implements [`FlowTimer`]. The estimator ticks once per period while the
//! control loop keeps the timer running.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: an `esp_timer` periodic timer dispatched
//!   from the ESP timer task (not ISR context, so the tick may take the
//!   flow mutex and log).
//! - **all other targets**: a worker thread that sleeps one period between
//!   ticks.

use log::info;

use crate::app::ports::FlowTimer;
use crate::sensors::flow::FlowEstimator;

#[cfg(target_os = "espidf")]
pub use self::esp::EspFlowTimer;
#[cfg(not(target_os = "espidf"))]
pub use self::sim::ThreadFlowTimer;

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;

    use core::ffi::c_void;

    use esp_idf_svc::sys::*;
    use log::error;

    use crate::error::Error;

    unsafe extern "C" fn flow_tick_cb(arg: *mut c_void) {
        // SAFETY: `arg` is the `&'static FlowEstimator` registered in
        // `EspFlowTimer::new`; it is never freed.
        let estimator = unsafe { &*(arg as *const FlowEstimator<'static>) };
        estimator.tick();
    }

    pub struct EspFlowTimer {
        handle: esp_timer_handle_t,
        period_us: u64,
        running: bool,
    }

    impl EspFlowTimer {
        /// Create the (stopped) periodic timer.
        pub fn new(estimator: &'static FlowEstimator<'static>, period_ms: u32) -> Result<Self, Error> {
            let args = esp_timer_create_args_t {
                callback: Some(flow_tick_cb),
                arg: estimator as *const FlowEstimator<'static> as *mut c_void,
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: c"flow".as_ptr(),
                skip_unhandled_events: true,
            };
            let mut handle: esp_timer_handle_t = core::ptr::null_mut();
            // SAFETY: `args` outlives the call; `handle` receives a valid
            // timer on ESP_OK.
            let ret = unsafe { esp_timer_create(&args, &mut handle) };
            if ret != ESP_OK as i32 {
                error!("flow_timer: create failed (rc={})", ret);
                return Err(Error::Init("flow timer create failed"));
            }
            info!("flow_timer: created ({} ms period)", period_ms);
            Ok(Self {
                handle,
                period_us: u64::from(period_ms) * 1000,
                running: false,
            })
        }
    }

    impl FlowTimer for EspFlowTimer {
        fn start(&mut self) {
            // SAFETY: handle is valid for the lifetime of self.
            let ret = unsafe { esp_timer_start_periodic(self.handle, self.period_us) };
            if ret == ESP_OK as i32 {
                self.running = true;
            } else {
                error!("flow_timer: start failed (rc={})", ret);
            }
        }

        fn stop(&mut self) {
            // SAFETY: handle is valid for the lifetime of self.
            let ret = unsafe { esp_timer_stop(self.handle) };
            if ret != ESP_OK as i32 {
                // ESP_ERR_INVALID_STATE: already stopped.
                log::debug!("flow_timer: stop rc={}", ret);
            }
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    impl Drop for EspFlowTimer {
        fn drop(&mut self) {
            // SAFETY: handle came from esp_timer_create and is deleted once.
            unsafe {
                esp_timer_stop(self.handle);
                esp_timer_delete(self.handle);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod sim {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread::JoinHandle;
    use std::time::Duration;

    use log::warn;

    /// Join the worker; a panic inside a tick is logged, not propagated.
    /// Returns whether the worker exited cleanly.
    fn join_worker(handle: JoinHandle<()>) -> bool {
        match handle.join() {
            Ok(()) => true,
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("<non-string panic>");
                warn!("flow_timer(sim): worker panicked: {}", msg);
                false
            }
        }
    }

    pub struct ThreadFlowTimer {
        estimator: Arc<FlowEstimator<'static>>,
        period: Duration,
        stop: Arc<AtomicBool>,
        worker: Option<JoinHandle<()>>,
    }

    impl ThreadFlowTimer {
        pub fn new(estimator: Arc<FlowEstimator<'static>>, period_ms: u32) -> Self {
            Self {
                estimator,
                period: Duration::from_millis(u64::from(period_ms)),
                stop: Arc::new(AtomicBool::new(false)),
                worker: None,
            }
        }
    }

    impl FlowTimer for ThreadFlowTimer {
        fn start(&mut self) {
            if self.worker.is_some() {
                return;
            }
            self.stop.store(false, Ordering::Release);
            let estimator = Arc::clone(&self.estimator);
            let stop = Arc::clone(&self.stop);
            let period = self.period;
            let spawned = std::thread::Builder::new()
                .name("flow-tick".into())
                .spawn(move || {
                    loop {
                        std::thread::sleep(period);
                        if stop.load(Ordering::Acquire) {
                            break;
                        }
                        estimator.tick();
                    }
                });
            match spawned {
                Ok(handle) => {
                    info!("flow_timer(sim): started");
                    self.worker = Some(handle);
                }
                Err(e) => log::error!("flow_timer(sim): spawn failed: {}", e),
            }
        }

        /// Blocks for at most one period while the worker notices the flag.
        fn stop(&mut self) {
            self.stop.store(true, Ordering::Release);
            if let Some(handle) = self.worker.take() {
                if join_worker(handle) {
                    info!("flow_timer(sim): stopped");
                }
            }
        }

        fn is_running(&self) -> bool {
            self.worker.is_some()
        }
    }

    impl Drop for ThreadFlowTimer {
        fn drop(&mut self) {
            self.stop();
        }
    }

}
