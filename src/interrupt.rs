/* This is part of nodegyp-offline - which is under the MIT License ***********/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::error;
use snafu::{ResultExt};
use log::*;

pub struct Interrupt {
    must_stop: Arc<AtomicBool>,
    locked: Arc<AtomicBool>,
}

/// While a guard is alive, an interruption request is deferred until the
/// guard is dropped.
pub struct Guard {
    must_stop: Arc<AtomicBool>,
    locked: Arc<AtomicBool>,
}

impl Drop for Guard {
    fn drop(&mut self) {
        if self.must_stop.load(Ordering::SeqCst) {
            debug!("An interrupt request will now be serviced");
            std::process::exit(-1);
        }
        self.locked.store(false, Ordering::SeqCst);
    }
}

impl Interrupt {
    /// Interrupt state without any signal handler attached
    pub fn new() -> Interrupt {
        Interrupt {
            must_stop: Arc::new(AtomicBool::new(false)),
            locked: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn lock(&self) -> Guard {
        assert!(! self.locked.load(Ordering::SeqCst),
            "Recursive lock detected. This is forbidden.");

        self.locked.store(true, Ordering::SeqCst);
        Guard {
            must_stop: self.must_stop.clone(),
            locked: self.locked.clone(),
        }
    }

    #[cfg(test)]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }
}

/// Retrieve the global instance of interrupt handlers.
///
/// It allows to catch the "CTRL-C" without leaving a half-written archive or
/// a half-deleted bundle directory behind.
pub fn get() -> Result<Interrupt> {
    let interrupt = Interrupt::new();
    let must_stop = interrupt.must_stop.clone();
    let locked = interrupt.locked.clone();

    ctrlc::set_handler(move || {
        error!("interruption requested by user!");

        // If we are in the middle of a critical section (i.e. we called
        // lock()), wait for the lock to expire. Otherwise, die right now.
        if locked.load(Ordering::SeqCst) {
            must_stop.store(true, Ordering::SeqCst);
        } else {
            std::process::exit(-1);
        }
    }).context(error::CtrlCFailed{})?;

    Ok(interrupt)
}
