//! Wall clock in local time

use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};

use plategate_domain::port::Clock;

/// Local wall clock, truncated to whole seconds like the ledger
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
