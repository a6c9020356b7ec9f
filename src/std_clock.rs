use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_timers::clock::Clock;

/// 基于标准库的时钟，同时提供阻塞延时
///
/// 采样窗口依赖`Clock`计时、依赖`DelayNs`控制采样间隔，
/// 测试时可替换为模拟时钟。
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock {}

impl StdClock {
    pub fn new() -> Self {
        Self {}
    }
}

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed(&self, instant: Self::Instant) -> Duration {
        instant.elapsed()
    }
}

impl DelayNs for StdClock {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}
