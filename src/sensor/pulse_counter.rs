use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, Trigger};

/// 脉冲计数器
///
/// 干簧管每闭合一次，GPIO中断回调就累加一次计数，
/// 采样循环在另一个线程里读取并清零。
pub struct PulseCounter {
    /// 中断回调与采样循环共享的计数
    count: Arc<AtomicU32>,
    /// 持有针脚对象，针脚被释放后中断也随之注销
    _pin: Option<InputPin>,
}

impl PulseCounter {
    /// 创建一个未绑定针脚的计数器
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicU32::new(0)),
            _pin: None,
        }
    }

    /// 绑定GPIO针脚并监听下降沿
    ///
    /// - 针脚为上拉输入，开关闭合时电平被拉低
    /// - `debounce`: 防抖时间，`None`表示不防抖（风速快时脉冲间隔很短）
    pub fn listen(pin: u8, debounce: Option<Duration>) -> anyhow::Result<Self> {
        // 构建针脚GPIO对象
        let gpio = Gpio::new()?;
        let mut pin = gpio.get(pin)?.into_input_pullup();

        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        // 下降沿表示开关闭合一次
        pin.set_async_interrupt(Trigger::FallingEdge, debounce, move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        })?;

        // OK
        Ok(Self {
            count,
            _pin: Some(pin),
        })
    }

    /// 记录一次脉冲
    pub fn record(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// 当前累计的脉冲数
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// 取出累计的脉冲数并清零
    pub fn take(&self) -> u32 {
        self.count.swap(0, Ordering::Relaxed)
    }

    /// 清零
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    /// 获取一个共享同一计数的句柄，不持有针脚
    pub fn handle(&self) -> PulseCounter {
        Self {
            count: Arc::clone(&self.count),
            _pin: None,
        }
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_resets_count() {
        let counter = PulseCounter::new();
        counter.record();
        counter.record();
        counter.record();

        assert_eq!(counter.count(), 3);
        assert_eq!(counter.take(), 3);
        // take之后计数归零
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.take(), 0);
    }

    #[test]
    fn test_handle_shares_count() {
        let counter = PulseCounter::new();
        let handle = counter.handle();

        // 模拟中断线程
        let worker = std::thread::spawn(move || {
            for _ in 0..1000 {
                handle.record();
            }
        });
        worker.join().unwrap();

        assert_eq!(counter.count(), 1000);
        counter.reset();
        assert_eq!(counter.count(), 0);
    }
}
