use std::time::Duration;

use super::pulse_counter::PulseCounter;

/// 雨量计翻斗开关的防抖时间
const BUCKET_DEBOUNCE: Duration = Duration::from_millis(20);

/// 翻斗式雨量计封装对象
pub struct RainGauge {
    tips: PulseCounter,
    /// 每翻斗一次对应的降雨量（毫米）
    bucket_size_mm: f64,
}

impl RainGauge {
    /// 创建雨量计实例，监听指定GPIO针脚
    pub fn new(pin: u8, bucket_size_mm: f64) -> anyhow::Result<Self> {
        let tips = PulseCounter::listen(pin, Some(BUCKET_DEBOUNCE))?;
        Ok(Self::with_counter(tips, bucket_size_mm))
    }

    /// 使用已有的脉冲计数器创建实例
    pub fn with_counter(tips: PulseCounter, bucket_size_mm: f64) -> Self {
        Self {
            tips,
            bucket_size_mm,
        }
    }

    /// 共享翻斗计数的句柄
    pub fn tips(&self) -> PulseCounter {
        self.tips.handle()
    }

    /// 取出自上次读取以来的降雨量（毫米）并清零
    pub fn take_rainfall_mm(&self) -> f64 {
        self.tips.take() as f64 * self.bucket_size_mm
    }
}
