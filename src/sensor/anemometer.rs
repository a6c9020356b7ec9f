use std::f64::consts::PI;
use std::time::Duration;

use super::pulse_counter::PulseCounter;

/// 每公里的厘米数
const CM_IN_A_KM: f64 = 100000.0;
/// 每小时的秒数
const SECS_IN_AN_HOUR: f64 = 3600.0;

/// 风速计封装对象
///
/// 风杯每转半圈干簧管闭合一次，即每圈2个脉冲。
pub struct Anemometer {
    pulses: PulseCounter,
    /// 风杯旋转半径（厘米）
    radius_cm: f64,
    /// 风杯惯性修正系数
    adjustment: f64,
}

impl Anemometer {
    /// 创建风速计实例，监听指定GPIO针脚
    pub fn new(pin: u8, radius_cm: f64, adjustment: f64) -> anyhow::Result<Self> {
        let pulses = PulseCounter::listen(pin, None)?;
        Ok(Self::with_counter(pulses, radius_cm, adjustment))
    }

    /// 使用已有的脉冲计数器创建实例
    pub fn with_counter(pulses: PulseCounter, radius_cm: f64, adjustment: f64) -> Self {
        Self {
            pulses,
            radius_cm,
            adjustment,
        }
    }

    /// 共享脉冲计数的句柄
    pub fn pulses(&self) -> PulseCounter {
        self.pulses.handle()
    }

    /// 清零半圈计数
    pub fn reset(&self) {
        self.pulses.reset();
    }

    /// 自上次清零以来转过的圈数
    pub fn rotations(&self) -> f64 {
        self.pulses.count() as f64 / 2.0
    }

    /// 计算`elapsed`时间内的风速（km/h），不清零
    pub fn speed(&self, elapsed: Duration) -> f64 {
        calculate_speed(self.pulses.count(), elapsed, self.radius_cm, self.adjustment)
    }

    /// 计算`elapsed`时间内的风速（km/h）并清零
    pub fn take_speed(&self, elapsed: Duration) -> f64 {
        self.take_sample(elapsed).speed
    }

    /// 取出`elapsed`时间内的圈数和风速并清零
    pub fn take_sample(&self, elapsed: Duration) -> SpeedSample {
        let half_rotations = self.pulses.take();
        SpeedSample {
            rotations: half_rotations as f64 / 2.0,
            speed: calculate_speed(half_rotations, elapsed, self.radius_cm, self.adjustment),
        }
    }
}

/// 一个时间段内的风速采样
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    /// 转过的圈数
    pub rotations: f64,
    /// 风速（km/h）
    pub speed: f64,
}

/// 半圈计数换算为风速（km/h）
///
/// 风杯走过的距离 = 周长 × 圈数，除以时间得到风杯线速度，
/// 再乘修正系数补偿风杯惯性带来的损失。
pub fn calculate_speed(half_rotations: u32, elapsed: Duration, radius_cm: f64, adjustment: f64) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }

    let circumference_cm = 2.0 * PI * radius_cm;
    let rotations = half_rotations as f64 / 2.0;
    // 风杯走过的距离（公里）
    let dist_km = circumference_cm * rotations / CM_IN_A_KM;
    let km_per_hour = dist_km / secs * SECS_IN_AN_HOUR;

    km_per_hour * adjustment
}
