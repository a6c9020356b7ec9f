use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_timers::clock::Clock;
use log::{trace, warn};

use crate::sensor::AnalogInput;
use crate::sensor::anemometer::{Anemometer, SpeedSample};
use crate::sensor::wind_vane::{WindVane, average_direction};

/// 采样窗口的时间参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    /// 一个数据包对应的窗口长度
    pub window: Duration,
    /// 风速子窗口长度，每个子窗口得到一个风速值
    pub wind_interval: Duration,
    /// 风向采样间隔
    pub direction_period: Duration,
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5),
            wind_interval: Duration::from_secs(1),
            direction_period: Duration::from_millis(50),
        }
    }
}

/// 一个窗口内的风数据累加器
#[derive(Debug, Default, Clone)]
pub struct WindWindow {
    /// 各子窗口的风速（km/h）
    speeds: Vec<f64>,
    /// 有效的风向读数（度）
    directions: Vec<f64>,
    /// 累计圈数
    rotations: f64,
}

impl WindWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个子窗口的风速
    pub fn push_speed(&mut self, sample: SpeedSample) {
        self.speeds.push(sample.speed);
        self.rotations += sample.rotations;
    }

    /// 记录一个风向读数
    pub fn push_direction(&mut self, degrees: f64) {
        self.directions.push(degrees);
    }

    /// 汇总窗口
    ///
    /// - 平均风速: 子窗口风速的算术平均
    /// - 阵风: 子窗口风速的最大值
    /// - 风向: 所有有效读数的圆周平均
    pub fn summary(&self) -> WindSummary {
        let speed = if self.speeds.is_empty() {
            0.0
        } else {
            self.speeds.iter().sum::<f64>() / self.speeds.len() as f64
        };
        let gust = self.speeds.iter().copied().fold(0.0, f64::max);

        WindSummary {
            speed,
            gust,
            direction: average_direction(&self.directions),
            rotations: self.rotations,
        }
    }
}

/// 窗口汇总结果
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WindSummary {
    /// 平均风速（km/h）
    pub speed: f64,
    /// 阵风（km/h）
    pub gust: f64,
    /// 平均风向（度），没有有效读数时为`None`
    pub direction: Option<f64>,
    /// 窗口内风杯转过的圈数
    pub rotations: f64,
}

/// 按采样计划采集一个窗口的风数据
///
/// 每个子窗口开始时清零风速计，子窗口内按间隔读取风向，
/// 结束时按实际经过的时间换算风速。
/// 窗口剩余时间不足一个子窗口时，最后一个子窗口相应缩短。
pub fn sample_wind<A, C>(
    plan: &SamplingPlan,
    anemometer: &Anemometer,
    vane: &mut WindVane<A>,
    clock: &mut C,
) -> WindSummary
where
    A: AnalogInput,
    C: Clock<Instant = Instant> + DelayNs,
{
    let mut window = WindWindow::new();

    let start = clock.now();
    loop {
        let remaining = plan.window.saturating_sub(clock.elapsed(start));
        if remaining.is_zero() {
            break;
        }
        let sub_window = plan.wind_interval.min(remaining);

        let wind_start = clock.now();
        anemometer.reset();

        loop {
            let left = sub_window.saturating_sub(clock.elapsed(wind_start));
            if left.is_zero() {
                break;
            }
            match vane.read_direction() {
                Ok(Some(degrees)) => window.push_direction(degrees),
                // 未知电压已在风向标内记录
                Ok(None) => {}
                Err(err) => warn!("读取风向标失败: {}", err),
            }
            clock.delay_us(delay_micros(plan.direction_period.min(left)));
        }

        let sample = anemometer.take_sample(clock.elapsed(wind_start));
        trace!("子窗口风速: {:.2} km/h, {:.1} 圈", sample.speed, sample.rotations);
        window.push_speed(sample);
    }

    window.summary()
}

/// 延时换算为微秒，至少1微秒以保证时间前进
fn delay_micros(wait: Duration) -> u32 {
    u32::try_from(wait.as_micros()).unwrap_or(u32::MAX).max(1)
}
