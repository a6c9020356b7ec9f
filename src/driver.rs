use std::time::Instant;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use embedded_timers::clock::Clock;
use log::{debug, info};

use crate::config::{ConfigError, StationConfig};
use crate::packet::{LoopPacket, unix_now};
use crate::sampler::SamplingPlan;
use crate::sensor::AnalogInput;
use crate::station::Station;

/// 驱动名称
pub const DRIVER_NAME: &str = "BYOWS";
/// 驱动版本
pub const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 气象站驱动
///
/// 每个采样窗口结束后产生一个数据包
pub struct Driver<A, I, C> {
    hardware: String,
    plan: SamplingPlan,
    station: Station<A, I>,
    clock: C,
}

impl<A, I, C> Driver<A, I, C>
where
    A: AnalogInput,
    I: I2c,
    C: Clock<Instant = Instant> + DelayNs,
{
    /// 配置无效时返回错误
    pub fn new(config: &StationConfig, station: Station<A, I>, clock: C) -> Result<Self, ConfigError> {
        info!("using driver {}", DRIVER_NAME);
        info!("driver version is {}", DRIVER_VERSION);

        let plan = config.sampling_plan()?;
        debug!(
            "采样窗口 {:?}, 风速子窗口 {:?}, 风向采样间隔 {:?}",
            plan.window, plan.wind_interval, plan.direction_period
        );

        Ok(Self {
            hardware: config.hardware.clone(),
            plan,
            station,
            clock,
        })
    }

    /// 硬件名称
    pub fn hardware_name(&self) -> &str {
        &self.hardware
    }

    /// 采集一个窗口并生成数据包
    pub fn next_packet(&mut self) -> LoopPacket {
        let wind = self.station.sample_wind(&self.plan, &mut self.clock);
        let packet = self.station.collect(&wind, unix_now());
        debug!("数据包: {:?}", packet);
        packet
    }

    /// 无限产生数据包的迭代器
    pub fn loop_packets(&mut self) -> LoopPackets<'_, A, I, C> {
        LoopPackets { driver: self }
    }
}

/// 数据包迭代器，永不结束
pub struct LoopPackets<'a, A, I, C> {
    driver: &'a mut Driver<A, I, C>,
}

impl<A, I, C> Iterator for LoopPackets<'_, A, I, C>
where
    A: AnalogInput,
    I: I2c,
    C: Clock<Instant = Instant> + DelayNs,
{
    type Item = LoopPacket;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.driver.next_packet())
    }
}
