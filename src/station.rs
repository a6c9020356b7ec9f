use std::time::Instant;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use embedded_timers::clock::Clock;
use log::{debug, info, warn};

use crate::config::StationConfig;
use crate::packet::{LoopPacket, mm_to_cm, pa_to_hpa};
use crate::sampler::{SamplingPlan, WindSummary, sample_wind};
use crate::sensor::AnalogInput;
use crate::sensor::anemometer::Anemometer;
use crate::sensor::bme280::Bme280;
use crate::sensor::ds18b20::Ds18b20;
use crate::sensor::mcp3008::Mcp3008Channel;
use crate::sensor::rain_gauge::RainGauge;
use crate::sensor::wind_vane::WindVane;

/// 树莓派上的气象站
pub type RpiStation = Station<Mcp3008Channel, rppal::i2c::I2c>;

/// 气象站，持有全部传感器
pub struct Station<A, I> {
    anemometer: Anemometer,
    wind_vane: WindVane<A>,
    rain_gauge: RainGauge,
    /// 初始化失败时为`None`
    bme280: Option<Bme280<I>>,
    /// 没有探头时为`None`
    soil_probe: Option<Ds18b20>,
}

impl RpiStation {
    /// 按配置打开树莓派上的全部传感器
    pub fn open(config: &StationConfig) -> anyhow::Result<Self> {
        let anemometer = Anemometer::new(
            config.anemometer_pin,
            config.anemometer_radius_cm,
            config.anemometer_adjustment,
        )?;
        let rain_gauge = RainGauge::new(config.rain_bucket_pin, config.bucket_size)?;
        let adc = Mcp3008Channel::new(config.mcp3008_channel)?;
        let wind_vane = WindVane::new(adc, config.adc_reference_volts);

        // BME280初始化失败不影响其它传感器工作
        let bme280 = rppal::i2c::I2c::with_bus(config.bme280_port)
            .map_err(anyhow::Error::from)
            .and_then(|i2c| Bme280::new(i2c, config.bme280_address).map_err(anyhow::Error::from));
        let bme280 = match bme280 {
            Ok(sensor) => Some(sensor),
            Err(err) => {
                warn!(
                    "BME280初始化失败（总线{}, 地址{:#04x}）: {}",
                    config.bme280_port, config.bme280_address, err
                );
                None
            }
        };

        Ok(Self::new(
            anemometer,
            wind_vane,
            rain_gauge,
            bme280,
            Ds18b20::discover(&config.w1_devices_dir),
        ))
    }
}

impl<A: AnalogInput, I: I2c> Station<A, I> {
    /// 使用已经构建好的传感器创建气象站
    pub fn new(
        anemometer: Anemometer,
        wind_vane: WindVane<A>,
        rain_gauge: RainGauge,
        bme280: Option<Bme280<I>>,
        soil_probe: Option<Ds18b20>,
    ) -> Self {
        match &soil_probe {
            Some(probe) => info!("土壤温度探头: {}", probe.device_file().display()),
            None => warn!("未找到DS18B20土壤温度探头"),
        }
        Self {
            anemometer,
            wind_vane,
            rain_gauge,
            bme280,
            soil_probe,
        }
    }

    /// 采集一个窗口的风数据
    pub fn sample_wind<C>(&mut self, plan: &SamplingPlan, clock: &mut C) -> WindSummary
    where
        C: Clock<Instant = Instant> + DelayNs,
    {
        sample_wind(plan, &self.anemometer, &mut self.wind_vane, clock)
    }

    /// 读取BME280，返回（温度【℃】，湿度【%】，气压【hPa】）
    fn read_bme280(&mut self) -> Option<(f64, f64, f64)> {
        let sensor = self.bme280.as_mut()?;
        match sensor.read() {
            Ok(m) => Some((
                m.temperature as f64,
                m.humidity as f64,
                pa_to_hpa(m.pressure as f64),
            )),
            Err(err) => {
                debug!("读取BME280失败，本周期数据为空: {}", err);
                None
            }
        }
    }

    /// 读取土壤温度（℃）
    fn read_soil_temp(&mut self) -> Option<f64> {
        let probe = self.soil_probe.as_ref()?;
        match probe.read_temperature() {
            Ok(temperature) => Some(temperature as f64),
            Err(err) => {
                debug!("读取土壤温度失败: {}", err);
                None
            }
        }
    }

    /// 把风数据与其它传感器读数组装为数据包
    ///
    /// 降雨量为自上一个数据包以来的累计值
    pub fn collect(&mut self, wind: &WindSummary, date_time: i64) -> LoopPacket {
        let mut packet = LoopPacket::new(date_time);

        if let Some((temperature, humidity, pressure)) = self.read_bme280() {
            packet.out_temp = Some(temperature);
            packet.out_humidity = Some(humidity);
            packet.pressure = Some(pressure);
        }
        packet.soil_temp1 = self.read_soil_temp();
        packet.rain = mm_to_cm(self.rain_gauge.take_rainfall_mm());

        packet.wind_dir = wind.direction;
        packet.wind_speed = wind.speed;
        packet.wind_gust = wind.gust;
        packet.anem_rotations = wind.rotations;

        packet
    }
}
