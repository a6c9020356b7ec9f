pub mod anemometer;
pub mod bme280;
pub mod ds18b20;
pub mod mcp3008;
pub mod pulse_counter;
pub mod rain_gauge;
pub mod wind_vane;

use crate::error::SensorError;

/// 模拟量输入
///
/// 返回归一化后的读数（0.0~1.0），乘以参考电压即得实际电压
pub trait AnalogInput {
    fn read_fraction(&mut self) -> Result<f64, SensorError>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_fraction(&mut self) -> Result<f64, SensorError> {
        (**self).read_fraction()
    }
}
