//! 自制气象站（Build Your Own Weather Station）的树莓派驱动
//!
//! 轮询风速计、风向标、雨量计、DS18B20土壤温度探头和BME280，
//! 每个采样窗口产生一个复合数据包交给气象记录主机。

pub mod config;
pub mod driver;
pub mod error;
pub mod packet;
pub mod sampler;
pub mod sensor;
pub mod station;
pub mod std_clock;
