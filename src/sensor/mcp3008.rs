use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use super::AnalogInput;
use crate::error::SensorError;

/// SPI时钟频率（MCP3008在3.3V供电时最高1.35MHz）
const SPI_CLOCK_HZ: u32 = 1_000_000;
/// 10位ADC的最大读数
const MAX_READING: u16 = 1023;

/// MCP3008 8通道10位ADC的单个通道
pub struct Mcp3008Channel {
    spi: Spi,
    channel: u8,
}

impl Mcp3008Channel {
    /// 打开SPI0/CE0上的MCP3008指定通道
    pub fn new(channel: u8) -> anyhow::Result<Self> {
        if channel > 7 {
            return Err(SensorError::ChannelOutOfRange(channel).into());
        }
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
        Ok(Self { spi, channel })
    }

    /// 读取原始10位数值
    pub fn read_raw(&mut self) -> Result<u16, SensorError> {
        let request = request_frame(self.channel)?;
        let mut response = [0u8; 3];
        self.spi.transfer(&mut response, &request)?;
        Ok(parse_response(&response))
    }
}

impl AnalogInput for Mcp3008Channel {
    fn read_fraction(&mut self) -> Result<f64, SensorError> {
        Ok(self.read_raw()? as f64 / MAX_READING as f64)
    }
}

/// 构建单端读取请求
///
/// - 第1字节: 起始位
/// - 第2字节: 高4位为 单端模式位 + 3位通道号
/// - 第3字节: 占位，用来时钟输出低8位数据
fn request_frame(channel: u8) -> Result<[u8; 3], SensorError> {
    if channel > 7 {
        return Err(SensorError::ChannelOutOfRange(channel));
    }
    Ok([0x01, (0x08 | channel) << 4, 0x00])
}

/// 解析应答：第2字节低2位是高位，第3字节是低8位
fn parse_response(response: &[u8; 3]) -> u16 {
    (((response[1] & 0x03) as u16) << 8) | response[2] as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_frame() {
        assert_eq!(request_frame(0).unwrap(), [0x01, 0x80, 0x00]);
        assert_eq!(request_frame(7).unwrap(), [0x01, 0xF0, 0x00]);
        assert!(matches!(
            request_frame(8),
            Err(SensorError::ChannelOutOfRange(8))
        ));
    }

    #[test]
    fn test_parse_response() {
        // 高位之外的杂散位要被屏蔽
        assert_eq!(parse_response(&[0xFF, 0xFF, 0xFF]), 1023);
        assert_eq!(parse_response(&[0x00, 0x02, 0x10]), 0x210);
        assert_eq!(parse_response(&[0x00, 0x00, 0x00]), 0);
    }
}
