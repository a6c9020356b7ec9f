use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// 传感器读取错误
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("I2C通信失败: {0:?}")]
    I2c(ErrorKind),

    #[error("SPI通信失败: {0}")]
    Spi(#[from] rppal::spi::Error),

    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("无效的ADC通道: {0}（MCP3008只有0~7通道）")]
    ChannelOutOfRange(u8),

    #[error("芯片ID不匹配: 期望 {expected:#04x}, 实际 {found:#04x}")]
    ChipId { expected: u8, found: u8 },

    #[error("传感器正在更新校准数据")]
    NotReady,

    #[error("CRC校验失败（已尝试 {attempts} 次）")]
    Crc { attempts: u32 },

    #[error("数据解析失败: {0}")]
    Parse(String),

    #[error("{0}超出范围")]
    OutOfRange(&'static str),
}

impl SensorError {
    /// 把任意I2C总线错误转换为统一的错误类型
    pub fn i2c<E: embedded_hal::i2c::Error>(err: E) -> Self {
        Self::I2c(err.kind())
    }
}
