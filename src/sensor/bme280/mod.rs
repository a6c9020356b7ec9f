use std::thread;
use std::time::Duration;

use embedded_hal::i2c::I2c;

use crate::error::SensorError;

/// 芯片ID寄存器
const REG_CHIP_ID: u8 = 0xD0;
/// 软复位寄存器
const REG_RESET: u8 = 0xE0;
/// 湿度采样控制寄存器
const REG_CTRL_HUM: u8 = 0xF2;
/// 状态寄存器
const REG_STATUS: u8 = 0xF3;
/// 温度、压力采样及工作模式控制寄存器
const REG_CTRL_MEAS: u8 = 0xF4;
/// 待机时间与滤波器配置寄存器
const REG_CONFIG: u8 = 0xF5;
/// 测量数据起始寄存器（0xF7~0xFE）
const REG_DATA: u8 = 0xF7;
/// 温度/压力校准参数起始寄存器（0x88~0x9F）
const REG_CALIB_TP: u8 = 0x88;
/// 湿度校准参数 H1
const REG_CALIB_H1: u8 = 0xA1;
/// 湿度校准参数 H2~H6（0xE1~0xE7）
const REG_CALIB_H2: u8 = 0xE1;

/// BME280的芯片ID（BMP280为0x58，没有湿度传感器）
pub const CHIP_ID: u8 = 0x60;
/// SDO接高电平时的默认地址
pub const DEFAULT_ADDRESS: u8 = 0x77;

/// BME280校准参数
///
/// 出厂时写入NVM，用于把原始ADC读数补偿为实际的温度、压力、湿度。
/// - 温度/压力参数: 0x88~0x9F (24字节，小端序)
/// - 湿度参数: 0xA1, 0xE1~0xE7
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Calibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,

    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,

    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    /// 0xE4[7:0] << 4 | 0xE5[3:0]，12位有符号
    pub dig_h4: i16,
    /// 0xE6[7:0] << 4 | 0xE5[7:4]，12位有符号
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl Calibration {
    /// 解析校准参数
    ///
    /// - `tp`: 0x88~0x9F
    /// - `h1`: 0xA1
    /// - `h`: 0xE1~0xE7
    pub fn parse(tp: &[u8; 24], h1: u8, h: &[u8; 7]) -> Self {
        let le_u16 = |i: usize| u16::from_le_bytes([tp[i], tp[i + 1]]);
        let le_i16 = |i: usize| i16::from_le_bytes([tp[i], tp[i + 1]]);

        Self {
            dig_t1: le_u16(0),
            dig_t2: le_i16(2),
            dig_t3: le_i16(4),
            dig_p1: le_u16(6),
            dig_p2: le_i16(8),
            dig_p3: le_i16(10),
            dig_p4: le_i16(12),
            dig_p5: le_i16(14),
            dig_p6: le_i16(16),
            dig_p7: le_i16(18),
            dig_p8: le_i16(20),
            dig_p9: le_i16(22),
            dig_h1: h1,
            dig_h2: i16::from_le_bytes([h[0], h[1]]),
            dig_h3: h[2],
            // 高8位带符号
            dig_h4: (i16::from(h[3] as i8) << 4) | (i16::from(h[4]) & 0x0F),
            dig_h5: (i16::from(h[5] as i8) << 4) | (i16::from(h[4]) >> 4),
            dig_h6: h[6] as i8,
        }
    }

    /// 温度补偿
    ///
    /// 返回（温度【℃】，t_fine），t_fine 供压力与湿度补偿使用
    pub fn compensate_temperature(&self, adc_t: i32) -> (f32, i32) {
        let dig_t1 = self.dig_t1 as i32;
        let dig_t2 = self.dig_t2 as i32;
        let dig_t3 = self.dig_t3 as i32;

        let var1 = (((adc_t >> 3) - (dig_t1 << 1)) * dig_t2) >> 11;
        let var2 = (((((adc_t >> 4) - dig_t1) * ((adc_t >> 4) - dig_t1)) >> 12) * dig_t3) >> 14;

        let t_fine = var1 + var2;
        // 单位0.01℃
        let temperature = (t_fine * 5 + 128) >> 8;

        (temperature as f32 / 100.0, t_fine)
    }

    /// 压力补偿（64位整型版本），返回Pa
    pub fn compensate_pressure(&self, adc_p: i32, t_fine: i32) -> f32 {
        let dig_p1 = self.dig_p1 as i64;
        let dig_p2 = self.dig_p2 as i64;
        let dig_p3 = self.dig_p3 as i64;
        let dig_p4 = self.dig_p4 as i64;
        let dig_p5 = self.dig_p5 as i64;
        let dig_p6 = self.dig_p6 as i64;
        let dig_p7 = self.dig_p7 as i64;
        let dig_p8 = self.dig_p8 as i64;
        let dig_p9 = self.dig_p9 as i64;

        let mut var1 = t_fine as i64 - 128000;
        let mut var2 = var1 * var1 * dig_p6;
        var2 += (var1 * dig_p5) << 17;
        var2 += dig_p4 << 35;
        var1 = ((var1 * var1 * dig_p3) >> 8) + ((var1 * dig_p2) << 12);
        var1 = (((1_i64 << 47) + var1) * dig_p1) >> 33;

        // 避免除零
        if var1 == 0 {
            return 0.0;
        }

        let mut p = 1048576 - adc_p as i64;
        p = (((p << 31) - var2) * 3125) / var1;
        var1 = (dig_p9 * (p >> 13) * (p >> 13)) >> 25;
        var2 = (dig_p8 * p) >> 19;
        p = ((p + var1 + var2) >> 8) + (dig_p7 << 4);

        // Q24.8格式
        (p as f64 / 256.0) as f32
    }

    /// 湿度补偿，返回%RH（0.0~100.0）
    pub fn compensate_humidity(&self, adc_h: i32, t_fine: i32) -> f32 {
        let dig_h1 = self.dig_h1 as i32;
        let dig_h2 = self.dig_h2 as i32;
        let dig_h3 = self.dig_h3 as i32;
        let dig_h4 = self.dig_h4 as i32;
        let dig_h5 = self.dig_h5 as i32;
        let dig_h6 = self.dig_h6 as i32;

        let v_x1 = t_fine - 76800;
        let var2 = (((adc_h << 14) - (dig_h4 << 20) - (dig_h5 * v_x1)) + 16384) >> 15;
        let var3 = (((v_x1 * dig_h6) >> 10) * (((v_x1 * dig_h3) >> 11) + 32768)) >> 10;
        let var4 = ((var3 + 2097152) * dig_h2 + 8192) >> 14;
        let mut var5 = var2 * var4;
        var5 -= ((((var5 >> 15) * (var5 >> 15)) >> 7) * dig_h1) >> 4;
        let var5 = var5.clamp(0, 419430400);

        // Q22.10格式
        (var5 >> 12) as f32 / 1024.0
    }

    /// 补偿一组原始数据
    pub fn compensate(&self, raw: &RawSample) -> Measurement {
        let (temperature, t_fine) = self.compensate_temperature(raw.temperature);
        Measurement {
            temperature,
            pressure: self.compensate_pressure(raw.pressure, t_fine),
            humidity: self.compensate_humidity(raw.humidity, t_fine),
        }
    }
}

/// 原始ADC读数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// 20位压力
    pub pressure: i32,
    /// 20位温度
    pub temperature: i32,
    /// 16位湿度
    pub humidity: i32,
}

impl RawSample {
    /// 解析 0xF7~0xFE 的8字节测量数据
    pub fn parse(data: &[u8; 8]) -> Self {
        let pressure = ((data[0] as i32) << 12) | ((data[1] as i32) << 4) | ((data[2] as i32) >> 4);
        let temperature = ((data[3] as i32) << 12) | ((data[4] as i32) << 4) | ((data[5] as i32) >> 4);
        let humidity = ((data[6] as i32) << 8) | data[7] as i32;
        Self {
            pressure,
            temperature,
            humidity,
        }
    }
}

/// 补偿后的测量结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// 温度（℃）
    pub temperature: f32,
    /// 气压（Pa）
    pub pressure: f32,
    /// 相对湿度（%RH）
    pub humidity: f32,
}

/// BME280 大气压力、温度、湿度传感器封装对象
pub struct Bme280<I> {
    /// I2C通信总线
    i2c: I,
    /// I2C从设备地址（0x76或0x77）
    address: u8,
    /// 校准参数
    calib: Calibration,
}

impl<I: I2c> Bme280<I> {
    /// 创建BME280传感器实例并初始化
    pub fn new(i2c: I, address: u8) -> Result<Self, SensorError> {
        let mut sensor = Self {
            i2c,
            address,
            calib: Calibration::default(),
        };

        // 传感器上电后必须等待2ms以上
        thread::sleep(Duration::from_millis(3));

        // 检查芯片ID
        let found = sensor.read_register(REG_CHIP_ID)?;
        if found != CHIP_ID {
            return Err(SensorError::ChipId {
                expected: CHIP_ID,
                found,
            });
        }

        sensor.wait_ready()?;
        sensor.read_calibration()?;
        sensor.configure()?;

        // OK
        Ok(sensor)
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calib
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut value = [0u8];
        self.i2c
            .write_read(self.address, &[reg], &mut value)
            .map_err(SensorError::i2c)?;
        Ok(value[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(SensorError::i2c)
    }

    /// 等待NVM校准数据复制完成（状态寄存器第0位）
    fn wait_ready(&mut self) -> Result<(), SensorError> {
        for _ in 0..10 {
            if self.read_register(REG_STATUS)? & 0x01 == 0 {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(2));
        }
        Err(SensorError::NotReady)
    }

    /// 读取校准数据
    fn read_calibration(&mut self) -> Result<(), SensorError> {
        let mut tp = [0u8; 24];
        self.i2c
            .write_read(self.address, &[REG_CALIB_TP], &mut tp)
            .map_err(SensorError::i2c)?;

        let h1 = self.read_register(REG_CALIB_H1)?;

        let mut h = [0u8; 7];
        self.i2c
            .write_read(self.address, &[REG_CALIB_H2], &mut h)
            .map_err(SensorError::i2c)?;

        self.calib = Calibration::parse(&tp, h1, &h);
        Ok(())
    }

    /// 湿度、温度、压力均1倍过采样，正常模式，关闭滤波器
    fn configure(&mut self) -> Result<(), SensorError> {
        // ctrl_hum 需要在写 ctrl_meas 之后才生效，所以先写它
        self.write_register(REG_CTRL_HUM, 0x01)?;
        // osrs_t = 1x, osrs_p = 1x, mode = normal: 0b001_001_11
        self.write_register(REG_CTRL_MEAS, 0x27)?;
        // 待机0.5ms，滤波器关闭
        self.write_register(REG_CONFIG, 0x00)
    }

    /// 读取原始数据
    pub fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        let mut data = [0u8; 8];
        self.i2c
            .write_read(self.address, &[REG_DATA], &mut data)
            .map_err(SensorError::i2c)?;

        // 跳过的测量通道会返回0x80000（湿度为0x8000）
        let raw = RawSample::parse(&data);
        if raw.temperature == 0x80000 {
            return Err(SensorError::OutOfRange("温度"));
        }
        if raw.pressure == 0x80000 {
            return Err(SensorError::OutOfRange("压力"));
        }
        Ok(raw)
    }

    /// 读取补偿后的温度、气压、湿度
    pub fn read(&mut self) -> Result<Measurement, SensorError> {
        let raw = self.read_raw()?;
        Ok(self.calib.compensate(&raw))
    }

    /// 软复位传感器并重新读取校准数据
    pub fn reset(&mut self) -> Result<(), SensorError> {
        self.write_register(REG_RESET, 0xB6)?;
        // 等待重置完成
        thread::sleep(Duration::from_millis(5));
        self.wait_ready()?;
        self.read_calibration()?;
        self.configure()
    }
}
