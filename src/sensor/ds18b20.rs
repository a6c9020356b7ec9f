use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::SensorError;

/// 树莓派单总线设备默认挂载目录
///
/// 需要在 /etc/modules 中加入 w1-gpio 与 w1-therm 并重启
pub const W1_DEVICES_DIR: &str = "/sys/bus/w1/devices";
/// DS18B20的家族码，设备目录名以此开头
const FAMILY_CODE: &str = "28";
/// CRC校验失败后的最多重读次数
const MAX_RETRIES: u32 = 3;

/// DS18B20 单总线温度探头封装对象
pub struct Ds18b20 {
    /// w1_slave 文件路径
    device_file: PathBuf,
    /// CRC校验失败后的重读间隔
    retry_delay: Duration,
}

impl Ds18b20 {
    /// 在单总线目录中查找第一个DS18B20探头
    ///
    /// 目录不存在或没有探头时返回`None`
    pub fn discover(devices_dir: impl AsRef<Path>) -> Option<Self> {
        let entries = fs::read_dir(devices_dir.as_ref()).ok()?;
        let mut devices: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(FAMILY_CODE))
            .map(|entry| entry.path())
            .collect();
        // 目录遍历顺序不固定，排序后保证每次选中同一个探头
        devices.sort();

        devices.into_iter().next().map(|dir| Self::new(dir.join("w1_slave")))
    }

    /// 使用指定的 w1_slave 文件创建实例
    pub fn new(device_file: impl Into<PathBuf>) -> Self {
        Self {
            device_file: device_file.into(),
            retry_delay: Duration::from_millis(200),
        }
    }

    /// 设置CRC校验失败后的重读间隔
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn device_file(&self) -> &Path {
        &self.device_file
    }

    /// 读取温度（℃）
    ///
    /// w1_slave 文件格式:
    /// ```text
    /// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
    /// 72 01 4b 46 7f ff 0e 10 57 t=23125
    /// ```
    pub fn read_temperature(&self) -> Result<f32, SensorError> {
        self.read_with(|| fs::read_to_string(&self.device_file))
    }

    fn read_with<F>(&self, mut read: F) -> Result<f32, SensorError>
    where
        F: FnMut() -> io::Result<String>,
    {
        let mut content = read()?;
        let mut attempts = 1;

        // 校验失败则稍后重读
        while !crc_ok(&content) {
            if attempts > MAX_RETRIES {
                return Err(SensorError::Crc { attempts });
            }
            thread::sleep(self.retry_delay);
            content = read()?;
            attempts += 1;
        }

        parse_temperature(&content)
    }
}

/// 第一行以 YES 结尾表示CRC校验通过
fn crc_ok(content: &str) -> bool {
    content
        .lines()
        .next()
        .map(|line| line.trim().ends_with("YES"))
        .unwrap_or(false)
}

/// 解析第二行 `t=` 之后的千分之一摄氏度
fn parse_temperature(content: &str) -> Result<f32, SensorError> {
    let line = content
        .lines()
        .nth(1)
        .ok_or_else(|| SensorError::Parse("缺少温度行".to_string()))?;
    let pos = line
        .find("t=")
        .ok_or_else(|| SensorError::Parse(format!("温度行中没有t=: {}", line)))?;
    let milli: i32 = line[pos + 2..]
        .trim()
        .parse()
        .map_err(|err| SensorError::Parse(format!("温度值无效: {}", err)))?;

    Ok(milli as f32 / 1000.0)
}
