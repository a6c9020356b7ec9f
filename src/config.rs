use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::sampler::SamplingPlan;
use crate::sensor::ds18b20::W1_DEVICES_DIR;

/// 时间间隔上限（秒）
const MAX_INTERVAL_SECS: f64 = 3600.0;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path} 失败: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("解析配置文件失败: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("配置项 {key} 无效: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// 配置文件结构，站点配置位于 `[BYOWS]` 表中
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(rename = "BYOWS", default)]
    byows: StationConfig,
}

/// 气象站配置
///
/// 所有配置项都是可选的，缺省值对应官方教程的接线方式。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// 主机写入的驱动模块名，本程序不使用
    pub driver: Option<String>,
    /// 硬件名称
    pub hardware: String,
    /// 数据包间隔（秒）
    pub loop_interval: f64,
    /// 风速子窗口（秒）
    pub wind_interval: f64,
    /// 风向采样间隔（毫秒）
    pub direction_sample_ms: u32,
    /// 风速计GPIO针脚（BCM编号）
    pub anemometer_pin: u8,
    /// 雨量计GPIO针脚（BCM编号）
    pub rain_bucket_pin: u8,
    /// BME280所在I2C总线
    pub bme280_port: u8,
    /// BME280的I2C地址
    pub bme280_address: u8,
    /// 风向标接入MCP3008的通道
    pub mcp3008_channel: u8,
    /// MCP3008参考电压（伏）
    pub adc_reference_volts: f64,
    /// 风速计修正系数
    pub anemometer_adjustment: f64,
    /// 风杯旋转半径（厘米）
    pub anemometer_radius_cm: f64,
    /// 雨量计每斗容量（毫米）
    pub bucket_size: f64,
    /// 单总线设备目录
    pub w1_devices_dir: PathBuf,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            driver: None,
            hardware: "BYOWS - Raspberry Pi".to_string(),
            loop_interval: 5.0,
            wind_interval: 1.0,
            direction_sample_ms: 50,
            anemometer_pin: 5,
            rain_bucket_pin: 6,
            bme280_port: 1,
            bme280_address: 0x77,
            mcp3008_channel: 0,
            adc_reference_volts: 3.3,
            anemometer_adjustment: 1.18,
            anemometer_radius_cm: 9.0,
            bucket_size: 0.2794,
            w1_devices_dir: PathBuf::from(W1_DEVICES_DIR),
        }
    }
}

impl StationConfig {
    /// 从TOML文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// 从TOML文本解析配置并校验
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        file.byows.validate()?;
        Ok(file.byows)
    }

    /// 校验配置项
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key, reason: &str| ConfigError::Invalid {
            key,
            reason: reason.to_string(),
        };

        // 取反比较同时排除NaN
        if !(self.loop_interval > 0.0 && self.loop_interval <= MAX_INTERVAL_SECS) {
            return Err(invalid("loop_interval", "必须在0~3600秒之间"));
        }
        if !(self.wind_interval > 0.0 && self.wind_interval <= MAX_INTERVAL_SECS) {
            return Err(invalid("wind_interval", "必须在0~3600秒之间"));
        }
        if self.wind_interval > self.loop_interval {
            return Err(invalid("wind_interval", "不能大于 loop_interval"));
        }
        if self.direction_sample_ms == 0 {
            return Err(invalid("direction_sample_ms", "必须大于0"));
        }
        if f64::from(self.direction_sample_ms) > self.wind_interval * 1000.0 {
            return Err(invalid("direction_sample_ms", "不能大于 wind_interval"));
        }
        if self.mcp3008_channel > 7 {
            return Err(invalid("mcp3008_channel", "MCP3008只有0~7通道"));
        }
        if self.anemometer_pin == self.rain_bucket_pin {
            return Err(invalid("rain_bucket_pin", "不能与 anemometer_pin 相同"));
        }
        if !(self.adc_reference_volts > 0.0) {
            return Err(invalid("adc_reference_volts", "必须大于0"));
        }
        if !(self.anemometer_adjustment > 0.0) {
            return Err(invalid("anemometer_adjustment", "必须大于0"));
        }
        if !(self.anemometer_radius_cm > 0.0) {
            return Err(invalid("anemometer_radius_cm", "必须大于0"));
        }
        if !(self.bucket_size > 0.0) {
            return Err(invalid("bucket_size", "必须大于0"));
        }

        Ok(())
    }

    /// 校验后由配置生成采样计划
    pub fn sampling_plan(&self) -> Result<SamplingPlan, ConfigError> {
        self.validate()?;

        let secs = |key, value: f64| {
            Duration::try_from_secs_f64(value).map_err(|err| ConfigError::Invalid {
                key,
                reason: err.to_string(),
            })
        };
        Ok(SamplingPlan {
            window: secs("loop_interval", self.loop_interval)?,
            wind_interval: secs("wind_interval", self.wind_interval)?,
            direction_period: Duration::from_millis(u64::from(self.direction_sample_ms)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = StationConfig::from_toml("").unwrap();
        assert_eq!(config, StationConfig::default());
        assert_eq!(config.sampling_plan().unwrap(), SamplingPlan::default());
    }

    #[test]
    fn test_parse_byows_section() {
        let text = r#"
[BYOWS]
    loop_interval = 2.5
    anemometer_pin = 17
    rain_bucket_pin = 27
    bme280_address = 0x76
    mcp3008_channel = 3
    bucket_size = 0.3
"#;
        let config = StationConfig::from_toml(text).unwrap();
        assert_eq!(config.loop_interval, 2.5);
        assert_eq!(config.anemometer_pin, 17);
        assert_eq!(config.rain_bucket_pin, 27);
        assert_eq!(config.bme280_address, 0x76);
        assert_eq!(config.mcp3008_channel, 3);
        assert_eq!(config.bucket_size, 0.3);
        // 未设置的项保持缺省值
        assert_eq!(config.anemometer_radius_cm, 9.0);
        assert_eq!(config.sampling_plan().unwrap().window, Duration::from_millis(2500));
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = StationConfig::from_toml(include_str!("../config/byows.toml")).unwrap();
        assert_eq!(config, StationConfig::default());
    }

    #[test]
    fn test_other_sections_are_ignored() {
        let text = "[Station]\nlocation = \"garden\"\n\n[BYOWS]\nloop_interval = 10.0\n";
        let config = StationConfig::from_toml(text).unwrap();
        assert_eq!(config.loop_interval, 10.0);
    }

    #[test]
    fn test_host_driver_key_accepted() {
        let text = "[BYOWS]\n    driver = \"user.byows_rpi\"\n    loop_interval = 2.5\n";
        let config = StationConfig::from_toml(text).unwrap();
        assert_eq!(config.driver.as_deref(), Some("user.byows_rpi"));
        assert_eq!(config.loop_interval, 2.5);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let text = "[BYOWS]\nanemometer_pins = 5\n";
        assert!(matches!(
            StationConfig::from_toml(text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            ("[BYOWS]\nloop_interval = 0.0\n", "loop_interval"),
            ("[BYOWS]\nwind_interval = 6.0\n", "wind_interval"),
            ("[BYOWS]\nmcp3008_channel = 8\n", "mcp3008_channel"),
            ("[BYOWS]\nrain_bucket_pin = 5\n", "rain_bucket_pin"),
            ("[BYOWS]\nbucket_size = -1.0\n", "bucket_size"),
            ("[BYOWS]\ndirection_sample_ms = 0\n", "direction_sample_ms"),
            ("[BYOWS]\ndirection_sample_ms = 1500\n", "direction_sample_ms"),
            ("[BYOWS]\nloop_interval = inf\n", "loop_interval"),
            ("[BYOWS]\nloop_interval = nan\n", "loop_interval"),
            ("[BYOWS]\nloop_interval = 1e20\n", "loop_interval"),
            ("[BYOWS]\nloop_interval = 1e20\nwind_interval = 1e20\n", "loop_interval"),
            ("[BYOWS]\nwind_interval = -inf\n", "wind_interval"),
        ];
        for (text, expected) in cases {
            match StationConfig::from_toml(text) {
                Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected),
                other => panic!("{} 应校验失败: {:?}", expected, other),
            }
        }

        // 超出u32范围的采样间隔在解析阶段就被拒绝
        assert!(matches!(
            StationConfig::from_toml("[BYOWS]\ndirection_sample_ms = 4294967296\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_sampling_plan_rejects_invalid_config() {
        let config = StationConfig {
            loop_interval: f64::INFINITY,
            ..StationConfig::default()
        };
        assert!(matches!(
            config.sampling_plan(),
            Err(ConfigError::Invalid {
                key: "loop_interval",
                ..
            })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            StationConfig::load(dir.path().join("byows.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
