use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// 公制单位系统的编号
///
/// 温度℃、气压hPa(mbar)、降雨量cm、风速km/h
pub const METRIC: u8 = 0x10;

/// 一个周期的复合读数
///
/// 字段名即气象记录主机识别的观测项名称，缺失的读数序列化为`null`。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopPacket {
    /// Unix时间戳（秒）
    pub date_time: i64,
    /// 单位系统
    pub us_units: u8,
    /// 室外温度（℃）
    pub out_temp: Option<f64>,
    /// 室外相对湿度（%）
    pub out_humidity: Option<f64>,
    /// 气压（hPa）
    pub pressure: Option<f64>,
    /// 土壤温度（℃）
    pub soil_temp1: Option<f64>,
    /// 本周期降雨量（cm）
    pub rain: f64,
    /// 风向（度）
    pub wind_dir: Option<f64>,
    /// 平均风速（km/h）
    pub wind_speed: f64,
    /// 阵风（km/h）
    pub wind_gust: f64,
    /// 风杯转过的圈数
    pub anem_rotations: f64,
}

impl LoopPacket {
    /// 创建一个只有时间戳的空数据包
    pub fn new(date_time: i64) -> Self {
        Self {
            date_time,
            us_units: METRIC,
            out_temp: None,
            out_humidity: None,
            pressure: None,
            soil_temp1: None,
            rain: 0.0,
            wind_dir: None,
            wind_speed: 0.0,
            wind_gust: 0.0,
            anem_rotations: 0.0,
        }
    }

    /// 序列化为单行JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// 当前时间（四舍五入到秒）
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_secs_f64() + 0.5) as i64)
        .unwrap_or(0)
}

/// 帕斯卡转换为百帕
pub fn pa_to_hpa(pa: f64) -> f64 {
    pa / 100.0
}

/// 毫米转换为厘米
pub fn mm_to_cm(mm: f64) -> f64 {
    mm / 10.0
}
