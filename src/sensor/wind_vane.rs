use log::debug;

use super::AnalogInput;
use crate::error::SensorError;

/// 风向标电压（0.1V为单位）与风向角度的对照表
///
/// 风向标内部是8个干簧管和不同阻值的电阻，与分压电阻组成分压电路，
/// 相邻两个干簧管同时闭合时得到中间方向，共16个方向。
const WIND_VANE_DECIVOLTS: [(i32, f64); 16] = [
    (4, 0.0),
    (14, 22.5),
    (12, 45.0),
    (28, 67.5),
    (27, 90.0),
    (29, 112.5),
    (22, 135.0),
    (25, 157.5),
    (18, 180.0),
    (20, 202.5),
    (7, 225.0),
    (8, 247.5),
    (1, 270.0),
    (3, 292.5),
    (2, 315.0),
    (6, 337.5),
];

/// 平均向量长度低于该值时认为风向无意义（各方向互相抵消）
const MIN_RESULTANT: f64 = 1e-9;

/// 风向标封装对象
pub struct WindVane<A> {
    adc: A,
    /// ADC参考电压（伏）
    reference_volts: f64,
}

impl<A: AnalogInput> WindVane<A> {
    /// 创建风向标实例
    pub fn new(adc: A, reference_volts: f64) -> Self {
        Self {
            adc,
            reference_volts,
        }
    }

    /// 读取风向标当前电压（伏）
    pub fn read_volts(&mut self) -> Result<f64, SensorError> {
        Ok(self.adc.read_fraction()? * self.reference_volts)
    }

    /// 读取当前风向（度）
    ///
    /// 电压不在对照表中时返回`None`，这类读数直接丢弃。
    pub fn read_direction(&mut self) -> Result<Option<f64>, SensorError> {
        let volts = self.read_volts()?;
        let direction = direction_for_voltage(volts);
        if direction.is_none() {
            debug!("未知的风向标电压: {:.1}V", volts);
        }
        Ok(direction)
    }
}

/// 电压四舍五入到0.1V后查表
pub fn direction_for_voltage(volts: f64) -> Option<f64> {
    let decivolts = (volts * 10.0).round() as i32;
    WIND_VANE_DECIVOLTS
        .iter()
        .find(|(dv, _)| *dv == decivolts)
        .map(|(_, degrees)| *degrees)
}

/// 计算一组角度的圆周平均值（度，范围[0, 360)）
///
/// 角度不能直接求算术平均（350°和10°的平均应是0°而不是180°），
/// 需要先把每个角度转换为单位向量，对正弦、余弦分别求平均，再求反正切。
///
/// 输入为空或平均向量长度接近0时返回`None`。
pub fn average_direction(angles: &[f64]) -> Option<f64> {
    if angles.is_empty() {
        return None;
    }

    let (sin_sum, cos_sum) = angles.iter().fold((0.0_f64, 0.0_f64), |(s, c), angle| {
        let r = angle.to_radians();
        (s + r.sin(), c + r.cos())
    });
    let len = angles.len() as f64;
    let s = sin_sum / len;
    let c = cos_sum / len;

    if s.hypot(c) < MIN_RESULTANT {
        return None;
    }

    let average = s.atan2(c).to_degrees().rem_euclid(360.0);
    // rem_euclid在极小的负数上可能得到360
    if average >= 360.0 {
        Some(0.0)
    } else {
        Some(average)
    }
}
