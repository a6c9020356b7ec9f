use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};
use std::time::{Duration, Instant};

use byows_rpi::error::SensorError;
use byows_rpi::sensor::AnalogInput;
use byows_rpi::sensor::pulse_counter::PulseCounter;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use embedded_timers::clock::Clock;

/// 模拟时钟：只有延时才会推动时间前进
#[derive(Debug, Clone)]
pub struct SimClock {
    base: Instant,
    nanos: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 已经过的模拟时间
    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

impl Clock for SimClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        self.base + self.total()
    }

    fn elapsed(&self, instant: Self::Instant) -> Duration {
        self.now() - instant
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.nanos.fetch_add(ns as u64, Ordering::SeqCst);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.nanos.fetch_add(ms as u64 * 1_000_000, Ordering::SeqCst);
    }
}

/// 模拟风向标：按顺序循环输出电压，每次读取同时让风杯转半圈
pub struct SimVane {
    volts: Vec<f64>,
    index: usize,
    spin: PulseCounter,
}

impl SimVane {
    pub fn new(volts: &[f64], spin: PulseCounter) -> Self {
        Self {
            volts: volts.to_vec(),
            index: 0,
            spin,
        }
    }
}

impl AnalogInput for SimVane {
    fn read_fraction(&mut self) -> Result<f64, SensorError> {
        self.spin.record();
        let volts = self.volts[self.index % self.volts.len()];
        self.index += 1;
        Ok(volts / 3.3)
    }
}

/// 模拟BME280的I2C总线（寄存器映射）
///
/// 克隆出的实例共享同一份寄存器，测试可以在传感器持有总线时检查寄存器
#[derive(Clone)]
pub struct SimBus {
    address: u8,
    regs: Arc<Mutex<[u8; 256]>>,
    pointer: usize,
    resets: Arc<AtomicUsize>,
    /// 置位后读取测量数据失败
    pub fail_data: Arc<AtomicBool>,
}

impl SimBus {
    /// 使用数据手册示例校准参数和原始读数构建
    pub fn datasheet(address: u8) -> Self {
        let mut regs = [0u8; 256];
        regs[0xD0] = 0x60;

        let tp: [i32; 12] = [
            27504, 26435, -1000, 36477, -10685, 3024, 2855, 140, -7, 15500, -14600, 6000,
        ];
        for (i, value) in tp.iter().enumerate() {
            let bytes = (*value as u16).to_le_bytes();
            regs[0x88 + i * 2] = bytes[0];
            regs[0x88 + i * 2 + 1] = bytes[1];
        }

        // 湿度校准: H1=75, H2=362, H3=0, H4=313, H5=50, H6=30
        regs[0xA1] = 75;
        regs[0xE1..0xE8].copy_from_slice(&[0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E]);

        // adc_P = 415148, adc_T = 519888, adc_H = 0x7000
        regs[0xF7..0xFF].copy_from_slice(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x70, 0x00]);

        Self {
            address,
            regs: Arc::new(Mutex::new(regs)),
            pointer: 0,
            resets: Arc::new(AtomicUsize::new(0)),
            fail_data: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.regs.lock().unwrap()[reg as usize]
    }

    pub fn set_register(&self, reg: u8, value: u8) {
        self.regs.lock().unwrap()[reg as usize] = value;
    }

    /// 收到软复位命令的次数
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ErrorType for SimBus {
    type Error = ErrorKind;
}

impl I2c for SimBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        let mut regs = self.regs.lock().unwrap();
        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((reg, data)) = bytes.split_first() {
                        self.pointer = *reg as usize;
                        for (i, byte) in data.iter().enumerate() {
                            regs[self.pointer + i] = *byte;
                        }
                        // 软复位: 控制寄存器恢复为0
                        if *reg == 0xE0 && data == [0xB6] {
                            self.resets.fetch_add(1, Ordering::SeqCst);
                            for ctrl in [0xE0, 0xF2, 0xF4, 0xF5] {
                                regs[ctrl] = 0;
                            }
                        }
                    }
                }
                Operation::Read(buf) => {
                    if self.pointer == 0xF7 && self.fail_data.load(Ordering::SeqCst) {
                        return Err(ErrorKind::Bus);
                    }
                    for (i, byte) in buf.iter_mut().enumerate() {
                        *byte = regs[self.pointer + i];
                    }
                }
            }
        }
        Ok(())
    }
}

/// DS18B20 w1_slave 文件内容
pub fn w1_slave(milli_celsius: i32) -> String {
    format!(
        "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t={}\n",
        milli_celsius
    )
}
