use std::thread;
use std::time::Duration;

use byows_rpi::sensor::ds18b20::{Ds18b20, W1_DEVICES_DIR};

/// DS18B20土壤温度探头测试程序
fn main() -> anyhow::Result<()> {
    // 查找探头
    let probe = Ds18b20::discover(W1_DEVICES_DIR)
        .ok_or_else(|| anyhow::anyhow!("未找到DS18B20探头，请检查是否启用了w1-gpio和w1-therm"))?;
    println!("探头: {}", probe.device_file().display());

    // 死循环读取温度
    loop {
        match probe.read_temperature() {
            // 读取成功
            Ok(temperature) => println!("土壤温度: {:.3}℃", temperature),
            // 读取失败
            Err(err) => eprintln!("读取DS18B20失败: {}", err),
        }
        thread::sleep(Duration::from_secs(1));
    }
}
