use std::io::Write;
use std::path::PathBuf;

use byows_rpi::config::StationConfig;
use byows_rpi::driver::Driver;
use byows_rpi::packet::LoopPacket;
use byows_rpi::station::RpiStation;
use byows_rpi::std_clock::StdClock;
use clap::Parser;
use log::info;

/// 自制气象站驱动：每个采样窗口向标准输出写一行JSON数据包
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// 配置文件路径（TOML，包含 [BYOWS] 表），缺省时使用默认配置
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 输出指定数量的数据包后退出
    #[arg(short = 'n', long)]
    count: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // 加载配置
    let config = match &args.config {
        Some(path) => StationConfig::load(path)?,
        None => StationConfig::default(),
    };

    // 打开全部传感器
    let station = RpiStation::open(&config)?;
    let mut driver = Driver::new(&config, station, StdClock::new())?;
    info!("硬件: {}", driver.hardware_name());

    let stdout = std::io::stdout();
    let packets = driver.loop_packets();
    let packets: Box<dyn Iterator<Item = LoopPacket> + '_> = match args.count {
        Some(count) => Box::new(packets.take(count)),
        None => Box::new(packets),
    };
    for packet in packets {
        let mut out = stdout.lock();
        writeln!(out, "{}", packet.to_json()?)?;
        out.flush()?;
    }

    // OK
    Ok(())
}
