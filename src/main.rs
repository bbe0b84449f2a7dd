//! busgated — gateway RPC relay daemon entry point.
//!
//! Wires the Linux adapters (I2C module bus, sysfs interrupt line, power
//! directive, host process spawner) into the gateway service and hands it
//! the permanent event loop. A fatal return here means the bus or the
//! interrupt line died; the init system is expected to restart the daemon.

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use busgate::adapters::gpio::SysfsInterruptLine;
use busgate::adapters::i2c::I2cBusTransport;
use busgate::adapters::power::SysfsPowerControl;
use busgate::adapters::process::HostProcessSpawner;
use busgate::bus::client::BusClient;
use busgate::config::GatewayConfig;
use busgate::service::GatewayService;
use linux_embedded_hal::I2cdev;

fn load_config() -> Result<GatewayConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            let cfg = serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file {path}"))?;
            info!("config loaded from {path}");
            Ok(cfg)
        }
        None => {
            warn!("no config file given, using defaults");
            Ok(GatewayConfig::default())
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("busgated v{} starting", env!("CARGO_PKG_VERSION"));

    let cfg = load_config()?;
    info!(
        "bus {} as {:?}, interrupt gpio {}",
        cfg.i2c_bus, cfg.local_address, cfg.interrupt_gpio
    );

    let i2c = I2cdev::new(&cfg.i2c_bus)
        .with_context(|| format!("opening module bus {}", cfg.i2c_bus))?;
    let mut bus = BusClient::new(I2cBusTransport::new(i2c), cfg.local_address);

    let mut irq = SysfsInterruptLine::new(
        cfg.interrupt_gpio,
        Duration::from_millis(cfg.irq_poll_interval_ms),
    )
    .context("configuring RPC interrupt line")?;

    let mut power = SysfsPowerControl::new(cfg.power_state.clone());
    let mut service = GatewayService::new(HostProcessSpawner, &cfg);

    // Never returns Ok; an Err is fatal and handed to the init system.
    service
        .run(&mut bus, &mut irq, &mut power)
        .context("gateway event loop aborted")
}
