//! Read holding registers through a Solarman data logger
//!
//! ```text
//! SOLARMAN_ADDR=192.168.1.50:8899 SOLARMAN_SERIAL=2712345678 \
//!     cargo run --example read_registers -- 0x0003 10
//! ```

use std::time::Duration;

use anyhow::Context;
use solarman::{Pdu, SolarmanClient};
use tracing_subscriber::EnvFilter;

const READ_HOLDING_REGISTERS: u8 = 0x03;

fn parse_u16(arg: &str) -> anyhow::Result<u16> {
    match arg.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => arg.parse(),
    }
    .with_context(|| format!("invalid number: {arg}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let addr = std::env::var("SOLARMAN_ADDR").unwrap_or_else(|_| "192.168.1.50:8899".to_string());
    let serial: u32 = std::env::var("SOLARMAN_SERIAL")
        .context("SOLARMAN_SERIAL must hold the logger serial number")?
        .parse()
        .context("SOLARMAN_SERIAL is not a number")?;

    let mut args = std::env::args().skip(1);
    let start = parse_u16(&args.next().unwrap_or_else(|| "0".into()))?;
    let count = parse_u16(&args.next().unwrap_or_else(|| "1".into()))?;

    let client = SolarmanClient::new(addr, serial, 1)
        .with_timeout(Duration::from_secs(5))
        .with_connect_delay(Duration::from_millis(200));

    let mut data = Vec::with_capacity(4);
    data.extend_from_slice(&start.to_be_bytes());
    data.extend_from_slice(&count.to_be_bytes());

    let reply = client.call(&Pdu::new(READ_HOLDING_REGISTERS, data)).await?;

    // Byte count, then big-endian register values
    let registers = reply.data.get(1..).unwrap_or_default();
    for (i, value) in registers.chunks_exact(2).enumerate() {
        let address = usize::from(start) + i;
        println!("0x{address:04X} = {}", u16::from_be_bytes([value[0], value[1]]));
    }

    client.close().await?;
    Ok(())
}
