use std::fs::File;
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

use cart_bridge::{
    AccessLed, Bridge, BridgeConfig, BridgeError, CartridgeBus, CartridgeRom, SimulatedPort,
    SimulatedSlot, TcpTransport, Wiring,
};
use clap::{ArgEnum, Parser};
use simplelog::*;

/// Serves cartridge bus requests from host tooling, backed by a simulated cartridge slot.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long, arg_enum, default_value_t = LogLevel::Info)]
    file_log_level: LogLevel,

    #[clap(short, long, arg_enum, default_value_t = LogLevel::Info)]
    console_log_level: LogLevel,

    #[clap(long, default_value = "cart_bridge.log")]
    log_file: PathBuf,

    /// Address to accept host connections on
    #[clap(short, long, default_value = "127.0.0.1:7800")]
    listen: String,

    /// Read timeout for each header and payload, in milliseconds
    #[clap(
        short,
        long = "timeout-ms",
        default_value = "1000",
        parse(try_from_str = parse_millis)
    )]
    timeout: Duration,

    /// Cartridge ROM image presented in the slot
    rom: PathBuf,
}

#[derive(ArgEnum, Copy, Clone, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

type SlotBridge = Bridge<SimulatedSlot, AccessLed<SimulatedPort>>;

fn parse_millis(arg: &str) -> Result<Duration, String> {
    match arg.parse::<u64>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> Result<(), BridgeError> {
    let args: Args = Args::parse();

    CombinedLogger::init(vec![
        TermLogger::new(
            args.console_log_level.as_level_filter(),
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            args.file_log_level.as_level_filter(),
            Config::default(),
            File::create(&args.log_file)?,
        ),
    ])?;

    let mut bridge = open_bridge(&args)?;

    let listener = TcpListener::bind(&args.listen)?;
    log::info!("Listening on {}", listener.local_addr()?);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Err(e) = session(&mut bridge, stream) {
                    log::error!("Session failed: {}", e);
                }
            }
            Err(e) => log::warn!("Accept failed: {}", e),
        }
    }
    Ok(())
}

fn open_bridge(args: &Args) -> Result<SlotBridge, BridgeError> {
    log::info!("Loading cartridge from {}", args.rom.display());
    let rom = CartridgeRom::load(&args.rom)?;
    let wiring = Wiring::STANDARD;
    let bus = CartridgeBus::new(SimulatedSlot::new(rom, wiring), wiring);
    let led = AccessLed::new(SimulatedPort::default(), wiring.access_led);
    let config = BridgeConfig {
        read_timeout: args.timeout,
        ..BridgeConfig::default()
    };
    Ok(Bridge::new(bus, led, config))
}

/// One host connection. The bus keeps its state between sessions.
fn session(bridge: &mut SlotBridge, stream: TcpStream) -> Result<(), BridgeError> {
    log::info!("Host connected: {}", stream.peer_addr()?);
    let mut transport = TcpTransport::new(stream)?;
    bridge.announce();
    bridge.serve(&mut transport)?;

    let contention = bridge.bus().gpio().contention_events();
    if contention > 0 {
        log::error!("{} bus contention events so far", contention);
    }
    log::info!("Bus parked: {}", bridge.bus().state());
    Ok(())
}
