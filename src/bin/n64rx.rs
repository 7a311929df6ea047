// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use log::{error, info};
use n64rx::core::backend::FileStorage;
use n64rx::core::config::{Backends, MachineConfig, Media, SaveType};
use n64rx::core::device::Device;
use n64rx::core::error::{EmulatorError, Result};
use n64rx::core::loader::{load_cart_rom_file, load_dd_rom_file};
use n64rx::core::r4300::FetchCore;

/// Nintendo 64 machine core
#[derive(Parser)]
#[command(name = "n64rx")]
#[command(about = "Nintendo 64 machine core", long_about = None)]
struct Args {
    /// Path to cartridge ROM (.z64, .v64 or .n64)
    rom: Option<PathBuf>,

    /// Path to disk drive IPL ROM
    #[arg(short = 'd', long)]
    dd_rom: Option<PathBuf>,

    /// Path to disk image inserted in the disk drive
    #[arg(long, requires = "dd_rom")]
    disk: Option<PathBuf>,

    /// Path to machine configuration (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Save type override (sram, auto, flashram)
    #[arg(short = 's', long)]
    save_type: Option<SaveType>,

    /// RDRAM size override in MiB (4 or 8)
    #[arg(long)]
    dram_size_mb: Option<usize>,

    /// File backing cartridge SRAM
    #[arg(long)]
    sram: Option<PathBuf>,

    /// File backing cartridge FlashRAM
    #[arg(long)]
    flashram: Option<PathBuf>,

    /// Number of instructions to execute
    #[arg(short = 'n', long, default_value = "1000000")]
    instructions: u64,

    /// Print the host memory map as JSON and exit
    #[arg(long)]
    dump_map: bool,
}

fn machine_config(args: &Args) -> Result<MachineConfig> {
    let mut config = match &args.config {
        Some(path) => MachineConfig::load(path)?,
        None => MachineConfig::default(),
    };
    if let Some(save_type) = args.save_type {
        config.save_type = save_type;
    }
    if let Some(mb) = args.dram_size_mb {
        config.set_dram_size_mb(mb)?;
    }
    config.validate()?;
    Ok(config)
}

fn load_media(args: &Args) -> Result<Media> {
    if args.rom.is_none() && args.dd_rom.is_none() {
        return Err(EmulatorError::InvalidConfig(
            "a cartridge ROM or a disk drive IPL ROM is required".to_string(),
        ));
    }

    let rom = match &args.rom {
        Some(path) => {
            info!("Loading cartridge from: {}", path.display());
            load_cart_rom_file(path)?
        }
        None => Vec::new(),
    };
    let dd_rom = match &args.dd_rom {
        Some(path) => {
            info!("Loading disk drive IPL ROM from: {}", path.display());
            load_dd_rom_file(path)?
        }
        None => Vec::new(),
    };
    Ok(Media { rom, dd_rom })
}

fn backends(args: &Args) -> Backends {
    let mut backends = Backends {
        core: Box::new(FetchCore::with_budget(args.instructions)),
        ..Backends::default()
    };
    if let Some(path) = &args.sram {
        backends.sram = Box::new(FileStorage::new(path));
    }
    if let Some(path) = &args.flashram {
        backends.flashram = Box::new(FileStorage::new(path));
    }
    if let Some(path) = &args.disk {
        backends.dd_disk = Some(Box::new(FileStorage::new(path)));
    }
    backends
}

fn main() -> Result<()> {
    // Optional .env for development settings such as RUST_LOG
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("n64rx v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = machine_config(&args).inspect_err(|e| error!("Bad configuration: {}", e))?;
    let media = load_media(&args).inspect_err(|e| error!("Failed to load media: {}", e))?;

    let mut device = Device::compose(&config, media, backends(&args));

    if args.dump_map {
        let json = serde_json::to_string_pretty(device.host_memory_map().as_slice())?;
        println!("{}", json);
        return Ok(());
    }

    info!("Starting emulation...");
    device.poweron();
    device.run();

    let hw = device.hardware();
    info!("Emulation stopped");
    info!("Total cycles: {}", hw.r4300.cycles());
    info!("Final PC: 0x{:08X}", hw.r4300.pc());

    Ok(())
}
