use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Library modules with their own unit test suites
const MODULES: [(&str, &str); 6] = [
    ("memory", "core::memory"),
    ("r4300", "core::r4300"),
    ("rcp", "core::rcp"),
    ("device", "core::device"),
    ("cart", "core::cart"),
    ("loader", "core::loader"),
];

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for n64rx")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Run tests, optionally for a single module
    Test {
        /// Module to test (memory, r4300, rcp, device, cart, loader)
        #[arg(short, long)]
        module: Option<String>,
        /// Run doc tests only
        #[arg(long)]
        doc: bool,
    },
    /// Run benchmarks
    Bench,
    /// Boot a cartridge for a number of instructions
    RomBoot {
        /// Path to cartridge ROM
        #[arg(default_value = "test.z64")]
        rom_path: String,
        /// Number of instructions to execute
        #[arg(short = 'n', long, default_value = "100000")]
        instructions: u64,
        #[arg(long)]
        release: bool,
    },
    /// Print the host memory map of a cartridge as JSON
    DumpMap {
        rom_path: String,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Test { module, doc } => run_test(module.as_deref(), doc),
        Commands::Bench => execute(cargo("bench")),
        Commands::RomBoot {
            rom_path,
            instructions,
            release,
        } => run_rom_boot(&rom_path, instructions, release),
        Commands::DumpMap { rom_path } => {
            check_rom(&rom_path)?;
            let mut cmd = cargo("run");
            cmd.args(["--quiet", "--bin", "n64rx", "--"])
                .arg(&rom_path)
                .arg("--dump-map");
            execute(cmd)
        }
    }
}

/// `cargo <subcommand>` with inherited stdio
fn cargo(subcommand: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}

fn execute(mut cmd: Command) -> Result<()> {
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }
    Ok(())
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Checks ===".bold().blue());
    let start = Instant::now();

    step("Format Check", verbose, || run_fmt(true))?;
    step("Clippy", verbose, || run_clippy(false))?;
    step("Build", verbose, || execute(cargo("build")))?;
    step("Test", verbose, || run_test(None, false))?;

    println!(
        "\n{} {}",
        "✓ All CI checks passed in".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = cargo("fmt");
    cmd.arg("--all");
    if check {
        cmd.args(["--", "--check"]);
    }
    execute(cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = cargo("clippy");
    cmd.arg("--all-targets");
    if fix {
        cmd.args(["--fix", "--allow-dirty"]);
    }
    cmd.args(["--", "-D", "warnings"]);
    execute(cmd)
}

fn run_test(module: Option<&str>, doc: bool) -> Result<()> {
    let mut cmd = cargo("test");
    if doc {
        cmd.arg("--doc");
        return execute(cmd);
    }

    if let Some(name) = module {
        let Some((_, path)) = MODULES.iter().find(|(short, _)| *short == name) else {
            let known: Vec<_> = MODULES.iter().map(|(short, _)| *short).collect();
            anyhow::bail!("Unknown module '{}' (expected one of {})", name, known.join(", "));
        };
        println!("{} Running {} tests...", "→".blue(), name.bold());
        cmd.arg("--lib").arg(path);
    }
    execute(cmd)
}

/// Cartridge images are word multiples of at least 4 KiB
fn check_rom(rom_path: &str) -> Result<()> {
    let path = Path::new(rom_path);
    if !path.exists() {
        println!("{} ROM file not found: {}", "✗".red().bold(), rom_path.yellow());
        anyhow::bail!("ROM file not found");
    }

    let len = std::fs::metadata(path)?.len();
    if len < 0x1000 || len % 4 != 0 {
        println!("{} Invalid ROM size: {} bytes", "✗".red().bold(), len);
        anyhow::bail!("Invalid ROM file size");
    }
    Ok(())
}

fn run_rom_boot(rom_path: &str, instructions: u64, release: bool) -> Result<()> {
    println!("{}", "=== Cartridge Boot Test ===".bold().blue());
    check_rom(rom_path)?;

    println!("{} ROM file: {}", "✓".green(), rom_path.cyan());
    println!(
        "{} Instructions: {}",
        "→".blue(),
        instructions.to_string().bold()
    );

    let start = Instant::now();
    let mut cmd = cargo("run");
    if release {
        cmd.arg("--release");
    }
    cmd.args(["--bin", "n64rx", "--"])
        .arg(rom_path)
        .arg("-n")
        .arg(instructions.to_string());
    execute(cmd)?;

    println!(
        "\n{} Cartridge boot test completed in {}",
        "✓".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn step<F>(name: &str, verbose: bool, task: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);
    let start = Instant::now();

    match task() {
        Ok(()) => {
            let elapsed = if verbose {
                format!("({:.2}s)", start.elapsed().as_secs_f64())
            } else {
                String::new()
            };
            println!("{} {}", "✓".green().bold(), elapsed);
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}
