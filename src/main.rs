//! harv8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `harv8-emu run <program>` - Run a `.asm` or `.rom` file for N cycles
//! - `harv8-emu asm <source>` - Assemble to a ROM image
//! - `harv8-emu disasm <rom>` - Disassemble a ROM image

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "harv8-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of a minimal Harvard-architecture 8-bit accumulator CPU")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program for a fixed number of clock cycles
    Run {
        /// Path to the .rom or .asm file to execute
        program: String,
        /// Number of full clock cycles to drive (the core has no halt)
        #[arg(short, long, default_value = "100")]
        cycles: u64,
        /// Print a per-cycle listing while running
        #[arg(short, long)]
        trace: bool,
        /// Write a VCD waveform dump to this file
        #[arg(long)]
        vcd: Option<String>,
        /// Write the final machine state as JSON to this file
        #[arg(long)]
        snapshot: Option<String>,
    },
    /// Assemble source to a ROM image
    Asm {
        /// Path to the source file
        source: String,
        /// Output ROM file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a ROM image to readable text
    Disasm {
        /// Path to the ROM file
        rom: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { program, cycles, trace, vcd, snapshot } => {
            run_program(&program, cycles, trace, vcd.as_deref(), snapshot.as_deref());
        }
        Commands::Asm { source, output } => {
            assemble_file(&source, output);
        }
        Commands::Disasm { rom } => {
            disassemble_file(&rom);
        }
    }
}

/// Load instructions from either an assembly source or a ROM image.
fn load_instructions(path: &str) -> Vec<harv8::Instr> {
    use harv8::{assemble, load_rom};

    if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match assemble(&source) {
            Ok(instrs) => {
                println!("📝 Assembled {} instructions", instrs.len());
                instrs
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match load_rom(path) {
            Ok(image) => {
                println!("📂 Loaded {} instructions", image.len());
                image.instructions
            }
            Err(e) => {
                eprintln!("❌ Failed to load ROM: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_program(path: &str, cycles: u64, trace: bool, vcd: Option<&str>, snapshot: Option<&str>) {
    use harv8::asm::disasm::disassemble_instruction;
    use harv8::{Cpu, VcdTracer};

    println!("🔧 Running: {} ({} cycles)", path, cycles);

    let instructions = load_instructions(path);
    if instructions.is_empty() {
        eprintln!("❌ No instructions to execute");
        std::process::exit(1);
    }

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&instructions) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    let mut tracer = vcd.map(|vcd_path| {
        let file = match std::fs::File::create(vcd_path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("❌ Failed to create VCD file: {}", e);
                std::process::exit(1);
            }
        };
        match VcdTracer::new(std::io::BufWriter::new(file)) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("❌ Failed to write VCD header: {}", e);
                std::process::exit(1);
            }
        }
    });

    println!();
    println!("━━━ Execution ━━━");

    let mut time = 0u64;
    if let Some(t) = tracer.as_mut() {
        if let Err(e) = t.sample(time, &cpu) {
            eprintln!("❌ VCD write error: {}", e);
            std::process::exit(1);
        }
    }

    for cycle in 1..=cycles {
        // The instruction retiring this cycle is the one latched now.
        let retiring = cpu.regs.ir;

        cpu.set_clock(false);
        time += 1;
        if let Some(t) = tracer.as_mut() {
            if let Err(e) = t.sample(time, &cpu) {
                eprintln!("❌ VCD write error: {}", e);
                std::process::exit(1);
            }
        }

        cpu.set_clock(true);
        time += 1;
        if let Some(t) = tracer.as_mut() {
            if let Err(e) = t.sample(time, &cpu) {
                eprintln!("❌ VCD write error: {}", e);
                std::process::exit(1);
            }
        }

        if trace {
            println!(
                "{:04}: {:<8} acc={:3} ip={:3} idx={:3} port={:3}",
                cycle,
                disassemble_instruction(retiring),
                cpu.regs.acc,
                cpu.regs.ip,
                cpu.regs.mem_index,
                cpu.out_port
            );
        }
    }

    if let Some(t) = tracer {
        if let Err(e) = t.finish() {
            eprintln!("❌ VCD write error: {}", e);
            std::process::exit(1);
        }
        println!("✓ Waveform written to {}", vcd.unwrap());
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles:      {}", cpu.cycles);
    println!("Output port: {} ({:#04x})", cpu.out_port, cpu.out_port);
    println!("acc:         {} ({:#04x})", cpu.regs.acc, cpu.regs.acc);
    println!("ip:          {:#04x}", cpu.regs.ip);
    println!("ir:          {}", cpu.regs.ir);
    println!("mem_index:   {}", cpu.regs.mem_index);

    if let Some(snap_path) = snapshot {
        let json = match serde_json::to_string_pretty(&cpu) {
            Ok(j) => j,
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(snap_path, json) {
            eprintln!("❌ Failed to write snapshot: {}", e);
            std::process::exit(1);
        }
        println!("✓ Snapshot written to {}", snap_path);
    }
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use harv8::{assemble, save_rom, RomImage};

    let out_path = output.unwrap_or_else(|| source_path.replace(".asm", ".rom"));

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let instructions = match assemble(&source) {
        Ok(instrs) => instrs,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} instructions", instructions.len());

    let image = RomImage::from_instructions(&instructions);
    if let Err(e) = save_rom(&out_path, &image) {
        eprintln!("❌ Failed to save ROM: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(rom_path: &str) {
    use harv8::asm::disasm::disassemble;
    use harv8::load_rom;

    println!("📖 Disassembling: {}", rom_path);
    println!();

    let image = match load_rom(rom_path) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("❌ Failed to load ROM: {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", disassemble(&image.instructions));
}
