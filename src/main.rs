// src/main.rs

use clap::{Parser, ValueEnum};
use log::debug;

use vectra::{Capabilities, SimdLevel, SimdOps, Tensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DtypeArg {
    F32,
    F64,
    I16,
    I32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SimdArg {
    Auto,
    Scalar,
    Sse,
    Avx,
}

#[derive(Parser, Debug)]
#[command(name = "vectra_cli", version, about = "SIMD tensor operations demo")]
struct Cli {
    /// Comma-separated tensor shape, e.g. "3,3"
    #[arg(long, default_value = "3,3")]
    shape: String,

    /// Fill value for the constructed tensors
    #[arg(long, default_value_t = 1.5)]
    fill: f64,

    /// Element dtype
    #[arg(long, value_enum, default_value_t = DtypeArg::F32)]
    dtype: DtypeArg,

    /// Execution path; auto exercises every available vector path
    #[arg(long, value_enum, default_value_t = SimdArg::Auto)]
    simd: SimdArg,

    /// Print the detected CPU capabilities and exit
    #[arg(long)]
    capabilities: bool,

    /// Seed for the random-tensor part of the demo
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn parse_shape(raw: &str) -> Result<Vec<usize>, String> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid shape component '{}' in '{}'", part.trim(), raw))
        })
        .collect()
}

/// Execution paths the demo should run, widest last.
fn demo_paths(choice: SimdArg) -> Vec<SimdLevel> {
    match choice {
        SimdArg::Auto => {
            let mut levels: Vec<SimdLevel> = [SimdLevel::Sse, SimdLevel::Avx]
                .into_iter()
                .filter(|level| level.is_available())
                .collect();
            if levels.is_empty() {
                levels.push(SimdLevel::Scalar);
            }
            levels
        }
        SimdArg::Scalar => vec![SimdLevel::Scalar],
        SimdArg::Sse => vec![SimdLevel::Sse],
        SimdArg::Avx => vec![SimdLevel::Avx],
    }
}

fn fill_demo<T: SimdOps>(
    shape: &[usize],
    value: T,
    paths: &[SimdLevel],
) -> Result<(), Box<dyn std::error::Error>> {
    for &level in paths {
        let tensor = Tensor::full_with(shape, value, level)?;
        println!("{} tensor:\n{}", level, tensor);
    }
    Ok(())
}

fn random_demo_f32(
    shape: &[usize],
    seed: u64,
    level: SimdLevel,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!("random demo on the {} path, seed {}", level, seed);
    let a = Tensor::<f32>::randn_seeded(shape, seed)?;
    let b = Tensor::<f32>::randn_seeded(shape, seed.wrapping_add(1))?;
    let sum = a.add_with(&b, level)?;
    println!("randn A:\n{}", a);
    println!("randn B:\n{}", b);
    println!("A + B:\n{}", sum);
    Ok(())
}

fn random_demo_f64(
    shape: &[usize],
    seed: u64,
    level: SimdLevel,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!("random demo on the {} path, seed {}", level, seed);
    let a = Tensor::<f64>::randn_seeded(shape, seed)?;
    let b = Tensor::<f64>::randn_seeded(shape, seed.wrapping_add(1))?;
    let sum = a.add_with(&b, level)?;
    println!("randn A:\n{}", a);
    println!("randn B:\n{}", b);
    println!("A + B:\n{}", sum);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let caps = Capabilities::get();
    if cli.capabilities {
        println!("{}", caps.summary());
        return Ok(());
    }

    let shape = parse_shape(&cli.shape)?;
    println!("{}", caps.summary());
    println!();

    let paths = demo_paths(cli.simd);
    let widest = paths.last().copied().unwrap_or(SimdLevel::Scalar);

    match cli.dtype {
        DtypeArg::F32 => {
            fill_demo::<f32>(&shape, cli.fill as f32, &paths)?;
            random_demo_f32(&shape, cli.seed, widest)?;
        }
        DtypeArg::F64 => {
            fill_demo::<f64>(&shape, cli.fill, &paths)?;
            random_demo_f64(&shape, cli.seed, widest)?;
        }
        DtypeArg::I16 => fill_demo::<i16>(&shape, cli.fill as i16, &paths)?,
        DtypeArg::I32 => fill_demo::<i32>(&shape, cli.fill as i32, &paths)?,
    }

    Ok(())
}
