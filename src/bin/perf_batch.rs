// src/bin/perf_batch.rs
// Time a whole batch: generate files (or take paths from argv), compile them,
// report per-stage wall time and throughput.
//
//   PERF_FILES=64 PERF_LEN=200000 PERF_SEED=42 cargo run --release --bin perf_batch
//   cargo run --release --bin perf_batch -- a.src b.src

use std::{env, fs, path::PathBuf, time::Instant};

use rand::{SeedableRng, rngs::StdRng};
use tacc::{compiler::Compiler, config::CompilerConfig, dev::generator::gen_program};

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

fn fmt_mib(bytes: u64) -> String {
    let mib = (bytes as f64) / (1024.0 * 1024.0);
    format!("{mib:.2} MiB")
}

fn throughput_mibs(bytes: u64, ms: f64) -> f64 {
    if ms <= 0.0 {
        return 0.0;
    }
    (bytes as f64) / (1024.0 * 1024.0) / (ms / 1_000.0)
}

fn generate(dir: &PathBuf) -> Vec<PathBuf> {
    let files = env_usize("PERF_FILES", 32);
    let len = env_usize("PERF_LEN", 100_000);
    let seed = env_u64("PERF_SEED", 42);
    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("error: failed to create {}: {e}", dir.display());
        std::process::exit(2);
    }
    let gen_t0 = Instant::now();
    let mut rng = StdRng::seed_from_u64(seed);
    let paths: Vec<PathBuf> = (0..files)
        .map(|i| {
            let src = gen_program(&mut rng, len, &format!("m{i}"));
            let path = dir.join(format!("m{i}.src"));
            if let Err(e) = fs::write(&path, src) {
                eprintln!("error: failed to write {}: {e}", path.display());
                std::process::exit(2);
            }
            path
        })
        .collect();
    println!(
        "Input: {files} generated files of >= {len} bytes [seed={seed}] in {:.3} ms",
        gen_t0.elapsed().as_secs_f64() * 1e3
    );
    paths
}

fn main() {
    env_logger::init();

    let args: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    let paths = if args.is_empty() {
        generate(&env::temp_dir().join("tacc-perf"))
    } else {
        args
    };
    let bytes: u64 = paths
        .iter()
        .filter_map(|p| fs::metadata(p).ok())
        .map(|m| m.len())
        .sum();
    println!("Input: {} files, {} ({} bytes)", paths.len(), fmt_mib(bytes), bytes);

    let init_t0 = Instant::now();
    let compiler = match Compiler::new(CompilerConfig::from_env()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("init failed: {e:#}");
            std::process::exit(1);
        }
    };
    println!(
        "Init: {:.3} ms | workers={}",
        init_t0.elapsed().as_secs_f64() * 1e3,
        compiler.scheduler().workers()
    );

    let t0 = Instant::now();
    let output = match compiler.compile(&paths) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("compile failed: {e}");
            std::process::exit(1);
        }
    };
    let ms = t0.elapsed().as_secs_f64() * 1e3;
    let instructions: usize = output.reports.iter().map(|r| r.instructions.len()).sum();
    let diagnostics = output.diagnostics().count();
    println!(
        "Batch: {ms:.3} ms | instructions={instructions} | diagnostics={diagnostics} | throughput={:.1} MiB/s",
        throughput_mibs(bytes, ms)
    );
    if output.has_errors() {
        for d in output.diagnostics().take(10) {
            eprintln!("{d}");
        }
    }
}
