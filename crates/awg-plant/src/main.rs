//! Atmospheric water generator - headless session
//!
//! Usage:
//!   awg-plant [walkthrough|showcase|<config.json|yaml>]
//!             [--script <file>] [--seconds N] [--fps N] [--realtime]
//!             [--dump-config <file>]
//!
//! Set RUST_LOG=info (or debug) to see stage transitions and commands.

use std::path::Path;
use std::process::ExitCode;

use awg_plant::plant::{Runner, Script};
use awg_sim::{SimConfig, Simulation};

struct Args {
    source: String,
    script: Option<String>,
    seconds: f32,
    fps: f32,
    realtime: bool,
    dump_config: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        source: "walkthrough".to_string(),
        script: None,
        seconds: 20.0,
        fps: 60.0,
        realtime: false,
        dump_config: None,
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--script" => args.script = Some(it.next().ok_or("--script needs a file")?),
            "--dump-config" => {
                args.dump_config = Some(it.next().ok_or("--dump-config needs a file")?)
            }
            "--seconds" => {
                let v = it.next().ok_or("--seconds needs a value")?;
                args.seconds = v.parse().map_err(|_| format!("bad --seconds `{}`", v))?;
            }
            "--fps" => {
                let v = it.next().ok_or("--fps needs a value")?;
                args.fps = v.parse().map_err(|_| format!("bad --fps `{}`", v))?;
            }
            "--realtime" => args.realtime = true,
            other if other.starts_with("--") => return Err(format!("unknown flag `{}`", other)),
            other => args.source = other.to_string(),
        }
    }
    Ok(args)
}

fn load_config(source: &str) -> Result<SimConfig, String> {
    if let Some(config) = SimConfig::preset(source) {
        return Ok(config);
    }
    SimConfig::load(Path::new(source)).map_err(|e| format!("{}: {}", source, e))
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(&args.source) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.dump_config {
        return match config.save(Path::new(path)) {
            Ok(()) => {
                println!("Wrote config `{}` to {}", config.name, path);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let name = config.name.clone();
    let sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut runner = Runner::new(sim);
    if let Some(path) = &args.script {
        match Script::load(Path::new(path)) {
            Ok(script) => runner = runner.with_script(script),
            Err(e) => {
                eprintln!("error: {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    }

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║             ATMOSPHERIC WATER GENERATOR SESSION              ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!(
        "Config: {} | {:.1}s at {} fps ({})\n",
        name,
        args.seconds,
        args.fps,
        if args.realtime { "realtime" } else { "virtual clock" }
    );

    let report = |r: &Runner| println!("{}", r.status_string());
    if args.realtime {
        runner.run_realtime(args.seconds, args.fps, report);
    } else {
        runner.run_for(args.seconds, args.fps, report);
    }

    println!("\n{}", runner.metrics().format_summary());
    print!("{}", runner.metrics().format_stages(&runner.stage_labels()));
    if !runner.script_finished() {
        println!("Note: script had events past the end of the session");
    }

    ExitCode::SUCCESS
}
