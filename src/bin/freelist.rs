use freelist::{logging, FreeList, PoolConfig, StepOutput, Stimulus};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    stimulus: Option<PathBuf>,
    json: bool,
    print_config: bool,
}

impl Args {
    fn from_env() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let prog = args.first().map(String::as_str).unwrap_or("freelist");

        let mut parsed = Args {
            config: None,
            stimulus: None,
            json: false,
            print_config: false,
        };

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => return Err(Self::usage(prog)),
                "--json" => parsed.json = true,
                "--print-config" => parsed.print_config = true,
                "--config" => {
                    let path = iter.next().ok_or("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--stimulus" => {
                    let path = iter.next().ok_or("--stimulus needs a path")?;
                    parsed.stimulus = Some(PathBuf::from(path));
                }
                opt => return Err(format!("Unknown option: {}\n\n{}", opt, Self::usage(prog))),
            }
        }

        if parsed.stimulus.is_none() && !parsed.print_config {
            return Err(format!("No stimulus specified\n\n{}", Self::usage(prog)));
        }

        Ok(parsed)
    }

    fn usage(prog: &str) -> String {
        format!(
            "freelist - multi-port rename free list model\n\n\
            USAGE:\n    {} [OPTIONS] --stimulus <file>\n\n\
            OPTIONS:\n    \
            -h, --help            Print help information\n    \
            --config <file>       Pool configuration (default: discover freelist.toml)\n    \
            --stimulus <file>     TOML stimulus with one [[step]] per cycle\n    \
            --json                Emit one JSON object per step\n    \
            --print-config        Print the default configuration and exit\n\n\
            EXAMPLES:\n    \
            {} --stimulus trace.toml\n    \
            {} --config wide.toml --stimulus trace.toml --json",
            prog, prog, prog
        )
    }
}

fn describe(out: &StepOutput) -> String {
    let results: Vec<String> = out
        .results
        .iter()
        .map(|r| match r.slot() {
            Some(slot) => slot.to_string(),
            None => "-".to_string(),
        })
        .collect();

    let mut line = format!(
        "cycle {:>4} {:<6} grants [{}] empty={} taken={:?}",
        out.cycle,
        out.transition,
        results.join(" "),
        out.pool_empty,
        out.occupancy.taken_slots()
    );
    if let Some(bit) = out.scan_out {
        line.push_str(&format!(" scan_out={}", bit as u8));
    }
    line
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = logging::init();

    let args = match Args::from_env() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
    };

    if args.print_config {
        print!("{}", PoolConfig::generate_default());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => PoolConfig::load(path)?,
        None => PoolConfig::discover(),
    };
    info!(width = config.width, alloc_ports = config.alloc_ports, "configuration loaded");

    let Some(stimulus_path) = &args.stimulus else {
        return Ok(());
    };
    let stimulus = Stimulus::load(stimulus_path)?;

    let mut pool = FreeList::new(config)?;
    let replay = stimulus.run(&mut pool);

    for out in &replay.outputs {
        if args.json {
            println!("{}", serde_json::to_string(out)?);
        } else {
            println!("{}", describe(out));
        }
    }

    if !args.json {
        print!("\n{}", pool.metrics().summary().format());
    }

    if let Some(e) = replay.error {
        error!(error = %e, cycle = pool.cycle(), "stimulus rejected");
        return Err(e.into());
    }

    Ok(())
}
