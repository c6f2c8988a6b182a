use std::fs;
use std::path::PathBuf;
use std::process::Command;

use clap::Parser;
use log::{info, warn};

use qmdd_rs::circuit::Compiler;
use qmdd_rs::qmdd::Qmdd;

#[derive(Debug, Parser)]
#[command(author, version, about = "Compile a reversible circuit into a QMDD and render it with Graphviz")]
struct Cli {
    /// Input circuit file.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Table size (in bits, so the actual capacity is `2^size` nodes).
    #[clap(long, value_name = "INT", default_value = "20")]
    size: usize,

    /// Skip invoking the external `dot` binary for a PNG rendering.
    #[clap(long)]
    no_png: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();

    let text = fs::read_to_string(&args.input)?;
    let program = match qmdd_rs::parser::parse(&text) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}:{}", args.input.display(), e);
            std::process::exit(1);
        }
    };
    info!(
        "{}: {} variables, {} gates",
        args.input.display(),
        program.num_vars(),
        program.gates.len()
    );

    let mut dd = Qmdd::with_bits(program.num_vars(), args.size);
    let mut compiler = Compiler::new(&mut dd);
    let root = compiler.compile(&program.gates);
    info!("dd = {:?}", dd);

    let dot = dd.to_dot(root, &program.variables)?;
    let dot_path = PathBuf::from(format!("{}.dot", args.input.display()));
    fs::write(&dot_path, dot)?;
    info!("wrote {}", dot_path.display());

    if !args.no_png {
        let png_path = format!("{}.png", args.input.display());
        match Command::new("dot")
            .arg("-Tpng")
            .arg(&dot_path)
            .arg("-o")
            .arg(&png_path)
            .status()
        {
            Ok(status) if status.success() => info!("wrote {}", png_path),
            Ok(status) => warn!("dot exited with {}", status),
            Err(e) => warn!("could not run dot: {}", e),
        }
    }

    info!("Done in {:.3} s", time_total.elapsed().as_secs_f64());

    Ok(())
}
