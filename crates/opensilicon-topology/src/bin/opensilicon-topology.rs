//! Prints the connectivity networks of a cell in a saved design.
//!
//! Usage: `opensilicon-topology <design.json> [cell-name] [--write] [--json]`

use std::process::ExitCode;

use opensilicon_core::LayoutDatabase;
use opensilicon_topology::{Result, TopologyExtractor};

struct Args {
    design: String,
    cell: Option<String>,
    write: bool,
    json: bool,
}

fn parse_args() -> Option<Args> {
    let mut design = None;
    let mut cell = None;
    let mut write = false;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--write" => write = true,
            "--json" => json = true,
            _ if design.is_none() => design = Some(arg),
            _ if cell.is_none() => cell = Some(arg),
            _ => return None,
        }
    }
    Some(Args {
        design: design?,
        cell,
        write,
        json,
    })
}

fn run(args: &Args) -> Result<bool> {
    let text = std::fs::read_to_string(&args.design)?;
    let mut db = LayoutDatabase::from_json(&text)?;
    log::info!("loaded {} with {} cells", args.design, db.cell_count());

    let cell = match &args.cell {
        Some(name) => db.find_cell_by_name(name).map(|c| c.id),
        None => db.top_cell,
    };
    let Some(cell) = cell else {
        log::error!("no cell to extract in {}", args.design);
        return Ok(false);
    };

    let mut extractor = TopologyExtractor::new(&db.technology);
    let networks = extractor.get_topology(&mut db, &cell)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&networks)?);
    } else {
        for network in &networks {
            println!("{network}");
        }
    }

    if args.write && extractor.rebuilds() > 0 {
        std::fs::write(&args.design, db.to_json()?)?;
        log::info!("cached topology written to {}", args.design);
    }
    Ok(true)
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(args) = parse_args() else {
        eprintln!("usage: opensilicon-topology <design.json> [cell-name] [--write] [--json]");
        return ExitCode::from(2);
    };
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
