use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use ingest::parse_line;
use verdant_core::{
    CarbonModel, DEFAULT_GRID_INTENSITY_G_PER_KWH, IntensityTable, builtin_intensity_entries,
};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: estimate_cli <path|-> [default-intensity-g-per-kwh]");
        std::process::exit(2);
    }

    let default_intensity = match args.get(2) {
        Some(value) => value.parse::<f64>().unwrap_or_else(|_| {
            eprintln!("invalid intensity: {}", value);
            std::process::exit(2);
        }),
        None => DEFAULT_GRID_INTENSITY_G_PER_KWH,
    };

    let path = &args[1];
    let reader: Box<dyn BufRead> = if path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(path).unwrap_or_else(|err| {
            eprintln!("failed to open {}: {}", path, err);
            std::process::exit(1);
        });
        Box::new(BufReader::new(file))
    };

    let model = CarbonModel::new(default_intensity);
    let entries = builtin_intensity_entries().unwrap_or_else(|err| {
        eprintln!("bundled intensity table is invalid: {}", err);
        std::process::exit(1);
    });
    let intensity = IntensityTable::from_entries(&entries);
    let mut total_kwh = 0.0;
    let mut total_co2e = 0.0;
    let mut failures = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.unwrap_or_else(|err| {
            eprintln!("failed to read input: {}", err);
            std::process::exit(1);
        });
        if line.trim().is_empty() {
            continue;
        }
        let record = match parse_line(&line) {
            Ok(record) => record,
            Err(err) => {
                eprintln!("line {}: {}", index + 1, err);
                failures += 1;
                continue;
            }
        };
        let Ok(estimate) = model.compute_emissions(&record, &intensity);
        total_kwh += estimate.kwh;
        total_co2e += estimate.co2e_kg;
        println!(
            "{} {} kwh={} co2e_kg={} intensity={}",
            record.source,
            record.run_id.as_deref().unwrap_or("-"),
            estimate.kwh,
            estimate.co2e_kg,
            estimate.intensity_g_per_kwh
        );
    }

    println!("total_kwh {}", verdant_core::round6(total_kwh));
    println!("total_co2e_kg {}", verdant_core::round6(total_co2e));
    if failures > 0 {
        std::process::exit(3);
    }
}
