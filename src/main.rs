use std::env;
use std::process;

use harmtex::{compile_score_file, write_midi, RenderConfig};

const USAGE: &str = "Usage: harmtex [--notes] [--config <render.yaml>] <score.xml> [output.mid]";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut print_notes = false;
    let mut config_path: Option<&String> = None;
    let mut positional: Vec<&String> = Vec::new();

    // Parse flags
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--notes" => print_notes = true,
            "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => {
                    eprintln!("{}", USAGE);
                    process::exit(1);
                }
            },
            _ => positional.push(arg),
        }
    }

    let (input_path, output_path) = match positional.as_slice() {
        [input] => (*input, None),
        [input, output] => (*input, Some(*output)),
        _ => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    let config = match config_path {
        Some(path) => match RenderConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error reading config '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };

    // Compile
    let score = match compile_score_file(input_path) {
        Ok(score) => score,
        Err(e) => {
            eprintln!("Compilation error in '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    if print_notes || output_path.is_none() {
        match serde_yaml::to_string(&score.contraction.ordered_notes()) {
            Ok(yaml) => println!("{}", yaml),
            Err(e) => {
                eprintln!("Error listing notes: {}", e);
                process::exit(1);
            }
        }
    }

    // Output
    if let Some(path) = output_path {
        if let Err(e) = write_midi(&score, &config, path) {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        }
        log::info!("Wrote MIDI to {}", path);
        eprintln!("Wrote MIDI to {}", path);
    }
}
