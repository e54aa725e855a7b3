// Pixel Harmony composer: CLI entry point.
//
// Evolves a melody for a given mood and writes it to MIDI.
// The pipeline: features → mood targets → genetic search → MIDI output.
//
// Usage:
//   cargo run -p pixel_harmony_music --bin compose -- [output.mid]
//     [--brightness X] [--energy X] [--valence X] [--seed N]
//     [--config path.json] [--tempo BPM]
//
// Set RUST_LOG=debug to see per-generation progress.

use pixel_harmony_music::config::EvolverConfig;
use pixel_harmony_music::evolve::evolve;
use pixel_harmony_music::midi::write_midi;
use pixel_harmony_music::mood::FeatureVector;
use pixel_harmony_prng::MelodyRng;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("melody.mid");
    let brightness: f64 = flag_or_exit(&args, "--brightness").unwrap_or(0.5);
    let energy: f64 = flag_or_exit(&args, "--energy").unwrap_or(0.5);
    let valence: f64 = flag_or_exit(&args, "--valence").unwrap_or(0.5);
    let seed: u64 = flag_or_exit(&args, "--seed").unwrap_or_else(clock_seed);
    let tempo: u16 = flag_or_exit(&args, "--tempo").unwrap_or(120);
    let config_path: Option<String> = flag_or_exit(&args, "--config");

    let config = match config_path {
        Some(path) => match EvolverConfig::load(Path::new(&path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => EvolverConfig::default(),
    };

    let features = match FeatureVector::new(brightness, energy, valence) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Invalid mood features: {}", e);
            std::process::exit(1);
        }
    };

    println!("=== Pixel Harmony Composer ===");
    println!("Output: {}", output_path);
    println!(
        "Mood: brightness {:.2}, energy {:.2}, valence {:.2}",
        brightness, energy, valence
    );
    println!("Tempo: {} BPM", tempo);
    println!("Seed: {}", seed);
    println!(
        "Population: {} x {} notes, up to {} generations",
        config.population_size, config.genome_length, config.max_generations
    );
    println!();

    let mut rng = MelodyRng::new(seed);
    let result = match evolve(&features, &config, &mut rng) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Evolution failed: {}", e);
            std::process::exit(1);
        }
    };

    let first = result.best_history.first().copied().unwrap_or(0.0);
    println!(
        "Generations: {}{}",
        result.generations,
        if result.converged { " (converged)" } else { "" }
    );
    println!(
        "Fitness: {:.3} -> {:.3} (max {:.1})",
        first,
        result.fitness.total,
        config.weights.max_total()
    );
    println!("  {}", result.fitness.summary());
    println!(
        "Scale: {:?}, mean pitch {:.1} (target {:.1})",
        result.targets.scale.scale,
        result.melody.mean_pitch(),
        result.targets.mean_pitch
    );
    println!("Notes: {}", result.melody.pitch_names().join(" "));

    match write_midi(&result.melody, tempo, Path::new(output_path)) {
        Ok(()) => {
            let seconds = result.melody.total_beats() * 60.0 / tempo as f64;
            println!("Wrote {} ({:.1}s)", output_path, seconds);
        }
        Err(e) => {
            eprintln!("Error writing MIDI: {}", e);
            std::process::exit(1);
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Value following `flag`: `Ok(None)` when the flag is absent, an error
/// when it has no value or the value does not parse.
fn parse_flag<T: FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
    let Some(i) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let value = args
        .get(i + 1)
        .ok_or_else(|| format!("{} expects a value", flag))?;
    value
        .parse()
        .map(Some)
        .map_err(|_| format!("invalid value for {}: '{}'", flag, value))
}

fn flag_or_exit<T: FromStr>(args: &[String], flag: &str) -> Option<T> {
    match parse_flag(args, flag) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flag_reads_values() {
        let a = args(&["compose", "out.mid", "--seed", "7", "--brightness", "0.25"]);
        assert_eq!(parse_flag::<u64>(&a, "--seed"), Ok(Some(7)));
        assert_eq!(parse_flag::<f64>(&a, "--brightness"), Ok(Some(0.25)));
        assert_eq!(parse_flag::<u16>(&a, "--tempo"), Ok(None));
    }

    #[test]
    fn test_parse_flag_rejects_bad_values() {
        let a = args(&["compose", "--seed", "abc", "--brightness", "x"]);
        assert!(parse_flag::<u64>(&a, "--seed").is_err());
        assert!(parse_flag::<f64>(&a, "--brightness").is_err());
        let a = args(&["compose", "--tempo", "-5"]);
        assert!(parse_flag::<u16>(&a, "--tempo").is_err());
    }

    #[test]
    fn test_parse_flag_requires_a_value() {
        let a = args(&["compose", "--seed"]);
        assert_eq!(
            parse_flag::<u64>(&a, "--seed"),
            Err("--seed expects a value".to_string())
        );
    }
}
