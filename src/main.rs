use std::path::Path;

use timetable_engine::config::{Curriculum, SEED_ENV};
use timetable_engine::display::{print_timetable, track_title, write_csv, write_track_to_file};
use timetable_engine::parser::{load_bindings, TeacherBindings};
use timetable_engine::schedule::{generate_timetable, validate_grid, Grid, SeededRng, Track};
use timetable_engine::web;

const DEFAULT_BINDINGS: &str = "data/teachers.csv";

fn seed_from_env() -> Option<u64> {
    std::env::var(SEED_ENV).ok().and_then(|s| s.trim().parse().ok())
}

fn output_filename(track: Track) -> String {
    format!("timetable_{}.txt", track_title(track).to_lowercase().replace(' ', "_"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let curriculum = Curriculum::from_env()?;

    // Check if we should run in web mode
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args.get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        println!("Starting web server on port {}...", port);
        println!("Access the API at http://localhost:{}/api/curriculum", port);

        web::start_server(port, curriculum, seed_from_env()).await?;
        return Ok(());
    }

    // CLI mode
    let mut bindings_path: Option<String> = None;
    let mut seed = seed_from_env();
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if arg == "--seed" {
            let value = rest.next().ok_or("--seed needs a value")?;
            seed = Some(value.parse()?);
        } else {
            bindings_path = Some(arg.clone());
        }
    }

    let bindings = match bindings_path {
        Some(path) => load_bindings(path)?,
        None if Path::new(DEFAULT_BINDINGS).exists() => load_bindings(DEFAULT_BINDINGS)?,
        None => {
            log::warn!("No teacher bindings given; every subject uses \"{}\"", curriculum.placeholder_teacher);
            TeacherBindings::new()
        }
    };
    println!("Loaded {} teacher bindings", bindings.len());

    let mut rng = match seed {
        Some(seed) => SeededRng::from_seed(seed),
        None => SeededRng::from_entropy(),
    };
    println!("\n=== Generating Timetable (seed {}) ===", rng.seed());
    let timetable = generate_timetable(&curriculum, &bindings, &mut rng)?;

    print_timetable(&timetable);

    if let Err(errors) = validate_grid(&timetable.grid, &curriculum) {
        println!("\n❌ Validation failed:");
        for e in &errors {
            println!("  - {:?}: {}", e.kind, e.message);
        }
    }

    println!("\n=== Writing Timetables to Files ===");
    println!("Timetables saved to:");
    for track in Grid::tracks() {
        let filename = output_filename(track);
        write_track_to_file(&timetable.grid, track, &filename)?;
        println!("  - {}", filename);
    }
    write_csv(&timetable.grid, std::fs::File::create("timetable.csv")?)?;
    println!("  - timetable.csv");

    Ok(())
}
