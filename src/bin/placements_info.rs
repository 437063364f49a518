//! Inspect or patch placements chunk files.
//!
//! Usage:
//!   cargo run --bin placements_info -- cells/a.plcs [cells/b.plcs ...]
//!   cargo run --bin placements_info -- cells/a.plcs --replace old.mdl new.mdl

use std::path::PathBuf;

use placements::core::logging;
use placements::scaffold::PlacementsScaffold;
use placements::scaffold::strings::format_supplements;

fn describe(path: &PathBuf, scaffold: &PlacementsScaffold) {
    scaffold.log_details(&path.display().to_string());
    println!("{}: {} objects", path.display(), scaffold.len());
    println!("  [Model Name] [Material Name] [Supplements] Count");

    let objects = scaffold.objects();
    let mut start = 0;
    while start < objects.len() {
        let first = &objects[start];
        let count = objects[start..]
            .iter()
            .take_while(|o| {
                o.model_filename_offset == first.model_filename_offset
                    && o.material_filename_offset == first.material_filename_offset
                    && o.supplements_offset == first.supplements_offset
            })
            .count();
        println!(
            "  [{}] [{}] [{}] {}",
            scaffold.model_name(first),
            scaffold.material_name(first),
            format_supplements(scaffold.supplements(first)),
            count
        );
        start += count;
    }
}

fn main() {
    logging::init();
    let args: Vec<String> = std::env::args().skip(1).collect();

    let replace = args
        .iter()
        .position(|a| a == "--replace")
        .map(|i| (args.get(i + 1).cloned(), args.get(i + 2).cloned()));
    let files: Vec<PathBuf> = args
        .iter()
        .take_while(|a| *a != "--replace")
        .map(PathBuf::from)
        .collect();

    if files.is_empty() {
        eprintln!("Usage: placements_info <file.plcs>... [--replace <old> <new>]");
        std::process::exit(2);
    }

    let mut failed = false;
    for path in &files {
        let mut scaffold = match std::fs::read(path)
            .map_err(placements::Error::from)
            .and_then(|bytes| PlacementsScaffold::from_bytes(&bytes))
        {
            Ok(scaffold) => scaffold,
            Err(e) => {
                log::error!("{}: {e}", path.display());
                failed = true;
                continue;
            }
        };

        match &replace {
            Some((Some(old), Some(new))) => {
                if scaffold.replace_string(old, new) {
                    if let Err(e) = std::fs::write(path, scaffold.serialize()) {
                        log::error!("Failed to write {}: {e}", path.display());
                        failed = true;
                        continue;
                    }
                    log::info!("{}: replaced {old} with {new}", path.display());
                } else {
                    log::info!("{}: no entry for {old}", path.display());
                }
            }
            Some(_) => {
                eprintln!("--replace needs <old> and <new>");
                std::process::exit(2);
            }
            None => {}
        }

        describe(path, &scaffold);
    }

    if failed {
        std::process::exit(1);
    }
}
