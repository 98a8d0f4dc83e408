use anyhow::{bail, Result};
use std::path::PathBuf;

use herbarium::catalog::{self, Identifier};
use herbarium::config::Config;
use herbarium::db::{Database, PhotoFilter, SETTING_PLANT_ID_API_KEY};
use herbarium::logging;

enum Command {
    Identify {
        file: PathBuf,
        date: Option<String>,
        location: Option<String>,
    },
    Reidentify {
        photo_id: i64,
    },
    Batch {
        photo_ids: Vec<i64>,
    },
    Import {
        directory: PathBuf,
    },
    Photos {
        filter: PhotoFilter,
    },
    Species,
    Relations {
        photo_id: i64,
    },
    Settings,
    SetKey {
        value: String,
    },
}

struct Cli {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> Result<Cli> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut positional: Vec<String> = Vec::new();
    let mut date = None;
    let mut location = None;
    let mut species_name = None;
    let mut limit = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("herbarium {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(next_value(&args, &mut i, "--config")?));
            }
            "--date" => date = Some(next_value(&args, &mut i, "--date")?),
            "--location" => location = Some(next_value(&args, &mut i, "--location")?),
            "--species" => species_name = Some(next_value(&args, &mut i, "--species")?),
            "--limit" => limit = Some(next_value(&args, &mut i, "--limit")?.parse::<i64>()?),
            other if other.starts_with('-') => {
                bail!("unknown option: {}", other);
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let Some((name, rest)) = positional.split_first() else {
        print_help();
        std::process::exit(1);
    };

    let command = match name.as_str() {
        "identify" => {
            let [file] = rest else {
                bail!("usage: herbarium identify <file> [--date D] [--location L]");
            };
            Command::Identify {
                file: PathBuf::from(file),
                date,
                location,
            }
        }
        "reidentify" => {
            let [id] = rest else {
                bail!("usage: herbarium reidentify <photo-id>");
            };
            Command::Reidentify {
                photo_id: id.parse()?,
            }
        }
        "batch" => {
            if rest.is_empty() {
                bail!("usage: herbarium batch <photo-id>...");
            }
            let photo_ids = rest
                .iter()
                .map(|id| id.parse::<i64>())
                .collect::<Result<Vec<_>, _>>()?;
            Command::Batch { photo_ids }
        }
        "import" => {
            let [directory] = rest else {
                bail!("usage: herbarium import <directory>");
            };
            Command::Import {
                directory: PathBuf::from(directory),
            }
        }
        "photos" => Command::Photos {
            filter: PhotoFilter {
                species_name,
                location,
                date,
                limit,
                ..Default::default()
            },
        },
        "species" => Command::Species,
        "relations" => {
            let [id] = rest else {
                bail!("usage: herbarium relations <photo-id>");
            };
            Command::Relations {
                photo_id: id.parse()?,
            }
        }
        "settings" => Command::Settings,
        "set-key" => {
            let [value] = rest else {
                bail!("usage: herbarium set-key <api-key>");
            };
            Command::SetKey {
                value: value.clone(),
            }
        }
        other => bail!("unknown command: {}", other),
    };

    Ok(Cli {
        config_path,
        command,
    })
}

fn next_value(args: &[String], i: &mut usize, option: &str) -> Result<String> {
    if *i + 1 < args.len() {
        *i += 1;
        Ok(args[*i].clone())
    } else {
        bail!("{} requires a value", option)
    }
}

fn print_help() {
    println!(
        r#"herbarium - plant photo catalog with species identification

USAGE:
    herbarium [OPTIONS] <COMMAND>

COMMANDS:
    identify <file>          Identify a new image and catalog it
                             (--date YYYY-MM-DD, --location TEXT)
    reidentify <photo-id>    Re-run identification on a cataloged photo,
                             replacing its species relations
    batch <photo-id>...      Re-identify several photos; failures are
                             reported per photo
    import <directory>       Register all image files under a directory
    photos                   List photos (--species NAME, --location TEXT,
                             --date TEXT, --limit N)
    species                  List the species catalog
    relations <photo-id>     Show a photo's species relations
    settings                 List application settings
    set-key <api-key>        Store the recognition service API key

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    HERBARIUM_LOG       Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/herbarium/config.toml"#
    );
}

fn main() -> Result<()> {
    let cli = parse_args()?;

    // Journald on Linux, file fallback otherwise
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    let config = match cli.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let db = Database::open(&config.db_path)?;
    db.initialize()?;

    match cli.command {
        Command::Identify {
            file,
            date,
            location,
        } => {
            let identifier = Identifier::from_config(&db, &config)?;
            let result = identifier.identify_new_photo(&file, date, location)?;
            match result.photo_id {
                Some(photo_id) => println!("Cataloged photo {}", photo_id),
                None => println!("Identification succeeded but the photo could not be stored"),
            }
            print_candidates(&result.candidates, &result.relations);
        }
        Command::Reidentify { photo_id } => {
            let identifier = Identifier::from_config(&db, &config)?;
            let result = identifier.reidentify_photo(photo_id)?;
            println!("Re-identified photo {}", photo_id);
            print_candidates(&result.candidates, &result.relations);
        }
        Command::Batch { photo_ids } => {
            let identifier = Identifier::from_config(&db, &config)?;
            let outcome = identifier.identify_batch(&photo_ids)?;
            for item in &outcome.results {
                let primary = item
                    .candidates
                    .first()
                    .map(|c| c.scientific_name.as_str())
                    .unwrap_or("no suggestions");
                println!(
                    "photo {}: {} ({} relations)",
                    item.photo_id,
                    primary,
                    item.relations.len()
                );
            }
            for error in &outcome.errors {
                println!("photo {}: FAILED - {}", error.photo_id, error.error);
            }
        }
        Command::Import { directory } => {
            let summary =
                catalog::import::import_directory(&db, &directory, &config.import.image_extensions)?;
            println!(
                "Imported {} photos, {} already cataloged",
                summary.imported, summary.skipped
            );
        }
        Command::Photos { filter } => {
            for entry in db.list_photos(&filter)? {
                let species: Vec<String> = entry
                    .species
                    .iter()
                    .map(|s| s.scientific_name.clone())
                    .collect();
                println!(
                    "{}  {}  {}  [{}]",
                    entry.photo.id,
                    entry.photo.date.as_deref().unwrap_or("-"),
                    entry.photo.file_path,
                    species.join(", ")
                );
            }
        }
        Command::Species => {
            for species in db.list_species(0, None)? {
                let photos = db.count_photos_for_species(species.id)?;
                println!(
                    "{}  {}  ({}, {} photos)",
                    species.id,
                    species.scientific_name,
                    species.common_name.as_deref().unwrap_or("-"),
                    photos
                );
            }
        }
        Command::Relations { photo_id } => {
            if db.get_photo(photo_id)?.is_none() {
                bail!("photo {} not found", photo_id);
            }
            for relation in db.relations_for_photo(photo_id)? {
                let name = db
                    .get_species(relation.species_id)?
                    .map(|s| s.scientific_name)
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{}  {}  {}",
                    relation.id,
                    name,
                    relation.category.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Settings => {
            for setting in db.list_settings()? {
                println!(
                    "{} = {}  ({})",
                    setting.key,
                    setting.value.as_deref().unwrap_or(""),
                    setting.description.as_deref().unwrap_or("")
                );
            }
        }
        Command::SetKey { value } => {
            db.upsert_setting(
                SETTING_PLANT_ID_API_KEY,
                &value,
                Some("Plant.id API key for species identification"),
            )?;
            println!("API key stored");
        }
    }

    Ok(())
}

fn print_candidates(
    candidates: &[herbarium::plantid::SpeciesCandidate],
    relations: &[herbarium::db::SpeciesRelation],
) {
    if candidates.is_empty() {
        println!("No suggestions");
        return;
    }
    let related: Vec<i64> = relations.iter().map(|r| r.species_id).collect();
    for (index, candidate) in candidates.iter().enumerate() {
        // Candidates below the significance threshold are shown but unmarked
        let marker = if candidate.probability <= catalog::identify::SIGNIFICANCE_THRESHOLD {
            ' '
        } else if index == 0 {
            '*'
        } else {
            '+'
        };
        println!(
            "{} {:.0}%  {}  {}",
            marker,
            candidate.probability * 100.0,
            candidate.scientific_name,
            candidate.common_names.first().map(String::as_str).unwrap_or("")
        );
    }
    if !related.is_empty() {
        println!("{} species related to the photo", related.len());
    }
}
