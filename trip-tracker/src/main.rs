use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use trip_tracker::domain::{CompanyId, OrganizerCompany};
use trip_tracker::locations::{CacheConfig, CachedResolver, Gazetteer};
use trip_tracker::manifest::{ManifestDocument, extract_document};
use trip_tracker::reconcile::{ReconcileConfig, Reconciler, SystemClock};
use trip_tracker::store::{MemoryStore, SnapshotFile, Store};

/// Default snapshot location when `TRIP_TRACKER_STORE` is not set.
const DEFAULT_STORE: &str = "trip_tracker_store.json";

const USAGE: &str = "usage: trip-tracker <ingest|preview> <manifest.json> <organizer company>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ingest,
    Preview,
}

struct Args {
    mode: Mode,
    manifest: PathBuf,
    company: String,
}

fn parse_args() -> Option<Args> {
    let mut args = std::env::args().skip(1);
    let mode = match args.next()?.as_str() {
        "ingest" => Mode::Ingest,
        "preview" => Mode::Preview,
        _ => return None,
    };
    let manifest = PathBuf::from(args.next()?);
    let company = args.collect::<Vec<_>>().join(" ");
    if company.trim().is_empty() {
        return None;
    }
    Some(Args {
        mode,
        manifest,
        company,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "trip-tracker failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let store_path = std::env::var("TRIP_TRACKER_STORE").unwrap_or_else(|_| DEFAULT_STORE.to_string());
    let snapshot_file = SnapshotFile::new(store_path);
    let mut store = MemoryStore::from_snapshot(snapshot_file.load()?);
    info!(
        path = %snapshot_file.path().display(),
        trips = store.trip_count(),
        passengers = store.passenger_count(),
        "loaded store"
    );

    let company = company_id(&mut store, &args.company)?;
    let gazetteer = gazetteer(&store)?;
    let resolver = CachedResolver::new(gazetteer, &CacheConfig::default());

    let document = ManifestDocument::load(&args.manifest)?;
    let extraction = extract_document(&document, company, &mut store);
    println!(
        "Read {} records from {}",
        extraction.records.len(),
        args.manifest.display()
    );

    {
        let mut reconciler = Reconciler::new(store, &resolver, SystemClock, ReconcileConfig::default());
        match args.mode {
            Mode::Preview => {
                for record in reconciler.preview(extraction.records)? {
                    print_record(&record);
                }
            }
            Mode::Ingest => {
                let ingestion = reconciler.ingest(extraction.records, company);
                for record in &ingestion.records {
                    print_record(record);
                }
                println!("{}", serde_json::to_string(&ingestion.summary)?);

                let store = reconciler.into_store();
                snapshot_file.save(&store.snapshot())?;
                info!(path = %snapshot_file.path().display(), "saved store");
            }
        }
    }
    debug!(
        cached = resolver.cache_entry_count(),
        places = resolver.inner().len(),
        "location cache"
    );
    Ok(())
}

/// The id of the organizer company called `name`, registering it if new.
fn company_id(store: &mut MemoryStore, name: &str) -> Result<CompanyId, Box<dyn std::error::Error>> {
    let company = match store.find_company(name)? {
        Some(company) => company,
        None => {
            info!(company = name, "registering organizer company");
            store.save_company(OrganizerCompany::new(name.trim()))?
        }
    };
    company
        .id
        .ok_or_else(|| "organizer company was saved without an id".into())
}

/// Places from `TRIP_TRACKER_PLACES`, if set, plus every stored location.
fn gazetteer(store: &MemoryStore) -> Result<Gazetteer, Box<dyn std::error::Error>> {
    let mut gazetteer = match std::env::var("TRIP_TRACKER_PLACES") {
        Ok(path) => Gazetteer::load(Path::new(&path))?,
        Err(_) => Gazetteer::default(),
    };
    gazetteer.learn(&store.locations()?);
    info!(places = gazetteer.len(), "loaded places");
    Ok(gazetteer)
}

fn print_record(record: &trip_tracker::domain::Passenger) {
    let when = record
        .pickup_time
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    let trip = record.trip.map_or_else(|| "-".to_string(), |t| t.to_string());
    match &record.error {
        Some(error) => println!(
            "{:<7} {:<30} {:<16} {:<10} {}",
            record.ingestion.as_str(),
            record.full_name(),
            when,
            trip,
            error
        ),
        None => println!(
            "{:<7} {:<30} {:<16} {}",
            record.ingestion.as_str(),
            record.full_name(),
            when,
            trip
        ),
    }
}
