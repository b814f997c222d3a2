use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use shelter::{
    load_records, BarChart, Category, Config, MapView, MemoryStore, Record, RecordStore,
    Render, Session, Shelter, Source,
};

#[derive(Parser, Debug)]
#[clap(name = "shelter", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[clap(short, long)]
    verbose: bool,

    /// Configuration file (JSON, YAML or TOML).
    #[clap(short, long, default_value = "shelter.yml")]
    config: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the rescue categories that can be filtered on.
    Categories,

    /// Load records from JSON, YAML or TOML files into the configured
    /// collection.
    Import {
        /// Files (or glob patterns) to import.
        #[clap(required = true)]
        patterns: Vec<String>,
    },

    /// Show the dashboard views for a rescue category.
    Show {
        /// The category to filter on.
        #[clap(long, default_value = "All")]
        category: String,

        /// The selected table row.
        #[clap(long)]
        row: Option<usize>,

        /// Which table page to print.
        #[clap(long, default_value = "0")]
        page: usize,

        /// Read records from this file instead of the configured database.
        #[clap(long)]
        data: Option<PathBuf>,

        /// Print the views as JSON.
        #[clap(long)]
        json: bool,
    },
}

fn main() {
    let args = Args::parse();
    simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    })
    .unwrap();

    if let Err(e) = run(args) {
        log::error!("Failed: {:?}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::load(&args.config)?;
    match args.command {
        Command::Categories => {
            for category in Category::ALL {
                println!("{:<32} {}", category.value(), category.label());
            }
            Ok(())
        }
        Command::Import { patterns } => import(&config, &patterns),
        Command::Show {
            category,
            row,
            page,
            data,
            json,
        } => {
            let options = ShowOptions {
                category,
                row,
                page,
                json,
            };
            match data {
                Some(path) => {
                    let store = MemoryStore::new(load_records(&path)?);
                    show(&config, &Shelter::new(store, config.query_timeout()), &options)
                }
                None => show(&config, &config.open_shelter()?, &options),
            }
        }
    }
}

fn import(config: &Config, patterns: &[String]) -> Result<()> {
    let mut shelter = config.open_shelter()?;
    let mut total = 0;
    for pattern in patterns {
        for entry in Source::Files(pattern.clone()).iter()? {
            let (path, records) = entry?;
            let count = shelter
                .insert(records)
                .wrap_err_with(|| format!("failed to import {}", path.display()))?;
            log::debug!("Imported {} records from {}", count, path.display());
            total += count;
        }
    }
    log::info!(
        "Imported {} records into collection \"{}\"",
        total,
        config.collection
    );
    Ok(())
}

struct ShowOptions {
    category: String,
    row: Option<usize>,
    page: usize,
    json: bool,
}

fn show<S: RecordStore>(config: &Config, shelter: &Shelter<S>, options: &ShowOptions) -> Result<()> {
    let mut session =
        Session::open_with_category(shelter, config.fields.clone(), &options.category)?;
    session.select_row(options.row);

    if options.json {
        let table = session.table(config.page_size);
        let output = serde_json::json!({
            "category": session.category().value(),
            "columns": table.columns(),
            "page": options.page,
            "pageCount": table.page_count(),
            "rows": table.page(options.page),
            "chart": session.chart(),
            "map": session.map(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        session.subscribe(TextRenderer {
            page: options.page,
            page_size: config.page_size,
        });
    }
    Ok(())
}

/// Prints the dashboard views to standard output.
struct TextRenderer {
    page: usize,
    page_size: usize,
}

impl Render for TextRenderer {
    fn table(&mut self, rows: &[Record]) {
        let table = shelter::Table::new(rows, self.page_size);
        println!(
            "Records (page {} of {}, {} total)",
            self.page + 1,
            table.page_count(),
            table.len()
        );
        print!("{}", table.render_page(self.page));
        println!();
    }

    fn chart(&mut self, chart: &BarChart) {
        println!("{}", chart.title);
        if chart.is_empty() {
            println!("  (no data)");
        }
        for (breed, count) in chart.categories.iter().zip(&chart.counts) {
            println!("  {:<40} {}", breed, count);
        }
        println!();
    }

    fn map(&mut self, map: &MapView) {
        match &map.marker {
            Some(marker) => println!(
                "Marker at ({}, {}): {} / {}: {}",
                marker.lat, marker.lon, marker.label, marker.popup_heading, marker.popup_text
            ),
            None => println!("No marker for the selected row"),
        }
    }
}
