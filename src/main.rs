mod catalog;
mod config;
mod error;
mod executor;
mod matcher;
mod model;
mod scanner;
mod sources;
mod state;
mod store;

use crate::config::load_config;
use crate::model::Entry;
use crate::state::AppState;
use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Also list executables found on PATH
    #[arg(long, global = true)]
    path: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every application by name
    List,
    /// Show one application by id
    Show { id: String },
    /// Search applications, best match first
    Search { query: Vec<String> },
    /// List favorite applications
    Favorites,
    /// List recently launched applications
    Recent {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// List applications in a category
    Category { name: String },
    /// List all known categories
    Categories,
    /// Flip the favorite flag for every application with this name
    ToggleFavorite { name: String },
    /// Launch an application by id
    Launch { id: String },
    /// Rescan all sources
    Refresh,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = load_config()?;
    if args.path {
        config.sources.scan_path = true;
    }
    let state = AppState::from_config(&config);

    match args.command {
        Command::List => print_entries(&state.list_all(), args.json)?,
        Command::Show { id } => {
            let entry = state.get_by_id(&id)?;
            if args.json {
                print_json(&entry)?;
            } else {
                print_details(&entry);
            }
        }
        Command::Search { query } => print_entries(&state.search(&query.join(" ")), args.json)?,
        Command::Favorites => print_entries(&state.get_favorites(), args.json)?,
        Command::Recent { limit } => print_entries(&state.get_recently_used(limit), args.json)?,
        Command::Category { name } => print_entries(&state.get_by_category(&name), args.json)?,
        Command::Categories => {
            let categories = state.list_categories();
            if args.json {
                print_json(&categories)?;
            } else {
                categories.iter().for_each(|c| println!("{c}"));
            }
        }
        Command::ToggleFavorite { name } => {
            let favorite = state.toggle_favorite(&name)?;
            println!("{name}: {}", if favorite { "favorite" } else { "not favorite" });
        }
        Command::Launch { id } => {
            let entry = state.launch(&id)?;
            println!("Launched {} ({} launches)", entry.display_name, entry.use_count);
        }
        Command::Refresh => println!("{} applications", state.refresh()),
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_entries(entries: &[Entry], json: bool) -> Result<()> {
    if json {
        return print_json(entries);
    }
    for entry in entries {
        let star = if entry.is_favorite { "*" } else { " " };
        println!("{star} {:<32} {}", entry.display_name, entry.id);
    }
    Ok(())
}

fn print_details(entry: &Entry) {
    println!("{}", entry.display_name);
    println!("  id:          {}", entry.id);
    println!("  name:        {}", entry.name);
    println!("  exec:        {}", entry.exec_command);
    if !entry.description.is_empty() {
        println!("  description: {}", entry.description);
    }
    if let Some(icon) = &entry.icon {
        println!("  icon:        {icon}");
    }
    if !entry.categories.is_empty() {
        println!("  categories:  {}", entry.categories.join(", "));
    }
    if !entry.keywords.is_empty() {
        println!("  keywords:    {}", entry.keywords.join(", "));
    }
    println!("  favorite:    {}", entry.is_favorite);
    println!("  launches:    {}", entry.use_count);
}
