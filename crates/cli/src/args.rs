//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// nutri-grade: grade grocery products on the A-E nutrition scale
#[derive(Parser, Debug)]
#[command(name = "nutri-grade")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a nutrient profile given on the command line or as JSON
    Grade(GradeArgs),

    /// Grade catalog products, using and refreshing the result cache
    Lookup(LookupArgs),

    /// Inspect the result cache
    Cache(CacheArgs),

    /// Manage category classifier rules
    Rules(RulesArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct GradeArgs {
    /// Energy in kJ per 100 g
    #[arg(long)]
    pub energy: Option<f64>,

    /// Sugars in g per 100 g
    #[arg(long)]
    pub sugars: Option<f64>,

    /// Saturated fats in g per 100 g
    #[arg(long)]
    pub saturated_fats: Option<f64>,

    /// Salt in g per 100 g
    #[arg(long)]
    pub salt: Option<f64>,

    /// Proteins in g per 100 g
    #[arg(long)]
    pub proteins: Option<f64>,

    /// Fiber in g per 100 g
    #[arg(long)]
    pub fiber: Option<f64>,

    /// Fruit, vegetables and legumes share in percent
    #[arg(long)]
    pub fruit_veg: Option<f64>,

    /// JSON file with the nutrient profile (use - for stdin)
    #[arg(long, conflicts_with_all = [
        "energy", "sugars", "saturated_fats", "salt", "proteins", "fiber", "fruit_veg"
    ])]
    pub file: Option<PathBuf>,

    /// Catalog category name, classified by the rules (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Category flag set directly, e.g. cheese or red_meat (repeatable)
    #[arg(long = "flag")]
    pub flags: Vec<String>,

    /// Scoring revision (legacy-2017, 2022, 2022-fats)
    #[arg(long)]
    pub revision: Option<String>,

    /// Override classifier rules file
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the point breakdown behind the grade
    #[arg(long)]
    pub explain: bool,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Catalog product ids
    #[arg(required = true)]
    pub product_ids: Vec<String>,

    /// Scoring revision (legacy-2017, 2022, 2022-fats)
    #[arg(long)]
    pub revision: Option<String>,

    /// Append a JSON line per produced badge to this file
    #[arg(long)]
    pub badges: Option<PathBuf>,

    /// Serve products from a JSON file instead of the catalog API
    #[arg(long)]
    pub catalog_file: Option<PathBuf>,

    /// Recompute every product; results are still written to the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show the cached entry for a product
    Get {
        /// Catalog product id
        product_id: String,

        /// Scoring revision whose cache to read
        #[arg(long)]
        revision: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show backend and entry count
    Stats {
        /// Scoring revision whose cache to read
        #[arg(long)]
        revision: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommands,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommands {
    /// List the active classifier rules
    List {
        /// Override classifier rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output as JSON
        #[arg(long, conflicts_with = "toml")]
        json: bool,

        /// Output in the rules file format, ready to edit
        #[arg(long)]
        toml: bool,
    },

    /// Validate a classifier rules file
    Validate {
        /// Override classifier rules file
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
