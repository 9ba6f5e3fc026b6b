//! Clap derive structures for the `shopkeep` CLI.
//!
//! Defines the command tree, global flags, and shared types. This file
//! is also compiled by `build.rs` for man pages, so it may only depend
//! on clap and clap_complete.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// shopkeep -- manage a storefront catalog from the command line
#[derive(Debug, Parser)]
#[command(
    name = "shopkeep",
    version,
    about = "Manage your storefront catalog from the command line",
    long_about = "Sign in to your store account, browse and search the live product\n\
        catalog, and add new products.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Store profile to use
    #[arg(long, short = 'p', env = "SHOPKEEP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SHOPKEEP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides the profile)
    #[arg(long, env = "SHOPKEEP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, create an account, or reset a password
    Auth(AuthArgs),

    /// Browse, search, and add catalog products
    #[command(alias = "p")]
    Products(ProductsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in with the profile's credentials and show the account
    Login {
        /// Account email (defaults to the profile's)
        #[arg(long, short = 'e')]
        email: Option<String>,
    },

    /// Create a new account (prompts for the password twice)
    Signup {
        /// Account email (defaults to the profile's)
        #[arg(long, short = 'e')]
        email: Option<String>,
    },

    /// Mail a password-reset link
    ResetPassword {
        /// Account email (defaults to the profile's)
        #[arg(long, short = 'e')]
        email: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PRODUCTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List the catalog
    #[command(alias = "ls")]
    List {
        /// Only show products whose name contains this text (case-insensitive)
        #[arg(long, short = 's')]
        search: Option<String>,
    },

    /// Show one product
    Get {
        /// Product id
        id: String,
    },

    /// Add a product to the catalog
    Add(AddProductArgs),

    /// Follow the live catalog, printing every change
    Watch {
        /// Only show products whose name contains this text (case-insensitive)
        #[arg(long, short = 's')]
        search: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct AddProductArgs {
    /// Product name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Price used for both buying and selling unless overridden
    #[arg(long)]
    pub price: Option<String>,

    /// Buying price
    #[arg(long)]
    pub buying_price: Option<String>,

    /// Selling price
    #[arg(long)]
    pub selling_price: Option<String>,

    /// Buying unit (e.g. "box")
    #[arg(long, default_value = "")]
    pub buying_unit: String,

    /// Selling unit (e.g. "piece")
    #[arg(long, default_value = "")]
    pub selling_unit: String,

    /// Where the product is bought from
    #[arg(long, default_value = "")]
    pub buying_point: String,

    /// Purchase date, YYYY-MM-DD (defaults to today)
    #[arg(long, default_value = "")]
    pub date: String,

    /// Image URL
    #[arg(long, default_value = "")]
    pub image: String,

    /// Free-form pricing notes
    #[arg(long, default_value = "")]
    pub price_info: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a profile value
    Set {
        /// Profile key (e.g. "tenant", "email", "timeout")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the account password (or API key) in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,

        /// Store the web API key instead of the password
        #[arg(long)]
        api_key: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
