use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "satchel",
    about = "Satchel: inspect and mint bounded container payloads",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode a hex payload and print the record
    Inspect(InspectArgs),
    /// Print the hex payload of a fresh container
    Mint(MintArgs),
    /// Parse an engine config file and print the resolved values
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Hex-encoded payload, as stored on a carrier
    pub blob: String,
    /// Container id the payload belongs to; a throwaway id if omitted
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct MintArgs {
    /// Tier ordinal, 1 through 5
    #[arg(long, default_value = "1")]
    pub tier: i32,
    /// Seed contents, as KIND=QTY; may be repeated
    #[arg(long = "item")]
    pub items: Vec<String>,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    pub path: std::path::PathBuf,
}
