use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use satchel_codec::ContainerCodec;
use satchel_engine::EngineConfig;
use satchel_store::ContainerRecord;
use satchel_types::{ContainerId, ItemKey, Tier};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Inspect(args) => cmd_inspect(args, cli.format),
        Command::Mint(args) => cmd_mint(args, cli.format),
        Command::CheckConfig(args) => cmd_check_config(args, cli.format),
    }
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = match &args.id {
        Some(raw) => ContainerId::parse(raw).context("invalid --id")?,
        None => ContainerId::new(),
    };
    let codec = ContainerCodec::default();
    match codec.decode_text(id, args.blob.trim()) {
        Ok(record) => print_record(&record, format),
        Err(corrupt) => {
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "corrupt": true, "reason": corrupt.reason })
                ),
                OutputFormat::Text => {
                    println!("{} {}", "✗ Corrupt payload:".red().bold(), corrupt.reason)
                }
            }
            Err(anyhow!(corrupt))
        }
    }
}

fn cmd_mint(args: MintArgs, format: OutputFormat) -> anyhow::Result<()> {
    let tier = Tier::try_from(args.tier)?;
    let mut record = ContainerRecord::new(ContainerId::new(), tier);
    for raw in &args.items {
        let (item, qty) = parse_item(raw)?;
        record
            .add_item(&item, qty)
            .with_context(|| format!("cannot add {raw}"))?;
    }
    let blob = ContainerCodec::default().encode_text(&record)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "id": record.id().to_string(),
                "tier": tier.ordinal(),
                "blob": blob,
            })
        ),
        OutputFormat::Text => {
            println!("{} Minted {} container", "✓".green().bold(), tier.to_string().cyan());
            println!("  Id:   {}", record.id().to_string().yellow());
            println!("  Blob: {blob}");
        }
    }
    Ok(())
}

fn cmd_check_config(args: CheckConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = EngineConfig::load(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "default_tier": config.default_tier.ordinal(),
                "sell_wear": config.sell_wear,
                "prune_stale_ids": config.prune_stale_ids,
            })
        ),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), args.path.display().to_string().bold());
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}

fn print_record(record: &ContainerRecord, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let contents: Vec<_> = record
                .contents()
                .iter()
                .map(|(item, count)| serde_json::json!({ "item": item, "count": count }))
                .collect();
            let value = serde_json::json!({
                "id": record.id().to_string(),
                "tier": record.tier().ordinal(),
                "capacity": record.capacity(),
                "total_items": record.total_items(),
                "durability": record.durability(),
                "max_durability": record.max_durability(),
                "state": if record.is_broken() { "broken" } else { "active" },
                "sell_enabled": record.sell_enabled(),
                "whitelist": record.whitelist().iter().collect::<Vec<_>>(),
                "contents": contents,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            let state = if record.is_broken() {
                "broken".red().bold()
            } else {
                "active".green()
            };
            println!("Container {} ({})", record.id().short_id().yellow().bold(), record.tier());
            println!(
                "  Items:      {}/{} ({:.1}%)",
                record.total_items(),
                record.capacity(),
                record.fill_percentage()
            );
            println!(
                "  Durability: {}/{} {}",
                record.durability(),
                record.max_durability(),
                state
            );
            println!("  Selling:    {}", if record.sell_enabled() { "on" } else { "off" });
            if !record.whitelist().is_empty() {
                let names: Vec<String> = record.whitelist().iter().map(ToString::to_string).collect();
                println!("  Whitelist:  {}", names.join(", ").cyan());
            }
            for (item, count) in record.contents() {
                println!("    {count:>6}  {item}");
            }
        }
    }
    Ok(())
}

fn parse_item(raw: &str) -> anyhow::Result<(ItemKey, u32)> {
    let Some((kind, qty)) = raw.rsplit_once('=') else {
        bail!("expected KIND=QTY, got {raw:?}");
    };
    if kind.is_empty() {
        bail!("empty item kind in {raw:?}");
    }
    let qty = qty.parse().with_context(|| format!("bad quantity in {raw:?}"))?;
    Ok((ItemKey::new(kind), qty))
}
