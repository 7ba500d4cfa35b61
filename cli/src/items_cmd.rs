//! `catalog items ...` and `catalog stats`: thin wrappers over
//! [`catalog_client::DataContext`].

use anyhow::Context;
use catalog_client::CancellationToken;
use catalog_client::DataContext;
use catalog_client::FetchParams;
use catalog_protocol::Item;
use clap::Parser;
use clap::Subcommand;
use serde_json::Map;
use serde_json::Value;

use crate::StatsArgs;

#[derive(Debug, Parser)]
pub struct ItemsCli {
    #[command(subcommand)]
    pub command: ItemsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ItemsSubcommand {
    /// List one page of items.
    List(ListArgs),
    /// Show a single item.
    Get(GetArgs),
    /// Create an item.
    Add(AddArgs),
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Case-insensitive name search.
    #[arg(long = "q", short = 'q', default_value = "")]
    pub q: String,

    /// Page size.
    #[arg(long = "limit", short = 'l', default_value_t = 20)]
    pub limit: usize,

    /// 1-based page number.
    #[arg(long = "page", short = 'p', default_value_t = 1)]
    pub page: usize,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct GetArgs {
    pub id: i64,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    #[arg(long = "name", short = 'n')]
    pub name: String,

    #[arg(long = "description", short = 'd')]
    pub description: Option<String>,

    #[arg(long = "category", short = 'c')]
    pub category: Option<String>,

    /// Extra field as KEY=VALUE. VALUE is parsed as JSON when possible,
    /// otherwise stored as a string.
    #[arg(long = "field", short = 'f', value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

impl AddArgs {
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields: Map<String, Value> = self.fields.iter().cloned().collect();
        fields.insert("name".to_string(), Value::from(self.name.clone()));
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), Value::from(description.clone()));
        }
        if let Some(category) = &self.category {
            fields.insert("category".to_string(), Value::from(category.clone()));
        }
        fields
    }
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    if key == "id" {
        return Err("id is assigned by the server".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}

impl ItemsCli {
    pub fn run(&self, base_url: &str) -> anyhow::Result<()> {
        let ctx = DataContext::new(base_url)?;
        let token = CancellationToken::new();
        let runtime = runtime()?;
        match &self.command {
            ItemsSubcommand::List(args) => {
                let params = FetchParams {
                    page: args.page,
                    limit: args.limit,
                    q: args.q.clone(),
                };
                let page = runtime.block_on(ctx.fetch_items(&params, &token))?;
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&page)?);
                } else if page.items.is_empty() {
                    println!("No results.");
                } else {
                    for item in &page.items {
                        println!("{}", format_row(item));
                    }
                    println!(
                        "Page {} · Showing {} item(s) of {}",
                        params.page.max(1),
                        page.items.len(),
                        page.total
                    );
                }
            }
            ItemsSubcommand::Get(args) => {
                let item = runtime.block_on(ctx.get_item(args.id, &token))?;
                print_item(&item, args.json)?;
            }
            ItemsSubcommand::Add(args) => {
                let item = runtime.block_on(ctx.create_item(&args.to_fields(), &token))?;
                if !args.json {
                    println!("Created item {}", item.id);
                }
                print_item(&item, args.json)?;
            }
        }
        Ok(())
    }
}

pub fn run_stats(base_url: &str, args: &StatsArgs) -> anyhow::Result<()> {
    let ctx = DataContext::new(base_url)?;
    let stats = runtime()?.block_on(ctx.stats(&CancellationToken::new()))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("Total: {}", stats.total);
    for (category, count) in &stats.by_category {
        println!("  {category:<20} {count}");
    }
    Ok(())
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}

fn format_row(item: &Item) -> String {
    let category = item.category.as_deref().unwrap_or("-");
    format!(
        "{:>14}  {:<32} {:<14} {}",
        item.id, item.name, category, item.description
    )
}

fn print_item(item: &Item, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
        return Ok(());
    }
    println!("id:          {}", item.id);
    println!("name:        {}", item.name);
    println!("description: {}", item.description);
    if let Some(category) = &item.category {
        println!("category:    {category}");
    }
    for (key, value) in &item.extra {
        println!("{:<12} {value}", format!("{key}:"));
    }
    Ok(())
}
