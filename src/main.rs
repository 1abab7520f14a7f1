use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use winget_scout::config::{DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, LookupConfig};
use winget_scout::lookup::service::{LookupRequest, PackageLookup};

#[derive(Parser)]
#[command(name = "winget-scout")]
#[command(version, about = "Query WinGet package metadata and 64-bit installer availability")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct QueryArgs {
    /// Application display name to search for
    name: String,

    /// Only accept packages from this publisher
    #[arg(long)]
    publisher: Option<String>,

    /// Match this exact package id instead of scoring candidates
    #[arg(long)]
    id: Option<String>,

    /// Require a 64-bit installer
    #[arg(long)]
    require_64bit: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout: u64,
}

impl QueryArgs {
    fn into_request(self) -> LookupRequest {
        LookupRequest {
            display_name: self.name,
            publisher: self.publisher,
            package_id: self.id,
            require_64bit: self.require_64bit,
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a package exists
    Exists(QueryArgs),

    /// Show full metadata for the best-matching package
    Info(QueryArgs),

    /// Resolve a package from an MSI product code via the local winget tool
    ProductCode {
        code: String,

        #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_SECS)]
        timeout: u64,
    },

    /// Warm the search cache for a list of terms
    Prewarm {
        terms: Vec<String>,

        #[arg(long)]
        publisher: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let lookup = PackageLookup::new(&LookupConfig::default());

    match cli.command {
        Command::Exists(args) => {
            let found = lookup.exists(&args.into_request()).await?;
            println!("{found}");
            if !found {
                std::process::exit(1);
            }
        }
        Command::Info(args) => {
            let details = lookup.details(&args.into_request()).await?;
            if !details.found {
                println!("not found");
                std::process::exit(1);
            }
            println!(
                "{} [{}]",
                details.name.as_deref().unwrap_or("(unnamed)"),
                details.id.as_deref().unwrap_or("")
            );
            if let Some(publisher) = &details.publisher {
                println!("Publisher: {publisher}");
            }
            if let Some(description) = &details.description {
                println!("Description: {description}");
            }
            if let Some(homepage) = &details.homepage {
                println!("Homepage: {homepage}");
            }
            if let Some(license) = &details.license {
                println!("License: {license}");
            }
            if !details.tags.is_empty() {
                println!("Tags: {}", details.tags_display());
            }
            if let Some(latest) = &details.latest_version {
                println!("Latest version: {latest}");
            }
            if !details.architectures.is_empty() {
                println!(
                    "Architectures: {}",
                    join(details.architectures.iter().map(|a| a.as_str()))
                );
            }
            if !details.installer_types.is_empty() {
                println!(
                    "Installer types: {}",
                    join(details.installer_types.iter().map(|t| t.as_str()))
                );
            }
            if !details.scopes.is_empty() {
                println!("Scopes: {}", join(details.scopes.iter().map(|s| s.as_str())));
            }
            println!("64-bit installer: {}", details.has_64bit);
        }
        Command::ProductCode { code, timeout } => {
            match lookup.find_by_product_code(&code, timeout).await {
                Some(package) => {
                    println!("{} [{}] {}", package.name, package.id, package.version);
                }
                None => {
                    println!("not found");
                    std::process::exit(1);
                }
            }
        }
        Command::Prewarm { terms, publisher } => {
            lookup.prewarm(&terms, publisher.as_deref()).await;
            let stats = lookup.cache_stats();
            println!(
                "cached {} search result(s), efficiency {:.2}%",
                stats.search_entries,
                stats.efficiency()
            );
        }
    }

    Ok(())
}

fn join<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}
