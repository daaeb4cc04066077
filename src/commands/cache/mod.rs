use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::resources::Resource;
use crate::store::cache::Caches;
use crate::store::Store;
use crate::utils::{format_table, relative_time};

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[clap(name = "ls", alias = "list", about = "List the cached resources")]
    List,
    #[clap(about = "Drop cached resources")]
    Clear {
        #[clap(value_enum, help = "Only drop this resource")]
        resource: Option<Resource>,
    },
}

#[derive(Debug, Parser)]
#[clap(about = "Inspect the local resource cache")]
pub struct Options {
    #[clap(subcommand)]
    pub commands: Commands,
}

pub async fn handle(options: Options) -> Result<()> {
    let mut caches = Caches::new().await?;

    match options.commands {
        Commands::List => {
            if caches.entries.is_empty() {
                log::info!("Nothing is cached");

                return Ok(());
            }

            let rows = caches
                .entries
                .iter()
                .map(|(key, entry)| {
                    let items = entry.data.as_array().map_or(1, Vec::len);
                    let resource = Resource::from_cache_key(key)
                        .map_or("-", |resource| resource.path());

                    format!("{key}\t{resource}\t{items}\t{}", relative_time(entry.fetched_at))
                })
                .collect::<Vec<_>>();

            println!("{}", format_table(Some("KEY\tPATH\tITEMS\tFETCHED"), &rows)?.join("\n"));
        }

        Commands::Clear { resource: Some(resource) } => {
            if caches.evict(resource.cache_key()) {
                caches.save().await?;
            }

            log::info!("Cleared {}", resource.cache_key());
        }

        Commands::Clear { resource: None } => {
            caches.clear();
            caches.save().await?;

            log::info!("Cleared all caches");
        }
    }

    Ok(())
}
