use std::future::Future;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;

use crate::permissions::guard;
use crate::resources::Resource;
use crate::session::Session;
use crate::state::http::HttpClient;
use crate::state::State;
use crate::store::cache::Caches;
use crate::store::Store;
use crate::utils::relative_time;

#[derive(Debug, Parser)]
#[clap(about = "List a resource, served from the local cache when possible")]
pub struct Options {
    #[clap(value_enum, help = "The resource to list")]
    pub resource: Resource,
    #[clap(short, long, help = "Skip the cache and fetch from the API")]
    pub fresh: bool,
}

pub async fn handle(options: Options, session: &Session, state: State) -> Result<()> {
    let resource = options.resource;

    let listing = guard(
        &session.roles,
        resource.permission(),
        || list(resource, options.fresh, &state.http),
        None,
    );

    let Some(listing) = listing else {
        log::warn!(
            "You need the `{}` permission to list {}",
            resource.permission(),
            resource.path()
        );

        return Ok(());
    };

    let data = listing.await?;

    println!("{}", serde_json::to_string_pretty(&data)?);

    Ok(())
}

/// Read-through: the cached copy unless `fresh`, otherwise the API.
pub async fn list(resource: Resource, fresh: bool, http: &HttpClient) -> Result<Value> {
    let mut caches = Caches::new().await?;

    let (data, fetched) = read_through(&mut caches, resource, fresh, || fetch(resource, http)).await?;

    if fetched {
        caches.save().await?;
    }

    Ok(data)
}

async fn fetch(resource: Resource, http: &HttpClient) -> Result<Value> {
    Ok(http
        .request::<Value>("GET", resource.path())
        .await?
        .unwrap_or(Value::Array(vec![])))
}

/// Returns the data and whether `caches` was updated with a fresh copy.
async fn read_through<F, Fut>(
    caches: &mut Caches,
    resource: Resource,
    fresh: bool,
    fetch: F,
) -> Result<(Value, bool)>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    if !fresh {
        if let Some(entry) = caches.get(resource.cache_key()) {
            log::debug!(
                "Using {} from {}",
                resource.cache_key(),
                relative_time(entry.fetched_at)
            );

            return Ok((entry.data.clone(), false));
        }
    }

    let data = fetch().await?;

    caches.insert(resource.cache_key(), data.clone());

    Ok((data, true))
}
