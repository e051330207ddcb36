use objregistry::Registry;
use objregistry_config::FsConfigStore;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = match std::env::args().nth(1) {
        Some(dir) => FsConfigStore::new(dir.into()),
        None => FsConfigStore::new_default()?,
    };
    let registry = Registry::new_default()?;

    let loaded = store.connections()?;
    for failed in &loaded.failed {
        eprintln!("failed to load {:?}: {}", failed.source, failed.error);
    }

    let (resolved, failed) = loaded.resolve_all(&registry);
    for con in resolved {
        let bucket = match con.default_bucket_url() {
            Some(Ok(url)) => url.to_string(),
            Some(Err(err)) => format!("<invalid bucket: {err}>"),
            None => "-".to_string(),
        };
        println!(
            "{:<16} {:<14} {:<16} {} {}",
            con.name, con.provider, con.region, con.base_url, bucket
        );
    }
    for (name, err) in failed {
        eprintln!("{name}: {err:#}");
    }

    Ok(())
}
