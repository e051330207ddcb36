use anyhow::Context as _;
use objregistry::{EndpointResolver, Registry, RegionOptions, wrapper::trace::TracedResolver};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  endpoint <provider> [region] [account_id] [custom_endpoint]
  endpoint --providers
  endpoint --regions <provider>
  endpoint --checksum [path]

Set OBJREGISTRY_DATA to use a provider document other than the bundled one.";

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(first) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let registry = match std::env::var_os("OBJREGISTRY_DATA") {
        Some(path) => Registry::from_path(path),
        None => Registry::new_default(),
    }
    .context("Failed to load provider registry")?;

    match first.as_str() {
        "--providers" => {
            for (key, label) in registry.provider_options(None) {
                println!("{key:<16} {label}");
            }
        }
        "--regions" => {
            let provider = args.get(1).context("missing provider key")?;
            let options = registry.region_options(provider, None, true)?;
            if let RegionOptions::Grouped { groups, .. } = options {
                for (continent, entries) in groups {
                    println!("{continent}:");
                    for (_, label) in entries {
                        println!("  {label}");
                    }
                }
            }
        }
        "--checksum" => {
            let path = args.get(1).map(std::path::Path::new);
            println!("{}", Registry::checksum(path)?);
        }
        provider => {
            let arg = |index: usize| args.get(index).map(String::as_str).unwrap_or_default();
            let custom = args.get(4).map(String::as_str);

            let resolver = TracedResolver::new("cli", &registry);
            let endpoint = resolver.resolve(provider, arg(1), arg(2), custom)?;
            println!("{endpoint}");
        }
    }

    Ok(())
}
