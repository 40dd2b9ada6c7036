use clap::{Arg, ArgAction, ArgMatches, Command};
use rivers_marine::{
    ContentSource, Dictionary, Entity, LISTING_PER_PAGE, Locale, MemorySite, Page, Post,
    ProbeStrategy, Resolver, Routable, SiteContent, Vessel, VesselFilterValues, build_metadata,
    filter_vessels, page_from_query, paginate, partition_by_locale,
};
use rivers_marine_wp::WordPressClient;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("rivers-wp")
        .version("0.1.0")
        .about("Query the Rivers Marine content source from the command line")
        .subcommand_required(true)
        .arg(
            Arg::new("fixtures")
                .long("fixtures")
                .global(true)
                .help("Serve content from a JSON fixture file instead of WORDPRESS_URL"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve a slug under a locale and print the resolution as JSON")
                .arg(
                    Arg::new("kind")
                        .help("Content kind")
                        .required(true)
                        .value_parser(["pages", "posts", "vessel"])
                        .index(1),
                )
                .arg(Arg::new("slug").help("Slug to resolve").required(true).index(2))
                .arg(
                    Arg::new("locale")
                        .help("Requested locale (e.g. en, es, es-PY)")
                        .required(true)
                        .index(3),
                )
                .arg(
                    Arg::new("concurrent")
                        .long("concurrent")
                        .help("Probe other locales concurrently")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("vessels")
                .about("Print the vessel listing for a locale")
                .arg(
                    Arg::new("locale")
                        .help("Listing locale (e.g. en, es)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .short('f')
                        .help("Filter criterion as key=value (e.g. type=barge, search=tug, page=2)")
                        .action(ArgAction::Append),
                ),
        )
        .get_matches();

    let source: Box<dyn SiteContent> = match matches.get_one::<String>("fixtures") {
        Some(path) => Box::new(MemorySite::from_file(Path::new(path))?),
        None => match WordPressClient::from_env() {
            Ok(client) => Box::new(client),
            Err(e) => {
                eprintln!("{}", e);
                eprintln!("   Set it with: export WORDPRESS_URL=https://your-wordpress-site");
                eprintln!("   Or use --fixtures <file> to read content from a fixture file");
                return Err(e.into());
            }
        },
    };

    match matches.subcommand() {
        Some(("resolve", args)) => resolve(source.as_ref(), args).await,
        Some(("vessels", args)) => vessels(source.as_ref(), args).await,
        _ => Err("Unknown command".into()),
    }
}

fn locale_arg(args: &ArgMatches) -> Result<Locale, Box<dyn std::error::Error>> {
    let tag = args.get_one::<String>("locale").ok_or("Missing locale")?;
    Locale::from_language_tag(tag).ok_or_else(|| format!("Unsupported locale: {}", tag).into())
}

async fn resolve(
    source: &dyn SiteContent,
    args: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind = args.get_one::<String>("kind").ok_or("Missing kind")?;
    let slug = args.get_one::<String>("slug").ok_or("Missing slug")?;
    let locale = locale_arg(args)?;
    let probe = if args.get_flag("concurrent") {
        ProbeStrategy::Concurrent
    } else {
        ProbeStrategy::Sequential
    };

    let output = match kind.as_str() {
        "pages" => resolution_json::<Page, _>(source, slug, locale, probe).await?,
        "posts" => resolution_json::<Post, _>(source, slug, locale, probe).await?,
        _ => resolution_json::<Vessel, _>(source, slug, locale, probe).await?,
    };

    match output {
        Some(json) => {
            println!("{}", json);
            Ok(())
        }
        None => Err(format!("No {} found for '{}' in any locale", kind, slug).into()),
    }
}

async fn resolution_json<T, S>(
    source: &S,
    slug: &str,
    locale: Locale,
    probe: ProbeStrategy,
) -> Result<Option<String>, Box<dyn std::error::Error>>
where
    S: ContentSource<T> + ?Sized,
    T: Entity + Routable + Serialize + Send,
{
    let resolution = Resolver::new(source)
        .with_probe(probe)
        .resolve_routable::<T>(slug, locale)
        .await?;

    match resolution {
        Some(resolution) => Ok(Some(serde_json::to_string_pretty(&resolution)?)),
        None => Ok(None),
    }
}

async fn vessels(
    source: &dyn SiteContent,
    args: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let locale = locale_arg(args)?;
    let pairs: Vec<(String, String)> = args
        .get_many::<String>("filter")
        .into_iter()
        .flatten()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => Err(format!("Filter '{}' is not in key=value form", pair)),
        })
        .collect::<Result<_, _>>()?;

    let catalog = ContentSource::<Vessel>::fetch_all(source, locale).await?;
    let metadata = build_metadata(&catalog);
    let page = page_from_query(pairs.iter().map(|(key, value)| (key, value)));
    let criteria = VesselFilterValues::from_query(pairs).clamp_to(&metadata.ranges);
    let filtered: Vec<Vessel> = filter_vessels(&catalog, &criteria)
        .into_iter()
        .cloned()
        .collect();
    let listing = paginate(filtered, page, LISTING_PER_PAGE);
    let partition = partition_by_locale(listing.items, locale);

    let dictionary = Dictionary::embedded()?;
    let count_text = dictionary.translate_count(
        locale,
        "vessels.list.count",
        partition.matches.len() as u64,
        &[("suffix", String::new())],
    );

    let output = json!({
        "locale": locale,
        "source": ContentSource::<Vessel>::source_name(source),
        "catalog_size": catalog.len(),
        "page": listing.page,
        "total": listing.total,
        "total_pages": listing.total_pages,
        "summary": count_text,
        "matches": partition.matches.iter().map(|v| v.id).collect::<Vec<_>>(),
        "fallbacks": partition.fallbacks.iter().map(|v| v.id).collect::<Vec<_>>(),
        "criteria": criteria,
        "facets": metadata,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
