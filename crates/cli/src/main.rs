// ABOUTME: Command-line front end for exhtml: fetch, query, strip and token-extract HTML, read feeds.
// ABOUTME: Inputs are URLs, local files or stdin ("-"); diagnostics go to stderr through tracing.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use exhtml::dom::mutate::{remove_by_tag, remove_by_tag_attr, remove_by_tag_class};
use exhtml::dom::query::{
    elements_by_tag, elements_by_tag_and_class, elements_by_tag_and_id, elements_by_tag_attr,
    metas_by_itemprop, metas_by_name, metas_by_property,
};
use exhtml::token::{
    element_by_tag_and_id_raw, elements_by_tag_and_class_raw, elements_by_tag_raw,
};
use exhtml::{parse_bytes, Client, ParseStatus};
use scraper::{ElementRef, Html};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Fetch pages and feeds, query and prune the parsed HTML.
#[derive(Parser, Debug)]
#[command(name = "exhtml")]
#[command(about = "Extract elements, raw markup and links from web pages and feeds", long_about = None)]
struct Args {
    /// User-Agent header for every request (default: a desktop Chrome identity).
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    /// Total time in seconds during which failed page fetches are retried.
    #[arg(long, global = true, default_value_t = 30)]
    retry_secs: u64,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a page, report the parse status on stderr and print the document.
    Fetch {
        url: String,
        /// Print the body bytes exactly as received.
        #[arg(long)]
        raw: bool,
    },
    /// Print the HTML of every matching element, one per line.
    Select {
        /// URL, file path, or "-" for stdin.
        input: String,
        #[arg(long)]
        tag: String,
        /// Attribute name; alone it only has to be present.
        #[arg(long, conflicts_with_all = ["class", "id"])]
        attr: Option<String>,
        /// Exact attribute value (requires --attr).
        #[arg(long, requires = "attr")]
        value: Option<String>,
        /// Exact class attribute value.
        #[arg(long, conflicts_with = "id")]
        class: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove matching elements and print the resulting document.
    Strip {
        input: String,
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
        /// Only remove elements whose class is exactly this value.
        #[arg(long, conflicts_with = "attr")]
        class: Option<String>,
        /// Only remove elements carrying this exact attribute, as KEY=VALUE.
        #[arg(long)]
        attr: Option<String>,
    },
    /// Extract raw markup from the token stream without building a tree.
    Raw(RawArgs),
    /// Print the content of matching <meta> elements, one per line.
    Meta {
        input: String,
        #[arg(long)]
        property: Vec<String>,
        #[arg(long)]
        name: Vec<String>,
        #[arg(long)]
        itemprop: Vec<String>,
    },
    /// Print the same-site links of a page.
    Links { url: String },
    /// Print a feed as JSON, or only its guids or links.
    Rss {
        url: String,
        #[arg(long, conflicts_with = "links")]
        guids: bool,
        #[arg(long)]
        links: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct RawArgs {
    input: String,
    /// Tags whose markup (and enclosed text) is kept.
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Narrow the input to what follows the first <CONTAINER> with --class or --id.
    #[arg(long)]
    container: Option<String>,
    #[arg(long, requires = "container", conflicts_with = "id")]
    class: Option<String>,
    #[arg(long, requires = "container")]
    id: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let client = build_client(&args)?;
    let retry = Duration::from_secs(args.retry_secs);
    let mut stdout = io::stdout().lock();

    match args.command {
        Command::Fetch { url, raw } => {
            let page = client
                .get_raw_and_doc(&url, retry)
                .with_context(|| format!("fetching {}", url))?;
            eprintln!("status: {}, parse: {}", page.status, describe(&page.parse_status));
            if raw {
                stdout.write_all(&page.raw)?;
            } else {
                writeln!(stdout, "{}", page.html.html())?;
            }
        }
        Command::Select {
            input,
            tag,
            attr,
            value,
            class,
            id,
        } => {
            let doc = load_document(&client, &input, retry)?;
            let root = doc.tree.root();
            let found: Vec<ElementRef<'_>> = match (attr, class, id) {
                (Some(attr), _, _) => {
                    elements_by_tag_attr(root, &tag, &attr, value.as_deref().unwrap_or_default())
                }
                (None, Some(class), _) => elements_by_tag_and_class(root, &tag, &class),
                (None, None, Some(id)) => elements_by_tag_and_id(root, &tag, &id),
                (None, None, None) => elements_by_tag(root, &[tag.as_str()]),
            };
            debug!(matches = found.len(), "select");
            for element in found {
                writeln!(stdout, "{}", element.html())?;
            }
        }
        Command::Strip {
            input,
            tags,
            class,
            attr,
        } => {
            let mut doc = load_document(&client, &input, retry)?;
            let root = doc.tree.root().id();
            let attr = attr.as_deref().map(split_pair).transpose()?;
            for tag in &tags {
                match (&class, attr) {
                    (Some(class), _) => {
                        remove_by_tag_class(&mut doc.tree, root, tag, Some(class.as_str()))
                    }
                    (None, Some(pair)) => remove_by_tag_attr(&mut doc.tree, root, tag, Some(pair)),
                    (None, None) => {}
                }
            }
            if class.is_none() && attr.is_none() {
                let names: Vec<&str> = tags.iter().map(String::as_str).collect();
                remove_by_tag(&mut doc.tree, root, &names);
            }
            writeln!(stdout, "{}", doc.html())?;
        }
        Command::Raw(raw_args) => {
            let bytes = load_bytes(&client, &raw_args.input, retry)?;
            let out = extract_raw(&bytes, &raw_args)?;
            stdout.write_all(&out)?;
        }
        Command::Meta {
            input,
            property,
            name,
            itemprop,
        } => {
            if property.is_empty() && name.is_empty() && itemprop.is_empty() {
                bail!("give at least one of --property, --name or --itemprop");
            }
            let doc = load_document(&client, &input, retry)?;
            let root = doc.tree.root();
            let property: Vec<&str> = property.iter().map(String::as_str).collect();
            let name: Vec<&str> = name.iter().map(String::as_str).collect();
            let itemprop: Vec<&str> = itemprop.iter().map(String::as_str).collect();

            let metas = metas_by_property(root, &property)
                .into_iter()
                .chain(metas_by_name(root, &name))
                .chain(metas_by_itemprop(root, &itemprop));
            for meta in metas {
                if let Some(content) = meta.value().attr("content") {
                    writeln!(stdout, "{}", content)?;
                }
            }
        }
        Command::Links { url } => {
            let links = client
                .extract_links(&url)
                .with_context(|| format!("extracting links from {}", url))?;
            for link in links {
                writeln!(stdout, "{}", link)?;
            }
        }
        Command::Rss { url, guids, links } => {
            if guids || links {
                let values = if guids {
                    client.feed_guids(&url)
                } else {
                    client.feed_links(&url)
                };
                let values = values.with_context(|| format!("reading feed {}", url))?;
                for value in values {
                    writeln!(stdout, "{}", value)?;
                }
            } else {
                let feed = client
                    .feed(&url)
                    .with_context(|| format!("reading feed {}", url))?;
                writeln!(stdout, "{}", serde_json::to_string_pretty(&feed)?)?;
            }
        }
    }

    stdout.flush()?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_client(args: &Args) -> Result<Client> {
    let mut builder = Client::builder().attempt_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent);
    }
    Ok(builder.build()?)
}

fn describe(status: &ParseStatus) -> String {
    match status {
        ParseStatus::Clean => "clean".to_string(),
        ParseStatus::Recovered { errors } => format!("recovered ({} errors)", errors.len()),
    }
}

fn is_url(target: &str) -> bool {
    Url::parse(target)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn load_bytes(client: &Client, target: &str, retry: Duration) -> Result<Vec<u8>> {
    if target == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }

    if is_url(target) {
        let page = client
            .get_raw_and_doc(target, retry)
            .with_context(|| format!("fetching {}", target))?;
        return Ok(page.raw.to_vec());
    }

    let path = PathBuf::from(target);
    if !path.exists() {
        return Err(anyhow!("file not found: {}", target));
    }
    Ok(fs::read(path)?)
}

fn load_document(client: &Client, target: &str, retry: Duration) -> Result<Html> {
    if is_url(target) {
        let page = client
            .get_raw_and_doc(target, retry)
            .with_context(|| format!("fetching {}", target))?;
        debug!(status = page.status, parse = %describe(&page.parse_status), "loaded page");
        return Ok(page.html);
    }
    let bytes = load_bytes(client, target, retry)?;
    let (html, status) = parse_bytes(&bytes, None);
    debug!(parse = %describe(&status), "parsed input");
    Ok(html)
}

fn extract_raw(bytes: &[u8], args: &RawArgs) -> Result<Vec<u8>> {
    let window: &[u8] = match (&args.container, &args.class, &args.id) {
        (Some(container), Some(class), _) => {
            let collected = elements_by_tag_and_class_raw(bytes, container, class)?;
            return finish_raw(&collected, &args.tags);
        }
        (Some(container), None, Some(id)) => {
            element_by_tag_and_id_raw(bytes, container, id).unwrap_or_default()
        }
        (Some(_), None, None) => bail!("--container needs --class or --id"),
        (None, _, _) => bytes,
    };
    finish_raw(window, &args.tags)
}

fn finish_raw(window: &[u8], tags: &[String]) -> Result<Vec<u8>> {
    if tags.is_empty() {
        return Ok(window.to_vec());
    }
    let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
    Ok(elements_by_tag_raw(window, &tags)?)
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    pair.split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {:?}", pair))
}
