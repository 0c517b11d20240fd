use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use log::debug;
use url::Url;

use freshness_tracker::auth::{FileTokenStorage, UserUpdate};
use freshness_tracker::batches::{BatchForm, BatchRegistry};
use freshness_tracker::config::ClientOptions;
use freshness_tracker::routes::{nav_links, GuardDecision, Route};
use freshness_tracker::shell::{BatchListView, LandingView, NavView, ProfileView, ReportView};
use freshness_tracker::FreshnessTracker;

const DEFAULT_TOKEN_FILE: &str = ".freshness-session.json";

fn cli() -> Command<'static> {
    Command::new("freshness")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Register meat batches and check their freshness")
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .takes_value(true)
                .help("API origin (default: $FRESHNESS_API_URL or http://localhost:8000)"),
        )
        .arg(
            Arg::new("public-url")
                .long("public-url")
                .value_name("URL")
                .takes_value(true)
                .help("Origin of the report pages (default: $FRESHNESS_PUBLIC_URL or http://localhost:3000)"),
        )
        .arg(
            Arg::new("token-file")
                .long("token-file")
                .value_name("FILE")
                .takes_value(true)
                .default_value(DEFAULT_TOKEN_FILE)
                .help("Where the session token is kept"),
        )
        .arg(
            Arg::new("discover")
                .long("discover")
                .help("Ask the API server for the public URL to encode"),
        )
        .subcommand(Command::new("landing").about("Show the landing page"))
        .subcommand(
            Command::new("login")
                .about("Sign in")
                .arg(required_value("email", "Account email"))
                .arg(required_value("password", "Account password")),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and sign in")
                .arg(required_value("email", "Account email"))
                .arg(required_value("password", "Account password"))
                .arg(required_value("full-name", "Display name")),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(
            Command::new("profile")
                .about("Show or update your account")
                .arg(optional_value("full-name", "New display name"))
                .arg(optional_value("email", "New email address")),
        )
        .subcommand(Command::new("batches").about("List batches with their QR payloads"))
        .subcommand(
            Command::new("add")
                .about("Register a new batch")
                .arg(
                    Arg::new("product")
                        .long("product")
                        .takes_value(true)
                        .possible_values(["Chicken", "Beef", "Pork", "Seafood"])
                        .ignore_case(true)
                        .default_value("Chicken")
                        .help("Product type"),
                )
                .arg(required_value("batch-identifier", "Human-readable batch label"))
                .arg(required_value("butcher-date", "Butcher date, YYYY-MM-DD"))
                .arg(required_value("arrival-date", "Arrival date, YYYY-MM-DD")),
        )
        .subcommand(
            Command::new("report")
                .about("Show the freshness report for a batch")
                .arg(
                    Arg::new("batch")
                        .required(true)
                        .help("Batch id or a scanned report URL"),
                ),
        )
}

fn required_value(name: &'static str, help: &'static str) -> Arg<'static> {
    Arg::new(name)
        .long(name)
        .takes_value(true)
        .required(true)
        .help(help)
}

fn optional_value(name: &'static str, help: &'static str) -> Arg<'static> {
    Arg::new(name).long(name).takes_value(true).help(help)
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .value_of(name)
        .ok_or_else(|| anyhow!("missing --{}", name))
}

async fn build_tracker(matches: &ArgMatches) -> Result<FreshnessTracker> {
    let mut options = ClientOptions::from_env()?;
    if let Some(api_url) = matches.value_of("api-url") {
        options = options.with_api_url(api_url)?;
    }
    if let Some(public_url) = matches.value_of("public-url") {
        options = options.with_public_url(public_url)?;
    }

    let storage = Arc::new(FileTokenStorage::new(value(matches, "token-file")?));
    let tracker = FreshnessTracker::new(options, storage.clone());

    if !matches.is_present("discover") {
        return Ok(tracker);
    }
    let advertised = tracker
        .public_config()
        .await
        .context("could not discover the public URL")?;
    debug!("server advertises public URL {}", advertised.public_url);
    let options = advertised.apply_to(tracker.options.clone())?;
    Ok(FreshnessTracker::new(options, storage))
}

/// Run the guard for `route`, turning a redirect into an error
fn enter(tracker: &FreshnessTracker, route: &Route) -> Result<()> {
    match tracker.route_guard().evaluate(route) {
        GuardDecision::Allowed => Ok(()),
        GuardDecision::Redirected(Route::Login) => {
            bail!("{} requires signing in first: run `freshness login`", route)
        }
        GuardDecision::Redirected(other) => bail!("{} redirected to {}", route, other),
        GuardDecision::Pending => bail!("session is still being resolved"),
    }
}

fn report_id(arg: &str) -> String {
    let route = match Url::parse(arg) {
        Ok(url) => Route::from_url(&url),
        Err(_) => Route::parse(arg),
    };
    match route {
        Some(Route::BatchReport(id)) => id,
        _ => arg.to_string(),
    }
}

async fn list_batches(tracker: &FreshnessTracker, registry: &BatchRegistry) -> Result<()> {
    if registry.fetch_batches().await.is_err() {
        bail!(registry.error().unwrap_or_else(|| "Failed to fetch batches".to_string()));
    }
    let targets = registry.scan_targets()?;
    println!("{}", BatchListView(&targets));
    debug!("public URL {}", tracker.options.public_url);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let matches = cli().get_matches();
    let tracker = build_tracker(&matches).await?;
    tracker.start().await;
    let session = tracker.session();

    match matches.subcommand() {
        Some(("landing", _)) => {
            println!("{}", NavView(&nav_links(session)));
            println!();
            println!("{}", LandingView);
        }
        Some(("login", args)) => {
            if let Err(err) = session.login(value(args, "email")?, value(args, "password")?).await {
                bail!(session.error().unwrap_or_else(|| err.to_string()));
            }
            if let Some(user) = session.user() {
                println!("Welcome back, {}!", user.display_name());
            }
            println!("{}", NavView(&nav_links(session)));
        }
        Some(("register", args)) => {
            let result = session
                .register(
                    value(args, "email")?,
                    value(args, "password")?,
                    value(args, "full-name")?,
                )
                .await;
            if let Err(err) = result {
                bail!(session.error().unwrap_or_else(|| err.to_string()));
            }
            if let Some(user) = session.user() {
                println!("Welcome, {}!", user.display_name());
            }
            println!("{}", NavView(&nav_links(session)));
        }
        Some(("logout", _)) => {
            session.logout()?;
            println!("Signed out.");
        }
        Some(("profile", args)) => {
            enter(&tracker, &Route::Profile)?;
            let mut update = UserUpdate::default();
            if let Some(full_name) = args.value_of("full-name") {
                update = update.with_full_name(full_name);
            }
            if let Some(email) = args.value_of("email") {
                update = update.with_email(email);
            }
            if !update.is_empty() {
                if session.update_profile(&update).await.is_err() {
                    bail!(session.error().unwrap_or_else(|| "Update failed".to_string()));
                }
                println!("Profile updated successfully!");
            }
            let user = session.user().ok_or_else(|| anyhow!("not signed in"))?;
            println!("{}", ProfileView(&user));
        }
        Some(("batches", _)) => {
            enter(&tracker, &Route::Admin)?;
            let registry = tracker.batch_registry();
            list_batches(&tracker, &registry).await?;
        }
        Some(("add", args)) => {
            enter(&tracker, &Route::Admin)?;
            let form = BatchForm {
                product: value(args, "product")?.parse()?,
                batch_identifier: value(args, "batch-identifier")?.to_string(),
                butcher_date: value(args, "butcher-date")?.to_string(),
                arrival_date: value(args, "arrival-date")?.to_string(),
            };
            let new_batch = form.to_new_batch()?;

            let registry = tracker.batch_registry();
            match registry.create_batch(&new_batch).await {
                Ok(created) => println!("Added batch #{} ({})", created.id, created.batch_identifier),
                Err(err) => bail!(registry.error().unwrap_or_else(|| err.to_string())),
            }
            if let Some(message) = registry.error() {
                eprintln!("warning: {}", message);
            }
            println!();
            println!("{}", BatchListView(&registry.scan_targets()?));
        }
        Some(("report", args)) => {
            let id = report_id(value(args, "batch")?);
            let resolver = tracker.freshness_resolver();
            let result = resolver.fetch_batch(&id).await;
            let view = ReportView(&resolver.state()).to_string();
            if result.is_err() {
                bail!(view);
            }
            println!("{}", view);
        }
        Some((other, _)) => bail!("unknown command {}", other),
        None => bail!("no command given"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_id_accepts_urls_paths_and_ids() {
        assert_eq!(report_id("http://192.168.1.20:3000/batch/12"), "12");
        assert_eq!(report_id("/batch/7"), "7");
        assert_eq!(report_id("31"), "31");
    }

    #[test]
    fn cli_requires_batch_fields() {
        let result = cli().try_get_matches_from(["freshness", "add", "--batch-identifier", "B-1"]);
        assert!(result.is_err());

        let matches = cli()
            .try_get_matches_from([
                "freshness",
                "add",
                "--product",
                "beef",
                "--batch-identifier",
                "B-100",
                "--butcher-date",
                "2024-01-01",
                "--arrival-date",
                "2024-01-03",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.value_of("product"), Some("beef"));
        assert_eq!(matches.value_of("token-file"), Some(DEFAULT_TOKEN_FILE));
    }
}
