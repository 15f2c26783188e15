// Main CLI entry point for apihunter
// Uses clap for argument parsing

use apihunter::{Cancellation, Config, Scanner};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("apihunter")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Jake Abendroth")
        .about("API endpoint discovery for security testing")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("scan")
                .about("Discover, normalize and classify the API endpoints of a target")
                .after_help("EXAMPLES:\n  apihunter scan -u https://example.com\n  apihunter scan -u https://example.com --passive-only -f urls,report\n  apihunter scan -u https://app.example.com --login-url https://app.example.com/login -U alice -P secret --csrf")
                .arg(Arg::new("url")
                    .short('u')
                    .long("url")
                    .required(true)
                    .num_args(1)
                    .help("Target base URL"))
                // Authentication
                .arg(Arg::new("cookie")
                    .short('c')
                    .long("cookie")
                    .num_args(1)
                    .help("Cookie header value sent with every request"))
                .arg(Arg::new("header")
                    .short('H')
                    .long("header")
                    .action(ArgAction::Append)
                    .num_args(1)
                    .help("Extra header 'Name: value' (repeatable)"))
                .arg(Arg::new("auth_bearer")
                    .long("auth-bearer")
                    .num_args(1)
                    .help("Bearer token sent as Authorization header"))
                .arg(Arg::new("login_url")
                    .long("login-url")
                    .num_args(1)
                    .help("Login endpoint for auto-login"))
                .arg(Arg::new("username")
                    .short('U')
                    .long("username")
                    .num_args(1)
                    .help("Auto-login username"))
                .arg(Arg::new("password")
                    .short('P')
                    .long("password")
                    .num_args(1)
                    .help("Auto-login password"))
                .arg(Arg::new("auth_type")
                    .long("auth-type")
                    .num_args(1)
                    .default_value("form")
                    .help("Auto-login type: form, json or basic"))
                .arg(Arg::new("username_field")
                    .long("username-field")
                    .num_args(1)
                    .default_value("username")
                    .help("Login field carrying the username"))
                .arg(Arg::new("password_field")
                    .long("password-field")
                    .num_args(1)
                    .default_value("password")
                    .help("Login field carrying the password"))
                .arg(Arg::new("csrf")
                    .long("csrf")
                    .action(ArgAction::SetTrue)
                    .help("Fetch a CSRF token from the login page first"))
                // Module selection
                .arg(Arg::new("passive_only")
                    .long("passive-only")
                    .action(ArgAction::SetTrue)
                    .help("Only query third-party archives, never the target"))
                .arg(Arg::new("active_only")
                    .long("active-only")
                    .action(ArgAction::SetTrue)
                    .help("Only probe the target itself"))
                .arg(Arg::new("no_wayback")
                    .long("no-wayback")
                    .action(ArgAction::SetTrue)
                    .help("Disable the web archive source"))
                .arg(Arg::new("no_commoncrawl")
                    .long("no-commoncrawl")
                    .action(ArgAction::SetTrue)
                    .help("Disable the Common Crawl source"))
                .arg(Arg::new("no_sitemap")
                    .long("no-sitemap")
                    .action(ArgAction::SetTrue)
                    .help("Disable robots.txt/sitemap probing"))
                .arg(Arg::new("no_crawler")
                    .long("no-crawler")
                    .action(ArgAction::SetTrue)
                    .help("Disable the link crawler"))
                .arg(Arg::new("no_scripts")
                    .long("no-scripts")
                    .action(ArgAction::SetTrue)
                    .help("Disable client-side script analysis"))
                .arg(Arg::new("crawl_depth")
                    .long("crawl-depth")
                    .num_args(1)
                    .value_parser(clap::value_parser!(usize))
                    .default_value("3")
                    .help("Maximum crawler link depth"))
                // Throughput
                .arg(Arg::new("rate")
                    .short('r')
                    .long("rate")
                    .num_args(1)
                    .value_parser(clap::value_parser!(u32))
                    .default_value("10")
                    .help("Requests per second"))
                .arg(Arg::new("threads")
                    .short('t')
                    .long("threads")
                    .num_args(1)
                    .value_parser(clap::value_parser!(usize))
                    .default_value("5")
                    .help("Connections kept per host"))
                .arg(Arg::new("delay")
                    .long("delay")
                    .num_args(1)
                    .value_parser(clap::value_parser!(u64))
                    .default_value("0")
                    .help("Extra delay after each request slot, in milliseconds"))
                .arg(Arg::new("adaptive")
                    .long("adaptive")
                    .action(ArgAction::SetTrue)
                    .help("Slow down automatically on 429/403/503 responses"))
                .arg(Arg::new("timeout")
                    .long("timeout")
                    .num_args(1)
                    .value_parser(clap::value_parser!(u64))
                    .default_value("30")
                    .help("Request timeout in seconds"))
                // Output
                .arg(Arg::new("output")
                    .short('o')
                    .long("output")
                    .num_args(1)
                    .default_value("./apihunter_output")
                    .help("Output directory"))
                .arg(Arg::new("format")
                    .short('f')
                    .long("format")
                    .num_args(1)
                    .default_value("openapi,postman,urls,report")
                    .help("Comma-separated output formats: openapi, postman, urls, report"))
                .arg(Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::SetTrue)
                    .help("Debug logging"))
                .arg(Arg::new("quiet")
                    .short('q')
                    .long("quiet")
                    .action(ArgAction::SetTrue)
                    .help("No progress output")),
        )
}

fn string_arg(m: &ArgMatches, id: &str) -> String {
    m.get_one::<String>(id).cloned().unwrap_or_default()
}

fn config_from_matches(m: &ArgMatches) -> Config {
    let mut config = Config {
        target: string_arg(m, "url"),
        output_dir: string_arg(m, "output"),
        formats: string_arg(m, "format")
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        verbose: m.get_flag("verbose"),
        quiet: m.get_flag("quiet"),
        ..Default::default()
    };
    if let Some(depth) = m.get_one::<usize>("crawl_depth") {
        config.crawl_depth = *depth;
    }
    if let Some(secs) = m.get_one::<u64>("timeout") {
        config.timeout = Duration::from_secs(*secs);
    }

    let auth = &mut config.auth;
    auth.cookies = string_arg(m, "cookie");
    auth.headers = m
        .get_many::<String>("header")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    auth.bearer_token = string_arg(m, "auth_bearer");
    auth.login_url = string_arg(m, "login_url");
    auth.username = string_arg(m, "username");
    auth.password = string_arg(m, "password");
    auth.auth_type = string_arg(m, "auth_type");
    auth.username_field = string_arg(m, "username_field");
    auth.password_field = string_arg(m, "password_field");
    auth.fetch_csrf = m.get_flag("csrf");

    let rate = &mut config.rate_limit;
    if let Some(r) = m.get_one::<u32>("rate") {
        rate.requests_per_second = *r;
    }
    if let Some(t) = m.get_one::<usize>("threads") {
        rate.threads = *t;
    }
    if let Some(ms) = m.get_one::<u64>("delay") {
        rate.delay = Duration::from_millis(*ms);
    }
    rate.adaptive = m.get_flag("adaptive");

    let modules = &mut config.modules;
    modules.passive_only = m.get_flag("passive_only");
    modules.active_only = m.get_flag("active_only");
    modules.wayback = !m.get_flag("no_wayback");
    modules.commoncrawl = !m.get_flag("no_commoncrawl");
    modules.sitemap = !m.get_flag("no_sitemap");
    modules.crawler = !m.get_flag("no_crawler");
    modules.scripts = !m.get_flag("no_scripts");

    config
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let Some(("scan", scan)) = matches.subcommand() else {
        eprintln!("Unknown command. Run 'apihunter --help' for usage.");
        std::process::exit(2);
    };

    let config = config_from_matches(scan);
    init_logging(config.verbose);

    let scanner = Scanner::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let cancel = Cancellation::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, finishing with the results collected so far...");
            on_signal.cancel();
        }
    });

    if let Err(e) = scanner.run(&cancel).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
