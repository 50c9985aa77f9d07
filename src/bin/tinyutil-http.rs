//! tinyutil-http - command-line front end for `tinyutil::httputil`
//!
//! Programs run by the harness call this binary to perform requests and
//! print what they received:
//! - `get URL` prints the response body
//! - `post URL --content-type TYPE --body BODY` prints the response body
//! - `post-form URL key=value...` prints the response body
//! - `head URL [--header NAME]` prints a header value, or the status code

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tinyutil::config::{self, TinyutilConfig};
use tinyutil::httputil::{Client, FormValues, Response};
use tinyutil::logging::{init_logging, LogLevel};

/// tinyutil-http application
#[derive(Parser)]
#[command(name = "tinyutil-http")]
#[command(about = "Issue one HTTP request and print the result", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TINYUTIL_CONFIG")]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Print status, headers and body as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Exit non-zero when the status is not 2xx
    #[arg(long, global = true)]
    fail: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// GET a URL
    Get {
        /// Target URL
        url: String,
    },

    /// POST a body
    Post {
        /// Target URL
        url: String,
        /// Content-Type of the body
        #[arg(long, default_value = "text/plain")]
        content_type: String,
        /// Request body
        #[arg(long, default_value = "")]
        body: String,
    },

    /// POST url-encoded form fields
    PostForm {
        /// Target URL
        url: String,
        /// Fields as key=value
        #[arg(value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// HEAD a URL
    Head {
        /// Target URL
        url: String,
        /// Print this response header instead of the status code
        #[arg(long)]
        header: Option<String>,
    },
}

#[derive(Serialize)]
struct JsonResponse {
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
}

impl From<&Response> for JsonResponse {
    fn from(response: &Response) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        Self {
            status: response.status,
            headers,
            body: response.text(),
        }
    }
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TinyutilConfig> {
    let config = match path {
        Some(path) => config::from_path(path)?,
        None => config::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("tinyutil-http: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(cli.config.as_ref()).context("loading configuration")?;

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging = logging.with_level(LogLevel::Debug);
    }
    if let Err(e) = init_logging(&logging) {
        eprintln!("tinyutil-http: {e}");
    }

    let mut client_config = config
        .http
        .to_client_config()
        .context("applying [http] configuration")?;
    if let Some(secs) = cli.timeout_secs {
        client_config.timeout = Some(Duration::from_secs(secs));
    }
    let client = Client::new(&client_config).context("building HTTP client")?;

    let (response, header) = match &cli.command {
        Commands::Get { url } => (
            client.get(url).await.with_context(|| format!("GET {url}"))?,
            None,
        ),
        Commands::Post {
            url,
            content_type,
            body,
        } => (
            client
                .post(url, content_type, body.as_bytes())
                .await
                .with_context(|| format!("POST {url}"))?,
            None,
        ),
        Commands::PostForm { url, fields } => {
            let form: FormValues = fields.iter().cloned().collect();
            (
                client
                    .post_form(url, &form)
                    .await
                    .with_context(|| format!("POST form {url}"))?,
                None,
            )
        }
        Commands::Head { url, header } => (
            client.head(url).await.with_context(|| format!("HEAD {url}"))?,
            header.as_deref(),
        ),
    };

    print_response(cli, &response, header).context("writing response to stdout")?;

    if cli.fail && !response.is_success() {
        bail!("server returned status {}", response.status);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_response(cli: &Cli, response: &Response, header: Option<&str>) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();

    if cli.json {
        let json = serde_json::to_string(&JsonResponse::from(response))?;
        writeln!(stdout, "{json}")?;
        return Ok(());
    }

    match (&cli.command, header) {
        (Commands::Head { .. }, Some(name)) => {
            let value = response
                .header(name)
                .ok_or_else(|| anyhow!("response has no '{name}' header"))?;
            writeln!(stdout, "{value}")?;
        }
        (Commands::Head { .. }, None) => writeln!(stdout, "{}", response.status)?,
        _ => {
            stdout.write_all(&response.body)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("tinyutil-http").chain(args.iter().copied()))
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(parse(&["--timeout-secs", "0", "get", "http://127.0.0.1/"]).is_err());
    }

    #[test]
    fn positive_timeout_is_accepted() {
        let cli = parse(&["get", "http://127.0.0.1/", "--timeout-secs", "3"]).unwrap();
        assert_eq!(cli.timeout_secs, Some(3));
    }

    #[test]
    fn form_fields_parse_as_pairs() {
        let cli = parse(&["post-form", "http://127.0.0.1/", "foo=quux", "bar=baz"]).unwrap();
        match cli.command {
            Commands::PostForm { fields, .. } => assert_eq!(
                fields,
                vec![
                    ("foo".to_string(), "quux".to_string()),
                    ("bar".to_string(), "baz".to_string())
                ]
            ),
            _ => panic!("expected post-form"),
        }
        assert!(parse(&["post-form", "http://127.0.0.1/", "novalue"]).is_err());
    }

    #[tokio::test]
    async fn request_errors_keep_their_context() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("tinyutil.toml");
        std::fs::write(&config_path, "[logging]\nenabled = false\n").unwrap();
        let config_arg = config_path.to_string_lossy().into_owned();
        let cli = parse(&["--config", &config_arg, "get", "ftp://127.0.0.1/"]).unwrap();

        let error = run(&cli).await.unwrap_err();

        let message = format!("{error:#}");
        assert!(message.starts_with("GET ftp://127.0.0.1/"));
        assert!(message.contains("unsupported URL scheme: ftp"));
        assert!(error.downcast_ref::<tinyutil::httputil::HttpError>().is_some());
    }

    #[tokio::test]
    async fn unreadable_config_is_reported_with_context() {
        let cli = parse(&["--config", "/nonexistent/tinyutil.toml", "get", "http://127.0.0.1/"])
            .unwrap();

        let error = run(&cli).await.unwrap_err();

        assert!(format!("{error:#}").starts_with("loading configuration"));
        assert!(error.downcast_ref::<tinyutil::config::ConfigError>().is_some());
    }
}
