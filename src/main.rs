//! Purpose: `soapwire` CLI entry point: build envelopes, decode saved responses, make calls.
//! Role: Binary crate root; parses args, runs one command, emits JSON (or XML) on stdout.
//! Invariants: Errors go to stderr as JSON when stderr is not a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Environment defaults are resolved here once, then injected into the client.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

use soapwire::api::{
    ClientConfig, Credentials, DecodedValue, ENV_ENDPOINT, ENV_TOKEN, ENV_USER, EncodableValue,
    Error, ErrorKind, MapEncodingPolicy, ResponseBody, SoapClient, credentials_from_lookup,
    parse_method_list, parse_response, to_exit_code, unwrap_response,
};
use soapwire::core::envelope::build_envelope;

#[derive(Parser)]
#[command(
    name = "soapwire",
    version,
    about = "Talk to an AXIS/xml-soap bulk-email RPC endpoint",
    long_about = None,
    after_help = r#"EXAMPLES
  $ soapwire envelope sendBatch --args '[{"to":"a@x.com","subject":"Hi"}]'
  $ soapwire call sendBatch --args '[{"to":"a@x.com","subject":"Hi"}]'
  $ soapwire decode saved-response.xml
  $ soapwire decode --raw < saved-response.xml

ENVIRONMENT
  SOAPWIRE_ENDPOINT     endpoint URL for `call`
  SOAPWIRE_USER         account identifier
  SOAPWIRE_TOKEN        account token
  SOAPWIRE_MAP_METHODS  comma-separated methods whose record arrays use ns2:Map items
  SOAPWIRE_DEBUG_DIR    directory for request/response debug artifacts
  RUST_LOG              log filter for stderr diagnostics (default: warn)"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, global = true, help = "Pretty-print JSON output")]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Print the request envelope for a method call without sending it"
    )]
    Envelope {
        #[arg(help = "Remote method name")]
        method: String,
        #[command(flatten)]
        call: CallArgs,
    },
    #[command(about = "Decode a saved SOAP response (file or stdin)")]
    Decode {
        #[arg(help = "Response file (default: stdin)", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        #[arg(long, help = "Print the decoded body without error classification")]
        raw: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Call a remote method and print the business payload"
    )]
    Call {
        #[arg(help = "Remote method name")]
        method: String,
        #[command(flatten)]
        call: CallArgs,
        #[arg(long, help = "Endpoint URL (overrides SOAPWIRE_ENDPOINT)")]
        endpoint: Option<String>,
        #[arg(
            long,
            help = "Directory for request/response debug artifacts",
            value_hint = ValueHint::DirPath
        )]
        debug_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CallArgs {
    #[arg(long, default_value = "[]", help = "Arguments as a JSON array")]
    args: String,
    #[arg(long, help = "Account identifier (overrides SOAPWIRE_USER)")]
    user: Option<String>,
    #[arg(long, help = "Account token (overrides SOAPWIRE_TOKEN)")]
    token: Option<String>,
    #[arg(
        long = "map-method",
        help = "Method whose record arrays use ns2:Map items (repeatable)"
    )]
    map_methods: Vec<String>,
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(());
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `soapwire --help`."));
            }
        },
    };

    match cli.command {
        Command::Envelope { method, call } => {
            let args = parse_args(&call.args)?;
            let credentials = resolve_credentials(&call).ok_or_else(|| {
                Error::new(ErrorKind::Precondition)
                    .with_message("missing credentials")
                    .with_method(method.clone())
                    .with_hint("Pass --user and --token, or set SOAPWIRE_USER and SOAPWIRE_TOKEN.")
            })?;
            let policy = resolve_policy(&call);
            println!("{}", build_envelope(&method, &args, &credentials, &policy));
            Ok(())
        }
        Command::Decode { file, raw } => {
            let text = read_input(file.as_ref())?;
            let value = if raw {
                match parse_response(&text)? {
                    ResponseBody::Empty => DecodedValue::Null,
                    ResponseBody::Decoded(value) => value,
                }
            } else {
                unwrap_response(&text)?
            };
            emit_json(&value.to_json(), cli.pretty)
        }
        Command::Call {
            method,
            call,
            endpoint,
            debug_dir,
        } => {
            let args = parse_args(&call.args)?;
            let mut config = ClientConfig::from_lookup(|name| {
                if name == ENV_ENDPOINT && endpoint.is_some() {
                    return endpoint.clone();
                }
                std::env::var(name).ok()
            })?;
            config.credentials = resolve_credentials(&call);
            config.map_methods = resolve_policy(&call);
            if let Some(dir) = debug_dir {
                config.debug_dir = Some(dir);
            }
            tracing::debug!(method = %method, endpoint = %config.endpoint, "calling remote method");
            let value = SoapClient::new(config).call(&method, &args)?;
            emit_json(&value.to_json(), cli.pretty)
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .try_init();
}

fn parse_args(raw: &str) -> Result<Vec<EncodableValue>, Error> {
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("--args is not valid json")
            .with_source(err)
    })?;
    let Value::Array(items) = value else {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--args must be a JSON array")
            .with_hint("Wrap a single argument in brackets, e.g. --args '[42]'."));
    };
    items.iter().map(EncodableValue::from_json).collect()
}

fn resolve_credentials(call: &CallArgs) -> Option<Credentials> {
    credentials_from_lookup(|name| {
        let flag = match name {
            ENV_USER => call.user.clone(),
            ENV_TOKEN => call.token.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(name).ok())
    })
}

fn resolve_policy(call: &CallArgs) -> MapEncodingPolicy {
    if !call.map_methods.is_empty() {
        return call.map_methods.iter().collect();
    }
    std::env::var(soapwire::api::ENV_MAP_METHODS)
        .map(|raw| parse_method_list(&raw))
        .unwrap_or_default()
}

fn read_input(file: Option<&PathBuf>) -> Result<String, Error> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read {}", path.display()))
                .with_source(err)
        }),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(text)
        }
    }
}

fn emit_json(value: &Value, pretty: bool) -> Result<(), Error> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("json encode failed")
            .with_source(err)
    })?;
    println!("{rendered}");
    Ok(())
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Precondition => "precondition failed".to_string(),
        ErrorKind::Transport => "transport failure".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Parse => "unparseable response".to_string(),
        ErrorKind::MalformedPayload => "malformed payload".to_string(),
        ErrorKind::Remote => "remote reported an error".to_string(),
        ErrorKind::UnexpectedShape => "unexpected value shape".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(method) = err.method() {
        inner.insert("method".to_string(), json!(method));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(preview) = err.preview() {
        inner.insert("preview".to_string(), json!(preview));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(method) = err.method() {
        lines.push(format!("method: {method}"));
    }
    if let Some(status) = err.status() {
        lines.push(format!("status: {status}"));
    }
    if let Some(preview) = err.preview() {
        lines.push(format!("preview: {preview}"));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
