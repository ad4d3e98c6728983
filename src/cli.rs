// Command-line front end for the action-stream codec.
//
// Reads JSON action manifests, writes encoded streams (hex or raw bytes),
// and decodes streams back into JSON for inspection.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use alloy_primitives::Address;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use num_bigint::{BigInt, BigUint, Sign};
use serde::Deserialize;
use serde_json::Value;

use crate::action::Action;
use crate::calldata;
use crate::codec::stream::{DEFAULT_MAX_EXPONENT, DEFAULT_MAX_VLQ_LEN};
use crate::codec::{
    AddressRegistry, DecodeOptions, EncodeOptions, EncodedStream, NoResolution,
    RegistryResolution, StreamDecoder, StreamEncoder,
};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Action-stream compression for batched wallet calls.
#[derive(Parser, Debug)]
#[command(
    name = "actpack",
    version,
    about = "Action-stream encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Encode a JSON action manifest into a stream.
    Encode(EncodeArgs),
    /// Decode a stream into a JSON action list.
    Decode(DecodeArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Registry snapshot: JSON array of addresses in registration order.
    #[arg(long, value_hint = ValueHint::FilePath)]
    registry: Option<PathBuf>,

    /// Stream is wrapped as `decompressAndPerform(bytes)` calldata.
    #[arg(long)]
    calldata: bool,

    /// Stream is raw bytes rather than hex text.
    #[arg(long)]
    binary: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Send destinations found in the registry snapshot as references.
    #[arg(long)]
    resolve: bool,

    /// Fail instead of falling back when a reference cannot be confirmed.
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Write the registry after decoding to this file.
    #[arg(long = "registry-out", value_hint = ValueHint::FilePath)]
    registry_out: Option<PathBuf>,

    #[command(flatten)]
    limits: LimitArgs,
}

/// Limits shared by both directions, so a stream encoded under some limits
/// decodes under the same ones.
#[derive(Args, Debug)]
struct LimitArgs {
    /// Longest VLQ allowed in any field.
    #[arg(long = "max-vlq-len", default_value_t = DEFAULT_MAX_VLQ_LEN)]
    max_vlq_len: usize,

    /// Largest pseudo-float exponent allowed.
    #[arg(long = "max-exponent", default_value_t = DEFAULT_MAX_EXPONENT)]
    max_exponent: usize,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run() -> ! {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let globals = Globals {
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose,
        json_output: cli.json_output,
    };

    let exit_code = match cli.command {
        Cmd::Encode(args) => cmd_encode(&globals, &args),
        Cmd::Decode(args) => cmd_decode(&globals, &args),
        Cmd::Config => cmd_config(),
    };

    process::exit(exit_code);
}

struct Globals {
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("actpack version {version} (Rust)");
    eprintln!("ENTRY_POINT={}", calldata::DECOMPRESS_AND_PERFORM);
    eprintln!("SELECTOR=0x{}", hex::encode(calldata::selector()));
    eprintln!("DEFAULT_MAX_VLQ_LEN={DEFAULT_MAX_VLQ_LEN}");
    eprintln!("DEFAULT_MAX_EXPONENT={DEFAULT_MAX_EXPONENT}");
    eprintln!("sizeof(usize)={}", std::mem::size_of::<usize>());
    0
}

// ---------------------------------------------------------------------------
// Encode command
// ---------------------------------------------------------------------------

fn cmd_encode(g: &Globals, args: &EncodeArgs) -> i32 {
    let manifest = match read_input(args.io.input.as_ref().or(args.io.input_pos.as_ref())) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("actpack: input: {e}");
            return 1;
        }
    };
    let actions = match std::str::from_utf8(&manifest)
        .map_err(|e| e.to_string())
        .and_then(parse_manifest)
    {
        Ok(actions) => actions,
        Err(e) => {
            eprintln!("actpack: manifest: {e}");
            return 1;
        }
    };
    let snapshot = match load_registry(args.io.registry.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("actpack: registry: {e}");
            return 1;
        }
    };

    let options = EncodeOptions {
        strict_references: args.strict,
        max_vlq_len: args.limits.max_vlq_len,
        max_exponent: args.limits.max_exponent,
    };
    let result = if args.resolve {
        StreamEncoder::with_resolver(RegistryResolution)
            .with_options(options)
            .encode(&actions, snapshot)
    } else {
        StreamEncoder::with_resolver(NoResolution)
            .with_options(options)
            .encode(&actions, snapshot)
    };
    let EncodedStream { bytes, stats } = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("actpack: encode error ({}): {e}", e.kind());
            return 1;
        }
    };

    let payload = if args.io.calldata {
        calldata::wrap(&bytes)
    } else {
        bytes
    };
    let output = args.io.output.as_ref().or(args.io.output_pos.as_ref());
    if let Err(e) = write_output(g, output, &payload, args.io.binary) {
        eprintln!("actpack: output: {e}");
        return 1;
    }

    if g.verbose > 0 && !g.quiet {
        eprintln!(
            "actpack: encoder: actions: {}, references: {}, fallbacks: {}, \
             stream size: {}, plain size: {}",
            stats.actions, stats.references, stats.fallbacks, stats.encoded_len, stats.plain_len
        );
    }

    if g.json_output {
        let json = serde_json::json!({
            "command": "encode",
            "actions": stats.actions,
            "references": stats.references,
            "raw_addresses": stats.raw_addresses,
            "fallbacks": stats.fallbacks,
            "stream_size": stats.encoded_len,
            "plain_size": stats.plain_len,
            "ratio": stats.ratio(),
            "output_size": payload.len(),
        });
        eprintln!("{json:#}");
    }

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn cmd_decode(g: &Globals, args: &DecodeArgs) -> i32 {
    let raw = match read_input(args.io.input.as_ref().or(args.io.input_pos.as_ref())) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("actpack: input: {e}");
            return 1;
        }
    };
    let input = if args.io.binary {
        raw
    } else {
        match decode_hex_text(&raw) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("actpack: input: {e}");
                return 1;
            }
        }
    };
    let stream = if args.io.calldata {
        match calldata::unwrap(&input) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("actpack: calldata: {e}");
                return 1;
            }
        }
    } else {
        input
    };

    let mut registry = match load_registry(args.io.registry.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("actpack: registry: {e}");
            return 1;
        }
    };
    let initial_registry_len = registry.len();

    let decoder = StreamDecoder::with_options(DecodeOptions {
        max_vlq_len: args.limits.max_vlq_len,
        max_exponent: args.limits.max_exponent,
    });
    let actions = match decoder.decode(&stream, &mut registry) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("actpack: decode error ({}): {e}", e.kind());
            return 1;
        }
    };

    let rendered = Value::Array(actions.iter().map(action_to_json).collect());
    let mut text = format!("{rendered:#}");
    text.push('\n');
    let output = args.io.output.as_ref().or(args.io.output_pos.as_ref());
    if let Err(e) = write_output(g, output, text.as_bytes(), true) {
        eprintln!("actpack: output: {e}");
        return 1;
    }

    if let Some(path) = &args.registry_out {
        let entries: Vec<Value> = registry
            .entries()
            .iter()
            .map(|a| Value::String(a.to_checksum(None)))
            .collect();
        let mut text = format!("{:#}", Value::Array(entries));
        text.push('\n');
        if let Err(e) = write_output(g, Some(path), text.as_bytes(), true) {
            eprintln!("actpack: registry-out: {e}");
            return 1;
        }
    }

    let registered = registry.len() - initial_registry_len;
    if g.verbose > 0 && !g.quiet {
        eprintln!(
            "actpack: decoder: actions: {}, stream size: {}, new registry entries: {registered}",
            actions.len(),
            stream.len()
        );
    }
    if g.json_output {
        let json = serde_json::json!({
            "command": "decode",
            "actions": actions.len(),
            "stream_size": stream.len(),
            "registered": registered,
            "registry_size": registry.len(),
        });
        eprintln!("{json:#}");
    }

    0
}

// ---------------------------------------------------------------------------
// Manifest parsing
// ---------------------------------------------------------------------------

/// One entry of an action manifest. `value` defaults to zero and `data`
/// to empty.
#[derive(Debug, Deserialize)]
struct ManifestRow {
    to: String,
    #[serde(default)]
    value: Option<ManifestValue>,
    #[serde(default)]
    data: Option<String>,
}

/// A JSON integer, or a decimal or `0x` hex string for wide values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestValue {
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

/// Parse `[{ "to": "0x..", "value": .., "data": "0x.." }, ..]`.
fn parse_manifest(text: &str) -> Result<Vec<Action>, String> {
    let rows: Vec<ManifestRow> = serde_json::from_str(text).map_err(|e| e.to_string())?;
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| parse_action(row).map_err(|e| format!("action {i}: {e}")))
        .collect()
}

fn parse_action(row: ManifestRow) -> Result<Action, String> {
    let to = parse_address(&row.to)?;
    let value = match row.value {
        None => BigInt::default(),
        Some(ManifestValue::Signed(n)) => BigInt::from(n),
        Some(ManifestValue::Unsigned(n)) => BigInt::from(n),
        Some(ManifestValue::Text(s)) => parse_integer(&s)?,
    };
    let data = match row.data {
        None => Vec::new(),
        Some(s) => decode_hex_str(&s)?,
    };
    Action::try_from_signed(to, value, data).map_err(|e| e.to_string())
}

fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s.trim()).map_err(|e| format!("address {s:?}: {e}"))
}

/// Decimal or `0x`-prefixed hex, optionally negative.
fn parse_integer(s: &str) -> Result<BigInt, String> {
    let t = s.trim();
    let (sign, digits) = match t.strip_prefix('-') {
        Some(rest) => (Sign::Minus, rest),
        None => (Sign::Plus, t),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
        None => BigUint::parse_bytes(digits.as_bytes(), 10),
    }
    .ok_or_else(|| format!("invalid integer {s:?}"))?;
    Ok(BigInt::from_biguint(sign, magnitude))
}

fn decode_hex_str(s: &str) -> Result<Vec<u8>, String> {
    let t = s.trim();
    let t = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t);
    hex::decode(t).map_err(|e| format!("hex {s:?}: {e}"))
}

fn decode_hex_text(raw: &[u8]) -> Result<Vec<u8>, String> {
    let text = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
    let compact: String = text.split_whitespace().collect();
    decode_hex_str(&compact)
}

fn action_to_json(action: &Action) -> Value {
    serde_json::json!({
        "to": action.to.to_checksum(None),
        "value": action.value.to_string(),
        "data": format!("0x{}", hex::encode(&action.data)),
    })
}

fn load_registry(path: Option<&Path>) -> Result<AddressRegistry, String> {
    let Some(path) = path else {
        return Ok(AddressRegistry::new());
    };
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let root: Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    let items = root
        .as_array()
        .ok_or_else(|| "expected a JSON array of addresses".to_string())?;
    let mut registry = AddressRegistry::new();
    for (i, item) in items.iter().enumerate() {
        let s = item
            .as_str()
            .ok_or_else(|| format!("entry {i} is not a string"))?;
        let address = parse_address(s)?;
        if registry.register(address) != i {
            return Err(format!("entry {i} repeats an earlier address"));
        }
    }
    Ok(registry)
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_input(path: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match path {
        Some(p) => {
            File::open(p)
                .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", p.display())))?
                .read_to_end(&mut buf)?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut buf)?;
        }
    }
    Ok(buf)
}

/// Write `payload` as-is when `raw`, otherwise as a hex line.
fn write_output(g: &Globals, path: Option<&PathBuf>, payload: &[u8], raw: bool) -> io::Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(p) => {
            if p.exists() && !g.force {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("output file exists, use -f to overwrite: {}", p.display()),
                ));
            }
            Box::new(BufWriter::new(File::create(p)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    if raw {
        writer.write_all(payload)?;
    } else {
        writeln!(writer, "0x{}", hex::encode(payload))?;
    }
    writer.flush()
}
