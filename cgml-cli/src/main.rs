// Command-line interface for cgml
//
// This binary provides commands for converting, inspecting and checking Cyberiada-GraphML files.
//
// The inspect command is a development aid: it shows what the reader and the importer make of a file,
// stage by stage. The check command is the one to run in CI over a folder of state machines.
//
// The core capabilities use the cgml-babel crate. This crate is only an interface to it: argument
// parsing, configuration, logging and file IO live here, never in the library.
//
// Converting:
//
// The conversion needs a to and from pair. The from can be auto-detected from the file extension, while being overwrittable by an explicit --from flag.
// Usage:
//  cgml <input> --to <format> [--from <format>] [--output <file>]  - Convert between formats (default)
//  cgml convert <input> --to <format> [--from <format>] [--output <file>]  - Same as above (explicit)
//  cgml inspect <path> [<transform>]      - Execute a transform (defaults to "model-treeviz")
//  cgml check <path> [--strict]           - Import, export and re-import, report whether anything changed
//  cgml --list-transforms                 - List available transforms
//
// Extra Parameters:
//
// Format-specific parameters can be passed using --extra-<parameter-name> <value>.
// The CLI layer strips the "extra-" prefix and passes the parameters to the format/transform.
// A few of them override configuration instead: strict-keys, mode and indent.
// Example:
//  cgml inspect blinker.graphml --extra-actions
//  cgml blinker.graphml --to cgml --extra-indent 4

use cgml_cli::transforms;

use cgml_babel::formats::cgml::CgmlFormat;
use cgml_babel::{
    parse_with_options, serialize_with_options, CgmlError, Document, Format, FormatRegistry,
    ImportOptions, Mode,
};
use cgml_config::{CgmlConfig, Loader};
use clap::{Arg, ArgAction, Command, ValueHint};
use std::collections::HashMap;
use std::fs;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = if let Some(key) = arg.strip_prefix("--extra-") {
            Some(key)
        } else {
            arg.strip_prefix("--extras-")
        };

        if let Some(key) = key_opt {
            // Check if the next arg is a value or another flag/end
            let has_value = args
                .get(i + 1)
                .map(|next| !next.starts_with('-'))
                .unwrap_or(false);

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("cgml")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for converting and checking Cyberiada-GraphML state machines")
        .long_about(
            "cgml is a command-line tool for working with Cyberiada-GraphML (CGML) files.\n\n\
            Commands:\n  \
            - convert: Transform between document formats (cgml, json, treeviz)\n  \
            - inspect: View internal representations (attributed tree, model)\n  \
            - check:   Verify that a file survives import and export unchanged\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to pass format-specific options.\n  \
            Boolean flags can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            cgml inspect blinker.graphml                 # View model tree visualization\n  \
            cgml inspect blinker.graphml tree-json       # View the raw GraphML tree\n  \
            cgml blinker.graphml --to json               # Convert to JSON (outputs to stdout)\n  \
            cgml blinker.graphml --to cgml -o out.graphml  # Rewrite in canonical form\n  \
            cgml check blinker.graphml --strict          # Round-trip check with declared keys only",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-transforms")
                .long("list-transforms")
                .help("List available transforms")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a cgml.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log import and export details to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect internal representations of CGML files")
                .long_about(
                    "View a CGML file at different processing stages.\n\n\
                    Transforms (stage-format):\n  \
                    - tree-json:       Attributed GraphML tree as JSON\n  \
                    - model-json:      Document model as JSON, structured actions\n  \
                    - model-text-json: Document model as JSON, raw action text\n  \
                    - model-treeviz:   Document model as tree visualization (default)\n\n\
                    Extra Parameters:\n  \
                    --extra-actions    List the action records below states and transitions\n\n\
                    Examples:\n  \
                    cgml inspect blinker.graphml                   # Tree visualization (default)\n  \
                    cgml inspect blinker.graphml model-json        # Model as JSON\n  \
                    cgml inspect blinker.graphml --extra-actions   # Tree with actions",
                )
                .arg(
                    Arg::new("path")
                        .help("Path to the CGML file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("transform")
                        .help("Transform to apply (stage-format). Defaults to 'model-treeviz'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            transforms::AVAILABLE_TRANSFORMS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between different formats.\n\n\
                    Supported formats:\n  \
                    - cgml:      Cyberiada-GraphML, structured actions (.graphml, .cgml)\n  \
                    - cgml-text: Cyberiada-GraphML, raw action text\n  \
                    - json:      Document model as JSON (.json)\n  \
                    - treeviz:   Tree visualization (output only)\n\n\
                    The source format is auto-detected from the file extension.\n\
                    Output goes to stdout by default, or use -o to specify a file.\n\n\
                    Examples:\n  \
                    cgml convert blinker.graphml --to json            # Convert to JSON (stdout)\n  \
                    cgml convert model.json --to cgml -o out.graphml  # JSON back to CGML\n  \
                    cgml blinker.graphml --to treeviz                 # 'convert' is optional",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Check that a CGML file round-trips unchanged")
                .long_about(
                    "Import the file, export it again and re-import the result.\n\n\
                    The check passes when both imports yield the same document model.\n\
                    Exits with status 1 on any import error or difference.\n\n\
                    Examples:\n  \
                    cgml check blinker.graphml           # Lenient keys (default)\n  \
                    cgml check blinker.graphml --strict  # Reject undeclared keys",
                )
                .arg(
                    Arg::new("path")
                        .help("Path to the CGML file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .help("Reject data entries whose key is not declared")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() {
    // Try to parse args. If no subcommand is provided, inject "convert"
    let args: Vec<String> = std::env::args().collect();

    // Parse extra-* arguments before clap processing
    let (cleaned_args, mut extra_params) = parse_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            // A first argument that is not a subcommand is taken as the input file
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !["inspect", "convert", "check", "help"].contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);

                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    if matches.get_flag("list-transforms") {
        handle_list_transforms_command();
        return;
    }

    let mut config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    apply_config_overrides(&mut config, &mut extra_params);
    init_logging(&config, matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => {
            let path = required_arg(sub_matches, "path");
            let transform = sub_matches
                .get_one::<String>("transform")
                .map(|s| s.as_str())
                .unwrap_or("model-treeviz");
            handle_inspect_command(path, transform, &extra_params, &config);
        }
        Some(("convert", sub_matches)) => {
            let input = required_arg(sub_matches, "input");
            let to = required_arg(sub_matches, "to");

            // Auto-detect --from if not provided
            let from = match sub_matches.get_one::<String>("from") {
                Some(f) => f.to_string(),
                None => {
                    let registry = FormatRegistry::default();
                    match registry.detect_format_from_filename(input) {
                        Some(detected) => configured_source_format(&detected, &config),
                        None => {
                            eprintln!("Error: Could not detect format from filename '{input}'");
                            eprintln!("Please specify --from explicitly");
                            std::process::exit(1);
                        }
                    }
                }
            };

            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(input, &from, to, output, &extra_params, &config);
        }
        Some(("check", sub_matches)) => {
            let path = required_arg(sub_matches, "path");
            let strict = sub_matches.get_flag("strict");
            handle_check_command(path, strict, &config);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn required_arg<'a>(matches: &'a clap::ArgMatches, name: &str) -> &'a str {
    match matches.get_one::<String>(name) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: missing required argument '{name}'");
            std::process::exit(1);
        }
    }
}

/// Handle the inspect command
fn handle_inspect_command(
    path: &str,
    transform: &str,
    extra_params: &HashMap<String, String>,
    config: &CgmlConfig,
) {
    let source = read_input(path);
    let options = ImportOptions::from(&config.import);

    let output = transforms::execute_transform(&source, transform, &options, extra_params)
        .unwrap_or_else(|e| {
            eprintln!("Execution error: {e}");
            std::process::exit(1);
        });

    print!("{output}");
}

/// Handle the convert command
fn handle_convert_command(
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    extra_params: &HashMap<String, String>,
    config: &CgmlConfig,
) {
    let registry = FormatRegistry::default();

    // Validate formats exist
    for name in [from, to] {
        if let Err(e) = registry.get(name) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    let source = read_input(input);

    let doc = parse_source(&registry, &source, from, config).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });
    tracing::debug!(
        from,
        to,
        state_machines = doc.state_machines.len(),
        "parsed input"
    );

    let mut format_options = HashMap::new();
    if cgml_mode(to).is_some() {
        format_options.insert("indent".to_string(), config.export.indent.to_string());
    }
    for (key, value) in extra_params {
        format_options.insert(key.clone(), value.clone());
    }

    let result = registry
        .serialize_with_options(&doc, to, &format_options)
        .unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        });

    match output {
        Some(path) => {
            fs::write(path, result).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
        }
        None => print!("{result}"),
    }
}

/// Handle the check command
fn handle_check_command(path: &str, strict: bool, config: &CgmlConfig) {
    let source = read_input(path);

    let mut options = ImportOptions::from(&config.import);
    options.strict_keys |= strict;

    let first = parse_with_options(&source, &options).unwrap_or_else(|e| {
        eprintln!("{path}: import failed: {e}");
        std::process::exit(1);
    });
    let written = serialize_with_options(&first, &config.export_options(options.mode))
        .unwrap_or_else(|e| {
            eprintln!("{path}: export failed: {e}");
            std::process::exit(1);
        });
    let second = parse_with_options(&written, &options).unwrap_or_else(|e| {
        eprintln!("{path}: re-import failed: {e}");
        std::process::exit(1);
    });

    let differences = document_differences(&first, &second);
    if differences.is_empty() {
        println!(
            "{path}: ok ({} state machines, {} mode)",
            first.state_machines.len(),
            options.mode.as_str()
        );
    } else {
        for difference in differences {
            eprintln!("{path}: {difference} changed after export");
        }
        std::process::exit(1);
    }
}

/// Names of the document parts that differ
fn document_differences(first: &Document, second: &Document) -> Vec<String> {
    let mut differences = Vec::new();
    if first.format != second.format {
        differences.push("format".to_string());
    }
    if first.keys != second.keys {
        differences.push("key declarations".to_string());
    }
    let ids: std::collections::BTreeSet<&String> = first
        .state_machines
        .keys()
        .chain(second.state_machines.keys())
        .collect();
    for id in ids {
        if first.state_machines.get(id) != second.state_machines.get(id) {
            differences.push(format!("state machine '{id}'"));
        }
    }
    differences
}

/// Handle the list-transforms command
fn handle_list_transforms_command() {
    println!("Available transforms:\n");
    println!("Stages:");
    println!("  tree        - Attributed GraphML tree, before CGML interpretation");
    println!("  model       - Document model (flat state machines)\n");

    println!("Formats:");
    println!("  json        - JSON output (all stages)");
    println!("  text-json   - JSON output with raw action text (model only)");
    println!("  treeviz     - Tree visualization (model only)\n");

    println!("Available transform combinations:");
    for transform_name in transforms::AVAILABLE_TRANSFORMS {
        println!("  {transform_name}");
    }

    println!("\nConversion formats:");
    let registry = FormatRegistry::default();
    for format_name in registry.list_formats() {
        println!("  {format_name}");
    }
}

fn read_input(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

/// Mode of a cgml-family format name
fn cgml_mode(format: &str) -> Option<Mode> {
    match format {
        "cgml" => Some(Mode::Structured),
        "cgml-text" => Some(Mode::Text),
        _ => None,
    }
}

/// An auto-detected CGML source follows the configured import mode.
fn configured_source_format(detected: &str, config: &CgmlConfig) -> String {
    match (cgml_mode(detected), config.import.mode) {
        (Some(_), mode) => CgmlFormat::new(mode).name().to_string(),
        (None, _) => detected.to_string(),
    }
}

fn parse_source(
    registry: &FormatRegistry,
    source: &str,
    from: &str,
    config: &CgmlConfig,
) -> Result<Document, CgmlError> {
    match cgml_mode(from) {
        Some(mode) if config.import.strict_keys => CgmlFormat::new(mode).parse_strict(source),
        _ => registry.parse(source, from),
    }
}

fn load_cli_config(explicit_path: Option<&str>) -> CgmlConfig {
    let loader = Loader::new().with_optional_file("cgml.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

/// RUST_LOG wins over the configured level; --verbose wins over both.
fn init_logging(config: &CgmlConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn apply_config_overrides(config: &mut CgmlConfig, extra_params: &mut HashMap<String, String>) {
    if let Some(raw) = take_override(extra_params, &["strict-keys", "strict"]) {
        config.import.strict_keys = parse_bool_arg("strict-keys", &raw);
    }
    if let Some(raw) = extra_params.remove("mode") {
        config.import.mode = match raw.as_str() {
            "structured" => Mode::Structured,
            "text" => Mode::Text,
            other => {
                eprintln!("Invalid mode '{other}' for --extra-mode, expected structured or text");
                std::process::exit(1);
            }
        };
    }
    if let Some(raw) = extra_params.remove("indent") {
        config.export.indent = raw.parse().unwrap_or_else(|_| {
            eprintln!("Invalid indent '{raw}' for --extra-indent");
            std::process::exit(1);
        });
    }
}

fn take_override(map: &mut HashMap<String, String>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = map.remove(*key) {
            return Some(value);
        }
    }
    None
}

fn parse_bool_arg(flag: &str, raw: &str) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => true,
        "false" | "0" | "no" | "n" => false,
        other => {
            eprintln!("Invalid boolean value '{other}' for --extra-{flag}");
            std::process::exit(1);
        }
    }
}
