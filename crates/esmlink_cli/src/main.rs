//! esml: The esmlink module linker CLI.
//!
//! Usage:
//!   esml [options] [manifest]
//!
//! Loads the module graph described by an `esmlink.json` manifest, links
//! it, and reports link errors the way `tsc` reports diagnostics.

use clap::Parser as ClapParser;
use esmlink_diagnostics::{Diagnostic, DiagnosticCollection};
use esmlink_linker::{parse_manifest, LinkError, LinkedProgram, Manifest, ManifestLoader, Program, Visibility};
use esmlink_options::BindingSemantics;
use miette::{IntoDiagnostic, WrapErr};
use std::path::Path;
use std::process;
use std::time::Instant;

#[derive(ClapParser, Debug)]
#[command(name = "esml", about = "esmlink - ES/TS module linker", disable_version_flag = true)]
struct Cli {
    /// Project manifest.
    #[arg(value_name = "MANIFEST", default_value = "esmlink.json")]
    manifest: String,

    /// Print the evaluation order.
    #[arg(long)]
    order: bool,

    /// Print the resolved export table of a module.
    #[arg(long, value_name = "MODULE")]
    exports: Option<String>,

    /// Importers observe the owner's current value instead of a snapshot.
    #[arg(long)]
    live: bool,

    /// Emit JSON trace events to stderr.
    #[arg(long)]
    trace: bool,

    /// Enable pretty printing for diagnostics.
    #[arg(long, default_value_t = true)]
    pretty: bool,

    /// Initialize an esmlink.json file.
    #[arg(long)]
    init: bool,

    /// Print the linker version.
    #[arg(short = 'v', long)]
    version: bool,
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("esml Version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if cli.trace {
        init_tracing();
    }

    if cli.init {
        run_init();
        return;
    }

    let exit_code = run_link(&cli);
    process::exit(exit_code);
}

fn init_tracing() {
    use tracing::Level;
    use tracing_subscriber::fmt::format::FmtSpan;

    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .json()
        .with_ansi(false)
        .try_init();
}

fn run_link(cli: &Cli) -> i32 {
    let start = Instant::now();
    let use_color = cli.pretty && atty_is_terminal();

    let mut manifest = match load_manifest(&cli.manifest) {
        Ok(manifest) => manifest,
        Err(report) => {
            eprintln!("{:?}", report);
            return 1;
        }
    };
    if cli.live {
        manifest.linker_options.binding_semantics = Some(BindingSemantics::Live);
    }

    let Some(entry) = manifest.entry().map(str::to_string) else {
        print_error(&format!("Manifest '{}' lists no modules.", cli.manifest));
        return 1;
    };

    let root = Path::new(&cli.manifest)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut loader = ManifestLoader::new(&manifest).with_root(root);

    let mut program = Program::new(manifest.linker_options.clone());
    // Exit code 1 for modules that could not be loaded, 2 for link errors.
    let linked = match program.load(&mut loader, &entry) {
        Ok(_) => program.link().map_err(|err| (err, 2)),
        Err(err @ (LinkError::LoadFailed { .. } | LinkError::ModuleNotFound { .. })) => Err((err, 1)),
        Err(err) => Err((err, 2)),
    };

    let linked = match linked {
        Ok(linked) => linked,
        Err((err, code)) => {
            let mut diagnostics = DiagnosticCollection::new();
            diagnostics.add(err.to_diagnostic());
            report_diagnostics(&diagnostics, use_color);
            return code;
        }
    };

    if cli.order {
        for module in linked.evaluation_order_names() {
            println!("{}", module);
        }
    }

    if let Some(module) = &cli.exports {
        if !print_exports(&linked, module) {
            print_error(&format!("Module '{}' is not part of the program.", module));
            return 1;
        }
    }

    if use_color {
        eprintln!(
            "{}Linked {} module{} in {:.2}s.{}",
            GRAY,
            linked.evaluation_order().len(),
            if linked.evaluation_order().len() == 1 { "" } else { "s" },
            start.elapsed().as_secs_f64(),
            RESET
        );
    }

    0
}

fn load_manifest(path: &str) -> miette::Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read manifest '{}'", path))?;
    parse_manifest(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse manifest '{}'", path))
}

fn print_exports(linked: &LinkedProgram, module: &str) -> bool {
    let Some(rows) = linked.describe_exports(module) else {
        return false;
    };
    for row in rows {
        let visibility = match row.visibility {
            Visibility::Value => "value",
            Visibility::TypeOnly => "type-only",
        };
        println!("{:<24} {:<10} {:<10} {}", row.name, row.kind, visibility, row.origin);
    }
    true
}

fn report_diagnostics(diagnostics: &DiagnosticCollection, use_color: bool) {
    for diag in diagnostics.diagnostics() {
        print_diagnostic(diag, use_color);
        for related in &diag.related_information {
            eprint!("  ");
            print_diagnostic(related, use_color);
        }
    }

    let count = diagnostics.error_count();
    if use_color {
        eprintln!(
            "\n{}Found {} error{}.{}",
            RED,
            count,
            if count == 1 { "" } else { "s" },
            RESET
        );
    } else {
        eprintln!("\nFound {} error{}.", count, if count == 1 { "" } else { "s" });
    }
}

fn run_init() {
    let manifest_path = Path::new("esmlink.json");
    if manifest_path.exists() {
        print_error("An esmlink.json file already exists in the current directory.");
        process::exit(1);
    }

    let default_manifest = r#"{
  "linkerOptions": {
    "bindingSemantics": "snapshot",
    "defaultScoping": "module"
  },
  "entry": "src/index",
  "modules": {
    "src/index": {
      "imports": [{ "from": "./greeting.js", "names": ["greeting"] }]
    },
    "src/greeting": {
      "declarations": [{ "name": "greeting", "value": "hello" }],
      "exports": [{ "local": "greeting" }]
    }
  }
}
"#;

    match std::fs::write(manifest_path, default_manifest) {
        Ok(()) => println!("Successfully created an esmlink.json file."),
        Err(e) => {
            print_error(&format!("Failed to create esmlink.json: {}", e));
            process::exit(1);
        }
    }
}

fn print_diagnostic(diag: &Diagnostic, use_color: bool) {
    if use_color {
        let color = if diag.is_error() { RED } else { YELLOW };
        if let Some(ref module) = diag.module {
            eprint!("{}{}{}", CYAN, module, RESET);
            if let Some(ref name) = diag.name {
                eprint!("({})", name);
            }
            eprint!(": ");
        }
        eprintln!(
            "{}{}{}{} {}TS{}{}: {}",
            BOLD, color, diag.category, RESET, CYAN, diag.code, RESET, diag.message_text
        );
    } else {
        eprintln!("{}", diag);
    }
}

fn print_error(msg: &str) {
    if atty_is_terminal() {
        eprintln!("{}{}error{}: {}", BOLD, RED, RESET, msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

fn atty_is_terminal() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::isatty(2) != 0 }
    }
    #[cfg(not(unix))]
    {
        true
    }
}
