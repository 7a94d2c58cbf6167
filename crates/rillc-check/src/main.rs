use std::fs;
use std::path::PathBuf;
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;

use rill_analysis::ast::nodes::Program;
use rill_analysis::semantic;
use rill_common::{config, AnalysisConfig, SemanticError};

/// Rill semantic analyzer.
///
/// Validates a parsed AST and annotates it for the code generator.
#[derive(Parser)]
#[command(
    name = "rillc-check",
    version,
    about,
    long_about = "Rill semantic analyzer.\n\nReads a parsed AST (.rill-ast JSON, as emitted by the Rill parser),\nverifies scoping, declarations, call arity, and expression types, and\nwrites the annotated AST for the code generator.\n\nExamples:\n  rillc-check hello.rill-ast                 Analyze and write hello.sem.json\n  rillc-check hello.rill-ast --check         Check for errors only\n  rillc-check hello.rill-ast --emit-ast      Print annotated AST to stdout\n  rillc-check hello.rill-ast --source hello.rill   Pretty error locations"
)]
struct Cli {
    /// Input .rill-ast file (JSON).
    input: PathBuf,

    /// Rill.toml path (default: nearest manifest above the input).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Original .rill source, for annotated error rendering.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Output file path (default: <input stem>.sem.json).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Check for errors without writing the annotated AST.
    #[arg(long)]
    check: bool,

    /// Print the annotated AST JSON to stdout instead of a file.
    #[arg(long = "emit-ast")]
    emit_ast: bool,

    /// Print the `$`-global list after analysis.
    #[arg(long)]
    globals: bool,
}

fn main() {
    let cli = Cli::parse();

    // Read the serialized AST.
    let ast_json = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let mut program: Program = match serde_json::from_str(&ast_json) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: '{}' is not a valid AST file: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    // === Manifest ===
    // Explicit --config wins; otherwise walk up from the input file.
    let analysis_config = match &cli.config {
        Some(path) => match config::load_config(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None => {
            let abs_input = fs::canonicalize(&cli.input).unwrap_or_else(|_| cli.input.clone());
            let start_dir = abs_input.parent().map(PathBuf::from).unwrap_or_default();
            match config::find_config(&start_dir) {
                Some(path) => match config::load_config(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("error: {}", e);
                        process::exit(1);
                    }
                },
                None => AnalysisConfig::default(),
            }
        }
    };

    // === Semantic analysis ===
    let analysis = match semantic::analyze(&mut program, &analysis_config) {
        Ok(analysis) => analysis,
        Err(err) => {
            report_error(&err, cli.source.as_deref());
            process::exit(err.code());
        }
    };

    if cli.globals {
        for binding in &analysis.globals {
            println!("{}: {}", binding.name, binding.ty.display_name());
        }
    }

    if cli.check {
        println!("No errors found.");
        return;
    }

    let json = match serde_json::to_string_pretty(&program) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: failed to serialize annotated AST: {}", e);
            process::exit(1);
        }
    };

    // --emit-ast: print JSON to stdout
    if cli.emit_ast {
        println!("{}", json);
        return;
    }

    let output_path = cli.output.unwrap_or_else(|| {
        let mut p = cli.input.clone();
        p.set_extension("sem.json");
        p
    });

    match fs::write(&output_path, &json) {
        Ok(()) => {
            println!(
                "Analyzed {} -> {} ({} classes, {} globals)",
                cli.input.display(),
                output_path.display(),
                program.classes.len(),
                analysis.globals.len()
            );
        }
        Err(e) => {
            eprintln!("error: could not write '{}': {}", output_path.display(), e);
            process::exit(1);
        }
    }
}

fn report_error(err: &SemanticError, source_path: Option<&std::path::Path>) {
    let span = err.span();

    // With the original source at hand, render an annotated report.
    if let Some(path) = source_path {
        if !span.is_dummy() {
            if let Ok(source) = fs::read_to_string(path) {
                let file_name = path.to_string_lossy().to_string();
                let start = span.start.offset as usize;
                let end = (span.end.offset as usize).max(start + 1);

                Report::build(ReportKind::Error, file_name.as_str(), start)
                    .with_message(err.message())
                    .with_label(
                        Label::new((file_name.as_str(), start..end))
                            .with_message(err.message())
                            .with_color(Color::Red),
                    )
                    .finish()
                    .eprint((file_name.as_str(), Source::from(source)))
                    .ok();
                return;
            }
        }
    }

    if span.is_dummy() {
        eprintln!("error[E{}]: {}", err.code(), err);
    } else {
        eprintln!("error[E{}]: {}\n  --> {}", err.code(), err, span);
    }
}
