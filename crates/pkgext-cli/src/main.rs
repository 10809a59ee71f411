use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use pkgext_core::{Config, Extension, MessageDef, Output, Report, Severity};
use pkgext_engine::Compiler;

/// pkgext - extension tables, parsing and validation for installer packages
#[derive(Parser)]
#[command(name = "pkgext")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: pkgext.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and validate source files
    Compile {
        /// Source files or directories to search for *.wxs
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write the emitted rows as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for report.json
        #[arg(short, long, default_value = "report.json")]
        report: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },

    /// Show table definitions
    Tables {
        /// Only this table
        name: Option<String>,
    },

    /// List known messages
    Messages {
        /// Only messages of this extension
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Explain a message id
    Explain {
        /// Message id (e.g. 6804)
        id: u32,
    },

    /// Turn emitted rows back into source elements
    Decompile {
        /// Rows written by `compile --output`
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("pkgext.toml").exists() {
        Config::from_file(Path::new("pkgext.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    let compiler = Compiler::new(enabled_extensions(&config))?;
    if cli.verbose {
        let names: Vec<&str> = compiler.extensions().map(|e| e.name()).collect();
        eprintln!("{} {}", "Extensions:".cyan(), names.join(", "));
    }

    match cli.command {
        Commands::Compile {
            paths,
            output,
            report,
            markdown,
        } => compile_command(
            &compiler,
            &config,
            &paths,
            output.as_deref(),
            &report,
            markdown.as_deref(),
            cli.verbose,
        ),
        Commands::Tables { name } => tables_command(&compiler, name.as_deref()),
        Commands::Messages { extension } => messages_command(&compiler, extension.as_deref()),
        Commands::Explain { id } => explain_command(&compiler, id),
        Commands::Decompile { input } => decompile_command(&compiler, &input),
    }
}

/// Log to stderr. `--verbose` forces debug, otherwise `RUST_LOG` or warn.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn enabled_extensions(config: &Config) -> Vec<Box<dyn Extension>> {
    pkgext_extensions::all()
        .into_iter()
        .filter(|e| config.extensions.is_enabled(e.name()))
        .collect()
}

/// Source files named on the command line, with directories searched for *.wxs
fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "wxs"))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            sources.extend(found);
        } else {
            sources.push(path.clone());
        }
    }

    sources
}

/// Compile command - parse every source file, then bind and validate them together
fn compile_command(
    compiler: &Compiler,
    config: &Config,
    paths: &[PathBuf],
    output: Option<&Path>,
    report_path: &Path,
    markdown: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let sources = collect_sources(paths);
    if sources.is_empty() {
        return Err(anyhow::anyhow!("No source files found"));
    }

    if verbose {
        for source in &sources {
            eprintln!("  {} {}...", "Compiling".cyan(), source.display());
        }
    }

    // Every source is one build unit: keys and validators see all of their rows
    let build = compiler
        .build_files(sources.as_slice(), &config.messages)
        .context("Failed to compile sources")?;

    if verbose {
        let error_count = build.diagnostics.iter().filter(|d| d.is_error()).count();
        if error_count > 0 {
            eprintln!("    {} errors found", error_count.to_string().red());
        } else {
            eprintln!("    {}", "✓ OK".green());
        }
    }

    let mut report = Report::new();
    report.record_build(sources.len(), build.output.row_count());
    for diagnostic in build.diagnostics {
        report.add_diagnostic(diagnostic);
    }
    let rows = build.output;

    if let Some(output) = output {
        std::fs::write(output, serde_json::to_string_pretty(&rows)?)?;
        if verbose {
            eprintln!("{} {}", "Rows saved to:".green(), output.display());
        }
    }

    report.save_to_file(report_path)?;
    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), report_path.display());
    }

    // Save markdown report if requested
    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), md_path.display());
        }
    }

    print_report_summary(&report);

    // Exit with error code if there are errors
    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Tables command - print table definitions
fn tables_command(compiler: &Compiler, name: Option<&str>) -> Result<()> {
    let registry = compiler.registry();
    let tables: Vec<_> = match name {
        Some(name) => vec![registry
            .lookup(name)
            .ok_or_else(|| anyhow::anyhow!("Table '{}' is not defined", name))?],
        None => registry.tables().collect(),
    };

    for table in tables {
        println!("{}", table.name.bold().bright_blue());
        for column in &table.columns {
            let mut notes = Vec::new();
            if column.primary_key {
                notes.push("primary key".to_string());
            }
            if column.nullable {
                notes.push("nullable".to_string());
            }
            if let Some(fk) = &column.foreign_key {
                notes.push(format!("-> {}.{}", fk.table, fk.column));
            }

            println!(
                "  {:<28} {:<10} {}",
                column.name,
                column.column_type.to_string().cyan(),
                notes.join(", ")
            );
        }
        println!();
    }

    Ok(())
}

/// Messages command - list catalog entries
fn messages_command(compiler: &Compiler, extension: Option<&str>) -> Result<()> {
    let messages: Vec<&MessageDef> = match extension {
        Some(name) => {
            let extension = compiler
                .extensions()
                .find(|e| e.name() == name)
                .ok_or_else(|| anyhow::anyhow!("Extension '{}' is not enabled", name))?;
            extension.messages().iter().collect()
        }
        None => compiler.catalog().iter().collect(),
    };

    for message in messages {
        println!(
            "PKG{:04}  {}  {}",
            message.id,
            severity_label(message.severity),
            message.name
        );
    }

    Ok(())
}

/// Explain command - show one message in full
fn explain_command(compiler: &Compiler, id: u32) -> Result<()> {
    let message = compiler
        .catalog()
        .lookup(id)
        .ok_or_else(|| anyhow::anyhow!("Unknown message id {}", id))?;

    println!("{} {}", format!("PKG{:04}", message.id).bold(), message.name.bold());
    println!("Severity: {}", severity_label(message.severity));
    println!();
    println!("{}", message.format);

    Ok(())
}

/// Decompile command - recover extension elements from saved rows
fn decompile_command(compiler: &Compiler, input: &Path) -> Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let output: Output = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a rows file", input.display()))?;

    let elements = compiler.decompile(&output)?;
    if elements.is_empty() {
        println!("{}", "No extension rows to decompile".yellow());
    }

    for decompiled in elements {
        println!(
            "<!-- under {} '{}' -->",
            decompiled.parent_table, decompiled.parent_key
        );
        print!("{}", decompiled.element.to_xml());
    }

    Ok(())
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warning => "WARN".yellow().bold(),
    }
}

/// Print report summary to stdout
fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Package Extension Build Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Files compiled:    {}", report.summary.files_compiled);
    println!("  Rows emitted:      {}", report.summary.rows_emitted);
    println!("  Total diagnostics: {}", report.summary.total);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            println!(
                "  [{}] PKG{:04} {}: {}",
                severity_label(diag.severity),
                diag.id,
                diag.name,
                diag.message
            );

            if let Some(loc) = &diag.location {
                println!("    at {}", loc);
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report
fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Package Extension Build Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Files compiled: {}\n", report.summary.files_compiled));
    md.push_str(&format!("- Rows emitted: {}\n", report.summary.rows_emitted));
    md.push_str(&format!("- Total diagnostics: {}\n", report.summary.total));
    md.push_str(&format!("- Errors: {}\n", report.summary.errors));
    md.push_str(&format!("- Warnings: {}\n", report.summary.warnings));
    md.push('\n');

    if report.diagnostics.is_empty() {
        md.push_str("✅ **No issues found!**\n");
    } else {
        md.push_str("## Diagnostics\n\n");

        for diag in &report.diagnostics {
            let severity_emoji = match diag.severity {
                Severity::Error => "❌",
                Severity::Warning => "⚠️",
            };

            md.push_str(&format!(
                "### {} {} PKG{:04} - {}\n\n",
                severity_emoji, diag.severity, diag.id, diag.name
            ));
            md.push_str(&format!("{}\n\n", diag.message));

            if let Some(loc) = &diag.location {
                md.push_str(&format!("**Location:** {}\n\n", loc));
            }
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgext_core::Location;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn markdown_lists_diagnostics() {
        let report = Report::from_diagnostics(vec![
            pkgext_extensions::bal::MULTIPLE_BA_FUNCTIONS.at(&Location::with_line("bundle.wxs", 12), &[])
        ]);
        let md = generate_markdown_report(&report);

        assert!(md.contains("- Errors: 1"));
        assert!(md.contains("PKG6804 - MultipleBAFunctions"));
        assert!(md.contains("**Location:** bundle.wxs:12"));
    }

    #[test]
    fn config_selects_extensions() {
        let config = Config::from_toml("[extensions]\nenabled = [\"difxapp\", \"http\"]\n").unwrap();
        let names: Vec<&str> = enabled_extensions(&config).iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["difxapp", "http"]);
    }
}
