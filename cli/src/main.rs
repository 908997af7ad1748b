//! tocmark CLI - add PDF bookmarks from table of contents text

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use tocmark::fetch::{fetch_toc_text_with_timeout, is_toc_url};
use tocmark::parser::DEFAULT_TAB_WIDTH;
use tocmark::render::{self, JsonFormat};
use tocmark::{read_outline, DepthStrategy, Tocmark, Warning};

#[derive(Parser)]
#[command(name = "tocmark")]
#[command(version)]
#[command(about = "Add bookmarks to a PDF from plain-text table of contents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that parse TOC text.
#[derive(clap::Args)]
struct TocArgs {
    /// TOC source: a text file, "-" for stdin, or a book page URL
    #[arg(short, long, value_name = "FILE|-|URL")]
    toc: String,

    /// Added to every printed page number (may be negative)
    #[arg(
        short = 'n',
        long,
        env = "TOCMARK_OFFSET",
        default_value = "0",
        allow_hyphen_values = true
    )]
    offset: String,

    /// Indentation width of a tab character
    #[arg(long, env = "TOCMARK_TAB_WIDTH", default_value_t = DEFAULT_TAB_WIDTH)]
    tab_width: usize,

    /// How nesting depth is inferred
    #[arg(long, value_enum, default_value = "auto")]
    strategy: Strategy,

    /// Give up fetching a TOC URL after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a copy of the PDF with bookmarks
    #[command(alias = "gen")]
    Generate {
        /// Source PDF file
        #[arg(value_name = "PDF")]
        input: PathBuf,

        #[command(flatten)]
        toc: TocArgs,

        /// Output file (defaults to <name>_含目录.pdf next to the source)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write bookmarks expanded
        #[arg(long)]
        open: bool,
    },

    /// Parse TOC text and print the resulting bookmarks
    Preview {
        #[command(flatten)]
        toc: TocArgs,

        /// Check pages against a document with this many pages
        #[arg(long, value_name = "N")]
        pages: Option<u32>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the bookmarks already in a PDF
    Show {
        /// PDF file
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a book page and print its TOC text
    Fetch {
        /// Book page URL
        #[arg(value_name = "URL")]
        url: String,

        /// Give up after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Indentation if present, else numbering
    Auto,
    /// Leading whitespace width
    Indent,
    /// Numbering like 1.2.3 and chapter markers
    Numbering,
    /// No nesting
    Flat,
}

impl From<Strategy> for DepthStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Auto => DepthStrategy::Auto,
            Strategy::Indent => DepthStrategy::Indent,
            Strategy::Numbering => DepthStrategy::Numbering,
            Strategy::Flat => DepthStrategy::Flat,
        }
    }
}

impl TocArgs {
    fn builder(&self) -> Result<Tocmark, Box<dyn std::error::Error>> {
        Ok(Tocmark::new()
            .with_offset_str(&self.offset)?
            .with_tab_width(self.tab_width)
            .with_strategy(self.strategy.into()))
    }

    fn read_text(&self) -> Result<String, Box<dyn std::error::Error>> {
        read_toc(&self.toc, self.timeout)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            input,
            toc,
            output,
            open,
        } => cmd_generate(&input, &toc, output, open),
        Commands::Preview { toc, pages, json } => cmd_preview(&toc, pages, json),
        Commands::Show { input, json } => cmd_show(&input, json),
        Commands::Fetch {
            url,
            timeout,
            output,
        } => cmd_fetch(&url, timeout, output.as_deref()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        match e.downcast_ref::<tocmark::Error>() {
            Some(tocmark::Error::PasswordProtected) => {
                eprintln!(
                    "{}: the PDF is password protected. Remove the password and try again.",
                    "Error".red().bold()
                );
            }
            _ => eprintln!("{}: {}", "Error".red().bold(), e),
        }
        std::process::exit(1);
    }
}

/// Read TOC text from a file, stdin ("-") or a URL.
fn read_toc(source: &str, timeout: Option<u64>) -> Result<String, Box<dyn std::error::Error>> {
    if source == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    if is_toc_url(source) {
        eprintln!("{} {}", "Fetching".cyan(), source.trim());
        let text = fetch_toc_text_with_timeout(source, timeout.map(Duration::from_secs))?;
        return Ok(text);
    }
    let text = fs::read_to_string(source)?;
    log::debug!("Read {} bytes of TOC text from {}", text.len(), source);
    Ok(text)
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!(
            "{} {}",
            "Warning:".yellow().bold(),
            warning.to_string().yellow()
        );
    }
}

fn cmd_generate(
    input: &Path,
    toc: &TocArgs,
    output: Option<PathBuf>,
    open: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = toc.read_text()?;

    let mut builder = toc.builder()?.with_open_items(open);
    if let Some(path) = output {
        builder = builder.with_destination(path);
    }

    let result = builder.generate(&text, input)?;
    print_warnings(&result.warnings);

    println!(
        "{} {} bookmarks ({} pages)",
        "Added".green(),
        result.entries,
        result.page_count
    );
    println!("{} {}", "Saved to".green(), result.destination.display());

    Ok(())
}

fn cmd_preview(
    toc: &TocArgs,
    pages: Option<u32>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = toc.read_text()?;
    let parsed = toc.builder()?.preview(&text, pages)?;
    print_warnings(&parsed.warnings);

    if json {
        println!("{}", render::to_json(&parsed.tree, JsonFormat::Pretty)?);
    } else {
        println!("{}", render::to_text(&parsed.tree));
        println!(
            "\n{} {} bookmarks, {} levels",
            "Total:".bold(),
            parsed.tree.len(),
            parsed.tree.max_depth().map_or(0, |d| d + 1)
        );
    }

    Ok(())
}

fn cmd_show(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let outline = read_outline(input)?;

    if json {
        println!("{}", render::to_json(&outline, JsonFormat::Pretty)?);
        return Ok(());
    }

    if outline.is_empty() {
        println!("{}", "No bookmarks".yellow());
        return Ok(());
    }

    println!("{}", render::outline_to_text(&outline));
    println!("\n{}: {}", "Bookmarks".bold(), outline.total_items());

    Ok(())
}

fn cmd_fetch(
    url: &str,
    timeout: Option<u64>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fetch_toc_text_with_timeout(url, timeout.map(Duration::from_secs))?;

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "tocmark".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Add PDF bookmarks from table of contents text");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_negative_offset() {
        let cli = Cli::try_parse_from([
            "tocmark", "generate", "book.pdf", "--toc", "toc.txt", "--offset", "-3",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { toc, open, .. } => {
                assert_eq!(toc.offset, "-3");
                assert!(!open);
                assert_eq!(toc.builder().unwrap().options().offset, -3);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_read_toc_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toc.txt");
        fs::write(&path, "Intro 1\n").unwrap();
        let text = read_toc(path.to_str().unwrap(), None).unwrap();
        assert_eq!(text, "Intro 1\n");
    }
}
