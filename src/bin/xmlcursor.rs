use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use xmlcursor::{
    check_element, child, descendant, descendant_or_self, self_axis, AxisExt, Cursor, Document, Element, Name,
    ParseSettings, RenderSettings,
};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    parse: ParseArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ParseArgs {
    /// Extra entity, as NAME=VALUE (repeatable)
    #[arg(long = "entity", value_name = "NAME=VALUE", value_parser = parse_entity, global = true)]
    entities: Vec<(String, String)>,

    /// Drop whitespace-only text between markup
    #[arg(long, global = true)]
    strip_whitespace: bool,
}

impl ParseArgs {
    fn settings(&self) -> ParseSettings {
        self.entities
            .iter()
            .fold(ParseSettings::new(), |settings, (name, value)| settings.entity(name, value))
            .preserve_whitespace_in_misc(!self.strip_whitespace)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Parse a document and render it again
    Fmt {
        file: PathBuf,

        /// Indent element-only content
        #[arg(long)]
        pretty: bool,

        /// Spaces per indentation level
        #[arg(long, default_value_t = 2)]
        indent: usize,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the string value of every node a path selects
    Select {
        /// Path such as `/html/body//p[@class='note']`
        path: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn parse_entity(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got `{}`", text)),
    }
}

/// One step of a select path
#[derive(Clone, Debug, PartialEq)]
struct Step {
    descendant: bool,
    /// None matches any element
    name: Option<Name>,
    attribute: Option<(Name, String)>,
}

impl Step {
    fn matches(&self, element: &Element) -> bool {
        let name_ok = self.name.as_ref().map_or(true, |name| &element.name == name);
        let attribute_ok = self
            .attribute
            .as_ref()
            .map_or(true, |(name, value)| element.attributes.get(name) == Some(value));
        name_ok && attribute_ok
    }
}

fn parse_path(path: &str) -> Result<Vec<Step>, String> {
    let mut steps = Vec::new();
    let mut rest = path;

    while !rest.is_empty() {
        let descendant = if let Some(after) = rest.strip_prefix("//") {
            rest = after;
            true
        } else if let Some(after) = rest.strip_prefix('/') {
            rest = after;
            false
        } else {
            return Err(format!("path step must start with `/`: `{}`", rest));
        };

        // Clark names may contain `/` inside braces
        let mut end = 0;
        let mut in_braces = false;
        for (i, c) in rest.char_indices() {
            match c {
                '{' => in_braces = true,
                '}' => in_braces = false,
                '/' | '[' if !in_braces => break,
                _ => {}
            }
            end = i + c.len_utf8();
        }
        let test = &rest[..end];
        rest = &rest[end..];
        if test.is_empty() {
            return Err(format!("empty step in `{}`", path));
        }

        let attribute = match rest.strip_prefix("[@") {
            Some(filter) => {
                let close = filter.find(']').ok_or_else(|| format!("unclosed filter in `{}`", path))?;
                let (name, value) = filter[..close]
                    .split_once('=')
                    .ok_or_else(|| format!("filter needs `@name='value'` in `{}`", path))?;
                let value = value
                    .strip_prefix('\'')
                    .and_then(|v| v.strip_suffix('\''))
                    .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                    .ok_or_else(|| format!("filter value must be quoted in `{}`", path))?;
                rest = &filter[close + 1..];
                Some((Name::from(name.trim()), value.to_string()))
            }
            None => None,
        };

        steps.push(Step {
            descendant,
            name: (test != "*").then(|| Name::from(test)),
            attribute,
        });
    }

    if steps.is_empty() {
        return Err("empty path".to_string());
    }
    Ok(steps)
}

type AxisFn<'a> = fn(&Cursor<'a>) -> Vec<Cursor<'a>>;

/// Evaluate a path from the root element, which acts as the child of an
/// implicit document node for the first step
fn evaluate<'a>(steps: &[Step], root: Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut current = vec![root];

    for (i, step) in steps.iter().enumerate() {
        // Each arm is a distinct fn item, so they meet at a common pointer type
        let axis = match (i == 0, step.descendant) {
            (true, false) => self_axis as AxisFn<'a>,
            (true, true) => descendant_or_self as AxisFn<'a>,
            (false, false) => child as AxisFn<'a>,
            (false, true) => descendant as AxisFn<'a>,
        };
        let step = step.clone();
        let query = axis.then(check_element(move |e: &Element| step.matches(e)));
        current = current.iter().flat_map(|c| c.select(&query)).collect();
    }

    current
}

fn fmt(
    file: &Path,
    settings: &ParseSettings,
    render: &RenderSettings,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let doc = Document::parse_file(file, settings)?;
    match output {
        Some(path) => doc.write_file(path, render)?,
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            doc.render_to(&mut out, render)?;
            if !render.pretty {
                writeln!(out)?;
            }
            out.flush()?;
        }
    }
    Ok(())
}

fn select(path: &str, files: &[PathBuf], settings: &ParseSettings) -> Result<bool, Box<dyn Error>> {
    let steps = parse_path(path)?;
    debug!(?steps, files = files.len(), "compiled path");

    let results: Vec<_> = files
        .par_iter()
        .map(|file| {
            let doc = Document::parse_file(file, settings)?;
            let hits = evaluate(&steps, Cursor::from_document(&doc));
            Ok::<_, xmlcursor::ParseError>(hits.iter().map(Cursor::string_value).collect::<Vec<_>>())
        })
        .collect();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut ok = true;
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(values) => {
                for value in values {
                    if files.len() > 1 {
                        writeln!(out, "{}: {}", file.display(), value)?;
                    } else {
                        writeln!(out, "{}", value)?;
                    }
                }
            }
            Err(e) => {
                error!("{}: {}", file.display(), e);
                ok = false;
            }
        }
    }
    out.flush()?;
    Ok(ok)
}

fn run(cli: Cli) -> Result<bool, Box<dyn Error>> {
    let settings = cli.parse.settings();
    match &cli.command {
        Command::Fmt {
            file,
            pretty,
            indent,
            output,
        } => {
            let render = RenderSettings {
                pretty: *pretty,
                indent: *indent,
            };
            fmt(file, &settings, &render, output.as_deref())?;
            Ok(true)
        }
        Command::Select { path, files } => select(path, files, &settings),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
