//! `weft` -- command-line front end for the Weft markup compiler.
//!
//! `weft check` parses a document against a permissive widget catalog (any
//! type name, any property) to validate its syntax; `weft tokens` dumps
//! the raw token stream, which is what editors and syntax highlighters
//! consume.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use weft_core::{
    tokenize, ListEntry, RectOffset, Token, TokenKind, Widget, WidgetFactory, WidgetHandle,
};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Weft markup toolchain.
#[derive(Parser)]
#[command(name = "weft", version, about = "Weft markup toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a .weft file and report syntax errors
    Check {
        /// Path to the .weft source file
        file: PathBuf,
    },

    /// Dump the token stream of a .weft file
    Tokens {
        /// Path to the .weft source file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Check { ref file } => cmd_check(file, cli.output),
        Commands::Tokens { ref file } => cmd_tokens(file, cli.output),
    };
    process::exit(code);
}

fn read_source(path: &Path) -> Result<String, i32> {
    std::fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read {}: {}", path.display(), e);
        1
    })
}

// ── check ────────────────────────────────────────────────────────────

/// Widget that accepts every property and child; `check` only cares about
/// syntax, not about any concrete widget set.
#[derive(Debug, Default)]
struct AnyWidget {
    type_name: String,
    properties: usize,
    children: Vec<WidgetHandle>,
}

impl AnyWidget {
    fn count(&self) -> (usize, usize) {
        let mut widgets = 1;
        let mut properties = self.properties;
        for child in &self.children {
            if let Some(child) = child.as_any().downcast_ref::<AnyWidget>() {
                let (w, p) = child.count();
                widgets += w;
                properties += p;
            }
        }
        (widgets, properties)
    }

    fn accept(&mut self) -> bool {
        self.properties += 1;
        true
    }
}

impl Widget for AnyWidget {
    fn type_name(&self) -> &str {
        &self.type_name
    }
    fn set_int(&mut self, _: &str, _: i64) -> bool {
        self.accept()
    }
    fn set_bool(&mut self, _: &str, _: bool) -> bool {
        self.accept()
    }
    fn set_float(&mut self, _: &str, _: f64) -> bool {
        self.accept()
    }
    fn set_string(&mut self, _: &str, _: &str) -> bool {
        self.accept()
    }
    fn set_rect(&mut self, _: &str, _: RectOffset) -> bool {
        self.accept()
    }
    fn set_list(&mut self, _: &str, _: Vec<ListEntry>) -> bool {
        self.accept()
    }
    fn append_child(&mut self, child: WidgetHandle) {
        self.children.push(child);
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory that accepts every type name.
struct AnyCatalog;

impl WidgetFactory for AnyCatalog {
    fn create(&self, type_name: &str) -> Option<WidgetHandle> {
        Some(Box::new(AnyWidget {
            type_name: type_name.to_owned(),
            ..AnyWidget::default()
        }))
    }
}

fn cmd_check(file: &Path, output: OutputFormat) -> i32 {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let filename = file.display().to_string();
    match weft_core::parse(&source, &filename, &AnyCatalog) {
        Ok(root) => {
            let (widgets, properties) = root
                .as_any()
                .downcast_ref::<AnyWidget>()
                .map(AnyWidget::count)
                .unwrap_or((0, 0));
            match output {
                OutputFormat::Text => {
                    println!(
                        "{}: ok ({} widgets, {} properties)",
                        filename, widgets, properties
                    );
                }
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({
                            "ok": true,
                            "file": filename,
                            "widgets": widgets,
                            "properties": properties,
                        })
                    );
                }
            }
            0
        }
        Err(err) => {
            match output {
                OutputFormat::Text => eprintln!("{}", err.render()),
                OutputFormat::Json => println!("{}", err.to_json_value()),
            }
            1
        }
    }
}

// ── tokens ───────────────────────────────────────────────────────────

fn describe(token: &Token) -> String {
    let body = match &token.kind {
        TokenKind::Eof => "eof".to_owned(),
        TokenKind::Eol => "eol".to_owned(),
        TokenKind::Whitespace => "whitespace".to_owned(),
        TokenKind::Str(text) => format!("string {:?}", text),
        TokenKind::Int { value, suffix } if suffix.is_empty() => format!("int {}", value),
        TokenKind::Int { value, suffix } => format!("int {} suffix {:?}", value, suffix),
        TokenKind::Float { value, suffix } if suffix.is_empty() => format!("float {}", value),
        TokenKind::Float { value, suffix } => format!("float {} suffix {:?}", value, suffix),
        TokenKind::Comment { multiline: true, .. } => "comment (block)".to_owned(),
        TokenKind::Comment { .. } => "comment".to_owned(),
        TokenKind::Ident(word) => format!("ident {}", word),
        TokenKind::Error(text) => format!("error {:?}", text),
        punct => format!("{:?}", punct).to_lowercase(),
    };
    format!("{}:{}\t{}", token.line, token.column, body)
}

fn cmd_tokens(file: &Path, output: OutputFormat) -> i32 {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let tokens = tokenize(&source);
    match output {
        OutputFormat::Text => {
            for token in &tokens {
                println!("{}", describe(token));
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&tokens) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize tokens: {}", e);
                return 1;
            }
        },
    }
    0
}
