// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(
    all(not(debug_assertions), not(feature = "headless")),
    windows_subsystem = "windows"
)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docmark_core::ConverterEngine;

#[derive(Parser, Debug)]
#[command(name = "docmark")]
#[command(about = "Convert PDF, Word, PowerPoint and HTML documents to Markdown")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one document without opening a window
    Convert {
        /// Document to convert
        path: PathBuf,

        /// Conversion engine (docling or native), overrides saved settings
        #[arg(long)]
        engine: Option<ConverterEngine>,

        /// Write Markdown to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Convert {
            path,
            engine,
            output,
        }) => {
            let code = docmark_lib::headless::run(path, engine, output);
            std::process::exit(code);
        }
        None => docmark_lib::run(),
    }
}
