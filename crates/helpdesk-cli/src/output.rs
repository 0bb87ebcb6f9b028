//! Output formatting

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true).map_err(|_| format!("Unknown output format: {}", s))
    }
}

impl OutputFormat {
    /// Print a single record; tables fall back to pretty JSON
    pub fn print<T: Serialize>(&self, data: &T) {
        match self {
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            OutputFormat::Json | OutputFormat::Table => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
        }
    }

    /// Print a list; `T` is the serialized form, `R` its table row
    pub fn print_rows<T, R>(&self, data: &[T], row: impl Fn(&T) -> R)
    where
        T: Serialize,
        R: Tabled,
    {
        match self {
            OutputFormat::Table if data.is_empty() => println!("{}", "(none)".dimmed()),
            OutputFormat::Table => {
                let mut table = Table::new(data.iter().map(row));
                table.with(Style::rounded());
                println!("{}", table);
            }
            _ => self.print(&data),
        }
    }
}

pub fn success(message: impl AsRef<str>) {
    println!("{} {}", "✓".green(), message.as_ref());
}

pub fn warning(message: impl AsRef<str>) {
    println!("{} {}", "!".yellow(), message.as_ref());
}
