//! Output formatting

use crate::domain::display::DisplayContent;
use crate::error::{Error, Result};
use crate::handlers::{ArgMap, FORMAT_KEY};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::{Map, Value};

/// Output format selected with the `format=` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Array of header-keyed objects
    Json,
}

impl OutputFormat {
    pub fn from_args(args: &ArgMap) -> Result<Self> {
        match args.get(FORMAT_KEY) {
            None => Ok(Self::default()),
            Some(value) => <Self as ValueEnum>::from_str(value, true).map_err(|_| {
                Error::Argument(format!(
                    "invalid value of format '{}' is provided, expected table or json",
                    value
                ))
            }),
        }
    }
}

/// Render tabulated results in the requested format
pub fn render(content: &DisplayContent, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(content)),
        OutputFormat::Json => render_json(content),
    }
}

fn render_table(content: &DisplayContent) -> String {
    if content.is_empty() {
        return "No items found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(&content.header);
    for row in &content.rows {
        table.add_row(row);
    }

    table.to_string()
}

fn render_json(content: &DisplayContent) -> Result<String> {
    let records: Vec<Value> = content
        .rows
        .iter()
        .map(|row| {
            let record: Map<String, Value> = content
                .header
                .iter()
                .zip(row)
                .map(|(h, v)| (h.clone(), Value::String(v.clone())))
                .collect();
            Value::Object(record)
        })
        .collect();

    Ok(serde_json::to_string_pretty(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> DisplayContent {
        DisplayContent {
            header: vec!["ID".into(), "STATE".into()],
            rows: vec![vec!["v1".into(), "deleted".into()]],
        }
    }

    #[test]
    fn test_format_from_args() {
        let mut args = ArgMap::new();
        assert_eq!(OutputFormat::from_args(&args).unwrap(), OutputFormat::Table);

        args.insert("format".into(), "JSON".into());
        assert_eq!(OutputFormat::from_args(&args).unwrap(), OutputFormat::Json);

        args.insert("format".into(), "xml".into());
        assert!(OutputFormat::from_args(&args).is_err());
    }

    #[test]
    fn test_table_contains_cells() {
        let rendered = render(&content(), OutputFormat::Table).unwrap();
        assert!(rendered.contains("STATE"));
        assert!(rendered.contains("deleted"));

        let empty = DisplayContent {
            header: vec!["ID".into()],
            rows: vec![],
        };
        assert_eq!(render(&empty, OutputFormat::Table).unwrap(), "No items found.");
    }

    #[test]
    fn test_json_is_header_keyed() {
        let rendered = render(&content(), OutputFormat::Json).unwrap();
        let parsed: Vec<Map<String, Value>> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed[0]["ID"], "v1");
        assert_eq!(parsed[0]["STATE"], "deleted");
    }
}
