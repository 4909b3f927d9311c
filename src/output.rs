// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::operation::{Operation, OperationResult, Property, PropertyValue};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::{self, Write};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with labels and timing
    Normal,
    /// Values only, for scripts and CI
    Quiet,
    /// One JSON document per command
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output<W: Write> {
    mode: OutputMode,
    out: W,
}

impl Output<io::Stdout> {
    pub fn stdout(mode: OutputMode) -> Self {
        Self::new(mode, io::stdout())
    }
}

impl<W: Write> Output<W> {
    pub fn new(mode: OutputMode, out: W) -> Self {
        Self { mode, out }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn json<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        writeln!(self.out, "{text}")
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&mut self, message: &str) -> io::Result<()> {
        if self.mode == OutputMode::Normal {
            writeln!(self.out, "{message}")?;
        }
        Ok(())
    }

    /// `id  label` per operation.
    pub fn operations<'a>(
        &mut self,
        operations: impl Iterator<Item = &'a dyn Operation>,
    ) -> io::Result<()> {
        let rows: Vec<OperationRow<'_>> = operations
            .map(|op| OperationRow {
                id: op.id(),
                label: op.label(),
                internal: op.internal(),
            })
            .collect();

        match self.mode {
            OutputMode::Json => self.json(&rows),
            OutputMode::Quiet => rows.iter().try_for_each(|row| writeln!(self.out, "{}", row.id)),
            OutputMode::Normal => {
                let width = rows.iter().map(|r| r.id.len()).max().unwrap_or(0);
                for row in &rows {
                    writeln!(self.out, "{:width$}  {}", row.id, row.label)?;
                }
                Ok(())
            }
        }
    }

    /// Label, description, help and externally visible properties of one operation.
    pub fn operation_info(&mut self, operation: &dyn Operation) -> io::Result<()> {
        let properties: Vec<PropertyRow<'_>> = operation
            .properties()
            .external()
            .map(PropertyRow::from)
            .collect();

        if self.mode == OutputMode::Json {
            return self.json(&OperationInfo {
                id: operation.id(),
                label: operation.label(),
                description: operation.description(),
                help: operation.help(),
                properties,
            });
        }

        writeln!(self.out, "{} - {}", operation.id(), operation.label())?;
        if self.mode == OutputMode::Quiet {
            return Ok(());
        }
        writeln!(self.out, "{}", operation.description())?;
        if !operation.help().is_empty() {
            writeln!(self.out, "\n{}", operation.help())?;
        }
        if !properties.is_empty() {
            writeln!(self.out, "\nProperties:")?;
            for row in &properties {
                let mut flags = vec![row.kind.clone()];
                if row.required {
                    flags.push("required".to_string());
                }
                if row.output {
                    flags.push("output".to_string());
                }
                write!(self.out, "  {} ({})", row.id, flags.join(", "))?;
                if let Some(ref default) = row.default {
                    write!(self.out, " [default: {default}]")?;
                }
                writeln!(self.out)?;
                let text = if row.description.is_empty() {
                    row.label
                } else {
                    row.description
                };
                if !text.is_empty() {
                    writeln!(self.out, "      {text}")?;
                }
            }
        }
        Ok(())
    }

    /// Result of a run plus the non-empty output properties.
    pub fn result(&mut self, result: &OperationResult, operation: &dyn Operation) -> io::Result<()> {
        let outputs: IndexMap<&str, &PropertyValue> = operation
            .properties()
            .outputs()
            .filter_map(|p| p.get().filter(|v| !v.is_empty()).map(|v| (p.id(), v)))
            .collect();

        match self.mode {
            OutputMode::Json => self.json(&RunReport {
                result,
                properties: outputs,
            }),
            OutputMode::Quiet => {
                for value in outputs.values() {
                    writeln!(self.out, "{value}")?;
                }
                Ok(())
            }
            OutputMode::Normal => {
                for (id, value) in &outputs {
                    let text = value.to_string();
                    if text.contains('\n') {
                        writeln!(self.out, "{id}:")?;
                        for line in text.lines() {
                            writeln!(self.out, "  {line}")?;
                        }
                    } else {
                        writeln!(self.out, "{id}: {text}")?;
                    }
                }
                let status = if result.success { "ok" } else { "failed" };
                writeln!(
                    self.out,
                    "{} {} ({:.1}s)",
                    result.operation,
                    status,
                    result.duration.as_secs_f64()
                )
            }
        }
    }
}

#[derive(Serialize)]
struct OperationRow<'a> {
    id: &'a str,
    label: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    internal: bool,
}

#[derive(Serialize)]
struct PropertyRow<'a> {
    id: &'a str,
    label: &'a str,
    description: &'a str,
    kind: String,
    required: bool,
    output: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
}

impl<'a> From<&'a Property> for PropertyRow<'a> {
    fn from(property: &'a Property) -> Self {
        let usage = property.get_usage();
        Self {
            id: property.id(),
            label: property.get_label(),
            description: property.get_description(),
            kind: property.kind().to_string(),
            required: usage.required,
            output: usage.read_only,
            default: property.get().map(|v| v.to_string()),
        }
    }
}

#[derive(Serialize)]
struct OperationInfo<'a> {
    id: &'a str,
    label: &'a str,
    description: &'a str,
    help: &'a str,
    properties: Vec<PropertyRow<'a>>,
}

#[derive(Serialize)]
struct RunReport<'a> {
    #[serde(flatten)]
    result: &'a OperationResult,
    properties: IndexMap<&'a str, &'a PropertyValue>,
}
