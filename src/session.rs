//! Line-driven session driving the project create form

use crate::projects::{ProjectForm, ProjectStore};
use anyhow::{anyhow, bail, Result};
use schemaform::{SubmitEvent, SubmitOutcome};
use serde_json::Value;
use std::fmt::Write as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const HELP_TEXT: &str = "\
Commands:
  set <field> <json|text>   write a value without validating
  unset <field>             make a value undefined
  type <field> <text>       type text into a field, one keystroke at a time
  backspace <field>         delete the last character
  change <field>            commit the current value (change event)
  blur <field>              leave a field (blur event)
  next | prev               move focus, blurring the field left behind
  validate                  validate the whole form
  submit                    submit the form
  reset                     restore defaults
  fields | state | projects show fields, form state or stored projects
  help | quit";

/// One session command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { field: String, value: Option<Value> },
    Type { field: String, text: String },
    Backspace { field: String },
    Change { field: String },
    Blur { field: String },
    Next,
    Prev,
    Validate,
    Submit,
    Reset,
    Fields,
    State,
    Projects,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let field = || {
            rest.split_whitespace()
                .next()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("'{verb}' needs a field name"))
        };
        let field_and_text = |usage: &str| {
            rest.split_once(char::is_whitespace)
                .map(|(field, text)| (field.to_string(), text.trim_start().to_string()))
                .ok_or_else(|| anyhow!("usage: {usage}"))
        };

        let command = match verb {
            "set" => {
                let (field, raw) = field_and_text("set <field> <value>")?;
                Command::Set {
                    field,
                    value: Some(parse_value(&raw)),
                }
            }
            "unset" => Command::Set {
                field: field()?,
                value: None,
            },
            "type" => {
                let (field, text) = field_and_text("type <field> <text>")?;
                Command::Type { field, text }
            }
            "backspace" => Command::Backspace { field: field()? },
            "change" => Command::Change { field: field()? },
            "blur" => Command::Blur { field: field()? },
            "next" => Command::Next,
            "prev" => Command::Prev,
            "validate" => Command::Validate,
            "submit" => Command::Submit,
            "reset" => Command::Reset,
            "fields" => Command::Fields,
            "state" => Command::State,
            "projects" => Command::Projects,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => bail!("empty command"),
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(command)
    }
}

/// JSON when it parses as JSON, plain text otherwise
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Render fields with focus marker, flags and errors
pub fn render_fields(form: &ProjectForm) -> String {
    let mut out = String::new();
    for (index, field) in form.fields().iter().enumerate() {
        let marker = if index == form.active_field_index() {
            '>'
        } else {
            ' '
        };
        let value = match field.value() {
            None => "(undefined)".to_string(),
            Some(_) => format!("{:?}", field.display_value()),
        };
        let _ = write!(out, "{marker} {}: {value}", field.label());
        if field.is_touched() {
            out.push_str(" [touched]");
        }
        if field.is_dirty() {
            out.push_str(" [dirty]");
        }
        out.push('\n');
        for error in field.errors() {
            let _ = writeln!(out, "    ! {error}");
        }
    }
    for error in form.global_errors() {
        let _ = writeln!(out, "  ! {error}");
    }
    if let Some(errors) = form.errors().submit_errors() {
        for error in errors {
            let _ = writeln!(out, "  submit failed: {error}");
        }
    }
    out.trim_end().to_string()
}

/// Apply a command and describe the result
pub async fn execute(form: &mut ProjectForm, store: &ProjectStore, command: Command) -> Result<String> {
    let output = match command {
        Command::Set { field, value } => {
            form.set_field_value(&field, value);
            render_fields(form)
        }
        Command::Type { field, text } => {
            for c in text.chars() {
                form.input_char(&field, c).await;
            }
            render_fields(form)
        }
        Command::Backspace { field } => {
            form.delete_char(&field).await;
            render_fields(form)
        }
        Command::Change { field } => {
            form.handle_change(&field).await;
            render_fields(form)
        }
        Command::Blur { field } => {
            form.handle_blur(&field).await;
            render_fields(form)
        }
        Command::Next => {
            form.focus_next().await;
            render_fields(form)
        }
        Command::Prev => {
            form.focus_prev().await;
            render_fields(form)
        }
        Command::Validate => {
            let verdict = if form.validate().await {
                "valid"
            } else {
                "invalid"
            };
            format!("{verdict}\n{}", render_fields(form))
        }
        Command::Submit => {
            let mut event = SubmitEvent::new();
            match form.handle_submit(&mut event).await {
                SubmitOutcome::Submitted => {
                    form.reset();
                    format!("submitted; {} project(s) stored", store.list().await.len())
                }
                SubmitOutcome::Rejected => "form is not submittable right now".to_string(),
                SubmitOutcome::Invalid => format!("fix these fields first\n{}", render_fields(form)),
                SubmitOutcome::Failed { errors } => {
                    format!("submission failed: {}", errors.join("; "))
                }
            }
        }
        Command::Reset => {
            form.reset();
            render_fields(form)
        }
        Command::Fields => render_fields(form),
        Command::State => serde_json::to_string_pretty(&form.state())?,
        Command::Projects => serde_json::to_string_pretty(&store.list().await)?,
        Command::Help => HELP_TEXT.to_string(),
        Command::Quit => String::new(),
    };
    Ok(output)
}

/// Read commands line by line until `quit` or end of input
pub async fn run<R, W>(
    form: &mut ProjectForm,
    store: &ProjectStore,
    reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(b"schemaform project session; type 'help' for commands\n")
        .await?;
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let output = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(form, store, command)
                .await
                .unwrap_or_else(|err| format!("error: {err}")),
            Err(err) => format!("error: {err}"),
        };
        writer.write_all(output.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
