//! Get command: read option values in human-readable or JSON form.

use anyhow::Result;
use serde_json::{Map, Value};

use super::{Partitions, resolve_field};
use crate::config::{Field, Options};
use crate::storage::load_options;

/// Fields named on the command line, or every field for `all`.
fn requested_fields(names: &[String]) -> Result<Vec<Field>> {
    if names.len() == 1 && names[0] == "all" {
        return Ok(Field::ALL.to_vec());
    }
    let mut fields = Vec::with_capacity(names.len());
    for name in names {
        match resolve_field(name) {
            Some(field) => fields.push(field),
            None => anyhow::bail!("Unknown field '{}'", name),
        }
    }
    Ok(fields)
}

/// Render the selected fields keyed by their snake_case names.
pub fn render(options: &Options, fields: &[Field], json: bool) -> Result<String> {
    if json {
        let mut map = Map::new();
        for field in fields {
            map.insert(field.name().to_string(), options.get(*field).to_json());
        }
        return Ok(serde_json::to_string_pretty(&Value::Object(map))?);
    }
    Ok(fields
        .iter()
        .map(|f| format!("{} = {}", f.name(), options.get(*f)))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn handle_get_command(names: &[String], json: bool) -> Result<()> {
    // No version header: output is meant for scripts.
    let fields = requested_fields(names)?;
    let partitions = Partitions::open()?;
    let options = load_options(partitions.local.as_ref());
    println!("{}", render(&options, &fields, json)?);
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("get - Read option values");
    log_block_start!("Usage: detoxr get [--json] <field>... | all");
    log_block_start!("Fields:");
    for field in Field::ALL {
        log_indented!("{:<32} {}", field.name(), field.label());
    }
    log_block_start!("Examples:");
    log_indented!("detoxr get max_levels level_interval_minutes");
    log_indented!("detoxr get all --json");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain() {
        let options = Options::default();
        let text = render(&options, &[Field::MaxLevels, Field::Blur], false).unwrap();
        assert_eq!(text, "max_levels = 5\nblur_enabled = true");
    }

    #[test]
    fn test_render_json() {
        let options = Options::default();
        let text = render(&options, &[Field::LevelInterval, Field::MaxLevels], true).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["level_interval_minutes"], 5.0);
        assert_eq!(value["max_levels"], 5);
    }

    #[test]
    fn test_requested_fields() {
        assert_eq!(requested_fields(&["all".into()]).unwrap().len(), Field::ALL.len());
        assert_eq!(
            requested_fields(&["maxLevels".into()]).unwrap(),
            vec![Field::MaxLevels]
        );
        assert!(requested_fields(&["night_temp".into()]).is_err());
    }
}
