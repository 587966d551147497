use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use std::collections::BTreeSet;
use std::fmt::Display;
use tributary::analysis::{self, contains_redex, Residue};
use tributary::{Expression, KnownResources};

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn format_inspection(
        &self,
        expression: &Expression,
        normalized: &Expression,
        registry: &KnownResources,
    ) -> String {
        let mut output = String::new();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Property").set_alignment(CellAlignment::Left),
            Cell::new("Input").set_alignment(CellAlignment::Left),
            Cell::new("Normal form").set_alignment(CellAlignment::Left),
        ]));

        let rows: [(&str, String, String); 6] = [
            ("expression", expression.to_string(), normalized.to_string()),
            ("type", expression.ty.to_string(), normalized.ty.to_string()),
            (
                "depth",
                analysis::depth(expression).to_string(),
                analysis::depth(normalized).to_string(),
            ),
            (
                "nodes",
                analysis::node_count(expression).to_string(),
                analysis::node_count(normalized).to_string(),
            ),
            (
                "free variables",
                join(&analysis::free_variables(expression)),
                join(&analysis::free_variables(normalized)),
            ),
            (
                "redex",
                yes_no(contains_redex(expression, registry)),
                yes_no(contains_redex(normalized, registry)),
            ),
        ];
        for (name, input, normal) in rows {
            table.add_row(Row::from(vec![name.to_string(), input, normal]));
        }
        output.push_str(&table.to_string());
        output.push('\n');

        output.push_str(&self.format_residue(normalized));
        output.push('\n');
        output
    }

    fn format_residue(&self, normalized: &Expression) -> String {
        let residue = Residue::of(normalized);
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        let title = if residue.is_closed() {
            "Residue: closed"
        } else {
            "Residue: open"
        };
        table.set_header(Row::from(vec![Cell::new(title), Cell::new("")]));
        table.add_row(Row::from(vec![
            "resources".to_string(),
            join(&analysis::resources(normalized)),
        ]));
        table.add_row(Row::from(vec![
            "unbound".to_string(),
            join(&residue.unbound),
        ]));
        table.add_row(Row::from(vec![
            "opaque calls".to_string(),
            join(&residue.opaque_calls),
        ]));
        table.add_row(Row::from(vec![
            "opaque members".to_string(),
            join(&residue.opaque_members),
        ]));
        table.to_string()
    }

    pub fn format_registry(&self, registry: &KnownResources) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Member").set_alignment(CellAlignment::Left),
            Cell::new("URI").set_alignment(CellAlignment::Left),
            Cell::new("Signature").set_alignment(CellAlignment::Left),
            Cell::new("Inline").set_alignment(CellAlignment::Center),
        ]));

        for entry in registry.iter() {
            table.add_row(Row::from(vec![
                Cell::new(entry.member.to_string()),
                Cell::new(&entry.uri),
                Cell::new(entry.scheme.template.to_string()),
                Cell::new(yes_no(entry.has_inline_definition()))
                    .set_alignment(CellAlignment::Center),
            ]));
        }

        format!("{}\n{} known resource(s)\n", table, registry.len())
    }

    pub fn registry_json(&self, registry: &KnownResources) -> String {
        let entries: Vec<serde_json::Value> = registry
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "member": entry.member.to_string(),
                    "uri": entry.uri,
                    "signature": entry.scheme.template.to_string(),
                    "type_arguments": entry.scheme.arity,
                    "inline": entry.has_inline_definition(),
                })
            })
            .collect();
        serde_json::Value::Array(entries).to_string()
    }
}

fn join<T: Display>(items: &BTreeSet<T>) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}
