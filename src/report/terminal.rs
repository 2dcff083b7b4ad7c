use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::Compiled;

/// Render what was detected, followed by every advisory collected on the way.
pub fn render(compiled: &Compiled, path: &Path, quiet: bool) {
    let ctx = &compiled.context;

    if quiet {
        println!(
            "Stack: {}  Version: {}  Databases: {}  Advisories: {}",
            compiled.pack,
            compiled.version,
            ctx.dbs.len(),
            ctx.messages.len().to_string().yellow(),
        );
        return;
    }

    println!(
        "\n {} v{}",
        "stack-starter".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Project: {}\n", path.display());

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "DETECTED".bold());
    println!(
        " │  {:<48} │",
        format!("Stack        : {} (pack {})", compiled.pack, compiled.pack_version)
    );
    println!(" │  {:<48} │", format!("Image tag    : {}", compiled.version));
    println!(" │  {:<48} │", format!("Databases    : {}", list_or_none(&ctx.dbs)));
    println!(
        " │  {:<48} │",
        format!("Packages     : {}", list_or_none(&compiled.packages))
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    println!(" {} Services:\n", "[SERVICES]".cyan().bold());
    render_services(compiled);
    println!();

    if !ctx.messages.is_empty() {
        println!(" {} Things to check before deploying:\n", "[ADVISORY]".yellow().bold());
        for message in &ctx.messages {
            println!("  {} {}", "⚠".yellow(), message);
        }
        println!();
    }
}

fn render_services(compiled: &Compiled) {
    let ctx = &compiled.context;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Command").add_attribute(Attribute::Bold),
            Cell::new("Ports").add_attribute(Attribute::Bold),
            Cell::new("Environment").add_attribute(Attribute::Bold),
        ]);

    for service in &ctx.services {
        let command = if service.command.is_empty() {
            Cell::new("(from Procfile)").fg(Color::DarkGrey)
        } else {
            Cell::new(&service.command)
        };
        let env: Vec<String> = ctx
            .env_for(service)
            .map(|var| format!("{}={}", var.key, var.value))
            .collect();

        table.add_row(vec![
            Cell::new(&service.name),
            command,
            Cell::new(service.ports.join("\n")),
            Cell::new(env.join("\n")),
        ]);
    }

    println!("{}", table);
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_or_none() {
        assert_eq!(list_or_none(&[]), "none");
        assert_eq!(
            list_or_none(&["mysql".to_string(), "redis".to_string()]),
            "mysql, redis"
        );
    }
}
