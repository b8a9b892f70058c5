use anyhow::Result;
use application::alias_service_impl::{AliasAppService, AliasOutcome};
use domain::alias::entity::ResolutionState;
use serde::Serialize;

use crate::cli::OutputFormat;

/// JSON view of one resolved alias.
#[derive(Debug, Serialize)]
struct OutcomeView<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    state: ResolutionState,
    count: usize,
    entries: &'a [String],
    dependencies: &'a [String],
}

impl<'a> From<&'a AliasOutcome> for OutcomeView<'a> {
    fn from(o: &'a AliasOutcome) -> Self {
        Self {
            name: &o.name,
            kind: &o.kind,
            state: o.state,
            count: o.entries.len(),
            entries: &o.entries,
            dependencies: &o.dependencies,
        }
    }
}

// ── Resolve ─────────────────────────────────────────────────────────────

pub async fn cmd_resolve(
    service: &AliasAppService,
    aliases: &[String],
    force: bool,
    output: OutputFormat,
) -> Result<()> {
    let outcomes = service.resolve_all(aliases, force).await?;
    print!("{}", render_outcomes(&outcomes, output)?);
    Ok(())
}

fn render_outcomes(outcomes: &[AliasOutcome], output: OutputFormat) -> Result<String> {
    if output == OutputFormat::Json {
        let views: Vec<OutcomeView<'_>> = outcomes.iter().map(OutcomeView::from).collect();
        return Ok(format!("{}\n", serde_json::to_string_pretty(&views)?));
    }

    if outcomes.is_empty() {
        return Ok("No aliases configured.\n".to_string());
    }

    let mut out = format!(
        "{:<32} {:<14} {:<12} {:>8}\n",
        "NAME", "TYPE", "STATE", "ENTRIES"
    );
    for o in outcomes {
        out.push_str(&format!(
            "{:<32} {:<14} {:<12} {:>8}\n",
            o.name,
            o.kind,
            o.state.as_str(),
            o.entries.len()
        ));
    }
    let rolled_back = outcomes
        .iter()
        .filter(|o| o.state == ResolutionState::RolledBack)
        .count();
    out.push_str(&format!(
        "\n{} alias(es) resolved, {rolled_back} kept previous content.\n",
        outcomes.len()
    ));
    Ok(out)
}

// ── Show ────────────────────────────────────────────────────────────────

pub fn cmd_show(service: &AliasAppService, alias: &str, output: OutputFormat) -> Result<()> {
    let entries = service.cached_content(alias)?;

    if output == OutputFormat::Json {
        let doc = serde_json::json!({ "name": alias, "entries": entries });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{entry}");
    }
    Ok(())
}

// ── Dependencies ────────────────────────────────────────────────────────

pub fn cmd_deps(service: &AliasAppService, output: OutputFormat) -> Result<()> {
    print!("{}", render_deps(&service.dependencies(), output)?);
    Ok(())
}

fn render_deps(deps: &[(String, Vec<String>)], output: OutputFormat) -> Result<String> {
    if output == OutputFormat::Json {
        let map: serde_json::Map<String, serde_json::Value> = deps
            .iter()
            .map(|(name, d)| (name.clone(), serde_json::json!(d)))
            .collect();
        return Ok(format!("{}\n", serde_json::to_string_pretty(&map)?));
    }

    let mut out = String::new();
    for (name, d) in deps {
        let list = if d.is_empty() { "-".to_string() } else { d.join(", ") };
        out.push_str(&format!("{name:<32} {list}\n"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes() -> Vec<AliasOutcome> {
        vec![
            AliasOutcome {
                name: "drop".to_string(),
                kind: "urltable".to_string(),
                state: ResolutionState::RolledBack,
                entries: vec!["1.2.3.4".to_string()],
                dependencies: vec![],
            },
            AliasOutcome {
                name: "lan".to_string(),
                kind: "host".to_string(),
                state: ResolutionState::Resolved,
                entries: vec!["10.0.0.0/24".to_string(), "!10.0.0.5".to_string()],
                dependencies: vec!["servers".to_string()],
            },
        ]
    }

    #[test]
    fn table_lists_each_alias_and_summary() {
        let text = render_outcomes(&outcomes(), OutputFormat::Table).unwrap();
        assert!(text.starts_with("NAME"));
        assert!(text.contains("rolled_back"));
        assert!(text.contains("2 alias(es) resolved, 1 kept previous content."));
    }

    #[test]
    fn json_outcomes_carry_entries() {
        let text = render_outcomes(&outcomes(), OutputFormat::Json).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc[1]["type"], "host");
        assert_eq!(doc[1]["state"], "resolved");
        assert_eq!(doc[1]["count"], 2);
        assert_eq!(doc[1]["dependencies"][0], "servers");
    }

    #[test]
    fn empty_table_message() {
        assert_eq!(
            render_outcomes(&[], OutputFormat::Table).unwrap(),
            "No aliases configured.\n"
        );
    }

    #[test]
    fn deps_render_both_formats() {
        let deps = vec![
            ("a".to_string(), vec!["b".to_string(), "c".to_string()]),
            ("b".to_string(), vec![]),
        ];
        let table = render_deps(&deps, OutputFormat::Table).unwrap();
        assert!(table.contains("b, c"));
        assert!(table.lines().nth(1).unwrap().ends_with('-'));

        let json: serde_json::Value =
            serde_json::from_str(&render_deps(&deps, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["a"][1], "c");
        assert_eq!(json["b"].as_array().unwrap().len(), 0);
    }
}
