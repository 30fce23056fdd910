//! `plugcheck rules`: print the classifier tables.

use plugcheck_compat::classifier::{binary_rules, command_rules};

pub fn handle_rules(json: bool) -> anyhow::Result<()> {
    if json {
        let commands: Vec<_> = command_rules()
            .iter()
            .map(|rule| {
                serde_json::json!({
                    "signal": rule.signal,
                    "pattern": rule.pattern(),
                    "detail": rule.detail,
                    "impact": rule.impact,
                })
            })
            .collect();
        let out = serde_json::json!({
            "command_rules": commands,
            "binary_rules": binary_rules(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Shell-line rules (first match wins):");
    for (idx, rule) in command_rules().iter().enumerate() {
        println!(
            "  {:>2}. {:<14} {}  /{}/",
            idx + 1,
            rule.signal,
            rule.impact,
            rule.pattern()
        );
    }
    println!("\nExecutable rules (exact name):");
    for rule in binary_rules() {
        println!("  {:<8} {}  {}", rule.binary, rule.impact, rule.detail);
    }
    Ok(())
}
