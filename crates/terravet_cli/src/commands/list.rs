//! List command - Show the scenarios of a suite file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use terravet_iac::{ConfigTree, Suite, SUITE_FILE};

#[derive(Args)]
pub struct ListArgs {
    /// Suite file
    #[arg(short, long, default_value = SUITE_FILE)]
    suite: PathBuf,
}

pub async fn execute(args: ListArgs) -> Result<()> {
    let suite = Suite::load(&args.suite)
        .with_context(|| format!("Failed to load suite {:?}", args.suite))?;

    println!("Scenarios in {}:", args.suite.display());
    println!();

    for scenario in &suite.scenarios {
        let files = if scenario.target_dir.is_dir() {
            match ConfigTree::scan(&scenario.target_dir) {
                Ok(tree) => format!("{} file(s)", tree.len()),
                Err(e) => format!("unreadable: {}", e),
            }
        } else {
            "missing".to_string()
        };

        println!(
            "  {:<32} expect {:<4}  {} ({})",
            scenario.name,
            scenario.expected.to_string(),
            scenario.target_dir.display(),
            files
        );
    }

    println!();
    println!("Binary: {}", suite.terraform.binary);
    Ok(())
}
