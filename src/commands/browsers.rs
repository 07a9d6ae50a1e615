use colored::Colorize;

use crate::browser::discover_all_browsers;
use crate::cli::Cli;
use crate::error::Result;

pub fn run(cli: &Cli) -> Result<()> {
    let browsers = discover_all_browsers();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&browsers)?);
        return Ok(());
    }

    if browsers.is_empty() {
        println!("{}", "No Chromium-family browser found.".red());
        return Ok(());
    }

    println!("{}", "Discovered browsers".bold());
    for browser in browsers {
        println!(
            "  {} {} {} {}",
            "●".cyan(),
            browser.browser_type.name().bold(),
            browser.path.display(),
            browser
                .version
                .as_deref()
                .unwrap_or("unknown version")
                .dimmed()
        );
    }

    Ok(())
}
