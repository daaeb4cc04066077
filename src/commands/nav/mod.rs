use anyhow::Result;
use clap::Parser;

use crate::permissions::visible_navigation;
use crate::session::Session;
use crate::utils::format_table;

#[derive(Debug, Parser)]
#[clap(about = "List the sections available to the current user")]
pub struct Options {
    #[clap(short = 'q', long = "quiet", help = "Only print the section names")]
    pub quiet: bool,
}

pub fn handle(options: &Options, session: &Session) -> Result<()> {
    let items = visible_navigation(&session.roles);

    if items.is_empty() {
        log::warn!("Your account has no sections available, ask an administrator for access");

        return Ok(());
    }

    if options.quiet {
        let labels = items.iter().map(|item| item.label).collect::<Vec<_>>();

        println!("{}", labels.join(" "));

        return Ok(());
    }

    let rows = items
        .iter()
        .map(|item| format!("{}\t{}\t{}", item.label, item.href, item.required))
        .collect::<Vec<_>>();

    println!("{}", format_table(Some("SECTION\tPATH\tPERMISSION"), &rows)?.join("\n"));

    Ok(())
}
