pub mod commands;
pub mod config;
pub mod permissions;
pub mod resources;
pub mod session;
pub mod state;
pub mod store;
pub mod utils;

use clap::Parser;
use commands::Commands;

#[derive(Debug, Parser)]
#[clap(
    name = "vendaplus",
    about = "Manage your VendaPlus CRM from the terminal",
    version,
    author
)]
pub struct CLI {
    #[clap(subcommand)]
    pub commands: Commands,

    #[clap(
        long = "api-url",
        help = "Backend API URL to use for this command",
        global = true,
        hide = true
    )]
    pub api_url: Option<String>,

    #[clap(
        short = 'v',
        long = "verbose",
        help = "Print more information",
        global = true
    )]
    pub verbose: bool,
}
