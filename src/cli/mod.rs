pub mod append;
pub mod init;
pub mod serve;
pub mod show;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "feebook", about = "Fee-collection form backed by a spreadsheet ledger.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose the upload directory and create the default fee register.
    Init {
        /// Directory for uploaded registers (default: ~/Documents/feebook/uploaded_excels)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Run the fee collection web form.
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:5000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print a fee register as a table.
    Show {
        /// Path to the .xlsx register
        file: String,
    },
    /// Append one record to a register without sending a notification.
    Append {
        /// Path to the .xlsx register
        file: String,
        /// Field value as name=value, using the form field names (repeatable)
        #[arg(long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
    /// Show settings and the default register.
    Status,
    /// Print shell completions.
    Completions {
        shell: Shell,
    },
}
