use clap::Parser;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version, about = "Prepare the sandbox environment and launch a desktop application", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Launch the packaged binary with its own flags
    stagehand $SNAP/usr/bin/myapp --maximized

    # Verbose preparation (shows skipped steps and cache refreshes)
    stagehand -v $SNAP/usr/bin/myapp
")]
pub struct Cli {
    /// Binary to launch
    #[arg(value_name = "BINARY")]
    pub binary: String,

    /// Arguments forwarded verbatim to the binary
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
