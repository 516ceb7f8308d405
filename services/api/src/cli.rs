use crate::demo::{run_demo, run_queue_board, DemoArgs, QueueBoardArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rx_triage::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Pharmacy Triage Service",
    about = "Run and demonstrate the pharmacy order triage service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a backlog and inspect the triage queue without serving
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },
    /// Run an end-to-end CLI demo covering triage and capture checks
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum QueueCommand {
    /// Print the prioritized board for a backlog export
    Board(QueueBoardArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Queue {
            command: QueueCommand::Board(args),
        } => run_queue_board(args),
        Command::Demo(args) => run_demo(args),
    }
}
