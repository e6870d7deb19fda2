use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "minichain-cli")]
#[command(about = "CLI client for the minichain node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct Node {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    node: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole chain
    Chain {
        #[command(flatten)]
        node: Node,
    },
    /// Print transactions waiting for the next block
    Pending {
        #[command(flatten)]
        node: Node,
    },
    /// Submit a transaction to the pool
    Submit {
        #[command(flatten)]
        node: Node,
        /// Sender
        #[arg(long)]
        sender: String,
        /// Receiver
        #[arg(long)]
        receiver: String,
        /// Amount
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
    },
    /// Mine a block from the current pool
    Mine {
        #[command(flatten)]
        node: Node,
    },
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    receiver: String,
    amount: i64,
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let res = match cli.cmd {
        Command::Chain { node } => client.get(format!("{}/api/blockchain", node.node)).send(),
        Command::Pending { node } => client.get(format!("{}/api/pending", node.node)).send(),
        Command::Submit {
            node,
            sender,
            receiver,
            amount,
        } => {
            let tx = Tx {
                sender,
                receiver,
                amount,
            };
            client
                .post(format!("{}/api/transaction", node.node))
                .json(&tx)
                .send()
        }
        Command::Mine { node } => client.post(format!("{}/api/mine", node.node)).send(),
    };
    let res = res.await?;
    debug!(url = %res.url(), "response received");
    print_response(res).await
}
