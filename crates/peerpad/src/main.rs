// Entry point: parse the startup configuration, start the node, run the
// interactive command loop.

use std::io::{self, Write};

use anyhow::Result;
use peerpad::config::{self, USAGE};
use peerpad::node::Node;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,peerpad=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match config::parse_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let node = Node::start(config).await?;
    repl(&node).await;
    node.shutdown().await;

    Ok(())
}

async fn repl(node: &Node) {
    println!("Commands: insert <index> <char>, delete <index>, show, peers, quit");

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("> ");
        io::stdout().flush().ok();

        input.clear();
        match stdin.read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            continue;
        };

        match command {
            "insert" => {
                if parts.len() < 3 {
                    println!("usage: insert <index> <char>");
                    continue;
                }
                let Ok(index) = parts[1].parse::<usize>() else {
                    println!("usage: insert <index> <char>");
                    continue;
                };
                node.insert(index, &parts[2..].join(" ")).await;
                println!("after insert, visible: {}", node.visible_text().await);
            }
            "delete" => {
                if parts.len() != 2 {
                    println!("usage: delete <index>");
                    continue;
                }
                let Ok(index) = parts[1].parse::<usize>() else {
                    println!("usage: delete <index>");
                    continue;
                };
                match node.delete(index).await {
                    Ok(()) => {
                        println!("after delete, visible: {}", node.visible_text().await);
                    }
                    Err(error) => println!("{error}"),
                }
            }
            "show" => {
                println!("Visible text: {}", node.visible_text().await);
                println!("Full replica (including deleted):");
                print!("{}", node.replica_dump().await);
            }
            "peers" => {
                println!("Peers: {:?}", node.peer_names().await);
            }
            "quit" => break,
            _ => println!("unknown cmd"),
        }
    }
}
