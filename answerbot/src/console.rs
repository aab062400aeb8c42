//! Console transport.
//!
//! A line-oriented protocol over stdin/stdout for one conversation:
//! - Lines starting with `#` are commands (start, reset, help, quit)
//! - Every other line is a message to the bot
//! - Bot messages are printed with a `[BOT]` prefix

use answer_core::{Reply, Responder, SessionId};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const CONSOLE_SESSION: &str = "console";

/// Run the chat loop until `#quit` or end of input.
pub async fn run_console(mut responder: Responder) -> anyhow::Result<()> {
    let session = SessionId::from(CONSOLE_SESSION);

    println!("=== Answer Bot ===");
    print_help();
    println!();
    print_reply(&responder.greeting());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            match command.split_whitespace().next() {
                Some("quit") | Some("exit") => {
                    println!("Goodbye!");
                    break;
                }
                Some("start") => {
                    responder.reset(&session);
                    print_reply(&responder.greeting());
                }
                Some("reset") => {
                    responder.reset(&session);
                    println!("[RESET] Conversation cleared");
                }
                Some("help") => print_help(),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            std::io::stdout().flush().ok();
            continue;
        }

        let reply = responder.handle_message(&session, line);
        print_reply(&reply);
    }

    tracing::info!("console session ended");
    Ok(())
}

fn print_reply(reply: &Reply) {
    for message in &reply.messages {
        println!("[BOT] {message}");
    }
    std::io::stdout().flush().ok();
}

fn print_help() {
    println!("[HELP]");
    println!("  #start  - Show the greeting and start over");
    println!("  #reset  - Forget the pending question");
    println!("  #help   - Show this help");
    println!("  #quit   - Exit");
    println!("  (anything else is sent as a message)");
}
