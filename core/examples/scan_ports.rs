//! Example: Scan listening ports and show them by category.

use portpilot_core::{categorize, PortScanner};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("Scanning ports...\n");

    let scanner = PortScanner::new();
    let ports = scanner.scan().await;

    if ports.is_empty() {
        println!("No listening ports found.");
        return;
    }

    for (bucket, members) in categorize(&ports).iter() {
        println!("{} ({})", bucket.label(), members.len());
        println!("{:<6} {:<8} {:<20} {:<10} COMMAND", "PORT", "PID", "PROCESS", "RUNTIME");
        println!("{}", "-".repeat(80));

        for port in members {
            let name: String = port.name.chars().take(20).collect();
            let command = if port.command.chars().count() > 40 {
                format!("{}...", port.command.chars().take(40).collect::<String>())
            } else {
                port.command.clone()
            };

            println!(
                "{:<6} {:<8} {:<20} {:<10} {}",
                port.port,
                port.pid,
                name,
                port.runtime(),
                command
            );
        }
        println!();
    }

    println!("Total: {} ports", ports.len());
}
