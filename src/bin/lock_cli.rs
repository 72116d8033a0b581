// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, Subcommand};

use lock_protocol::commands::{self, EjectStrategy};
use lock_protocol::{Client, Endpoint, SystemClock};

#[derive(Debug, Parser)]
struct Cli {
    #[arg(long, default_value = "localhost")]
    host: String,

    #[arg(long, default_value_t = 9000)]
    port: u16,

    /// Request the peer skip LRC verification on outbound frames.
    #[arg(long)]
    lrc_skip: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a bare ENQ and report whether the peer is ready.
    Ping,

    /// Send a Checkout ("CO") command for the given room.
    Checkout {
        #[arg(long)]
        room: String,
    },

    /// Send a ReadCard ("LT") command and print the decoded card details.
    ReadCard {
        #[arg(long)]
        encoder: String,
    },

    /// Fetch the full audit trail for a door.
    Audit {
        #[arg(long)]
        door: String,

        /// The peer's configured date format: true for `dd/mm`, false for `mm/dd`.
        #[arg(long, default_value_t = true)]
        day_first: bool,
    },
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    let endpoint = Endpoint {
        host: args.host.clone(),
        port: args.port,
    };
    let client = Client::new(endpoint, args.lrc_skip);

    let result = match args.command {
        Command::Ping => run_ping(&client),
        Command::Checkout { room } => run_checkout(&client, &room),
        Command::ReadCard { encoder } => run_read_card(&client, &encoder),
        Command::Audit { door, day_first } => run_audit(&client, &door, day_first),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_ping(client: &Client) -> Result<(), lock_protocol::Error> {
    let ready = client.is_ready()?;
    println!("ready: {ready}");
    Ok(())
}

fn run_checkout(client: &Client, room: &str) -> Result<(), lock_protocol::Error> {
    let message = commands::checkout(room);
    let response = client.send(&message)?;
    print_response(&response);
    Ok(())
}

fn run_read_card(client: &Client, encoder: &str) -> Result<(), lock_protocol::Error> {
    let message = commands::read_card(encoder, EjectStrategy::Eject);
    let response = client.send(&message)?;

    if !response.is_framed() {
        println!("unexpected bare acknowledgement");
        return Ok(());
    }

    let decoded = response.message();
    if decoded.is_error() {
        println!("peer error: {}", decoded.error_message().unwrap_or_default());
        return Ok(());
    }
    let details = lock_protocol::CardDetails::new(decoded);
    match details.card_type() {
        Ok(card_type) => println!("card type: {card_type:?}"),
        Err(e) => println!("could not decode card details: {e}"),
    }
    if let Ok(rooms) = details.rooms() {
        println!("rooms: {}", rooms.join(", "));
    }

    Ok(())
}

fn run_audit(client: &Client, door: &str, day_first: bool) -> Result<(), lock_protocol::Error> {
    let records = lock_protocol::audit::fetch(client, door)?;
    let clock = SystemClock;

    for record in &records {
        if record.is_terminal() {
            println!("-- end of trail ({door}) --");
            continue;
        }
        match record.datetime(day_first, &clock) {
            Ok(dt) => println!(
                "{:04}-{:02}-{:02} {:02}:{:02} door={}",
                dt.year,
                dt.month,
                dt.day,
                dt.hour,
                dt.minute,
                record.door().unwrap_or_default()
            ),
            Err(e) => println!("malformed record: {e}"),
        }
    }

    Ok(())
}

fn print_response(response: &lock_protocol::Response) {
    if response.is_ack() {
        println!("ACK");
    } else if response.is_nak() {
        println!("NAK (retries exhausted)");
    } else {
        let message = response.message();
        if message.is_error() {
            println!("peer error: {}", message.error_message().unwrap_or_default());
        } else {
            println!("ok: {:?}", message.command());
        }
    }
}
