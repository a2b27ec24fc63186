//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use clap::{App, Arg};
use holo_protocol::test::setup;
use holo_protocol::test::stub::start_test_instance;
use holo_protocol::ProtocolInstance;
use holo_utils::protocol::Protocol;

async fn replay<P: ProtocolInstance>(filename: &str) {
    // Spawn protocol instance.
    let stub = start_test_instance::<P>("replay").await;

    // Push events from the record file.
    for msg in std::fs::read_to_string(filename)
        .expect("Unable to read record file")
        .lines()
    {
        let msg = serde_json::from_str(msg)
            .expect("Failed to parse instance message");
        stub.send(msg).await;
    }

    // Close protocol instance.
    stub.close().await;
}

#[tokio::main]
async fn main() {
    // Parse command-line parameters.
    let matches = App::new("Replay events")
        .about("Replay events from a record file")
        .arg(
            Arg::with_name("PROTOCOL")
                .long("protocol")
                .help("Protocol name (e.g. BGP, OSPFv2)")
                .value_name("PROTOCOL")
                .required(true),
        )
        .arg(
            Arg::with_name("FILENAME")
                .help("Events file path")
                .required(true)
                .index(1),
        )
        .get_matches();
    let protocol = matches.value_of("PROTOCOL").unwrap();
    let protocol = Protocol::from_str(protocol).expect("Unknown protocol");
    let filename = matches.value_of("FILENAME").unwrap();

    // Setup test environment.
    setup();

    // Replay events.
    match protocol {
        Protocol::PIM => replay::<holo_pim::instance::Instance>(filename).await,
        Protocol::BFD
        | Protocol::BGP
        | Protocol::DIRECT
        | Protocol::ISIS
        | Protocol::LDP
        | Protocol::OSPFV2
        | Protocol::OSPFV3
        | Protocol::RIPV2
        | Protocol::RIPNG
        | Protocol::STATIC
        | Protocol::VRRP => {
            eprintln!("Unsupported protocol type");
            std::process::exit(1);
        }
    }
}
