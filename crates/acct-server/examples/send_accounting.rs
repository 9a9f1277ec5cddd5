use acct_proto::{
    sign_accounting_request, verify_response_authenticator, AcctStatusType, Attribute,
    AttributeType, Code, Packet,
};
use std::net::UdpSocket;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} <username> <session-id> <start|stop|interim> <secret> [server_addr]",
            args[0]
        );
        eprintln!("Example: {} alice abc123 start testing123 127.0.0.1:1813", args[0]);
        std::process::exit(1);
    }

    let username = &args[1];
    let session_id = &args[2];
    let status = match args[3].as_str() {
        "start" => AcctStatusType::Start,
        "stop" => AcctStatusType::Stop,
        "interim" => AcctStatusType::InterimUpdate,
        other => {
            eprintln!("Unknown status type: {}", other);
            std::process::exit(1);
        }
    };
    let secret = args[4].as_bytes();
    let server_addr = args.get(5).map(|s| s.as_str()).unwrap_or("127.0.0.1:1813");

    println!("RADIUS Accounting Client");
    println!("========================");
    println!("Server: {}", server_addr);
    println!("Username: {}", username);
    println!("Session: {}", session_id);
    println!("Status: {}", status);
    println!();

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(server_addr)?;

    let identifier = (std::process::id() & 0xff) as u8;
    let mut packet = Packet::new(Code::AccountingRequest, identifier, [0u8; 16]);
    packet.add_attribute(Attribute::string(AttributeType::UserName as u8, username.as_str())?);
    packet.add_attribute(Attribute::ipv4(AttributeType::NasIpAddress as u8, [127, 0, 0, 1])?);
    packet.add_attribute(Attribute::integer(AttributeType::NasPort as u8, 0)?);
    packet.add_attribute(Attribute::integer(AttributeType::AcctStatusType as u8, status.as_u32())?);
    packet.add_attribute(Attribute::string(AttributeType::AcctSessionId as u8, session_id.as_str())?);

    let request_data = sign_accounting_request(&mut packet, secret)?;
    println!("Sending Accounting-Request ({} bytes)...", request_data.len());
    socket.send(&request_data)?;

    let mut buffer = vec![0u8; 4096];
    socket.set_read_timeout(Some(std::time::Duration::from_secs(5)))?;

    match socket.recv(&mut buffer) {
        Ok(len) => {
            println!("Received response ({} bytes)", len);

            let response = Packet::decode(&buffer[..len])?;

            if response.code != Code::AccountingResponse {
                println!("\n? Unexpected response: {}", response.code);
            } else if verify_response_authenticator(&response, &packet.authenticator, secret) {
                println!("\n✓ Accounting-Response received and verified");
            } else {
                println!("\n✗ Accounting-Response authenticator mismatch (wrong secret?)");
            }

            println!("\nResponse Details:");
            println!("  Identifier: {}", response.identifier);
            println!("  Attributes: {}", response.attributes.len());

            Ok(())
        }
        Err(e) => {
            eprintln!("\n✗ No response from server: {}", e);
            eprintln!("  Make sure the accounting server is running on {}", server_addr);
            Err(e.into())
        }
    }
}
