//! Walk every device, service, and action visible on the local network.
//!
//! Run with `RUST_LOG=upnp_client=debug` for the wire-level view.

use upnp_client::{discover, SearchTarget};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut found = 0;
    for (location, device) in discover(SearchTarget::All)? {
        found += 1;
        println!("{}  <{}>", device, location);
        for service in device.services() {
            println!("    {}", service.service_type());
            for action in service.actions() {
                println!("        {}", action);
            }
        }
    }

    if found == 0 {
        eprintln!("no UPnP devices answered");
    }
    Ok(())
}
