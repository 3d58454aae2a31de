//! Ask the NAT gateway for the external IP address via WANIPConnection.

use upnp_client::{discover, SearchTarget, SoapClient};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let soap = SoapClient::new();
    for (_, gateway) in discover(SearchTarget::WanIpConnection)? {
        let Some(action) = gateway.action("GetExternalIPAddress") else {
            continue;
        };
        let result = action.invoke(&soap, &[], &[])?;
        let ip = &result["NewExternalIPAddress"];
        if !ip.is_empty() && ip != "0.0.0.0" {
            println!("{}", ip);
            return Ok(());
        }
    }

    Err("no gateway or active internet connection found".into())
}
