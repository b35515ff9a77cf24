use std::process::exit;

use apiverve_zipcodes_client::http::Client;
use apiverve_zipcodes_client::query::Query;
use apiverve_zipcodes_client::Result;

fn main() -> Result<()> {
    // Run with RUST_LOG=debug to see the client's request/response logging.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Reading the key from the environment is example glue; the client itself
    // only takes configuration through its constructor.
    let api_key = match std::env::var("APIVERVE_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("APIVERVE_API_KEY is not set. Get your API key at: https://apiverve.com");
            exit(1);
        }
    };

    let client = Client::builder(api_key).debug(true).build()?;

    let response = client.execute(&Query::zip("64082"))?;

    match response.data {
        Some(record) => {
            println!(
                "{}: {}, {} ({})",
                record.zipcode, record.city, record.state, record.state_abbr
            );
            println!("coordinates: {}, {}", record.latitude, record.longitude);
        }
        None => println!("no record returned for that zip code"),
    }

    Ok(())
}
