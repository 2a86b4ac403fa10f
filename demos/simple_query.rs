use graphql_bind::{Client, ClientConfig, Operation, Variables};
use serde::Deserialize;

struct Viewer;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ViewerData {
    viewer: ViewerInfo,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ViewerInfo {
    login: String,
}

impl Operation for Viewer {
    const QUERY: &'static str = "query Viewer { viewer { login } }";
    type Response = ViewerData;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = Client::new(ClientConfig::from_env()?)?;
    let response = client.execute_operation::<Viewer>(Variables::new()).await?;

    println!("response: {:?}", response.into_result()?);
    Ok(())
}
