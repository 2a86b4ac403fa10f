//! page through open issues of a github repository and toggle watching it
//!
//! usage: GITHUB_TOKEN=... cargo run --example github_issues -- rust-lang/rust [--toggle-watch]

use graphql_bind::{
    append_edges, into_variables, Client, ClientConfig, ClientContext, MutationState, QueryState,
};
use serde_json::{json, Value};

const GET_ISSUES_OF_REPOSITORY: &str = r#"
  query GetIssues($organization: String!, $repository: String!, $cursor: String) {
    organization(login: $organization) {
      name
      url
      repository(name: $repository) {
        id
        name
        url
        watchers { totalCount }
        viewerSubscription
        issues(first: 5, after: $cursor, states: [OPEN]) {
          edges { node { id title url } }
          totalCount
          pageInfo { endCursor hasNextPage }
        }
      }
    }
  }
"#;

const WATCH_REPOSITORY: &str = r#"
  mutation WatchRepository($id: ID!, $viewerSubscription: SubscriptionState!) {
    updateSubscription(input: { state: $viewerSubscription, subscribableId: $id }) {
      subscribable { id viewerSubscription }
    }
  }
"#;

const ISSUES: &str = "/organization/repository/issues";

fn is_watching(data: &Value) -> bool {
    data["viewerSubscription"] == "SUBSCRIBED"
}

fn print_issues(state: &QueryState) {
    if state.is_loading() {
        println!("loading ...");
        return;
    }
    if let Some(errors) = &state.errors {
        let messages: Vec<String> = errors.iter().map(|err| err.message()).collect();
        println!("something went wrong: {}", messages.join(" "));
    }
    let Some(edges) = state
        .data
        .as_ref()
        .and_then(|data| data.pointer(&format!("{ISSUES}/edges")))
        .and_then(Value::as_array)
    else {
        return;
    };
    println!("{} issues loaded", edges.len());
}

fn print_watch(state: &MutationState) {
    if let Some(data) = &state.data {
        let label = if is_watching(data) { "unwatch" } else { "watch" };
        println!("{} {}", data["totalCount"], label);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "the-road-to-learn-react/the-road-to-learn-react".to_string());
    let toggle_watch = args.any(|arg| arg == "--toggle-watch");
    let (organization, repository) = path
        .split_once('/')
        .ok_or("expected <organization>/<repository>")?;

    let token = std::env::var("GITHUB_TOKEN")?;
    let client = Client::new(
        ClientConfig::new("https://api.github.com/graphql").with_bearer_token(token),
    )?;
    let context = ClientContext::new(client);

    let issues = context
        .query(GET_ISSUES_OF_REPOSITORY)
        .variables(into_variables(json!({
            "organization": organization,
            "repository": repository,
        })))
        .merge_with(append_edges(ISSUES))
        .build();
    issues.subscribe(print_issues);

    issues.activate().await;
    while let Some(next) = issues.next_page(ISSUES, "cursor") {
        issues.fetch_more(next).await;
        if issues.snapshot().errors.is_some() {
            break;
        }
    }

    let Some(repo) = issues
        .snapshot()
        .data
        .and_then(|data| data.pointer("/organization/repository").cloned())
    else {
        return Ok(());
    };

    let watch = context
        .mutation(WATCH_REPOSITORY)
        .initial(json!({
            "viewerSubscription": repo["viewerSubscription"],
            "totalCount": repo["watchers"]["totalCount"],
        }))
        .merge(|data, state| {
            let total = state
                .data
                .as_ref()
                .and_then(|data| data["totalCount"].as_i64())
                .unwrap_or(0);
            let subscription = &data["updateSubscription"]["subscribable"]["viewerSubscription"];
            let total = if subscription == "SUBSCRIBED" { total + 1 } else { total - 1 };
            json!({"viewerSubscription": subscription, "totalCount": total})
        })
        .build();
    watch.subscribe(print_watch);
    print_watch(&watch.snapshot());

    if toggle_watch {
        let next_state = match watch.snapshot().data {
            Some(data) if is_watching(&data) => "UNSUBSCRIBED",
            _ => "SUBSCRIBED",
        };
        watch
            .mutate_with(into_variables(json!({
                "id": repo["id"],
                "viewerSubscription": next_state,
            })))
            .await;
    }

    Ok(())
}
