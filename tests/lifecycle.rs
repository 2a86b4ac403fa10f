use graphql_bind::{
    append_edges, into_variables, ClientContext, Error, FnTransport, GraphQlError,
    GraphQlResponse, Request, Transport,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

type Reply = graphql_bind::Result<GraphQlResponse<Value>>;

const ISSUES: &str = "query ($org: String!, $repo: String!, $cursor: String) { issues }";
const WATCH: &str = "mutation ($id: ID!, $state: SubscriptionState!) { updateSubscription(input: {subscribableId: $id, state: $state}) { subscribable { id } } }";

/// transport answering each call with the next canned reply
fn scripted(replies: Vec<Reply>) -> (ClientContext, Arc<Mutex<Vec<Request>>>) {
    let replies = Arc::new(Mutex::new(VecDeque::from(replies)));
    let sent = Arc::new(Mutex::new(Vec::new()));
    let log = sent.clone();
    let transport = FnTransport::new(move |_kind, request: Request| {
        log.lock().push(request);
        let reply = replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport("no scripted reply".to_string())));
        async move { reply }
    });
    (ClientContext::new(transport), sent)
}

/// transport whose calls settle only when the test sends their reply
fn gated(calls: usize) -> (ClientContext, Vec<oneshot::Sender<Reply>>, Arc<Mutex<Vec<Request>>>) {
    let (senders, receivers): (Vec<_>, VecDeque<_>) = (0..calls).map(|_| oneshot::channel()).unzip();
    let receivers = Arc::new(Mutex::new(receivers));
    let sent = Arc::new(Mutex::new(Vec::new()));
    let log = sent.clone();
    let transport: Arc<dyn Transport> = Arc::new(FnTransport::new(move |_kind, request: Request| {
        log.lock().push(request);
        let receiver = receivers.lock().pop_front();
        async move {
            match receiver {
                Some(receiver) => receiver
                    .await
                    .unwrap_or_else(|_| Err(Error::Transport("reply dropped".to_string()))),
                None => Err(Error::Transport("unexpected call".to_string())),
            }
        }
    }));
    (ClientContext::from_shared(transport), senders, sent)
}

async fn wait_for_calls(sent: &Mutex<Vec<Request>>, calls: usize) {
    while sent.lock().len() < calls {
        tokio::task::yield_now().await;
    }
}

fn issues_page(ids: &[u64], end_cursor: &str, has_next_page: bool) -> Value {
    let edges: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
    json!({
        "issues": {
            "edges": edges,
            "pageInfo": {"endCursor": end_cursor, "hasNextPage": has_next_page},
        }
    })
}

#[test]
fn fresh_query_has_no_data_or_errors() {
    let (context, sent) = scripted(vec![]);
    let query = context
        .query(ISSUES)
        .variables(into_variables(json!({"org": "x", "repo": "y"})))
        .build();

    let state = query.snapshot();
    assert!(state.data.is_none());
    assert!(state.errors.is_none());
    assert!(state.loading.is_none());
    assert!(sent.lock().is_empty());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn successful_query_settles_with_data() {
    let data = json!({"viewer": {"login": "octocat"}});
    let (context, _) = scripted(vec![Ok(GraphQlResponse::with_data(data.clone()))]);
    let query = context.query("{ viewer { login } }").build();

    query.activate().await;

    let state = query.snapshot();
    assert_eq!(state.data, Some(data));
    assert_eq!(state.loading, Some(false));
    assert!(state.errors.is_none());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn transport_failure_keeps_previous_data() {
    let previous = json!({"viewer": {"login": "octocat", "repos": [1, 2, 3]}});
    let (context, _) = scripted(vec![
        Ok(GraphQlResponse::with_data(previous.clone())),
        Err(Error::Transport("dns lookup failed".to_string())),
    ]);
    let query = context.query("{ viewer { login repos } }").build();

    query.activate().await;
    let before = serde_json::to_vec(&query.snapshot().data).unwrap();

    query.refetch().await;

    let state = query.snapshot();
    assert_eq!(serde_json::to_vec(&state.data).unwrap(), before);
    assert_eq!(state.data, Some(previous));
    assert_eq!(state.loading, Some(false));
    let errors = state.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_transport());
    assert_eq!(errors[0].message(), "transport error: dns lookup failed");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn protocol_errors_surface_with_partial_data() {
    let (context, _) = scripted(vec![Ok(GraphQlResponse {
        data: Some(json!({"repository": null})),
        errors: Some(vec![GraphQlError::new("Could not resolve to a Repository")]),
    })]);
    let query = context.query("{ repository }").build();

    query.activate().await;

    let state = query.snapshot();
    assert_eq!(state.data, Some(json!({"repository": null})));
    assert_eq!(
        state.errors.unwrap()[0].message(),
        "Could not resolve to a Repository"
    );
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn fetch_more_concatenates_edges_in_order_without_dedup() {
    let (context, _) = scripted(vec![
        Ok(GraphQlResponse::with_data(issues_page(&[1, 2], "c2", true))),
        Ok(GraphQlResponse::with_data(issues_page(&[2, 3], "c3", false))),
    ]);
    let query = context
        .query(ISSUES)
        .merge_with(append_edges("/issues"))
        .build();

    query.activate().await;
    query
        .fetch_more(Request::new(ISSUES).with_variable("cursor", "c2"))
        .await;

    let data = query.snapshot().data.unwrap();
    assert_eq!(
        data["issues"]["edges"],
        json!([{"id": 1}, {"id": 2}, {"id": 2}, {"id": 3}])
    );
    assert_eq!(data["issues"]["pageInfo"]["endCursor"], "c3");
    assert_eq!(data["issues"]["pageInfo"]["hasNextPage"], false);
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn fetch_more_null_page_keeps_collected_edges() {
    let (context, _) = scripted(vec![
        Ok(GraphQlResponse::with_data(issues_page(&[1], "c1", true))),
        Ok(GraphQlResponse {
            data: None,
            errors: Some(vec![GraphQlError::new("API rate limit exceeded")]),
        }),
    ]);
    let query = context
        .query(ISSUES)
        .merge_with(append_edges("/issues"))
        .build();

    query.activate().await;
    query
        .fetch_more(Request::new(ISSUES).with_variable("cursor", "c1"))
        .await;

    let state = query.snapshot();
    let data = state.data.unwrap();
    assert_eq!(data["issues"]["edges"], json!([{"id": 1}]));
    assert_eq!(data["issues"]["pageInfo"]["endCursor"], "c1");
    assert_eq!(state.fetch_more_loading, Some(false));
    let errors = state.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message(), "API rate limit exceeded");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn fetch_more_partial_page_merges_data_and_errors() {
    let mut partial = issues_page(&[2], "c2", false);
    partial["issues"]["edges"]
        .as_array_mut()
        .unwrap()
        .push(Value::Null);
    let (context, _) = scripted(vec![
        Ok(GraphQlResponse::with_data(issues_page(&[1], "c1", true))),
        Ok(GraphQlResponse {
            data: Some(partial),
            errors: Some(vec![GraphQlError::new("issue 3 was deleted")]),
        }),
    ]);
    let query = context
        .query(ISSUES)
        .merge_with(append_edges("/issues"))
        .build();

    query.activate().await;
    query
        .fetch_more(Request::new(ISSUES).with_variable("cursor", "c1"))
        .await;

    let state = query.snapshot();
    let data = state.data.unwrap();
    assert_eq!(data["issues"]["edges"], json!([{"id": 1}, {"id": 2}, null]));
    assert_eq!(data["issues"]["pageInfo"]["hasNextPage"], false);
    let errors = state.errors.unwrap();
    assert_eq!(errors[0].message(), "issue 3 was deleted");
    assert!(!errors[0].is_transport());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn mutation_partial_success_stores_data_and_errors() {
    let (context, _) = scripted(vec![Ok(GraphQlResponse {
        data: Some(json!({"updateSubscription": {"subscribable": null}})),
        errors: Some(vec![GraphQlError::new("Could not resolve to a node")]),
    })]);
    let mutation = context.mutation(WATCH).build();

    mutation
        .mutate_with(into_variables(json!({"id": "I_404", "state": "SUBSCRIBED"})))
        .await;

    let state = mutation.snapshot();
    assert_eq!(
        state.data,
        Some(json!({"updateSubscription": {"subscribable": null}}))
    );
    assert_eq!(state.loading, Some(false));
    let errors = state.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message(), "Could not resolve to a node");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn equal_variables_do_not_refetch() {
    let (context, sent) = scripted(vec![
        Ok(GraphQlResponse::with_data(json!({"n": 1}))),
        Ok(GraphQlResponse::with_data(json!({"n": 2}))),
    ]);
    let query = context
        .query(ISSUES)
        .variables(into_variables(json!({"org": "x", "repo": "y", "filter": {"state": "OPEN"}})))
        .build();
    query.activate().await;

    let same = into_variables(json!({"repo": "y", "filter": {"state": "OPEN"}, "org": "x"}));
    assert!(!query.configure(same).await);
    assert_eq!(sent.lock().len(), 1);

    let changed = into_variables(json!({"org": "x", "repo": "y", "filter": {"state": "CLOSED"}}));
    assert!(query.configure(changed).await);
    assert_eq!(sent.lock().len(), 2);
    assert_eq!(sent.lock()[1].variables()["filter"]["state"], "CLOSED");
    assert_eq!(query.snapshot().data, Some(json!({"n": 2})));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn mutation_reset_discards_completed_result() {
    let (context, _) = scripted(vec![Ok(GraphQlResponse::with_data(json!({"starred": true})))]);
    let mutation = context
        .mutation("mutation { star }")
        .initial(json!({"repo": "a", "starred": false}))
        .build();

    mutation.mutate().await;
    assert_eq!(mutation.snapshot().data, Some(json!({"starred": true})));

    assert!(mutation.reset(Some(json!({"repo": "b", "starred": false}))));
    let state = mutation.snapshot();
    assert_eq!(state.data, Some(json!({"repo": "b", "starred": false})));
    assert!(state.loading.is_none());
    assert!(state.errors.is_none());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn mutation_reset_discards_in_flight_result() {
    let (context, mut replies, sent) = gated(1);
    let mutation = context
        .mutation("mutation { star }")
        .initial(json!({"repo": "a"}))
        .build();

    let pending = mutation.spawn_mutate(into_variables(json!({"id": "a"})));
    wait_for_calls(&sent, 1).await;
    assert!(mutation.snapshot().is_loading());

    assert!(mutation.reset(Some(json!({"repo": "b"}))));
    let _ = replies
        .remove(0)
        .send(Ok(GraphQlResponse::with_data(json!({"starred": "a"}))));
    pending.await.unwrap();

    let state = mutation.snapshot();
    assert_eq!(state.data, Some(json!({"repo": "b"})));
    assert!(state.loading.is_none());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn issue_list_pages_through_fetch_more() {
    let (context, sent) = scripted(vec![
        Ok(GraphQlResponse {
            data: Some(issues_page(&[1], "c1", true)),
            errors: None,
        }),
        Ok(GraphQlResponse {
            data: Some(issues_page(&[2], "c2", false)),
            errors: None,
        }),
    ]);
    let query = context
        .query(ISSUES)
        .variables(into_variables(json!({"org": "x", "repo": "y"})))
        .merge_with(append_edges("/issues"))
        .build();

    query.activate().await;
    let next = query.next_page("/issues", "cursor").expect("second page");
    query.fetch_more(next).await;

    let state = query.snapshot();
    let data = state.data.as_ref().unwrap();
    assert_eq!(data["issues"]["edges"], json!([{"id": 1}, {"id": 2}]));
    assert_eq!(data["issues"]["pageInfo"]["hasNextPage"], false);
    assert_eq!(state.fetch_more_loading, Some(false));
    assert!(state.errors.is_none());

    let sent = sent.lock();
    assert_eq!(sent[1].variables()["org"], "x");
    assert_eq!(sent[1].variables()["repo"], "y");
    assert_eq!(sent[1].variables()["cursor"], "c1");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn superseded_query_settling_last_overwrites_newer_data() {
    let (context, mut replies, sent) = gated(2);
    let query = context
        .query(ISSUES)
        .variables(into_variables(json!({"org": "x", "repo": "old"})))
        .build();

    let first = tokio::spawn({
        let query = query.clone();
        async move { query.activate().await }
    });
    wait_for_calls(&sent, 1).await;

    let second = tokio::spawn({
        let query = query.clone();
        async move {
            query
                .configure(into_variables(json!({"org": "x", "repo": "new"})))
                .await
        }
    });
    wait_for_calls(&sent, 2).await;

    let old_reply = replies.remove(0);
    let new_reply = replies.remove(0);

    let _ = new_reply.send(Ok(GraphQlResponse::with_data(json!({"repo": "new"}))));
    assert!(second.await.unwrap());
    assert_eq!(query.snapshot().data, Some(json!({"repo": "new"})));

    let _ = old_reply.send(Ok(GraphQlResponse::with_data(json!({"repo": "old"}))));
    first.await.unwrap();

    // no cancellation: the older response wins because it settled last
    assert_eq!(query.snapshot().data, Some(json!({"repo": "old"})));
    assert_eq!(query.variables()["repo"], "new");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn listeners_receive_every_transition() {
    let (context, _) = scripted(vec![
        Ok(GraphQlResponse::with_data(issues_page(&[1], "c1", true))),
        Ok(GraphQlResponse::with_data(issues_page(&[2], "c2", false))),
    ]);
    let query = context
        .query(ISSUES)
        .merge_with(append_edges("/issues"))
        .build();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let id = query.subscribe(move |state| {
        log.lock()
            .push((state.loading, state.fetch_more_loading));
    });

    query.activate().await;
    query.fetch_more(Request::new(ISSUES)).await;
    assert!(query.unsubscribe(id));
    query.refetch().await;

    assert_eq!(
        *seen.lock(),
        vec![
            (Some(true), None),
            (Some(false), None),
            (Some(false), Some(true)),
            (Some(false), Some(false)),
        ]
    );
}
