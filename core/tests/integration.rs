//! Full lifecycle test against the live mock server.
//!
//! Starts the mock server on a random port, then exercises the client over
//! real HTTP using ureq as the host transport.

use mite_core::{
    to_params, ApiError, Customer, HttpMethod, HttpRequest, HttpResponse, MiteClient, Params,
    Project, TimeEntry, User,
};
use serde::Serialize;
use serde_json::json;

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    macro_rules! with_headers {
        ($builder:expr) => {{
            let mut builder = $builder;
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder
        }};
    }

    let mut response = match (req.method, req.body.as_deref()) {
        (HttpMethod::Get, _) => with_headers!(agent.get(&req.url)).call(),
        (HttpMethod::Delete, None) => with_headers!(agent.delete(&req.url)).call(),
        (HttpMethod::Delete, Some(body)) => {
            with_headers!(agent.delete(&req.url)).force_send_body().send(body.as_bytes())
        }
        (HttpMethod::Post, Some(body)) => with_headers!(agent.post(&req.url)).send(body.as_bytes()),
        (HttpMethod::Post, None) => with_headers!(agent.post(&req.url)).send_empty(),
        (HttpMethod::Put, Some(body)) => with_headers!(agent.put(&req.url)).send(body.as_bytes()),
        (HttpMethod::Put, None) => with_headers!(agent.put(&req.url)).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse {
        status,
        headers: Vec::new(),
        body,
    }
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, mock_server::app()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn params(value: serde_json::Value) -> Params {
    value.as_object().cloned().unwrap()
}

#[derive(Serialize)]
struct ProjectFilter {
    customer_id: Option<u64>,
    name: Option<String>,
    limit: Option<u32>,
}

#[test]
fn lifecycle() {
    let base_url = start_server();
    let client = MiteClient::new(&base_url, mock_server::DEFAULT_API_KEY);

    // Step 1: account and the current user.
    let account = client.parse_account(execute(client.build_account())).unwrap();
    assert_eq!(account.name, "demo");
    let me = client.parse_myself(execute(client.build_myself())).unwrap();
    assert_eq!(me.id, 1);

    // Step 2: users are split into active and archived.
    let users: Vec<User> = client
        .parse_list(execute(client.build_list::<User>(&Params::new())))
        .unwrap();
    assert_eq!(users, vec![me.clone()]);
    let former: Vec<User> = client
        .parse_list(execute(client.build_list_archived::<User>(&Params::new())))
        .unwrap();
    assert_eq!(former.len(), 1);
    assert!(former[0].archived);

    // Step 3: no customers yet.
    let customers: Vec<Customer> = client
        .parse_list(execute(client.build_list::<Customer>(&Params::new())))
        .unwrap();
    assert!(customers.is_empty(), "expected empty list");

    // Step 4: create a customer; the blank note is never sent.
    let req = client
        .build_create::<Customer>(&params(json!({"name": "Acme", "note": "", "hourly_rate": null})))
        .unwrap();
    let acme: Customer = client.parse_create(execute(req)).unwrap();
    assert_eq!(acme.name, "Acme");
    assert!(!acme.archived);

    let fetched: Customer = client.parse_show(execute(client.build_show::<Customer>(acme.id))).unwrap();
    assert_eq!(fetched, acme);

    // Step 5: a project belonging to the customer, found through a typed filter.
    let req = client
        .build_create::<Project>(&params(json!({"name": "Relaunch", "customer_id": acme.id, "budget": 6000})))
        .unwrap();
    let project: Project = client.parse_create(execute(req)).unwrap();
    let filter = to_params(&ProjectFilter {
        customer_id: Some(acme.id),
        name: None,
        limit: None,
    })
    .unwrap();
    let projects: Vec<Project> = client
        .parse_list(execute(client.build_list::<Project>(&filter)))
        .unwrap();
    assert_eq!(projects, vec![project.clone()]);

    // Step 6: rename and archive the customer.
    let req = client.build_update::<Customer>(acme.id, &params(json!({"name": "Acme Ltd", "archived": true})));
    client.parse_empty(execute(req)).unwrap();

    let active: Vec<Customer> = client
        .parse_list(execute(client.build_list::<Customer>(&Params::new())))
        .unwrap();
    assert!(active.is_empty());
    let archived: Vec<Customer> = client
        .parse_list(execute(client.build_list_archived::<Customer>(&params(json!({"name": "ltd"})))))
        .unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].name, "Acme Ltd");

    // Step 7: book time and track it.
    let req = client
        .build_create::<TimeEntry>(&params(json!({
            "date_at": "2026-10-19",
            "minutes": 30,
            "note": "kickoff",
            "project_id": project.id,
        })))
        .unwrap();
    let entry: TimeEntry = client.parse_create(execute(req)).unwrap();
    assert_eq!(entry.minutes, 30);

    let idle = client.parse_tracker(execute(client.build_tracker())).unwrap();
    assert!(idle.tracking_time_entry.is_none());

    let started = client.parse_tracker(execute(client.build_start_tracker(entry.id))).unwrap();
    let tracking = started.tracking_time_entry.unwrap();
    assert_eq!(tracking.id, entry.id);
    assert_eq!(tracking.minutes, 30);

    let stopped = client.parse_tracker(execute(client.build_stop_tracker(entry.id))).unwrap();
    assert_eq!(stopped.stopped_time_entry.unwrap().id, entry.id);

    let err = client.parse_tracker(execute(client.build_stop_tracker(entry.id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    // Step 8: delete the entry; it is gone afterwards.
    client.parse_empty(execute(client.build_destroy::<TimeEntry>(entry.id))).unwrap();
    let err = client
        .parse_show::<TimeEntry>(execute(client.build_show::<TimeEntry>(entry.id)))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    let err = client.parse_empty(execute(client.build_destroy::<TimeEntry>(entry.id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    // Step 9: a wrong key is rejected.
    let intruder = MiteClient::new(&base_url, "wrong");
    let err = intruder.parse_account(execute(intruder.build_account())).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}
