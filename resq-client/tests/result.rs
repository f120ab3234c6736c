use resq_client::{CancellationToken, RemoteQuery};
use resq_test::{page_payload, MockTransport};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct User {
    id: u64,
}

#[tokio::test]
async fn navigation_follows_meta() {
    let mock = MockTransport::new();
    mock.push_json(page_payload(json!([{ "id": 3 }, { "id": 4 }]), 2, 3, 2, 6));
    mock.push_json(page_payload(json!([{ "id": 5 }, { "id": 6 }]), 3, 3, 2, 6));
    mock.push_json(page_payload(json!([{ "id": 1 }, { "id": 2 }]), 1, 3, 2, 6));
    let cancel = CancellationToken::new();

    let query = RemoteQuery::new(mock.clone(), "/users").filter("status", "active").page(2);
    let middle = query.get_result::<User>(&cancel).await.unwrap();
    assert_eq!(middle.current_page(), Some(2));
    assert_eq!(middle.last_page(), Some(3));
    assert_eq!(middle.per_page(), Some(2));
    assert_eq!(middle.total(), Some(6));
    assert!(middle.has_prev_page());
    assert!(middle.has_next_page());

    let last = middle.fetch_next_page(&cancel).unwrap().await.unwrap();
    assert_eq!(last.data, vec![User { id: 5 }, User { id: 6 }]);
    assert!(!last.has_next_page());
    assert!(last.fetch_next_page(&cancel).is_none());

    let first = middle.fetch_prev_page(&cancel).unwrap().await.unwrap();
    assert_eq!(first.current_page(), Some(1));
    assert!(!first.has_prev_page());
    assert!(first.fetch_prev_page(&cancel).is_none());

    let pages: Vec<_> = mock
        .requests()
        .iter()
        .map(|r| r.param("page").unwrap_or_default().to_string())
        .collect();
    assert_eq!(pages, vec!["2", "3", "1"]);
    assert!(mock
        .requests()
        .iter()
        .all(|r| r.param("filters[status]") == Some("active")));
}

#[tokio::test]
async fn missing_meta_disables_navigation() {
    let mock = MockTransport::new();
    mock.push_json(json!({ "data": [{ "id": 1 }] }));
    let cancel = CancellationToken::new();

    let result = RemoteQuery::new(mock.clone(), "/users")
        .get_result::<User>(&cancel)
        .await
        .unwrap();
    assert_eq!(result.current_page(), None);
    assert_eq!(result.total(), None);
    assert!(!result.has_prev_page());
    assert!(!result.has_next_page());
    assert!(result.fetch_prev_page(&cancel).is_none());
    assert!(result.fetch_next_page(&cancel).is_none());
    assert_eq!(result.into_page().data, vec![User { id: 1 }]);
    assert_eq!(mock.request_count(), 1);
}
