mod common;

use std::time::Duration;

use common::{candidate, next_event, rr_payload, LinkScript, ScriptedTransport};
use hrmon::http::{routes, LandingPage};
use hrmon::{ConnectionManager, ManagerConfig, MonitorEvent, Status};
use serde_json::{json, Value};
use tokio::sync::watch;

async fn get(status: &Status, page: &LandingPage, path: &str) -> (u16, String) {
    let res = warp::test::request()
        .method("GET")
        .path(path)
        .reply(&routes(status.clone(), page.clone()))
        .await;
    (res.status().as_u16(), String::from_utf8(res.body().to_vec()).unwrap())
}

#[tokio::test]
async fn empty_status() {
    let status = Status::default();
    let page = LandingPage::default();

    let (code, body) = get(&status, &page, "/buffer").await;
    assert_eq!(code, 200);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"hr_buffer": [], "rr_buffer": []}));

    let (code, body) = get(&status, &page, "/stats").await;
    assert_eq!(code, 200);
    assert_eq!(body, "null");

    let (code, body) = get(&status, &page, "/").await;
    assert_eq!(code, 200);
    assert!(body.contains("/buffer"));

    let (code, _) = get(&status, &page, "/nope").await;
    assert_eq!(code, 404);
}

#[tokio::test]
async fn reflects_live_session() {
    let (stop, shutdown) = watch::channel(false);
    let transport = ScriptedTransport::new(vec![candidate("Polar H10 1", "AA")]).with_link(LinkScript {
        payloads: vec![rr_payload(60, &[1024]), rr_payload(64, &[512, 768])],
        hold_open: true,
        ..Default::default()
    });
    let status = Status::default();
    let config = ManagerConfig {
        target: Some("Polar H10 1".into()),
        scan_timeout: Duration::ZERO,
        retry_delay: Duration::ZERO,
        ..Default::default()
    };
    let (manager, mut controls) = ConnectionManager::new(transport, config, status.clone(), (), shutdown);
    let task = tokio::spawn(manager.run());

    loop {
        match next_event(&mut controls.events).await {
            Some(MonitorEvent::SessionStarted(_)) => break,
            Some(_) => {}
            None => panic!("manager stopped early"),
        }
    }
    // Both payloads are handled before the stream goes quiet.
    while status.buffers().hr_buffer.len() < 2 {
        tokio::task::yield_now().await;
    }

    let page = LandingPage::default();
    let (_, body) = get(&status, &page, "/buffer").await;
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"hr_buffer": [60, 64], "rr_buffer": [1.0, 0.5, 0.75]})
    );

    let (_, body) = get(&status, &page, "/stats").await;
    let stats: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stats["num_ectopics"], 0);
    assert_eq!(stats["state"], "subscribed");
    assert!(stats["elapsed_time"].is_u64());
    assert!(stats["elapsed_time_lit"].as_str().unwrap().starts_with("0:00:"));
    assert_eq!(stats["start_time"].as_str().unwrap().len(), "07:30:05 [01.03.]".len());

    stop.send(true).unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn landing_page_is_loaded_and_refreshed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.html");

    let page = LandingPage::load(&path);
    assert!(page.html().contains("hrmon is running"));

    std::fs::write(&path, "<p>first</p>").unwrap();
    let page = LandingPage::load(&path);
    assert_eq!(page.html(), "<p>first</p>");

    let (stop, shutdown) = watch::channel(false);
    let refresh = tokio::spawn(page.clone().refresh(path.clone(), Duration::from_millis(10), shutdown));
    std::fs::write(&path, "<p>second</p>").unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while page.html() != "<p>second</p>" {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("page was not reloaded");

    let (_, body) = get(&Status::default(), &page, "/").await;
    assert_eq!(body, "<p>second</p>");

    stop.send(true).unwrap();
    refresh.await.unwrap();
}
