mod helpers;

use std::sync::Arc;
use std::time::Duration;

use gist::entities::Entry;
use gist::scheduler::{
    BackfillConfig, ReadableBackfill, RefreshScheduler, SchedulerConfig, SchedulerState,
};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use helpers::{InMemoryEntryRepository, article_page, pipeline, stack};

#[tokio::test]
async fn test_first_cycle_backfills_missing_content() {
    let server = MockServer::start().await;
    for (route, title) in [("/a", "Alpha"), ("/b", "Bravo")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(article_page(title))
                    .insert_header("content-type", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let repo = Arc::new(InMemoryEntryRepository::default());
    repo.insert(Entry {
        id: 1,
        url: Some(format!("{}/a", server.uri())),
        readable_content: None,
    });
    repo.insert(Entry {
        id: 2,
        url: Some(format!("{}/b", server.uri())),
        readable_content: None,
    });
    repo.insert(Entry {
        id: 3,
        url: None,
        readable_content: None,
    });

    let stack = stack();
    let backfill = ReadableBackfill::new(
        repo.clone(),
        pipeline(repo.clone(), &stack),
        BackfillConfig {
            concurrency: 2,
            batch_size: 10,
        },
    );
    let mut scheduler = RefreshScheduler::new(
        Arc::new(backfill),
        SchedulerConfig {
            interval: Duration::from_secs(3600),
            cycle_deadline: Duration::from_secs(30),
        },
    );

    scheduler.start().unwrap();
    tokio::time::timeout(Duration::from_secs(10), async {
        while repo.writes() < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("first cycle did not backfill both entries");

    scheduler.stop().await;
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(repo.stored(1).unwrap().contains("Alpha"));
    assert!(repo.stored(2).unwrap().contains("Bravo"));
    assert_eq!(repo.stored(3), None);
}

#[tokio::test]
async fn test_permanently_failing_entry_does_not_starve_later_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_page("Charlie"))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repo = Arc::new(InMemoryEntryRepository::default());
    repo.insert(Entry {
        id: 1,
        url: Some(format!("{}/gone", server.uri())),
        readable_content: None,
    });
    repo.insert(Entry {
        id: 2,
        url: Some(format!("{}/fresh", server.uri())),
        readable_content: None,
    });

    let stack = stack();
    let backfill = ReadableBackfill::new(
        repo.clone(),
        pipeline(repo.clone(), &stack),
        BackfillConfig {
            concurrency: 1,
            batch_size: 1,
        },
    );
    let cancel = CancellationToken::new();

    let first = backfill.run(&cancel).await.unwrap();
    assert_eq!(first.failed, 1);
    assert_eq!(repo.stored(2), None);

    let second = backfill.run(&cancel).await.unwrap();
    assert_eq!(second.stored, 1);
    assert!(repo.stored(2).unwrap().contains("Charlie"));

    // Only the failing entry is left, so the next batch starts over.
    let third = backfill.run(&cancel).await.unwrap();
    assert_eq!(third.failed, 1);
    assert_eq!(repo.stored(1), None);
}
