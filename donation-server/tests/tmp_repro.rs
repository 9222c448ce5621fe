//! TEMPORARY diagnostic — delete before finishing.
use surrealdb::Surreal;
use surrealdb::engine::local::RocksDb;

#[tokio::test(flavor = "multi_thread")]
async fn tmp_reopen_repro() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repro.db");

    {
        let db = Surreal::new::<RocksDb>(path.clone()).await.unwrap();
        db.use_ns("a").use_db("a").await.unwrap();
        db.query("CREATE x SET v = 1;").await.unwrap();
        drop(db);
    }

    let start = std::time::Instant::now();
    loop {
        match Surreal::new::<RocksDb>(path.clone()).await {
            Ok(_) => {
                eprintln!("repro: reopen ok after {:?}", start.elapsed());
                break;
            }
            Err(e) => {
                if start.elapsed().as_secs() > 30 {
                    panic!("repro: reopen failed after 30s: {e}");
                }
                tokio::time::sleep(std::time::Duration::from_millis(250)).await;
            }
        }
    }
}
