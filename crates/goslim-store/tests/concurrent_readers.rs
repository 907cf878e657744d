//! Readers of a published path while it is being replaced.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use goslim_core::ArtifactPaths;
use goslim_store::{publish, replace_blocking};

const MIB: usize = 1024 * 1024;

#[test]
fn readers_see_whole_old_or_whole_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let staging_dir = dir.path().join("staging");
    let published_dir = dir.path().join("published");
    std::fs::create_dir_all(&staging_dir).unwrap();
    std::fs::create_dir_all(&published_dir).unwrap();
    let paths = ArtifactPaths::for_file("gene_association.sgd", &staging_dir, &published_dir, ".bak");

    let versions: Arc<Vec<Vec<u8>>> = Arc::new(vec![
        vec![b'a'; 8 * MIB],
        vec![b'b'; 6 * MIB],
        vec![b'c'; 10 * MIB + 17],
    ]);
    std::fs::write(&paths.published, &versions[0]).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let done = Arc::clone(&done);
        let versions = Arc::clone(&versions);
        let published = paths.published.clone();
        std::thread::spawn(move || {
            let mut reads = 0_usize;
            loop {
                let finished = done.load(Ordering::SeqCst);
                let seen = std::fs::read(&published).unwrap();
                assert!(
                    versions.iter().any(|v| *v == seen),
                    "torn read of {} bytes",
                    seen.len()
                );
                reads += 1;
                if finished {
                    return reads;
                }
            }
        })
    };

    for round in 0..6 {
        let next = &versions[1 + round % 2];
        std::fs::write(&paths.staging, next).unwrap();
        if round % 3 == 0 {
            replace_blocking(&paths).unwrap();
        } else {
            publish(&paths.staging, &paths.published).unwrap();
        }
    }
    done.store(true, Ordering::SeqCst);

    let reads = reader.join().unwrap();
    assert!(reads > 0);
    assert_eq!(std::fs::read(&paths.published).unwrap(), versions[2]);
}
