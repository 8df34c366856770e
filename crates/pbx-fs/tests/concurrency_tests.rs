//! Concurrent access tests for locked atomic writes
//!
//! Verifies that writers holding the `FileLock` never interleave and that a
//! reader always sees one complete version of the file.

use pbx_fs::{FileLock, io};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

#[test]
fn test_locked_writers_do_not_interleave() {
    let dir = tempdir().unwrap();
    let file_path = Arc::new(dir.path().join("pjsip.conf"));
    std::fs::write(file_path.as_ref(), "").unwrap();

    let num_threads = 8;
    let writes_per_thread = 10;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let path = Arc::clone(&file_path);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();

                for i in 0..writes_per_thread {
                    let _lock = FileLock::acquire(&path).unwrap();
                    let mut content = io::read_text(&path).unwrap();
                    content.push_str(&format!("thread{}:write{}\n", thread_id, i));
                    io::write_text(&path, &content).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    // Read-modify-write under the lock must not lose any update.
    let content = std::fs::read_to_string(file_path.as_ref()).unwrap();
    assert_eq!(content.lines().count(), num_threads * writes_per_thread);
}

#[test]
fn test_reader_sees_whole_versions() {
    let dir = tempdir().unwrap();
    let file_path = Arc::new(dir.path().join("pjsip.conf"));
    let a = "a".repeat(64 * 1024);
    let b = "b".repeat(64 * 1024);
    io::write_text(&file_path, &a).unwrap();

    let writer = {
        let path = Arc::clone(&file_path);
        let (a, b) = (a.clone(), b.clone());
        thread::spawn(move || {
            for i in 0..50 {
                let content = if i % 2 == 0 { &b } else { &a };
                io::write_text(&path, content).unwrap();
            }
        })
    };

    for _ in 0..50 {
        let seen = std::fs::read_to_string(file_path.as_ref()).unwrap();
        assert!(seen == a || seen == b, "observed a torn write");
    }

    writer.join().unwrap();
}
