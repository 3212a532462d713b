//! The recursive tree-comparison engine.
//!
//! `compare` walks a source/destination directory pair depth-first on a
//! single control thread, pairing entries by name and classifying each pair
//! in type -> size -> checksum order. Issues are recorded per directory and
//! forwarded to the event sink as they are found.
//!
//! Three failure classes propagate differently:
//! - recoverable conflicts and missing entries land in the results and never
//!   abort the walk by themselves;
//! - fatal errors (not a directory, unreadable listing, failed digest) abort
//!   the entire walk and discard everything accumulated so far;
//! - cancellation aborts the current frame and its descendants, but keeps
//!   the results of directories fully processed before the cancellation
//!   point.
//!
//! Note that a type conflict still counts as "matched", so a source
//! directory paired with a same-named destination file is recursed into and
//! aborts the whole walk with a fatal error. That all-or-nothing behavior
//! is deliberate and pinned down by a test.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::checksums::{digest_file, digest_to_hex, ChecksumAlgorithm};
use crate::config::{CancellationToken, CheckConfig};
use crate::conflict::Conflict;
use crate::error::{Side, WalkError};
use crate::events::CheckEventSink;
use crate::model::{DirEntry, DirectoryResult, WalkMeta, WalkOutcome, WalkStatus};

/// Abort signal threaded through the recursion. Cancellation keeps the
/// results accumulated so far; a fatal error discards them at the top level.
enum WalkAbort {
    Cancelled,
    Fatal(WalkError),
}

impl From<WalkError> for WalkAbort {
    fn from(err: WalkError) -> Self {
        WalkAbort::Fatal(err)
    }
}

/// Compare a destination directory tree against its source.
///
/// Returns the non-ok directory records in pre-order traversal order. On
/// cancellation the outcome carries the prefix of directories fully
/// processed before the cancellation point, with `WalkStatus::Cancelled`.
/// Fatal errors return `Err` and no results.
pub fn compare(
    config: &CheckConfig,
    meta: &WalkMeta,
    source: &Path,
    destination: &Path,
    sink: Option<&dyn CheckEventSink>,
    token: &CancellationToken,
) -> Result<WalkOutcome, WalkError> {
    let mut results = Vec::new();
    match walk(config, meta, source, destination, sink, token, &mut results) {
        Ok(()) => Ok(WalkOutcome {
            results,
            status: WalkStatus::Completed,
        }),
        Err(WalkAbort::Cancelled) => {
            debug!("walk cancelled, returning {} partial results", results.len());
            Ok(WalkOutcome {
                results,
                status: WalkStatus::Cancelled,
            })
        }
        Err(WalkAbort::Fatal(err)) => Err(err),
    }
}

fn checkpoint(token: &CancellationToken) -> Result<(), WalkAbort> {
    if token.is_cancelled() {
        Err(WalkAbort::Cancelled)
    } else {
        Ok(())
    }
}

/// List a directory as DirEntry projections, sorted by name.
///
/// Filesystem listing order is not reproducible across runs or platforms;
/// sorting makes result order and event order deterministic.
fn list_directory(side: Side, dir: &Path) -> Result<Vec<DirEntry>, WalkError> {
    let unreadable = |source: std::io::Error| WalkError::DirectoryUnreadable {
        side,
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let metadata = entry.metadata().map_err(unreadable)?;
        let is_dir = metadata.is_dir();
        entries.push(DirEntry {
            name: entry.file_name(),
            is_dir,
            size: if is_dir { 0 } else { metadata.len() },
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Digest both sides of a file pair, in parallel when a pool is available.
///
/// Both modes produce identical digests for identical input; the pool is a
/// latency optimization only. A rejected submission or a broken reply
/// channel degrades to a failed digest.
fn digest_pair(
    config: &CheckConfig,
    token: &CancellationToken,
    algorithm: ChecksumAlgorithm,
    source_path: &Path,
    destination_path: &Path,
) -> (Option<Vec<u8>>, Option<Vec<u8>>) {
    match config.pool() {
        Some(pool) => {
            let source_reply = pool.submit({
                let token = token.clone();
                let path = source_path.to_path_buf();
                move || digest_file(&token, algorithm, &path)
            });
            let destination_reply = pool.submit({
                let token = token.clone();
                let path = destination_path.to_path_buf();
                move || digest_file(&token, algorithm, &path)
            });
            let source_digest = match source_reply {
                Some(reply) => reply.recv().unwrap_or(None),
                None => None,
            };
            let destination_digest = match destination_reply {
                Some(reply) => reply.recv().unwrap_or(None),
                None => None,
            };
            (source_digest, destination_digest)
        }
        None => (
            digest_file(token, algorithm, source_path),
            digest_file(token, algorithm, destination_path),
        ),
    }
}

fn walk(
    config: &CheckConfig,
    meta: &WalkMeta,
    source: &Path,
    destination: &Path,
    sink: Option<&dyn CheckEventSink>,
    token: &CancellationToken,
    out: &mut Vec<DirectoryResult>,
) -> Result<(), WalkAbort> {
    debug!("checking {} | {}", source.display(), destination.display());
    checkpoint(token)?;

    if !source.is_dir() {
        return Err(WalkError::NotADirectory {
            side: Side::Source,
            path: source.to_path_buf(),
        }
        .into());
    }
    if !destination.is_dir() {
        return Err(WalkError::NotADirectory {
            side: Side::Destination,
            path: destination.to_path_buf(),
        }
        .into());
    }

    let source_entries = list_directory(Side::Source, source)?;
    let destination_entries = list_directory(Side::Destination, destination)?;

    let mut cr = DirectoryResult::new(source, destination);

    for s in &source_entries {
        checkpoint(token)?;

        let mut found = false;
        let mut fail = false;

        for d in &destination_entries {
            checkpoint(token)?;
            if s.name != d.name {
                continue;
            }
            found = true;

            if s.is_dir != d.is_dir {
                // Counts as matched despite the conflict: the entry is not
                // added to the missing list and recursion will still be
                // attempted when the source side is a directory.
                let conflict = Conflict::Type {
                    source_is_file: !s.is_dir,
                };
                if let Some(sink) = sink {
                    sink.on_conflict(source, destination, s, d, &conflict);
                }
                cr.conflicts.push((s.clone(), conflict));
                fail = true;
            } else if !s.is_dir && (config.check_size || config.checksum_enabled()) {
                if s.size != d.size {
                    debug!(
                        "{} - file sizes do not match - {} / {}",
                        s.display_name(),
                        s.size,
                        d.size
                    );
                    found = false;
                    let conflict = Conflict::Size {
                        source_size: s.size,
                        destination_size: d.size,
                    };
                    if let Some(sink) = sink {
                        sink.on_conflict(source, destination, s, d, &conflict);
                    }
                    cr.conflicts.push((s.clone(), conflict));
                } else if let Some(algorithm) = config.checksum {
                    debug!("creating checksum for {}", s.display_name());
                    let source_path = source.join(&s.name);
                    let destination_path = destination.join(&d.name);

                    let (source_digest, destination_digest) = digest_pair(
                        config,
                        token,
                        algorithm,
                        &source_path,
                        &destination_path,
                    );
                    // A digest aborted by cancellation must surface as
                    // cancellation, not as a checksum failure.
                    checkpoint(token)?;

                    let source_digest = source_digest.ok_or(WalkError::ChecksumFailed {
                        path: source_path,
                    })?;
                    let destination_digest =
                        destination_digest.ok_or(WalkError::ChecksumFailed {
                            path: destination_path,
                        })?;

                    let source_hex = digest_to_hex(&source_digest);
                    let destination_hex = digest_to_hex(&destination_digest);
                    if source_hex != destination_hex {
                        debug!("checksum mismatch for {}", s.display_name());
                        found = false;
                        let conflict = Conflict::Checksum {
                            source_hex,
                            destination_hex,
                        };
                        if let Some(sink) = sink {
                            sink.on_conflict(source, destination, s, d, &conflict);
                        }
                        cr.conflicts.push((s.clone(), conflict));
                    }
                }
            }
            break;
        }

        if s.is_dir {
            meta.inc_directories();
        } else {
            meta.inc_files();
        }

        if !found {
            if let Some(sink) = sink {
                sink.on_missing_in_destination(source, destination, s);
            }
            cr.missing_in_destination.push(s.clone());
            fail = true;
        }

        if fail && config.fail_fast {
            break;
        }
    }

    for d in &destination_entries {
        checkpoint(token)?;

        let found = source_entries.iter().any(|s| s.name == d.name);
        if !found {
            if let Some(sink) = sink {
                sink.on_missing_in_source(source, destination, d);
            }
            cr.missing_in_source.push(d.clone());
            if config.fail_fast && config.fail_on_destination {
                break;
            }
        }
    }

    let dir_ok = cr.ok();
    let missing_names: Vec<OsString> = cr
        .missing_in_destination
        .iter()
        .map(|entry| entry.name.clone())
        .collect();

    if !dir_ok {
        out.push(cr);
    }

    // A failing directory under fail-fast suppresses recursion into all of
    // its subdirectories, matched or not.
    if !config.fail_fast || dir_ok {
        for s in &source_entries {
            checkpoint(token)?;
            if s.is_dir && !missing_names.contains(&s.name) {
                walk(
                    config,
                    meta,
                    &source.join(&s.name),
                    &destination.join(&s.name),
                    sink,
                    token,
                    out,
                )?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DigestPool;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) {
        let mut file = File::create(dir.join(name)).expect("Failed to create file");
        file.write_all(contents).expect("Failed to write file");
    }

    fn run(config: &CheckConfig, source: &Path, destination: &Path) -> WalkOutcome {
        compare(
            config,
            &WalkMeta::new(),
            source,
            destination,
            None,
            &CancellationToken::new(),
        )
        .expect("walk should not abort")
    }

    #[test]
    fn test_identical_trees_produce_empty_result() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        for root in [&src, &dst] {
            fs::create_dir_all(root.join("sub")).expect("Failed to create dirs");
            write_file(root, "a.txt", b"alpha");
            write_file(&root.join("sub"), "b.txt", b"beta");
        }

        let outcome = run(&CheckConfig::new(), &src, &dst);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.status, WalkStatus::Completed);
    }

    #[test]
    fn test_meta_counts_each_source_entry_once() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        for root in [&src, &dst] {
            fs::create_dir_all(root.join("sub")).expect("Failed to create dirs");
            write_file(root, "a.txt", b"alpha");
            write_file(root, "b.txt", b"beta");
            write_file(&root.join("sub"), "c.txt", b"gamma");
        }

        let config = CheckConfig::new();
        let meta = WalkMeta::new();
        compare(
            &config,
            &meta,
            &src,
            &dst,
            None,
            &CancellationToken::new(),
        )
        .expect("walk should not abort");

        assert_eq!(meta.files_visited(), 3);
        assert_eq!(meta.directories_visited(), 1);
    }

    #[test]
    fn test_missing_file_reported_for_its_directory() {
        // Source: a/, a/x.txt (4 bytes). Destination: a/ only.
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(src.join("a")).expect("Failed to create dirs");
        fs::create_dir_all(dst.join("a")).expect("Failed to create dirs");
        write_file(&src.join("a"), "x.txt", b"data");

        let outcome = run(&CheckConfig::new(), &src, &dst);
        assert_eq!(outcome.results.len(), 1);

        let cr = &outcome.results[0];
        assert_eq!(cr.source_path, src.join("a"));
        assert_eq!(cr.destination_path, dst.join("a"));
        assert_eq!(cr.missing_in_destination.len(), 1);
        assert_eq!(cr.missing_in_destination[0].name, OsString::from("x.txt"));
        assert_eq!(cr.missing_in_destination[0].size, 4);
        assert!(cr.missing_in_source.is_empty());
        assert!(cr.conflicts.is_empty());
    }

    #[test]
    fn test_size_mismatch_is_conflict_and_missing() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).expect("Failed to create dirs");
        fs::create_dir_all(&dst).expect("Failed to create dirs");
        write_file(&src, "f.bin", b"abcd");
        write_file(&dst, "f.bin", b"ab");

        let outcome = run(&CheckConfig::new(), &src, &dst);
        assert_eq!(outcome.results.len(), 1);

        let cr = &outcome.results[0];
        assert_eq!(cr.conflicts.len(), 1);
        assert_eq!(
            cr.conflicts[0].1,
            Conflict::Size {
                source_size: 4,
                destination_size: 2,
            }
        );
        // Double classification: the mismatched entry is also "not found".
        assert_eq!(cr.missing_in_destination.len(), 1);
        assert_eq!(cr.missing_in_destination[0].name, OsString::from("f.bin"));
    }

    #[test]
    fn test_checksum_mismatch_with_equal_sizes() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).expect("Failed to create dirs");
        fs::create_dir_all(&dst).expect("Failed to create dirs");
        write_file(&src, "f.bin", b"abcd");
        write_file(&dst, "f.bin", b"abzd");

        let mut config = CheckConfig::new();
        config.checksum = Some(ChecksumAlgorithm::Md5);
        let outcome = run(&config, &src, &dst);

        assert_eq!(outcome.results.len(), 1);
        let cr = &outcome.results[0];
        assert_eq!(cr.conflicts.len(), 1);
        match &cr.conflicts[0].1 {
            Conflict::Checksum {
                source_hex,
                destination_hex,
            } => {
                assert_ne!(source_hex, destination_hex);
                assert_eq!(source_hex.len(), 32);
            }
            other => panic!("expected checksum conflict, got {:?}", other),
        }
        assert_eq!(cr.missing_in_destination.len(), 1);
    }

    #[test]
    fn test_size_only_check_misses_content_difference() {
        // Deeply nested, identical except one leaf that differs by one byte
        // at equal length. Without checksums this is undetectable.
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        for root in [&src, &dst] {
            fs::create_dir_all(root.join("a/b/c")).expect("Failed to create dirs");
            write_file(&root.join("a"), "top.txt", b"same");
        }
        write_file(&src.join("a/b/c"), "leaf.bin", b"abcd");
        write_file(&dst.join("a/b/c"), "leaf.bin", b"abXd");

        let outcome = run(&CheckConfig::new(), &src, &dst);
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_parallel_and_sequential_digests_match() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).expect("Failed to create dirs");
        fs::create_dir_all(&dst).expect("Failed to create dirs");
        // Equal size, different content, so both walks record the digests.
        write_file(&src, "f.bin", b"0123456789");
        write_file(&dst, "f.bin", b"0123456780");

        let mut sequential = CheckConfig::new();
        sequential.checksum = Some(ChecksumAlgorithm::Sha256);
        let sequential_outcome = run(&sequential, &src, &dst);

        let mut parallel = CheckConfig::new();
        parallel.checksum = Some(ChecksumAlgorithm::Sha256);
        let parallel = parallel.with_digest_pool(DigestPool::new()).init();
        let parallel_outcome = run(&parallel, &src, &dst);
        parallel.release();

        let hexes = |outcome: &WalkOutcome| match &outcome.results[0].conflicts[0].1 {
            Conflict::Checksum {
                source_hex,
                destination_hex,
            } => (source_hex.clone(), destination_hex.clone()),
            other => panic!("expected checksum conflict, got {:?}", other),
        };
        assert_eq!(hexes(&sequential_outcome), hexes(&parallel_outcome));
    }

    #[test]
    fn test_fail_fast_suppresses_all_recursion() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(src.join("sub")).expect("Failed to create dirs");
        fs::create_dir_all(dst.join("sub")).expect("Failed to create dirs");
        write_file(&src, "bad.txt", b"only here");
        write_file(&src.join("sub"), "also-bad.txt", b"only here too");

        let mut config = CheckConfig::new();
        let full = run(&config, &src, &dst);
        assert_eq!(full.results.len(), 2, "both directories report issues");

        config.fail_fast = true;
        let outcome = run(&config, &src, &dst);
        // The failing root suppresses recursion into sub, clean or not.
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].source_path, src);
    }

    #[test]
    fn test_destination_scan_needs_both_flags_to_short_circuit() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).expect("Failed to create dirs");
        fs::create_dir_all(&dst).expect("Failed to create dirs");
        write_file(&dst, "extra1", b"x");
        write_file(&dst, "extra2", b"y");

        let mut config = CheckConfig::new();
        config.fail_fast = true;
        let outcome = run(&config, &src, &dst);
        assert_eq!(
            outcome.results[0].missing_in_source.len(),
            2,
            "fail_fast alone does not stop the destination scan"
        );

        config.fail_on_destination = true;
        let outcome = run(&config, &src, &dst);
        let missing = &outcome.results[0].missing_in_source;
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, OsString::from("extra1"));
    }

    #[test]
    fn test_type_conflict_source_file_counts_as_matched() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).expect("Failed to create dirs");
        fs::create_dir_all(dst.join("f")).expect("Failed to create dirs");
        write_file(&src, "f", b"i am a file");

        let outcome = run(&CheckConfig::new(), &src, &dst);
        assert_eq!(outcome.results.len(), 1);

        let cr = &outcome.results[0];
        assert_eq!(
            cr.conflicts[0].1,
            Conflict::Type {
                source_is_file: true,
            }
        );
        // Matched despite the conflict: not in the missing list.
        assert!(cr.missing_in_destination.is_empty());
        assert!(cr.missing_in_source.is_empty());
    }

    #[test]
    fn test_type_conflicted_directory_aborts_the_entire_walk() {
        // Source has c/ as a directory, destination has c as a file. The
        // pair counts as matched, recursion descends into it and hits the
        // fatal not-a-directory error, losing every result collected so
        // far. This pins down the intended all-or-nothing behavior.
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(src.join("c")).expect("Failed to create dirs");
        fs::create_dir_all(&dst).expect("Failed to create dirs");
        write_file(&src.join("c"), "inner.txt", b"deep");
        write_file(&src, "a_missing.txt", b"recorded then lost");
        write_file(&dst, "c", b"i am a file");

        let err = compare(
            &CheckConfig::new(),
            &WalkMeta::new(),
            &src,
            &dst,
            None,
            &CancellationToken::new(),
        )
        .expect_err("recursing into the type-conflicted pair must abort");

        match err {
            WalkError::NotADirectory { side, path } => {
                assert_eq!(side, Side::Destination);
                assert_eq!(path, dst.join("c"));
            }
            other => panic!("expected NotADirectory, got {:?}", other),
        }
    }

    #[test]
    fn test_source_must_be_a_directory() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        write_file(temp_dir.path(), "src", b"file, not dir");
        fs::create_dir_all(&dst).expect("Failed to create dirs");

        let err = compare(
            &CheckConfig::new(),
            &WalkMeta::new(),
            &src,
            &dst,
            None,
            &CancellationToken::new(),
        )
        .expect_err("file as source must abort");
        assert!(matches!(
            err,
            WalkError::NotADirectory {
                side: Side::Source,
                ..
            }
        ));
    }

    #[test]
    fn test_failed_digest_is_fatal_and_discards_results() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        // a/ fails first (missing file) and would be in the results; the
        // digest failure in b/ must throw that record away.
        fs::create_dir_all(src.join("a")).expect("Failed to create dirs");
        fs::create_dir_all(src.join("b")).expect("Failed to create dirs");
        fs::create_dir_all(dst.join("a")).expect("Failed to create dirs");
        fs::create_dir_all(dst.join("b")).expect("Failed to create dirs");
        write_file(&src.join("a"), "gone.txt", b"missing in dst");
        write_file(&src.join("b"), "f.bin", b"abcd");
        write_file(&dst.join("b"), "f.bin", b"abcd");

        let mut config = CheckConfig::new();
        config.checksum = Some(ChecksumAlgorithm::Md5);
        let config = config.with_digest_pool(DigestPool::new()).init();
        // Pool dies between init and the walk; submissions are rejected and
        // the rejected digest surfaces as a fatal checksum failure.
        config
            .pool()
            .expect("pool survives init when live")
            .shutdown();

        let err = compare(
            &config,
            &WalkMeta::new(),
            &src,
            &dst,
            None,
            &CancellationToken::new(),
        )
        .expect_err("failed digest must abort the walk");
        assert!(matches!(err, WalkError::ChecksumFailed { .. }));
    }

    /// Sink that cancels the token when a specific entry is reported.
    struct CancelOnEntry {
        token: CancellationToken,
        trigger: OsString,
    }

    impl CheckEventSink for CancelOnEntry {
        fn on_missing_in_destination(
            &self,
            _source_dir: &Path,
            _destination_dir: &Path,
            entry: &DirEntry,
        ) {
            if entry.name == self.trigger {
                self.token.cancel();
            }
        }
    }

    #[test]
    fn test_cancellation_keeps_the_processed_prefix() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        for name in ["a", "b", "c"] {
            fs::create_dir_all(src.join(name)).expect("Failed to create dirs");
            fs::create_dir_all(dst.join(name)).expect("Failed to create dirs");
        }
        write_file(&src.join("a"), "one.txt", b"1");
        write_file(&src.join("b"), "two.txt", b"2");
        write_file(&src.join("c"), "three.txt", b"3");

        let token = CancellationToken::new();
        let sink = CancelOnEntry {
            token: token.clone(),
            trigger: OsString::from("two.txt"),
        };

        let outcome = compare(
            &CheckConfig::new(),
            &WalkMeta::new(),
            &src,
            &dst,
            Some(&sink),
            &token,
        )
        .expect("cancellation is not a fatal error");

        assert_eq!(outcome.status, WalkStatus::Cancelled);
        // a/ was fully processed before the cancellation point; b/ was cut
        // short before finalizing and c/ was never reached.
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].source_path, src.join("a"));
    }

    /// Sink that records event names and entry names in firing order.
    struct CollectingSink {
        events: Mutex<Vec<String>>,
    }

    impl CheckEventSink for CollectingSink {
        fn on_missing_in_destination(
            &self,
            _source_dir: &Path,
            _destination_dir: &Path,
            entry: &DirEntry,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("missing_in_destination({})", entry.display_name()));
        }

        fn on_missing_in_source(
            &self,
            _source_dir: &Path,
            _destination_dir: &Path,
            entry: &DirEntry,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("missing_in_source({})", entry.display_name()));
        }

        fn on_conflict(
            &self,
            _source_dir: &Path,
            _destination_dir: &Path,
            source_entry: &DirEntry,
            _destination_entry: &DirEntry,
            _conflict: &Conflict,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("conflict({})", source_entry.display_name()));
        }
    }

    #[test]
    fn test_events_fire_source_entries_first_in_sorted_order() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).expect("Failed to create dirs");
        fs::create_dir_all(&dst).expect("Failed to create dirs");
        write_file(&src, "b.txt", b"b");
        write_file(&src, "a.txt", b"a");
        write_file(&dst, "z.txt", b"z");

        let sink = CollectingSink {
            events: Mutex::new(Vec::new()),
        };
        compare(
            &CheckConfig::new(),
            &WalkMeta::new(),
            &src,
            &dst,
            Some(&sink),
            &CancellationToken::new(),
        )
        .expect("walk should not abort");

        let events = sink.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "missing_in_destination(a.txt)".to_string(),
                "missing_in_destination(b.txt)".to_string(),
                "missing_in_source(z.txt)".to_string(),
            ]
        );
    }

    #[test]
    fn test_results_are_in_pre_order() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(src.join("a/inner")).expect("Failed to create dirs");
        fs::create_dir_all(src.join("b")).expect("Failed to create dirs");
        fs::create_dir_all(dst.join("a/inner")).expect("Failed to create dirs");
        fs::create_dir_all(dst.join("b")).expect("Failed to create dirs");
        write_file(&src.join("a"), "x", b"x");
        write_file(&src.join("a/inner"), "y", b"y");
        write_file(&src.join("b"), "z", b"z");

        let outcome = run(&CheckConfig::new(), &src, &dst);
        let order: Vec<&Path> = outcome
            .results
            .iter()
            .map(|cr| cr.source_path.as_path())
            .collect();
        assert_eq!(
            order,
            vec![
                src.join("a").as_path(),
                src.join("a/inner").as_path(),
                src.join("b").as_path(),
            ]
        );
    }
}
