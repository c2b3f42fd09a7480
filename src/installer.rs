//! Parallel per-repository installation
//!
//! Each build gets its own rayon pool with one thread per repository, so
//! workers blocked on git or file I/O never wait for a free thread. Each task
//! sends exactly one [`InstallResult`] into a channel sized to the repository
//! count, and the collector always drains every result before deciding the
//! outcome.
//!
//! There is no cancellation. When one repository fails, its siblings keep
//! running to completion and may still write into their destinations after
//! the failure has been decided. Callers should treat the package tree as
//! unspecified after a failed build and rebuild it.

use std::sync::mpsc;

use log::{debug, error};

use crate::error::{Error, Result};
use crate::lockjson::Repos;

/// Outcome of installing one repository
#[derive(Debug)]
pub struct InstallResult<'a> {
    pub repos: &'a Repos,
    pub result: Result<()>,
}

/// Run `install` once per repository concurrently and collect every result.
///
/// The returned vector always has `repos_list.len()` entries, in completion
/// order. Fails only if the worker pool cannot be started.
pub fn run<'a, F>(repos_list: &'a [Repos], install: F) -> Result<Vec<InstallResult<'a>>>
where
    F: Fn(&Repos) -> Result<()> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(repos_list.len().max(1))
        .thread_name(|i| format!("volt-install-{}", i))
        .build()
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "failed to start install workers: {}",
                e
            )))
        })?;

    let (tx, rx) = mpsc::sync_channel(repos_list.len());
    let install = &install;

    pool.scope(move |s| {
        for repos in repos_list {
            let tx = tx.clone();
            s.spawn(move |_| {
                let result = install(repos);
                // The receiver outlives the scope, so this cannot fail.
                let _ = tx.send(InstallResult { repos, result });
            });
        }
    });

    let mut results = Vec::with_capacity(repos_list.len());
    for _ in 0..repos_list.len() {
        match rx.recv() {
            Ok(result) => results.push(result),
            Err(_) => break,
        }
    }
    Ok(results)
}

/// Install every repository and fail if any one of them failed.
///
/// The first failure drained becomes the error; later ones are logged.
pub fn install_all<F>(repos_list: &[Repos], install: F) -> Result<()>
where
    F: Fn(&Repos) -> Result<()> + Sync,
{
    let mut first_error = None;
    for InstallResult { repos, result } in run(repos_list, install)? {
        match result {
            Ok(()) => debug!(
                "Installing {} repository {} ... Done.",
                repos.r#type, repos.path
            ),
            Err(e) => {
                let err = Error::Install {
                    path: repos.path.clone(),
                    message: e.to_string(),
                };
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    error!("{}", err);
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockjson::ReposType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::{Duration, Instant};

    fn repos_list(n: usize) -> Vec<Repos> {
        (0..n)
            .map(|i| Repos {
                r#type: ReposType::Git,
                path: format!("github.com/test/plugin{}", i),
                version: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_run_drains_all_results() {
        for n in [0, 1, 7, 32] {
            let list = repos_list(n);
            let results = run(&list, |_| Ok(())).unwrap();
            assert_eq!(results.len(), n);
        }
    }

    #[test]
    fn test_run_drains_all_results_when_all_fail() {
        let list = repos_list(9);
        let results = run(&list, |r| {
            Err(Error::Git {
                path: r.path.clone(),
                message: "boom".to_string(),
            })
        })
        .unwrap();
        assert_eq!(results.len(), 9);
        assert!(results.iter().all(|r| r.result.is_err()));
    }

    #[test]
    fn test_run_starts_every_worker_at_once() {
        // Every worker blocks until all of them are running, which only
        // completes if none waits for a free thread.
        let list = repos_list(16);
        let barrier = Barrier::new(list.len());
        let start = Instant::now();

        let results = run(&list, |_| {
            barrier.wait();
            thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .unwrap();

        assert_eq!(results.len(), 16);
        assert!(results.iter().all(|r| r.result.is_ok()));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_install_all_does_not_cancel_siblings() {
        let list = repos_list(6);
        let finished = AtomicUsize::new(0);

        let result = install_all(&list, |r| {
            if r.path.ends_with("plugin0") {
                return Err(Error::InvalidType {
                    path: r.path.clone(),
                    r#type: "svn".to_string(),
                });
            }
            thread::sleep(Duration::from_millis(20));
            finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = result.unwrap_err();
        assert!(err.to_string().contains("github.com/test/plugin0"));
        assert!(err.to_string().contains("invalid repository type"));
        assert_eq!(finished.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_install_all_reports_failing_results_own_error() {
        let list = repos_list(3);
        let err = install_all(&list, |r| {
            if r.path.ends_with("plugin2") {
                Err(Error::Git {
                    path: r.path.clone(),
                    message: "unresolved commit".to_string(),
                })
            } else {
                Ok(())
            }
        })
        .unwrap_err();

        match err {
            Error::Install { path, message } => {
                assert_eq!(path, "github.com/test/plugin2");
                assert!(message.contains("unresolved commit"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_install_all_success() {
        let list = repos_list(4);
        let calls = AtomicUsize::new(0);
        install_all(&list, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
