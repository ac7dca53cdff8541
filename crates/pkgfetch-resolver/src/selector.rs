//! Picking one artifact among several providers of the same requirement.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use pkgfetch_repo::cloner::artifact_path;
use pkgfetch_repo::solver::{CompetingSolver, SolverError};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SelectError {
    #[error("no candidates to select from")]
    NoCandidates,

    #[error("competing-package solver failed for [{}]: {source}", .candidates.join(", "))]
    Solver {
        candidates: Vec<String>,
        #[source]
        source: SolverError,
    },

    #[error("none of the candidates [{}] can be installed", .candidates.join(", "))]
    NoInstallableCandidate { candidates: Vec<String> },

    #[error("solver chose '{identifier}', which is not one of [{}]", .candidates.join(", "))]
    UnknownCandidate {
        identifier: String,
        candidates: Vec<String>,
    },
}

/// The chosen provider and the path of its cloned artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub identifier: String,
    pub path: PathBuf,
}

/// Maps provider identifiers to artifact paths under `out_dir`, deferring to
/// a [`CompetingSolver`] when there is more than one.
pub struct CandidateSelector<'a> {
    solver: &'a dyn CompetingSolver,
    out_dir: &'a Path,
    scratch_dir: &'a Path,
}

impl<'a> CandidateSelector<'a> {
    pub fn new(solver: &'a dyn CompetingSolver, out_dir: &'a Path, scratch_dir: &'a Path) -> Self {
        Self {
            solver,
            out_dir,
            scratch_dir,
        }
    }

    pub fn select(&self, candidates: &[String]) -> Result<Selection, SelectError> {
        match candidates {
            [] => Err(SelectError::NoCandidates),
            [only] => Ok(Selection {
                identifier: only.clone(),
                path: artifact_path(self.out_dir, only),
            }),
            _ => self.select_competing(candidates),
        }
    }

    fn select_competing(&self, candidates: &[String]) -> Result<Selection, SelectError> {
        let paths: Vec<PathBuf> = candidates
            .iter()
            .map(|c| artifact_path(self.out_dir, c))
            .collect();

        let installable = self
            .solver
            .resolve_competing(self.scratch_dir, &paths)
            .map_err(|source| SelectError::Solver {
                candidates: candidates.to_vec(),
                source,
            })?;

        if let Some(stray) = installable.iter().find(|id| !candidates.contains(*id)) {
            return Err(SelectError::UnknownCandidate {
                identifier: stray.clone(),
                candidates: candidates.to_vec(),
            });
        }

        let Some(chosen) = installable.first() else {
            return Err(SelectError::NoInstallableCandidate {
                candidates: candidates.to_vec(),
            });
        };
        if installable.len() > 1 {
            tracing::warn!(
                "Multiple installable candidates [{}], picking '{chosen}'",
                installable.join(", ")
            );
        }
        Ok(Selection {
            identifier: chosen.clone(),
            path: artifact_path(self.out_dir, chosen),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    struct FakeSolver {
        answer: Result<Vec<&'static str>, &'static str>,
        calls: RefCell<Vec<Vec<PathBuf>>>,
    }

    impl FakeSolver {
        fn returning(ids: Vec<&'static str>) -> Self {
            Self {
                answer: Ok(ids),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CompetingSolver for FakeSolver {
        fn resolve_competing(
            &self,
            _scratch_dir: &Path,
            candidates: &[PathBuf],
        ) -> Result<Vec<String>, SolverError> {
            self.calls.borrow_mut().push(candidates.to_vec());
            match &self.answer {
                Ok(ids) => Ok(ids.iter().map(|s| s.to_string()).collect()),
                Err(msg) => Err(SolverError::Command {
                    program: "rpm".into(),
                    message: msg.to_string(),
                }),
            }
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_candidate_skips_solver() {
        let solver = FakeSolver::returning(vec![]);
        let selector = CandidateSelector::new(&solver, Path::new("/out"), Path::new("/tmp"));

        let sel = selector.select(&ids(&["bash-5.1-1.x86_64"])).unwrap();
        assert_eq!(sel.path, PathBuf::from("/out/bash-5.1-1.x86_64.rpm"));
        assert!(solver.calls.borrow().is_empty());
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let solver = FakeSolver::returning(vec![]);
        let selector = CandidateSelector::new(&solver, Path::new("/out"), Path::new("/tmp"));
        assert!(matches!(selector.select(&[]), Err(SelectError::NoCandidates)));
    }

    #[test]
    fn several_candidates_take_first_installable() {
        let solver = FakeSolver::returning(vec!["b-1-1.noarch", "a-1-1.noarch"]);
        let selector = CandidateSelector::new(&solver, Path::new("/out"), Path::new("/tmp"));

        let sel = selector
            .select(&ids(&["a-1-1.noarch", "b-1-1.noarch"]))
            .unwrap();
        assert_eq!(sel.identifier, "b-1-1.noarch");
        assert_eq!(sel.path, PathBuf::from("/out/b-1-1.noarch.rpm"));
        assert_eq!(
            solver.calls.borrow()[0],
            vec![
                PathBuf::from("/out/a-1-1.noarch.rpm"),
                PathBuf::from("/out/b-1-1.noarch.rpm"),
            ]
        );
    }

    #[test]
    fn nothing_installable_is_an_error() {
        let solver = FakeSolver::returning(vec![]);
        let selector = CandidateSelector::new(&solver, Path::new("/out"), Path::new("/tmp"));
        let err = selector
            .select(&ids(&["a-1-1.noarch", "b-1-1.noarch"]))
            .unwrap_err();
        assert!(matches!(err, SelectError::NoInstallableCandidate { .. }));
        assert!(err.to_string().contains("a-1-1.noarch, b-1-1.noarch"));
    }

    #[test]
    fn answer_outside_candidates_is_rejected() {
        let solver = FakeSolver::returning(vec!["c-1-1.noarch", "a-1-1.noarch"]);
        let selector = CandidateSelector::new(&solver, Path::new("/out"), Path::new("/tmp"));
        let err = selector
            .select(&ids(&["a-1-1.noarch", "b-1-1.noarch"]))
            .unwrap_err();
        match err {
            SelectError::UnknownCandidate {
                identifier,
                candidates,
            } => {
                assert_eq!(identifier, "c-1-1.noarch");
                assert_eq!(candidates, ids(&["a-1-1.noarch", "b-1-1.noarch"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ambiguous_pick_is_logged_as_warning() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        let solver = FakeSolver::returning(vec!["b-1-1.noarch", "a-1-1.noarch"]);
        let selector = CandidateSelector::new(&solver, Path::new("/out"), Path::new("/tmp"));
        let sel = tracing::subscriber::with_default(subscriber, || {
            selector.select(&ids(&["a-1-1.noarch", "b-1-1.noarch"]))
        })
        .unwrap();
        assert_eq!(sel.identifier, "b-1-1.noarch");

        let output = logs.contents();
        let line = output
            .lines()
            .find(|l| l.contains("Multiple installable candidates"))
            .expect("ambiguity was not logged");
        assert!(line.contains("WARN"), "{line}");
        assert!(line.contains("picking 'b-1-1.noarch'"), "{line}");
    }

    #[test]
    fn single_installable_pick_logs_no_warning() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();

        let solver = FakeSolver::returning(vec!["a-1-1.noarch"]);
        let selector = CandidateSelector::new(&solver, Path::new("/out"), Path::new("/tmp"));
        tracing::subscriber::with_default(subscriber, || {
            selector.select(&ids(&["a-1-1.noarch", "b-1-1.noarch"]))
        })
        .unwrap();
        assert!(!logs.contents().contains("WARN"));
    }

    #[test]
    fn solver_failure_is_a_selection_failure() {
        let solver = FakeSolver {
            answer: Err("rpmdb locked"),
            calls: RefCell::new(Vec::new()),
        };
        let selector = CandidateSelector::new(&solver, Path::new("/out"), Path::new("/tmp"));
        let err = selector
            .select(&ids(&["a-1-1.noarch", "b-1-1.noarch"]))
            .unwrap_err();
        assert!(matches!(err, SelectError::Solver { .. }));
    }
}
