//! Slim derivation through the external mapping tool.
//!
//! Each aspect runs the configured program with its argument template
//! expanded. The tool writes the derived annotation set to stdout, which is
//! redirected straight into the aspect's staging file; stderr is captured
//! for the run transcript. Every invocation is bounded by a timeout and the
//! child is killed if its task is dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use goslim_core::{SlimAnnotationFile, SlimAspect};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::DeriveError;
use crate::filter::count_records;

/// How to invoke the mapping tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperCommand {
    pub program: String,
    /// Argument template; `{slim}`, `{ontology}`, `{annotations}` and
    /// `{aspect}` are substituted per invocation.
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl MapperCommand {
    /// Expand the argument template for one invocation.
    #[must_use]
    pub fn expand_args(
        &self,
        term_list: &Path,
        ontology: &Path,
        annotations: &Path,
        aspect: SlimAspect,
    ) -> Vec<String> {
        let term_list = term_list.display().to_string();
        let ontology = ontology.display().to_string();
        let annotations = annotations.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{slim}", &term_list)
                    .replace("{ontology}", &ontology)
                    .replace("{annotations}", &annotations)
                    .replace("{aspect}", aspect.gaf_code())
            })
            .collect()
    }
}

/// A successful derivation for one aspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub aspect: SlimAspect,
    pub output: PathBuf,
    /// Annotation records in the output.
    pub records: usize,
}

/// One aspect's result, with whatever the tool wrote to stderr even on
/// failure.
#[derive(Debug)]
pub struct DerivationResult {
    pub aspect: SlimAspect,
    pub result: Result<Derivation, DeriveError>,
    pub stderr: String,
}

/// Runs the mapping tool for slim subsets.
#[derive(Debug, Clone)]
pub struct SlimDeriver {
    command: Arc<MapperCommand>,
}

impl SlimDeriver {
    #[must_use]
    pub fn new(command: MapperCommand) -> Self {
        Self {
            command: Arc::new(command),
        }
    }

    #[must_use]
    pub fn command(&self) -> &MapperCommand {
        &self.command
    }

    /// Write the term list and run the tool for one slim file.
    ///
    /// Returns the derivation result together with any stderr the tool
    /// produced.
    pub async fn derive(
        &self,
        slim: &SlimAnnotationFile,
        ontology: &Path,
        annotations: &Path,
    ) -> DerivationResult {
        let aspect = slim.aspect();
        let mut stderr = String::new();
        let result = self
            .run_tool(slim, ontology, annotations, &mut stderr)
            .await
            .map(|records| Derivation {
                aspect,
                output: slim.paths.staging.clone(),
                records,
            });
        DerivationResult {
            aspect,
            result,
            stderr,
        }
    }

    async fn run_tool(
        &self,
        slim: &SlimAnnotationFile,
        ontology: &Path,
        annotations: &Path,
        stderr_out: &mut String,
    ) -> Result<usize, DeriveError> {
        let aspect = slim.aspect();
        let output_path = &slim.paths.staging;

        tokio::fs::write(&slim.term_list, slim.definition.to_term_list())
            .await
            .map_err(|e| DeriveError::io(&slim.term_list, e))?;

        let stdout = std::fs::File::create(output_path).map_err(|e| DeriveError::io(output_path, e))?;
        let args = self
            .command
            .expand_args(&slim.term_list, ontology, annotations, aspect);
        tracing::debug!(%aspect, program = %self.command.program, ?args, "starting mapper");

        let child = TokioCommand::new(&self.command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DeriveError::Spawn {
                aspect,
                program: self.command.program.clone(),
                source,
            })?;

        let output = timeout(self.command.timeout, child.wait_with_output())
            .await
            .map_err(|_| DeriveError::Timeout {
                aspect,
                secs: self.command.timeout.as_secs(),
            })?
            .map_err(|e| DeriveError::io(output_path, e))?;

        *stderr_out = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if !output.status.success() {
            return Err(DeriveError::ToolFailed {
                aspect,
                status: output.status.to_string(),
            });
        }

        let records = count_records(output_path)?;
        if records == 0 {
            return Err(DeriveError::EmptyOutput { aspect });
        }
        tracing::info!(%aspect, records, "slim derived");
        Ok(records)
    }

    /// Derive every slim concurrently. Results are sorted by aspect name.
    ///
    /// Dropping the returned future aborts the outstanding invocations,
    /// which kills their child processes.
    pub async fn derive_all(
        &self,
        slims: &[SlimAnnotationFile],
        ontology: &Path,
        annotations: &Path,
    ) -> Vec<DerivationResult> {
        let mut set = tokio::task::JoinSet::new();

        for slim in slims {
            let deriver = self.clone();
            let slim = slim.clone();
            let ontology = ontology.to_path_buf();
            let annotations = annotations.to_path_buf();
            set.spawn(async move { deriver.derive(&slim, &ontology, &annotations).await });
        }

        let mut results = BTreeMap::new();
        while let Some(res) = set.join_next().await {
            match res {
                Ok(result) => {
                    results.insert(result.aspect, result);
                }
                Err(e) => tracing::warn!(%e, "mapper task failed"),
            }
        }

        // A panicked task leaves no result behind; report it as a tool failure.
        for slim in slims {
            let aspect = slim.aspect();
            results.entry(aspect).or_insert_with(|| DerivationResult {
                aspect,
                result: Err(DeriveError::Task {
                    aspect,
                    message: "task did not complete".to_string(),
                }),
                stderr: String::new(),
            });
        }

        results.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn command(args: &[&str]) -> MapperCommand {
        MapperCommand {
            program: "python3".to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn template_placeholders_are_expanded() {
        let cmd = command(&[
            "/var/www/data/map2slim.py",
            "--aspect={aspect}",
            "{slim}",
            "{ontology}",
            "{annotations}",
        ]);
        let args = cmd.expand_args(
            Path::new("/stage/goslim_process.txt"),
            Path::new("/stage/gene_ontology.obo"),
            Path::new("/stage/gene_association.sgd.mapper"),
            SlimAspect::Process,
        );
        assert_eq!(
            args,
            vec![
                "/var/www/data/map2slim.py",
                "--aspect=P",
                "/stage/goslim_process.txt",
                "/stage/gene_ontology.obo",
                "/stage/gene_association.sgd.mapper",
            ]
        );
    }

    #[test]
    fn literal_args_pass_through() {
        let cmd = command(&["--quiet", "{slim}"]);
        let args = cmd.expand_args(
            Path::new("t"),
            Path::new("o"),
            Path::new("a"),
            SlimAspect::Component,
        );
        assert_eq!(args, vec!["--quiet", "t"]);
    }
}
