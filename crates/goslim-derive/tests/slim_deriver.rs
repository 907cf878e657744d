//! Slim derivation against `sh` stand-ins for the mapping tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use goslim_core::{
    ArtifactPaths, ErrorKind, SlimAnnotationFile, SlimAspect, SlimSubsetDefinition, StageError,
};
use goslim_derive::{DeriveError, MapperCommand, SlimDeriver};
use pretty_assertions::assert_eq;

const ANNOTATIONS: &str = "!gaf-version: 2.2\n\
SGD\tS000000001\tAAC1\t\tGO:0005743\tPMID:1\tIDA\t\tC\n\
SGD\tS000000002\tAAC3\t\tGO:0006839\tPMID:2\tIMP\t\tP\n";

struct Fixture {
    _dir: tempfile::TempDir,
    staging: PathBuf,
    ontology: PathBuf,
    annotations: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("run-1");
    std::fs::create_dir_all(&staging).unwrap();
    let ontology = staging.join("gene_ontology.obo");
    std::fs::write(&ontology, "format-version: 1.2\n").unwrap();
    let annotations = staging.join("gene_association.sgd.mapper");
    std::fs::write(&annotations, ANNOTATIONS).unwrap();
    Fixture {
        _dir: dir,
        staging,
        ontology,
        annotations,
    }
}

fn slim(staging: &Path, aspect: SlimAspect) -> SlimAnnotationFile {
    SlimAnnotationFile {
        definition: SlimSubsetDefinition::new(aspect, None),
        term_list: staging.join(format!("goslim_{aspect}.txt")),
        paths: ArtifactPaths::for_file(
            &format!("slim_{aspect}_gene_association.sgd"),
            staging,
            &staging.join("published"),
            ".bak",
        ),
    }
}

fn all_slims(staging: &Path) -> Vec<SlimAnnotationFile> {
    SlimAspect::ALL.iter().map(|a| slim(staging, *a)).collect()
}

/// `sh -c <script>` with `$1..$4` = slim, ontology, annotations, aspect code.
fn sh_mapper(script: &str, timeout: Duration) -> SlimDeriver {
    SlimDeriver::new(MapperCommand {
        program: "sh".to_string(),
        args: [
            "-c",
            script,
            "map2slim",
            "{slim}",
            "{ontology}",
            "{annotations}",
            "{aspect}",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        timeout,
    })
}

#[tokio::test]
async fn all_three_aspects_succeed_in_name_order() {
    let fx = fixture();
    let deriver = sh_mapper(r#"cat "$3""#, Duration::from_secs(10));

    let results = deriver
        .derive_all(&all_slims(&fx.staging), &fx.ontology, &fx.annotations)
        .await;

    let aspects: Vec<SlimAspect> = results.iter().map(|r| r.aspect).collect();
    assert_eq!(aspects, SlimAspect::ALL.to_vec());
    for result in &results {
        let derivation = result.result.as_ref().unwrap();
        assert_eq!(derivation.records, 2);
        assert_eq!(std::fs::read_to_string(&derivation.output).unwrap(), ANNOTATIONS);
    }
}

#[tokio::test]
async fn term_list_is_written_and_passed() {
    let fx = fixture();
    // Echo the term list back as a single record per term.
    let deriver = sh_mapper(
        r#"while read -r t; do printf 'SGD\tS1\tX\t\t%s\n' "$t"; done < "$1""#,
        Duration::from_secs(10),
    );
    let component = slim(&fx.staging, SlimAspect::Component);

    let result = deriver
        .derive(&component, &fx.ontology, &fx.annotations)
        .await;

    let derivation = result.result.unwrap();
    assert_eq!(derivation.records, component.definition.terms().len());
    assert_eq!(
        std::fs::read_to_string(&component.term_list).unwrap(),
        component.definition.to_term_list()
    );
}

#[tokio::test]
async fn one_failing_aspect_leaves_siblings_intact() {
    let fx = fixture();
    let deriver = sh_mapper(
        r#"if [ "$4" = P ]; then echo "ontology cycle near GO:0008150" >&2; exit 3; fi; cat "$3""#,
        Duration::from_secs(10),
    );

    let results = deriver
        .derive_all(&all_slims(&fx.staging), &fx.ontology, &fx.annotations)
        .await;

    assert!(results[0].result.is_ok());
    assert!(results[1].result.is_ok());
    let process = &results[2];
    assert_eq!(process.aspect, SlimAspect::Process);
    let err = process.result.as_ref().unwrap_err();
    assert!(matches!(err, DeriveError::ToolFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
    assert_eq!(process.stderr, "ontology cycle near GO:0008150");
    assert_eq!(StageError::from(err).kind, ErrorKind::ExternalTool);
}

#[tokio::test]
async fn empty_output_is_a_validation_error() {
    let fx = fixture();
    let deriver = sh_mapper("echo '!header only'", Duration::from_secs(10));

    let result = deriver
        .derive(&slim(&fx.staging, SlimAspect::Function), &fx.ontology, &fx.annotations)
        .await;

    let err = result.result.unwrap_err();
    assert!(matches!(err, DeriveError::EmptyOutput { aspect: SlimAspect::Function }));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn slow_mapper_times_out() {
    let fx = fixture();
    let deriver = sh_mapper("sleep 30", Duration::from_millis(200));

    let result = deriver
        .derive(&slim(&fx.staging, SlimAspect::Process), &fx.ontology, &fx.annotations)
        .await;

    let err = result.result.unwrap_err();
    assert!(matches!(err, DeriveError::Timeout { .. }));
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
}

#[tokio::test]
async fn missing_program_is_a_tool_error() {
    let fx = fixture();
    let deriver = SlimDeriver::new(MapperCommand {
        program: "/nonexistent/map2slim".to_string(),
        args: vec!["{slim}".to_string()],
        timeout: Duration::from_secs(1),
    });

    let result = deriver
        .derive(&slim(&fx.staging, SlimAspect::Component), &fx.ontology, &fx.annotations)
        .await;

    let err = result.result.unwrap_err();
    assert!(matches!(err, DeriveError::Spawn { .. }));
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
}
