//! Flattens the raw per-keyword evaluation tree into one of the four output
//! shapes from the 2020-12 core specification's output section: flag (a
//! single boolean), basic (a flat list of failing leaves), detailed (a
//! pruned tree holding only failing branches), and verbose (the full tree,
//! annotations included).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Flag,
    Basic,
    Detailed,
    Verbose,
}

/// One node of the raw evaluation tree built while walking a schema against
/// an instance. `children` holds the outcome of every sub-schema the
/// evaluator recursed into, in evaluation order, regardless of whether the
/// parent keyword short-circuited on the first failure.
#[derive(Debug, Clone)]
pub struct ScopedOutcome {
    pub valid: bool,
    pub keyword_location: String,
    pub absolute_keyword_location: String,
    pub instance_location: String,
    pub error: Option<String>,
    pub annotation: Option<String>,
    pub children: Vec<ScopedOutcome>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Flag(FlagOutput),
    Basic(BasicOutput),
    Detailed(DetailedOutput),
    Verbose(DetailedOutput),
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        match self {
            Outcome::Flag(f) => f.valid,
            Outcome::Basic(b) => b.valid,
            Outcome::Detailed(d) | Outcome::Verbose(d) => d.valid,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagOutput {
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasicOutput {
    pub valid: bool,
    #[serde(rename = "errors", skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<BasicUnit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasicUnit {
    #[serde(rename = "keywordLocation")]
    pub keyword_location: String,
    #[serde(rename = "absoluteKeywordLocation")]
    pub absolute_keyword_location: String,
    #[serde(rename = "instanceLocation")]
    pub instance_location: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedOutput {
    pub valid: bool,
    #[serde(rename = "keywordLocation")]
    pub keyword_location: String,
    #[serde(rename = "absoluteKeywordLocation")]
    pub absolute_keyword_location: String,
    #[serde(rename = "instanceLocation")]
    pub instance_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(rename = "errors", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DetailedOutput>,
}

pub fn build(shape: OutputShape, node: ScopedOutcome) -> Outcome {
    match shape {
        OutputShape::Flag => Outcome::Flag(FlagOutput { valid: node.valid }),
        OutputShape::Basic => {
            let valid = node.valid;
            let mut units = Vec::new();
            collect_basic(&node, &mut units);
            Outcome::Basic(BasicOutput { valid, units })
        }
        OutputShape::Detailed => Outcome::Detailed(prune(node, false)),
        OutputShape::Verbose => Outcome::Verbose(prune(node, true)),
    }
}

/// Walks every node regardless of validity, since a passing branch can
/// still contain a failing leaf underneath an `anyOf`/`not` that itself
/// reports valid overall (e.g. a failed alternative inside `oneOf`).
fn collect_basic(node: &ScopedOutcome, out: &mut Vec<BasicUnit>) {
    if !node.valid {
        if let Some(error) = &node.error {
            out.push(BasicUnit {
                keyword_location: node.keyword_location.clone(),
                absolute_keyword_location: node.absolute_keyword_location.clone(),
                instance_location: node.instance_location.clone(),
                error: error.clone(),
            });
        }
    }
    for child in &node.children {
        collect_basic(child, out);
    }
}

/// `verbose` keeps every child; otherwise only children that themselves
/// failed survive, pruning whole passing subtrees.
fn prune(node: ScopedOutcome, verbose: bool) -> DetailedOutput {
    let ScopedOutcome { valid, keyword_location, absolute_keyword_location, instance_location, error, annotation, children } =
        node;
    let children = children
        .into_iter()
        .filter(|c| verbose || !c.valid)
        .map(|c| prune(c, verbose))
        .collect();
    DetailedOutput { valid, keyword_location, absolute_keyword_location, instance_location, error, annotation, children }
}

#[cfg(test)]
mod test {
    use super::*;

    fn leaf(valid: bool, error: Option<&str>) -> ScopedOutcome {
        ScopedOutcome {
            valid,
            keyword_location: "/type".into(),
            absolute_keyword_location: "http://example.com/schema#/type".into(),
            instance_location: "/name".into(),
            error: error.map(str::to_string),
            annotation: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_flag_output_only_reports_validity() {
        let outcome = build(OutputShape::Flag, leaf(false, Some("expected type string")));
        assert!(!outcome.is_valid());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "valid": false }));
    }

    #[test]
    fn test_basic_output_flattens_failing_leaves() {
        let root = ScopedOutcome {
            valid: false,
            keyword_location: "".into(),
            absolute_keyword_location: "http://example.com/schema#".into(),
            instance_location: "".into(),
            error: None,
            annotation: None,
            children: vec![leaf(true, None), leaf(false, Some("expected type string"))],
        };
        let outcome = build(OutputShape::Basic, root);
        assert!(!outcome.is_valid());
        let Outcome::Basic(basic) = &outcome else { panic!("expected basic output") };
        assert_eq!(basic.units.len(), 1);
        assert_eq!(basic.units[0].error, "expected type string");
    }

    #[test]
    fn test_detailed_output_prunes_passing_branches() {
        let root = ScopedOutcome {
            valid: false,
            keyword_location: "".into(),
            absolute_keyword_location: "http://example.com/schema#".into(),
            instance_location: "".into(),
            error: None,
            annotation: None,
            children: vec![leaf(true, None), leaf(false, Some("expected type string"))],
        };
        let outcome = build(OutputShape::Detailed, root);
        let Outcome::Detailed(detailed) = &outcome else { panic!("expected detailed output") };
        assert_eq!(detailed.children.len(), 1);
        assert_eq!(detailed.children[0].error.as_deref(), Some("expected type string"));
    }

    #[test]
    fn test_verbose_output_keeps_passing_branches() {
        let root = ScopedOutcome {
            valid: true,
            keyword_location: "".into(),
            absolute_keyword_location: "http://example.com/schema#".into(),
            instance_location: "".into(),
            error: None,
            annotation: None,
            children: vec![leaf(true, None), leaf(true, None)],
        };
        let outcome = build(OutputShape::Verbose, root);
        let Outcome::Verbose(verbose) = &outcome else { panic!("expected verbose output") };
        assert_eq!(verbose.children.len(), 2);
    }
}
